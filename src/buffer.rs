use alloc::vec;
use alloc::vec::Vec;

use crate::format::PixelFormat;

/// Maximum number of color table entries for indexed formats.
pub const MAX_COLOR_TABLE: usize = 256;

/// Row stride used when the caller does not supply one: rows are padded to
/// a 32-bit boundary.
pub(crate) const fn default_stride(width: u32, bits_per_pixel: usize) -> usize {
    ((width as usize * bits_per_pixel + 31) >> 5) << 2
}

/// An uncompressed raster image held fully in memory.
///
/// Owns a contiguous byte buffer of `height` rows, each `bytes_per_line`
/// bytes long (possibly wider than the pixel data for alignment), plus the
/// [`PixelFormat`] describing the pixel encoding and, for indexed formats,
/// an ordered color table of packed `0xAARRGGBB` entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
    bytes_per_line: usize,
    format: PixelFormat,
    color_table: Vec<u32>,
    has_alpha_clut: bool,
}

impl RasterBuffer {
    /// Allocate a zero-filled buffer with the default (32-bit aligned)
    /// row stride.
    ///
    /// # Panics
    ///
    /// Panics if `width * height` at this depth overflows `usize`.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let bytes_per_line = default_stride(width, format.bits_per_pixel());
        let nbytes = bytes_per_line
            .checked_mul(height as usize)
            .expect("image dimensions overflow");
        Self {
            data: vec![0; nbytes],
            width,
            height,
            bytes_per_line,
            format,
            color_table: Vec::new(),
            has_alpha_clut: false,
        }
    }

    /// Wrap existing pixel data.
    ///
    /// # Panics
    ///
    /// Panics if `bytes_per_line` is too small for `width` pixels at this
    /// depth, or if `data` is shorter than `bytes_per_line * height`.
    pub fn from_vec(
        data: Vec<u8>,
        width: u32,
        height: u32,
        bytes_per_line: usize,
        format: PixelFormat,
    ) -> Self {
        let row_bits = bytes_per_line
            .checked_mul(8)
            .expect("bytes_per_line overflow");
        assert!(
            row_bits >= width as usize * format.bits_per_pixel(),
            "bytes_per_line {bytes_per_line} too small for width {width}"
        );
        let nbytes = bytes_per_line
            .checked_mul(height as usize)
            .expect("image dimensions overflow");
        assert!(
            data.len() >= nbytes,
            "pixel data shorter than bytes_per_line * height"
        );
        Self {
            data,
            width,
            height,
            bytes_per_line,
            format,
            color_table: Vec::new(),
            has_alpha_clut: false,
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row stride in bytes.
    pub fn bytes_per_line(&self) -> usize {
        self.bytes_per_line
    }

    /// Pixel format.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// The raw pixel bytes, rows separated by [`bytes_per_line`](Self::bytes_per_line).
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the raw pixel bytes.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume the buffer, returning the pixel bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// One full row, `bytes_per_line` long.
    #[inline]
    pub fn scan_line(&self, y: usize) -> &[u8] {
        let start = y * self.bytes_per_line;
        &self.data[start..start + self.bytes_per_line]
    }

    /// Mutable access to one full row.
    #[inline]
    pub fn scan_line_mut(&mut self, y: usize) -> &mut [u8] {
        let start = y * self.bytes_per_line;
        &mut self.data[start..start + self.bytes_per_line]
    }

    /// The color table for indexed formats (empty for direct-color
    /// formats, and for grayscale [`Indexed8`](PixelFormat::Indexed8)).
    pub fn color_table(&self) -> &[u32] {
        &self.color_table
    }

    /// Replace the color table, recomputing [`has_alpha_clut`](Self::has_alpha_clut).
    ///
    /// # Panics
    ///
    /// Panics if the table has more than [`MAX_COLOR_TABLE`] entries.
    pub fn set_color_table(&mut self, table: Vec<u32>) {
        assert!(table.len() <= MAX_COLOR_TABLE, "color table too large");
        self.has_alpha_clut = table.iter().any(|&c| c >> 24 != 0xff);
        self.color_table = table;
    }

    /// Whether any color table entry carries non-opaque alpha.
    pub fn has_alpha_clut(&self) -> bool {
        self.has_alpha_clut
    }

    /// Read one pixel as a packed `0xAARRGGBB` color, resolving indexed
    /// formats through the color table. Intended for inspection and tests,
    /// not for per-pixel loops.
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        assert!(x < self.width && y < self.height);
        let mut px = [0u32; 1];
        crate::codec::fetch_run(self, y as usize, x as usize, &mut px);
        px[0]
    }

    pub(crate) fn set_color_table_raw(&mut self, table: Vec<u32>, has_alpha_clut: bool) {
        debug_assert!(table.len() <= MAX_COLOR_TABLE);
        self.color_table = table;
        self.has_alpha_clut = has_alpha_clut;
    }

    pub(crate) fn data_vec_mut(&mut self) -> &mut Vec<u8> {
        &mut self.data
    }

    /// Update stride and format in one step, the atomic tail of a
    /// completed in-place conversion.
    pub(crate) fn set_layout(&mut self, bytes_per_line: usize, format: PixelFormat) {
        debug_assert!(self.data.len() >= bytes_per_line * self.height as usize);
        self.bytes_per_line = bytes_per_line;
        self.format = format;
    }
}

#[cfg(feature = "rgb")]
impl RasterBuffer {
    /// Zero-copy view of an `*8888`-family buffer as typed RGBA pixels.
    ///
    /// `None` unless the format stores R,G,B,A bytes (little-endian
    /// targets only) and rows are tightly packed.
    pub fn as_rgba(&self) -> Option<&[rgb::RGBA8]> {
        use rgb::AsPixels as _;
        if cfg!(target_endian = "big") {
            return None;
        }
        if !matches!(
            self.format,
            PixelFormat::Rgbx8888 | PixelFormat::Rgba8888 | PixelFormat::Rgba8888Premultiplied
        ) {
            return None;
        }
        let row_bytes = self.width as usize * 4;
        if self.bytes_per_line != row_bytes {
            return None;
        }
        Some(self.data[..row_bytes * self.height as usize].as_pixels())
    }

    /// Zero-copy [`imgref::ImgRef`] view of an `*8888`-family buffer.
    #[cfg(feature = "imgref")]
    pub fn as_rgba_imgref(&self) -> Option<imgref::ImgRef<'_, rgb::RGBA8>> {
        let pixels = self.as_rgba()?;
        Some(imgref::ImgRef::new(
            pixels,
            self.width as usize,
            self.height as usize,
        ))
    }
}

/// The implicit palette of a grayscale `Indexed8` image: entry `i` is
/// opaque gray `i`.
pub(crate) fn grayscale_table() -> Vec<u32> {
    (0..=255u8).map(|i| crate::argb::rgb(i, i, i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stride_is_dword_aligned() {
        assert_eq!(default_stride(1, 1), 4);
        assert_eq!(default_stride(33, 1), 8);
        assert_eq!(default_stride(3, 8), 4);
        assert_eq!(default_stride(3, 16), 8);
        assert_eq!(default_stride(3, 32), 12);
    }

    #[test]
    fn scan_lines_are_stride_long() {
        let buf = RasterBuffer::new(3, 2, PixelFormat::Indexed8);
        assert_eq!(buf.bytes_per_line(), 4);
        assert_eq!(buf.scan_line(1).len(), 4);
        assert_eq!(buf.data().len(), 8);
    }

    #[test]
    fn color_table_alpha_detection() {
        let mut buf = RasterBuffer::new(1, 1, PixelFormat::Indexed8);
        buf.set_color_table(alloc::vec![crate::argb::rgb(1, 2, 3)]);
        assert!(!buf.has_alpha_clut());
        buf.set_color_table(alloc::vec![crate::argb::argb(128, 1, 2, 3)]);
        assert!(buf.has_alpha_clut());
    }
}
