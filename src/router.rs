//! Conversion routing: a format×format dispatch table picks a direct
//! converter, an in-place converter, or the generic canonical pivot.

use crate::buffer::RasterBuffer;
use crate::codec;
use crate::direct;
use crate::error::ConvertError;
use crate::format::{PixelFormat, NFORMATS};
use crate::inplace;
use crate::mono;
use crate::quantize;

/// Dithering strategy for color-depth reduction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DitherMode {
    /// Round each value to the nearest representable level.
    Threshold,
    /// Bias the threshold per pixel with a fixed 16×16 Bayer matrix.
    Ordered,
    /// Propagate quantization error to neighboring pixels.
    Diffuse,
}

/// Options controlling conversions to indexed and 1-bit formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConvertFlags {
    /// Strategy for color and luminance reduction.
    pub dither: DitherMode,
    /// Strategy for 1-bit alpha mask generation.
    pub alpha_dither: DitherMode,
    /// Skip exact color enumeration and quantize against the color cube
    /// even when at most 256 distinct colors exist. Useful when later
    /// frames will introduce more colors and a stable palette is wanted.
    pub prefer_dither: bool,
}

impl Default for ConvertFlags {
    fn default() -> Self {
        Self {
            dither: DitherMode::Diffuse,
            alpha_dither: DitherMode::Threshold,
            prefer_dither: false,
        }
    }
}

/// A whole-image converter writing into a freshly allocated destination.
pub(crate) type Converter = fn(&mut RasterBuffer, &RasterBuffer, ConvertFlags);

/// A whole-image converter mutating the buffer it is given.
pub(crate) type InPlaceConverter = fn(&mut RasterBuffer, ConvertFlags) -> Result<(), ConvertError>;

// Rows are the source format, columns the destination, in PixelFormat
// order: Mono, MonoLsb, Indexed8, Rgb32, Argb32, Argb32Premultiplied,
// Rgb16, Rgbx8888, Rgba8888, Rgba8888Premultiplied. A `None` entry routes
// through the canonical pivot (or a two-step pivot for indexed and 1-bit
// destinations).
pub(crate) static CONVERTER_MAP: [[Option<Converter>; NFORMATS]; NFORMATS] = [
    // Mono
    [
        None,
        Some(direct::convert_swap_bit_order),
        Some(direct::convert_mono_to_indexed8),
        Some(direct::convert_mono_to_x32),
        Some(direct::convert_mono_to_x32),
        Some(direct::convert_mono_to_x32),
        None,
        None,
        None,
        None,
    ],
    // MonoLsb
    [
        Some(direct::convert_swap_bit_order),
        None,
        Some(direct::convert_mono_to_indexed8),
        Some(direct::convert_mono_to_x32),
        Some(direct::convert_mono_to_x32),
        Some(direct::convert_mono_to_x32),
        None,
        None,
        None,
        None,
    ],
    // Indexed8
    [
        Some(mono::convert_x_to_mono),
        Some(mono::convert_x_to_mono),
        None,
        Some(direct::convert_indexed8_to_x32),
        Some(direct::convert_indexed8_to_x32),
        Some(direct::convert_indexed8_to_x32),
        None,
        None,
        None,
        None,
    ],
    // Rgb32
    [
        Some(mono::convert_x_to_mono),
        Some(mono::convert_x_to_mono),
        Some(quantize::convert_rgb_to_indexed8),
        None,
        Some(direct::convert_mask_alpha),
        Some(direct::convert_mask_alpha),
        None,
        Some(direct::convert_rgb_to_rgba),
        Some(direct::convert_rgb_to_rgba),
        Some(direct::convert_rgb_to_rgba),
    ],
    // Argb32
    [
        Some(mono::convert_x_to_mono),
        Some(mono::convert_x_to_mono),
        Some(quantize::convert_rgb_to_indexed8),
        Some(direct::convert_mask_alpha),
        None,
        Some(direct::convert_premultiply),
        None,
        Some(direct::convert_argb_to_rgbx),
        Some(direct::convert_swap_channel_order),
        Some(direct::convert_argb_to_rgba_premultiply),
    ],
    // Argb32Premultiplied
    [
        Some(mono::convert_argb_pm_to_mono),
        Some(mono::convert_argb_pm_to_mono),
        Some(quantize::convert_argb_pm_to_indexed8),
        Some(direct::convert_unpremultiply_opaque),
        Some(direct::convert_unpremultiply),
        None,
        None,
        Some(direct::convert_argb_pm_to_rgbx),
        Some(direct::convert_argb_pm_to_rgba),
        Some(direct::convert_swap_channel_order),
    ],
    // Rgb16
    [
        None, None, None, None, None, None, None, None, None, None,
    ],
    // Rgbx8888
    [
        None,
        None,
        None,
        Some(direct::convert_rgba_to_rgb),
        Some(direct::convert_swap_channel_order),
        Some(direct::convert_swap_channel_order),
        None,
        None,
        Some(direct::convert_mask_alpha),
        Some(direct::convert_mask_alpha),
    ],
    // Rgba8888
    [
        None,
        None,
        None,
        Some(direct::convert_rgba_to_rgb),
        Some(direct::convert_swap_channel_order),
        Some(direct::convert_rgba_to_argb_premultiply),
        None,
        Some(direct::convert_mask_alpha),
        None,
        Some(direct::convert_premultiply),
    ],
    // Rgba8888Premultiplied
    [
        None,
        None,
        None,
        Some(direct::convert_rgba_pm_to_rgb),
        Some(direct::convert_rgba_pm_to_argb),
        Some(direct::convert_swap_channel_order),
        None,
        Some(direct::convert_unpremultiply_opaque),
        Some(direct::convert_unpremultiply),
        None,
    ],
];

// In-place conversions: valid when the depths allow reuse of the backing
// store. The `Indexed8` row regrows the allocation and converts backward;
// everything else rewrites words where they sit.
pub(crate) static INPLACE_MAP: [[Option<InPlaceConverter>; NFORMATS]; NFORMATS] = [
    // Mono
    [
        None, None, None, None, None, None, None, None, None, None,
    ],
    // MonoLsb
    [
        None, None, None, None, None, None, None, None, None, None,
    ],
    // Indexed8
    [
        None,
        None,
        None,
        Some(inplace::convert_indexed8_to_rgb32_inplace),
        Some(inplace::convert_indexed8_to_argb32_inplace),
        Some(inplace::convert_indexed8_to_argb_pm_inplace),
        Some(inplace::convert_indexed8_to_rgb16_inplace),
        None,
        None,
        None,
    ],
    // Rgb32
    [
        None,
        None,
        None,
        None,
        None,
        None,
        Some(inplace::convert_rgb32_to_rgb16_inplace),
        None,
        None,
        None,
    ],
    // Argb32
    [
        None,
        None,
        None,
        None,
        None,
        Some(inplace::convert_premultiply_inplace),
        None,
        None,
        Some(inplace::convert_swap_channel_order_inplace),
        None,
    ],
    // Argb32Premultiplied
    [
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        Some(inplace::convert_swap_channel_order_inplace),
    ],
    // Rgb16
    [
        None, None, None, None, None, None, None, None, None, None,
    ],
    // Rgbx8888
    [
        None,
        None,
        None,
        Some(inplace::convert_swap_channel_order_inplace),
        Some(inplace::convert_swap_channel_order_inplace),
        Some(inplace::convert_swap_channel_order_inplace),
        None,
        None,
        None,
        None,
    ],
    // Rgba8888
    [
        None,
        None,
        None,
        None,
        Some(inplace::convert_swap_channel_order_inplace),
        Some(inplace::convert_rgba_to_argb_premultiply_inplace),
        None,
        None,
        None,
        Some(inplace::convert_premultiply_inplace),
    ],
    // Rgba8888Premultiplied
    [
        None,
        None,
        None,
        None,
        None,
        Some(inplace::convert_swap_channel_order_inplace),
        None,
        None,
        None,
        None,
    ],
];

#[cfg(feature = "simd")]
fn converter_entry(src: PixelFormat, dest: PixelFormat) -> Option<Converter> {
    crate::simd::converter_map()[src.index()][dest.index()]
}

#[cfg(not(feature = "simd"))]
fn converter_entry(src: PixelFormat, dest: PixelFormat) -> Option<Converter> {
    CONVERTER_MAP[src.index()][dest.index()]
}

#[cfg(feature = "simd")]
fn inplace_entry(src: PixelFormat, dest: PixelFormat) -> Option<InPlaceConverter> {
    crate::simd::inplace_map()[src.index()][dest.index()]
}

#[cfg(not(feature = "simd"))]
fn inplace_entry(src: PixelFormat, dest: PixelFormat) -> Option<InPlaceConverter> {
    INPLACE_MAP[src.index()][dest.index()]
}

/// Generic path: pivot every chunk through canonical premultiplied ARGB32.
fn convert_generic(dest: &mut RasterBuffer, src: &RasterBuffer) {
    debug_assert!(dest.format().is_direct());
    let mut run = [0u32; codec::CHUNK];
    let width = src.width() as usize;
    let dest_format = dest.format();
    for y in 0..src.height() as usize {
        let mut x = 0;
        while x < width {
            let n = (width - x).min(codec::CHUNK);
            codec::fetch_run(src, y, x, &mut run[..n]);
            codec::store_run(dest, dest_format, y, x, &mut run[..n]);
            x += n;
        }
    }
}

/// Generic path over a single buffer; valid when source and destination
/// depths match and both are direct-color.
fn convert_generic_inplace(buffer: &mut RasterBuffer, dest_format: PixelFormat) {
    debug_assert_eq!(
        buffer.format().bits_per_pixel(),
        dest_format.bits_per_pixel()
    );
    let mut run = [0u32; codec::CHUNK];
    let width = buffer.width() as usize;
    for y in 0..buffer.height() as usize {
        let mut x = 0;
        while x < width {
            let n = (width - x).min(codec::CHUNK);
            codec::fetch_run(buffer, y, x, &mut run[..n]);
            codec::store_run(buffer, dest_format, y, x, &mut run[..n]);
            x += n;
        }
    }
    let stride = buffer.bytes_per_line();
    buffer.set_layout(stride, dest_format);
}

/// The pivot format for two-step conversions to indexed and 1-bit
/// destinations.
fn pivot_format(src: &RasterBuffer) -> PixelFormat {
    if src.format().has_alpha() || (src.format().is_indexed() && src.has_alpha_clut()) {
        PixelFormat::Argb32
    } else {
        PixelFormat::Rgb32
    }
}

/// Convert into a freshly allocated buffer, leaving `src` untouched.
///
/// A `target` equal to the source format returns a plain copy; skipping
/// the call entirely is the caller's job.
pub fn converted(
    src: &RasterBuffer,
    target: PixelFormat,
    flags: ConvertFlags,
) -> Result<RasterBuffer, ConvertError> {
    let source = src.format();
    if source == target {
        return Ok(src.clone());
    }

    if let Some(converter) = converter_entry(source, target) {
        let mut dest = RasterBuffer::new(src.width(), src.height(), target);
        converter(&mut dest, src, flags);
        return Ok(dest);
    }

    if target.is_direct() {
        let mut dest = RasterBuffer::new(src.width(), src.height(), target);
        convert_generic(&mut dest, src);
        return Ok(dest);
    }

    // Indexed or 1-bit destination with no direct entry: pivot through a
    // 32-bit format, then take the table-driven second hop.
    let pivot = pivot_format(src);
    if source == pivot {
        return Err(ConvertError::UnsupportedPair {
            src: source,
            dest: target,
        });
    }
    let tmp = converted(src, pivot, flags)?;
    converted(&tmp, target, flags)
}

/// Convert `buffer` to `target` in place when the formats' depths permit,
/// otherwise by replacing the backing store. See
/// [`RasterBuffer::convert`] for the full contract.
pub fn convert(
    buffer: &mut RasterBuffer,
    target: PixelFormat,
    flags: ConvertFlags,
) -> Result<(), ConvertError> {
    let source = buffer.format();
    if source == target {
        // Identity conversion is the caller's responsibility to skip; the
        // router leaves the buffer untouched.
        return Ok(());
    }

    if let Some(converter) = inplace_entry(source, target) {
        converter(buffer, flags)?;
        // Word-rewriting converters leave the layout update to the router;
        // the depth-growing ones have already installed theirs.
        let stride = buffer.bytes_per_line();
        buffer.set_layout(stride, target);
        return Ok(());
    }

    if source.is_direct()
        && target.is_direct()
        && source.bits_per_pixel() == target.bits_per_pixel()
    {
        convert_generic_inplace(buffer, target);
        return Ok(());
    }

    *buffer = converted(buffer, target, flags)?;
    Ok(())
}

/// Convert a 32-bit image to `Indexed8`, seeding color enumeration from
/// `color_table` so that matching pixels keep their existing indices.
/// Other sources and targets fall back to the plain conversion.
pub fn converted_with_color_table(
    src: &RasterBuffer,
    target: PixelFormat,
    flags: ConvertFlags,
    color_table: &[u32],
) -> Result<RasterBuffer, ConvertError> {
    if target != PixelFormat::Indexed8 || src.format().bits_per_pixel() != 32 {
        return converted(src, target, flags);
    }
    let mut dest = RasterBuffer::new(src.width(), src.height(), target);
    dest.set_color_table(color_table.to_vec());
    match src.format() {
        PixelFormat::Rgb32 | PixelFormat::Argb32 => {
            quantize::convert_rgb_to_indexed8(&mut dest, src, flags);
        }
        PixelFormat::Argb32Premultiplied => {
            let tmp = converted(src, PixelFormat::Argb32, flags)?;
            quantize::convert_rgb_to_indexed8(&mut dest, &tmp, flags);
        }
        _ => {
            // The 8888 family pivots through its *32 counterpart first.
            let tmp = converted(src, pivot_format(src), flags)?;
            quantize::convert_rgb_to_indexed8(&mut dest, &tmp, flags);
        }
    }
    Ok(dest)
}

impl RasterBuffer {
    /// Convert this buffer to `target`.
    ///
    /// Strategy, in order: an in-place converter from the dispatch table
    /// (the only path that can fail, with
    /// [`AllocationFailure`](ConvertError::AllocationFailure) leaving the
    /// buffer untouched); the generic canonical pivot in place when depths
    /// match; otherwise a freshly allocated destination that replaces the
    /// backing store on success. The buffer is never left partially
    /// converted.
    ///
    /// Converting to the format the buffer already has is a no-op; callers
    /// are expected not to ask.
    pub fn convert(&mut self, target: PixelFormat, flags: ConvertFlags) -> Result<(), ConvertError> {
        convert(self, target, flags)
    }

    /// Like [`convert`](Self::convert), but leaves `self` untouched and
    /// returns the converted image.
    pub fn converted(
        &self,
        target: PixelFormat,
        flags: ConvertFlags,
    ) -> Result<RasterBuffer, ConvertError> {
        converted(self, target, flags)
    }

    /// Convert to `Indexed8`, seeding the palette from `color_table`.
    pub fn converted_with_color_table(
        &self,
        target: PixelFormat,
        flags: ConvertFlags,
        color_table: &[u32],
    ) -> Result<RasterBuffer, ConvertError> {
        converted_with_color_table(self, target, flags, color_table)
    }

    /// Mutating form of
    /// [`converted_with_color_table`](Self::converted_with_color_table).
    pub fn convert_with_color_table(
        &mut self,
        target: PixelFormat,
        flags: ConvertFlags,
        color_table: &[u32],
    ) -> Result<(), ConvertError> {
        *self = converted_with_color_table(self, target, flags, color_table)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_a_no_op() {
        let mut buf = RasterBuffer::new(2, 2, PixelFormat::Argb32);
        buf.scan_line_mut(0)[0] = 0x5a;
        let before = buf.clone();
        buf.convert(PixelFormat::Argb32, ConvertFlags::default())
            .unwrap();
        assert_eq!(buf, before);
    }

    #[test]
    fn every_pair_routes() {
        const FORMATS: [PixelFormat; NFORMATS] = [
            PixelFormat::Mono,
            PixelFormat::MonoLsb,
            PixelFormat::Indexed8,
            PixelFormat::Rgb32,
            PixelFormat::Argb32,
            PixelFormat::Argb32Premultiplied,
            PixelFormat::Rgb16,
            PixelFormat::Rgbx8888,
            PixelFormat::Rgba8888,
            PixelFormat::Rgba8888Premultiplied,
        ];
        for &src_format in &FORMATS {
            for &target in &FORMATS {
                let src = RasterBuffer::new(5, 3, src_format);
                let out = src.converted(target, ConvertFlags::default()).unwrap();
                assert_eq!(out.format(), target, "{src_format:?} -> {target:?}");
            }
        }
    }
}
