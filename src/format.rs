/// In-memory pixel format of a [`RasterBuffer`](crate::RasterBuffer).
///
/// The set is closed: every format is a compile-time constant and the
/// conversion dispatch tables are sized to this enumeration.
///
/// 32-bit formats are packed native words. The `*32` family is `0xAARRGGBB`;
/// the `*8888` family is the channel-swapped word `0xAABBGGRR`, which on
/// little-endian targets lays out as R,G,B,A bytes in memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum PixelFormat {
    /// 1 bit per pixel, most significant bit first, indexed by a
    /// 2-entry color table.
    Mono = 0,
    /// 1 bit per pixel, least significant bit first.
    MonoLsb = 1,
    /// 8 bits per pixel, indexed by a color table of up to 256 entries.
    /// An empty table means grayscale (entry `i` is opaque gray `i`).
    Indexed8 = 2,
    /// 32-bit `0xffRRGGBB`; the top byte is opaque by construction.
    Rgb32 = 3,
    /// 32-bit `0xAARRGGBB`, straight alpha.
    Argb32 = 4,
    /// 32-bit `0xAARRGGBB` with R, G, B premultiplied by alpha.
    /// The canonical interchange format.
    Argb32Premultiplied = 5,
    /// 16-bit RGB565.
    Rgb16 = 6,
    /// 32-bit `0xffBBGGRR` (R,G,B,x bytes on little endian), opaque.
    Rgbx8888 = 7,
    /// 32-bit `0xAABBGGRR` (R,G,B,A bytes on little endian), straight alpha.
    Rgba8888 = 8,
    /// [`Rgba8888`](Self::Rgba8888) with premultiplied channels.
    Rgba8888Premultiplied = 9,
}

/// Number of pixel formats; dimension of the dispatch tables.
pub(crate) const NFORMATS: usize = 10;

impl PixelFormat {
    /// Bits per pixel.
    pub const fn bits_per_pixel(self) -> usize {
        match self {
            Self::Mono | Self::MonoLsb => 1,
            Self::Indexed8 => 8,
            Self::Rgb16 => 16,
            Self::Rgb32
            | Self::Argb32
            | Self::Argb32Premultiplied
            | Self::Rgbx8888
            | Self::Rgba8888
            | Self::Rgba8888Premultiplied => 32,
        }
    }

    /// Whether pixels are indices into a color table (1-bit and 8-bit
    /// formats).
    pub const fn is_indexed(self) -> bool {
        matches!(self, Self::Mono | Self::MonoLsb | Self::Indexed8)
    }

    /// Whether pixels encode color directly rather than through a table.
    pub const fn is_direct(self) -> bool {
        !self.is_indexed()
    }

    /// Whether the format carries an alpha channel.
    pub const fn has_alpha(self) -> bool {
        matches!(
            self,
            Self::Argb32
                | Self::Argb32Premultiplied
                | Self::Rgba8888
                | Self::Rgba8888Premultiplied
        )
    }

    /// Whether color channels are premultiplied by alpha.
    pub const fn is_premultiplied(self) -> bool {
        matches!(self, Self::Argb32Premultiplied | Self::Rgba8888Premultiplied)
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}
