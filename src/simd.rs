//! SIMD-accelerated table entries backed by `garb`'s strided swizzles.
//!
//! The pure channel-permutation converters between the `*32` and `*8888`
//! families are byte-level B↔R swaps on little-endian targets, which garb
//! dispatches to the widest vector unit available. The overrides are
//! patched into a copy of the base dispatch tables once, before first use.

use std::sync::OnceLock;

use crate::format::NFORMATS;
use crate::router::{Converter, InPlaceConverter, CONVERTER_MAP, INPLACE_MAP};
#[cfg(target_endian = "little")]
use crate::{
    buffer::RasterBuffer, direct, format::PixelFormat, inplace, router::ConvertFlags,
};

/// Format pairs whose converter is the bare channel permutation.
#[cfg(target_endian = "little")]
const SWIZZLE_PAIRS: [(PixelFormat, PixelFormat); 6] = [
    (PixelFormat::Argb32, PixelFormat::Rgba8888),
    (PixelFormat::Argb32Premultiplied, PixelFormat::Rgba8888Premultiplied),
    (PixelFormat::Rgba8888, PixelFormat::Argb32),
    (PixelFormat::Rgba8888Premultiplied, PixelFormat::Argb32Premultiplied),
    (PixelFormat::Rgbx8888, PixelFormat::Argb32),
    (PixelFormat::Rgbx8888, PixelFormat::Argb32Premultiplied),
];

#[cfg(target_endian = "little")]
fn convert_swap_channel_order_simd(
    dest: &mut RasterBuffer,
    src: &RasterBuffer,
    flags: ConvertFlags,
) {
    let width = src.width() as usize;
    let height = src.height() as usize;
    let src_stride = src.bytes_per_line();
    let dest_stride = dest.bytes_per_line();
    if garb::bytes::rgba_to_bgra_strided(
        src.data(),
        dest.data_mut(),
        width,
        height,
        src_stride,
        dest_stride,
    )
    .is_err()
    {
        // Degenerate geometry; take the scalar loop.
        direct::convert_swap_channel_order(dest, src, flags);
    }
}

#[cfg(target_endian = "little")]
fn convert_swap_channel_order_inplace_simd(
    buffer: &mut RasterBuffer,
    flags: ConvertFlags,
) -> Result<(), crate::ConvertError> {
    let width = buffer.width() as usize;
    let height = buffer.height() as usize;
    let stride = buffer.bytes_per_line();
    if garb::bytes::rgba_to_bgra_inplace_strided(buffer.data_mut(), width, height, stride).is_err() {
        return inplace::convert_swap_channel_order_inplace(buffer, flags);
    }
    Ok(())
}

pub(crate) fn converter_map() -> &'static [[Option<Converter>; NFORMATS]; NFORMATS] {
    static MAP: OnceLock<[[Option<Converter>; NFORMATS]; NFORMATS]> = OnceLock::new();
    MAP.get_or_init(|| {
        #[cfg(target_endian = "little")]
        {
            let mut map = CONVERTER_MAP;
            for (src, dest) in SWIZZLE_PAIRS {
                map[src.index()][dest.index()] = Some(convert_swap_channel_order_simd);
            }
            map
        }
        #[cfg(not(target_endian = "little"))]
        CONVERTER_MAP
    })
}

pub(crate) fn inplace_map() -> &'static [[Option<InPlaceConverter>; NFORMATS]; NFORMATS] {
    static MAP: OnceLock<[[Option<InPlaceConverter>; NFORMATS]; NFORMATS]> = OnceLock::new();
    MAP.get_or_init(|| {
        #[cfg(target_endian = "little")]
        {
            let mut map = INPLACE_MAP;
            for (src, dest) in SWIZZLE_PAIRS {
                if map[src.index()][dest.index()].is_some() {
                    map[src.index()][dest.index()] = Some(convert_swap_channel_order_inplace_simd);
                }
            }
            map
        }
        #[cfg(not(target_endian = "little"))]
        INPLACE_MAP
    })
}
