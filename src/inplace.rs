//! In-place converters: reinterpret or rewrite a buffer without a second
//! allocation.
//!
//! Same-depth conversions rewrite words where they sit. Depth-growing
//! conversions (`Indexed8` to 16/32-bit) regrow the backing store first
//! (the only fallible step, taken before any pixel is touched) and then
//! run backward, highest row and column first, so widened pixels never
//! overwrite source bytes that are still to be read.

use alloc::vec::Vec;

use crate::argb;
use crate::buffer::{self, RasterBuffer, MAX_COLOR_TABLE};
use crate::direct::fix_color_table;
use crate::error::ConvertError;
use crate::format::PixelFormat;
use crate::router::ConvertFlags;

fn for_each_word_inplace(buffer: &mut RasterBuffer, op: impl Fn(u32) -> u32) {
    let width = buffer.width() as usize;
    for y in 0..buffer.height() as usize {
        let row = &mut buffer.scan_line_mut(y)[..width * 4];
        for px in row.chunks_exact_mut(4) {
            let p = u32::from_ne_bytes(px.try_into().unwrap());
            px.copy_from_slice(&op(p).to_ne_bytes());
        }
    }
}

/// `Argb32`→`Argb32Premultiplied` (and the `8888` counterpart) in place.
pub(crate) fn convert_premultiply_inplace(
    buffer: &mut RasterBuffer,
    _: ConvertFlags,
) -> Result<(), ConvertError> {
    for_each_word_inplace(buffer, argb::premultiply);
    Ok(())
}

/// Channel-order permutation between the `*32` and `*8888` families,
/// either direction, in place.
pub(crate) fn convert_swap_channel_order_inplace(
    buffer: &mut RasterBuffer,
    _: ConvertFlags,
) -> Result<(), ConvertError> {
    for_each_word_inplace(buffer, argb::argb_to_rgba);
    Ok(())
}

/// `Rgba8888`→`Argb32Premultiplied` in place.
pub(crate) fn convert_rgba_to_argb_premultiply_inplace(
    buffer: &mut RasterBuffer,
    _: ConvertFlags,
) -> Result<(), ConvertError> {
    for_each_word_inplace(buffer, |p| argb::premultiply(argb::rgba_to_argb(p)));
    Ok(())
}

/// The expansion palette for in-place `Indexed8` growth: repaired for the
/// destination format and padded to 256 entries with the last color, so
/// out-of-range index bytes need no per-pixel clamp.
fn expansion_table(src: &RasterBuffer, dest_format: PixelFormat) -> Vec<u32> {
    let mut table = if src.color_table().is_empty() {
        buffer::grayscale_table()
    } else {
        fix_color_table(src.color_table(), dest_format)
    };
    let last = *table.last().unwrap_or(&0);
    table.resize(MAX_COLOR_TABLE, last);
    table
}

/// Regrow the backing store to `nbytes`, the only fallible step of the
/// growth conversions. On failure the buffer is untouched.
fn grow_data(buffer: &mut RasterBuffer, nbytes: usize) -> Result<(), ConvertError> {
    let data = buffer.data_vec_mut();
    let additional = nbytes.saturating_sub(data.len());
    data.try_reserve_exact(additional)
        .map_err(|_| ConvertError::AllocationFailure)?;
    data.resize(nbytes, 0);
    Ok(())
}

fn convert_indexed8_to_32bpp_inplace(
    buffer: &mut RasterBuffer,
    dest_format: PixelFormat,
) -> Result<(), ConvertError> {
    debug_assert_eq!(buffer.format(), PixelFormat::Indexed8);
    let width = buffer.width() as usize;
    let height = buffer.height() as usize;
    let src_stride = buffer.bytes_per_line();
    let dest_stride = buffer::default_stride(buffer.width(), 32);
    let nbytes = dest_stride
        .checked_mul(height)
        .ok_or(ConvertError::AllocationFailure)?;

    let table = expansion_table(buffer, dest_format);

    if src_stride <= dest_stride {
        grow_data(buffer, nbytes)?;
        let data = buffer.data_vec_mut();
        for y in (0..height).rev() {
            for x in (0..width).rev() {
                let color = table[data[y * src_stride + x] as usize];
                let offset = y * dest_stride + x * 4;
                data[offset..offset + 4].copy_from_slice(&color.to_ne_bytes());
            }
        }
    } else {
        // A source stride wider than the grown rows breaks the backward
        // overlap ordering; rebuild into a fresh allocation instead.
        let mut fresh = alloc_fresh(nbytes)?;
        for y in 0..height {
            let src_row = &buffer.data()[y * src_stride..];
            let dest_row = &mut fresh[y * dest_stride..y * dest_stride + width * 4];
            for (d, &index) in dest_row.chunks_exact_mut(4).zip(src_row.iter()) {
                d.copy_from_slice(&table[index as usize].to_ne_bytes());
            }
        }
        *buffer.data_vec_mut() = fresh;
    }

    buffer.set_color_table_raw(Vec::new(), false);
    buffer.set_layout(dest_stride, dest_format);
    Ok(())
}

/// Zero-filled destination storage for the wide-stride growth fallback;
/// fallible like [`grow_data`].
fn alloc_fresh(nbytes: usize) -> Result<Vec<u8>, ConvertError> {
    let mut fresh = Vec::new();
    fresh
        .try_reserve_exact(nbytes)
        .map_err(|_| ConvertError::AllocationFailure)?;
    fresh.resize(nbytes, 0);
    Ok(fresh)
}

/// `Indexed8`→`Rgb32` reusing the same allocation.
pub(crate) fn convert_indexed8_to_rgb32_inplace(
    buffer: &mut RasterBuffer,
    _: ConvertFlags,
) -> Result<(), ConvertError> {
    convert_indexed8_to_32bpp_inplace(buffer, PixelFormat::Rgb32)
}

/// `Indexed8`→`Argb32` reusing the same allocation; the color table
/// expands as-is (straight alpha).
pub(crate) fn convert_indexed8_to_argb32_inplace(
    buffer: &mut RasterBuffer,
    _: ConvertFlags,
) -> Result<(), ConvertError> {
    convert_indexed8_to_32bpp_inplace(buffer, PixelFormat::Argb32)
}

/// `Indexed8`→`Argb32Premultiplied` reusing the same allocation; the
/// color table is premultiplied before expansion.
pub(crate) fn convert_indexed8_to_argb_pm_inplace(
    buffer: &mut RasterBuffer,
    _: ConvertFlags,
) -> Result<(), ConvertError> {
    convert_indexed8_to_32bpp_inplace(buffer, PixelFormat::Argb32Premultiplied)
}

/// `Indexed8`→`Rgb16` reusing the same allocation.
pub(crate) fn convert_indexed8_to_rgb16_inplace(
    buffer: &mut RasterBuffer,
    _: ConvertFlags,
) -> Result<(), ConvertError> {
    debug_assert_eq!(buffer.format(), PixelFormat::Indexed8);
    let width = buffer.width() as usize;
    let height = buffer.height() as usize;
    let src_stride = buffer.bytes_per_line();
    let dest_stride = buffer::default_stride(buffer.width(), 16);
    let nbytes = dest_stride
        .checked_mul(height)
        .ok_or(ConvertError::AllocationFailure)?;

    let table: Vec<u16> = expansion_table(buffer, PixelFormat::Rgb16)
        .iter()
        .map(|&c| argb::pack_rgb16(c))
        .collect();

    if src_stride <= dest_stride {
        grow_data(buffer, nbytes)?;
        let data = buffer.data_vec_mut();
        for y in (0..height).rev() {
            for x in (0..width).rev() {
                let color = table[data[y * src_stride + x] as usize];
                let offset = y * dest_stride + x * 2;
                data[offset..offset + 2].copy_from_slice(&color.to_ne_bytes());
            }
        }
    } else {
        let mut fresh = alloc_fresh(nbytes)?;
        for y in 0..height {
            let src_row = &buffer.data()[y * src_stride..];
            let dest_row = &mut fresh[y * dest_stride..y * dest_stride + width * 2];
            for (d, &index) in dest_row.chunks_exact_mut(2).zip(src_row.iter()) {
                d.copy_from_slice(&table[index as usize].to_ne_bytes());
            }
        }
        *buffer.data_vec_mut() = fresh;
    }

    buffer.set_color_table_raw(Vec::new(), false);
    buffer.set_layout(dest_stride, PixelFormat::Rgb16);
    Ok(())
}

/// `Rgb32`→`Rgb16` reusing the same allocation: rows shrink, so the
/// rewrite runs forward and the buffer is truncated afterwards.
pub(crate) fn convert_rgb32_to_rgb16_inplace(
    buffer: &mut RasterBuffer,
    _: ConvertFlags,
) -> Result<(), ConvertError> {
    debug_assert_eq!(buffer.format(), PixelFormat::Rgb32);
    let width = buffer.width() as usize;
    let height = buffer.height() as usize;
    let src_stride = buffer.bytes_per_line();
    let dest_stride = buffer::default_stride(buffer.width(), 16);

    let data = buffer.data_vec_mut();
    for y in 0..height {
        for x in 0..width {
            let offset = y * src_stride + x * 4;
            let p = u32::from_ne_bytes(data[offset..offset + 4].try_into().unwrap());
            let c = argb::pack_rgb16(p);
            let offset = y * dest_stride + x * 2;
            data[offset..offset + 2].copy_from_slice(&c.to_ne_bytes());
        }
    }
    data.truncate(dest_stride * height);

    buffer.set_layout(dest_stride, PixelFormat::Rgb16);
    Ok(())
}
