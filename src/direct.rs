//! Direct converters: per-pair fast paths that bypass the canonical pivot.
//!
//! Every routine here is an optimization only: its output is bit-identical
//! to what the generic fetch/store pivot would produce for the same pair.

use alloc::vec::Vec;

use crate::argb;
use crate::buffer::{self, RasterBuffer};
use crate::format::PixelFormat;
use crate::router::ConvertFlags;

/// Apply a word-level transform to every pixel of a 32-bit image pair.
fn for_each_word(dest: &mut RasterBuffer, src: &RasterBuffer, op: impl Fn(u32) -> u32) {
    debug_assert_eq!(src.width(), dest.width());
    debug_assert_eq!(src.height(), dest.height());
    let width = src.width() as usize;
    for y in 0..src.height() as usize {
        let src_row = &src.scan_line(y)[..width * 4];
        let dest_row = &mut dest.scan_line_mut(y)[..width * 4];
        for (d, s) in dest_row.chunks_exact_mut(4).zip(src_row.chunks_exact(4)) {
            let p = u32::from_ne_bytes(s.try_into().unwrap());
            d.copy_from_slice(&op(p).to_ne_bytes());
        }
    }
}

// ── 32-bit word transforms ──────────────────────────────────────────

/// `Rgb32`→`Argb32`/`Argb32Premultiplied` and `Argb32`→`Rgb32`:
/// force the alpha byte opaque, everything else unchanged.
pub(crate) fn convert_mask_alpha(dest: &mut RasterBuffer, src: &RasterBuffer, _: ConvertFlags) {
    for_each_word(dest, src, |p| p | 0xff00_0000);
}

/// Straight alpha → premultiplied, same channel order.
pub(crate) fn convert_premultiply(dest: &mut RasterBuffer, src: &RasterBuffer, _: ConvertFlags) {
    for_each_word(dest, src, argb::premultiply);
}

/// Premultiplied → straight alpha, same channel order.
pub(crate) fn convert_unpremultiply(dest: &mut RasterBuffer, src: &RasterBuffer, _: ConvertFlags) {
    for_each_word(dest, src, argb::unpremultiply);
}

/// `Argb32Premultiplied`→`Rgb32`: unpremultiply, then discard alpha.
pub(crate) fn convert_unpremultiply_opaque(
    dest: &mut RasterBuffer,
    src: &RasterBuffer,
    _: ConvertFlags,
) {
    for_each_word(dest, src, |p| 0xff00_0000 | argb::unpremultiply(p));
}

/// Pure channel permutation between the `*32` and `*8888` families,
/// in either direction (the permutation is an involution).
pub(crate) fn convert_swap_channel_order(
    dest: &mut RasterBuffer,
    src: &RasterBuffer,
    _: ConvertFlags,
) {
    for_each_word(dest, src, argb::argb_to_rgba);
}

/// `Argb32`→`Rgbx8888`: discard alpha, permute.
pub(crate) fn convert_argb_to_rgbx(dest: &mut RasterBuffer, src: &RasterBuffer, _: ConvertFlags) {
    for_each_word(dest, src, |p| argb::argb_to_rgba(0xff00_0000 | p));
}

/// `Argb32`→`Rgba8888Premultiplied`.
pub(crate) fn convert_argb_to_rgba_premultiply(
    dest: &mut RasterBuffer,
    src: &RasterBuffer,
    _: ConvertFlags,
) {
    for_each_word(dest, src, |p| argb::argb_to_rgba(argb::premultiply(p)));
}

/// `Rgba8888`→`Argb32Premultiplied`.
pub(crate) fn convert_rgba_to_argb_premultiply(
    dest: &mut RasterBuffer,
    src: &RasterBuffer,
    _: ConvertFlags,
) {
    for_each_word(dest, src, |p| argb::premultiply(argb::rgba_to_argb(p)));
}

/// `Argb32Premultiplied`→`Rgbx8888`.
pub(crate) fn convert_argb_pm_to_rgbx(
    dest: &mut RasterBuffer,
    src: &RasterBuffer,
    _: ConvertFlags,
) {
    for_each_word(dest, src, |p| {
        argb::argb_to_rgba(0xff00_0000 | argb::unpremultiply(p))
    });
}

/// `Argb32Premultiplied`→`Rgba8888`.
pub(crate) fn convert_argb_pm_to_rgba(
    dest: &mut RasterBuffer,
    src: &RasterBuffer,
    _: ConvertFlags,
) {
    for_each_word(dest, src, |p| argb::argb_to_rgba(argb::unpremultiply(p)));
}

/// `Rgba8888Premultiplied`→`Argb32`.
pub(crate) fn convert_rgba_pm_to_argb(
    dest: &mut RasterBuffer,
    src: &RasterBuffer,
    _: ConvertFlags,
) {
    for_each_word(dest, src, |p| argb::unpremultiply(argb::rgba_to_argb(p)));
}

/// `Rgba8888Premultiplied`→`Rgb32`.
pub(crate) fn convert_rgba_pm_to_rgb(
    dest: &mut RasterBuffer,
    src: &RasterBuffer,
    _: ConvertFlags,
) {
    for_each_word(dest, src, |p| {
        0xff00_0000 | argb::unpremultiply(argb::rgba_to_argb(p))
    });
}

/// `Rgbx8888`/`Rgba8888`→`Rgb32`: permute, discard alpha.
pub(crate) fn convert_rgba_to_rgb(dest: &mut RasterBuffer, src: &RasterBuffer, _: ConvertFlags) {
    for_each_word(dest, src, |p| argb::rgba_to_argb(p) | 0xff00_0000);
}

/// `Rgb32`→`Rgbx8888`/`Rgba8888`/`Rgba8888Premultiplied`.
pub(crate) fn convert_rgb_to_rgba(dest: &mut RasterBuffer, src: &RasterBuffer, _: ConvertFlags) {
    for_each_word(dest, src, |p| argb::argb_to_rgba(p | 0xff00_0000));
}

// ── 1-bit and indexed sources ───────────────────────────────────────

/// `Mono`↔`MonoLsb`: mirror the bits of every byte through the static
/// reversal table. The color table travels with the pixels.
pub(crate) fn convert_swap_bit_order(dest: &mut RasterBuffer, src: &RasterBuffer, _: ConvertFlags) {
    let row_bytes = (src.width() as usize).div_ceil(8);
    for y in 0..src.height() as usize {
        let src_row = &src.scan_line(y)[..row_bytes];
        let dest_row = &mut dest.scan_line_mut(y)[..row_bytes];
        for (d, &s) in dest_row.iter_mut().zip(src_row.iter()) {
            *d = crate::tables::BITFLIP[s as usize];
        }
    }
    dest.set_color_table_raw(src.color_table().to_vec(), src.has_alpha_clut());
}

/// Adapt a color table to the destination format: force entries opaque for
/// `Rgb32`, premultiply them for `Argb32Premultiplied`.
pub(crate) fn fix_color_table(table: &[u32], dest_format: PixelFormat) -> Vec<u32> {
    match dest_format {
        PixelFormat::Rgb32 => table.iter().map(|&c| c | 0xff00_0000).collect(),
        PixelFormat::Argb32Premultiplied => table.iter().map(|&c| argb::premultiply(c)).collect(),
        _ => table.to_vec(),
    }
}

/// `Mono`/`MonoLsb` → 32-bit formats: expand through the (repaired)
/// 2-entry color table, defaulting to black/white.
pub(crate) fn convert_mono_to_x32(dest: &mut RasterBuffer, src: &RasterBuffer, _: ConvertFlags) {
    let mut table = fix_color_table(src.color_table(), dest.format());
    if table.is_empty() {
        table.push(0xff00_0000);
    }
    if table.len() < 2 {
        table.push(0xffff_ffff);
    }

    let lsb = src.format() == PixelFormat::MonoLsb;
    let width = src.width() as usize;
    for y in 0..src.height() as usize {
        let src_row = src.scan_line(y);
        let dest_row = &mut dest.scan_line_mut(y)[..width * 4];
        for (x, d) in dest_row.chunks_exact_mut(4).enumerate() {
            let shift = if lsb { x & 7 } else { 7 - (x & 7) };
            let bit = (src_row[x >> 3] >> shift) & 1;
            d.copy_from_slice(&table[bit as usize].to_ne_bytes());
        }
    }
}

/// `Mono`/`MonoLsb` → `Indexed8`: unpack bits to index bytes; the 2-entry
/// color table travels, truncated or padded to exactly two entries.
pub(crate) fn convert_mono_to_indexed8(
    dest: &mut RasterBuffer,
    src: &RasterBuffer,
    _: ConvertFlags,
) {
    let mut table = src.color_table().to_vec();
    table.truncate(2);
    if table.is_empty() {
        table.push(0xff00_0000);
    }
    if table.len() < 2 {
        table.push(0xffff_ffff);
    }
    dest.set_color_table_raw(table, src.has_alpha_clut());

    let lsb = src.format() == PixelFormat::MonoLsb;
    let width = src.width() as usize;
    for y in 0..src.height() as usize {
        let src_row = src.scan_line(y);
        let dest_row = &mut dest.scan_line_mut(y)[..width];
        for (x, d) in dest_row.iter_mut().enumerate() {
            let shift = if lsb { x & 7 } else { 7 - (x & 7) };
            *d = (src_row[x >> 3] >> shift) & 1;
        }
    }
}

/// `Indexed8` → 32-bit formats: expand through the (repaired) color
/// table, clamping out-of-range bytes to the last entry. An empty table
/// means grayscale.
pub(crate) fn convert_indexed8_to_x32(
    dest: &mut RasterBuffer,
    src: &RasterBuffer,
    _: ConvertFlags,
) {
    let table = if src.color_table().is_empty() {
        buffer::grayscale_table()
    } else {
        fix_color_table(src.color_table(), dest.format())
    };
    let last = table.len() - 1;

    let width = src.width() as usize;
    for y in 0..src.height() as usize {
        let src_row = &src.scan_line(y)[..width];
        let dest_row = &mut dest.scan_line_mut(y)[..width * 4];
        for (d, &index) in dest_row.chunks_exact_mut(4).zip(src_row.iter()) {
            d.copy_from_slice(&table[(index as usize).min(last)].to_ne_bytes());
        }
    }
}
