//! Fetch/store of pixel runs between any [`PixelFormat`] and the canonical
//! premultiplied ARGB32 representation.
//!
//! The canonical form is the pivot used when no direct converter exists
//! for a format pair: premultiplication is a property of the canonical
//! form and is always applied on fetch; stores to straight-alpha formats
//! divide it back out.

use crate::argb;
use crate::buffer::RasterBuffer;
use crate::format::PixelFormat;

/// Pixels per fetch/store run; bounds the scratch buffer of the generic
/// conversion loop. Callers must loop over wider images.
pub(crate) const CHUNK: usize = 2048;

/// Read raw pixel values (indices or packed words, widened to `u32`) from
/// a row, starting at column `x`.
fn fetch_raw(format: PixelFormat, row: &[u8], x: usize, out: &mut [u32]) {
    match format.bits_per_pixel() {
        1 => {
            let lsb = format == PixelFormat::MonoLsb;
            for (i, px) in out.iter_mut().enumerate() {
                let index = x + i;
                let shift = if lsb { index & 7 } else { !index & 7 };
                *px = u32::from((row[index >> 3] >> shift) & 1);
            }
        }
        8 => {
            for (i, px) in out.iter_mut().enumerate() {
                *px = u32::from(row[x + i]);
            }
        }
        16 => {
            let words = &row[x * 2..];
            for (chunk, px) in words.chunks_exact(2).zip(out.iter_mut()) {
                *px = u32::from(u16::from_ne_bytes([chunk[0], chunk[1]]));
            }
        }
        _ => {
            let words = &row[x * 4..];
            for (chunk, px) in words.chunks_exact(4).zip(out.iter_mut()) {
                *px = u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            }
        }
    }
}

/// Write converted pixel values into a row starting at column `x`.
/// Only 16- and 32-bit destinations reach this; indexed and 1-bit
/// destinations are produced by the quantizer and mono ditherer.
fn store_raw(format: PixelFormat, row: &mut [u8], x: usize, src: &[u32]) {
    match format.bits_per_pixel() {
        16 => {
            let words = &mut row[x * 2..];
            for (chunk, &px) in words.chunks_exact_mut(2).zip(src.iter()) {
                chunk.copy_from_slice(&(px as u16).to_ne_bytes());
            }
        }
        32 => {
            let words = &mut row[x * 4..];
            for (chunk, &px) in words.chunks_exact_mut(4).zip(src.iter()) {
                chunk.copy_from_slice(&px.to_ne_bytes());
            }
        }
        _ => debug_assert!(false, "store_raw on indexed destination"),
    }
}

/// Expand raw indexed values through a color table, premultiplying into
/// canonical form. Out-of-range bytes clamp to the last entry.
fn expand_indexed(format: PixelFormat, table: &[u32], run: &mut [u32]) {
    if table.is_empty() {
        if format == PixelFormat::Indexed8 {
            // Grayscale fallback: index i is opaque gray i.
            for px in run.iter_mut() {
                *px = 0xff00_0000 | (*px << 16) | (*px << 8) | *px;
            }
        } else {
            // Default mono palette: 0 black, 1 white.
            for px in run.iter_mut() {
                *px = if *px == 0 { 0xff00_0000 } else { 0xffff_ffff };
            }
        }
        return;
    }
    let last = table.len() - 1;
    for px in run.iter_mut() {
        let index = (*px as usize).min(last);
        *px = argb::premultiply(table[index]);
    }
}

fn to_canonical(format: PixelFormat, table: &[u32], run: &mut [u32]) {
    match format {
        PixelFormat::Mono | PixelFormat::MonoLsb | PixelFormat::Indexed8 => {
            expand_indexed(format, table, run)
        }
        PixelFormat::Rgb32 => {
            for px in run.iter_mut() {
                *px |= 0xff00_0000;
            }
        }
        PixelFormat::Argb32 => {
            for px in run.iter_mut() {
                *px = argb::premultiply(*px);
            }
        }
        PixelFormat::Argb32Premultiplied => {}
        PixelFormat::Rgb16 => {
            for px in run.iter_mut() {
                *px = argb::unpack_rgb16(*px as u16);
            }
        }
        PixelFormat::Rgbx8888 => {
            for px in run.iter_mut() {
                *px = argb::rgba_to_argb(*px) | 0xff00_0000;
            }
        }
        PixelFormat::Rgba8888 => {
            for px in run.iter_mut() {
                *px = argb::premultiply(argb::rgba_to_argb(*px));
            }
        }
        PixelFormat::Rgba8888Premultiplied => {
            for px in run.iter_mut() {
                *px = argb::rgba_to_argb(*px);
            }
        }
    }
}

fn from_canonical(format: PixelFormat, run: &mut [u32]) {
    match format {
        PixelFormat::Rgb32 => {
            for px in run.iter_mut() {
                *px = 0xff00_0000 | argb::unpremultiply(*px);
            }
        }
        PixelFormat::Argb32 => {
            for px in run.iter_mut() {
                *px = argb::unpremultiply(*px);
            }
        }
        PixelFormat::Argb32Premultiplied => {}
        PixelFormat::Rgb16 => {
            for px in run.iter_mut() {
                *px = u32::from(argb::pack_rgb16(argb::unpremultiply(*px)));
            }
        }
        PixelFormat::Rgbx8888 => {
            for px in run.iter_mut() {
                *px = argb::argb_to_rgba(0xff00_0000 | argb::unpremultiply(*px));
            }
        }
        PixelFormat::Rgba8888 => {
            for px in run.iter_mut() {
                *px = argb::argb_to_rgba(argb::unpremultiply(*px));
            }
        }
        PixelFormat::Rgba8888Premultiplied => {
            for px in run.iter_mut() {
                *px = argb::argb_to_rgba(*px);
            }
        }
        PixelFormat::Mono | PixelFormat::MonoLsb | PixelFormat::Indexed8 => {
            debug_assert!(false, "canonical store to indexed format")
        }
    }
}

/// Read `out.len()` pixels from row `y` starting at column `x` and return
/// them as canonical premultiplied ARGB32, expanding indexed and 1-bit
/// formats through the buffer's color table.
pub(crate) fn fetch_run(buffer: &RasterBuffer, y: usize, x: usize, out: &mut [u32]) {
    debug_assert!(x + out.len() <= buffer.width() as usize);
    fetch_raw(buffer.format(), buffer.scan_line(y), x, out);
    to_canonical(buffer.format(), buffer.color_table(), out);
}

/// Write canonical premultiplied ARGB32 pixels into row `y` starting at
/// column `x`, converting to `format`. The run is consumed (converted in
/// place) in the process. The format is passed explicitly so the generic
/// in-place path can store the destination format into a buffer still
/// labeled with the source format.
pub(crate) fn store_run(
    buffer: &mut RasterBuffer,
    format: PixelFormat,
    y: usize,
    x: usize,
    run: &mut [u32],
) {
    debug_assert!(x + run.len() <= buffer.width() as usize);
    debug_assert!(format.is_direct());
    from_canonical(format, run);
    store_raw(format, buffer.scan_line_mut(y), x, run);
}
