//! Reduction of 8-bit and 32-bit images to 1-bit, dithered on either
//! luminance or alpha.
//!
//! Both modes share the same three dithering strategies but compare in
//! opposite directions: in luminance mode a *dark* pixel sets the output
//! bit (index 1 is black), while in alpha-mask mode an *opaque* pixel sets
//! the bit. The output color table is always `[white, black]`.

use alloc::vec;

use crate::argb;
use crate::buffer::RasterBuffer;
use crate::direct;
use crate::format::PixelFormat;
use crate::router::{ConvertFlags, DitherMode};
use crate::tables::{BAYER_MATRIX, BITFLIP};

/// Gray map for 8-bit sources: one entry per color table index.
/// Luminance mode takes the entry's luma; alpha mode takes `255 - alpha`
/// so that the shared "low value sets the bit" core applies to both.
fn gray_map(src: &RasterBuffer, from_alpha: bool) -> [i32; 256] {
    let mut gray = [0i32; 256];
    let table = src.color_table();
    if table.is_empty() {
        // Grayscale palette: index i is opaque gray i.
        for (i, g) in gray.iter_mut().enumerate() {
            *g = if from_alpha { 0 } else { i as i32 };
        }
        return gray;
    }
    let last = table.len() - 1;
    for (i, g) in gray.iter_mut().enumerate() {
        let c = table[i.min(last)];
        *g = if from_alpha {
            255 - argb::alpha(c) as i32
        } else {
            argb::luma(c) as i32
        };
    }
    gray
}

/// Load one source row as values to dither: gray-mapped indices for 8-bit
/// sources, luma (or inverted alpha) for 32-bit sources.
fn load_line(src: &RasterBuffer, y: usize, gray: &[i32; 256], from_alpha: bool, line: &mut [i32]) {
    let row = src.scan_line(y);
    if src.format().bits_per_pixel() == 8 {
        for (v, &index) in line.iter_mut().zip(row.iter()) {
            *v = gray[index as usize];
        }
    } else {
        for (v, px) in line.iter_mut().zip(row.chunks_exact(4)) {
            let p = u32::from_ne_bytes(px.try_into().unwrap());
            *v = if from_alpha {
                255 - argb::alpha(p) as i32
            } else {
                argb::luma(p) as i32
            };
        }
    }
}

#[inline]
fn set_bit(row: &mut [u8], x: usize) {
    row[x >> 3] |= 0x80 >> (x & 7);
}

/// Dither an 8-bit or 32-bit image down to 1 bit per pixel.
///
/// `from_alpha` selects the alpha-mask comparison direction and the
/// `alpha_dither` strategy from `flags` (luminance uses `dither`).
pub(crate) fn dither_to_mono(
    dest: &mut RasterBuffer,
    src: &RasterBuffer,
    flags: ConvertFlags,
    from_alpha: bool,
) {
    debug_assert!(matches!(
        dest.format(),
        PixelFormat::Mono | PixelFormat::MonoLsb
    ));
    debug_assert!(matches!(src.format().bits_per_pixel(), 8 | 32));

    dest.set_color_table_raw(vec![0xffff_ffff, 0xff00_0000], false);

    let mode = if from_alpha {
        flags.alpha_dither
    } else {
        flags.dither
    };

    let width = src.width() as usize;
    let height = src.height() as usize;
    let eight_bit = src.format().bits_per_pixel() == 8;
    let gray = if eight_bit {
        gray_map(src, from_alpha)
    } else {
        [0; 256]
    };
    let mask_bytes = width.div_ceil(8);

    match mode {
        DitherMode::Diffuse => {
            let mut line1 = vec![0i32; width];
            let mut line2 = vec![0i32; width];
            if height > 0 {
                load_line(src, 0, &gray, from_alpha, &mut line2);
            }
            for y in 0..height {
                core::mem::swap(&mut line1, &mut line2);
                let not_last_line = y + 1 < height;
                if not_last_line {
                    load_line(src, y + 1, &gray, from_alpha, &mut line2);
                }

                let dest_row = dest.scan_line_mut(y);
                dest_row[..mask_bytes].fill(0);
                for x in 0..width {
                    let err = if line1[x] < 128 {
                        set_bit(dest_row, x); // black
                        line1[x]
                    } else {
                        line1[x] - 255 // white
                    };
                    if x + 1 < width {
                        line1[x + 1] += (err * 7) >> 4;
                    }
                    if not_last_line {
                        line2[x] += (err * 5) >> 4;
                        if x > 0 {
                            line2[x - 1] += (err * 3) >> 4;
                        }
                        if x + 1 < width {
                            line2[x + 1] += err >> 4;
                        }
                    }
                }
            }
        }
        DitherMode::Ordered => {
            let mut line = vec![0i32; width];
            for y in 0..height {
                load_line(src, y, &gray, from_alpha, &mut line);
                let dest_row = dest.scan_line_mut(y);
                dest_row[..mask_bytes].fill(0);
                if !eight_bit && from_alpha {
                    // High alpha sets the bit: compare alpha (255 - line)
                    // against the matrix from the opposite side.
                    for x in 0..width {
                        let threshold = BAYER_MATRIX[x & 15][y & 15] as i32;
                        if 255 - line[x] >= threshold {
                            set_bit(dest_row, x);
                        }
                    }
                } else {
                    for x in 0..width {
                        let threshold = BAYER_MATRIX[x & 15][y & 15] as i32;
                        if line[x] < threshold {
                            set_bit(dest_row, x);
                        }
                    }
                }
            }
        }
        DitherMode::Threshold => {
            let mut line = vec![0i32; width];
            for y in 0..height {
                load_line(src, y, &gray, from_alpha, &mut line);
                let dest_row = dest.scan_line_mut(y);
                dest_row[..mask_bytes].fill(0);
                if !eight_bit && from_alpha {
                    for x in 0..width {
                        if 255 - line[x] >= 128 {
                            set_bit(dest_row, x);
                        }
                    }
                } else {
                    for x in 0..width {
                        if line[x] < 128 {
                            set_bit(dest_row, x);
                        }
                    }
                }
            }
        }
    }

    if dest.format() == PixelFormat::MonoLsb {
        for y in 0..height {
            for byte in dest.scan_line_mut(y)[..mask_bytes].iter_mut() {
                *byte = BITFLIP[*byte as usize];
            }
        }
    }
}

/// Dispatch-table entry: luminance dither from `Indexed8`, `Rgb32`, or
/// `Argb32` to a 1-bit format.
pub(crate) fn convert_x_to_mono(dest: &mut RasterBuffer, src: &RasterBuffer, flags: ConvertFlags) {
    dither_to_mono(dest, src, flags, false);
}

/// Dispatch-table entry: premultiplied sources unpremultiply into a
/// temporary `Argb32` image first.
pub(crate) fn convert_argb_pm_to_mono(
    dest: &mut RasterBuffer,
    src: &RasterBuffer,
    flags: ConvertFlags,
) {
    let mut tmp = RasterBuffer::new(src.width(), src.height(), PixelFormat::Argb32);
    direct::convert_unpremultiply(&mut tmp, src, flags);
    dither_to_mono(dest, &tmp, flags, false);
}

/// Generate a 1-bit alpha mask (MSB-first) from a 32-bit image: a set bit
/// means opaque.
pub(crate) fn alpha_mask(src: &RasterBuffer, flags: ConvertFlags) -> RasterBuffer {
    let mut mask = RasterBuffer::new(src.width(), src.height(), PixelFormat::Mono);
    dither_to_mono(&mut mask, src, flags, true);
    mask
}
