//! True-color to 8-bit indexed conversion.
//!
//! A direct-enumeration pass assigns palette slots to exact colors while
//! at most 256 are in play; the moment a 257th distinct color appears the
//! pass aborts and the image is requantized against a fixed 6×6×6 color
//! cube with the selected dithering strategy. Sources with an alpha
//! channel additionally reserve palette slot 216 for transparency and
//! punch it in through a dithered 1-bit alpha mask.

use alloc::vec;
use alloc::vec::Vec;

use crate::argb;
use crate::buffer::{RasterBuffer, MAX_COLOR_TABLE};
use crate::direct;
use crate::format::PixelFormat;
use crate::mono;
use crate::router::{ConvertFlags, DitherMode};
use crate::tables::BAYER_MATRIX;

/// Open-addressing hash size for color enumeration. Prime; never resized
/// since enumeration aborts at 256 distinct colors.
const HASH_SLOTS: usize = 997;

/// Cube channel levels are 0..=5.
const MAX_LEVEL: u32 = 5;

/// Reserved transparency slot when the source carries alpha.
const TRANSPARENT_INDEX: u8 = 216;

#[derive(Clone, Copy, Default)]
struct Slot {
    pix: u8,
    used: bool,
    color: u32,
}

/// Exact-color palette builder: a fixed-size linear-probing map from
/// packed color to assigned palette index.
struct ColorMap {
    slots: Vec<Slot>,
    count: usize,
}

impl ColorMap {
    fn new() -> Self {
        Self {
            slots: vec![Slot::default(); HASH_SLOTS],
            count: 0,
        }
    }

    /// Index of `color`, inserting it (and appending to `table`) if new.
    /// `None` means the palette would exceed 256 entries.
    fn lookup_or_insert(&mut self, color: u32, table: &mut [u32]) -> Option<u8> {
        let mut hash = color as usize % HASH_SLOTS;
        loop {
            if self.slots[hash].used {
                if self.slots[hash].color == color {
                    return Some(self.slots[hash].pix);
                }
                hash += 1;
                if hash == HASH_SLOTS {
                    hash = 0;
                }
            } else {
                if self.count == MAX_COLOR_TABLE {
                    return None;
                }
                let pix = self.count as u8;
                self.slots[hash] = Slot {
                    pix,
                    used: true,
                    color,
                };
                table[self.count] = color;
                self.count += 1;
                return Some(pix);
            }
        }
    }
}

#[inline]
fn cube_index(r: u32, g: u32, b: u32) -> u8 {
    ((r * (MAX_LEVEL + 1) + g) * (MAX_LEVEL + 1) + b) as u8
}

#[inline]
fn read_word(row: &[u8], x: usize) -> u32 {
    u32::from_ne_bytes(row[x * 4..x * 4 + 4].try_into().unwrap())
}

/// Quantize an `Rgb32` or `Argb32` image into a fresh `Indexed8`
/// destination. A non-empty color table already on `dest` seeds the
/// enumeration pass (re-quantization against a known palette).
pub(crate) fn convert_rgb_to_indexed8(
    dest: &mut RasterBuffer,
    src: &RasterBuffer,
    flags: ConvertFlags,
) {
    debug_assert!(matches!(
        src.format(),
        PixelFormat::Rgb32 | PixelFormat::Argb32
    ));
    debug_assert_eq!(dest.format(), PixelFormat::Indexed8);

    let src_has_alpha = src.format() == PixelFormat::Argb32;
    // Opaque sources hash with the alpha byte forced so that table
    // entries come out opaque; alpha sources hash the full word.
    let alpha_mask = if src_has_alpha { 0 } else { 0xff00_0000 };
    let mut do_quant = flags.prefer_dither || src_has_alpha;

    let width = src.width() as usize;
    let height = src.height() as usize;

    let mut table = [0u32; MAX_COLOR_TABLE];
    let mut map = ColorMap::new();

    // Preload a caller-supplied palette.
    for &seed in dest.color_table() {
        let entry = map.lookup_or_insert(seed | alpha_mask, &mut table);
        debug_assert!(entry.is_some());
    }

    if !flags.prefer_dither {
        'scan: for y in 0..height {
            let src_row = src.scan_line(y);
            let dest_row = dest.scan_line_mut(y);
            for x in 0..width {
                let color = read_word(src_row, x) | alpha_mask;
                match map.lookup_or_insert(color, &mut table) {
                    Some(pix) => dest_row[x] = pix,
                    None => {
                        // Too many colors: requantize from scratch. The
                        // index bytes written so far are overwritten below.
                        do_quant = true;
                        break 'scan;
                    }
                }
            }
        }
    }

    let num_colors;
    let mut has_alpha_clut = false;

    if do_quant {
        num_colors = MAX_COLOR_TABLE;
        for r in 0..=MAX_LEVEL {
            for g in 0..=MAX_LEVEL {
                for b in 0..=MAX_LEVEL {
                    table[cube_index(r, g, b) as usize] = argb::rgb(
                        (r * 255 / MAX_LEVEL) as u8,
                        (g * 255 / MAX_LEVEL) as u8,
                        (b * 255 / MAX_LEVEL) as u8,
                    );
                }
            }
        }

        match flags.dither {
            DitherMode::Threshold => {
                // Nearest cube level per channel: (v*5 + 127) / 255.
                for y in 0..height {
                    let src_row = src.scan_line(y);
                    let dest_row = &mut dest.scan_line_mut(y)[..width];
                    for (x, d) in dest_row.iter_mut().enumerate() {
                        let p = read_word(src_row, x);
                        let r = (argb::red(p) * MAX_LEVEL + 127) / 255;
                        let g = (argb::green(p) * MAX_LEVEL + 127) / 255;
                        let b = (argb::blue(p) * MAX_LEVEL + 127) / 255;
                        *d = cube_index(r, g, b);
                    }
                }
            }
            DitherMode::Ordered => {
                // Threshold biased by the Bayer matrix; a pure function of
                // the value and (x mod 16, y mod 16).
                for y in 0..height {
                    let src_row = src.scan_line(y);
                    let dest_row = &mut dest.scan_line_mut(y)[..width];
                    for (x, d) in dest_row.iter_mut().enumerate() {
                        let p = read_word(src_row, x);
                        let bias = (BAYER_MATRIX[y & 15][x & 15] as u32) << 8;
                        let level =
                            |v: u32| ((256 * MAX_LEVEL + MAX_LEVEL + 1) * v + bias) >> 16;
                        let r = level(argb::red(p));
                        let g = level(argb::green(p));
                        let b = level(argb::blue(p));
                        *d = cube_index(r, g, b);
                    }
                }
            }
            DitherMode::Diffuse => {
                diffuse_to_cube(dest, src, width, height);
            }
        }

        if src_has_alpha {
            table[TRANSPARENT_INDEX as usize] = 0;
            let mask = mono::alpha_mask(src, flags);
            for y in 0..height {
                let mask_row = mask.scan_line(y);
                let dest_row = &mut dest.scan_line_mut(y)[..width];
                for (x, d) in dest_row.iter_mut().enumerate() {
                    if mask_row[x >> 3] & (0x80 >> (x & 7)) == 0 {
                        *d = TRANSPARENT_INDEX;
                    }
                }
            }
            has_alpha_clut = true;
        }
    } else {
        num_colors = map.count;
    }

    dest.set_color_table_raw(table[..num_colors].to_vec(), has_alpha_clut);
}

/// Two-line serpentine error diffusion onto the 6×6×6 cube: each channel
/// keeps a current and a next scanline of accumulated error, the sweep
/// direction alternates per row, and errors spread 7/16 ahead, 5/16
/// below, 3/16 below-behind, 1/16 below-ahead.
fn diffuse_to_cube(dest: &mut RasterBuffer, src: &RasterBuffer, width: usize, height: usize) {
    let mut line_a: [Vec<i32>; 3] = [vec![0; width], vec![0; width], vec![0; width]];
    let mut line_b: [Vec<i32>; 3] = [vec![0; width], vec![0; width], vec![0; width]];
    let mut levels: [Vec<u32>; 3] = [vec![0; width], vec![0; width], vec![0; width]];

    let channel = |p: u32, chan: usize| -> i32 {
        match chan {
            0 => argb::red(p) as i32,
            1 => argb::green(p) as i32,
            _ => argb::blue(p) as i32,
        }
    };

    for y in 0..height {
        for chan in 0..3 {
            let (l1, l2) = if y & 1 == 1 {
                (&mut line_b[chan], &mut line_a[chan])
            } else {
                (&mut line_a[chan], &mut line_b[chan])
            };
            if y == 0 {
                for x in 0..width {
                    l1[x] = channel(read_word(src.scan_line(0), x), chan);
                }
            }
            if y + 1 < height {
                for x in 0..width {
                    l2[x] = channel(read_word(src.scan_line(y + 1), x), chan);
                }
            }

            let pv = &mut levels[chan];
            if y & 1 == 1 {
                for x in 0..width {
                    let level = ((l1[x] * 5 + 128) / 255).clamp(0, 5);
                    let err = l1[x] - level * 255 / 5;
                    pv[x] = level as u32;
                    if x + 1 < width {
                        l1[x + 1] += (err * 7) >> 4;
                        l2[x + 1] += err >> 4;
                    }
                    l2[x] += (err * 5) >> 4;
                    if x > 1 {
                        l2[x - 1] += (err * 3) >> 4;
                    }
                }
            } else {
                for x in (0..width).rev() {
                    let level = ((l1[x] * 5 + 128) / 255).clamp(0, 5);
                    let err = l1[x] - level * 255 / 5;
                    pv[x] = level as u32;
                    if x > 0 {
                        l1[x - 1] += (err * 7) >> 4;
                        l2[x - 1] += err >> 4;
                    }
                    l2[x] += (err * 5) >> 4;
                    if x + 1 < width {
                        l2[x + 1] += (err * 3) >> 4;
                    }
                }
            }
        }

        let dest_row = &mut dest.scan_line_mut(y)[..width];
        for (x, d) in dest_row.iter_mut().enumerate() {
            *d = cube_index(levels[0][x], levels[1][x], levels[2][x]);
        }
    }
}

/// Dispatch-table entry: premultiplied sources unpremultiply into a
/// temporary `Argb32` image first.
pub(crate) fn convert_argb_pm_to_indexed8(
    dest: &mut RasterBuffer,
    src: &RasterBuffer,
    flags: ConvertFlags,
) {
    let mut tmp = RasterBuffer::new(src.width(), src.height(), PixelFormat::Argb32);
    direct::convert_unpremultiply(&mut tmp, src, flags);
    convert_rgb_to_indexed8(dest, &tmp, flags);
}
