use zenraster::argb;
use zenraster::{ConvertFlags, DitherMode, PixelFormat, RasterBuffer};

fn image_32(format: PixelFormat, width: u32, pixels: &[u32]) -> RasterBuffer {
    let height = pixels.len() as u32 / width;
    let mut buf = RasterBuffer::new(width, height, format);
    for (i, &p) in pixels.iter().enumerate() {
        let (x, y) = (i % width as usize, i / width as usize);
        buf.scan_line_mut(y)[x * 4..x * 4 + 4].copy_from_slice(&p.to_ne_bytes());
    }
    buf
}

fn bit(buf: &RasterBuffer, x: usize, y: usize) -> bool {
    buf.scan_line(y)[x >> 3] & (0x80 >> (x & 7)) != 0
}

fn threshold_luma() -> ConvertFlags {
    ConvertFlags {
        dither: DitherMode::Threshold,
        ..ConvertFlags::default()
    }
}

#[test]
fn luminance_threshold_sets_bits_for_dark_pixels() {
    let src = image_32(
        PixelFormat::Rgb32,
        4,
        &[
            argb::rgb(0, 0, 0),
            argb::rgb(255, 255, 255),
            argb::rgb(100, 100, 100), // luma 100 < 128 -> black
            argb::rgb(200, 200, 200),
        ],
    );
    let out = src
        .converted(PixelFormat::Mono, threshold_luma())
        .unwrap();
    assert!(bit(&out, 0, 0));
    assert!(!bit(&out, 1, 0));
    assert!(bit(&out, 2, 0));
    assert!(!bit(&out, 3, 0));
    // index 0 is white, index 1 is black
    assert_eq!(out.color_table(), &[0xffff_ffff, 0xff00_0000]);
}

#[test]
fn luminance_uses_luma_weights_not_average() {
    // Pure blue: luma = 255*5/32 = 39 -> black.
    // Pure green: luma = 255*16/32 = 127 -> black, barely.
    let src = image_32(
        PixelFormat::Rgb32,
        2,
        &[argb::rgb(0, 0, 255), argb::rgb(0, 255, 0)],
    );
    let out = src
        .converted(PixelFormat::Mono, threshold_luma())
        .unwrap();
    assert!(bit(&out, 0, 0));
    assert!(bit(&out, 1, 0));
}

#[test]
fn indexed_source_dithers_through_its_color_table() {
    let mut src = RasterBuffer::new(2, 1, PixelFormat::Indexed8);
    src.set_color_table(vec![argb::rgb(255, 255, 255), argb::rgb(10, 10, 10)]);
    src.scan_line_mut(0)[..2].copy_from_slice(&[0, 1]);
    let out = src
        .converted(PixelFormat::Mono, threshold_luma())
        .unwrap();
    assert!(!bit(&out, 0, 0)); // white entry
    assert!(bit(&out, 1, 0)); // dark entry
}

#[test]
fn diffuse_carries_error_to_the_right() {
    // A row of mid-gray: threshold would make it all white or all black;
    // diffusion alternates to preserve the average.
    let src = image_32(PixelFormat::Rgb32, 8, &vec![argb::rgb(128, 128, 128); 8]);
    let flags = ConvertFlags {
        dither: DitherMode::Diffuse,
        ..ConvertFlags::default()
    };
    let out = src.converted(PixelFormat::Mono, flags).unwrap();
    let blacks = (0..8).filter(|&x| bit(&out, x, 0)).count();
    // gray 128 is half on: diffusion must produce a mix, not a solid row
    assert!(blacks > 0 && blacks < 8, "blacks = {blacks}");

    // and it is deterministic
    let again = src.converted(PixelFormat::Mono, flags).unwrap();
    assert_eq!(out.data(), again.data());
}

#[test]
fn ordered_mono_tiles_every_16_pixels() {
    let src = image_32(PixelFormat::Rgb32, 32, &vec![argb::rgb(90, 90, 90); 32 * 32]);
    let flags = ConvertFlags {
        dither: DitherMode::Ordered,
        ..ConvertFlags::default()
    };
    let out = src.converted(PixelFormat::Mono, flags).unwrap();
    for y in 0..32 {
        for x in 0..32 {
            assert_eq!(bit(&out, x, y), bit(&out, x % 16, y % 16));
        }
    }
}

#[test]
fn monolsb_destination_swaps_bit_order() {
    let src = image_32(
        PixelFormat::Rgb32,
        8,
        &[
            argb::rgb(0, 0, 0),
            argb::rgb(255, 255, 255),
            argb::rgb(0, 0, 0),
            argb::rgb(255, 255, 255),
            argb::rgb(0, 0, 0),
            argb::rgb(255, 255, 255),
            argb::rgb(0, 0, 0),
            argb::rgb(255, 255, 255),
        ],
    );
    let msb = src
        .converted(PixelFormat::Mono, threshold_luma())
        .unwrap();
    let lsb = src
        .converted(PixelFormat::MonoLsb, threshold_luma())
        .unwrap();
    assert_eq!(msb.scan_line(0)[0], 0b1010_1010);
    assert_eq!(lsb.scan_line(0)[0], 0b0101_0101);
}

#[test]
fn premultiplied_source_unpremultiplies_before_dithering() {
    // Premultiplied half-alpha white: raw channels are 128, but the
    // straight color is white and must dither white.
    let src = image_32(
        PixelFormat::Argb32Premultiplied,
        1,
        &[argb::argb(128, 128, 128, 128)],
    );
    let out = src
        .converted(PixelFormat::Mono, threshold_luma())
        .unwrap();
    assert!(!bit(&out, 0, 0));
}

#[test]
fn alpha_mask_threshold_cutoff_is_128() {
    let src = image_32(
        PixelFormat::Argb32,
        3,
        &[
            argb::argb(127, 255, 0, 0),
            argb::argb(128, 255, 0, 0),
            argb::argb(255, 255, 0, 0),
        ],
    );
    // The alpha mask shows through Indexed8 conversion: below the cutoff
    // pixels take the transparency slot.
    let out = src
        .converted(
            PixelFormat::Indexed8,
            ConvertFlags {
                dither: DitherMode::Threshold,
                ..ConvertFlags::default()
            },
        )
        .unwrap();
    let row = out.scan_line(0);
    assert_eq!(row[0], 216); // alpha 127: transparent
    assert_ne!(row[1], 216); // alpha 128: opaque
    assert_ne!(row[2], 216);
}

#[test]
fn mono_to_indexed8_carries_two_entry_table() {
    let mut src = RasterBuffer::new(3, 1, PixelFormat::Mono);
    src.set_color_table(vec![argb::rgb(1, 2, 3), argb::rgb(4, 5, 6)]);
    src.scan_line_mut(0)[0] = 0b0100_0000;
    let out = src
        .converted(PixelFormat::Indexed8, ConvertFlags::default())
        .unwrap();
    assert_eq!(out.color_table(), &[argb::rgb(1, 2, 3), argb::rgb(4, 5, 6)]);
    assert_eq!(&out.scan_line(0)[..3], &[0, 1, 0]);
}
