use zenraster::argb;
use zenraster::{ConvertFlags, PixelFormat, RasterBuffer};

fn image_32(format: PixelFormat, width: u32, pixels: &[u32]) -> RasterBuffer {
    assert_eq!(pixels.len() as u32 % width, 0);
    let height = pixels.len() as u32 / width;
    let mut buf = RasterBuffer::new(width, height, format);
    for (i, &p) in pixels.iter().enumerate() {
        let (x, y) = (i % width as usize, i / width as usize);
        buf.scan_line_mut(y)[x * 4..x * 4 + 4].copy_from_slice(&p.to_ne_bytes());
    }
    buf
}

fn words(buf: &RasterBuffer) -> Vec<u32> {
    let width = buf.width() as usize;
    let mut out = Vec::new();
    for y in 0..buf.height() as usize {
        for px in buf.scan_line(y)[..width * 4].chunks_exact(4) {
            out.push(u32::from_ne_bytes(px.try_into().unwrap()));
        }
    }
    out
}

#[test]
fn argb32_to_premultiplied_rounding() {
    // (v*a + 127) / 255: 200*128+127 = 25727, /255 = 100; 100 -> 50; 50 -> 25.
    let src = image_32(
        PixelFormat::Argb32,
        2,
        &[argb::argb(128, 200, 100, 50), argb::argb(255, 10, 10, 10)],
    );
    let out = src
        .converted(PixelFormat::Argb32Premultiplied, ConvertFlags::default())
        .unwrap();
    assert_eq!(
        words(&out),
        vec![argb::argb(128, 100, 50, 25), argb::argb(255, 10, 10, 10)]
    );

    // The in-place path produces the same bytes.
    let mut inplace = src.clone();
    inplace
        .convert(PixelFormat::Argb32Premultiplied, ConvertFlags::default())
        .unwrap();
    assert_eq!(words(&inplace), words(&out));
}

#[test]
fn premultiplied_round_trip_exact_for_opaque_and_transparent() {
    let original = image_32(
        PixelFormat::Argb32,
        3,
        &[argb::argb(255, 1, 2, 3), 0, argb::argb(255, 250, 128, 7)],
    );
    let there = original
        .converted(PixelFormat::Argb32Premultiplied, ConvertFlags::default())
        .unwrap();
    let back = there
        .converted(PixelFormat::Argb32, ConvertFlags::default())
        .unwrap();
    assert_eq!(words(&back), words(&original));
}

#[test]
fn channel_swap_round_trip_is_exact() {
    let original = image_32(
        PixelFormat::Argb32,
        2,
        &[argb::argb(17, 34, 51, 68), argb::argb(255, 1, 128, 254)],
    );
    let swapped = original
        .converted(PixelFormat::Rgba8888, ConvertFlags::default())
        .unwrap();
    assert_eq!(
        words(&swapped),
        vec![
            argb::argb_to_rgba(argb::argb(17, 34, 51, 68)),
            argb::argb_to_rgba(argb::argb(255, 1, 128, 254)),
        ]
    );
    let back = swapped
        .converted(PixelFormat::Argb32, ConvertFlags::default())
        .unwrap();
    assert_eq!(words(&back), words(&original));

    // Premultiplied variant round-trips exactly too.
    let pm = image_32(PixelFormat::Argb32Premultiplied, 1, &[argb::argb(9, 3, 4, 5)]);
    let pm_back = pm
        .converted(PixelFormat::Rgba8888Premultiplied, ConvertFlags::default())
        .unwrap()
        .converted(PixelFormat::Argb32Premultiplied, ConvertFlags::default())
        .unwrap();
    assert_eq!(words(&pm_back), words(&pm));
}

#[test]
fn mask_alpha_insertion() {
    let src = image_32(PixelFormat::Rgb32, 1, &[argb::rgb(10, 20, 30)]);
    let out = src
        .converted(PixelFormat::Argb32, ConvertFlags::default())
        .unwrap();
    assert_eq!(words(&out), vec![argb::argb(255, 10, 20, 30)]);
}

#[test]
fn rgb32_to_rgb16_truncates() {
    let src = image_32(
        PixelFormat::Rgb32,
        2,
        &[argb::rgb(255, 128, 64), argb::rgb(7, 3, 7)],
    );
    let out = src
        .converted(PixelFormat::Rgb16, ConvertFlags::default())
        .unwrap();
    let row = out.scan_line(0);
    let first = u16::from_ne_bytes([row[0], row[1]]);
    let second = u16::from_ne_bytes([row[2], row[3]]);
    // top 5/6/5 bits, no rounding
    assert_eq!(first, (31 << 11) | (32 << 5) | 8);
    assert_eq!(second, 0);
}

#[test]
fn rgb16_lossy_step_is_idempotent() {
    let src = image_32(
        PixelFormat::Rgb32,
        4,
        &[
            argb::rgb(1, 2, 3),
            argb::rgb(200, 100, 50),
            argb::rgb(255, 255, 255),
            argb::rgb(123, 45, 67),
        ],
    );
    let narrowed = src
        .converted(PixelFormat::Rgb16, ConvertFlags::default())
        .unwrap();
    let again = narrowed
        .converted(PixelFormat::Rgb32, ConvertFlags::default())
        .unwrap()
        .converted(PixelFormat::Rgb16, ConvertFlags::default())
        .unwrap();
    assert_eq!(narrowed.data(), again.data());
}

#[test]
fn rgb16_expansion_replicates_bits() {
    let mut src = RasterBuffer::new(2, 1, PixelFormat::Rgb16);
    src.scan_line_mut(0)[..2].copy_from_slice(&0xffffu16.to_ne_bytes());
    src.scan_line_mut(0)[2..4].copy_from_slice(&0u16.to_ne_bytes());
    let out = src
        .converted(PixelFormat::Argb32, ConvertFlags::default())
        .unwrap();
    assert_eq!(words(&out), vec![argb::rgb(255, 255, 255), argb::rgb(0, 0, 0)]);
}

#[test]
fn indexed8_growth_in_place_runs_backward() {
    // 3x2 with stride 4: growth must not clobber unread source bytes.
    let mut buf = RasterBuffer::new(3, 2, PixelFormat::Indexed8);
    let table = vec![
        argb::rgb(10, 0, 0),
        argb::rgb(0, 20, 0),
        argb::rgb(0, 0, 30),
        argb::rgb(40, 40, 40),
    ];
    buf.set_color_table(table.clone());
    buf.scan_line_mut(0)[..3].copy_from_slice(&[0, 1, 2]);
    buf.scan_line_mut(1)[..3].copy_from_slice(&[3, 2, 1]);

    buf.convert(PixelFormat::Rgb32, ConvertFlags::default())
        .unwrap();
    assert_eq!(buf.format(), PixelFormat::Rgb32);
    assert_eq!(buf.bytes_per_line(), 12);
    assert!(buf.color_table().is_empty());
    assert_eq!(
        words(&buf),
        vec![table[0], table[1], table[2], table[3], table[2], table[1]]
    );
}

#[test]
fn indexed8_growth_to_premultiplied_premultiplies_table() {
    let mut buf = RasterBuffer::new(1, 1, PixelFormat::Indexed8);
    buf.set_color_table(vec![argb::argb(128, 200, 100, 50)]);
    // index 0
    buf.convert(PixelFormat::Argb32Premultiplied, ConvertFlags::default())
        .unwrap();
    assert_eq!(words(&buf), vec![argb::argb(128, 100, 50, 25)]);
}

#[test]
fn indexed8_growth_to_rgb16_in_place() {
    let mut buf = RasterBuffer::new(2, 1, PixelFormat::Indexed8);
    buf.set_color_table(vec![argb::rgb(255, 0, 0), argb::rgb(0, 0, 255)]);
    buf.scan_line_mut(0)[..2].copy_from_slice(&[0, 1]);
    buf.convert(PixelFormat::Rgb16, ConvertFlags::default())
        .unwrap();
    assert_eq!(buf.format(), PixelFormat::Rgb16);
    let row = buf.scan_line(0);
    assert_eq!(u16::from_ne_bytes([row[0], row[1]]), 0xf800);
    assert_eq!(u16::from_ne_bytes([row[2], row[3]]), 0x001f);
}

#[test]
fn indexed8_growth_pads_short_tables_with_last_color() {
    let mut buf = RasterBuffer::new(2, 1, PixelFormat::Indexed8);
    buf.set_color_table(vec![argb::rgb(5, 5, 5)]);
    buf.scan_line_mut(0)[..2].copy_from_slice(&[0, 99]); // 99 out of range
    buf.convert(PixelFormat::Rgb32, ConvertFlags::default())
        .unwrap();
    assert_eq!(words(&buf), vec![argb::rgb(5, 5, 5), argb::rgb(5, 5, 5)]);
}

#[test]
fn rgb32_shrinks_to_rgb16_in_place() {
    let mut buf = image_32(PixelFormat::Rgb32, 2, &[argb::rgb(255, 0, 0), argb::rgb(0, 255, 0)]);
    let copy = buf
        .converted(PixelFormat::Rgb16, ConvertFlags::default())
        .unwrap();
    buf.convert(PixelFormat::Rgb16, ConvertFlags::default())
        .unwrap();
    assert_eq!(buf.format(), PixelFormat::Rgb16);
    let row = buf.scan_line(0);
    assert_eq!(u16::from_ne_bytes([row[0], row[1]]), 0xf800);
    assert_eq!(u16::from_ne_bytes([row[2], row[3]]), 0x07e0);
    assert_eq!(&buf.scan_line(0)[..4], &copy.scan_line(0)[..4]);
}

#[test]
fn mono_expansion_uses_default_palette() {
    let mut buf = RasterBuffer::new(2, 1, PixelFormat::Mono);
    buf.scan_line_mut(0)[0] = 0b0100_0000; // second pixel set
    let out = buf
        .converted(PixelFormat::Rgb32, ConvertFlags::default())
        .unwrap();
    // bit 0 is black, bit 1 is white
    assert_eq!(words(&out), vec![argb::rgb(0, 0, 0), argb::rgb(255, 255, 255)]);
}

#[test]
fn mono_bit_order_swap_is_involution() {
    let mut buf = RasterBuffer::new(12, 2, PixelFormat::Mono);
    buf.scan_line_mut(0)[0] = 0b1011_0010;
    buf.scan_line_mut(0)[1] = 0b1100_0000;
    buf.scan_line_mut(1)[0] = 0b0000_0101;
    let original = buf.clone();
    let there = buf
        .converted(PixelFormat::MonoLsb, ConvertFlags::default())
        .unwrap();
    let back = there
        .converted(PixelFormat::Mono, ConvertFlags::default())
        .unwrap();
    assert_eq!(&back.scan_line(0)[..2], &original.scan_line(0)[..2]);
    assert_eq!(&back.scan_line(1)[..2], &original.scan_line(1)[..2]);
}

#[test]
fn indexed_expansion_clamps_out_of_range_bytes() {
    let mut buf = RasterBuffer::new(2, 1, PixelFormat::Indexed8);
    buf.set_color_table(vec![argb::rgb(1, 1, 1), argb::rgb(2, 2, 2)]);
    buf.scan_line_mut(0)[..2].copy_from_slice(&[1, 250]);
    let out = buf
        .converted(PixelFormat::Rgb32, ConvertFlags::default())
        .unwrap();
    assert_eq!(words(&out), vec![argb::rgb(2, 2, 2), argb::rgb(2, 2, 2)]);
}

#[test]
fn indexed_expansion_forces_table_opaque_for_rgb32() {
    let mut buf = RasterBuffer::new(1, 1, PixelFormat::Indexed8);
    buf.set_color_table(vec![argb::argb(0, 9, 9, 9)]);
    let out = buf
        .converted(PixelFormat::Rgb32, ConvertFlags::default())
        .unwrap();
    assert_eq!(words(&out), vec![argb::rgb(9, 9, 9)]);
}

#[test]
fn source_stride_padding_is_ignored() {
    // 1 pixel per row, 16-byte stride; padding bytes are garbage.
    let mut data = vec![0xaau8; 32];
    data[0..4].copy_from_slice(&argb::rgb(1, 2, 3).to_ne_bytes());
    data[16..20].copy_from_slice(&argb::rgb(4, 5, 6).to_ne_bytes());
    let src = RasterBuffer::from_vec(data, 1, 2, 16, PixelFormat::Rgb32);
    let out = src
        .converted(PixelFormat::Rgba8888, ConvertFlags::default())
        .unwrap();
    assert_eq!(
        words(&out),
        vec![
            argb::argb_to_rgba(argb::rgb(1, 2, 3)),
            argb::argb_to_rgba(argb::rgb(4, 5, 6)),
        ]
    );
}

#[test]
fn identity_conversion_leaves_buffer_untouched() {
    let mut buf = RasterBuffer::new(3, 1, PixelFormat::Rgb16);
    buf.scan_line_mut(0)[0] = 0x12;
    let before = buf.clone();
    buf.convert(PixelFormat::Rgb16, ConvertFlags::default())
        .unwrap();
    assert_eq!(buf, before);
}

#[test]
fn generic_pivot_covers_table_gaps() {
    // Rgb16 has no direct converters at all; everything pivots.
    let mut src = RasterBuffer::new(1, 1, PixelFormat::Rgb16);
    src.scan_line_mut(0)[..2].copy_from_slice(&0xf800u16.to_ne_bytes());
    let out = src
        .converted(PixelFormat::Rgba8888Premultiplied, ConvertFlags::default())
        .unwrap();
    assert_eq!(words(&out), vec![argb::argb_to_rgba(argb::rgb(255, 0, 0))]);
}

#[test]
fn gamma_pass_maps_channels_and_forces_opaque() {
    use zenraster::{gamma_correct_back_to_linear, GammaTable};

    let mut halved = [0u8; 256];
    for (v, out) in halved.iter_mut().enumerate() {
        *out = (v / 2) as u8;
    }
    let table = GammaTable::from_levels(halved);

    let mut buf = image_32(PixelFormat::Argb32, 1, &[argb::argb(3, 100, 50, 24)]);
    gamma_correct_back_to_linear(&mut buf, &table);
    assert_eq!(words(&buf), vec![argb::rgb(50, 25, 12)]);

    // identity table still forces the alpha byte opaque
    let mut buf = image_32(PixelFormat::Argb32, 1, &[argb::argb(3, 100, 50, 24)]);
    gamma_correct_back_to_linear(&mut buf, &GammaTable::IDENTITY);
    assert_eq!(words(&buf), vec![argb::rgb(100, 50, 24)]);

    // 16-bit buffers are not touched
    let mut rgb16 = RasterBuffer::new(1, 1, PixelFormat::Rgb16);
    rgb16.scan_line_mut(0)[0] = 0x3c;
    gamma_correct_back_to_linear(&mut rgb16, &table);
    assert_eq!(rgb16.scan_line(0)[0], 0x3c);
}

#[test]
fn every_format_reaches_every_other() {
    const FORMATS: [PixelFormat; 10] = [
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
    for &source in &FORMATS {
        for &target in &FORMATS {
            let src = RasterBuffer::new(7, 5, source);
            let out = src.converted(target, ConvertFlags::default()).unwrap();
            assert_eq!(out.format(), target, "{source:?} -> {target:?}");
            assert_eq!(out.width(), 7);
            assert_eq!(out.height(), 5);

            let mut mutating = RasterBuffer::new(7, 5, source);
            mutating.convert(target, ConvertFlags::default()).unwrap();
            assert_eq!(mutating.format(), target, "{source:?} -> {target:?} in place");
        }
    }
}
