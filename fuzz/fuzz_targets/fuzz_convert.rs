#![no_main]
use libfuzzer_sys::fuzz_target;
use zenraster::{ConvertFlags, PixelFormat, RasterBuffer};

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

fuzz_target!(|data: &[u8]| {
    // First three bytes pick geometry and formats; the rest is pixel data.
    let [w, s, t, pixels @ ..] = data else { return };
    let width = u32::from(w % 19) + 1;
    let source = FORMATS[usize::from(s % 10)];
    let target = FORMATS[usize::from(t % 10)];
    if source == target {
        return;
    }

    let mut src = RasterBuffer::new(width, 8, source);
    let n = src.data_mut().len().min(pixels.len());
    src.data_mut()[..n].copy_from_slice(&pixels[..n]);

    // Any byte pattern must convert without panicking...
    let out = src.converted(target, ConvertFlags::default()).unwrap();
    assert_eq!(out.format(), target);
    assert!(out.color_table().len() <= 256);

    // ...and every index byte of an indexed result must be in range.
    if target == PixelFormat::Indexed8 && !out.color_table().is_empty() {
        let len = out.color_table().len();
        for y in 0..out.height() as usize {
            for &b in &out.scan_line(y)[..out.width() as usize] {
                assert!((b as usize) < len, "index {b} out of range {len}");
            }
        }
    }

    // The in-place path must land on the same format without panicking.
    let mut inplace = src.clone();
    inplace.convert(target, ConvertFlags::default()).unwrap();
    assert_eq!(inplace.format(), target);
});
