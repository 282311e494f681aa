//! Save/load round trips through the filesystem.

use approx::assert_abs_diff_eq;
use raster_core::diagnostics::CollectingSink;
use raster_core::{Palette, PixelBuffer, PixelType, Rgba};
use raster_io::{
    BitDepth, Format, ImageIo, IoConfig, load, readable_formats, save, supports_bit_depth,
    supports_reading, supports_writing,
};
use std::sync::Arc;
use tempfile::TempDir;

fn pattern(pixel_type: PixelType, w: u32, h: u32) -> PixelBuffer {
    let mut buf = PixelBuffer::allocate(w, h, pixel_type).unwrap();
    let hi = pixel_type.max_value().unwrap_or(1.0);
    for y in 0..h {
        for x in 0..w {
            for c in 0..buf.channels() {
                let t = ((x * 7 + y * 3 + c as u32 * 5) % 32) as f64 / 31.0;
                let v = if pixel_type.is_float() { t } else { (t * hi).round() };
                buf.set_sample(x, y, c, v);
            }
        }
    }
    buf
}

#[test]
fn lossless_formats_round_trip_exactly() {
    let dir = TempDir::new().unwrap();
    let cases = [
        ("grey.bmp", PixelType::U8, BitDepth::Bit8),
        ("rgb.bmp", PixelType::Rgb8, BitDepth::Bit24),
        ("rgba.bmp", PixelType::Rgba8, BitDepth::Bit32),
        ("grey16.png", PixelType::U16, BitDepth::Bit16),
        ("rgb.png", PixelType::Rgb8, BitDepth::Bit24),
        ("rgba16.png", PixelType::Rgba16, BitDepth::Bit64),
        ("rgb16.tif", PixelType::Rgb16, BitDepth::Bit48),
        ("rgba.tif", PixelType::Rgba8, BitDepth::Bit32),
    ];
    for (name, pixel_type, depth) in cases {
        let src = pattern(pixel_type, 13, 9);
        let path = dir.path().join(name);
        save(&src, &path, depth).unwrap();
        let back = load(&path).unwrap();
        assert_eq!(back.dimensions(), (13, 9), "{name}");
        assert_eq!(back.pixel_type(), pixel_type, "{name}");
        for y in 0..9 {
            assert_eq!(back.row(y), src.row(y), "{name} row {y}");
        }
    }
}

#[test]
fn jpeg_round_trip_within_tolerance() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("photo.jpg");
    let mut src = PixelBuffer::allocate(40, 30, PixelType::Rgb8).unwrap();
    for y in 0..30 {
        for x in 0..40 {
            src.set_sample(x, y, 0, (x * 6) as f64);
            src.set_sample(x, y, 1, (y * 8) as f64);
            src.set_sample(x, y, 2, 128.0);
        }
    }
    save(&src, &path, BitDepth::Bit24).unwrap();
    let back = load(&path).unwrap();
    assert_eq!(back.pixel_type(), PixelType::Rgb8);
    for (a, b) in back.rows().flatten().zip(src.rows().flatten()) {
        assert!((*a as i32 - *b as i32).abs() <= 10);
    }
}

#[test]
fn float_saved_at_16_bits_keeps_precision() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("float.png");
    let src = pattern(PixelType::F32, 8, 8);
    save(&src, &path, BitDepth::Bit16).unwrap();
    let back = load(&path).unwrap();
    assert_eq!(back.pixel_type(), PixelType::U16);
    for y in 0..8 {
        for x in 0..8 {
            assert_abs_diff_eq!(back.sample(x, y, 0) / 65535.0, src.sample(x, y, 0), epsilon = 1e-4);
        }
    }
}

#[test]
fn native_tiff_keeps_float_type() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.tiff");
    let mut src = pattern(PixelType::F64, 5, 4);
    src.set_sample(2, 2, 0, -3.25);
    ImageIo::default().save_native(&src, &path).unwrap();
    let back = load(&path).unwrap();
    assert_eq!(back.pixel_type(), PixelType::F64);
    assert_eq!(back.sample(2, 2, 0), -3.25);
}

#[test]
fn grey_colour_image_saved_as_8bit() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("grey.bmp");
    let mut src = PixelBuffer::allocate(6, 6, PixelType::Rgba8).unwrap();
    for y in 0..6 {
        for px in src.row_mut(y).chunks_exact_mut(4) {
            let g = (y * 40) as u8;
            px.copy_from_slice(&[g, g, g, 255]);
        }
    }
    save(&src, &path, BitDepth::Bit32).unwrap();
    let back = load(&path).unwrap();
    assert_eq!(back.pixel_type(), PixelType::U8);
    assert_eq!(back.sample(3, 5, 0), 200.0);

    // Translucent pixels keep the alpha channel
    src.set_sample(0, 0, 3, 10.0);
    save(&src, &path, BitDepth::Bit32).unwrap();
    assert_eq!(load(&path).unwrap().pixel_type(), PixelType::Rgba8);
}

#[test]
fn palette_image_survives_png() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("indexed.png");
    let mut src = PixelBuffer::allocate(4, 1, PixelType::U8).unwrap();
    let mut p = Palette::greyscale();
    p.set(3, Rgba::rgb(10, 220, 30));
    src.set_palette(p).unwrap();
    src.row_mut(0).copy_from_slice(&[0, 3, 3, 255]);

    save(&src, &path, BitDepth::Bit24).unwrap();
    let back = load(&path).unwrap();
    assert_eq!(back.pixel_type(), PixelType::Rgb8);
    assert_eq!(back.colour_at(1, 0), Some(Rgba::rgb(10, 220, 30)));
    assert_eq!(back.colour_at(3, 0), Some(Rgba::rgb(255, 255, 255)));
}

#[test]
fn diagnostics_reach_configured_sink() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("signed.bmp");
    let sink = Arc::new(CollectingSink::default());
    let io = ImageIo::new(IoConfig::default().with_sink(sink.clone()));

    let src = PixelBuffer::allocate(3, 3, PixelType::I16).unwrap();
    io.save(&src, &path, BitDepth::Bit8).unwrap();
    assert_eq!(sink.len(), 1);

    let quiet = Arc::new(CollectingSink::default());
    ImageIo::new(IoConfig::default().with_sink(quiet.clone()))
        .load(&path)
        .unwrap();
    assert!(quiet.is_empty());
    assert_eq!(sink.len(), 1);
}

#[test]
fn extension_decides_output_format() {
    let dir = TempDir::new().unwrap();
    let src = pattern(PixelType::U8, 4, 4);
    for f in [Format::Bmp, Format::Png, Format::Jpeg, Format::Tiff] {
        let path = dir.path().join(format!("out.{}", f.extension()));
        save(&src, &path, BitDepth::Bit8).unwrap();
        assert_eq!(Format::detect(&path).unwrap(), f);
    }
    let err = save(&src, dir.path().join("out.xyz"), BitDepth::Bit8).unwrap_err();
    assert!(err.is_unsupported());
}

#[test]
fn capability_predicates() {
    assert!(supports_reading(Format::Png));
    assert!(supports_writing(Format::Tiff));
    assert!(supports_reading(Format::Gif));
    assert!(supports_reading(Format::Psd));
    assert!(!supports_writing(Format::Gif));
    assert!(!supports_writing(Format::Psd));
    assert!(supports_bit_depth(Format::Bmp, BitDepth::Bit24));
    assert!(!supports_bit_depth(Format::Bmp, BitDepth::Bit48));
    assert!(!supports_bit_depth(Format::Jpeg, BitDepth::Bit32));
    assert_eq!(readable_formats().count(), 6);
}

#[test]
fn missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = load(dir.path().join("nope.png")).unwrap_err();
    assert!(matches!(err, raster_io::IoError::Io(_)));
}
