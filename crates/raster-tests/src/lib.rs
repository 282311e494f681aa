//! Integration tests for raster-rs crates.
//!
//! End-to-end pipelines that cross crate boundaries: build or load a
//! buffer, run operations from raster-ops, save and reload through
//! raster-io.

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use raster_core::diagnostics::CollectingSink;
    use raster_core::{BufferHandle, PixelBuffer, PixelType, Point, Rect, Rgba};
    use raster_io::{BitDepth, ImageIo, IoConfig, load, save};
    use raster_ops::composite::gradient_blend_paste_pair;
    use raster_ops::convert::{convert_to_type, linear_scale_to_standard_type};
    use raster_ops::correlate::correlate_along_right_edge;
    use raster_ops::draw::{draw_line, draw_solid_rectangle};
    use raster_ops::stats::{StatisticsReport, greyscale_values_along_line, statistics_report};
    use raster_ops::transform::copy;
    use raster_ops::{Filter, OpsError, Stop, StopReason, Unstoppable};
    use std::sync::Arc;
    use tempfile::tempdir;

    /// Non-repeating texture so correlation has a single best offset.
    fn scene(w: u32, h: u32) -> PixelBuffer {
        let mut buf = PixelBuffer::allocate(w, h, PixelType::U8).unwrap();
        for y in 0..h {
            for x in 0..w {
                let v = (x.wrapping_mul(73_856_093) ^ y.wrapping_mul(19_349_663)) >> 7;
                buf.set_sample(x, y, 0, (v % 256) as f64);
            }
        }
        buf
    }

    struct AlwaysStop;

    impl Stop for AlwaysStop {
        fn check(&self) -> Result<(), StopReason> {
            Err(StopReason::Cancelled)
        }
    }

    /// Cut two overlapping tiles, round-trip them through PNG, find their
    /// offset and stitch them back together.
    #[test]
    fn test_mosaic_pipeline() {
        let dir = tempdir().unwrap();
        let original = scene(120, 60);
        let left = copy(&original, &Rect::new(0, 0, 69, 59)).unwrap();
        let right = copy(&original, &Rect::new(50, 0, 119, 59)).unwrap();

        let (p1, p2) = (dir.path().join("left.png"), dir.path().join("right.png"));
        save(&left, &p1, BitDepth::Bit8).unwrap();
        save(&right, &p2, BitDepth::Bit8).unwrap();
        let left = load(&p1).unwrap();
        let right = load(&p2).unwrap();

        let found = correlate_along_right_edge(&left, &right, 20, &Unstoppable).unwrap();
        assert_eq!(found.offset, Point::new(50, 0));
        assert_abs_diff_eq!(found.score, 1.0, epsilon = 1e-9);

        let mut mosaic = PixelBuffer::allocate(120, 60, PixelType::U8).unwrap();
        gradient_blend_paste_pair(&mut mosaic, &left, Point::ZERO, &right, found.offset).unwrap();
        for y in 0..60 {
            assert_eq!(mosaic.row(y), original.row(y), "row {y}");
        }
    }

    #[test]
    fn test_float_statistics_survive_tiff() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.tif");
        let mut buf = PixelBuffer::allocate(16, 8, PixelType::F32).unwrap();
        for y in 0..8 {
            for x in 0..16 {
                buf.set_sample(x, y, 0, (x as f64 - 4.0) * 0.25 + y as f64);
            }
        }
        let before = statistics_report(&buf);
        ImageIo::default().save_native(&buf, &path).unwrap();
        let after = statistics_report(&load(&path).unwrap());
        assert_eq!(before, after);

        let json = serde_json::to_string(&after).unwrap();
        let parsed: StatisticsReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, after);
    }

    #[test]
    fn test_window_level_then_save() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("windowed.bmp");
        let mut raw = PixelBuffer::allocate(10, 1, PixelType::U16).unwrap();
        for x in 0..10 {
            raw.set_sample(x, 0, 0, 1000.0 + x as f64 * 100.0);
        }
        let scaled = linear_scale_to_standard_type(&raw, 1000.0, 1900.0).unwrap();
        assert_eq!(scaled.buffer.pixel_type(), PixelType::U8);
        save(&scaled.buffer, &path, BitDepth::Bit8).unwrap();

        let back = load(&path).unwrap();
        assert_eq!(back.sample(0, 0, 0), 0.0);
        assert_eq!(back.sample(9, 0, 0), 255.0);
        let report = statistics_report(&back);
        assert_eq!(report.percentage_underloaded, 10.0);
        assert_eq!(report.percentage_overloaded, 10.0);
    }

    #[test]
    fn test_annotate_and_sample_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("annotated.bmp");
        let mut buf = PixelBuffer::allocate(32, 32, PixelType::U8).unwrap();
        draw_solid_rectangle(&mut buf, &Rect::new(0, 0, 31, 31), 10.0).unwrap();
        draw_line(&mut buf, Point::new(2, 5), Point::new(29, 5), 200.0, 1).unwrap();
        save(&buf, &path, BitDepth::Bit8).unwrap();

        let back = load(&path).unwrap();
        let on = greyscale_values_along_line(&back, Point::new(2, 5), Point::new(29, 5)).unwrap();
        assert_eq!(on.len(), 28);
        assert!(on.iter().all(|&v| v == 200.0));
        let off = greyscale_values_along_line(&back, Point::new(2, 6), Point::new(29, 6)).unwrap();
        assert!(off.iter().all(|&v| v == 10.0));
    }

    #[test]
    fn test_handle_pipeline() {
        let mut handle = BufferHandle::new(PixelBuffer::allocate(20, 10, PixelType::U8).unwrap());
        handle
            .modify(|b| draw_solid_rectangle(b, &Rect::new(0, 0, 19, 9), 77.0))
            .unwrap();
        handle
            .apply(|b| raster_ops::resize::rescale(b, 40, 5, Filter::Lanczos3, &Unstoppable))
            .unwrap();
        handle
            .apply(|b| convert_to_type(b, PixelType::Rgb8, false))
            .unwrap();

        let buf = handle.get().unwrap();
        assert_eq!(buf.dimensions(), (40, 5));
        assert_eq!(buf.colour_at(39, 4), Some(Rgba::grey(77)));

        handle.release();
        handle.release();
        assert!(handle.get().is_err());
    }

    #[test]
    fn test_cancelled_rescale_keeps_handle() {
        let mut handle = BufferHandle::new(scene(64, 64));
        let err: OpsError = handle
            .apply(|b| raster_ops::resize::rescale(b, 32, 32, Filter::BiCubic, &AlwaysStop))
            .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(handle.get().unwrap().dimensions(), (64, 64));
    }

    #[test]
    fn test_engines_keep_separate_sinks() {
        let dir = tempdir().unwrap();
        let sinks: Vec<Arc<CollectingSink>> = (0..2).map(|_| Arc::new(CollectingSink::default())).collect();

        std::thread::scope(|s| {
            for (i, sink) in sinks.iter().enumerate() {
                let path = dir.path().join(format!("out{i}.png"));
                let io = ImageIo::new(IoConfig::default().with_sink(sink.clone()));
                s.spawn(move || {
                    let buf = PixelBuffer::allocate(8, 8, PixelType::F64).unwrap();
                    for _ in 0..=i {
                        io.save(&buf, &path, BitDepth::Bit8).unwrap();
                    }
                });
            }
        });

        assert_eq!(sinks[0].len(), 1);
        assert_eq!(sinks[1].len(), 2);
    }
}
