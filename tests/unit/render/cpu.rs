use super::*;

fn px(frame: &FrameRGBA, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [frame.data[i], frame.data[i + 1], frame.data[i + 2], frame.data[i + 3]]
}

#[test]
fn clear_fills_every_pixel() {
    let mut s = CpuSurface::new(8, 4).unwrap();
    s.begin_frame();
    s.clear(Rgba8::rgb(0, 0, 255));
    let f = s.finish_frame();
    assert_eq!((f.width, f.height), (8, 4));
    assert!(f.premultiplied);
    assert_eq!(px(&f, 0, 0), [0, 0, 255, 255]);
    assert_eq!(px(&f, 7, 3), [0, 0, 255, 255]);
}

#[test]
fn image_is_stretched_into_destination() {
    let mut s = CpuSurface::new(16, 16).unwrap();
    let img = PreparedImage::solid(2, 2, [255, 0, 0, 255]);
    s.begin_frame();
    s.clear(Rgba8::rgb(0, 0, 0));
    s.draw_image(&img, Rect::new(0.0, 0.0, 8.0, 16.0));
    let f = s.finish_frame();
    assert_eq!(px(&f, 2, 8), [255, 0, 0, 255]);
    assert_eq!(px(&f, 12, 8), [0, 0, 0, 255]);
}

#[test]
fn transform_applies_until_restore() {
    let mut s = CpuSurface::new(16, 8).unwrap();
    s.begin_frame();
    s.clear(Rgba8::rgb(0, 0, 0));
    s.save();
    s.transform(Affine::translate((8.0, 0.0)));
    s.fill_rect(Rect::new(0.0, 0.0, 8.0, 8.0), Rgba8::WHITE);
    s.restore();
    let f = s.finish_frame();
    assert_eq!(px(&f, 12, 4), [255, 255, 255, 255]);
    assert_eq!(px(&f, 3, 4), [0, 0, 0, 255]);
}

#[test]
fn rounded_rect_is_supported_and_blends() {
    let mut s = CpuSurface::new(20, 20).unwrap();
    s.begin_frame();
    s.clear(Rgba8::WHITE);
    assert!(s.fill_rounded_rect(Rect::new(0.0, 0.0, 20.0, 20.0), 6.0, Rgba8::rgba(0, 0, 0, 179)));
    let f = s.finish_frame();
    let centre = px(&f, 10, 10);
    assert!(centre[0] > 60 && centre[0] < 100, "{centre:?}");
    // Corner stays close to the white background.
    assert!(px(&f, 0, 0)[0] > 200);
}

#[test]
fn text_without_font_is_measured_but_not_drawn() {
    let mut s = CpuSurface::new(32, 32).unwrap();
    assert!(!s.has_font());
    assert_eq!(s.measure("abc", 20.0), 30.0);
    s.begin_frame();
    s.clear(Rgba8::rgb(0, 0, 0));
    s.fill_text(
        "abc",
        Point::new(0.0, 0.0),
        &TextStyle {
            size_px: 20.0,
            color: Rgba8::WHITE,
        },
    );
    let f = s.finish_frame();
    assert!(f.data.chunks_exact(4).all(|p| p == [0, 0, 0, 255]));
}

#[test]
fn rejects_oversized_surfaces() {
    assert!(CpuSurface::new(70_000, 10).is_err());
    assert!(CpuSurface::new(0, 10).is_err());
}
