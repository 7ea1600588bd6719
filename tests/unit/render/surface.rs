use super::*;

#[test]
fn save_restore_scopes_the_transform() {
    let mut s = RecordingSurface::new(100, 50);
    let img = PreparedImage::solid(2, 2, [0, 0, 0, 255]);

    s.save();
    s.transform(Affine::translate((5.0, 0.0)));
    s.draw_image(&img, Rect::new(0.0, 0.0, 100.0, 50.0));
    s.restore();
    s.draw_image(&img, Rect::new(0.0, 0.0, 100.0, 50.0));

    let transforms: Vec<Affine> = s
        .commands()
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Image { transform, .. } => Some(*transform),
            _ => None,
        })
        .collect();
    assert_eq!(transforms, vec![Affine::translate((5.0, 0.0)), Affine::IDENTITY]);
    assert_eq!(s.save_depth(), 0);
}

#[test]
fn rounded_rects_can_be_disabled() {
    let mut s = RecordingSurface::new(10, 10).with_rounded_rects(false);
    assert!(!s.fill_rounded_rect(Rect::new(0.0, 0.0, 5.0, 5.0), 2.0, Rgba8::WHITE));
    assert!(s.commands().is_empty());
}

#[test]
fn measures_with_fixed_advance() {
    let mut s = RecordingSurface::new(10, 10);
    assert_eq!(s.measure("abcd", 10.0), 20.0);
}
