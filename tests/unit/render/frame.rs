use super::*;
use crate::{
    assets::store::PreparedImage,
    foundation::core::Affine,
    model::project::AssetRef,
    render::surface::{DrawCommand, RecordingSurface},
};

fn project() -> Project {
    Project::from_json_str(
        r#"{
            "characters": [{ "id": "c1", "name": "Mira" }],
            "scenes": [{
                "id": "s1", "order": 0, "backgroundImageRef": "bg.png",
                "dialogues": [{ "id": "d1", "characterId": "c1", "text": "We sail at dawn." }]
            }]
        }"#,
    )
    .unwrap()
}

#[test]
fn background_is_animated_and_subtitle_follows() {
    let project = project();
    let mut assets = AssetStore::new();
    assets.insert_image(AssetRef::new("bg.png"), PreparedImage::solid(4, 4, [9, 9, 9, 255]));

    let canvas = Canvas::HD;
    let renderer = FrameRenderer::new(canvas, Rgba8::rgb(0, 0, 0));
    let mut s = RecordingSurface::new(canvas.width, canvas.height);
    let view = FrameView {
        project: &project,
        assets: &assets,
        scene_index: 0,
        line: project.dialogue(0, 0),
        elapsed_ms: 2_500.0,
    };
    renderer.render(&mut s, &view);

    let cmds = s.commands();
    assert_eq!(cmds[0], DrawCommand::Clear(Rgba8::rgb(0, 0, 0)));
    let DrawCommand::Image { dst, transform, .. } = &cmds[1] else {
        panic!("expected background, got {:?}", cmds[1]);
    };
    assert_eq!(*dst, canvas.rect());
    assert_eq!(*transform, ken_burns::transform(2_500.0).to_affine(canvas));
    assert_ne!(*transform, Affine::IDENTITY);
    assert!(matches!(cmds[2], DrawCommand::RoundedRect(..)));
    assert!(cmds.iter().any(|c| matches!(c, DrawCommand::Text { text, .. } if text == "MIRA")));
    assert_eq!(s.save_depth(), 0);
}

#[test]
fn missing_background_and_no_line_draws_only_clear() {
    let project = project();
    let assets = AssetStore::new();
    let renderer = FrameRenderer::new(Canvas::HD, Rgba8::rgb(1, 2, 3));
    let mut s = RecordingSurface::new(1280, 720);
    renderer.render(
        &mut s,
        &FrameView {
            project: &project,
            assets: &assets,
            scene_index: 0,
            line: None,
            elapsed_ms: 0.0,
        },
    );
    assert_eq!(s.commands(), &[DrawCommand::Clear(Rgba8::rgb(1, 2, 3))]);
}

#[test]
fn out_of_range_scene_renders_without_failing() {
    let project = project();
    let assets = AssetStore::new();
    let renderer = FrameRenderer::new(Canvas::HD, Rgba8::rgb(0, 0, 0));
    let mut s = RecordingSurface::new(1280, 720);
    renderer.render(
        &mut s,
        &FrameView {
            project: &project,
            assets: &assets,
            scene_index: 9,
            line: None,
            elapsed_ms: 0.0,
        },
    );
    assert_eq!(s.commands().len(), 1);
}

#[test]
fn opaque_copy_flattens_translucent_pixels_over_background() {
    let frame = FrameRGBA {
        width: 2,
        height: 1,
        data: vec![100, 0, 0, 128, 10, 20, 30, 255],
        premultiplied: true,
    };
    let out = frame.opaque_rgba8([0, 0, 254, 255]);
    assert_eq!(&out[..4], &[100, 0, 127, 255]);
    assert_eq!(&out[4..], &[10, 20, 30, 255]);
}
