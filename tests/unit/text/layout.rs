use super::*;

#[test]
fn garbage_font_bytes_are_rejected() {
    let err = TextLayoutEngine::from_font_bytes(b"definitely not a font".to_vec()).unwrap_err();
    assert!(matches!(err, StoryError::Asset(_)));
}

#[test]
fn missing_font_file_is_an_error() {
    assert!(TextLayoutEngine::from_font_file(Path::new("target/no/such/font.ttf")).is_err());
}
