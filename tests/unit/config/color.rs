use serde_json::json;

use super::*;

#[test]
fn parses_hex_rgb_and_rgba() {
    let c: ColorDef = serde_json::from_value(json!("#3DD2E6")).unwrap();
    assert_eq!(c.rgba8(), Rgba8::new(0x3D, 0xD2, 0xE6, 255));

    let c: ColorDef = serde_json::from_value(json!("9b59b680")).unwrap();
    assert_eq!(c.rgba8(), Rgba8::new(0x9B, 0x59, 0xB6, 0x80));
}

#[test]
fn parses_object_and_array() {
    let c: ColorDef = serde_json::from_value(json!({"r": 1.0, "g": 0.5, "b": 0.0})).unwrap();
    assert_eq!(c.rgba8(), Rgba8::new(255, 128, 0, 255));

    let c: ColorDef = serde_json::from_value(json!([0.0, 0.0, 1.0, 0.15])).unwrap();
    assert_eq!(c.rgba8(), Rgba8::new(0, 0, 255, 38));

    assert!(serde_json::from_value::<ColorDef>(json!([0.0, 1.0])).is_err());
}

#[test]
fn malformed_hex_is_rejected() {
    for bad in ["#12345", "#GGGGGG", "", "#1234567890", "#ééé"] {
        assert!(parse_hex(bad).is_err(), "{bad:?}");
    }
    assert!(matches!(
        ColorDef::hex("nope"),
        Err(SleepGridError::Validation(_))
    ));
}

#[test]
fn serializes_as_hex() {
    let v = serde_json::to_value(ColorDef(Rgba8::new(0xD5, 0x62, 0x2F, 255))).unwrap();
    assert_eq!(v, json!("#D5622F"));
    let v = serde_json::to_value(ColorDef(Rgba8::new(0, 0, 0, 0x26))).unwrap();
    assert_eq!(v, json!("#00000026"));
}
