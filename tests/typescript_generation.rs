//! TypeScript Generation Tests
//!
//! Validates that recorder types can be exported to TypeScript when the
//! tauri feature is enabled.

#[cfg(feature = "tauri")]
#[test]
fn test_core_types_implement_specta_type() {
    use specta::Type;

    // If this compiles, all types are configured for TypeScript export.
    fn assert_type<T: Type>() {}

    assert_type::<gesture_recorder::GestureId>();
    assert_type::<gesture_recorder::GestureCategory>();
    assert_type::<gesture_recorder::StreamingOptions>();
    assert_type::<gesture_recorder::RecordingDevice>();
    assert_type::<gesture_recorder::SaveLocation>();
    assert_type::<gesture_recorder::UpdateRate>();
    assert_type::<gesture_recorder::SessionState>();
}

#[cfg(not(feature = "tauri"))]
#[test]
fn test_tauri_feature_disabled() {
    // Types still compile without specta::Type
    let _ = gesture_recorder::UpdateRate::Native;
    let _ = gesture_recorder::SessionState::Completed;
}
