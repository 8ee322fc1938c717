use super::*;

/// # Safety
/// Only one test in this crate touches the `SCENE_*` variables.
unsafe fn clear_scene_env() {
    unsafe {
        std::env::remove_var("SCENE_HANDLE_RADIUS");
        std::env::remove_var("SCENE_ROTATE_HANDLE_OFFSET");
        std::env::remove_var("SCENE_CLOSE_PATH_DISTANCE");
        std::env::remove_var("SCENE_MIN_CREATE_SIZE");
    }
}

#[test]
fn from_env_defaults_overrides_and_rejects() {
    unsafe { clear_scene_env() };
    let cfg = EditorConfig::from_env().unwrap();
    assert_eq!(cfg, EditorConfig::default());

    unsafe {
        std::env::set_var("SCENE_HANDLE_RADIUS", "12.5");
        std::env::set_var("SCENE_MIN_CREATE_SIZE", " 4 ");
    }
    let cfg = EditorConfig::from_env().unwrap();
    assert!((cfg.handle_radius - 12.5).abs() < f64::EPSILON);
    assert!((cfg.min_create_size - 4.0).abs() < f64::EPSILON);
    assert!((cfg.rotate_handle_offset - ROTATE_HANDLE_OFFSET).abs() < f64::EPSILON);

    unsafe { std::env::set_var("SCENE_CLOSE_PATH_DISTANCE", "wide") };
    let err = EditorConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::Parse { var: "SCENE_CLOSE_PATH_DISTANCE", .. }));

    unsafe { clear_scene_env() };
}

#[test]
fn parse_distance_rejects_negative_and_non_finite() {
    assert!(parse_distance("X", "-1").is_err());
    assert!(parse_distance("X", "inf").is_err());
    assert!(parse_distance("X", "NaN").is_err());
    assert!(parse_distance("X", "").is_err());
    assert!((parse_distance("X", "0").unwrap()).abs() < f64::EPSILON);
}

#[test]
fn parse_error_names_variable() {
    let err = parse_distance("SCENE_HANDLE_RADIUS", "abc").unwrap_err();
    assert_eq!(err.to_string(), "invalid value for SCENE_HANDLE_RADIUS: \"abc\"");
}
