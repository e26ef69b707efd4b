use std::fs;
use std::path::{Path, PathBuf};

use api::{TrackEye, Viewport};
use common::{GazerConfig, ReduceAxis};

fn get_test_dir(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("gazer_test_config_{}", name));
    let _ = fs::remove_dir_all(&path);
    let _ = fs::create_dir_all(&path);
    path
}

fn cleanup_test_dir(path: &Path) {
    let _ = fs::remove_dir_all(path);
}

#[test]
fn test_defaults_match_the_standard_setup() {
    let config = GazerConfig::default();

    assert_eq!(config.module.active, "sim");
    assert_eq!(config.tracker.data_timestep, 50);
    assert!(!config.calibration.enabled);
    assert_eq!(config.calibration.click_threshold, 5);
    assert_eq!(config.session.axis, ReduceAxis::NormalizedX);
    assert_eq!(config.output.path, Some(PathBuf::from("session.json")));
    assert!(config.session.user_agent.starts_with("gazer_d/"));
}

#[test]
fn test_load_or_create_writes_defaults_then_reads_them_back() {
    let dir = get_test_dir("create");
    let path = dir.join("config.json");
    assert!(!path.exists());

    let created = GazerConfig::load_or_create(&path).expect("create default config");
    assert!(path.exists(), "a default config file is written");
    assert_eq!(created, GazerConfig::default());

    let loaded = GazerConfig::load_or_create(&path).expect("load written config");
    assert_eq!(loaded, created);
    cleanup_test_dir(&dir);
}

#[test]
fn test_partial_config_fills_in_defaults() {
    let dir = get_test_dir("partial");
    let path = dir.join("config.json");
    fs::write(
        &path,
        r#"{
            "module": { "active": "replay" },
            "session": { "viewport": { "width": 800.0, "height": 600.0 } }
        }"#,
    )
    .expect("write partial config");

    let config = GazerConfig::load_or_create(&path).expect("load partial config");
    assert_eq!(config.module.active, "replay");
    assert_eq!(config.session.viewport, Viewport::new(800.0, 600.0));
    assert_eq!(config.tracker.move_tick_size, 50, "untouched sections keep defaults");
    assert!(config.output.pretty);
    cleanup_test_dir(&dir);
}

#[test]
fn test_camel_case_aliases_are_accepted() {
    let dir = get_test_dir("aliases");
    let path = dir.join("config.json");
    fs::write(
        &path,
        r#"{
            "module": { "active_module": "replay" },
            "tracker": {
                "applyKalmanFilter": false,
                "saveDataAcrossSessions": false,
                "moveTickSize": 10,
                "trackEye": "left"
            },
            "calibration": { "clickThreshold": 3 },
            "session": { "durationSecs": 2.5 }
        }"#,
    )
    .expect("write aliased config");

    let config = GazerConfig::load_or_create(&path).expect("load aliased config");
    assert_eq!(config.module.active, "replay");
    assert!(!config.tracker.apply_kalman_filter);
    assert!(!config.tracker.save_data_across_sessions);
    assert_eq!(config.tracker.move_tick_size, 10);
    assert_eq!(config.tracker.track_eye, TrackEye::Left);
    assert_eq!(config.calibration.click_threshold, 3);
    assert_eq!(config.session.duration_secs, Some(2.5));
    cleanup_test_dir(&dir);
}

#[test]
fn test_malformed_config_is_an_error() {
    let dir = get_test_dir("malformed");
    let path = dir.join("config.json");
    fs::write(&path, "{ active: nope").expect("write garbage");

    assert!(GazerConfig::load_or_create(&path).is_err());
    cleanup_test_dir(&dir);
}

#[test]
fn test_tracker_params_take_the_active_module_and_viewport() {
    let mut config = GazerConfig::default();
    config.module.active = "replay".to_string();
    config.tracker.tracker = "something-else".to_string();
    config.session.viewport = Viewport::new(640.0, 480.0);

    let params = config.tracker_params();
    assert_eq!(params.tracker, "replay", "the module section wins");
    assert_eq!(params.viewport, Viewport::new(640.0, 480.0));
    assert_eq!(params.data_timestep, config.tracker.data_timestep);
}
