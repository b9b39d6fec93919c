use picture_viewer::config::Configuration;
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn defaults_apply_to_empty_document() {
    let cfg: Configuration = serde_yaml::from_str("{}").unwrap();
    assert_eq!(cfg.delay_time, Duration::from_secs(5));
    assert_eq!(cfg.animation_duration, Duration::from_millis(250));
    assert!(!cfg.fit_to_window);
    assert!(!cfg.resize_window_to_image);
    assert_eq!(cfg.fetch_timeout, Duration::from_secs(30));
    assert_eq!(cfg.max_download_bytes, 64 * 1024 * 1024);
    assert_eq!(cfg.ui_channel_capacity, 64);
    assert_eq!(cfg.download_dir(), std::env::temp_dir());
    cfg.validated().unwrap();
}

#[test]
fn parse_kebab_case_config() {
    let yaml = r#"
delay-time: 3s
animation-duration: 1s 500ms
fit-to-window: true
resize-window-to-image: true
download-dir: /var/tmp/viewer
fetch-timeout: 2m
max-download-bytes: 1048576
ui-channel-capacity: 8
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.delay_time, Duration::from_secs(3));
    assert_eq!(cfg.animation_duration, Duration::from_millis(1500));
    assert!(cfg.fit_to_window);
    assert!(cfg.resize_window_to_image);
    assert_eq!(cfg.download_dir(), PathBuf::from("/var/tmp/viewer"));
    assert_eq!(cfg.fetch_timeout, Duration::from_secs(120));
    assert_eq!(cfg.max_download_bytes, 1_048_576);
    assert_eq!(cfg.ui_channel_capacity, 8);
}

#[test]
fn zero_animation_is_allowed() {
    let cfg: Configuration = serde_yaml::from_str("animation-duration: 0s").unwrap();
    let cfg = cfg.validated().unwrap();
    assert!(cfg.animation_duration.is_zero());
}

#[test]
fn unknown_keys_are_rejected() {
    let err = serde_yaml::from_str::<Configuration>("delay: 3s").unwrap_err();
    assert!(err.to_string().contains("unknown field"), "{err}");
}

#[test]
fn validation_rejects_zero_values() {
    for (yaml, needle) in [
        ("delay-time: 0s", "delay-time"),
        ("fetch-timeout: 0s", "fetch-timeout"),
        ("max-download-bytes: 0", "max-download-bytes"),
        ("ui-channel-capacity: 0", "ui-channel-capacity"),
        ("download-dir: ''", "download-dir"),
    ] {
        let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
        let err = cfg.validated().unwrap_err();
        assert!(err.to_string().contains(needle), "{yaml}: {err}");
    }
}

#[test]
fn loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("viewer.yaml");
    std::fs::write(&path, "delay-time: 10s\nfit-to-window: true\n").unwrap();

    let cfg = Configuration::from_yaml_file(&path).unwrap();
    assert_eq!(cfg.delay_time, Duration::from_secs(10));
    assert!(cfg.fit_to_window);

    assert!(Configuration::from_yaml_file(dir.path().join("missing.yaml")).is_err());
}
