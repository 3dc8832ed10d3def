use std::path::PathBuf;
use std::sync::Mutex;

use tempfile::NamedTempFile;

use frame_grabber::config::GrabberConfig;
use frame_grabber::ResizeFilter;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "GRABBER_CONFIG",
        "GRABBER_SOURCE_URL",
        "GRABBER_OUT",
        "GRABBER_WIDTH",
        "GRABBER_HEIGHT",
        "GRABBER_FPS",
        "GRABBER_BLOCK",
        "GRABBER_FILTER",
    ] {
        std::env::remove_var(key);
    }
}

fn write_config(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");
    file
}

#[test]
fn defaults_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = GrabberConfig::load().expect("load defaults");
    assert_eq!(cfg.source.url, "stub://synthetic");
    assert_eq!((cfg.source.width, cfg.source.height), (640, 480));
    assert_eq!(cfg.source.target_fps, 30);
    assert!(cfg.capture.enabled);
    assert_eq!(cfg.capture.filter, ResizeFilter::Bilinear);
    assert_eq!(cfg.capture.block_factor, 8);
    assert_eq!(cfg.output_dir, PathBuf::from("grab_out"));
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        r#"{
            "output_dir": "captures",
            "source": {
                "url": "stub://bench",
                "width": 1920,
                "height": 1080,
                "target_fps": 60
            },
            "capture": {
                "enabled": false,
                "filter": "bicubic",
                "resize_width": 480,
                "resize_height": 270,
                "block_factor": 60
            }
        }"#,
    );

    std::env::set_var("GRABBER_CONFIG", file.path());
    std::env::set_var("GRABBER_FPS", "15");
    std::env::set_var("GRABBER_FILTER", "nearest");

    let cfg = GrabberConfig::load().expect("load config");

    assert_eq!(cfg.output_dir, PathBuf::from("captures"));
    assert_eq!(cfg.source.url, "stub://bench");
    assert_eq!((cfg.source.width, cfg.source.height), (1920, 1080));
    assert_eq!(cfg.source.target_fps, 15);
    assert!(!cfg.capture.enabled);
    assert_eq!(cfg.capture.filter, ResizeFilter::Nearest);
    assert_eq!((cfg.capture.resize_width, cfg.capture.resize_height), (480, 270));
    assert_eq!(cfg.capture.block_factor, 60);

    let source = cfg.source_config(Some(3));
    assert_eq!(source.url, "stub://bench");
    assert_eq!(source.max_frames, Some(3));

    clear_env();
}

#[test]
fn explicit_path_ignores_env_path() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(r#"{ "source": { "width": 320, "height": 240 } }"#);
    std::env::set_var("GRABBER_CONFIG", "/nonexistent/grabber.json");

    let cfg = GrabberConfig::load_from(Some(file.path())).expect("load config");
    assert_eq!((cfg.source.width, cfg.source.height), (320, 240));

    clear_env();
}

#[test]
fn rejects_block_factor_that_does_not_divide_frame() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        r#"{
            "source": { "width": 1920, "height": 1080 },
            "capture": { "block_factor": 7 }
        }"#,
    );
    std::env::set_var("GRABBER_CONFIG", file.path());

    let err = GrabberConfig::load().unwrap_err();
    assert!(err.to_string().contains("block_factor"));

    clear_env();
}

#[test]
fn rejects_bad_env_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("GRABBER_WIDTH", "wide");
    assert!(GrabberConfig::load().is_err());
    clear_env();

    std::env::set_var("GRABBER_FILTER", "lanczos");
    assert!(GrabberConfig::load().is_err());
    clear_env();

    std::env::set_var("GRABBER_HEIGHT", "0");
    assert!(GrabberConfig::load().is_err());
    clear_env();
}

#[test]
fn rejects_malformed_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config("{ not json");
    let err = GrabberConfig::load_from(Some(file.path())).unwrap_err();
    assert!(err.to_string().contains("invalid config file"));

    clear_env();
}

#[test]
fn validate_catches_overrides_applied_after_load() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut cfg = GrabberConfig::load().expect("load defaults");
    cfg.validate().expect("defaults are valid");

    cfg.capture.block_factor = 7;
    let err = cfg.validate().unwrap_err();
    assert!(err.to_string().contains("block_factor"));

    cfg.capture.block_factor = 8;
    cfg.capture.resize_width = 0;
    assert!(cfg.validate().is_err());

    clear_env();
}
