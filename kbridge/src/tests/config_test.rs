use super::*;
use crate::{
    config::{StoreKind, load_section},
    errors::ConfigError,
};
use ::config::Config;
use std::path::PathBuf;

#[test]
fn missing_section_uses_defaults() {
    let config = Config::builder().build().unwrap();

    let cfg: CaptureConfig = load_section(&config, "capture").unwrap();

    assert_eq!(cfg.lifetime(), Duration::from_secs(600));
    assert_eq!(cfg.sweep_interval(), Duration::from_secs(60));
    assert_eq!(cfg.store, StoreKind::Memory);
}

#[test]
fn section_overrides_defaults() {
    let config = Config::builder()
        .set_override("capture.lifetime", 120)
        .unwrap()
        .set_override("capture.store", "file")
        .unwrap()
        .set_override("capture.dir", "/tmp/kbridge")
        .unwrap()
        .build()
        .unwrap();

    let cfg: CaptureConfig = load_section(&config, "capture").unwrap();

    assert_eq!(cfg.lifetime, 120);
    assert_eq!(cfg.sweep, 60);
    assert_eq!(cfg.store, StoreKind::File);
    assert_eq!(cfg.dir, PathBuf::from("/tmp/kbridge"));
}

#[test]
fn zero_lifetime_is_rejected() {
    let config = Config::builder()
        .set_override("capture.lifetime", 0)
        .unwrap()
        .build()
        .unwrap();

    let result = load_section::<CaptureConfig>(&config, "capture");

    assert!(matches!(
        result,
        Err(ConfigError::ValidationError { section, .. }) if section == "capture"
    ));
}
