use kbridge::config::build_config;
use kbridge_kafka::KafkaConfig;
use std::{path::PathBuf, time::Duration};

#[test]
fn kafka_section_is_loaded() {
    let config = build_config(PathBuf::from(env!("CARGO_MANIFEST_DIR"))).unwrap();

    let cfg = KafkaConfig::load(&config).unwrap();

    assert_eq!(cfg.bootstrap, "localhost:9092");
    assert_eq!(cfg.client_id, "kbridge-kafka-client");
    assert_eq!(cfg.timeout(), Duration::from_secs(45));
    assert_eq!(
        cfg.settings.get("session.timeout.ms").map(String::as_str),
        Some("10000")
    );
}
