//! 内部单元测试

mod broker_test;

use super::*;
use kbridge::domain::{ConnectOptions, Sasl, SchemaCodec};
use rstest::*;
use std::sync::LazyLock;
use tracing::{Level, info};
use tracing_subscriber::fmt;

static SETUP: LazyLock<()> = LazyLock::new(|| {
    let _ = fmt()
        .with_test_writer()
        .with_max_level(Level::DEBUG)
        .try_init();
    info!("启用 {} 测试日志输出", Level::DEBUG);
});

#[fixture]
fn kafka_config() -> KafkaConfig {
    LazyLock::force(&SETUP);
    let mut cfg = KafkaConfig::default();
    cfg.settings
        .insert("session.timeout.ms".to_owned(), "10000".to_owned());
    cfg
}
