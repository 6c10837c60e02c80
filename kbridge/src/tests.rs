mod config_test;
mod decode_test;
mod registry_test;
mod sweeper_test;

use super::*;
use crate::{
    config::CaptureConfig,
    domain::{CaptureSink, PlainCodec, RawRecord, SchemaCodec},
    errors::BridgeError,
    sink::MemorySink,
    test_utils::{MemoryBroker, record},
};
use rstest::*;
use std::sync::{Arc, LazyLock};
use tokio::time::{Duration, sleep};
use tracing::{Level, info};
use tracing_subscriber::fmt;
use uuid::Uuid;

static SETUP: LazyLock<()> = LazyLock::new(|| {
    let _ = fmt()
        .with_test_writer()
        .with_max_level(Level::DEBUG)
        .try_init();
    info!("启用 {} 测试日志输出", Level::DEBUG);
});

/// 以 0x00 开头的数据视为已注册模式编码
struct TaggedCodec;

impl SchemaCodec for TaggedCodec {
    async fn decode(&self, bytes: &[u8]) -> Option<String> {
        match bytes.split_first() {
            Some((0, rest)) => Some(String::from_utf8_lossy(rest).to_uppercase()),
            _ => None,
        }
    }

    async fn encode(&self, value: &serde_json::Value) -> Option<Vec<u8>> {
        let mut bytes = vec![0];
        bytes.extend_from_slice(value.to_string().as_bytes());
        Some(bytes)
    }
}

type TestRegistry = Registry<MemoryBroker, PlainCodec, MemorySink>;

#[fixture]
fn registry() -> Arc<TestRegistry> {
    LazyLock::force(&SETUP);
    Arc::new(Registry::new(
        MemoryBroker::new(),
        Arc::new(PlainCodec),
        Arc::new(MemorySink::new()),
        &CaptureConfig::default(),
    ))
}

async fn wait_for(registry: &TestRegistry, id: Uuid, count: usize) -> Vec<CapturedMessage> {
    for _ in 0..200 {
        let msgs = registry.fetch(id).await.unwrap();
        if msgs.len() >= count {
            return msgs;
        }
        sleep(Duration::from_millis(5)).await;
    }
    panic!("订阅 {id} 未在限定时间内捕获 {count} 条消息");
}
