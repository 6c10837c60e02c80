//! # 测试工具

mod broker;

pub use broker::{MemoryBroker, MemoryConsumer};

use crate::domain::RawRecord;

/// 构造只有消息体的原始记录
pub fn record(payload: &[u8]) -> RawRecord {
    RawRecord {
        payload: Some(payload.to_vec()),
        ..Default::default()
    }
}
