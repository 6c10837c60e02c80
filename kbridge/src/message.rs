//! # 捕获消息

use crate::{
    decode::DecodePipeline,
    domain::{RawRecord, SchemaCodec},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 捕获并解码后的消息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CapturedMessage {
    /// 消息键
    pub key: Option<String>,
    /// 消息体
    pub value: String,
    /// 消息头
    pub headers: BTreeMap<String, String>,
    /// 主题
    pub topic: String,
    /// 分区
    pub partition: i32,
    /// 偏移
    pub offset: i64,
    /// 时间戳（毫秒）
    pub timestamp: Option<i64>,
}

impl CapturedMessage {
    /// 经解码管道将原始记录转换成捕获消息
    pub async fn capture<K: SchemaCodec>(
        record: RawRecord,
        pipeline: &DecodePipeline<K>,
    ) -> Self {
        let key = match record.key.as_deref() {
            Some(k) => Some(pipeline.text(Some(k)).await),
            None => None,
        };
        let value = pipeline.text(record.payload.as_deref()).await;
        let mut headers = BTreeMap::new();
        for (name, raw) in &record.headers {
            headers.insert(name.clone(), pipeline.text(raw.as_deref()).await);
        }
        Self {
            key,
            value,
            headers,
            topic: record.topic,
            partition: record.partition,
            offset: record.offset,
            timestamp: record.timestamp,
        }
    }
}
