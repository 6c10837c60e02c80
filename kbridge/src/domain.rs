//! # **kbridge** 特征

use crate::{
    errors::{BridgeError, RecvError},
    message::CapturedMessage,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use uuid::Uuid;

/// 代理原始消息记录
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    /// 主题
    pub topic: String,
    /// 分区
    pub partition: i32,
    /// 偏移
    pub offset: i64,
    /// 时间戳（毫秒）
    pub timestamp: Option<i64>,
    /// 消息键
    pub key: Option<Vec<u8>>,
    /// 消息体
    pub payload: Option<Vec<u8>>,
    /// 消息头，保持代理给出的顺序
    pub headers: Vec<(String, Option<Vec<u8>>)>,
}

/// 待发送的消息
#[derive(Debug, Clone, Default)]
pub struct OutgoingRecord {
    /// 消息键
    pub key: Option<String>,
    /// 消息体
    pub payload: Vec<u8>,
    /// 消息头
    pub headers: Vec<(String, String)>,
}

/// 消息投递结果
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    /// 主题
    pub topic_name: String,
    /// 分区
    pub partition: i32,
    /// 偏移
    pub offset: i64,
}

/// SASL 认证参数，原样交给代理客户端
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Sasl {
    /// 认证机制，如 `plain`、`scram-sha-256`
    pub mechanism: String,
    /// 用户名
    pub username: String,
    /// 密码
    pub password: String,
}

/// 单次请求的连接参数，缺省时使用进程配置
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ConnectOptions {
    /// 代理地址列表
    #[serde(default)]
    pub brokers: Option<Vec<String>>,
    /// SASL 认证
    #[serde(default)]
    pub sasl: Option<Sasl>,
    /// 是否启用 SSL
    #[serde(default)]
    pub ssl: Option<bool>,
}

impl ConnectOptions {
    /// 是否全部使用进程配置
    pub fn is_default(&self) -> bool {
        self.brokers.is_none() && self.sasl.is_none() && self.ssl.is_none()
    }
}

/// 消息代理特征
pub trait Broker: Send + Sync + 'static {
    /// 消费会话类型
    type Consumer: ConsumerSession;

    /// 以 `group` 作为消费组建立消费会话
    fn connect(
        &self,
        group: &str,
        options: &ConnectOptions,
    ) -> impl Future<Output = Result<Self::Consumer, BridgeError>> + Send;

    /// 发送消息到主题
    fn produce(
        &self,
        topic: &str,
        record: OutgoingRecord,
        options: &ConnectOptions,
    ) -> impl Future<Output = Result<Delivery, BridgeError>> + Send;
}

/// 消费会话特征
pub trait ConsumerSession: Send + Sync + 'static {
    /// 订阅主题，总是从最早的偏移开始
    fn subscribe(&self, topic: &str) -> Result<(), BridgeError>;

    /// 接收下一条消息
    fn recv(&self) -> impl Future<Output = Result<RawRecord, RecvError>> + Send;

    /// 断开会话
    fn disconnect(&self) -> Result<(), BridgeError>;
}

/// 模式注册编解码特征
///
/// 未使用已注册模式编码的数据返回 `None`，这不是错误。
pub trait SchemaCodec: Send + Sync + 'static {
    /// 解码
    fn decode(&self, bytes: &[u8]) -> impl Future<Output = Option<String>> + Send;

    /// 编码
    fn encode(&self, value: &serde_json::Value) -> impl Future<Output = Option<Vec<u8>>> + Send;
}

/// 不做任何模式编解码
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainCodec;

impl SchemaCodec for PlainCodec {
    async fn decode(&self, _bytes: &[u8]) -> Option<String> {
        None
    }

    async fn encode(&self, _value: &serde_json::Value) -> Option<Vec<u8>> {
        None
    }
}

/// 捕获消息存储特征
pub trait CaptureSink: Send + Sync + 'static {
    /// 为订阅开辟存储
    fn open(&self, id: Uuid) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// 追加消息，订阅存储未开辟时返回错误
    fn append(
        &self,
        id: Uuid,
        msg: &CapturedMessage,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// 按写入顺序读取全部消息
    fn read(&self, id: Uuid) -> impl Future<Output = Result<Vec<CapturedMessage>, BridgeError>> + Send;

    /// 释放订阅存储
    fn release(&self, id: Uuid) -> impl Future<Output = ()> + Send;
}
