//! # 读取捕获消息

use crate::{
    domain::{Broker, CaptureSink, SchemaCodec},
    errors::BridgeError,
    message::CapturedMessage,
    registry::Registry,
};
use uuid::Uuid;

impl<B, K, S> Registry<B, K, S>
where
    B: Broker,
    K: SchemaCodec,
    S: CaptureSink,
{
    /// 读取订阅已捕获的全部消息
    ///
    /// 读取不会清空缓存，重复读取能看到期间新捕获的消息。订阅不存在或已回收时返回
    /// [`BridgeError::NotFound`]，存活但尚无消息时返回空列表。
    pub async fn fetch(&self, id: Uuid) -> Result<Vec<CapturedMessage>, BridgeError> {
        if !self.contains(id) {
            return Err(BridgeError::NotFound(id));
        }
        self.sink.read(id).await
    }
}
