//! Kafka 消费会话

use kbridge::{
    domain::{ConsumerSession, RawRecord},
    errors::{BridgeError, RecvError},
};
use rdkafka::{
    Message,
    consumer::{Consumer, StreamConsumer},
    error::{KafkaError, RDKafkaErrorCode},
    message::Headers,
};
use tracing::info;

/// Kafka 消费会话
pub struct KafkaConsumer {
    inner: StreamConsumer,
}

impl KafkaConsumer {
    pub(crate) fn new(inner: StreamConsumer) -> Self {
        Self { inner }
    }
}

impl ConsumerSession for KafkaConsumer {
    fn subscribe(&self, topic: &str) -> Result<(), BridgeError> {
        self.inner
            .subscribe(&[topic])
            .map_err(|e| BridgeError::Broker(format!("订阅主题 {topic} 失败：{e}")))
    }

    async fn recv(&self) -> Result<RawRecord, RecvError> {
        match self.inner.recv().await {
            Ok(msg) => Ok(to_record(&msg)),
            Err(e) => Err(classify(e)),
        }
    }

    fn disconnect(&self) -> Result<(), BridgeError> {
        self.inner.unsubscribe();
        info!("消费者已取消订阅");
        Ok(())
    }
}

/// 转换成原始消息记录
pub(crate) fn to_record<M: Message>(msg: &M) -> RawRecord {
    let headers = msg
        .headers()
        .map(|hs| {
            hs.iter()
                .map(|h| (h.key.to_owned(), h.value.map(<[u8]>::to_vec)))
                .collect()
        })
        .unwrap_or_default();
    RawRecord {
        topic: msg.topic().to_owned(),
        partition: msg.partition(),
        offset: msg.offset(),
        timestamp: msg.timestamp().to_millis(),
        key: msg.key().map(<[u8]>::to_vec),
        payload: msg.payload().map(<[u8]>::to_vec),
        headers,
    }
}

/// 区分可恢复与不可恢复的消费错误
pub(crate) fn classify(e: KafkaError) -> RecvError {
    let fatal = matches!(e, KafkaError::Canceled)
        || matches!(
            e.rdkafka_error_code(),
            Some(
                RDKafkaErrorCode::Fatal
                    | RDKafkaErrorCode::TopicAuthorizationFailed
                    | RDKafkaErrorCode::GroupAuthorizationFailed
            )
        );
    if fatal {
        RecvError::Fatal(e.to_string())
    } else {
        RecvError::Transient(e.to_string())
    }
}
