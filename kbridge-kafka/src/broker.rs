//! Kafka 消息代理

use crate::{config::KafkaConfig, consumer::KafkaConsumer};
use kbridge::{
    domain::{self, Broker, ConnectOptions, OutgoingRecord},
    errors::BridgeError,
};
use rdkafka::{
    ClientConfig,
    consumer::StreamConsumer,
    message::{Header, OwnedHeaders},
    producer::{FutureProducer, FutureRecord, future_producer::Delivery},
};
use tracing::{debug, info, instrument};

/// Kafka 消息代理
pub struct KafkaBroker {
    cfg: KafkaConfig,
    producer: FutureProducer,
}

impl KafkaBroker {
    /// 构造消息代理，同时创建共享的生产者
    pub fn new(cfg: KafkaConfig) -> Result<Self, BridgeError> {
        let producer = client_config(&cfg, &ConnectOptions::default())
            .create()
            .map_err(|e| BridgeError::Connect(format!("共享的生产者创建失败：{e}")))?;
        Ok(Self { cfg, producer })
    }

    /// 客户端配置
    pub fn config(&self) -> &KafkaConfig {
        &self.cfg
    }
}

/// 合并进程配置与单次请求的连接参数
pub(crate) fn client_config(cfg: &KafkaConfig, options: &ConnectOptions) -> ClientConfig {
    let mut config = ClientConfig::new();
    for (key, value) in &cfg.settings {
        config.set(key, value);
    }
    let bootstrap = match &options.brokers {
        Some(brokers) if !brokers.is_empty() => brokers.join(","),
        _ => cfg.bootstrap.clone(),
    };
    config.set("bootstrap.servers", bootstrap);
    config.set("client.id", &cfg.client_id);

    let ssl = options.ssl.unwrap_or(false);
    let protocol = match (&options.sasl, ssl) {
        (Some(_), true) => Some("SASL_SSL"),
        (Some(_), false) => Some("SASL_PLAINTEXT"),
        (None, true) => Some("SSL"),
        (None, false) => None,
    };
    if let Some(protocol) = protocol {
        config.set("security.protocol", protocol);
    }
    if let Some(sasl) = &options.sasl {
        config.set("sasl.mechanisms", sasl.mechanism.to_uppercase());
        config.set("sasl.username", &sasl.username);
        config.set("sasl.password", &sasl.password);
    }
    config
}

impl Broker for KafkaBroker {
    type Consumer = KafkaConsumer;

    #[instrument(name = "connect_consumer", skip(self, options))]
    async fn connect(
        &self,
        group: &str,
        options: &ConnectOptions,
    ) -> Result<KafkaConsumer, BridgeError> {
        let mut config = client_config(&self.cfg, options);
        config.set("group.id", group);
        config.set("auto.offset.reset", "earliest");
        config.set("enable.partition.eof", "false");
        let consumer: StreamConsumer = config
            .create()
            .map_err(|e| BridgeError::Connect(format!("消费者创建失败：{e}")))?;
        info!("成功创建消费者");
        Ok(KafkaConsumer::new(consumer))
    }

    #[instrument(name = "produce_message", skip(self, record, options))]
    async fn produce(
        &self,
        topic: &str,
        record: OutgoingRecord,
        options: &ConnectOptions,
    ) -> Result<domain::Delivery, BridgeError> {
        let custom: FutureProducer;
        let producer = if options.is_default() {
            &self.producer
        } else {
            custom = client_config(&self.cfg, options)
                .create()
                .map_err(|e| BridgeError::Connect(format!("生产者创建失败：{e}")))?;
            &custom
        };

        let mut headers = OwnedHeaders::new_with_capacity(record.headers.len());
        for (key, value) in &record.headers {
            headers = headers.insert(Header {
                key: key.as_str(),
                value: Some(value.as_bytes()),
            });
        }
        let mut future: FutureRecord<'_, str, [u8]> = FutureRecord::to(topic)
            .payload(record.payload.as_slice())
            .headers(headers);
        if let Some(key) = record.key.as_deref() {
            future = future.key(key);
        }

        producer
            .send(future, self.cfg.timeout())
            .await
            .map_err(|(e, _)| BridgeError::Broker(format!("发送消息失败：{e}")))
            .map(
                |Delivery {
                     partition,
                     offset,
                     timestamp: _,
                 }| {
                    debug!("消息写入分区 {partition} 偏移 {offset}");
                    domain::Delivery {
                        topic_name: topic.to_owned(),
                        partition,
                        offset,
                    }
                },
            )
    }
}
