//! # **kbridge** 的 Kafka 实现
//!
//! 基于 rdkafka 的消息代理，以及兼容 Confluent 线格式的模式注册编解码。

pub(crate) mod avro;

pub mod broker;
pub mod config;
pub mod consumer;
pub mod schema;

#[cfg(test)]
mod tests;

pub use broker::KafkaBroker;
pub use config::KafkaConfig;
pub use schema::SchemaRegistry;
