use kbridge::{config::load_section, errors::ConfigError};
use serde::Deserialize;
use std::{collections::HashMap, time::Duration};
use validator::Validate;

/// Kafka 客户端配置
#[derive(Debug, Deserialize, Validate, Clone)]
#[serde(default)]
pub struct KafkaConfig {
    /// 默认代理地址
    #[validate(length(min = 1))]
    pub bootstrap: String,
    /// 客户端标识
    pub client_id: String,
    /// 发送超时（秒）
    #[validate(range(min = 1))]
    pub timeout: u64,
    /// 额外的 librdkafka 配置
    pub settings: HashMap<String, String>,
}

impl KafkaConfig {
    /// 从 `kafka` 配置节加载
    pub fn load(config: &config::Config) -> Result<Self, ConfigError> {
        load_section(config, "kafka")
    }

    /// 发送超时
    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            bootstrap: "localhost:9092".to_owned(),
            client_id: "kbridge-kafka-client".to_owned(),
            timeout: 45,
            settings: HashMap::new(),
        }
    }
}
