use kbridge::{config::load_section, errors::ConfigError};
use serde::Deserialize;
use std::time::Duration;
use validator::Validate;

/// HTTP 服务配置
#[derive(Debug, Deserialize, Validate, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    #[validate(length(min = 1))]
    pub addr: String,
    /// 读取消息的默认超时（毫秒）
    #[validate(range(min = 1))]
    pub consume_timeout: u64,
    /// 读取消息的轮询间隔（毫秒）
    #[validate(range(min = 1))]
    pub poll: u64,
}

impl ServerConfig {
    /// 从 `server` 配置节加载
    pub fn load(config: &config::Config) -> Result<Self, ConfigError> {
        load_section(config, "server")
    }

    #[inline]
    pub fn consume_timeout(&self) -> Duration {
        Duration::from_millis(self.consume_timeout)
    }

    #[inline]
    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:3000".to_owned(),
            consume_timeout: 25_000,
            poll: 200,
        }
    }
}
