//! # **kbridge** 错误定义

use thiserror::Error;
use uuid::Uuid;

/// **kbridge** 错误枚举
#[derive(Debug, Error)]
pub enum BridgeError {
    /// 订阅不存在或已被回收
    #[error("订阅 {0} 不存在")]
    NotFound(Uuid),
    /// 建立代理连接失败
    #[error("建立代理连接失败：{0}")]
    Connect(String),
    /// 代理操作失败
    #[error("代理操作失败：{0}")]
    Broker(String),
    /// 消息存储错误
    #[error("消息存储错误：{0}")]
    Store(String),
    /// 编解码错误
    #[error("编解码错误：{0}")]
    Codec(String),
    /// 配置错误
    #[error("配置错误")]
    Config(#[from] ConfigError),
}

impl From<std::io::Error> for BridgeError {
    fn from(e: std::io::Error) -> Self {
        BridgeError::Store(e.to_string())
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(e: serde_json::Error) -> Self {
        BridgeError::Codec(e.to_string())
    }
}

/// 读取消息流错误
#[derive(Debug, Error)]
pub enum RecvError {
    /// 可恢复错误，继续读取
    #[error("读取消息流暂时失败：{0}")]
    Transient(String),
    /// 不可恢复错误，终止捕获
    #[error("读取消息流失败：{0}")]
    Fatal(String),
}

/// 配置错误枚举
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 加载配置失败
    #[error("加载配置失败：{0}")]
    Load(#[from] config::ConfigError),
    /// 配置验证失败
    #[error("配置'{section}'验证失败：{message}")]
    ValidationError {
        /// 配置节
        section: String,
        /// 错误信息
        message: String,
    },
}
