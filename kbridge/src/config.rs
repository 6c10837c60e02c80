//! # **kbridge** 配置

use crate::errors::ConfigError;
use config::{Config, Environment, File};
use serde::{Deserialize, de::DeserializeOwned};
use std::{path::PathBuf, time::Duration};
use validator::Validate;

/// 构建分层配置
///
/// 依次加载 `config/default`、`config/<KBRIDGE_ENV>` 以及 `KBRIDGE__` 前缀的环境变量，
/// 配置根目录可由 `KBRIDGE_CONFIG_ROOT` 覆盖。
pub fn build_config(crate_dir: PathBuf) -> Result<Config, ConfigError> {
    let config_root = std::env::var("KBRIDGE_CONFIG_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| crate_dir.join("config"));
    let env = std::env::var("KBRIDGE_ENV").unwrap_or_else(|_| "dev".to_string());
    let config = Config::builder()
        .add_source(File::from(config_root.join("default")).required(false))
        .add_source(File::from(config_root.join(env)).required(false))
        .add_source(
            Environment::with_prefix("KBRIDGE")
                .separator("__")
                .list_separator(","),
        )
        .build()?;
    Ok(config)
}

/// 加载并验证配置节，配置节缺失时使用默认值
pub fn load_section<T>(config: &Config, section: &str) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Validate + Default,
{
    let cfg = match config.get::<T>(section) {
        Ok(c) => c,
        Err(config::ConfigError::NotFound(_)) => T::default(),
        Err(e) => return Err(e.into()),
    };
    cfg.validate().map_err(|e| ConfigError::ValidationError {
        section: section.to_string(),
        message: e.to_string(),
    })?;
    Ok(cfg)
}

/// 消息存储方式
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// 内存缓存
    #[default]
    Memory,
    /// 文件持久化
    File,
}

/// 订阅捕获配置
#[derive(Debug, Deserialize, Validate, Clone)]
#[serde(default)]
pub struct CaptureConfig {
    /// 订阅最长存活时间（秒）
    #[validate(range(min = 1))]
    pub lifetime: u64,
    /// 回收扫描间隔（秒）
    #[validate(range(min = 1))]
    pub sweep: u64,
    /// 消息存储方式
    pub store: StoreKind,
    /// 文件存储目录
    pub dir: PathBuf,
}

impl CaptureConfig {
    /// 订阅最长存活时间
    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.lifetime)
    }

    /// 回收扫描间隔
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep)
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            lifetime: 10 * 60,
            sweep: 60,
            store: StoreKind::Memory,
            dir: PathBuf::from("data"),
        }
    }
}
