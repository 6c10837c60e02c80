//! # 解码管道
//!
//! 先尝试模式注册解码，失败时退回原始文本，数据缺失时为空字符串。

use crate::domain::SchemaCodec;
use std::sync::Arc;

/// 解码结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// 模式注册解码成功
    Schema(String),
    /// 按原始文本处理
    Raw(String),
    /// 数据缺失
    Empty,
}

impl Decoded {
    /// 转换成字符串，任何情况下都有确定的值
    pub fn into_string(self) -> String {
        match self {
            Decoded::Schema(s) | Decoded::Raw(s) => s,
            Decoded::Empty => String::new(),
        }
    }
}

/// 解码管道
pub struct DecodePipeline<K> {
    codec: Arc<K>,
}

impl<K> Clone for DecodePipeline<K> {
    fn clone(&self) -> Self {
        Self {
            codec: Arc::clone(&self.codec),
        }
    }
}

impl<K: SchemaCodec> DecodePipeline<K> {
    /// 构造解码管道
    pub fn new(codec: Arc<K>) -> Self {
        Self { codec }
    }

    /// 解码一段可能缺失的数据
    pub async fn resolve(&self, bytes: Option<&[u8]>) -> Decoded {
        let Some(bytes) = bytes else {
            return Decoded::Empty;
        };
        match self.codec.decode(bytes).await {
            Some(s) if !s.is_empty() => Decoded::Schema(s),
            _ => Decoded::Raw(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    /// 解码并按统一的回退规则转换成字符串
    #[inline]
    pub async fn text(&self, bytes: Option<&[u8]>) -> String {
        self.resolve(bytes).await.into_string()
    }
}
