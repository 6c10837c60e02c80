//! # **kbridge** 核心库
//!
//! 在发布订阅代理之上提供请求响应式访问：为主题创建订阅，后台持续捕获并解码消息，
//! 按订阅 Id 读取已捕获的消息，超过存活上限的订阅定期回收。

#![warn(missing_docs)]

mod capture;
mod retrieval;

pub mod config;
pub mod context;
pub mod decode;
pub mod domain;
pub mod errors;
pub mod message;
pub mod registry;
pub mod sink;
pub mod sweeper;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

#[cfg(test)]
mod tests;

pub use context::Context;
pub use message::CapturedMessage;
pub use registry::{Registry, Subscription};
