//! # 捕获会话

use crate::{
    decode::DecodePipeline,
    domain::{CaptureSink, ConsumerSession, SchemaCodec},
    errors::{BridgeError, RecvError},
    message::CapturedMessage,
    registry::Subscription,
};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, error, info, instrument, warn};

/// 持续接收订阅主题的消息，解码后写入存储，直至订阅被回收或消息流不可恢复地中断
#[instrument(name = "capture_session", skip_all, fields(id = %sub.id(), topic = sub.topic()))]
pub(crate) async fn run<C, K, S>(
    sub: Arc<Subscription>,
    consumer: Arc<C>,
    pipeline: DecodePipeline<K>,
    sink: Arc<S>,
    stop: Arc<Notify>,
) where
    C: ConsumerSession,
    K: SchemaCodec,
    S: CaptureSink,
{
    let stopped = stop.notified();
    tokio::pin!(stopped);
    info!("开始捕获消息");
    loop {
        tokio::select! {
            biased;
            _ = &mut stopped => {
                info!("订阅已回收，停止捕获");
                break;
            }
            data = consumer.recv() => match data {
                Ok(record) => {
                    let msg = CapturedMessage::capture(record, &pipeline).await;
                    debug!("捕获分区 {} 偏移 {} 的消息", msg.partition, msg.offset);
                    match sink.append(sub.id(), &msg).await {
                        Ok(()) => {}
                        Err(BridgeError::NotFound(_)) => {
                            info!("订阅存储已释放，停止捕获");
                            break;
                        }
                        Err(e) => error!("写入捕获消息失败：{e}"),
                    }
                }
                Err(e @ RecvError::Transient(_)) => warn!("{e}"),
                Err(e @ RecvError::Fatal(_)) => {
                    error!("{e}，订阅保持静止直至被回收");
                    break;
                }
            }
        }
    }
}
