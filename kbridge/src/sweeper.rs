//! # 订阅回收

use crate::{
    context::Context,
    domain::{Broker, CaptureSink, SchemaCodec},
    registry::Registry,
};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::Notify,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tracing::{debug, info, instrument};

/// 在上下文中启动回收任务
pub async fn launch<B, K, S>(context: &Context, registry: Arc<Registry<B, K, S>>, period: Duration)
where
    B: Broker,
    K: SchemaCodec,
    S: CaptureSink,
{
    context
        .spawn(move |ready, notify| sweep(registry, period, ready, notify))
        .await;
}

/// 按固定间隔回收超过存活上限的订阅
#[instrument(name = "lifetime_sweeper", skip_all)]
pub async fn sweep<B, K, S>(
    registry: Arc<Registry<B, K, S>>,
    period: Duration,
    ready: Arc<Notify>,
    notify: Arc<Notify>,
) where
    B: Broker,
    K: SchemaCodec,
    S: CaptureSink,
{
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let notified = notify.notified();
    tokio::pin!(notified);
    ready.notify_one();
    info!("启动订阅回收，间隔 {period:?}");
    loop {
        tokio::select! {
            biased;
            _ = &mut notified => {
                info!("收到关闭信号，开始优雅退出");
                break;
            }
            now = interval.tick() => {
                let count = registry.sweep_expired(now).await;
                if count > 0 {
                    info!("回收 {count} 个过期订阅");
                } else {
                    debug!("没有过期订阅");
                }
            }
        }
    }
}
