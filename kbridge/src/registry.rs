//! # 订阅注册表
//!
//! 记录所有存活的订阅，负责创建消费会话与回收资源。

use crate::{
    capture,
    config::CaptureConfig,
    decode::DecodePipeline,
    domain::{Broker, CaptureSink, ConnectOptions, ConsumerSession, SchemaCodec},
    errors::BridgeError,
};
use ahash::AHashMap;
use std::{
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};
use tokio::{sync::Notify, time::Instant};
use tracing::{Span, debug, field::display, info, instrument, warn};
use uuid::Uuid;

/// 订阅
#[derive(Debug)]
pub struct Subscription {
    id: Uuid,
    topic: String,
    created_at: Instant,
}

impl Subscription {
    /// 订阅 Id，同时作为消费组
    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 订阅的主题
    #[inline]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// 创建时间
    #[inline]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// 截至 `now` 的存活时长
    #[inline]
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }
}

struct Entry<C> {
    subscription: Arc<Subscription>,
    consumer: Arc<C>,
    stop: Arc<Notify>,
}

/// 订阅注册表
pub struct Registry<B, K, S>
where
    B: Broker,
    K: SchemaCodec,
    S: CaptureSink,
{
    broker: B,
    pipeline: DecodePipeline<K>,
    pub(crate) sink: Arc<S>,
    lifetime: Duration,
    entries: RwLock<AHashMap<Uuid, Entry<B::Consumer>>>,
}

impl<B, K, S> Registry<B, K, S>
where
    B: Broker,
    K: SchemaCodec,
    S: CaptureSink,
{
    /// 构造注册表
    pub fn new(broker: B, codec: Arc<K>, sink: Arc<S>, cfg: &CaptureConfig) -> Self {
        Self {
            broker,
            pipeline: DecodePipeline::new(codec),
            sink,
            lifetime: cfg.lifetime(),
            entries: RwLock::new(AHashMap::new()),
        }
    }

    /// 消息代理
    pub fn broker(&self) -> &B {
        &self.broker
    }

    /// 订阅最长存活时间
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// 以默认连接参数创建订阅
    pub async fn create(&self, topic: &str) -> Result<Uuid, BridgeError> {
        self.create_with(topic, &ConnectOptions::default()).await
    }

    /// 创建订阅并启动捕获会话，不等待任何消息到达
    #[instrument(name = "create_subscription", skip(self, options), fields(id))]
    pub async fn create_with(
        &self,
        topic: &str,
        options: &ConnectOptions,
    ) -> Result<Uuid, BridgeError> {
        let id = self.fresh_id();
        Span::current().record("id", display(id));

        let consumer = Arc::new(self.broker.connect(&id.to_string(), options).await?);
        let opened = match consumer.subscribe(topic) {
            Ok(()) => self.sink.open(id).await,
            Err(e) => Err(e),
        };
        if let Err(e) = opened {
            if let Err(e) = consumer.disconnect() {
                warn!("断开消费会话失败：{e}");
            }
            return Err(e);
        }
        info!("成功订阅 {topic}");

        let subscription = Arc::new(Subscription {
            id,
            topic: topic.to_owned(),
            created_at: Instant::now(),
        });
        let stop = Arc::new(Notify::new());
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                id,
                Entry {
                    subscription: Arc::clone(&subscription),
                    consumer: Arc::clone(&consumer),
                    stop: Arc::clone(&stop),
                },
            );

        tokio::spawn(capture::run(
            subscription,
            consumer,
            self.pipeline.clone(),
            Arc::clone(&self.sink),
            stop,
        ));
        Ok(id)
    }

    fn fresh_id(&self) -> Uuid {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        loop {
            let id = Uuid::new_v4();
            if !entries.contains_key(&id) {
                return id;
            }
        }
    }

    /// 查询订阅，不存在或已回收时返回 `None`
    pub fn get(&self, id: Uuid) -> Option<Arc<Subscription>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .map(|e| Arc::clone(&e.subscription))
    }

    /// 订阅是否存活
    pub fn contains(&self, id: Uuid) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    /// 当前订阅 Id 的快照
    pub fn list_ids(&self) -> Vec<Uuid> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    /// 存活订阅数
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// 是否没有存活订阅
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 回收订阅，订阅不存在时什么也不做
    ///
    /// 断开消费会话失败时仍然删除注册项。
    #[instrument(name = "remove_subscription", skip(self))]
    pub async fn remove(&self, id: Uuid) -> bool {
        let entry = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        let Some(entry) = entry else {
            debug!("订阅不存在，无需回收");
            return false;
        };

        entry.stop.notify_one();
        if let Err(e) = entry.consumer.disconnect() {
            warn!("断开消费会话失败：{e}");
        }
        self.sink.release(id).await;
        info!("已回收订阅 {}", entry.subscription.topic());
        true
    }

    /// 回收存活时间达到上限的订阅，返回回收数量
    pub async fn sweep_expired(&self, now: Instant) -> usize {
        let mut count = 0;
        for id in self.list_ids() {
            let expired = self
                .get(id)
                .is_some_and(|sub| sub.age(now) >= self.lifetime);
            if expired && self.remove(id).await {
                count += 1;
            }
        }
        count
    }
}
