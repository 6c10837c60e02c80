use crate::{
    domain::{Broker, ConnectOptions, ConsumerSession, Delivery, OutgoingRecord, RawRecord},
    errors::{BridgeError, RecvError},
};
use ahash::AHashMap;
use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use tokio::sync::Notify;

enum LogEntry {
    Record(RawRecord),
    Transient(String),
    Fatal(String),
}

#[derive(Default)]
struct Shared {
    topics: Mutex<AHashMap<String, Vec<LogEntry>>>,
    notify: Notify,
}

impl Shared {
    fn entry(&self, topic: &str, index: usize) -> Option<Result<RawRecord, RecvError>> {
        let topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
        match topics.get(topic)?.get(index)? {
            LogEntry::Record(r) => Some(Ok(r.clone())),
            LogEntry::Transient(reason) => Some(Err(RecvError::Transient(reason.clone()))),
            LogEntry::Fatal(reason) => Some(Err(RecvError::Fatal(reason.clone()))),
        }
    }
}

/// 内存消息代理，每个主题是一个只追加的日志，消费会话总是从头读取
#[derive(Default)]
pub struct MemoryBroker {
    shared: Arc<Shared>,
    groups: Mutex<Vec<String>>,
    refuse_connect: AtomicBool,
    refuse_disconnect: Arc<AtomicBool>,
    disconnects: Arc<AtomicUsize>,
}

impl MemoryBroker {
    /// 构造内存消息代理
    pub fn new() -> Self {
        Self::default()
    }

    /// 向主题追加消息，返回偏移
    pub fn publish(&self, topic: &str, mut record: RawRecord) -> i64 {
        let offset = {
            let mut topics = self
                .shared
                .topics
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let log = topics.entry(topic.to_owned()).or_default();
            record.topic = topic.to_owned();
            record.offset = log.len() as i64;
            let offset = record.offset;
            log.push(LogEntry::Record(record));
            offset
        };
        self.shared.notify.notify_waiters();
        offset
    }

    /// 在主题日志中放入一个可恢复的错误
    pub fn glitch(&self, topic: &str, reason: &str) {
        self.shared
            .topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(topic.to_owned())
            .or_default()
            .push(LogEntry::Transient(reason.to_owned()));
        self.shared.notify.notify_waiters();
    }

    /// 在主题日志中放入一个不可恢复的错误
    pub fn fail(&self, topic: &str, reason: &str) {
        self.shared
            .topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(topic.to_owned())
            .or_default()
            .push(LogEntry::Fatal(reason.to_owned()));
        self.shared.notify.notify_waiters();
    }

    /// 之后的连接请求均失败
    pub fn refuse_connect(&self) {
        self.refuse_connect.store(true, Ordering::SeqCst);
    }

    /// 之后的断开请求均失败
    pub fn refuse_disconnect(&self) {
        self.refuse_disconnect.store(true, Ordering::SeqCst);
    }

    /// 已建立会话的消费组
    pub fn groups(&self) -> Vec<String> {
        self.groups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 断开请求次数
    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

impl Broker for MemoryBroker {
    type Consumer = MemoryConsumer;

    async fn connect(
        &self,
        group: &str,
        _options: &ConnectOptions,
    ) -> Result<MemoryConsumer, BridgeError> {
        if self.refuse_connect.load(Ordering::SeqCst) {
            return Err(BridgeError::Connect("代理拒绝连接".to_owned()));
        }
        self.groups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(group.to_owned());
        Ok(MemoryConsumer {
            shared: Arc::clone(&self.shared),
            topic: Mutex::new(None),
            cursor: AtomicUsize::new(0),
            disconnected: AtomicBool::new(false),
            refuse_disconnect: Arc::clone(&self.refuse_disconnect),
            disconnects: Arc::clone(&self.disconnects),
        })
    }

    async fn produce(
        &self,
        topic: &str,
        record: OutgoingRecord,
        _options: &ConnectOptions,
    ) -> Result<Delivery, BridgeError> {
        let raw = RawRecord {
            key: record.key.map(String::into_bytes),
            payload: Some(record.payload),
            headers: record
                .headers
                .into_iter()
                .map(|(k, v)| (k, Some(v.into_bytes())))
                .collect(),
            ..Default::default()
        };
        let offset = self.publish(topic, raw);
        Ok(Delivery {
            topic_name: topic.to_owned(),
            partition: 0,
            offset,
        })
    }
}

/// 内存消费会话
pub struct MemoryConsumer {
    shared: Arc<Shared>,
    topic: Mutex<Option<String>>,
    cursor: AtomicUsize,
    disconnected: AtomicBool,
    refuse_disconnect: Arc<AtomicBool>,
    disconnects: Arc<AtomicUsize>,
}

impl MemoryConsumer {
    fn next(&self) -> Option<Result<RawRecord, RecvError>> {
        let topic = self
            .topic
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()?;
        let index = self.cursor.load(Ordering::SeqCst);
        let entry = self.shared.entry(&topic, index)?;
        self.cursor.store(index + 1, Ordering::SeqCst);
        Some(entry)
    }
}

impl ConsumerSession for MemoryConsumer {
    fn subscribe(&self, topic: &str) -> Result<(), BridgeError> {
        *self.topic.lock().unwrap_or_else(PoisonError::into_inner) = Some(topic.to_owned());
        self.cursor.store(0, Ordering::SeqCst);
        Ok(())
    }

    async fn recv(&self) -> Result<RawRecord, RecvError> {
        loop {
            let notified = self.shared.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.disconnected.load(Ordering::SeqCst) {
                return Err(RecvError::Fatal("会话已断开".to_owned()));
            }
            if let Some(entry) = self.next() {
                return entry;
            }
            notified.await;
        }
    }

    fn disconnect(&self) -> Result<(), BridgeError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.disconnected.store(true, Ordering::SeqCst);
        self.shared.notify.notify_waiters();
        if self.refuse_disconnect.load(Ordering::SeqCst) {
            return Err(BridgeError::Broker("断开会话失败".to_owned()));
        }
        Ok(())
    }
}
