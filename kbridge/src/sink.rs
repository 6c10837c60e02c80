//! # 捕获消息存储

use crate::{
    config::{CaptureConfig, StoreKind},
    domain::CaptureSink,
    errors::BridgeError,
    message::CapturedMessage,
};
use ahash::AHashMap;
use std::path::{Path, PathBuf};
use tokio::{fs, io::AsyncWriteExt, sync::RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

/// 内存缓存
#[derive(Default)]
pub struct MemorySink {
    buffers: RwLock<AHashMap<Uuid, Vec<CapturedMessage>>>,
}

impl MemorySink {
    /// 构造内存缓存
    pub fn new() -> Self {
        Self::default()
    }
}

impl CaptureSink for MemorySink {
    async fn open(&self, id: Uuid) -> Result<(), BridgeError> {
        self.buffers.write().await.entry(id).or_default();
        Ok(())
    }

    async fn append(&self, id: Uuid, msg: &CapturedMessage) -> Result<(), BridgeError> {
        match self.buffers.write().await.get_mut(&id) {
            Some(buf) => {
                buf.push(msg.clone());
                Ok(())
            }
            None => Err(BridgeError::NotFound(id)),
        }
    }

    async fn read(&self, id: Uuid) -> Result<Vec<CapturedMessage>, BridgeError> {
        self.buffers
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(BridgeError::NotFound(id))
    }

    async fn release(&self, id: Uuid) {
        self.buffers.write().await.remove(&id);
    }
}

/// 文件持久化存储，每个订阅一个 JSON 行文件
pub struct FileSink {
    root: PathBuf,
}

impl FileSink {
    /// 构造文件存储
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 订阅对应的存储文件
    pub fn path(&self, id: Uuid) -> PathBuf {
        self.root.join(format!("messages-{id}.jsonl"))
    }

    /// 存储根目录
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl CaptureSink for FileSink {
    async fn open(&self, id: Uuid) -> Result<(), BridgeError> {
        fs::create_dir_all(&self.root).await?;
        fs::File::create(self.path(id)).await?;
        debug!("创建订阅 {id} 的存储文件");
        Ok(())
    }

    async fn append(&self, id: Uuid, msg: &CapturedMessage) -> Result<(), BridgeError> {
        let mut line = serde_json::to_vec(msg)?;
        line.push(b'\n');
        let mut file = match fs::OpenOptions::new().append(true).open(self.path(id)).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BridgeError::NotFound(id));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }

    async fn read(&self, id: Uuid) -> Result<Vec<CapturedMessage>, BridgeError> {
        let content = match fs::read_to_string(self.path(id)).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BridgeError::NotFound(id));
            }
            Err(e) => return Err(e.into()),
        };
        let mut msgs = Vec::new();
        for line in content.lines().filter(|l| !l.is_empty()) {
            match serde_json::from_str(line) {
                Ok(msg) => msgs.push(msg),
                // 末行可能正在写入
                Err(e) => debug!("跳过订阅 {id} 无法解析的存储行：{e}"),
            }
        }
        Ok(msgs)
    }

    async fn release(&self, id: Uuid) {
        if let Err(e) = fs::remove_file(self.path(id)).await {
            warn!("删除订阅 {id} 的存储文件失败：{e}");
        }
    }
}

/// 按配置选择的存储
pub enum StoreSink {
    /// 内存缓存
    Memory(MemorySink),
    /// 文件持久化
    File(FileSink),
}

impl StoreSink {
    /// 按配置构造存储
    pub fn from_config(cfg: &CaptureConfig) -> Self {
        match cfg.store {
            StoreKind::Memory => StoreSink::Memory(MemorySink::new()),
            StoreKind::File => StoreSink::File(FileSink::new(&cfg.dir)),
        }
    }
}

impl CaptureSink for StoreSink {
    async fn open(&self, id: Uuid) -> Result<(), BridgeError> {
        match self {
            StoreSink::Memory(s) => s.open(id).await,
            StoreSink::File(s) => s.open(id).await,
        }
    }

    async fn append(&self, id: Uuid, msg: &CapturedMessage) -> Result<(), BridgeError> {
        match self {
            StoreSink::Memory(s) => s.append(id, msg).await,
            StoreSink::File(s) => s.append(id, msg).await,
        }
    }

    async fn read(&self, id: Uuid) -> Result<Vec<CapturedMessage>, BridgeError> {
        match self {
            StoreSink::Memory(s) => s.read(id).await,
            StoreSink::File(s) => s.read(id).await,
        }
    }

    async fn release(&self, id: Uuid) {
        match self {
            StoreSink::Memory(s) => s.release(id).await,
            StoreSink::File(s) => s.release(id).await,
        }
    }
}
