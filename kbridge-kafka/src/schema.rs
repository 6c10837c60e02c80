//! # 模式注册编解码
//!
//! 兼容 Confluent 线格式：`0x00 | 模式 Id（u32 大端） | 消息体`。
//! AVRO 消息体按模式解码成 JSON 文本，JSON 模式的消息体原样透传。

use crate::avro::{avro_to_json, json_to_avro};
use ahash::AHashMap;
use apache_avro::{Schema, from_avro_datum, to_avro_datum};
use kbridge::{domain::SchemaCodec, errors::BridgeError};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::{sync::Arc, time::Duration};
use tokio::{sync::RwLock, time::Instant};
use tracing::{debug, info, instrument};
use validator::Validate;

const MAGIC_BYTE: u8 = 0;
const HEADER_LEN: usize = 5;
const MISS_TTL: Duration = Duration::from_secs(30);

/// 模式注册服务认证
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryAuth {
    /// 用户名
    pub username: String,
    /// 密码
    pub password: String,
}

/// 模式注册服务参数
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegistryOptions {
    /// 服务地址
    #[validate(length(min = 1))]
    pub url: String,
    /// 认证
    #[serde(default)]
    pub auth: Option<RegistryAuth>,
}

/// 编码模式参数
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EncodeSchemaOptions {
    /// 主题名
    #[validate(length(min = 1))]
    pub subject: String,
    /// 版本，缺省时取最新版本
    #[serde(default)]
    pub version: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchemaResponse {
    #[serde(default)]
    id: Option<u32>,
    schema: String,
    #[serde(default)]
    schema_type: Option<String>,
}

/// 已注册的模式
#[derive(Debug)]
pub enum RegisteredSchema {
    /// AVRO 模式
    Avro(Schema),
    /// JSON 模式
    Json,
}

impl RegisteredSchema {
    /// 按模式类型解析，类型缺省时为 AVRO
    pub fn parse(kind: Option<&str>, text: &str) -> Result<Self, BridgeError> {
        match kind.unwrap_or("AVRO") {
            "AVRO" => Schema::parse_str(text)
                .map(RegisteredSchema::Avro)
                .map_err(|e| BridgeError::Codec(format!("AVRO 模式解析失败：{e}"))),
            "JSON" => Ok(RegisteredSchema::Json),
            other => Err(BridgeError::Codec(format!("不支持的模式类型：{other}"))),
        }
    }

    fn decode(&self, mut body: &[u8]) -> Result<String, BridgeError> {
        match self {
            RegisteredSchema::Avro(schema) => {
                let value = from_avro_datum(schema, &mut body, None)
                    .map_err(|e| BridgeError::Codec(format!("AVRO 解码失败：{e}")))?;
                Ok(avro_to_json(&value).to_string())
            }
            RegisteredSchema::Json => {
                serde_json::from_slice::<serde_json::Value>(body)?;
                Ok(String::from_utf8_lossy(body).into_owned())
            }
        }
    }

    fn encode(&self, value: &serde_json::Value) -> Result<Vec<u8>, BridgeError> {
        match self {
            RegisteredSchema::Avro(schema) => {
                let avro = json_to_avro(value, schema)?;
                to_avro_datum(schema, avro)
                    .map_err(|e| BridgeError::Codec(format!("AVRO 编码失败：{e}")))
            }
            RegisteredSchema::Json => Ok(value.to_string().into_bytes()),
        }
    }
}

/// 拆分线格式，返回模式 Id 与消息体
pub(crate) fn split_wire(bytes: &[u8]) -> Option<(u32, &[u8])> {
    if bytes.len() < HEADER_LEN || bytes[0] != MAGIC_BYTE {
        return None;
    }
    let id = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
    Some((id, &bytes[HEADER_LEN..]))
}

/// 按线格式组装
pub(crate) fn frame(id: u32, body: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(HEADER_LEN + body.len());
    bytes.push(MAGIC_BYTE);
    bytes.extend_from_slice(&id.to_be_bytes());
    bytes.extend_from_slice(body);
    bytes
}

/// 模式注册客户端
#[derive(Default)]
pub struct SchemaRegistry {
    client: Client,
    endpoint: RwLock<Option<RegistryOptions>>,
    schemas: RwLock<AHashMap<u32, Arc<RegisteredSchema>>>,
    misses: RwLock<AHashMap<u32, Instant>>,
    encoder: RwLock<Option<(u32, Arc<RegisteredSchema>)>>,
}

impl SchemaRegistry {
    /// 构造未初始化的模式注册客户端，此时不解码也不编码
    pub fn new() -> Self {
        Self::default()
    }

    /// 初始化模式注册服务，清空已缓存的模式与编码模式
    #[instrument(name = "init_schema_registry", skip_all, fields(url = %options.url))]
    pub async fn init(&self, options: RegistryOptions) {
        *self.endpoint.write().await = Some(options);
        self.schemas.write().await.clear();
        self.misses.write().await.clear();
        *self.encoder.write().await = None;
        info!("模式注册服务已初始化");
    }

    /// 是否已初始化
    pub async fn is_initialized(&self) -> bool {
        self.endpoint.read().await.is_some()
    }

    /// 设置编码模式，返回模式 Id
    #[instrument(name = "set_encode_schema", skip(self))]
    pub async fn set_encode_schema(
        &self,
        options: &EncodeSchemaOptions,
    ) -> Result<u32, BridgeError> {
        let version = options
            .version
            .map_or_else(|| "latest".to_owned(), |v| v.to_string());
        let resp = self
            .get(&format!("subjects/{}/versions/{version}", options.subject))
            .await?;
        let id = resp
            .id
            .ok_or_else(|| BridgeError::Codec("模式注册服务未返回模式 Id".to_owned()))?;
        let schema = Arc::new(RegisteredSchema::parse(
            resp.schema_type.as_deref(),
            &resp.schema,
        )?);
        self.schemas.write().await.insert(id, Arc::clone(&schema));
        self.use_encoder(id, schema).await;
        info!("编码模式已设置为 {id}");
        Ok(id)
    }

    /// 预先登记模式，解码时不再访问模式注册服务
    pub async fn preload(&self, id: u32, schema: RegisteredSchema) {
        self.misses.write().await.remove(&id);
        self.schemas.write().await.insert(id, Arc::new(schema));
    }

    /// 模式近期是否获取失败
    pub(crate) async fn recently_missed(&self, id: u32) -> bool {
        self.misses
            .read()
            .await
            .get(&id)
            .is_some_and(|at| at.elapsed() < MISS_TTL)
    }

    pub(crate) async fn use_encoder(&self, id: u32, schema: Arc<RegisteredSchema>) {
        *self.encoder.write().await = Some((id, schema));
    }

    async fn schema(&self, id: u32) -> Result<Arc<RegisteredSchema>, BridgeError> {
        if let Some(schema) = self.schemas.read().await.get(&id) {
            return Ok(Arc::clone(schema));
        }
        if self.recently_missed(id).await {
            return Err(BridgeError::Codec(format!("模式 {id} 近期获取失败")));
        }
        match self.fetch_schema(id).await {
            Ok(schema) => {
                self.schemas.write().await.insert(id, Arc::clone(&schema));
                debug!("已缓存模式 {id}");
                Ok(schema)
            }
            Err(e) => {
                // 失败在 MISS_TTL 内不再重复请求
                self.misses.write().await.insert(id, Instant::now());
                Err(e)
            }
        }
    }

    async fn fetch_schema(&self, id: u32) -> Result<Arc<RegisteredSchema>, BridgeError> {
        let resp = self.get(&format!("schemas/ids/{id}")).await?;
        let schema = RegisteredSchema::parse(resp.schema_type.as_deref(), &resp.schema)?;
        Ok(Arc::new(schema))
    }

    async fn get(&self, path: &str) -> Result<SchemaResponse, BridgeError> {
        let request = self.request(path).await?;
        request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| BridgeError::Codec(format!("访问模式注册服务失败：{e}")))?
            .json::<SchemaResponse>()
            .await
            .map_err(|e| BridgeError::Codec(format!("模式注册服务响应无效：{e}")))
    }

    async fn request(&self, path: &str) -> Result<RequestBuilder, BridgeError> {
        let guard = self.endpoint.read().await;
        let options = guard
            .as_ref()
            .ok_or_else(|| BridgeError::Codec("模式注册服务未初始化".to_owned()))?;
        let url = format!("{}/{path}", options.url.trim_end_matches('/'));
        let mut request = self.client.get(url);
        if let Some(auth) = &options.auth {
            request = request.basic_auth(&auth.username, Some(&auth.password));
        }
        Ok(request)
    }
}

impl SchemaCodec for SchemaRegistry {
    async fn decode(&self, bytes: &[u8]) -> Option<String> {
        let (id, body) = split_wire(bytes)?;
        self.schema(id)
            .await
            .and_then(|schema| schema.decode(body))
            .inspect_err(|e| debug!("模式 {id} 解码未命中：{e}"))
            .ok()
    }

    async fn encode(&self, value: &serde_json::Value) -> Option<Vec<u8>> {
        let (id, schema) = self.encoder.read().await.clone()?;
        match schema.encode(value) {
            Ok(body) => Some(frame(id, &body)),
            Err(e) => {
                debug!("模式 {id} 编码失败：{e}");
                None
            }
        }
    }
}
