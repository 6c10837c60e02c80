use crate::{AppState, errors::ApiError, request::Valid};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use kbridge::{
    CapturedMessage,
    domain::{Broker, ConnectOptions, OutgoingRecord, SchemaCodec},
    errors::BridgeError,
};
use kbridge_kafka::schema::{EncodeSchemaOptions, RegistryOptions};
use regex::Regex;
use serde::Deserialize;
use serde_json::{Value, json};
use std::{collections::BTreeMap, sync::Arc};
use tokio::time::{Instant, sleep};
use tracing::{debug, instrument};
use uuid::Uuid;
use validator::Validate;

const TRUE_VALUES: [&str; 2] = ["true", "1"];

#[derive(Debug, Deserialize, Validate)]
pub struct SubscribeRequest {
    #[validate(length(min = 1))]
    pub topic: String,
    #[serde(flatten)]
    pub options: ConnectOptions,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ConsumeQuery {
    /// 按消息值匹配的正则表达式
    pub filter: Option<String>,
    /// 需要的消息条数
    #[validate(range(min = 1))]
    pub multiple: Option<usize>,
    /// 是否按原始文本返回消息值
    pub text: Option<String>,
    /// 超时（毫秒）
    pub timeout: Option<u64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProduceRequest {
    #[validate(length(min = 1))]
    pub topic: String,
    pub message: Value,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// 是否使用编码模式
    #[serde(default)]
    pub encode: bool,
    #[serde(flatten)]
    pub options: ConnectOptions,
}

pub async fn hello() -> Json<Value> {
    Json(json!({ "hello": "From kbridge" }))
}

#[instrument(skip_all, fields(topic = %req.topic))]
pub async fn subscribe<B: Broker>(
    State(state): State<Arc<AppState<B>>>,
    Valid(req): Valid<SubscribeRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = state.registry.create_with(&req.topic, &req.options).await?;
    Ok(Json(json!({ "id": id })))
}

/// 轮询已捕获的消息，直到匹配的消息足够或超时
#[instrument(skip(state, query))]
pub async fn consume<B: Broker>(
    State(state): State<Arc<AppState<B>>>,
    Path(id): Path<Uuid>,
    Query(query): Query<ConsumeQuery>,
) -> Result<Json<Value>, ApiError> {
    if !state.registry.contains(id) {
        return Err(BridgeError::NotFound(id).into());
    }
    query
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    let filter = query
        .filter
        .as_deref()
        .map(Regex::new)
        .transpose()
        .map_err(|e| ApiError::Validation(format!("无效的过滤表达式：{e}")))?;
    let multiple = query.multiple.unwrap_or(1);
    let timeout = query
        .timeout
        .map_or_else(|| state.cfg.consume_timeout(), std::time::Duration::from_millis);
    let deadline = Instant::now() + timeout;

    let matched = loop {
        let mut matched: Vec<CapturedMessage> = state
            .registry
            .fetch(id)
            .await?
            .into_iter()
            .filter(|m| filter.as_ref().is_none_or(|re| re.is_match(&m.value)))
            .collect();
        let now = Instant::now();
        if matched.len() >= multiple || now >= deadline {
            let skip = matched.len().saturating_sub(multiple);
            break matched.split_off(skip);
        }
        sleep(state.cfg.poll().min(deadline - now)).await;
    };
    debug!("读取到 {} 条消息", matched.len());

    let text = query
        .text
        .as_deref()
        .is_some_and(|t| TRUE_VALUES.contains(&t));
    let messages = matched
        .iter()
        .map(|m| render(m, text))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(json!({ "messages": messages })))
}

fn render(msg: &CapturedMessage, text: bool) -> Result<Value, ApiError> {
    let mut value = serde_json::to_value(msg).map_err(BridgeError::from)?;
    if !text {
        if let Ok(parsed) = serde_json::from_str::<Value>(&msg.value) {
            value["value"] = parsed;
        }
    }
    Ok(value)
}

#[instrument(skip_all, fields(topic = %req.topic))]
pub async fn produce<B: Broker>(
    State(state): State<Arc<AppState<B>>>,
    Valid(req): Valid<ProduceRequest>,
) -> Result<Json<Value>, ApiError> {
    let encoded = if req.encode {
        state.codec.encode(&req.message).await
    } else {
        None
    };
    let payload = encoded.unwrap_or_else(|| match &req.message {
        Value::String(s) => s.clone().into_bytes(),
        other => other.to_string().into_bytes(),
    });
    let record = OutgoingRecord {
        key: req.key,
        payload,
        headers: req.headers.into_iter().collect(),
    };
    let delivery = state
        .registry
        .broker()
        .produce(&req.topic, record, &req.options)
        .await?;
    Ok(Json(json!(delivery)))
}

pub async fn init_registry<B: Broker>(
    State(state): State<Arc<AppState<B>>>,
    Valid(options): Valid<RegistryOptions>,
) -> Json<Value> {
    state.codec.init(options).await;
    Json(json!({ "message": "模式注册服务初始化成功" }))
}

pub async fn encode_schema<B: Broker>(
    State(state): State<Arc<AppState<B>>>,
    Valid(options): Valid<EncodeSchemaOptions>,
) -> Result<Json<Value>, ApiError> {
    let id = state.codec.set_encode_schema(&options).await?;
    Ok(Json(json!({ "message": "编码模式设置成功", "id": id })))
}
