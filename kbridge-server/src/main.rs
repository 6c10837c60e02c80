//! # **kbridge** HTTP 服务

mod config;
mod errors;
mod handlers;
mod request;
mod routes;


use crate::config::ServerConfig;
use kbridge::{
    Context, Registry,
    config::{CaptureConfig, build_config, load_section},
    domain::Broker,
    sink::StoreSink,
    sweeper,
};
use kbridge_kafka::{KafkaBroker, KafkaConfig, SchemaRegistry};
use std::{error::Error, path::PathBuf, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;
use tracing_appender::non_blocking;
use tracing_subscriber::{EnvFilter, fmt};

/// 请求处理共享状态
pub struct AppState<B: Broker> {
    pub registry: Arc<Registry<B, SchemaRegistry, StoreSink>>,
    pub codec: Arc<SchemaRegistry>,
    pub cfg: ServerConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let (non_blocking, _guard) = non_blocking(std::io::stdout());
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(non_blocking)
        .with_target(false)
        .init();

    let config = build_config(PathBuf::from(env!("CARGO_MANIFEST_DIR")))?;
    let capture: CaptureConfig = load_section(&config, "capture")?;
    let kafka = KafkaConfig::load(&config)?;
    let server = ServerConfig::load(&config)?;

    let codec = Arc::new(SchemaRegistry::new());
    let registry = Arc::new(Registry::new(
        KafkaBroker::new(kafka)?,
        Arc::clone(&codec),
        Arc::new(StoreSink::from_config(&capture)),
        &capture,
    ));

    let ctx = Context::with_signal();
    sweeper::launch(&ctx, Arc::clone(&registry), capture.sweep_interval()).await;

    let listener = TcpListener::bind(&server.addr).await?;
    info!("开始监听 {}", server.addr);
    let state = Arc::new(AppState {
        registry,
        codec,
        cfg: server,
    });
    let app = routes::routes().with_state(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { ctx.all_done().await })
        .await?;
    Ok(())
}
