use crate::{AppState, handlers::*};
use axum::{
    Router,
    routing::{get, post, put},
};
use kbridge::domain::Broker;
use std::sync::Arc;

pub fn routes<B: Broker>() -> Router<Arc<AppState<B>>> {
    Router::new()
        .route("/", get(hello))
        .route("/subscribe", post(subscribe::<B>))
        .route("/consume/{id}", get(consume::<B>))
        .route("/produce", post(produce::<B>))
        .merge(registry_routes())
}

fn registry_routes<B: Broker>() -> Router<Arc<AppState<B>>> {
    Router::new()
        .route("/registry", post(init_registry::<B>))
        .route("/registry/encode", put(encode_schema::<B>))
}
