use super::*;

#[rstest]
#[tokio::test]
async fn registry_is_initialized(state: Arc<TestState>) {
    let (status, body) = call(
        &state,
        json_request(
            "POST",
            "/registry",
            json!({
                "url": "http://localhost:8081",
                "auth": { "username": "user", "password": "secret" }
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());
    assert!(state.codec.is_initialized().await);
}

#[rstest]
#[tokio::test]
async fn registry_needs_url(state: Arc<TestState>) {
    let (status, _) = call(&state, json_request("POST", "/registry", json!({ "url": "" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!state.codec.is_initialized().await);
}

#[rstest]
#[tokio::test]
async fn encode_schema_needs_registry(state: Arc<TestState>) {
    let (status, body) = call(
        &state,
        json_request("PUT", "/registry/encode", json!({ "subject": "orders-value" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"].is_string());
}
