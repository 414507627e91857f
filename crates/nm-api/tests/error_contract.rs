use axum::{body::Body, http::Request, http::StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn proceed_pass_with_a_forged_token_is_uniformly_unauthorized() {
    let state = nm_api::test_state("session-secret", "link-secret");
    let app = nm_api::create_router(state);

    // A malformed token and a wrongly signed token must be told apart by
    // nobody outside the logs.
    for token in ["garbage", "a.b.c"] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/matches/proceed-pass")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({"token": token, "choice": "proceed"}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "unauthorized");
        assert_eq!(body["code"], "unauthorized");
    }
}

#[tokio::test]
async fn errors_echo_the_request_id() {
    let state = nm_api::test_state("session-secret", "link-secret");
    let app = nm_api::create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/matches/proceed-pass")
                .header("content-type", "application/json")
                .header("x-request-id", "req-test-1")
                .body(Body::from(
                    json!({"token": "garbage", "choice": "pass"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["request_id"], "req-test-1");
}

#[tokio::test]
async fn unknown_routes_are_404() {
    let state = nm_api::test_state("session-secret", "link-secret");
    let app = nm_api::create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
