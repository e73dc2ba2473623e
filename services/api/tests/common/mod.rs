use api_lib::{
    adapters::InMemoryAuthAdapter,
    ai_context::AiContext,
    config::Config,
    web::{api_router, state::AppState},
};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use std::sync::Arc;
use tower::ServiceExt;

pub fn app_with(ai: AiContext) -> Router {
    let config = Config::from_lookup(|_| None).unwrap();
    let state = Arc::new(AppState {
        config: Arc::new(config),
        auth: Arc::new(InMemoryAuthAdapter::new(chrono::Duration::days(30))),
        ai: Arc::new(ai),
    });
    api_router(state)
}

/// Signs in and returns the `name=value` part of the session cookie.
pub async fn sign_in(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::post("/auth/sign-in")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cookie.contains("HttpOnly"));
    cookie.split(';').next().unwrap().to_string()
}
