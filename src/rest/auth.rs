//! X-API-Key guard for the habit routes.
//!
//! When no key is configured the guard is a pass-through; `/health` is
//! mounted outside the guarded router and stays open either way.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::AppContext;

pub async fn require_api_key(
    State(ctx): State<Arc<AppContext>>,
    req: Request,
    next: Next,
) -> Response {
    if let Some(expected) = &ctx.config.api_key {
        let provided = req
            .headers()
            .get("x-api-key")
            .and_then(|v| v.to_str().ok());
        if provided != Some(expected.as_str()) {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid or missing API key" })),
            )
                .into_response();
        }
    }
    next.run(req).await
}
