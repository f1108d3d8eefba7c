// rest/mod.rs — Public REST API server.
//
// Axum HTTP server bridging REST calls to the habit and log services.
//
// Endpoints (under /api/v1, X-API-Key guarded when a key is configured):
//   GET    /health
//   GET    /habits                         (paginated; ?frequency= filter)
//   POST   /habits
//   GET    /habits/today                   (?date= override)
//   GET    /habits/{id}
//   PATCH  /habits/{id}
//   DELETE /habits/{id}
//   GET    /habits/{id}/history
//   GET    /habits/{id}/logs
//   POST   /habits/{id}/logs
//   PUT    /habits/{id}/logs               (upsert by date)
//   POST   /habits/{id}/logs/increment
//   PATCH  /habits/{id}/logs/{log_id}
//   DELETE /habits/{id}/logs/{log_id}

pub mod auth;
pub mod routes;

use anyhow::Result;
use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::AppContext;

pub async fn start_rest_server(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    info!("REST API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    let habits = Router::new()
        .route(
            "/api/v1/habits",
            get(routes::habits::list).post(routes::habits::create),
        )
        .route("/api/v1/habits/today", get(routes::habits::today))
        .route(
            "/api/v1/habits/{id}",
            get(routes::habits::get_one)
                .patch(routes::habits::update)
                .delete(routes::habits::remove),
        )
        .route("/api/v1/habits/{id}/history", get(routes::habits::history))
        .route(
            "/api/v1/habits/{id}/logs",
            get(routes::logs::list)
                .post(routes::logs::create)
                .put(routes::logs::upsert),
        )
        .route(
            "/api/v1/habits/{id}/logs/increment",
            post(routes::logs::increment),
        )
        .route(
            "/api/v1/habits/{id}/logs/{log_id}",
            patch(routes::logs::update).delete(routes::logs::remove),
        )
        .route_layer(middleware::from_fn_with_state(
            ctx.clone(),
            auth::require_api_key,
        ));

    Router::new()
        // Health (no auth)
        .route("/api/v1/health", get(routes::health::health))
        .merge(habits)
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}
