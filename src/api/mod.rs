//! HTTP surface of the service.
//!
//! The courses and enrollment APIs are mounted as wildcards and resolved
//! through the ordered tables in [`routes`].

pub mod auth;
pub mod courses;
pub mod enrollment;
pub mod microsite;
pub mod orphans;
pub mod pagination;
pub mod routes;
pub mod system;

use crate::config::Config;
use crate::error::Result;
use crate::metrics::{self, ApiMetrics};
use crate::storage::Storage;
use crate::throttle::Throttle;
use axum::{
    http::{header::CONTENT_TYPE, Method, Request},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use hyper::Server;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub config: Arc<Config>,
    pub throttle: Throttle,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, config: Config) -> Result<Self> {
        let throttle = Throttle::new(config.enrollment_rate()?);
        Ok(Self {
            storage,
            config: Arc::new(config),
            throttle,
        })
    }
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "courseware_api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Prometheus text exposition of the in-process recorder
async fn metrics_text() -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render(),
    )
}

fn area_of(path: &str) -> &'static str {
    let rest = path.strip_prefix("/api/").unwrap_or("");
    match rest.split('/').next() {
        Some("courses") => "courses",
        Some("enrollment") => "enrollment",
        Some("orphans") => "orphans",
        Some("system") | Some("") if path.starts_with("/api") => "system",
        _ => "other",
    }
}

async fn track_requests<B>(request: Request<B>, next: Next<B>) -> Response {
    let area = area_of(request.uri().path());
    let started = Instant::now();
    let response = next.run(request).await;
    ApiMetrics::record_request(
        area,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}

/// Create the HTTP server with all routes
pub fn create_server(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);

    // everything here sits behind the server api key
    let courses_api = Router::new()
        .route("/api", get(system::api_root))
        .route("/api/", get(system::api_root))
        .route("/api/system", get(system::system_detail))
        .route("/api/system/", get(system::system_detail))
        .route("/api/courses", get(courses::list_courses))
        .route("/api/courses/*path", get(courses::dispatch))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    let enrollment_api = Router::new().route(
        "/api/enrollment/v0/*path",
        get(enrollment::dispatch)
            .post(enrollment::dispatch)
            .delete(enrollment::dispatch),
    );

    let maintenance_api = Router::new().route(
        "/api/orphans/*course_id",
        get(orphans::orphan_handler).delete(orphans::orphan_handler),
    );

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_text))
        .merge(courses_api)
        .merge(enrollment_api)
        .merge(maintenance_api)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            microsite::bind_microsite,
        ))
        .layer(middleware::from_fn(track_requests))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Start the HTTP server on the specified port
pub async fn start_server(state: AppState, port: u16) -> anyhow::Result<()> {
    metrics::init_metrics();
    let app = create_server(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("HTTP server running on http://localhost:{port}");
    info!("Health check: http://localhost:{port}/health");
    info!("Courses API:  http://localhost:{port}/api/courses");

    Server::bind(&addr)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::area_of;

    #[test]
    fn test_request_areas() {
        assert_eq!(area_of("/api/courses/course-v1:a+b+c"), "courses");
        assert_eq!(area_of("/api/enrollment/v0/user"), "enrollment");
        assert_eq!(area_of("/api/orphans/course-v1:a+b+c"), "orphans");
        assert_eq!(area_of("/api/system"), "system");
        assert_eq!(area_of("/api"), "system");
        assert_eq!(area_of("/health"), "other");
    }
}
