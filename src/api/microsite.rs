use super::AppState;
use crate::config::MicrositeConfig;
use axum::{
    extract::State,
    http::{header::HOST, Request},
    middleware::Next,
    response::Response,
};
use tracing::debug;

/// Microsite selected for the current request, if the host matched one
#[derive(Debug, Clone, Default)]
pub struct CurrentMicrosite(pub Option<MicrositeConfig>);

impl CurrentMicrosite {
    /// Org the course listing is restricted to
    pub fn org_filter(&self) -> Option<&str> {
        self.0.as_ref()?.course_org_filter.as_deref()
    }
}

/// Binds the microsite matching the `Host` header to the request
pub async fn bind_microsite<B>(
    State(state): State<AppState>,
    mut request: Request<B>,
    next: Next<B>,
) -> Response {
    let site = request
        .headers()
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .and_then(|host| state.config.microsite_for_host(host))
        .cloned();
    if let Some(site) = &site {
        debug!(microsite = %site.key, "Request bound to microsite");
    }
    request.extensions_mut().insert(CurrentMicrosite(site));
    next.run(request).await
}
