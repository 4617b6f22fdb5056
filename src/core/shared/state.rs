use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use std::convert::Infallible;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::core::session::{RequestContext, SessionOracle};
use crate::core::store::Store;

/// Shared handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn Store>,
    pub oracle: Arc<dyn SessionOracle>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>, oracle: Arc<dyn SessionOracle>) -> Self {
        Self {
            config,
            store,
            oracle,
        }
    }

    /// Reads the raw credentials using the configured header prefix and cookie name.
    pub fn request_context(&self, headers: &HeaderMap) -> RequestContext {
        let auth = &self.config.auth;
        RequestContext::from_headers_with(headers, &auth.bearer_prefix, &auth.session_cookie)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("server", &self.config.server)
            .finish_non_exhaustive()
    }
}

/// Missing credentials are not a rejection; the services fail closed instead.
#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(state.request_context(&parts.headers))
    }
}
