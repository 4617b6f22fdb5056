//! Path and body extractors whose rejections use the action envelope.
//!
//! A request that fails to parse is still answered as `Unauthenticated` when no
//! caller can be resolved, so anonymous requests never learn anything about
//! input validation.

use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use super::action_result::{ActionResult, FailureKind};
use super::state::AppState;
use crate::core::session::RequestContext;

/// Drop-in for [`Json`].
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

/// Drop-in for [`Path`].
#[derive(Debug, Clone)]
pub struct ApiPath<T>(pub T);

async fn reject(state: &AppState, ctx: &RequestContext, detail: String) -> ActionResult<()> {
    match state.oracle.resolve_caller(ctx).await {
        None => ActionResult::failure(
            FailureKind::Unauthenticated,
            "You must be logged in to perform this action",
        ),
        Some(_) => ActionResult::failure(FailureKind::Invalid, detail),
    }
}

#[axum::async_trait]
impl<T> FromRequest<Arc<AppState>> for ApiJson<T>
where
    T: DeserializeOwned + Send,
{
    type Rejection = ActionResult<()>;

    async fn from_request(req: Request, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let ctx = state.request_context(req.headers());
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(reject(state, &ctx, rejection.body_text()).await),
        }
    }
}

#[axum::async_trait]
impl<T> FromRequestParts<Arc<AppState>> for ApiPath<T>
where
    T: DeserializeOwned + Send,
{
    type Rejection = ActionResult<()>;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => {
                let ctx = state.request_context(&parts.headers);
                Err(reject(state, &ctx, rejection.body_text()).await)
            }
        }
    }
}
