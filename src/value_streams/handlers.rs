use axum::{
    extract::State,
    routing::get,
    Router,
};
use std::sync::Arc;
use uuid::Uuid;

use super::service::ValueStreamsService;
use super::types::{CreateValueStreamRequest, UpdateValueStreamRequest};
use crate::core::session::RequestContext;
use crate::core::shared::action_result::ActionResult;
use crate::core::shared::extract::{ApiJson, ApiPath};
use crate::core::shared::models::ValueStream;
use crate::core::shared::state::AppState;

/// Nested under `/api/sites/:id`, so the site parameter shares that route's name.
pub fn configure_value_streams_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/sites/:id/value-streams",
            get(list_value_streams_handler).post(create_value_stream_handler),
        )
        .route(
            "/api/value-streams/:id",
            get(get_value_stream_handler)
                .put(update_value_stream_handler)
                .delete(delete_value_stream_handler),
        )
}

pub async fn list_value_streams_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    ApiPath(site_id): ApiPath<Uuid>,
) -> ActionResult<Vec<ValueStream>> {
    ValueStreamsService::from_state(&state)
        .list_value_streams(&ctx, site_id)
        .await
}

pub async fn create_value_stream_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    ApiPath(site_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<CreateValueStreamRequest>,
) -> ActionResult<ValueStream> {
    ValueStreamsService::from_state(&state)
        .create_value_stream(&ctx, site_id, request)
        .await
}

pub async fn get_value_stream_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    ApiPath(value_stream_id): ApiPath<Uuid>,
) -> ActionResult<ValueStream> {
    ValueStreamsService::from_state(&state)
        .get_value_stream(&ctx, value_stream_id)
        .await
}

pub async fn update_value_stream_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    ApiPath(value_stream_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateValueStreamRequest>,
) -> ActionResult<ValueStream> {
    ValueStreamsService::from_state(&state)
        .update_value_stream(&ctx, value_stream_id, request)
        .await
}

pub async fn delete_value_stream_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    ApiPath(value_stream_id): ApiPath<Uuid>,
) -> ActionResult<()> {
    ValueStreamsService::from_state(&state)
        .delete_value_stream(&ctx, value_stream_id)
        .await
}
