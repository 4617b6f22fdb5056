use axum::{
    extract::State,
    routing::get,
    Router,
};
use std::sync::Arc;
use uuid::Uuid;

use super::service::SitesService;
use super::types::{CreateSiteRequest, UpdateSiteRequest};
use crate::core::session::RequestContext;
use crate::core::shared::action_result::ActionResult;
use crate::core::shared::extract::{ApiJson, ApiPath};
use crate::core::shared::models::Site;
use crate::core::shared::state::AppState;

pub fn configure_sites_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/sites", get(list_sites_handler).post(create_site_handler))
        .route(
            "/api/sites/:id",
            get(get_site_handler)
                .put(update_site_handler)
                .delete(delete_site_handler),
        )
}

pub async fn list_sites_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> ActionResult<Vec<Site>> {
    SitesService::from_state(&state).list_sites(&ctx).await
}

pub async fn create_site_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    ApiJson(request): ApiJson<CreateSiteRequest>,
) -> ActionResult<Site> {
    SitesService::from_state(&state).create_site(&ctx, request).await
}

pub async fn get_site_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    ApiPath(site_id): ApiPath<Uuid>,
) -> ActionResult<Site> {
    SitesService::from_state(&state).get_site(&ctx, site_id).await
}

pub async fn update_site_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    ApiPath(site_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateSiteRequest>,
) -> ActionResult<Site> {
    SitesService::from_state(&state)
        .update_site(&ctx, site_id, request)
        .await
}

pub async fn delete_site_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    ApiPath(site_id): ApiPath<Uuid>,
) -> ActionResult<()> {
    SitesService::from_state(&state).delete_site(&ctx, site_id).await
}
