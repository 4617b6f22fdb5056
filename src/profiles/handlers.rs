use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use uuid::Uuid;

use super::service::ProfilesService;
use super::types::{AssociationRequest, UpdateProfileRequest};
use crate::core::session::RequestContext;
use crate::core::shared::action_result::ActionResult;
use crate::core::shared::extract::{ApiJson, ApiPath};
use crate::core::shared::models::Profile;
use crate::core::shared::state::AppState;

pub fn configure_profiles_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/profile",
            get(get_own_profile_handler).put(update_profile_handler),
        )
        .route("/api/profiles/:user_id", get(get_profile_handler))
        .route(
            "/api/profiles/:user_id/company/:company_id",
            post(associate_user_handler),
        )
}

pub async fn get_own_profile_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> ActionResult<Profile> {
    ProfilesService::from_state(&state)
        .get_or_create_profile(&ctx)
        .await
}

pub async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> ActionResult<Profile> {
    ProfilesService::from_state(&state)
        .update_profile(&ctx, request)
        .await
}

pub async fn get_profile_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    ApiPath(user_id): ApiPath<String>,
) -> ActionResult<Profile> {
    ProfilesService::from_state(&state)
        .get_profile(&ctx, &user_id)
        .await
}

/// Body is optional; an empty request associates the user as an operator.
pub async fn associate_user_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    ApiPath((user_id, company_id)): ApiPath<(String, Uuid)>,
    request: Option<ApiJson<AssociationRequest>>,
) -> ActionResult<Profile> {
    let request = request.map(|ApiJson(r)| r).unwrap_or_default();
    ProfilesService::from_state(&state)
        .associate_user_with_company(&ctx, &user_id, company_id, request)
        .await
}
