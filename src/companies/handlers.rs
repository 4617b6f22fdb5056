use axum::{
    extract::State,
    routing::get,
    Router,
};
use std::sync::Arc;
use uuid::Uuid;

use super::service::CompaniesService;
use super::types::{CreateCompanyRequest, UpdateCompanyRequest};
use crate::core::session::RequestContext;
use crate::core::shared::action_result::ActionResult;
use crate::core::shared::extract::{ApiJson, ApiPath};
use crate::core::shared::models::Company;
use crate::core::shared::state::AppState;

pub fn configure_companies_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/companies",
            get(list_companies_handler).post(create_company_handler),
        )
        .route(
            "/api/companies/current",
            get(current_company_handler).put(update_current_company_handler),
        )
        .route(
            "/api/companies/:id",
            get(get_company_handler)
                .put(update_company_handler)
                .delete(delete_company_handler),
        )
}

pub async fn list_companies_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> ActionResult<Vec<Company>> {
    CompaniesService::from_state(&state).list_companies(&ctx).await
}

pub async fn create_company_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    ApiJson(request): ApiJson<CreateCompanyRequest>,
) -> ActionResult<Company> {
    CompaniesService::from_state(&state)
        .create_company(&ctx, request)
        .await
}

pub async fn current_company_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> ActionResult<Company> {
    CompaniesService::from_state(&state)
        .get_or_create_company_for_tenant(&ctx)
        .await
}

pub async fn update_current_company_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    ApiJson(request): ApiJson<UpdateCompanyRequest>,
) -> ActionResult<Company> {
    CompaniesService::from_state(&state)
        .update_active_company(&ctx, request)
        .await
}

pub async fn get_company_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    ApiPath(company_id): ApiPath<Uuid>,
) -> ActionResult<Company> {
    CompaniesService::from_state(&state)
        .get_company(&ctx, company_id)
        .await
}

pub async fn update_company_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    ApiPath(company_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateCompanyRequest>,
) -> ActionResult<Company> {
    CompaniesService::from_state(&state)
        .update_company(&ctx, company_id, request)
        .await
}

pub async fn delete_company_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    ApiPath(company_id): ApiPath<Uuid>,
) -> ActionResult<()> {
    CompaniesService::from_state(&state)
        .delete_company(&ctx, company_id)
        .await
}
