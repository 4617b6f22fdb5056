use axum::{
    extract::State,
    routing::get,
    Router,
};
use std::sync::Arc;
use uuid::Uuid;

use super::service::ContactsService;
use super::types::{CreateContactRequest, UpdateContactRequest};
use crate::core::session::RequestContext;
use crate::core::shared::action_result::ActionResult;
use crate::core::shared::extract::{ApiJson, ApiPath};
use crate::core::shared::models::Contact;
use crate::core::shared::state::AppState;

pub fn configure_contacts_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/contacts",
            get(list_contacts_handler).post(create_contact_handler),
        )
        .route(
            "/api/contacts/:id",
            get(get_contact_handler)
                .put(update_contact_handler)
                .delete(delete_contact_handler),
        )
}

pub async fn list_contacts_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> ActionResult<Vec<Contact>> {
    ContactsService::from_state(&state).list_contacts(&ctx).await
}

pub async fn create_contact_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    ApiJson(request): ApiJson<CreateContactRequest>,
) -> ActionResult<Contact> {
    ContactsService::from_state(&state)
        .create_contact(&ctx, request)
        .await
}

pub async fn get_contact_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    ApiPath(contact_id): ApiPath<Uuid>,
) -> ActionResult<Contact> {
    ContactsService::from_state(&state)
        .get_contact(&ctx, contact_id)
        .await
}

pub async fn update_contact_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    ApiPath(contact_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateContactRequest>,
) -> ActionResult<Contact> {
    ContactsService::from_state(&state)
        .update_contact(&ctx, contact_id, request)
        .await
}

pub async fn delete_contact_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    ApiPath(contact_id): ApiPath<Uuid>,
) -> ActionResult<()> {
    ContactsService::from_state(&state)
        .delete_contact(&ctx, contact_id)
        .await
}
