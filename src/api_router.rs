//! API Router
//!
//! Combines the JSON routes of every entity module into one router.

use axum::Router;
use std::sync::Arc;

use crate::core::shared::state::AppState;

/// Configure all API routes from all modules
pub fn configure_api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(crate::profiles::configure_profiles_routes())
        .merge(crate::companies::configure_companies_routes())
        .merge(crate::sites::configure_sites_routes())
        .merge(crate::value_streams::configure_value_streams_routes())
        .merge(crate::contacts::configure_contacts_routes())
}
