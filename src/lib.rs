//! Tenant-scoped data access service for the shopfloor dashboards.
//!
//! Every operation resolves the caller through a [`core::session::SessionOracle`],
//! checks its permission rule against freshly read rows and answers with an
//! [`core::shared::action_result::ActionResult`] envelope.

pub mod api_router;
pub mod companies;
pub mod config;
pub mod contacts;
pub mod core;
pub mod main_module;
pub mod profiles;
pub mod sites;
pub mod value_streams;
