//! Sites. Scoped to the caller's active tenant; rights come from the
//! caller's membership role in that tenant, not from the profile.

mod handlers;
mod service;
mod types;

pub use handlers::*;
pub(crate) use service::find_tenant_site;
pub use service::SitesService;
pub use types::*;
