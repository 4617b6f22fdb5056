//! Companies. Exactly one per tenant; the creator becomes its admin.

mod handlers;
mod service;
mod types;

pub use handlers::*;
pub use service::CompaniesService;
pub use types::*;
