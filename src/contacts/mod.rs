//! Personal contacts. Rows belong to a single caller and are not tenant scoped.

mod handlers;
mod service;
mod types;

pub use handlers::*;
pub use service::ContactsService;
pub use types::*;
