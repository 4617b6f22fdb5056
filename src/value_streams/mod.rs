//! Production lines within a site. Same tenancy rules as sites.

mod handlers;
mod service;
mod types;

pub use handlers::*;
pub use service::ValueStreamsService;
pub use types::*;
