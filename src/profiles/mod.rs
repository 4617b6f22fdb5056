mod handlers;
mod service;
mod types;

pub use handlers::*;
pub use service::ProfilesService;
pub use types::*;
