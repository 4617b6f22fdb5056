pub mod action_result;
pub mod extract;
pub mod models;
pub mod schema;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod utils;

pub use action_result::{settle, ActionError, ActionResult, FailureKind};
pub use extract::{ApiJson, ApiPath};
pub use state::AppState;
pub use utils::{create_conn, DbPool};
