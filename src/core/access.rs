//! Authorization context shared by the entity services.

use crate::core::session::{Caller, RequestContext, SessionOracle, TenantMembership};
use crate::core::shared::action_result::ActionError;
use crate::core::shared::models::{NewProfile, Profile};
use crate::core::store::Store;

/// Resolves the caller or fails closed. `action` completes the sentence
/// "You must be logged in to ...".
pub async fn require_caller(
    oracle: &dyn SessionOracle,
    ctx: &RequestContext,
    action: &str,
) -> Result<Caller, ActionError> {
    oracle
        .resolve_caller(ctx)
        .await
        .ok_or_else(|| ActionError::Unauthenticated(format!("You must be logged in to {action}")))
}

/// The caller's membership in their active tenant.
pub fn require_active_membership<'a>(
    caller: &'a Caller,
    action: &str,
) -> Result<&'a TenantMembership, ActionError> {
    caller.active_membership().ok_or_else(|| {
        ActionError::Forbidden(format!("You must have an active organization to {action}"))
    })
}

/// Loads the caller's profile, inserting a fresh operator profile on first access.
/// Returns the profile and whether it was created by this call.
pub async fn load_or_create_profile(
    store: &dyn Store,
    caller: &Caller,
) -> Result<(Profile, bool), ActionError> {
    if let Some(profile) = store.find_profile(&caller.user_id).await? {
        return Ok((profile, false));
    }

    let tenant_id = caller.active_membership().map(|m| m.tenant_id.clone());
    match store
        .insert_profile(NewProfile::operator(&caller.user_id, tenant_id))
        .await
    {
        Ok(profile) => Ok((profile, true)),
        // A concurrent first request may have inserted the row already.
        Err(e) => match store.find_profile(&caller.user_id).await? {
            Some(profile) => Ok((profile, false)),
            None => Err(e.into()),
        },
    }
}

/// Rejects blank required text fields.
pub fn require_text(value: &str, field: &str) -> Result<String, ActionError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ActionError::Invalid(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}
