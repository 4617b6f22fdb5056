use chrono::Utc;
use log::{debug, warn};
use std::sync::Arc;
use uuid::Uuid;

use super::types::{AssociationRequest, UpdateProfileRequest};
use crate::core::access::{load_or_create_profile, require_caller};
use crate::core::session::{RequestContext, SessionOracle};
use crate::core::shared::action_result::{settle, ActionError, ActionResult};
use crate::core::shared::models::{Profile, ProfileChangeset, ProfileRole};
use crate::core::shared::state::AppState;
use crate::core::store::Store;

pub struct ProfilesService {
    store: Arc<dyn Store>,
    oracle: Arc<dyn SessionOracle>,
}

impl ProfilesService {
    pub fn new(store: Arc<dyn Store>, oracle: Arc<dyn SessionOracle>) -> Self {
        Self { store, oracle }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(Arc::clone(&state.store), Arc::clone(&state.oracle))
    }

    /// Returns the caller's profile, creating an operator profile on first access.
    /// The stored tenant follows the caller's active tenant.
    pub async fn get_or_create_profile(&self, ctx: &RequestContext) -> ActionResult<Profile> {
        let outcome = self.try_get_or_create_profile(ctx).await;
        let message = match &outcome {
            Ok((_, true)) => "Profile created successfully",
            _ => "Profile retrieved successfully",
        };
        settle(outcome, message, "Failed to get or create profile").map(|(profile, _)| profile)
    }

    /// Callers may always read their own profile. Admins and supervisors may read anyone's.
    pub async fn get_profile(&self, ctx: &RequestContext, user_id: &str) -> ActionResult<Profile> {
        settle(
            self.try_get_profile(ctx, user_id).await,
            "Profile retrieved successfully",
            "Failed to retrieve profile",
        )
    }

    pub async fn update_profile(
        &self,
        ctx: &RequestContext,
        request: UpdateProfileRequest,
    ) -> ActionResult<Profile> {
        settle(
            self.try_update_profile(ctx, request).await,
            "Profile updated successfully",
            "Failed to update profile",
        )
    }

    pub async fn associate_user_with_company(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        company_id: Uuid,
        request: AssociationRequest,
    ) -> ActionResult<Profile> {
        settle(
            self.try_associate(ctx, user_id, company_id, request).await,
            "User associated with company successfully",
            "Failed to associate user with company",
        )
    }

    async fn try_get_or_create_profile(
        &self,
        ctx: &RequestContext,
    ) -> Result<(Profile, bool), ActionError> {
        let caller = require_caller(self.oracle.as_ref(), ctx, "access your profile").await?;
        let (profile, created) = load_or_create_profile(self.store.as_ref(), &caller).await?;
        if created {
            return Ok((profile, true));
        }

        let Some(active) = caller.active_membership() else {
            return Ok((profile, false));
        };
        if profile.tenant_id.as_deref() == Some(active.tenant_id.as_str()) {
            return Ok((profile, false));
        }

        let changes = ProfileChangeset {
            tenant_id: Some(active.tenant_id.clone()),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        match self.store.update_profile(&caller.user_id, changes).await {
            Ok(Some(synced)) => Ok((synced, false)),
            Ok(None) => Ok((profile, false)),
            Err(e) => {
                warn!("Failed to sync tenant for profile {}: {e}", caller.user_id);
                Ok((profile, false))
            }
        }
    }

    async fn try_get_profile(
        &self,
        ctx: &RequestContext,
        user_id: &str,
    ) -> Result<Profile, ActionError> {
        let caller = require_caller(self.oracle.as_ref(), ctx, "view profiles").await?;

        if caller.user_id != user_id {
            let allowed = self
                .store
                .find_profile(&caller.user_id)
                .await?
                .is_some_and(|own| own.role().can_view_other_profiles());
            if !allowed {
                return Err(ActionError::Forbidden(
                    "You do not have permission to view this profile".into(),
                ));
            }
        }

        self.store
            .find_profile(user_id)
            .await?
            .ok_or_else(|| ActionError::NotFound("Profile not found".into()))
    }

    async fn try_update_profile(
        &self,
        ctx: &RequestContext,
        request: UpdateProfileRequest,
    ) -> Result<Profile, ActionError> {
        let caller = require_caller(self.oracle.as_ref(), ctx, "update your profile").await?;
        let current = self
            .store
            .find_profile(&caller.user_id)
            .await?
            .ok_or_else(|| ActionError::NotFound("Profile not found".into()))?;

        let role = match request.role {
            Some(role) if role != ProfileRole::Operator && current.role() != ProfileRole::Admin => {
                debug!("Dropping self-assigned role {role} for {}", caller.user_id);
                None
            }
            other => other,
        };

        self.check_defaults(
            current.tenant_id.as_deref(),
            request.primary_site_id,
            request.primary_value_stream_id,
        )
        .await?;

        let changes = ProfileChangeset {
            role: role.map(|r| r.to_string()),
            primary_site_id: request.primary_site_id,
            primary_value_stream_id: request.primary_value_stream_id,
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        self.store
            .update_profile(&caller.user_id, changes)
            .await?
            .ok_or_else(|| ActionError::NotFound("Profile not found".into()))
    }

    async fn try_associate(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        company_id: Uuid,
        request: AssociationRequest,
    ) -> Result<Profile, ActionError> {
        let caller = require_caller(
            self.oracle.as_ref(),
            ctx,
            "associate users with a company",
        )
        .await?;

        let is_admin = self
            .store
            .find_profile(&caller.user_id)
            .await?
            .is_some_and(|admin| admin.is_admin_of(company_id));
        if !is_admin {
            return Err(ActionError::Forbidden(
                "You must be an admin of this company to add users".into(),
            ));
        }

        let company = self
            .store
            .find_company(company_id)
            .await?
            .ok_or_else(|| ActionError::NotFound("Company not found".into()))?;

        self.check_defaults(
            Some(company.tenant_id.as_str()),
            request.primary_site_id,
            request.primary_value_stream_id,
        )
        .await?;

        let changes = ProfileChangeset {
            tenant_id: Some(company.tenant_id),
            company_id: Some(company.id),
            role: Some(request.role.unwrap_or_default().to_string()),
            primary_site_id: request.primary_site_id,
            primary_value_stream_id: request.primary_value_stream_id,
            updated_at: Some(Utc::now()),
        };
        self.store
            .update_profile(user_id, changes)
            .await?
            .ok_or_else(|| ActionError::NotFound("Profile not found".into()))
    }

    /// Default site and value stream must live in the profile's tenant.
    async fn check_defaults(
        &self,
        tenant_id: Option<&str>,
        site_id: Option<Uuid>,
        value_stream_id: Option<Uuid>,
    ) -> Result<(), ActionError> {
        if let Some(site_id) = site_id {
            let site = self.store.find_site(site_id).await?;
            if site.map(|s| s.tenant_id).as_deref() != tenant_id || tenant_id.is_none() {
                return Err(ActionError::Invalid(
                    "Primary site must belong to your organization".into(),
                ));
            }
        }
        if let Some(value_stream_id) = value_stream_id {
            let stream = self.store.find_value_stream(value_stream_id).await?;
            if stream.map(|v| v.tenant_id).as_deref() != tenant_id || tenant_id.is_none() {
                return Err(ActionError::Invalid(
                    "Primary value stream must belong to your organization".into(),
                ));
            }
        }
        Ok(())
    }
}
