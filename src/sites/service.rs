use std::sync::Arc;
use uuid::Uuid;

use super::types::{CreateSiteRequest, UpdateSiteRequest};
use crate::core::access::{require_active_membership, require_caller};
use crate::core::session::{RequestContext, SessionOracle};
use crate::core::shared::action_result::{settle, ActionError, ActionResult};
use crate::core::shared::models::Site;
use crate::core::shared::state::AppState;
use crate::core::store::Store;

const SITE_NOT_FOUND: &str = "Site not found or does not belong to your active organization";

/// A site of `tenant_id`. Rows in other tenants are reported as missing.
pub(crate) async fn find_tenant_site(
    store: &dyn Store,
    id: Uuid,
    tenant_id: &str,
) -> Result<Site, ActionError> {
    store
        .find_site(id)
        .await?
        .filter(|site| site.tenant_id == tenant_id)
        .ok_or_else(|| ActionError::NotFound(SITE_NOT_FOUND.into()))
}

pub struct SitesService {
    store: Arc<dyn Store>,
    oracle: Arc<dyn SessionOracle>,
}

impl SitesService {
    pub fn new(store: Arc<dyn Store>, oracle: Arc<dyn SessionOracle>) -> Self {
        Self { store, oracle }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(Arc::clone(&state.store), Arc::clone(&state.oracle))
    }

    pub async fn create_site(
        &self,
        ctx: &RequestContext,
        request: CreateSiteRequest,
    ) -> ActionResult<Site> {
        settle(
            self.try_create_site(ctx, request).await,
            "Site created successfully",
            "Failed to create site",
        )
    }

    /// Active tenant's sites ordered by name.
    pub async fn list_sites(&self, ctx: &RequestContext) -> ActionResult<Vec<Site>> {
        settle(
            self.try_list_sites(ctx).await,
            "Sites retrieved successfully",
            "Failed to retrieve sites",
        )
    }

    pub async fn get_site(&self, ctx: &RequestContext, id: Uuid) -> ActionResult<Site> {
        settle(
            self.try_get_site(ctx, id).await,
            "Site retrieved successfully",
            "Failed to retrieve site",
        )
    }

    pub async fn update_site(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        request: UpdateSiteRequest,
    ) -> ActionResult<Site> {
        settle(
            self.try_update_site(ctx, id, request).await,
            "Site updated successfully",
            "Failed to update site",
        )
    }

    pub async fn delete_site(&self, ctx: &RequestContext, id: Uuid) -> ActionResult<()> {
        settle(
            self.try_delete_site(ctx, id).await,
            "Site deleted successfully",
            "Failed to delete site",
        )
    }

    async fn try_create_site(
        &self,
        ctx: &RequestContext,
        request: CreateSiteRequest,
    ) -> Result<Site, ActionError> {
        let caller = require_caller(self.oracle.as_ref(), ctx, "create a site").await?;
        let membership = require_active_membership(&caller, "create a site")?;
        let site = request.into_new_site(&membership.tenant_id)?;
        Ok(self.store.insert_site(site).await?)
    }

    async fn try_list_sites(&self, ctx: &RequestContext) -> Result<Vec<Site>, ActionError> {
        let caller = require_caller(self.oracle.as_ref(), ctx, "view sites").await?;
        let membership = require_active_membership(&caller, "view sites")?;
        Ok(self.store.list_sites_for_tenant(&membership.tenant_id).await?)
    }

    async fn try_get_site(&self, ctx: &RequestContext, id: Uuid) -> Result<Site, ActionError> {
        let caller = require_caller(self.oracle.as_ref(), ctx, "view sites").await?;
        let membership = require_active_membership(&caller, "view sites")?;
        find_tenant_site(self.store.as_ref(), id, &membership.tenant_id).await
    }

    async fn try_update_site(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        request: UpdateSiteRequest,
    ) -> Result<Site, ActionError> {
        let caller = require_caller(self.oracle.as_ref(), ctx, "update a site").await?;
        let membership = require_active_membership(&caller, "update a site")?;
        let changes = request.into_changeset()?;

        find_tenant_site(self.store.as_ref(), id, &membership.tenant_id).await?;
        if !membership.role.can_edit_tenant_records() {
            return Err(ActionError::Forbidden(
                "You do not have permission to update sites in this organization".into(),
            ));
        }

        self.store
            .update_site(id, changes)
            .await?
            .ok_or_else(|| ActionError::NotFound(SITE_NOT_FOUND.into()))
    }

    async fn try_delete_site(&self, ctx: &RequestContext, id: Uuid) -> Result<(), ActionError> {
        let caller = require_caller(self.oracle.as_ref(), ctx, "delete a site").await?;
        let membership = require_active_membership(&caller, "delete a site")?;

        find_tenant_site(self.store.as_ref(), id, &membership.tenant_id).await?;
        if !membership.role.can_delete_tenant_records() {
            return Err(ActionError::Forbidden(
                "You do not have permission to delete sites in this organization".into(),
            ));
        }

        if !self.store.delete_site(id).await? {
            return Err(ActionError::NotFound(SITE_NOT_FOUND.into()));
        }
        Ok(())
    }
}
