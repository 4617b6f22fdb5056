use std::sync::Arc;
use uuid::Uuid;

use super::types::{CreateValueStreamRequest, UpdateValueStreamRequest};
use crate::core::access::{require_active_membership, require_caller};
use crate::core::session::{RequestContext, SessionOracle};
use crate::core::shared::action_result::{settle, ActionError, ActionResult};
use crate::core::shared::models::ValueStream;
use crate::core::shared::state::AppState;
use crate::core::store::Store;
use crate::sites::find_tenant_site;

const VALUE_STREAM_NOT_FOUND: &str =
    "Value stream not found or does not belong to your active organization";

pub struct ValueStreamsService {
    store: Arc<dyn Store>,
    oracle: Arc<dyn SessionOracle>,
}

impl ValueStreamsService {
    pub fn new(store: Arc<dyn Store>, oracle: Arc<dyn SessionOracle>) -> Self {
        Self { store, oracle }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(Arc::clone(&state.store), Arc::clone(&state.oracle))
    }

    pub async fn create_value_stream(
        &self,
        ctx: &RequestContext,
        site_id: Uuid,
        request: CreateValueStreamRequest,
    ) -> ActionResult<ValueStream> {
        settle(
            self.try_create(ctx, site_id, request).await,
            "Value stream created successfully",
            "Failed to create value stream",
        )
    }

    pub async fn list_value_streams(
        &self,
        ctx: &RequestContext,
        site_id: Uuid,
    ) -> ActionResult<Vec<ValueStream>> {
        settle(
            self.try_list(ctx, site_id).await,
            "Value streams retrieved successfully",
            "Failed to retrieve value streams",
        )
    }

    pub async fn get_value_stream(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> ActionResult<ValueStream> {
        settle(
            self.try_get(ctx, id).await,
            "Value stream retrieved successfully",
            "Failed to retrieve value stream",
        )
    }

    pub async fn update_value_stream(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        request: UpdateValueStreamRequest,
    ) -> ActionResult<ValueStream> {
        settle(
            self.try_update(ctx, id, request).await,
            "Value stream updated successfully",
            "Failed to update value stream",
        )
    }

    pub async fn delete_value_stream(&self, ctx: &RequestContext, id: Uuid) -> ActionResult<()> {
        settle(
            self.try_delete(ctx, id).await,
            "Value stream deleted successfully",
            "Failed to delete value stream",
        )
    }

    async fn try_create(
        &self,
        ctx: &RequestContext,
        site_id: Uuid,
        request: CreateValueStreamRequest,
    ) -> Result<ValueStream, ActionError> {
        let caller = require_caller(self.oracle.as_ref(), ctx, "create a value stream").await?;
        let membership = require_active_membership(&caller, "create a value stream")?;
        let site = find_tenant_site(self.store.as_ref(), site_id, &membership.tenant_id).await?;
        let value_stream = request.into_new_value_stream(&site)?;
        Ok(self.store.insert_value_stream(value_stream).await?)
    }

    async fn try_list(
        &self,
        ctx: &RequestContext,
        site_id: Uuid,
    ) -> Result<Vec<ValueStream>, ActionError> {
        let caller = require_caller(self.oracle.as_ref(), ctx, "view value streams").await?;
        let membership = require_active_membership(&caller, "view value streams")?;
        find_tenant_site(self.store.as_ref(), site_id, &membership.tenant_id).await?;
        Ok(self.store.list_value_streams_for_site(site_id).await?)
    }

    async fn try_get(&self, ctx: &RequestContext, id: Uuid) -> Result<ValueStream, ActionError> {
        let caller = require_caller(self.oracle.as_ref(), ctx, "view value streams").await?;
        let membership = require_active_membership(&caller, "view value streams")?;
        self.find_in_tenant(id, &membership.tenant_id).await
    }

    async fn try_update(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        request: UpdateValueStreamRequest,
    ) -> Result<ValueStream, ActionError> {
        let caller = require_caller(self.oracle.as_ref(), ctx, "update a value stream").await?;
        let membership = require_active_membership(&caller, "update a value stream")?;
        let changes = request.into_changeset()?;

        self.find_in_tenant(id, &membership.tenant_id).await?;
        if !membership.role.can_edit_tenant_records() {
            return Err(ActionError::Forbidden(
                "You do not have permission to update value streams in this organization".into(),
            ));
        }

        self.store
            .update_value_stream(id, changes)
            .await?
            .ok_or_else(|| ActionError::NotFound(VALUE_STREAM_NOT_FOUND.into()))
    }

    async fn try_delete(&self, ctx: &RequestContext, id: Uuid) -> Result<(), ActionError> {
        let caller = require_caller(self.oracle.as_ref(), ctx, "delete a value stream").await?;
        let membership = require_active_membership(&caller, "delete a value stream")?;

        self.find_in_tenant(id, &membership.tenant_id).await?;
        if !membership.role.can_delete_tenant_records() {
            return Err(ActionError::Forbidden(
                "You do not have permission to delete value streams in this organization".into(),
            ));
        }

        if !self.store.delete_value_stream(id).await? {
            return Err(ActionError::NotFound(VALUE_STREAM_NOT_FOUND.into()));
        }
        Ok(())
    }

    async fn find_in_tenant(&self, id: Uuid, tenant_id: &str) -> Result<ValueStream, ActionError> {
        self.store
            .find_value_stream(id)
            .await?
            .filter(|stream| stream.tenant_id == tenant_id)
            .ok_or_else(|| ActionError::NotFound(VALUE_STREAM_NOT_FOUND.into()))
    }
}
