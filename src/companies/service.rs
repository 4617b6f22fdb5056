use chrono::Utc;
use log::warn;
use std::sync::Arc;
use uuid::Uuid;

use super::types::{CreateCompanyRequest, UpdateCompanyRequest};
use crate::core::access::{load_or_create_profile, require_active_membership, require_caller};
use crate::core::session::{Caller, RequestContext, SessionOracle};
use crate::core::shared::action_result::{settle, ActionError, ActionResult};
use crate::core::shared::models::{Company, CompanyChangeset, NewCompany};
use crate::core::shared::state::AppState;
use crate::core::store::{Store, StoreError};

pub struct CompaniesService {
    store: Arc<dyn Store>,
    oracle: Arc<dyn SessionOracle>,
}

impl CompaniesService {
    pub fn new(store: Arc<dyn Store>, oracle: Arc<dyn SessionOracle>) -> Self {
        Self { store, oracle }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(Arc::clone(&state.store), Arc::clone(&state.oracle))
    }

    /// Creates the active tenant's company and makes the caller its admin atomically.
    pub async fn create_company(
        &self,
        ctx: &RequestContext,
        request: CreateCompanyRequest,
    ) -> ActionResult<Company> {
        settle(
            self.try_create_company(ctx, request).await,
            "Company created successfully",
            "Failed to create company",
        )
    }

    pub async fn get_company(&self, ctx: &RequestContext, id: Uuid) -> ActionResult<Company> {
        settle(
            self.try_get_company(ctx, id).await,
            "Company retrieved successfully",
            "Failed to retrieve company",
        )
    }

    /// The caller's associated company, or else the companies they created.
    pub async fn list_companies(&self, ctx: &RequestContext) -> ActionResult<Vec<Company>> {
        settle(
            self.try_list_companies(ctx).await,
            "Companies retrieved successfully",
            "Failed to retrieve companies",
        )
    }

    pub async fn update_company(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        request: UpdateCompanyRequest,
    ) -> ActionResult<Company> {
        settle(
            self.try_update_company(ctx, id, request).await,
            "Company updated successfully",
            "Failed to update company",
        )
    }

    pub async fn delete_company(&self, ctx: &RequestContext, id: Uuid) -> ActionResult<()> {
        settle(
            self.try_delete_company(ctx, id).await,
            "Company deleted successfully",
            "Failed to delete company",
        )
    }

    pub async fn get_or_create_company_for_tenant(
        &self,
        ctx: &RequestContext,
    ) -> ActionResult<Company> {
        settle(
            self.try_get_or_create_for_tenant(ctx).await,
            "Company retrieved successfully",
            "Failed to get or create company",
        )
    }

    pub async fn update_active_company(
        &self,
        ctx: &RequestContext,
        request: UpdateCompanyRequest,
    ) -> ActionResult<Company> {
        settle(
            self.try_update_active_company(ctx, request).await,
            "Company updated successfully",
            "Failed to update company",
        )
    }

    async fn try_create_company(
        &self,
        ctx: &RequestContext,
        request: CreateCompanyRequest,
    ) -> Result<Company, ActionError> {
        let caller = require_caller(self.oracle.as_ref(), ctx, "create a company").await?;
        let membership = require_active_membership(&caller, "create a company")?;
        let company = request.into_new_company(&membership.tenant_id, &caller.user_id)?;

        // The admin association below updates the profile row, so it must exist.
        load_or_create_profile(self.store.as_ref(), &caller).await?;

        Ok(self
            .store
            .create_company_with_admin(company, &caller.user_id)
            .await?)
    }

    async fn try_get_company(&self, ctx: &RequestContext, id: Uuid) -> Result<Company, ActionError> {
        let caller = require_caller(self.oracle.as_ref(), ctx, "view company details").await?;
        let company = self.find(id).await?;

        let has_access = self
            .store
            .find_profile(&caller.user_id)
            .await?
            .is_some_and(|profile| profile.company_id == Some(company.id));
        if !has_access {
            return Err(ActionError::Forbidden(
                "You do not have access to this company".into(),
            ));
        }
        Ok(company)
    }

    async fn try_list_companies(&self, ctx: &RequestContext) -> Result<Vec<Company>, ActionError> {
        let caller = require_caller(self.oracle.as_ref(), ctx, "view companies").await?;
        let company_id = self
            .store
            .find_profile(&caller.user_id)
            .await?
            .and_then(|profile| profile.company_id);

        match company_id {
            Some(id) => Ok(self.store.find_company(id).await?.into_iter().collect()),
            None => Ok(self.store.list_companies_created_by(&caller.user_id).await?),
        }
    }

    async fn try_update_company(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        request: UpdateCompanyRequest,
    ) -> Result<Company, ActionError> {
        let caller = require_caller(self.oracle.as_ref(), ctx, "update a company").await?;
        let changes = request.into_changeset()?;
        let company = self.find(id).await?;
        self.apply_update(&caller, company, changes).await
    }

    async fn try_delete_company(&self, ctx: &RequestContext, id: Uuid) -> Result<(), ActionError> {
        let caller = require_caller(self.oracle.as_ref(), ctx, "delete a company").await?;
        let company = self.find(id).await?;
        if !company.is_created_by(&caller.user_id) {
            return Err(ActionError::Forbidden(
                "Only the company creator can delete it".into(),
            ));
        }
        if !self.store.delete_company(id).await? {
            return Err(ActionError::NotFound("Company not found".into()));
        }
        Ok(())
    }

    async fn try_get_or_create_for_tenant(
        &self,
        ctx: &RequestContext,
    ) -> Result<Company, ActionError> {
        let caller = require_caller(self.oracle.as_ref(), ctx, "access company data").await?;
        let membership = require_active_membership(&caller, "access company data")?;
        let tenant_id = membership.tenant_id.as_str();
        let tenant_name = membership.display_name();

        let Some(company) = self.store.find_company_by_tenant(tenant_id).await? else {
            let now = Utc::now();
            let company = NewCompany {
                id: Uuid::new_v4(),
                tenant_id: tenant_id.to_string(),
                name: tenant_name.unwrap_or(tenant_id).to_string(),
                description: None,
                industry: None,
                created_by: None,
                created_at: now,
                updated_at: now,
            };
            return match self.store.insert_company(company).await {
                Ok(created) => Ok(created),
                // Another request created the tenant's company first.
                Err(StoreError::UniqueViolation(detail)) => self
                    .store
                    .find_company_by_tenant(tenant_id)
                    .await?
                    .ok_or(ActionError::Store(StoreError::UniqueViolation(detail))),
                Err(e) => Err(e.into()),
            };
        };

        // Without a name from the session there is nothing to sync against.
        let Some(tenant_name) = tenant_name.filter(|name| *name != company.name) else {
            return Ok(company);
        };

        let changes = CompanyChangeset {
            name: Some(tenant_name.to_string()),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        match self.store.update_company(company.id, changes).await {
            Ok(Some(renamed)) => Ok(renamed),
            Ok(None) => Ok(company),
            Err(e) => {
                warn!("Failed to sync name for company {}: {e}", company.id);
                Ok(company)
            }
        }
    }

    async fn try_update_active_company(
        &self,
        ctx: &RequestContext,
        request: UpdateCompanyRequest,
    ) -> Result<Company, ActionError> {
        let caller = require_caller(self.oracle.as_ref(), ctx, "update company details").await?;
        let membership = require_active_membership(&caller, "update company details")?;
        let changes = request.into_changeset()?;
        let company = self
            .store
            .find_company_by_tenant(&membership.tenant_id)
            .await?
            .ok_or_else(|| ActionError::NotFound("Company not found".into()))?;
        self.apply_update(&caller, company, changes).await
    }

    async fn find(&self, id: Uuid) -> Result<Company, ActionError> {
        self.store
            .find_company(id)
            .await?
            .ok_or_else(|| ActionError::NotFound("Company not found".into()))
    }

    /// Creator, or an admin profile linked to this company in the same tenant.
    async fn apply_update(
        &self,
        caller: &Caller,
        company: Company,
        changes: CompanyChangeset,
    ) -> Result<Company, ActionError> {
        if !company.is_created_by(&caller.user_id) {
            let is_admin = self
                .store
                .find_profile(&caller.user_id)
                .await?
                .is_some_and(|profile| {
                    profile.is_admin_of(company.id)
                        && profile.tenant_id.as_deref() == Some(company.tenant_id.as_str())
                });
            if !is_admin {
                return Err(ActionError::Forbidden(
                    "You do not have permission to update this company".into(),
                ));
            }
        }

        self.store
            .update_company(company.id, changes)
            .await?
            .ok_or_else(|| ActionError::NotFound("Company not found".into()))
    }
}
