//! Relational store seam.
//!
//! Every method is a single parameterized statement, except
//! [`Store::create_company_with_admin`], which is the only multi-statement
//! transaction in the service.

mod pg;

pub use pg::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::shared::models::{
    Company, CompanyChangeset, Contact, ContactChangeset, NewCompany, NewContact, NewProfile,
    NewSite, NewValueStream, Profile, ProfileChangeset, Site, SiteChangeset, ValueStream,
    ValueStreamChangeset,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("connection pool error: {0}")]
    Pool(String),
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("query failed: {0}")]
    Query(String),
    #[error("database task failed: {0}")]
    Task(String),
}

impl From<diesel::result::Error> for StoreError {
    fn from(e: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};
        match e {
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Self::UniqueViolation(info.message().to_string())
            }
            other => Self::Query(other.to_string()),
        }
    }
}

impl From<diesel::r2d2::PoolError> for StoreError {
    fn from(e: diesel::r2d2::PoolError) -> Self {
        Self::Pool(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    async fn find_profile(&self, user_id: &str) -> StoreResult<Option<Profile>>;
    async fn insert_profile(&self, profile: NewProfile) -> StoreResult<Profile>;
    /// `None` when no profile exists for `user_id`.
    async fn update_profile(
        &self,
        user_id: &str,
        changes: ProfileChangeset,
    ) -> StoreResult<Option<Profile>>;

    async fn find_company(&self, id: Uuid) -> StoreResult<Option<Company>>;
    async fn find_company_by_tenant(&self, tenant_id: &str) -> StoreResult<Option<Company>>;
    /// Newest first.
    async fn list_companies_created_by(&self, user_id: &str) -> StoreResult<Vec<Company>>;
    async fn insert_company(&self, company: NewCompany) -> StoreResult<Company>;
    /// Inserts `company` and makes `admin_user_id` its admin in one transaction.
    /// Nothing persists unless both statements succeed and the profile exists.
    async fn create_company_with_admin(
        &self,
        company: NewCompany,
        admin_user_id: &str,
    ) -> StoreResult<Company>;
    async fn update_company(
        &self,
        id: Uuid,
        changes: CompanyChangeset,
    ) -> StoreResult<Option<Company>>;
    async fn delete_company(&self, id: Uuid) -> StoreResult<bool>;

    async fn find_site(&self, id: Uuid) -> StoreResult<Option<Site>>;
    /// Ordered by name.
    async fn list_sites_for_tenant(&self, tenant_id: &str) -> StoreResult<Vec<Site>>;
    async fn insert_site(&self, site: NewSite) -> StoreResult<Site>;
    async fn update_site(&self, id: Uuid, changes: SiteChangeset) -> StoreResult<Option<Site>>;
    async fn delete_site(&self, id: Uuid) -> StoreResult<bool>;

    async fn find_value_stream(&self, id: Uuid) -> StoreResult<Option<ValueStream>>;
    /// Ordered by name.
    async fn list_value_streams_for_site(&self, site_id: Uuid) -> StoreResult<Vec<ValueStream>>;
    async fn insert_value_stream(&self, value_stream: NewValueStream) -> StoreResult<ValueStream>;
    async fn update_value_stream(
        &self,
        id: Uuid,
        changes: ValueStreamChangeset,
    ) -> StoreResult<Option<ValueStream>>;
    async fn delete_value_stream(&self, id: Uuid) -> StoreResult<bool>;

    async fn find_contact(&self, id: Uuid) -> StoreResult<Option<Contact>>;
    /// Newest first.
    async fn list_contacts_for_owner(&self, owner_id: &str) -> StoreResult<Vec<Contact>>;
    async fn insert_contact(&self, contact: NewContact) -> StoreResult<Contact>;
    async fn update_contact(
        &self,
        id: Uuid,
        changes: ContactChangeset,
    ) -> StoreResult<Option<Contact>>;
    async fn delete_contact(&self, id: Uuid) -> StoreResult<bool>;

    /// Cheap connectivity probe for health checks.
    async fn ping(&self) -> bool;
}
