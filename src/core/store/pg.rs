use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::PgConnection;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::core::shared::models::{
    Company, CompanyChangeset, Contact, ContactChangeset, NewCompany, NewContact, NewProfile,
    NewSite, NewValueStream, Profile, ProfileChangeset, ProfileRole, Site, SiteChangeset,
    ValueStream, ValueStreamChangeset,
};
use crate::core::shared::schema::{companies, contacts, profiles, sites, value_streams};
use crate::core::shared::utils::DbPool;

/// PostgreSQL store backed by the shared r2d2 pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Checks a connection out of the pool for the duration of `f` only.
    /// Diesel is blocking, so the work runs on the blocking thread pool.
    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> QueryResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut conn).map_err(StoreError::from)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_profile(&self, user_id: &str) -> StoreResult<Option<Profile>> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            profiles::table
                .find(user_id)
                .select(Profile::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    async fn insert_profile(&self, profile: NewProfile) -> StoreResult<Profile> {
        self.with_conn(move |conn| {
            diesel::insert_into(profiles::table)
                .values(&profile)
                .returning(Profile::as_returning())
                .get_result(conn)
        })
        .await
    }

    async fn update_profile(
        &self,
        user_id: &str,
        changes: ProfileChangeset,
    ) -> StoreResult<Option<Profile>> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            diesel::update(profiles::table.find(user_id))
                .set(&changes)
                .returning(Profile::as_returning())
                .get_result(conn)
                .optional()
        })
        .await
    }

    async fn find_company(&self, id: Uuid) -> StoreResult<Option<Company>> {
        self.with_conn(move |conn| {
            companies::table
                .find(id)
                .select(Company::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    async fn find_company_by_tenant(&self, tenant_id: &str) -> StoreResult<Option<Company>> {
        let tenant_id = tenant_id.to_string();
        self.with_conn(move |conn| {
            companies::table
                .filter(companies::tenant_id.eq(tenant_id))
                .select(Company::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    async fn list_companies_created_by(&self, user_id: &str) -> StoreResult<Vec<Company>> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            companies::table
                .filter(companies::created_by.eq(user_id))
                .order(companies::created_at.desc())
                .select(Company::as_select())
                .load(conn)
        })
        .await
    }

    async fn insert_company(&self, company: NewCompany) -> StoreResult<Company> {
        self.with_conn(move |conn| {
            diesel::insert_into(companies::table)
                .values(&company)
                .returning(Company::as_returning())
                .get_result(conn)
        })
        .await
    }

    async fn create_company_with_admin(
        &self,
        company: NewCompany,
        admin_user_id: &str,
    ) -> StoreResult<Company> {
        let admin_user_id = admin_user_id.to_string();
        self.with_conn(move |conn| {
            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                let created = diesel::insert_into(companies::table)
                    .values(&company)
                    .returning(Company::as_returning())
                    .get_result(conn)?;

                let updated = diesel::update(profiles::table.find(&admin_user_id))
                    .set((
                        profiles::company_id.eq(created.id),
                        profiles::tenant_id.eq(&created.tenant_id),
                        profiles::role.eq(ProfileRole::Admin.as_str()),
                        profiles::updated_at.eq(Utc::now()),
                    ))
                    .execute(conn)?;

                // No profile row means no admin association; roll the insert back.
                if updated == 0 {
                    return Err(diesel::result::Error::NotFound);
                }

                Ok(created)
            })
        })
        .await
    }

    async fn update_company(
        &self,
        id: Uuid,
        changes: CompanyChangeset,
    ) -> StoreResult<Option<Company>> {
        self.with_conn(move |conn| {
            diesel::update(companies::table.find(id))
                .set(&changes)
                .returning(Company::as_returning())
                .get_result(conn)
                .optional()
        })
        .await
    }

    async fn delete_company(&self, id: Uuid) -> StoreResult<bool> {
        self.with_conn(move |conn| {
            diesel::delete(companies::table.find(id))
                .execute(conn)
                .map(|rows| rows > 0)
        })
        .await
    }

    async fn find_site(&self, id: Uuid) -> StoreResult<Option<Site>> {
        self.with_conn(move |conn| {
            sites::table
                .find(id)
                .select(Site::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    async fn list_sites_for_tenant(&self, tenant_id: &str) -> StoreResult<Vec<Site>> {
        let tenant_id = tenant_id.to_string();
        self.with_conn(move |conn| {
            sites::table
                .filter(sites::tenant_id.eq(tenant_id))
                .order(sites::name.asc())
                .select(Site::as_select())
                .load(conn)
        })
        .await
    }

    async fn insert_site(&self, site: NewSite) -> StoreResult<Site> {
        self.with_conn(move |conn| {
            diesel::insert_into(sites::table)
                .values(&site)
                .returning(Site::as_returning())
                .get_result(conn)
        })
        .await
    }

    async fn update_site(&self, id: Uuid, changes: SiteChangeset) -> StoreResult<Option<Site>> {
        self.with_conn(move |conn| {
            diesel::update(sites::table.find(id))
                .set(&changes)
                .returning(Site::as_returning())
                .get_result(conn)
                .optional()
        })
        .await
    }

    async fn delete_site(&self, id: Uuid) -> StoreResult<bool> {
        self.with_conn(move |conn| {
            diesel::delete(sites::table.find(id))
                .execute(conn)
                .map(|rows| rows > 0)
        })
        .await
    }

    async fn find_value_stream(&self, id: Uuid) -> StoreResult<Option<ValueStream>> {
        self.with_conn(move |conn| {
            value_streams::table
                .find(id)
                .select(ValueStream::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    async fn list_value_streams_for_site(&self, site_id: Uuid) -> StoreResult<Vec<ValueStream>> {
        self.with_conn(move |conn| {
            value_streams::table
                .filter(value_streams::site_id.eq(site_id))
                .order(value_streams::name.asc())
                .select(ValueStream::as_select())
                .load(conn)
        })
        .await
    }

    async fn insert_value_stream(&self, value_stream: NewValueStream) -> StoreResult<ValueStream> {
        self.with_conn(move |conn| {
            diesel::insert_into(value_streams::table)
                .values(&value_stream)
                .returning(ValueStream::as_returning())
                .get_result(conn)
        })
        .await
    }

    async fn update_value_stream(
        &self,
        id: Uuid,
        changes: ValueStreamChangeset,
    ) -> StoreResult<Option<ValueStream>> {
        self.with_conn(move |conn| {
            diesel::update(value_streams::table.find(id))
                .set(&changes)
                .returning(ValueStream::as_returning())
                .get_result(conn)
                .optional()
        })
        .await
    }

    async fn delete_value_stream(&self, id: Uuid) -> StoreResult<bool> {
        self.with_conn(move |conn| {
            diesel::delete(value_streams::table.find(id))
                .execute(conn)
                .map(|rows| rows > 0)
        })
        .await
    }

    async fn find_contact(&self, id: Uuid) -> StoreResult<Option<Contact>> {
        self.with_conn(move |conn| {
            contacts::table
                .find(id)
                .select(Contact::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    async fn list_contacts_for_owner(&self, owner_id: &str) -> StoreResult<Vec<Contact>> {
        let owner_id = owner_id.to_string();
        self.with_conn(move |conn| {
            contacts::table
                .filter(contacts::owner_id.eq(owner_id))
                .order(contacts::created_at.desc())
                .select(Contact::as_select())
                .load(conn)
        })
        .await
    }

    async fn insert_contact(&self, contact: NewContact) -> StoreResult<Contact> {
        self.with_conn(move |conn| {
            diesel::insert_into(contacts::table)
                .values(&contact)
                .returning(Contact::as_returning())
                .get_result(conn)
        })
        .await
    }

    async fn update_contact(
        &self,
        id: Uuid,
        changes: ContactChangeset,
    ) -> StoreResult<Option<Contact>> {
        self.with_conn(move |conn| {
            diesel::update(contacts::table.find(id))
                .set(&changes)
                .returning(Contact::as_returning())
                .get_result(conn)
                .optional()
        })
        .await
    }

    async fn delete_contact(&self, id: Uuid) -> StoreResult<bool> {
        self.with_conn(move |conn| {
            diesel::delete(contacts::table.find(id))
                .execute(conn)
                .map(|rows| rows > 0)
        })
        .await
    }

    async fn ping(&self) -> bool {
        self.with_conn(|conn| diesel::sql_query("SELECT 1").execute(conn))
            .await
            .is_ok()
    }
}
