use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::core::session::{Caller, MembershipRole, RequestContext, SessionOracle};
use crate::core::shared::models::{
    Company, CompanyChangeset, Contact, ContactChangeset, NewCompany, NewContact, NewProfile,
    NewSite, NewValueStream, Profile, ProfileChangeset, ProfileRole, Site, SiteChangeset,
    ValueStream, ValueStreamChangeset,
};
use crate::core::shared::state::AppState;
use crate::core::store::{Store, StoreError, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Profiles,
    Companies,
    Sites,
    ValueStreams,
    Contacts,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    profiles: HashMap<String, Profile>,
    companies: HashMap<Uuid, Company>,
    sites: HashMap<Uuid, Site>,
    value_streams: HashMap<Uuid, ValueStream>,
    contacts: HashMap<Uuid, Contact>,
}

/// In-process [`Store`] with the same constraints as the SQL schema
/// (unique tenant per company, `ON DELETE` rules) plus write-failure injection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    failing_writes: Mutex<HashSet<Table>>,
    lost_races: Mutex<HashSet<Table>>,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every later insert/update/delete touching `table` fails.
    pub fn fail_writes_to(&self, table: Table) {
        if let Ok(mut failing) = self.failing_writes.lock() {
            failing.insert(table);
        }
    }

    /// The next insert into `table` finds that a concurrent writer committed
    /// the same row first, and fails with a unique violation.
    pub fn lose_next_insert_race(&self, table: Table) {
        if let Ok(mut lost) = self.lost_races.lock() {
            lost.insert(table);
        }
    }

    pub fn heal(&self) {
        if let Ok(mut failing) = self.failing_writes.lock() {
            failing.clear();
        }
    }

    /// Number of store calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn profile_count(&self) -> usize {
        self.tables.read().await.profiles.len()
    }

    pub async fn company_count(&self) -> usize {
        self.tables.read().await.companies.len()
    }

    pub async fn profile(&self, user_id: &str) -> Option<Profile> {
        self.tables.read().await.profiles.get(user_id).cloned()
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn take_lost_race(&self, table: Table) -> bool {
        self.lost_races
            .lock()
            .map(|mut lost| lost.remove(&table))
            .unwrap_or(false)
    }

    fn check_write(&self, table: Table) -> StoreResult<()> {
        let failing = self
            .failing_writes
            .lock()
            .map(|f| f.contains(&table))
            .unwrap_or(false);
        if failing {
            return Err(StoreError::Query(format!("simulated failure writing {table:?}")));
        }
        Ok(())
    }
}

fn profile_row(profile: NewProfile) -> Profile {
    Profile {
        user_id: profile.user_id,
        tenant_id: profile.tenant_id,
        company_id: None,
        role: profile.role,
        primary_site_id: None,
        primary_value_stream_id: None,
        created_at: profile.created_at,
        updated_at: profile.updated_at,
    }
}

fn insert_company_row(tables: &mut Tables, company: NewCompany) -> StoreResult<Company> {
    if tables
        .companies
        .values()
        .any(|c| c.tenant_id == company.tenant_id)
    {
        return Err(StoreError::UniqueViolation(format!(
            "company already exists for tenant {}",
            company.tenant_id
        )));
    }
    let row = Company {
        id: company.id,
        tenant_id: company.tenant_id,
        name: company.name,
        description: company.description,
        industry: company.industry,
        created_by: company.created_by,
        created_at: company.created_at,
        updated_at: company.updated_at,
    };
    tables.companies.insert(row.id, row.clone());
    Ok(row)
}

fn newest_first<T>(rows: &mut [T], created_at: impl Fn(&T) -> chrono::DateTime<chrono::Utc>) {
    rows.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_profile(&self, user_id: &str) -> StoreResult<Option<Profile>> {
        self.touch();
        Ok(self.tables.read().await.profiles.get(user_id).cloned())
    }

    async fn insert_profile(&self, profile: NewProfile) -> StoreResult<Profile> {
        self.touch();
        self.check_write(Table::Profiles)?;
        let mut tables = self.tables.write().await;
        if self.take_lost_race(Table::Profiles) {
            let winner = profile_row(profile.clone());
            tables.profiles.insert(winner.user_id.clone(), winner);
        }
        if tables.profiles.contains_key(&profile.user_id) {
            return Err(StoreError::UniqueViolation(format!(
                "profile already exists for {}",
                profile.user_id
            )));
        }
        let row = profile_row(profile);
        tables.profiles.insert(row.user_id.clone(), row.clone());
        Ok(row)
    }

    async fn update_profile(
        &self,
        user_id: &str,
        changes: ProfileChangeset,
    ) -> StoreResult<Option<Profile>> {
        self.touch();
        self.check_write(Table::Profiles)?;
        let mut tables = self.tables.write().await;
        let Some(row) = tables.profiles.get_mut(user_id) else {
            return Ok(None);
        };
        if let Some(v) = changes.tenant_id {
            row.tenant_id = Some(v);
        }
        if let Some(v) = changes.company_id {
            row.company_id = Some(v);
        }
        if let Some(v) = changes.role {
            row.role = v;
        }
        if let Some(v) = changes.primary_site_id {
            row.primary_site_id = Some(v);
        }
        if let Some(v) = changes.primary_value_stream_id {
            row.primary_value_stream_id = Some(v);
        }
        if let Some(v) = changes.updated_at {
            row.updated_at = v;
        }
        Ok(Some(row.clone()))
    }

    async fn find_company(&self, id: Uuid) -> StoreResult<Option<Company>> {
        self.touch();
        Ok(self.tables.read().await.companies.get(&id).cloned())
    }

    async fn find_company_by_tenant(&self, tenant_id: &str) -> StoreResult<Option<Company>> {
        self.touch();
        Ok(self
            .tables
            .read()
            .await
            .companies
            .values()
            .find(|c| c.tenant_id == tenant_id)
            .cloned())
    }

    async fn list_companies_created_by(&self, user_id: &str) -> StoreResult<Vec<Company>> {
        self.touch();
        let mut rows: Vec<Company> = self
            .tables
            .read()
            .await
            .companies
            .values()
            .filter(|c| c.is_created_by(user_id))
            .cloned()
            .collect();
        newest_first(&mut rows, |c| c.created_at);
        Ok(rows)
    }

    async fn insert_company(&self, company: NewCompany) -> StoreResult<Company> {
        self.touch();
        self.check_write(Table::Companies)?;
        let mut tables = self.tables.write().await;
        if self.take_lost_race(Table::Companies) {
            let winner = NewCompany {
                id: Uuid::new_v4(),
                ..company.clone()
            };
            insert_company_row(&mut tables, winner)?;
        }
        insert_company_row(&mut tables, company)
    }

    async fn create_company_with_admin(
        &self,
        company: NewCompany,
        admin_user_id: &str,
    ) -> StoreResult<Company> {
        self.touch();
        let mut tables = self.tables.write().await;
        let mut staged = tables.clone();

        self.check_write(Table::Companies)?;
        let created = insert_company_row(&mut staged, company)?;

        self.check_write(Table::Profiles)?;
        let profile = staged
            .profiles
            .get_mut(admin_user_id)
            .ok_or_else(|| StoreError::Query("profile not found".into()))?;
        profile.company_id = Some(created.id);
        profile.tenant_id = Some(created.tenant_id.clone());
        profile.role = ProfileRole::Admin.to_string();
        profile.updated_at = chrono::Utc::now();

        *tables = staged;
        Ok(created)
    }

    async fn update_company(
        &self,
        id: Uuid,
        changes: CompanyChangeset,
    ) -> StoreResult<Option<Company>> {
        self.touch();
        self.check_write(Table::Companies)?;
        let mut tables = self.tables.write().await;
        let Some(row) = tables.companies.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = changes.name {
            row.name = v;
        }
        if let Some(v) = changes.description {
            row.description = v;
        }
        if let Some(v) = changes.industry {
            row.industry = v;
        }
        if let Some(v) = changes.updated_at {
            row.updated_at = v;
        }
        Ok(Some(row.clone()))
    }

    async fn delete_company(&self, id: Uuid) -> StoreResult<bool> {
        self.touch();
        self.check_write(Table::Companies)?;
        let mut tables = self.tables.write().await;
        let removed = tables.companies.remove(&id).is_some();
        for profile in tables.profiles.values_mut() {
            if profile.company_id == Some(id) {
                profile.company_id = None;
            }
        }
        Ok(removed)
    }

    async fn find_site(&self, id: Uuid) -> StoreResult<Option<Site>> {
        self.touch();
        Ok(self.tables.read().await.sites.get(&id).cloned())
    }

    async fn list_sites_for_tenant(&self, tenant_id: &str) -> StoreResult<Vec<Site>> {
        self.touch();
        let mut rows: Vec<Site> = self
            .tables
            .read()
            .await
            .sites
            .values()
            .filter(|s| s.tenant_id == tenant_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn insert_site(&self, site: NewSite) -> StoreResult<Site> {
        self.touch();
        self.check_write(Table::Sites)?;
        let row = Site {
            id: site.id,
            tenant_id: site.tenant_id,
            name: site.name,
            location: site.location,
            address: site.address,
            created_at: site.created_at,
            updated_at: site.updated_at,
        };
        self.tables.write().await.sites.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_site(&self, id: Uuid, changes: SiteChangeset) -> StoreResult<Option<Site>> {
        self.touch();
        self.check_write(Table::Sites)?;
        let mut tables = self.tables.write().await;
        let Some(row) = tables.sites.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = changes.name {
            row.name = v;
        }
        if let Some(v) = changes.location {
            row.location = v;
        }
        if let Some(v) = changes.address {
            row.address = v;
        }
        if let Some(v) = changes.updated_at {
            row.updated_at = v;
        }
        Ok(Some(row.clone()))
    }

    async fn delete_site(&self, id: Uuid) -> StoreResult<bool> {
        self.touch();
        self.check_write(Table::Sites)?;
        let mut tables = self.tables.write().await;
        let removed = tables.sites.remove(&id).is_some();
        let orphaned: HashSet<Uuid> = tables
            .value_streams
            .values()
            .filter(|v| v.site_id == id)
            .map(|v| v.id)
            .collect();
        tables.value_streams.retain(|vid, _| !orphaned.contains(vid));
        for profile in tables.profiles.values_mut() {
            if profile.primary_site_id == Some(id) {
                profile.primary_site_id = None;
            }
            if matches!(profile.primary_value_stream_id, Some(v) if orphaned.contains(&v)) {
                profile.primary_value_stream_id = None;
            }
        }
        Ok(removed)
    }

    async fn find_value_stream(&self, id: Uuid) -> StoreResult<Option<ValueStream>> {
        self.touch();
        Ok(self.tables.read().await.value_streams.get(&id).cloned())
    }

    async fn list_value_streams_for_site(&self, site_id: Uuid) -> StoreResult<Vec<ValueStream>> {
        self.touch();
        let mut rows: Vec<ValueStream> = self
            .tables
            .read()
            .await
            .value_streams
            .values()
            .filter(|v| v.site_id == site_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn insert_value_stream(&self, value_stream: NewValueStream) -> StoreResult<ValueStream> {
        self.touch();
        self.check_write(Table::ValueStreams)?;
        let mut tables = self.tables.write().await;
        if !tables.sites.contains_key(&value_stream.site_id) {
            return Err(StoreError::Query("foreign key violation on site_id".into()));
        }
        let row = ValueStream {
            id: value_stream.id,
            site_id: value_stream.site_id,
            tenant_id: value_stream.tenant_id,
            name: value_stream.name,
            description: value_stream.description,
            target_cycle_time: value_stream.target_cycle_time,
            created_at: value_stream.created_at,
            updated_at: value_stream.updated_at,
        };
        tables.value_streams.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_value_stream(
        &self,
        id: Uuid,
        changes: ValueStreamChangeset,
    ) -> StoreResult<Option<ValueStream>> {
        self.touch();
        self.check_write(Table::ValueStreams)?;
        let mut tables = self.tables.write().await;
        let Some(row) = tables.value_streams.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = changes.name {
            row.name = v;
        }
        if let Some(v) = changes.description {
            row.description = v;
        }
        if let Some(v) = changes.target_cycle_time {
            row.target_cycle_time = v;
        }
        if let Some(v) = changes.updated_at {
            row.updated_at = v;
        }
        Ok(Some(row.clone()))
    }

    async fn delete_value_stream(&self, id: Uuid) -> StoreResult<bool> {
        self.touch();
        self.check_write(Table::ValueStreams)?;
        let mut tables = self.tables.write().await;
        let removed = tables.value_streams.remove(&id).is_some();
        for profile in tables.profiles.values_mut() {
            if profile.primary_value_stream_id == Some(id) {
                profile.primary_value_stream_id = None;
            }
        }
        Ok(removed)
    }

    async fn find_contact(&self, id: Uuid) -> StoreResult<Option<Contact>> {
        self.touch();
        Ok(self.tables.read().await.contacts.get(&id).cloned())
    }

    async fn list_contacts_for_owner(&self, owner_id: &str) -> StoreResult<Vec<Contact>> {
        self.touch();
        let mut rows: Vec<Contact> = self
            .tables
            .read()
            .await
            .contacts
            .values()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |c| c.created_at);
        Ok(rows)
    }

    async fn insert_contact(&self, contact: NewContact) -> StoreResult<Contact> {
        self.touch();
        self.check_write(Table::Contacts)?;
        let row = Contact {
            id: contact.id,
            owner_id: contact.owner_id,
            name: contact.name,
            email: contact.email,
            phone: contact.phone,
            notes: contact.notes,
            created_at: contact.created_at,
            updated_at: contact.updated_at,
        };
        self.tables.write().await.contacts.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_contact(
        &self,
        id: Uuid,
        changes: ContactChangeset,
    ) -> StoreResult<Option<Contact>> {
        self.touch();
        self.check_write(Table::Contacts)?;
        let mut tables = self.tables.write().await;
        let Some(row) = tables.contacts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = changes.name {
            row.name = v;
        }
        if let Some(v) = changes.email {
            row.email = v;
        }
        if let Some(v) = changes.phone {
            row.phone = v;
        }
        if let Some(v) = changes.notes {
            row.notes = v;
        }
        if let Some(v) = changes.updated_at {
            row.updated_at = v;
        }
        Ok(Some(row.clone()))
    }

    async fn delete_contact(&self, id: Uuid) -> StoreResult<bool> {
        self.touch();
        self.check_write(Table::Contacts)?;
        Ok(self.tables.write().await.contacts.remove(&id).is_some())
    }

    async fn ping(&self) -> bool {
        true
    }
}

/// Maps fixed tokens to callers.
#[derive(Debug, Default, Clone)]
pub struct StaticSessionOracle {
    callers: HashMap<String, Caller>,
}

impl StaticSessionOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, token: &str, caller: Caller) -> Self {
        self.callers.insert(token.to_string(), caller);
        self
    }
}

#[async_trait]
impl SessionOracle for StaticSessionOracle {
    async fn resolve_caller(&self, ctx: &RequestContext) -> Option<Caller> {
        ctx.token().and_then(|token| self.callers.get(token).cloned())
    }
}

pub fn ctx(token: &str) -> RequestContext {
    RequestContext::with_bearer(token)
}

/// Caller whose active tenant is `tenant_id`.
pub fn tenant_caller(user_id: &str, tenant_id: &str, role: MembershipRole) -> Caller {
    Caller::new(user_id)
        .with_membership(tenant_id, format!("{tenant_id} Inc"), role)
        .with_active_tenant(tenant_id)
}

pub fn test_state(store: Arc<MemoryStore>, oracle: StaticSessionOracle) -> Arc<AppState> {
    Arc::new(AppState::new(AppConfig::default(), store, Arc::new(oracle)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn new_company(tenant_id: &str) -> NewCompany {
        let now = Utc::now();
        NewCompany {
            id: Uuid::new_v4(),
            tenant_id: tenant_id.to_string(),
            name: "Acme".to_string(),
            description: None,
            industry: None,
            created_by: Some("user_1".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_company_tenant_is_unique() {
        let store = MemoryStore::new();
        store.insert_company(new_company("org_1")).await.expect("first");
        let err = store.insert_company(new_company("org_1")).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn test_transaction_rolls_back_on_profile_failure() {
        let store = MemoryStore::new();
        store
            .insert_profile(NewProfile::operator("user_1", Some("org_1".into())))
            .await
            .expect("profile");
        store.fail_writes_to(Table::Profiles);

        let result = store
            .create_company_with_admin(new_company("org_1"), "user_1")
            .await;
        assert!(result.is_err());
        assert_eq!(store.company_count().await, 0);
    }

    #[tokio::test]
    async fn test_lost_insert_race_commits_competing_row() {
        let store = MemoryStore::new();
        store.lose_next_insert_race(Table::Companies);

        let err = store.insert_company(new_company("org_1")).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
        assert_eq!(store.company_count().await, 1);

        store.insert_company(new_company("org_2")).await.expect("race is one-shot");
    }

    #[tokio::test]
    async fn test_transaction_requires_profile() {
        let store = MemoryStore::new();
        let result = store
            .create_company_with_admin(new_company("org_1"), "ghost")
            .await;
        assert!(result.is_err());
        assert_eq!(store.company_count().await, 0);
    }
}
