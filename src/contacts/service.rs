use std::sync::Arc;
use uuid::Uuid;

use super::types::{CreateContactRequest, UpdateContactRequest};
use crate::config::ContactOwnershipPolicy;
use crate::core::access::require_caller;
use crate::core::session::{Caller, RequestContext, SessionOracle};
use crate::core::shared::action_result::{settle, ActionError, ActionResult};
use crate::core::shared::models::Contact;
use crate::core::shared::state::AppState;
use crate::core::store::Store;

pub struct ContactsService {
    store: Arc<dyn Store>,
    oracle: Arc<dyn SessionOracle>,
    ownership: ContactOwnershipPolicy,
}

impl ContactsService {
    pub fn new(
        store: Arc<dyn Store>,
        oracle: Arc<dyn SessionOracle>,
        ownership: ContactOwnershipPolicy,
    ) -> Self {
        Self {
            store,
            oracle,
            ownership,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            Arc::clone(&state.store),
            Arc::clone(&state.oracle),
            state.config.contacts.ownership,
        )
    }

    pub async fn create_contact(
        &self,
        ctx: &RequestContext,
        request: CreateContactRequest,
    ) -> ActionResult<Contact> {
        settle(
            self.try_create_contact(ctx, request).await,
            "Contact created successfully",
            "Failed to create contact",
        )
    }

    pub async fn get_contact(&self, ctx: &RequestContext, id: Uuid) -> ActionResult<Contact> {
        settle(
            self.try_get_contact(ctx, id).await,
            "Contact retrieved successfully",
            "Failed to get contact",
        )
    }

    /// Only the caller's own contacts, newest first.
    pub async fn list_contacts(&self, ctx: &RequestContext) -> ActionResult<Vec<Contact>> {
        settle(
            self.try_list_contacts(ctx).await,
            "Contacts retrieved successfully",
            "Failed to get contacts",
        )
    }

    pub async fn update_contact(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        request: UpdateContactRequest,
    ) -> ActionResult<Contact> {
        settle(
            self.try_update_contact(ctx, id, request).await,
            "Contact updated successfully",
            "Failed to update contact",
        )
    }

    pub async fn delete_contact(&self, ctx: &RequestContext, id: Uuid) -> ActionResult<()> {
        settle(
            self.try_delete_contact(ctx, id).await,
            "Contact deleted successfully",
            "Failed to delete contact",
        )
    }

    async fn try_create_contact(
        &self,
        ctx: &RequestContext,
        request: CreateContactRequest,
    ) -> Result<Contact, ActionError> {
        let caller = require_caller(self.oracle.as_ref(), ctx, "create a contact").await?;
        let contact = request.into_new_contact(&caller.user_id)?;
        Ok(self.store.insert_contact(contact).await?)
    }

    async fn try_get_contact(&self, ctx: &RequestContext, id: Uuid) -> Result<Contact, ActionError> {
        let caller = require_caller(self.oracle.as_ref(), ctx, "view contacts").await?;
        self.load_for(&caller, id, "view").await
    }

    async fn try_list_contacts(&self, ctx: &RequestContext) -> Result<Vec<Contact>, ActionError> {
        let caller = require_caller(self.oracle.as_ref(), ctx, "view contacts").await?;
        Ok(self.store.list_contacts_for_owner(&caller.user_id).await?)
    }

    async fn try_update_contact(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        request: UpdateContactRequest,
    ) -> Result<Contact, ActionError> {
        let caller = require_caller(self.oracle.as_ref(), ctx, "update a contact").await?;
        self.load_for(&caller, id, "update").await?;
        let changes = request.into_changeset()?;
        self.store
            .update_contact(id, changes)
            .await?
            .ok_or_else(|| ActionError::NotFound("Contact not found".into()))
    }

    async fn try_delete_contact(&self, ctx: &RequestContext, id: Uuid) -> Result<(), ActionError> {
        let caller = require_caller(self.oracle.as_ref(), ctx, "delete a contact").await?;
        self.load_for(&caller, id, "delete").await?;
        if !self.store.delete_contact(id).await? {
            return Err(ActionError::NotFound("Contact not found".into()));
        }
        Ok(())
    }

    async fn load_for(&self, caller: &Caller, id: Uuid, verb: &str) -> Result<Contact, ActionError> {
        let contact = self
            .store
            .find_contact(id)
            .await?
            .ok_or_else(|| ActionError::NotFound("Contact not found".into()))?;

        match self.ownership {
            ContactOwnershipPolicy::Unrestricted => Ok(contact),
            ContactOwnershipPolicy::OwnerOnly if contact.owner_id == caller.user_id => Ok(contact),
            ContactOwnershipPolicy::OwnerOnly => Err(ActionError::Forbidden(format!(
                "You do not have permission to {verb} this contact"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shared::action_result::FailureKind;
    use crate::core::shared::test_utils::{ctx, MemoryStore, StaticSessionOracle, Table};

    fn service(store: Arc<MemoryStore>, policy: ContactOwnershipPolicy) -> ContactsService {
        let oracle = StaticSessionOracle::new()
            .with("tok-ana", Caller::new("user_ana"))
            .with("tok-ben", Caller::new("user_ben"));
        ContactsService::new(store, Arc::new(oracle), policy)
    }

    fn request(name: &str) -> CreateContactRequest {
        CreateContactRequest {
            name: name.to_string(),
            email: Some(format!("{}@example.com", name.to_lowercase())),
            phone: None,
            notes: Some("  ".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_then_get_returns_same_row() {
        let svc = service(Arc::new(MemoryStore::new()), ContactOwnershipPolicy::default());

        let created = svc.create_contact(&ctx("tok-ana"), request("Grace")).await;
        assert_eq!(created.message(), "Contact created successfully");
        let created = created.into_data().expect("contact");
        assert_eq!(created.owner_id, "user_ana");
        assert_eq!(created.email.as_deref(), Some("grace@example.com"));
        assert_eq!(created.notes, None);

        let fetched = svc.get_contact(&ctx("tok-ana"), created.id).await;
        assert_eq!(fetched.into_data(), Some(created));
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let svc = service(Arc::new(MemoryStore::new()), ContactOwnershipPolicy::default());
        let created = svc
            .create_contact(&ctx("tok-ana"), request("Grace"))
            .await
            .into_data()
            .expect("contact");

        let deleted = svc.delete_contact(&ctx("tok-ana"), created.id).await;
        assert!(deleted.is_success());

        let fetched = svc.get_contact(&ctx("tok-ana"), created.id).await;
        assert_eq!(fetched.failure_kind(), Some(FailureKind::NotFound));
        assert_eq!(fetched.message(), "Contact not found");
    }

    #[tokio::test]
    async fn test_list_only_returns_callers_rows() {
        let svc = service(Arc::new(MemoryStore::new()), ContactOwnershipPolicy::default());
        for (token, name) in [
            ("tok-ana", "A1"),
            ("tok-ben", "B1"),
            ("tok-ana", "A2"),
            ("tok-ben", "B2"),
            ("tok-ben", "B3"),
        ] {
            assert!(svc.create_contact(&ctx(token), request(name)).await.is_success());
        }

        let ana = svc.list_contacts(&ctx("tok-ana")).await.into_data().expect("list");
        assert_eq!(ana.len(), 2);
        assert!(ana.iter().all(|c| c.owner_id == "user_ana"));

        let ben = svc.list_contacts(&ctx("tok-ben")).await.into_data().expect("list");
        assert_eq!(ben.len(), 3);
        assert!(ben.iter().all(|c| c.owner_id == "user_ben"));
    }

    #[tokio::test]
    async fn test_unrestricted_policy_allows_other_callers() {
        let svc = service(Arc::new(MemoryStore::new()), ContactOwnershipPolicy::Unrestricted);
        let created = svc
            .create_contact(&ctx("tok-ana"), request("Grace"))
            .await
            .into_data()
            .expect("contact");

        let update = UpdateContactRequest {
            phone: Some(Some("555-0100".to_string())),
            ..Default::default()
        };
        let updated = svc.update_contact(&ctx("tok-ben"), created.id, update).await;
        assert_eq!(updated.data().and_then(|c| c.phone.as_deref()), Some("555-0100"));
        assert!(svc.delete_contact(&ctx("tok-ben"), created.id).await.is_success());
    }

    #[tokio::test]
    async fn test_owner_only_policy_forbids_other_callers() {
        let svc = service(Arc::new(MemoryStore::new()), ContactOwnershipPolicy::OwnerOnly);
        let created = svc
            .create_contact(&ctx("tok-ana"), request("Grace"))
            .await
            .into_data()
            .expect("contact");

        let fetched = svc.get_contact(&ctx("tok-ben"), created.id).await;
        assert_eq!(fetched.failure_kind(), Some(FailureKind::Forbidden));
        assert_eq!(fetched.message(), "You do not have permission to view this contact");

        let deleted = svc.delete_contact(&ctx("tok-ben"), created.id).await;
        assert_eq!(deleted.failure_kind(), Some(FailureKind::Forbidden));

        let renamed = svc
            .update_contact(
                &ctx("tok-ana"),
                created.id,
                UpdateContactRequest {
                    name: Some("Grace H.".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert_eq!(renamed.data().map(|c| c.name.as_str()), Some("Grace H."));
    }

    #[tokio::test]
    async fn test_owner_only_checks_ownership_before_body() {
        let svc = service(Arc::new(MemoryStore::new()), ContactOwnershipPolicy::OwnerOnly);
        let created = svc
            .create_contact(&ctx("tok-ana"), request("Grace"))
            .await
            .into_data()
            .expect("contact");

        let update = UpdateContactRequest {
            email: Some(Some("not-an-email".to_string())),
            ..Default::default()
        };
        let denied = svc.update_contact(&ctx("tok-ben"), created.id, update).await;
        assert_eq!(denied.failure_kind(), Some(FailureKind::Forbidden));
        assert_eq!(denied.message(), "You do not have permission to update this contact");
    }

    #[tokio::test]
    async fn test_update_clears_optional_fields() {
        let svc = service(Arc::new(MemoryStore::new()), ContactOwnershipPolicy::default());
        let mut grace = request("Grace");
        grace.phone = Some("555-0100".to_string());
        grace.notes = Some("Met at the expo".to_string());
        let created = svc
            .create_contact(&ctx("tok-ana"), grace)
            .await
            .into_data()
            .expect("contact");

        let update: UpdateContactRequest = serde_json::from_value(serde_json::json!({
            "email": null,
            "phone": null,
        }))
        .expect("request");
        let updated = svc
            .update_contact(&ctx("tok-ana"), created.id, update)
            .await
            .into_data()
            .expect("contact");
        assert_eq!(updated.email, None);
        assert_eq!(updated.phone, None);
        assert_eq!(updated.notes.as_deref(), Some("Met at the expo"));
    }

    #[tokio::test]
    async fn test_blank_name_is_invalid() {
        let svc = service(Arc::new(MemoryStore::new()), ContactOwnershipPolicy::default());
        let result = svc.create_contact(&ctx("tok-ana"), request("   ")).await;
        assert_eq!(result.failure_kind(), Some(FailureKind::Invalid));
    }

    #[tokio::test]
    async fn test_malformed_email_is_invalid() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(Arc::clone(&store), ContactOwnershipPolicy::default());
        let mut bad = request("Grace");
        bad.email = Some("grace.example.com".to_string());

        let result = svc.create_contact(&ctx("tok-ana"), bad).await;
        assert_eq!(result.failure_kind(), Some(FailureKind::Invalid));
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_is_masked() {
        let store = Arc::new(MemoryStore::new());
        store.fail_writes_to(Table::Contacts);
        let svc = service(Arc::clone(&store), ContactOwnershipPolicy::default());

        let result = svc.create_contact(&ctx("tok-ana"), request("Grace")).await;
        assert_eq!(result.failure_kind(), Some(FailureKind::Internal));
        assert_eq!(result.message(), "Failed to create contact");
    }

    #[tokio::test]
    async fn test_anonymous_caller_never_reaches_store() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(Arc::clone(&store), ContactOwnershipPolicy::default());
        let anon = RequestContext::anonymous();
        let id = Uuid::new_v4();

        let kinds = [
            svc.create_contact(&anon, request("Grace")).await.failure_kind(),
            svc.get_contact(&anon, id).await.failure_kind(),
            svc.list_contacts(&anon).await.failure_kind(),
            svc.update_contact(&anon, id, UpdateContactRequest::default())
                .await
                .failure_kind(),
            svc.delete_contact(&anon, id).await.failure_kind(),
        ];
        assert!(kinds.iter().all(|k| *k == Some(FailureKind::Unauthenticated)));
        assert_eq!(store.call_count(), 0);
    }
}
