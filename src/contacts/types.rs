use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::access::require_text;
use crate::core::shared::action_result::ActionError;
use crate::core::shared::models::{ContactChangeset, NewContact};
use crate::core::shared::utils::{deserialize_some, normalize_optional, normalize_patch};
use crate::core::validation::validate_email;

fn checked_email(email: Option<String>) -> Result<Option<String>, ActionError> {
    let email = normalize_optional(email);
    if let Some(email) = &email {
        validate_email(email)?;
    }
    Ok(email)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateContactRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

impl CreateContactRequest {
    pub fn into_new_contact(self, owner_id: &str) -> Result<NewContact, ActionError> {
        let name = require_text(&self.name, "name")?;
        let email = checked_email(self.email)?;
        let now = Utc::now();
        Ok(NewContact {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            name,
            email,
            phone: normalize_optional(self.phone),
            notes: normalize_optional(self.notes),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Absent fields are left unchanged; `null` or blank clears an optional field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateContactRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

impl UpdateContactRequest {
    pub fn into_changeset(self) -> Result<ContactChangeset, ActionError> {
        let name = self
            .name
            .as_deref()
            .map(|name| require_text(name, "name"))
            .transpose()?;
        Ok(ContactChangeset {
            name,
            email: self.email.map(checked_email).transpose()?,
            phone: normalize_patch(self.phone),
            notes: normalize_patch(self.notes),
            updated_at: Some(Utc::now()),
        })
    }
}
