use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::access::require_text;
use crate::core::shared::action_result::ActionError;
use crate::core::shared::models::{CompanyChangeset, NewCompany};
use crate::core::shared::utils::{deserialize_some, normalize_optional, normalize_patch};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateCompanyRequest {
    pub name: String,
    pub description: Option<String>,
    pub industry: Option<String>,
}

impl CreateCompanyRequest {
    pub fn into_new_company(
        self,
        tenant_id: &str,
        created_by: &str,
    ) -> Result<NewCompany, ActionError> {
        let now = Utc::now();
        Ok(NewCompany {
            id: Uuid::new_v4(),
            tenant_id: tenant_id.to_string(),
            name: require_text(&self.name, "name")?,
            description: normalize_optional(self.description),
            industry: normalize_optional(self.industry),
            created_by: Some(created_by.to_string()),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Absent fields are left unchanged; `null` clears an optional field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCompanyRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub industry: Option<Option<String>>,
}

impl UpdateCompanyRequest {
    pub fn into_changeset(self) -> Result<CompanyChangeset, ActionError> {
        let name = self
            .name
            .as_deref()
            .map(|name| require_text(name, "name"))
            .transpose()?;
        Ok(CompanyChangeset {
            name,
            description: normalize_patch(self.description),
            industry: normalize_patch(self.industry),
            updated_at: Some(Utc::now()),
        })
    }
}
