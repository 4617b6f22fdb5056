use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::access::require_text;
use crate::core::shared::action_result::ActionError;
use crate::core::shared::models::{NewSite, SiteChangeset};
use crate::core::shared::utils::{deserialize_some, normalize_optional, normalize_patch};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSiteRequest {
    pub name: String,
    pub location: Option<String>,
    pub address: Option<String>,
}

impl CreateSiteRequest {
    pub fn into_new_site(self, tenant_id: &str) -> Result<NewSite, ActionError> {
        let now = Utc::now();
        Ok(NewSite {
            id: Uuid::new_v4(),
            tenant_id: tenant_id.to_string(),
            name: require_text(&self.name, "name")?,
            location: normalize_optional(self.location),
            address: normalize_optional(self.address),
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSiteRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub address: Option<Option<String>>,
}

impl UpdateSiteRequest {
    pub fn into_changeset(self) -> Result<SiteChangeset, ActionError> {
        let name = self
            .name
            .as_deref()
            .map(|name| require_text(name, "name"))
            .transpose()?;
        Ok(SiteChangeset {
            name,
            location: normalize_patch(self.location),
            address: normalize_patch(self.address),
            updated_at: Some(Utc::now()),
        })
    }
}
