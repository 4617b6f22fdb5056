use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::access::require_text;
use crate::core::shared::action_result::ActionError;
use crate::core::shared::models::{NewValueStream, Site, ValueStreamChangeset};
use crate::core::shared::utils::{deserialize_some, normalize_optional, normalize_patch};
use crate::core::validation::validate_cycle_time;

fn checked_cycle_time(value: Option<String>) -> Result<Option<String>, ActionError> {
    let value = normalize_optional(value);
    if let Some(value) = &value {
        validate_cycle_time(value)?;
    }
    Ok(value)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateValueStreamRequest {
    pub name: String,
    pub description: Option<String>,
    /// `HH:MM:SS`
    pub target_cycle_time: Option<String>,
}

impl CreateValueStreamRequest {
    /// The new stream inherits the tenant of its site.
    pub fn into_new_value_stream(self, site: &Site) -> Result<NewValueStream, ActionError> {
        let name = require_text(&self.name, "name")?;
        let target_cycle_time = checked_cycle_time(self.target_cycle_time)?;
        let now = Utc::now();
        Ok(NewValueStream {
            id: Uuid::new_v4(),
            site_id: site.id,
            tenant_id: site.tenant_id.clone(),
            name,
            description: normalize_optional(self.description),
            target_cycle_time,
            created_at: now,
            updated_at: now,
        })
    }
}

/// `null` clears `description` or `target_cycle_time`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateValueStreamRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub target_cycle_time: Option<Option<String>>,
}

impl UpdateValueStreamRequest {
    pub fn into_changeset(self) -> Result<ValueStreamChangeset, ActionError> {
        let name = self
            .name
            .as_deref()
            .map(|name| require_text(name, "name"))
            .transpose()?;
        Ok(ValueStreamChangeset {
            name,
            description: normalize_patch(self.description),
            target_cycle_time: self.target_cycle_time.map(checked_cycle_time).transpose()?,
            updated_at: Some(Utc::now()),
        })
    }
}
