use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::shared::models::ProfileRole;

/// Self-service profile edit. Tenant and company links are not editable here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub role: Option<ProfileRole>,
    pub primary_site_id: Option<Uuid>,
    pub primary_value_stream_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssociationRequest {
    pub role: Option<ProfileRole>,
    pub primary_site_id: Option<Uuid>,
    pub primary_value_stream_id: Option<Uuid>,
}
