use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::schema::{companies, contacts, profiles, sites, value_streams};

/// Role stored on a profile. Persisted as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProfileRole {
    Admin,
    Supervisor,
    #[default]
    Operator,
}

impl ProfileRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Supervisor => "supervisor",
            Self::Operator => "operator",
        }
    }

    /// Admins and supervisors may look at profiles other than their own.
    pub fn can_view_other_profiles(&self) -> bool {
        matches!(self, Self::Admin | Self::Supervisor)
    }
}

impl std::fmt::Display for ProfileRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProfileRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "supervisor" => Ok(Self::Supervisor),
            "operator" => Ok(Self::Operator),
            other => Err(format!("unknown profile role: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = profiles)]
#[diesel(primary_key(user_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Profile {
    pub user_id: String,
    pub tenant_id: Option<String>,
    pub company_id: Option<Uuid>,
    pub role: String,
    pub primary_site_id: Option<Uuid>,
    pub primary_value_stream_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Unknown role text degrades to the least privileged role.
    pub fn role(&self) -> ProfileRole {
        self.role.parse().unwrap_or_default()
    }

    pub fn is_admin_of(&self, company_id: Uuid) -> bool {
        self.company_id == Some(company_id) && self.role() == ProfileRole::Admin
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = profiles)]
pub struct NewProfile {
    pub user_id: String,
    pub tenant_id: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewProfile {
    pub fn operator(user_id: &str, tenant_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.to_string(),
            tenant_id,
            role: ProfileRole::Operator.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// `None` fields are left untouched.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = profiles)]
pub struct ProfileChangeset {
    pub tenant_id: Option<String>,
    pub company_id: Option<Uuid>,
    pub role: Option<String>,
    pub primary_site_id: Option<Uuid>,
    pub primary_value_stream_id: Option<Uuid>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = companies)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Company {
    pub id: Uuid,
    pub tenant_id: String,
    pub name: String,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    pub fn is_created_by(&self, user_id: &str) -> bool {
        self.created_by.as_deref() == Some(user_id)
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = companies)]
pub struct NewCompany {
    pub id: Uuid,
    pub tenant_id: String,
    pub name: String,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `None` leaves a column untouched; `Some(None)` writes NULL.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = companies)]
pub struct CompanyChangeset {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub industry: Option<Option<String>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = sites)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Site {
    pub id: Uuid,
    pub tenant_id: String,
    pub name: String,
    pub location: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sites)]
pub struct NewSite {
    pub id: Uuid,
    pub tenant_id: String,
    pub name: String,
    pub location: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = sites)]
pub struct SiteChangeset {
    pub name: Option<String>,
    pub location: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = value_streams)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ValueStream {
    pub id: Uuid,
    pub site_id: Uuid,
    pub tenant_id: String,
    pub name: String,
    pub description: Option<String>,
    pub target_cycle_time: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = value_streams)]
pub struct NewValueStream {
    pub id: Uuid,
    pub site_id: Uuid,
    pub tenant_id: String,
    pub name: String,
    pub description: Option<String>,
    pub target_cycle_time: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = value_streams)]
pub struct ValueStreamChangeset {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub target_cycle_time: Option<Option<String>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = contacts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Contact {
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = contacts)]
pub struct NewContact {
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = contacts)]
pub struct ContactChangeset {
    pub name: Option<String>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_role_round_trip_text() {
        assert_eq!("admin".parse::<ProfileRole>(), Ok(ProfileRole::Admin));
        assert_eq!(" Supervisor ".parse::<ProfileRole>(), Ok(ProfileRole::Supervisor));
        assert_eq!(ProfileRole::Operator.to_string(), "operator");
        assert!("owner".parse::<ProfileRole>().is_err());
    }

    #[test]
    fn test_unknown_stored_role_is_operator() {
        let now = Utc::now();
        let profile = Profile {
            user_id: "user_1".to_string(),
            tenant_id: None,
            company_id: None,
            role: "superuser".to_string(),
            primary_site_id: None,
            primary_value_stream_id: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(profile.role(), ProfileRole::Operator);
        assert!(!profile.role().can_view_other_profiles());
    }

    #[test]
    fn test_is_admin_of_requires_matching_company() {
        let now = Utc::now();
        let company_id = Uuid::new_v4();
        let profile = Profile {
            user_id: "user_1".to_string(),
            tenant_id: Some("org_1".to_string()),
            company_id: Some(company_id),
            role: "admin".to_string(),
            primary_site_id: None,
            primary_value_stream_id: None,
            created_at: now,
            updated_at: now,
        };
        assert!(profile.is_admin_of(company_id));
        assert!(!profile.is_admin_of(Uuid::new_v4()));
    }
}
