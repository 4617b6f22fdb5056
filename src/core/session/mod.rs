//! Caller identity as reported by the external identity provider.
//!
//! The data access layer never authenticates on its own: it hands the raw
//! request credentials to a [`SessionOracle`] and trusts whatever comes back.
//! An absent caller always fails closed.

mod jwt;

pub use jwt::{JwtSessionOracle, MembershipClaim, SessionClaims};

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};

/// Role the identity provider assigns inside one organization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipRole {
    Admin,
    BasicMember,
    Other(String),
}

impl MembershipRole {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" | "org:admin" => Self::Admin,
            "basic_member" | "member" | "org:member" | "org:basic_member" => Self::BasicMember,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn can_edit_tenant_records(&self) -> bool {
        matches!(self, Self::Admin | Self::BasicMember)
    }

    pub fn can_delete_tenant_records(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantMembership {
    pub tenant_id: String,
    /// Not every token carries the organization's display name.
    pub tenant_name: Option<String>,
    pub role: MembershipRole,
}

impl TenantMembership {
    /// The display name, or `None` when it is missing or blank.
    pub fn display_name(&self) -> Option<&str> {
        self.tenant_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: String,
    pub active_tenant_id: Option<String>,
    pub memberships: Vec<TenantMembership>,
}

impl Caller {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            active_tenant_id: None,
            memberships: Vec::new(),
        }
    }

    pub fn with_membership(
        mut self,
        tenant_id: impl Into<String>,
        tenant_name: impl Into<String>,
        role: MembershipRole,
    ) -> Self {
        self.memberships.push(TenantMembership {
            tenant_id: tenant_id.into(),
            tenant_name: Some(tenant_name.into()),
            role,
        });
        self
    }

    pub fn with_active_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.active_tenant_id = Some(tenant_id.into());
        self
    }

    pub fn membership(&self, tenant_id: &str) -> Option<&TenantMembership> {
        self.memberships.iter().find(|m| m.tenant_id == tenant_id)
    }

    /// The membership for the active tenant. A selected tenant the caller is
    /// not actually a member of counts as no active tenant.
    pub fn active_membership(&self) -> Option<&TenantMembership> {
        self.active_tenant_id
            .as_deref()
            .and_then(|tenant_id| self.membership(tenant_id))
    }
}

/// Raw credentials carried by the current request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub bearer_token: Option<String>,
    pub session_cookie: Option<String>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_bearer(token: impl Into<String>) -> Self {
        Self {
            bearer_token: Some(token.into()),
            session_cookie: None,
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::from_headers_with(headers, "Bearer ", "__session")
    }

    pub fn from_headers_with(headers: &HeaderMap, bearer_prefix: &str, cookie_name: &str) -> Self {
        let bearer_token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix(bearer_prefix))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let session_cookie = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == cookie_name)
            .map(|(_, value)| value.to_string())
            .filter(|v| !v.is_empty());

        Self {
            bearer_token,
            session_cookie,
        }
    }

    /// Header token wins over the cookie.
    pub fn token(&self) -> Option<&str> {
        self.bearer_token
            .as_deref()
            .or(self.session_cookie.as_deref())
    }
}

#[async_trait]
pub trait SessionOracle: Send + Sync {
    /// `None` means no identity could be established for this request.
    async fn resolve_caller(&self, ctx: &RequestContext) -> Option<Caller>;
}
