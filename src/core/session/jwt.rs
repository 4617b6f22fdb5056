use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::{Caller, MembershipRole, RequestContext, SessionOracle, TenantMembership};
use crate::config::AuthConfig;

/// Claims carried by identity provider session tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub exp: usize,
    /// Active organization selected in the session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_role: Option<String>,
    #[serde(default)]
    pub org_memberships: Vec<MembershipClaim>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipClaim {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub role: String,
}

impl SessionClaims {
    pub fn into_caller(self) -> Caller {
        let mut memberships: Vec<TenantMembership> = self
            .org_memberships
            .into_iter()
            .map(|m| TenantMembership {
                tenant_id: m.id,
                tenant_name: m.name,
                role: MembershipRole::parse(&m.role),
            })
            .collect();

        // Short-form tokens only describe the active organization.
        if let (Some(org_id), Some(org_role)) = (&self.org_id, &self.org_role) {
            if !memberships.iter().any(|m| &m.tenant_id == org_id) {
                memberships.push(TenantMembership {
                    tenant_id: org_id.clone(),
                    tenant_name: self.org_name.clone(),
                    role: MembershipRole::parse(org_role),
                });
            }
        }

        Caller {
            user_id: self.sub,
            active_tenant_id: self.org_id,
            memberships,
        }
    }
}

/// Verifies session tokens locally with the provider's signing key.
///
/// Without a configured key every request resolves to no caller.
#[derive(Clone)]
pub struct JwtSessionOracle {
    key: Option<(DecodingKey, Algorithm)>,
}

impl JwtSessionOracle {
    pub fn new(config: &AuthConfig) -> Self {
        let key = config.jwt_secret.as_deref().and_then(|secret| {
            let key = Self::decoding_key(secret);
            if key.is_none() {
                warn!("Configured session key could not be parsed; all requests will be anonymous");
            }
            key
        });
        Self { key }
    }

    pub fn from_secret(secret: &str) -> Self {
        Self {
            key: Self::decoding_key(secret),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.key.is_some()
    }

    fn decoding_key(secret: &str) -> Option<(DecodingKey, Algorithm)> {
        if secret.contains("-----BEGIN") {
            DecodingKey::from_rsa_pem(secret.as_bytes())
                .ok()
                .map(|key| (key, Algorithm::RS256))
        } else {
            Some((DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256))
        }
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
        let Some((key, algorithm)) = &self.key else {
            return Err(jsonwebtoken::errors::ErrorKind::InvalidKeyFormat.into());
        };

        let mut validation = Validation::new(*algorithm);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["sub", "exp"]);

        decode::<SessionClaims>(token, key, &validation).map(|data| data.claims)
    }
}

#[async_trait]
impl SessionOracle for JwtSessionOracle {
    async fn resolve_caller(&self, ctx: &RequestContext) -> Option<Caller> {
        let token = ctx.token()?;

        match self.verify(token) {
            Ok(claims) if !claims.sub.trim().is_empty() => Some(claims.into_caller()),
            Ok(_) => {
                debug!("Session token has an empty subject");
                None
            }
            Err(e) => {
                debug!("Session token rejected: {e}");
                None
            }
        }
    }
}
