use axum::async_trait;
use axum::extract::FromRef;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::error::ApiError;

/// Role carried by a session token. Matchmakers are staff and may act
/// on behalf of any host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionRole {
    Host,
    Nanny,
    Matchmaker,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub session_secret: String,
    pub link_secret: String,
}

/// Authenticated session user. The subject is the profile-store record
/// id of the host or nanny (or a staff id for matchmakers).
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub subject: String,
    pub role: SessionRole,
}

#[derive(Debug, Deserialize)]
struct SessionClaims {
    sub: String,
    role: SessionRole,
    #[allow(dead_code)]
    exp: usize,
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    AuthConfig: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AuthConfig::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing Authorization header".into()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("expected Bearer token".into()))?;

        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(config.session_secret.as_bytes()),
            &validation,
        )
        .map_err(|err| ApiError::Unauthorized(format!("invalid session token: {err}")))?;

        Ok(SessionUser {
            subject: data.claims.sub,
            role: data.claims.role,
        })
    }
}

impl SessionUser {
    /// Hosts may only act on their own record; matchmakers on any.
    pub fn authorize_host(&self, host_id: &str) -> Result<(), ApiError> {
        match self.role {
            SessionRole::Matchmaker => Ok(()),
            SessionRole::Host if self.subject == host_id => Ok(()),
            _ => Err(ApiError::Forbidden("not allowed for this host".into())),
        }
    }

    pub fn is_nanny(&self, nanny_id: &str) -> bool {
        self.role == SessionRole::Nanny && self.subject == nanny_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: SessionRole, subject: &str) -> SessionUser {
        SessionUser {
            subject: subject.into(),
            role,
        }
    }

    #[test]
    fn hosts_act_on_their_own_record_only() {
        assert!(user(SessionRole::Host, "recHost1").authorize_host("recHost1").is_ok());
        assert!(user(SessionRole::Host, "recHost1").authorize_host("recHost2").is_err());
        assert!(user(SessionRole::Nanny, "recNanny1").authorize_host("recHost1").is_err());
    }

    #[test]
    fn matchmakers_act_on_any_host() {
        assert!(user(SessionRole::Matchmaker, "staff1").authorize_host("recHost9").is_ok());
    }

    #[test]
    fn nanny_identity_requires_role_and_subject() {
        assert!(user(SessionRole::Nanny, "recNanny1").is_nanny("recNanny1"));
        assert!(!user(SessionRole::Nanny, "recNanny1").is_nanny("recNanny2"));
        assert!(!user(SessionRole::Host, "recNanny1").is_nanny("recNanny1"));
    }
}
