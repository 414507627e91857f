use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Signed link tokens expire after seven days.
pub const LINK_TOKEN_TTL_DAYS: i64 = 7;

/// What a link token authorizes. The kind is checked by every handler
/// before any claim is trusted; a chat token can never drive a
/// proceed/pass decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkTokenKind {
    /// Host reviewing a shortlisted nanny's CV.
    HostReview,
    /// Nanny reviewing a match made for them.
    NannyReview,
    /// Nanny picking an interview slot.
    Interview,
    /// Either party opening the conversation.
    Chat,
}

/// Claims carried by a link token. The acting party may not be logged
/// in (they clicked an emailed link), so these claims are the whole
/// authorization context; nothing is re-derived from a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkClaims {
    pub kind: LinkTokenKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nanny_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortlist_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    pub exp: i64,
}

impl LinkClaims {
    pub fn new(kind: LinkTokenKind) -> Self {
        Self {
            kind,
            match_id: None,
            host_id: None,
            nanny_id: None,
            shortlist_id: None,
            room_id: None,
            exp: (Utc::now() + Duration::days(LINK_TOKEN_TTL_DAYS)).timestamp(),
        }
    }

    pub fn for_match(kind: LinkTokenKind, match_id: impl Into<String>) -> Self {
        Self {
            match_id: Some(match_id.into()),
            ..Self::new(kind)
        }
    }

    pub fn with_host(mut self, host_id: impl Into<String>) -> Self {
        self.host_id = Some(host_id.into());
        self
    }

    pub fn with_nanny(mut self, nanny_id: impl Into<String>) -> Self {
        self.nanny_id = Some(nanny_id.into());
        self
    }

    pub fn with_shortlist(mut self, shortlist_id: impl Into<String>) -> Self {
        self.shortlist_id = Some(shortlist_id.into());
        self
    }

    pub fn with_room(mut self, room_id: impl Into<String>) -> Self {
        self.room_id = Some(room_id.into());
        self
    }
}

/// Validation failures collapse to one variant on purpose: callers
/// surface an identical error whether the signature, expiry or shape
/// was wrong, so the response leaks nothing about which check failed.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

pub fn issue_link_token(secret: &str, claims: &LinkClaims) -> Result<String, TokenError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(TokenError::Invalid)
}

/// Verify signature and expiry, returning the embedded claims. The
/// caller still has to check the kind and record bindings.
pub fn validate_link_token(secret: &str, token: &str) -> Result<LinkClaims, TokenError> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<LinkClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(TokenError::Invalid)
}
