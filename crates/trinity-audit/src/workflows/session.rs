//! Authenticated caller identity. Token issuance lives outside this crate; the
//! HTTP layer only needs something that turns a bearer token back into a principal.

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};

/// Portal roles carried in the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    College,
    Admin,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "college" => Some(Self::College),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Role::College => "college",
            Role::Admin => "admin",
        }
    }
}

/// Claims decoded from a verified session: `{id, role, email}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub role: Role,
    pub email: String,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Verifies an opaque bearer token.
pub trait SessionVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Principal, SessionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("missing session token")]
    Missing,
    #[error("session token is invalid or expired")]
    Invalid,
}

/// Pulls the token from `Authorization: Bearer` or the `token` cookie.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    if let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    {
        if let Some(token) = value.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Some(token);
            }
        }
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == "token" && !value.is_empty())
        .map(|(_, value)| value)
}

/// Resolves the caller for a request.
pub fn authenticate(
    verifier: &dyn SessionVerifier,
    headers: &HeaderMap,
) -> Result<Principal, SessionError> {
    let token = bearer_token(headers).ok_or(SessionError::Missing)?;
    verifier.verify(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_bearer_header_before_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("token=cookie"));
        assert_eq!(bearer_token(&headers), Some("abc"));
    }

    #[test]
    fn falls_back_to_token_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; token=xyz"),
        );
        assert_eq!(bearer_token(&headers), Some("xyz"));
    }

    #[test]
    fn missing_token_is_reported() {
        struct Never;
        impl SessionVerifier for Never {
            fn verify(&self, _token: &str) -> Result<Principal, SessionError> {
                Err(SessionError::Invalid)
            }
        }

        let headers = HeaderMap::new();
        assert!(matches!(
            authenticate(&Never, &headers),
            Err(SessionError::Missing)
        ));
    }
}
