//! Request gate: turns a bearer credential into a per-request identity.

use serde::Serialize;
use thiserror::Error;

use super::token::{SessionClaims, TokenCodec, TokenError};

/// Literal scheme prefix expected in the `Authorization` header.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Authentication and authorization failures.
///
/// Every variant is reported to clients as a plain "unauthorized".
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No credential was supplied.
    #[error("missing authorization")]
    MissingCredential,

    /// The header does not use the bearer scheme.
    #[error("authorization scheme must be Bearer")]
    InvalidScheme,

    /// Email or password did not match.
    #[error("invalid email or password")]
    BadCredentials,

    /// The token failed verification.
    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Identity of the caller, valid for a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
    pub email: String,
}

impl From<SessionClaims> for Identity {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
            email: claims.email,
        }
    }
}

/// Stateless authorizer; every call re-verifies the token.
#[derive(Debug, Clone)]
pub struct RequestGate {
    codec: TokenCodec,
}

impl RequestGate {
    pub fn new(codec: TokenCodec) -> Self {
        Self { codec }
    }

    /// The codec used to verify tokens.
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Authorize a raw `Authorization` header value.
    pub fn authorize(&self, raw_header: Option<&str>) -> Result<Identity, AuthError> {
        let header = raw_header.ok_or(AuthError::MissingCredential)?;
        let token = header
            .strip_prefix(BEARER_PREFIX)
            .ok_or(AuthError::InvalidScheme)?
            .trim();

        let claims = self.codec.verify(token)?;
        Ok(Identity::from(claims))
    }
}
