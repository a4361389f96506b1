//! Session token codec.
//!
//! Tokens are HS256-signed JWTs carrying the user's identity and an expiry.
//! They are never stored server-side: a token stays valid until its `exp`
//! passes, and there is no revocation list.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::User;
use crate::{FeedlingError, Result};

/// The only accepted signing algorithm.
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

/// Claims embedded in a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User ID.
    #[serde(rename = "id")]
    pub user_id: i64,
    /// Username at issuance.
    pub username: String,
    /// Email at issuance.
    pub email: String,
    /// Issued at (seconds since epoch).
    pub iat: i64,
    /// Expiry (seconds since epoch).
    pub exp: i64,
    /// Unique token ID.
    pub jti: String,
}

/// Token verification failures.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Signature does not match the configured secret.
    #[error("invalid token signature")]
    InvalidSignature,

    /// Token was signed with an algorithm other than HS256.
    #[error("unsupported token algorithm")]
    UnsupportedAlgorithm,

    /// Token expiry has passed.
    #[error("token expired")]
    Expired,

    /// Token is not a well-formed JWT.
    #[error("malformed token")]
    Malformed,
}

/// Issues and verifies session tokens with a symmetric secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry: Duration,
}

impl TokenCodec {
    /// Create a codec from the configured secret and token lifetime.
    ///
    /// Fails with [`FeedlingError::Config`] if the secret is empty.
    pub fn new(secret: &str, expiry_secs: u64) -> Result<Self> {
        if secret.is_empty() {
            return Err(FeedlingError::Config(
                "no JWT secret configured".to_string(),
            ));
        }
        let expiry_secs = i64::try_from(expiry_secs)
            .map_err(|_| FeedlingError::Config("token expiry out of range".to_string()))?;

        let mut validation = Validation::new(TOKEN_ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiry: Duration::seconds(expiry_secs),
        })
    }

    /// Token lifetime in seconds.
    pub fn expiry_secs(&self) -> i64 {
        self.expiry.num_seconds()
    }

    /// Issue a token for a user, valid from now.
    pub fn issue(&self, user: &User) -> Result<String> {
        self.issue_at(user, Utc::now())
    }

    /// Issue a token for a user as if it were issued at `issued_at`.
    pub fn issue_at(&self, user: &User, issued_at: DateTime<Utc>) -> Result<String> {
        let claims = SessionClaims {
            user_id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.expiry).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::new(TOKEN_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| FeedlingError::Config(format!("failed to encode token: {e}")))
    }

    /// Verify a token and return its claims.
    ///
    /// The header algorithm is checked before the signature so that tokens
    /// signed with any other scheme are rejected outright.
    pub fn verify(&self, token: &str) -> std::result::Result<SessionClaims, TokenError> {
        let header = decode_header(token).map_err(|_| TokenError::Malformed)?;
        if header.alg != TOKEN_ALGORITHM {
            return Err(TokenError::UnsupportedAlgorithm);
        }

        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                JwtErrorKind::InvalidSignature => TokenError::InvalidSignature,
                JwtErrorKind::ExpiredSignature => TokenError::Expired,
                JwtErrorKind::InvalidAlgorithm => TokenError::UnsupportedAlgorithm,
                _ => TokenError::Malformed,
            })?;

        // exp must be strictly in the future
        if data.claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("expiry_secs", &self.expiry_secs())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    const SECRET: &str = "test-secret-key-for-tokens";
    const WEEK: u64 = 7 * 24 * 60 * 60;

    fn test_user() -> User {
        User {
            id: 42,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "hash".to_string(),
            created_at: Utc::now(),
        }
    }

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, WEEK).unwrap()
    }

    fn b64(value: &serde_json::Value) -> String {
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(value).unwrap())
    }

    fn valid_payload() -> serde_json::Value {
        let now = Utc::now().timestamp();
        serde_json::json!({
            "id": 42,
            "username": "alice",
            "email": "alice@example.com",
            "iat": now,
            "exp": now + 3600,
            "jti": "x",
        })
    }

    #[test]
    fn test_new_requires_secret() {
        let err = TokenCodec::new("", WEEK).unwrap_err();
        assert!(matches!(err, FeedlingError::Config(_)));
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let codec = codec();
        let user = test_user();

        let token = codec.issue(&user).unwrap();
        let claims = codec.verify(&token).unwrap();

        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.username, user.username);
        assert_eq!(claims.email, user.email);
        assert!(claims.exp > Utc::now().timestamp());
        assert_eq!(claims.exp - claims.iat, WEEK as i64);
    }

    #[test]
    fn test_claims_use_id_field() {
        let codec = codec();
        let token = codec.issue(&test_user()).unwrap();

        let payload = token.split('.').nth(1).unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();
        assert_eq!(json["id"], 42);
        assert_eq!(json["email"], "alice@example.com");
    }

    #[test]
    fn test_tokens_are_unique() {
        let codec = codec();
        let user = test_user();
        assert_ne!(codec.issue(&user).unwrap(), codec.issue(&user).unwrap());
    }

    #[test]
    fn test_expired_token() {
        let codec = codec();
        let issued = Utc::now() - Duration::days(8);
        let token = codec.issue_at(&test_user(), issued).unwrap();

        assert_eq!(codec.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_expired_token_with_short_lifetime() {
        let codec = TokenCodec::new(SECRET, 60).unwrap();
        let token = codec
            .issue_at(&test_user(), Utc::now() - Duration::seconds(61))
            .unwrap();

        assert_eq!(codec.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_wrong_secret() {
        let token = TokenCodec::new("secret-A", WEEK)
            .unwrap()
            .issue(&test_user())
            .unwrap();
        let other = TokenCodec::new("secret-B", WEEK).unwrap();

        assert_eq!(other.verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_tampered_payload() {
        let codec = codec();
        let token = codec.issue(&test_user()).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let mut payload = valid_payload();
        payload["id"] = serde_json::json!(1);
        let forged = format!("{}.{}.{}", parts[0], b64(&payload), parts[2]);

        assert_eq!(codec.verify(&forged), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_other_hmac_algorithm_rejected() {
        let claims = serde_json::from_value::<SessionClaims>(valid_payload()).unwrap();
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(codec().verify(&token), Err(TokenError::UnsupportedAlgorithm));
    }

    #[test]
    fn test_asymmetric_algorithm_rejected() {
        let header = b64(&serde_json::json!({"alg": "RS256", "typ": "JWT"}));
        let token = format!("{}.{}.{}", header, b64(&valid_payload()), "c2lnbmF0dXJl");

        assert_eq!(codec().verify(&token), Err(TokenError::UnsupportedAlgorithm));
    }

    #[test]
    fn test_none_algorithm_rejected() {
        let header = b64(&serde_json::json!({"alg": "none", "typ": "JWT"}));
        let token = format!("{}.{}.", header, b64(&valid_payload()));

        assert!(codec().verify(&token).is_err());
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = codec();
        assert_eq!(codec.verify(""), Err(TokenError::Malformed));
        assert_eq!(codec.verify("not.a.token"), Err(TokenError::Malformed));
        assert_eq!(codec.verify("abc"), Err(TokenError::Malformed));
    }

    #[test]
    fn test_debug_hides_keys() {
        let debug = format!("{:?}", codec());
        assert!(!debug.contains(SECRET));
        assert!(debug.contains("expiry_secs"));
    }
}
