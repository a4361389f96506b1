//! Authentication module for feedling.
//!
//! This module provides password hashing, the session token codec, the
//! request gate and account operations.

mod account;
mod gate;
mod password;
mod token;
pub mod validation;

pub use account::{delete_account, login, me, register, AccountSession, RegistrationRequest};
pub use gate::{AuthError, Identity, RequestGate, BEARER_PREFIX};
pub use password::{hash_password, validate_password, verify_password, PasswordError};
pub use token::{SessionClaims, TokenCodec, TokenError, TOKEN_ALGORITHM};
pub use validation::ValidationError;
