//! Account operations: registration, login and account lifecycle.

use tracing::{debug, info};

use super::gate::{AuthError, Identity};
use super::password::{hash_password, verify_dummy_password, verify_password, PasswordError};
use super::token::TokenCodec;
use super::validation::{validate_email, validate_login, validate_username};
use crate::db::{NewUser, User, UserRepository};
use crate::{FeedlingError, Result};

/// Registration request data.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    /// Desired username (3-32 letters, digits, `_` or `-`).
    pub username: String,
    /// Login email address.
    pub email: String,
    /// Password (8-128 characters).
    pub password: String,
}

impl RegistrationRequest {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// A user together with a freshly issued session token.
#[derive(Debug, Clone)]
pub struct AccountSession {
    pub user: User,
    pub token: String,
}

/// Register a new user and issue a session token.
///
/// All fields are validated before storage is touched. A duplicate email is
/// reported as [`FeedlingError::Conflict`].
pub async fn register(
    repo: &UserRepository<'_>,
    codec: &TokenCodec,
    request: RegistrationRequest,
) -> Result<AccountSession> {
    let username = request.username.trim().to_string();
    let email = request.email.trim().to_string();

    validate_username(&username)?;
    validate_email(&email)?;
    super::password::validate_password(&request.password)?;

    if repo.email_exists(&email).await? {
        return Err(FeedlingError::Conflict(
            "a user with this email already exists".to_string(),
        ));
    }

    let password = request.password;
    let password_hash = run_blocking(move || hash_password(&password)).await??;

    // The unique index catches a concurrent registration that slipped past the check
    let user = repo
        .create(&NewUser::new(&username, &email, password_hash))
        .await?;

    info!(user_id = user.id, username = %user.username, "New user registered");

    let token = codec.issue(&user)?;
    Ok(AccountSession { user, token })
}

/// Log in with email and password.
///
/// An unknown email is [`FeedlingError::NotFound`]; a wrong password is
/// [`AuthError::BadCredentials`]. Both paths run one Argon2 verification.
pub async fn login(
    repo: &UserRepository<'_>,
    codec: &TokenCodec,
    email: &str,
    password: &str,
) -> Result<AccountSession> {
    validate_login(email, password)?;

    let Some(user) = repo.get_by_email(email.trim()).await? else {
        let password = password.to_string();
        run_blocking(move || verify_dummy_password(&password)).await?;
        debug!("Login for unknown email");
        return Err(FeedlingError::NotFound("user".to_string()));
    };

    let password = password.to_string();
    let hash = user.password.clone();
    run_blocking(move || verify_password(&password, &hash))
        .await?
        .map_err(|e| match e {
            PasswordError::VerificationFailed => {
                debug!(user_id = user.id, "Password mismatch");
                FeedlingError::Auth(AuthError::BadCredentials)
            }
            other => other.into(),
        })?;

    info!(user_id = user.id, "User logged in");

    let token = codec.issue(&user)?;
    Ok(AccountSession { user, token })
}

/// Get the profile of the calling user.
pub async fn me(repo: &UserRepository<'_>, identity: &Identity) -> Result<User> {
    repo.get_by_id(identity.user_id)
        .await?
        .ok_or_else(|| FeedlingError::NotFound("user".to_string()))
}

/// Delete the calling user's account.
///
/// Folders and subscriptions go with it; shared feeds are kept.
pub async fn delete_account(repo: &UserRepository<'_>, identity: &Identity) -> Result<()> {
    if !repo.delete(identity.user_id).await? {
        return Err(FeedlingError::NotFound("user".to_string()));
    }
    info!(user_id = identity.user_id, "Account deleted");
    Ok(())
}

/// Run CPU-heavy password work off the async executor.
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| FeedlingError::Io(std::io::Error::other(e)))
}
