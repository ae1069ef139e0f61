//! User identity: email normalization, password hashing and the user factory
//! operations.
//!
//! Emails are case-folded as a whole (`test@TEST.com` becomes
//! `test@test.com`), so lookups by email always go through
//! [`normalize_email`] first.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        rand_core::{OsRng, RngCore},
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set, SqlErr,
};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use validator::ValidateEmail;

use crate::entities::user;

/// Length in bytes of a token key before hex encoding.
const TOKEN_KEY_BYTES: usize = 20;

/// Errors raised while creating or mutating user identities.
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Users must have an email address")]
    MissingEmail,

    #[error("Enter a valid email address: '{0}'")]
    InvalidEmail(String),

    #[error("A user with email '{0}' already exists")]
    EmailTaken(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Case-folds an email address and strips surrounding whitespace.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Normalizes `email` and checks that it is present and well formed.
pub fn clean_email(email: &str) -> Result<String, IdentityError> {
    let normalized = normalize_email(email);
    if normalized.is_empty() {
        return Err(IdentityError::MissingEmail);
    }
    if !normalized.validate_email() {
        return Err(IdentityError::InvalidEmail(normalized));
    }
    Ok(normalized)
}

/// Hash a password using Argon2id with a random salt.
pub fn hash_password(password: &str) -> Result<String, IdentityError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| IdentityError::PasswordHash(e.to_string()))
}

/// Verify a password against a stored PHC hash. Empty passwords never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    if password.is_empty() {
        return false;
    }
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Generates a 40 character lowercase hex token key.
pub fn generate_token_key() -> String {
    let mut bytes = [0u8; TOKEN_KEY_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Creates a regular user. The email is normalized and the password hashed
/// before anything is written.
#[instrument(skip(db, password))]
pub async fn create_user<C: ConnectionTrait>(
    db: &C,
    email: &str,
    password: &str,
    name: Option<&str>,
) -> Result<user::Model, IdentityError> {
    insert_user(db, email, password, name.unwrap_or_default(), false).await
}

/// Creates a user with both the staff and superuser flags set.
#[instrument(skip(db, password))]
pub async fn create_superuser<C: ConnectionTrait>(
    db: &C,
    email: &str,
    password: &str,
) -> Result<user::Model, IdentityError> {
    insert_user(db, email, password, "", true).await
}

async fn insert_user<C: ConnectionTrait>(
    db: &C,
    email: &str,
    password: &str,
    name: &str,
    privileged: bool,
) -> Result<user::Model, IdentityError> {
    let email = clean_email(email)?;

    if find_by_email(db, &email).await?.is_some() {
        warn!("Refusing to create duplicate user {}", email);
        return Err(IdentityError::EmailTaken(email));
    }

    let mut new_user = user::ActiveModel {
        email: Set(email.clone()),
        name: Set(name.to_string()),
        is_active: Set(true),
        is_staff: Set(privileged),
        is_superuser: Set(privileged),
        ..Default::default()
    };
    new_user.set_password(password)?;

    match new_user.insert(db).await {
        Ok(created) => {
            info!("Created user {} (superuser: {})", created.id, privileged);
            Ok(created)
        }
        Err(db_err) => match db_err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Err(IdentityError::EmailTaken(email)),
            _ => Err(db_err.into()),
        },
    }
}

/// Looks a user up by email, normalizing the input first.
pub async fn find_by_email<C: ConnectionTrait>(
    db: &C,
    email: &str,
) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find()
        .filter(user::Column::Email.eq(normalize_email(email)))
        .one(db)
        .await
}

/// Returns the matching active user when the credentials check out.
#[instrument(skip(db, password))]
pub async fn authenticate<C: ConnectionTrait>(
    db: &C,
    email: &str,
    password: &str,
) -> Result<Option<user::Model>, DbErr> {
    if password.is_empty() {
        debug!("Rejecting login with empty password");
        return Ok(None);
    }

    let Some(user) = find_by_email(db, email).await? else {
        debug!("No user registered for {}", normalize_email(email));
        return Ok(None);
    };

    if !user.is_active || !user.check_password(password) {
        debug!("Credentials rejected for user {}", user.id);
        return Ok(None);
    }

    Ok(Some(user))
}
