//! Account business logic - registration and login.
//!
//! Passwords are hashed with Argon2 using a random salt and verified against the
//! stored PHC string; plaintext passwords are never persisted or compared.

use crate::{
    entities::{Role, User, user},
    errors::{Error, Result},
};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use sea_orm::{Set, prelude::*};

/// Hashes a password with Argon2 and a fresh salt.
///
/// # Errors
/// Returns [`Error::Validation`] for an empty password and
/// [`Error::PasswordHash`] if the hasher fails.
pub fn hash_password(password: &str) -> Result<String> {
    if password.is_empty() {
        return Err(Error::validation("Password cannot be empty"));
    }
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::PasswordHash {
            message: e.to_string(),
        })
}

/// Checks a password against a stored hash. Malformed hashes never verify.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Finds a user by id.
pub async fn get_user_by_id<C>(db: &C, user_id: i32) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Finds a user by email (case-insensitive).
pub async fn get_user_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Email.eq(normalize_email(email)))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a user with an explicit role. Used by registration and seeding.
///
/// # Errors
/// - [`Error::Validation`] for an empty name, malformed email or empty password
/// - [`Error::EmailTaken`] when the email is already registered
pub async fn create_user(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> Result<user::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Name cannot be empty"));
    }
    let email = normalize_email(email);
    if !email.contains('@') {
        return Err(Error::validation(format!("Invalid email '{email}'")));
    }
    let password_hash = hash_password(password)?;

    let user = user::ActiveModel {
        name: Set(name.to_string()),
        email: Set(email.clone()),
        password_hash: Set(password_hash),
        role: Set(role),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    match user.insert(db).await {
        Ok(created) => Ok(created),
        Err(e) if Error::is_unique_violation(&e) => {
            tracing::warn!("Registration rejected, email already in use");
            Err(Error::EmailTaken { email })
        }
        Err(e) => Err(e.into()),
    }
}

/// Registers a new customer.
#[tracing::instrument(skip(db, password))]
pub async fn register(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    password: &str,
) -> Result<user::Model> {
    let created = create_user(db, name, email, password, Role::Customer).await?;
    tracing::info!(user_id = created.id, "Registered new customer");
    Ok(created)
}

/// Authenticates by email and password.
///
/// # Errors
/// Returns [`Error::InvalidCredentials`] for an unknown email or a wrong password,
/// without revealing which.
pub async fn login(db: &DatabaseConnection, email: &str, password: &str) -> Result<user::Model> {
    let Some(user) = get_user_by_email(db, email).await? else {
        return Err(Error::InvalidCredentials);
    };
    if !verify_password(password, &user.password_hash) {
        tracing::warn!(user_id = user.id, "Login failed");
        return Err(Error::InvalidCredentials);
    }
    Ok(user)
}
