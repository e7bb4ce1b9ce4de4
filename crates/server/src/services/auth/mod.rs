//! Authentication service.
//!
//! Provides registration, email/password login issuing API tokens, token
//! lookup for the auth extractors, and password changes.

mod error;

pub use error::AuthError;

use std::fmt::Write as _;
use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use regex::Regex;
use sqlx::PgPool;

use foodgram_core::Email;

use crate::db::RepositoryError;
use crate::db::tokens::TokenRepository;
use crate::db::users::{NewUser, UserRepository};
use crate::error::FieldErrors;
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum length of usernames and first/last names.
const MAX_NAME_LENGTH: usize = 150;

/// Usernames that would shadow fixed routes under `/api/users/`.
const RESERVED_USERNAMES: &[&str] = &["me"];

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+\z").expect("Invalid regex"));

/// Registration form as submitted by the client.
#[derive(Debug, Clone, Copy)]
pub struct Registration<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password: &'a str,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: TokenRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens: TokenRepository::new(pool),
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Invalid` with every failing field if the form is invalid.
    /// Returns `AuthError::AlreadyExists` if the email or username is taken.
    pub async fn register(&self, form: &Registration<'_>) -> Result<User, AuthError> {
        let mut errors = FieldErrors::new();

        let email = errors.check("email", Email::parse(form.email));
        if let Err(msg) = validate_username(form.username) {
            errors.add("username", msg);
        }
        if let Err(msg) = validate_name(form.first_name) {
            errors.add("first_name", msg);
        }
        if let Err(msg) = validate_name(form.last_name) {
            errors.add("last_name", msg);
        }
        if let Err(msg) = validate_password(form.password) {
            errors.add("password", msg);
        }

        let Some(email) = email.filter(|_| errors.is_empty()) else {
            return Err(AuthError::Invalid(errors));
        };

        let password_hash = hash_password(form.password)?;

        let user = self
            .users
            .create(&NewUser {
                email: &email,
                username: form.username,
                first_name: form.first_name.trim(),
                last_name: form.last_name.trim(),
                password_hash: &password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(field) => AuthError::AlreadyExists(field),
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    // =========================================================================
    // Tokens
    // =========================================================================

    /// Check credentials and issue a new API token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        let key = generate_token();
        self.tokens.create(&key, user.id).await?;

        tracing::info!(user_id = %user.id, "Token issued");
        Ok(key)
    }

    /// Revoke a token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn logout(&self, key: &str) -> Result<(), AuthError> {
        self.tokens.delete(key).await?;
        Ok(())
    }

    /// Resolve a token to its user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is unknown.
    pub async fn authenticate(&self, key: &str) -> Result<User, AuthError> {
        let user_id = self
            .tokens
            .user_for(key)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)
    }

    // =========================================================================
    // Password change
    // =========================================================================

    /// Change a user's password after checking the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Invalid` if the new password is too weak.
    /// Returns `AuthError::WrongCurrentPassword` if `current_password` doesn't match.
    pub async fn set_password(
        &self,
        user: &User,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if let Err(msg) = validate_password(new_password) {
            return Err(AuthError::Invalid(FieldErrors::single("new_password", msg)));
        }

        let stored = self.users.password_hash_of(user.id).await?;
        verify_password(current_password, &stored)
            .map_err(|_| AuthError::WrongCurrentPassword)?;

        let password_hash = hash_password(new_password)?;
        self.users.set_password_hash(user.id, &password_hash).await?;

        tracing::info!(user_id = %user.id, "Password changed");
        Ok(())
    }
}

/// Generate a 40-character lowercase hex token.
fn generate_token() -> String {
    let bytes: [u8; 20] = rand::random();
    bytes.iter().fold(String::with_capacity(40), |mut key, b| {
        let _ = write!(key, "{b:02x}");
        key
    })
}

fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("this field may not be blank".to_owned());
    }
    if username.chars().count() > MAX_NAME_LENGTH {
        return Err(format!(
            "ensure this field has no more than {MAX_NAME_LENGTH} characters"
        ));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(
            "enter a valid username: letters, digits and @/./+/-/_ only".to_owned(),
        );
    }
    if RESERVED_USERNAMES.contains(&username) {
        return Err(format!("username '{username}' is not allowed"));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("this field may not be blank".to_owned());
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(format!(
            "ensure this field has no more than {MAX_NAME_LENGTH} characters"
        ));
    }
    Ok(())
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        ));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
