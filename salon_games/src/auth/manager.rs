//! Authentication manager implementation.

use super::{
    errors::{AuthError, AuthResult},
    models::{AccessTokenClaims, LoginRequest, RegisterRequest, User},
};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sqlx::{PgPool, Row};
use std::sync::Arc;

use crate::game::entities::UserId;

/// Authentication manager
#[derive(Clone)]
pub struct AuthManager {
    pool: Arc<PgPool>,
    pepper: String,
    jwt_secret: String,
    access_token_duration: Duration,
}

impl AuthManager {
    /// Create a new authentication manager.
    ///
    /// `pepper` is a server-side secret mixed into every password before
    /// hashing; `jwt_secret` signs access tokens.
    pub fn new(pool: Arc<PgPool>, pepper: String, jwt_secret: String) -> Self {
        Self {
            pool,
            pepper,
            jwt_secret,
            access_token_duration: Duration::hours(24),
        }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// * `AuthError::UsernameTaken` - Username already exists
    /// * `AuthError::InvalidUsername` - Username format invalid
    /// * `AuthError::WeakPassword` - Password too weak
    pub async fn register(&self, request: RegisterRequest) -> AuthResult<User> {
        self.validate_username(&request.username)?;
        self.validate_password(&request.password)?;

        let existing = sqlx::query("SELECT id FROM users WHERE username = $1")
            .bind(&request.username)
            .fetch_optional(self.pool.as_ref())
            .await?;
        if existing.is_some() {
            return Err(AuthError::UsernameTaken);
        }

        // Hash password with Argon2id + pepper
        let password_hash = self.hash_password(&request.password)?;

        let row = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, display_name)
            VALUES ($1, $2, $3)
            RETURNING id, username, display_name, created_at, last_login
            "#,
        )
        .bind(&request.username)
        .bind(&password_hash)
        .bind(&request.display_name)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(User {
            id: row.get("id"),
            username: row.get("username"),
            display_name: row.get("display_name"),
            created_at: row.get("created_at"),
            last_login: row.get("last_login"),
        })
    }

    /// Login a user, returning the user and a signed access token.
    ///
    /// # Errors
    ///
    /// * `AuthError::UserNotFound` - User doesn't exist
    /// * `AuthError::InvalidPassword` - Incorrect password
    pub async fn login(&self, request: LoginRequest) -> AuthResult<(User, String)> {
        let row = sqlx::query(
            r#"
            SELECT id, username, password_hash, display_name, created_at, last_login
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(&request.username)
        .fetch_optional(self.pool.as_ref())
        .await?
        .ok_or(AuthError::UserNotFound)?;

        let password_hash: String = row.get("password_hash");
        self.verify_password(&request.password, &password_hash)?;

        let user = User {
            id: row.get("id"),
            username: row.get("username"),
            display_name: row.get("display_name"),
            created_at: row.get("created_at"),
            last_login: row.get("last_login"),
        };

        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(user.id)
            .execute(self.pool.as_ref())
            .await?;

        let token = self.generate_access_token(user.id, &user.username)?;
        Ok((user, token))
    }

    /// Verify an access token and return its claims.
    pub fn verify_access_token(&self, token: &str) -> AuthResult<AccessTokenClaims> {
        let token_data = decode::<AccessTokenClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Hash password with Argon2id + pepper
    fn hash_password(&self, password: &str) -> AuthResult<String> {
        let peppered = format!("{}{}", password, self.pepper);
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        Ok(argon2
            .hash_password(peppered.as_bytes(), &salt)
            .map_err(|_| AuthError::HashingFailed)?
            .to_string())
    }

    /// Verify password against hash
    fn verify_password(&self, password: &str, hash: &str) -> AuthResult<()> {
        let peppered = format!("{}{}", password, self.pepper);
        let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidPassword)?;
        let argon2 = Argon2::default();

        argon2
            .verify_password(peppered.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::InvalidPassword)
    }

    /// Generate JWT access token
    fn generate_access_token(&self, user_id: UserId, username: &str) -> AuthResult<String> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: user_id,
            username: username.to_string(),
            exp: (now + self.access_token_duration).timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;
        Ok(token)
    }

    fn validate_username(&self, username: &str) -> AuthResult<()> {
        if username.len() < 3 || username.len() > 32 {
            return Err(AuthError::InvalidUsername(
                "must be 3-32 characters".to_string(),
            ));
        }
        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(AuthError::InvalidUsername(
                "only letters, digits and underscores allowed".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_password(&self, password: &str) -> AuthResult<()> {
        if password.len() < 8 {
            return Err(AuthError::WeakPassword(
                "must be at least 8 characters".to_string(),
            ));
        }
        Ok(())
    }
}
