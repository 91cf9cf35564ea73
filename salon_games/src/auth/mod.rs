//! User registration, login and JWT access tokens.
//!
//! Passwords are hashed with Argon2id plus a server-side pepper. Every
//! game operation trusts the numeric user id carried by a verified access
//! token; nothing in the game engine re-checks credentials.

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{AuthError, AuthResult};
pub use manager::AuthManager;
pub use models::{AccessTokenClaims, LoginRequest, RegisterRequest, User};
