//! Authentication API handlers.
//!
//! Register a new user:
//! ```bash
//! curl -X POST http://localhost:3000/api/v1/auth/register \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "player1", "password": "Pass123!", "display_name": "Player One"}'
//! ```
//!
//! Login:
//! ```bash
//! curl -X POST http://localhost:3000/api/v1/auth/login \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "player1", "password": "Pass123!"}'
//! ```

use axum::{Json, extract::State, http::StatusCode};
use salon_games::auth::{AuthError, LoginRequest, RegisterRequest};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::metrics;

#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    pub username: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub user_id: i64,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn auth_error_response(e: AuthError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &e {
        AuthError::UserNotFound | AuthError::InvalidPassword => StatusCode::UNAUTHORIZED,
        AuthError::Database(_) | AuthError::HashingFailed | AuthError::JwtError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => StatusCode::BAD_REQUEST,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.client_message(),
        }),
    )
}

/// Register a new user account and automatically log them in.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<Json<AuthResponse>, (StatusCode, Json<ErrorResponse>)> {
    let request = RegisterRequest {
        username: payload.username.clone(),
        password: payload.password.clone(),
        display_name: payload.display_name,
    };

    state
        .auth_manager
        .register(request)
        .await
        .map_err(auth_error_response)?;

    let (user, token) = state
        .auth_manager
        .login(LoginRequest {
            username: payload.username,
            password: payload.password,
        })
        .await
        .map_err(auth_error_response)?;

    Ok(Json(AuthResponse {
        access_token: token,
        user_id: user.id,
        username: user.username,
    }))
}

/// Login with username and password, returning an access token.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<AuthResponse>, (StatusCode, Json<ErrorResponse>)> {
    let result = state
        .auth_manager
        .login(LoginRequest {
            username: payload.username,
            password: payload.password,
        })
        .await;

    metrics::login_attempts_total(result.is_ok());

    let (user, token) = result.map_err(auth_error_response)?;
    Ok(Json(AuthResponse {
        access_token: token,
        user_id: user.id,
        username: user.username,
    }))
}
