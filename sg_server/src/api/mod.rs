//! HTTP API for the game server.
//!
//! REST endpoints over the game engine. Clients poll status endpoints;
//! there is no push channel.
//!
//! # Endpoints Overview
//!
//! ## Authentication (No Auth Required)
//! - `POST /api/v1/auth/register` - Register new user
//! - `POST /api/v1/auth/login` - Login with credentials
//!
//! ## Games (Auth Required)
//! - `POST /api/v1/games` - Create a game
//! - `POST /api/v1/games/join` - Join by code
//! - `POST /api/v1/games/{id}/ready` - Ready up
//! - `GET  /api/v1/games/{id}/lobby` - Lobby status
//! - `GET  /api/v1/games/{id}/status` - Gameplay status
//! - `POST /api/v1/games/{id}/start` - Start (lotería host)
//! - `POST /api/v1/games/{id}/surrender` - Leave or concede
//! - `POST /api/v1/games/{id}/rematch` - Request rematch
//! - `POST /api/v1/games/{id}/attack` - Battleship attack
//! - `POST /api/v1/games/{id}/colors` - Simon says palette commit
//! - `POST /api/v1/games/{id}/choose-color` - Simon says color choice
//! - `POST /api/v1/games/{id}/play-color` - Simon says sequence play
//! - `POST /api/v1/games/{id}/card` - Lotería table generation
//! - `POST /api/v1/games/{id}/draw` - Lotería card draw
//! - `POST /api/v1/games/{id}/process-card` - Lotería card processing
//! - `POST /api/v1/games/{id}/reshuffle` - Lotería reshuffle
//! - `POST /api/v1/games/{id}/token` - Lotería token placement
//! - `POST /api/v1/games/{id}/claim` - Lotería win claim
//! - `GET  /api/v1/stats` - Caller's win/loss/experience record
//!
//! ## Health Check
//! - `GET /health` - Server health status

pub mod auth;
pub mod games;
pub mod middleware;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use salon_games::{auth::AuthManager, game::GameEngine};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
///
/// Cloned per request; cheap due to the Arc wrappers.
#[derive(Clone)]
pub struct AppState {
    pub auth_manager: Arc<AuthManager>,
    pub engine: Arc<GameEngine>,
    pub pool: Arc<PgPool>,
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let v1_routes = create_v1_router(state.clone());

    let root_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .merge(root_routes)
        .nest("/api/v1", v1_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Create API v1 router with all versioned endpoints.
fn create_v1_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/games", post(games::create_game))
        .route("/games/join", post(games::join_game))
        .route("/games/{game_id}/ready", post(games::set_ready))
        .route("/games/{game_id}/lobby", get(games::lobby_status))
        .route("/games/{game_id}/status", get(games::game_status))
        .route("/games/{game_id}/start", post(games::start_game))
        .route("/games/{game_id}/surrender", post(games::surrender))
        .route("/games/{game_id}/rematch", post(games::request_rematch))
        .route("/games/{game_id}/attack", post(games::attack))
        .route("/games/{game_id}/colors", post(games::set_colors))
        .route("/games/{game_id}/choose-color", post(games::choose_color))
        .route("/games/{game_id}/play-color", post(games::play_color))
        .route("/games/{game_id}/card", post(games::generate_card))
        .route("/games/{game_id}/draw", post(games::draw_card))
        .route("/games/{game_id}/process-card", post(games::process_card))
        .route("/games/{game_id}/reshuffle", post(games::reshuffle))
        .route("/games/{game_id}/token", post(games::place_token))
        .route("/games/{game_id}/claim", post(games::claim_win))
        .route("/stats", get(games::player_stats))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` if the database answers a trivial query, otherwise
/// `503 Service Unavailable`.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_healthy = sqlx::query("SELECT 1")
        .fetch_one(&*state.pool)
        .await
        .is_ok();

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
