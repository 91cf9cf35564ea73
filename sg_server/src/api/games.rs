//! Game API handlers.
//!
//! Thin HTTP adapters over the game engine: each handler decodes the
//! payload, calls the corresponding engine operation with the
//! authenticated user id, and maps typed engine errors to status codes.
//!
//! Create and join a game:
//! ```bash
//! curl -X POST http://localhost:3000/api/v1/games \
//!   -H "Authorization: Bearer TOKEN" \
//!   -H "Content-Type: application/json" \
//!   -d '{"game_type": "battleship"}'
//!
//! curl -X POST http://localhost:3000/api/v1/games/join \
//!   -H "Authorization: Bearer TOKEN" \
//!   -H "Content-Type: application/json" \
//!   -d '{"code": "ABCD2345"}'
//! ```

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use salon_games::game::{
    AttackOutcome, AttackResult, CreateOptions, CreatedGame, ErrorKind, GameError,
    GameStatusView, LobbyView, PlayOutcome, ReadyOutcome, RematchOutcome, SimonPhase,
};
use salon_games::game::loteria::{ClaimOutcome, DrawnCard};
use salon_games::stats::PlayerStats;

use super::AppState;
use crate::metrics;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: ErrorKind,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a typed engine error to an HTTP status and client-safe body.
fn error_response(e: GameError) -> ApiError {
    let kind = e.kind();
    let status = match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::InvalidState | ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::InvalidInput | ErrorKind::Unsupported => StatusCode::BAD_REQUEST,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if kind == ErrorKind::Internal {
        tracing::error!("internal game error: {e}");
    }
    (
        status,
        Json(ErrorResponse {
            error: e.client_message(),
            kind,
        }),
    )
}

#[derive(Debug, Deserialize)]
pub struct CreateGamePayload {
    pub game_type: String,
    #[serde(default)]
    pub min_players: Option<u8>,
    #[serde(default)]
    pub max_players: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct JoinGamePayload {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct JoinGameResponse {
    pub game_id: i64,
    pub code: String,
    pub game_type: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct AttackPayload {
    pub x: u8,
    pub y: u8,
}

#[derive(Debug, Deserialize)]
pub struct ColorsPayload {
    pub colors: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ColorPayload {
    pub color: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenPayload {
    pub cell_index: u8,
}

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub outcome: ClaimOutcome,
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub status: String,
}

/// `POST /games` - create a game and seat the caller as its first player.
pub async fn create_game(
    State(state): State<AppState>,
    Extension(user_id): Extension<i64>,
    Json(payload): Json<CreateGamePayload>,
) -> Result<Json<CreatedGame>, ApiError> {
    let options = CreateOptions {
        min_players: payload.min_players,
        max_players: payload.max_players,
    };
    let created = state
        .engine
        .create_game(user_id, &payload.game_type, options)
        .await
        .map_err(error_response)?;

    metrics::games_created_total(&created.game_type.to_string());
    Ok(Json(created))
}

/// `POST /games/join` - join a lobby by its code.
pub async fn join_game(
    State(state): State<AppState>,
    Extension(user_id): Extension<i64>,
    Json(payload): Json<JoinGamePayload>,
) -> Result<Json<JoinGameResponse>, ApiError> {
    let game = state
        .engine
        .join_game(user_id, &payload.code)
        .await
        .map_err(error_response)?;
    Ok(Json(JoinGameResponse {
        game_id: game.id,
        code: game.code.clone(),
        game_type: game.game_type().to_string(),
        status: game.status.to_string(),
    }))
}

/// `POST /games/{id}/ready` - mark the caller ready.
pub async fn set_ready(
    State(state): State<AppState>,
    Extension(user_id): Extension<i64>,
    Path(game_id): Path<i64>,
) -> Result<Json<ReadyOutcome>, ApiError> {
    let outcome = state
        .engine
        .set_ready(user_id, game_id)
        .await
        .map_err(error_response)?;
    Ok(Json(outcome))
}

/// `GET /games/{id}/lobby` - lobby snapshot for a participant.
pub async fn lobby_status(
    State(state): State<AppState>,
    Extension(user_id): Extension<i64>,
    Path(game_id): Path<i64>,
) -> Result<Json<LobbyView>, ApiError> {
    let view = state
        .engine
        .lobby_status(user_id, game_id)
        .await
        .map_err(error_response)?;
    Ok(Json(view))
}

/// `GET /games/{id}/status` - gameplay snapshot for a participant.
pub async fn game_status(
    State(state): State<AppState>,
    Extension(user_id): Extension<i64>,
    Path(game_id): Path<i64>,
) -> Result<Json<GameStatusView>, ApiError> {
    let view = state
        .engine
        .game_status(user_id, game_id)
        .await
        .map_err(error_response)?;
    Ok(Json(view))
}

/// `POST /games/{id}/start` - lotería host starts the game.
pub async fn start_game(
    State(state): State<AppState>,
    Extension(user_id): Extension<i64>,
    Path(game_id): Path<i64>,
) -> Result<Json<StartResponse>, ApiError> {
    let status = state
        .engine
        .start_game(user_id, game_id)
        .await
        .map_err(error_response)?;
    Ok(Json(StartResponse {
        status: status.to_string(),
    }))
}

/// `POST /games/{id}/surrender` - leave a lobby or concede a running game.
pub async fn surrender(
    State(state): State<AppState>,
    Extension(user_id): Extension<i64>,
    Path(game_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .engine
        .surrender(user_id, game_id)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /games/{id}/rematch` - flag intent to play again.
pub async fn request_rematch(
    State(state): State<AppState>,
    Extension(user_id): Extension<i64>,
    Path(game_id): Path<i64>,
) -> Result<Json<RematchOutcome>, ApiError> {
    let outcome = state
        .engine
        .request_rematch(user_id, game_id)
        .await
        .map_err(error_response)?;
    Ok(Json(outcome))
}

/// `POST /games/{id}/attack` - battleship attack.
pub async fn attack(
    State(state): State<AppState>,
    Extension(user_id): Extension<i64>,
    Path(game_id): Path<i64>,
    Json(payload): Json<AttackPayload>,
) -> Result<Json<AttackOutcome>, ApiError> {
    let outcome = state
        .engine
        .attack(user_id, game_id, payload.x, payload.y)
        .await
        .map_err(error_response)?;

    metrics::moves_total("attack");
    if outcome.status == AttackResult::Win {
        metrics::games_finished_total("battleship");
    }
    Ok(Json(outcome))
}

/// `POST /games/{id}/colors` - simon says palette commit.
pub async fn set_colors(
    State(state): State<AppState>,
    Extension(user_id): Extension<i64>,
    Path(game_id): Path<i64>,
    Json(payload): Json<ColorsPayload>,
) -> Result<StatusCode, ApiError> {
    state
        .engine
        .set_colors(user_id, game_id, payload.colors)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /games/{id}/choose-color` - simon says color choice for the
/// opponent's sequence.
pub async fn choose_color(
    State(state): State<AppState>,
    Extension(user_id): Extension<i64>,
    Path(game_id): Path<i64>,
    Json(payload): Json<ColorPayload>,
) -> Result<StatusCode, ApiError> {
    state
        .engine
        .choose_color(user_id, game_id, &payload.color)
        .await
        .map_err(error_response)?;
    metrics::moves_total("choose_color");
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /games/{id}/play-color` - simon says sequence play.
pub async fn play_color(
    State(state): State<AppState>,
    Extension(user_id): Extension<i64>,
    Path(game_id): Path<i64>,
    Json(payload): Json<ColorPayload>,
) -> Result<Json<PlayOutcome>, ApiError> {
    let outcome = state
        .engine
        .play_color(user_id, game_id, &payload.color)
        .await
        .map_err(error_response)?;

    metrics::moves_total("play_color");
    if outcome.phase == SimonPhase::Finished {
        metrics::games_finished_total("simonsay");
    }
    Ok(Json(outcome))
}

/// `POST /games/{id}/card` - deal the caller a fresh lotería table.
pub async fn generate_card(
    State(state): State<AppState>,
    Extension(user_id): Extension<i64>,
    Path(game_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .engine
        .generate_player_card(user_id, game_id)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /games/{id}/draw` - lotería host draws the next card.
pub async fn draw_card(
    State(state): State<AppState>,
    Extension(user_id): Extension<i64>,
    Path(game_id): Path<i64>,
) -> Result<Json<DrawnCard>, ApiError> {
    let card = state
        .engine
        .draw_card(user_id, game_id)
        .await
        .map_err(error_response)?;
    Ok(Json(card))
}

/// `POST /games/{id}/process-card` - lotería host acknowledges the
/// current card.
pub async fn process_card(
    State(state): State<AppState>,
    Extension(user_id): Extension<i64>,
    Path(game_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .engine
        .process_current_card(user_id, game_id)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /games/{id}/reshuffle` - lotería host reshuffles the pouch.
pub async fn reshuffle(
    State(state): State<AppState>,
    Extension(user_id): Extension<i64>,
    Path(game_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .engine
        .reshuffle_cards(user_id, game_id)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /games/{id}/token` - mark a cell with the current card.
pub async fn place_token(
    State(state): State<AppState>,
    Extension(user_id): Extension<i64>,
    Path(game_id): Path<i64>,
    Json(payload): Json<TokenPayload>,
) -> Result<StatusCode, ApiError> {
    state
        .engine
        .place_token(user_id, game_id, payload.cell_index)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /games/{id}/claim` - claim a full-card win.
pub async fn claim_win(
    State(state): State<AppState>,
    Extension(user_id): Extension<i64>,
    Path(game_id): Path<i64>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let outcome = state
        .engine
        .claim_win(user_id, game_id)
        .await
        .map_err(error_response)?;

    if outcome == ClaimOutcome::Win {
        metrics::games_finished_total("loteria");
    }
    Ok(Json(ClaimResponse { outcome }))
}

/// `GET /stats` - lifetime win/loss/experience record for the caller.
pub async fn player_stats(
    State(state): State<AppState>,
    Extension(user_id): Extension<i64>,
) -> Result<Json<Vec<PlayerStats>>, ApiError> {
    let stats = state
        .engine
        .player_stats(user_id)
        .await
        .map_err(error_response)?;
    Ok(Json(stats))
}
