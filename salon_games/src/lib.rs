//! # Salon Games
//!
//! A multi-game lobby and turn-based game engine covering three party
//! games: battleship, simon says and Mexican lotería.
//!
//! Games are created with a shareable join code, filled through a lobby
//! with a ready-check, then driven by per-type rules until exactly one
//! terminal `finished` state. The engine is transport-agnostic; clients
//! poll status projections rather than receiving pushes.
//!
//! ## Core Modules
//!
//! - [`game`]: entities, lifecycle engine and the three rules modules
//! - [`store`]: entity persistence (Postgres or in-memory)
//! - [`auth`]: registration, login and JWT access tokens
//! - [`stats`]: win/loss aggregates and experience grants
//! - [`audit`]: append-only trail of lifecycle events
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use salon_games::audit::NoopAuditLog;
//! use salon_games::game::GameEngine;
//! use salon_games::stats::MemoryStatsStore;
//! use salon_games::store::MemoryGameStore;
//!
//! let engine = GameEngine::new(
//!     Arc::new(MemoryGameStore::new()),
//!     Arc::new(MemoryStatsStore::new()),
//!     Arc::new(NoopAuditLog),
//! );
//! ```

/// Append-only audit trail of lifecycle events.
pub mod audit;

/// User registration, login and access tokens.
pub mod auth;
pub use auth::AuthManager;

/// PostgreSQL connection pooling.
pub mod db;
pub use db::{Database, DatabaseConfig};

/// Core game logic, entities and the lifecycle engine.
pub mod game;
pub use game::{GameEngine, GameError, GameResult};

/// Player statistics and experience grants.
pub mod stats;

/// Entity store abstraction and implementations.
pub mod store;
pub use store::{GameStore, MemoryGameStore, PgGameStore};
