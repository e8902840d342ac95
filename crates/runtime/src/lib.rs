//! Runtime orchestration for hosted Galaxy games.
//!
//! This crate wires together player routing, content oracles, repositories
//! and one worker task per game into a server API. Consumers embed
//! [`GameServer`] to host games and drive them through [`GameHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the server and its builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides the topic-based event bus
//! - [`oracle`] and [`repository`] provide content and persistence adapters
//! - `workers` keeps the per-game tasks internal to the crate
pub mod api;
pub mod events;
pub mod oracle;
pub mod repository;
pub mod runtime;

mod workers;

pub use api::{GameHandle, PlayerDirectory, PlayerEntry, Result, RuntimeError};
pub use events::{Event, EventBus, LifecycleEvent, Topic, UpdateEvent};
pub use oracle::OracleManager;
pub use repository::{
    FileGameRepository, GameRepository, InMemoryGameRepository, RepositoryError,
};
pub use runtime::{GameServer, GameServerBuilder, RuntimeConfig};
