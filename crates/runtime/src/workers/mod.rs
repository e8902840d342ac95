//! Worker tasks that back the game server.
//!
//! Every game runs on its own worker task; games share no mutable state.

mod game;

pub use game::{Command, GameWorker};
