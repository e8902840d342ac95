//! Repository layer for saved games.
//!
//! Repositories handle data that CHANGES during play. Static content (rules,
//! tiles) is served by the oracles, not repositories.

mod error;
mod file;
mod memory;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::FileGameRepository;
pub use memory::InMemoryGameRepository;
pub use traits::GameRepository;
