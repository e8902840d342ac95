//! Static content for the Galaxy rules engine.
//!
//! This crate owns the balance numbers the engine deliberately leaves out:
//! - Race rules, ship statistics and income tracks ([`RulesTable`])
//! - The hex tile catalogue ([`TileTable`])
//! - Engine configuration (TOML, via [`loaders::ConfigLoader`])
//!
//! Both tables implement the `galaxy-core` oracle traits. Content is consumed
//! through those oracles and never appears in game state.

pub mod tables;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use tables::{RulesTable, TileTable};

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, ContentFactory, LoadResult, RulesLoader, TilesLoader, builtin};
