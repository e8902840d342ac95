//! Topic-based event bus for runtime events.
//!
//! Game workers publish engine updates and lifecycle milestones; consumers
//! subscribe only to the topics they need.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{LifecycleEvent, UpdateEvent};
