//! Topic-based event bus for runtime events.
//!
//! Events are published to specific topics, and consumers subscribe only to
//! the topics they need. Publishing is best-effort: a topic without
//! subscribers silently drops the event.

mod bus;

pub use bus::{EventBus, RuntimeEvent, Topic};
