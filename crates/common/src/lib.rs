//! Shared types and configuration for the top-down world.
//!
//! # Invariants
//! - Rectangles are integer and top-left anchored; intersection is strict.
//! - Configuration is validated on load; nothing downstream re-checks sizes.

mod config;
mod types;

pub use config::{ConfigError, WorldConfig};
pub use types::{CellCoord, EntityId, Rect};
