//! SPRITEGRID - Sprite sheet compositor library
//!
//! Re-exports all modules for use by the binary target.

// Core engine (collection, grid policy, compositing, worker)
pub mod core;

// App modules
pub mod cli;
pub mod dialogs;
pub mod utils;

// Re-export commonly used types from core
pub use core::collect::{CollectError, FrameGeometry, FrameSet, collect_frames};
pub use core::compose::{ComposeRequest, compose};
pub use core::grid::{CapacityCheck, CapacityRisk, GridSpec, check_capacity, recommended_grid};
pub use core::runner::{RunEvent, RunHandle};
