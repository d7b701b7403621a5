//! Modal dialogs shown before a run starts

pub mod confirm;

pub use confirm::{GridChoice, GridMismatchDialog, OversizeDialog};
