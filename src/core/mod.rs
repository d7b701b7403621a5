//! Core compositing engine: collection, grid policy, canvas, compose loop

pub mod canvas;
pub mod collect;
pub mod compose;
pub mod grid;
pub mod natural;
pub mod runner;
