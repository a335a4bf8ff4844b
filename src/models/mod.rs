//! Data models for lexmon.
//!
//! This module contains the core data structures shared across the
//! sampling engine.

mod lexicon;
mod round;

pub use lexicon::{Category, Lexicon};
pub use round::{ItemHandle, ItemOutcome, RoundResult};
