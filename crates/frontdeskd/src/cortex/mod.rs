//! The reasoning loop ("cortex"): think, call a tool, observe, repeat.

pub mod engine;

pub use engine::{CortexEngine, CortexOutcome};
