//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `EngineState`: lifecycle of a crawl engine (running, stopping, stopped)
//! - `ItemOutcome`: how a single visit to a queue item ended

mod engine_state;
mod outcome;

// Re-export main types
pub use engine_state::EngineState;
pub use outcome::ItemOutcome;
