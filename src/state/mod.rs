//! State module for tracking harvest progress
//!
//! `RunState` models the stages of a single run, from fetching the seed
//! document to writing the final outputs.

mod run_state;

pub use run_state::RunState;
