//! Query helpers for battle decision making
//!
//! Type matchup analysis used when describing a position to a decision maker.

mod matchup;

pub use matchup::{Matchup, best_effectiveness, parse_types};
