//! Oracle-driven decision loop for Pokemon Showdown battles.
//!
//! `pilot-agent` turns battle snapshots from `pilot-client` into choices:
//!
//! ```text
//! SessionHandle::snapshot ──> prompt ──> Oracle ──> parse_reply ──> validate ──> choose
//!          ▲                                                                       │
//!          └──────────────── rejection: narrow Exclusions and retry ───────────────┘
//! ```
//!
//! # Main Types
//!
//! - [`DecisionLoop`] - per-battle state machine with a bounded retry budget
//! - [`Oracle`] - anything that answers a prompt; [`LlmOracle`] speaks HTTP
//! - [`Command`] - `move N`, `move Nt` or `switch N`, checked by [`validate`]
//! - [`ReferenceData`] - optional species, move, ability and item lookups
//! - [`Pilot`] - the session handler behind the `pilot` binary
//!
//! # Example
//!
//! ```
//! use pilot_agent::{Command, parse_reply};
//!
//! let (rationale, command) = parse_reply("Earthquake hits both.\nCHOSEN MOVE: move 1t");
//! assert_eq!(rationale, "Earthquake hits both.");
//! assert_eq!(command, Ok(Command::Move { index: 1, tera: true }));
//! ```

pub mod app;
pub mod command;
pub mod config;
pub mod decision;
pub mod llm;
pub mod oracle;
pub mod prompt;
pub mod reference;

pub use app::Pilot;
pub use command::{CHOICE_MARKER, Command, CommandError, Exclusions, parse_reply, validate};
pub use config::Args;
pub use decision::{DecisionLoop, LoopConfig, LoopReport, Phase, RetryPolicy, SubmitError};
pub use llm::{LlmConfig, LlmOracle, LlmProvider, OracleError};
pub use oracle::Oracle;
pub use reference::{JsonReferenceData, NoReferenceData, ReferenceData, Record};
