//! Battle state model and protocol interpreter for Pokemon Showdown.
//!
//! `pilot-battle` sits between `pilot-protocol` (wire format) and the
//! session and decision layers:
//!
//! ```text
//! pilot-protocol (wire format)
//!        │
//!        ▼
//! pilot-battle (state model + interpreter + transcript)
//!        │
//!        ├─> pilot-client (session state, one BattleState per battle room)
//!        └─> pilot-agent (decision loop reading snapshots)
//! ```
//!
//! # Main Types
//!
//! - [`BattleState`] - one battle seen from one player; [`BattleState::apply`]
//!   mutates it from a [`ServerMessage`] and returns narrated events
//! - [`LegalActions`] - what the latest `|request|` allows
//! - [`Combatant`], [`SideState`], [`FieldState`] - the entity model
//! - [`Transcript`] - append-only human-readable battle log
//! - [`query::Matchup`] - type matchup analysis
//!
//! # Example Usage
//!
//! ```
//! use pilot_battle::{BattleState, Transcript};
//! use pilot_protocol::parse_server_frame;
//!
//! let mut battle = BattleState::for_user("battle-gen9randombattle-1", "Pilot");
//! let mut transcript = Transcript::new();
//!
//! let frame = parse_server_frame(
//!     ">battle-gen9randombattle-1\n|player|p1|Pilot|1|\n|switch|p2a: Heatran|Heatran, L80|100/100\n|turn|1",
//! );
//! for message in &frame.messages {
//!     let events = battle.apply(message);
//!     transcript.record(battle.turn, events);
//! }
//!
//! assert_eq!(battle.turn, 1);
//! assert_eq!(transcript.events()[0], "The opposing Heatran was sent out!");
//! ```
//!
//! [`ServerMessage`]: pilot_protocol::ServerMessage

pub mod query;
pub mod tracking;
pub mod transcript;
pub mod types;

pub use tracking::{BattleState, DecisionKind, LegalActions, LegalMove, LegalSwitch};
pub use transcript::Transcript;
pub use types::{
    BattleStats, Combatant, ConditionCategory, FieldState, SideCondition, SideState,
    StatStages, Status, Terrain, Type, Volatile, Weather,
};

// Re-export commonly used protocol types
pub use pilot_protocol::{Player, Stat};
