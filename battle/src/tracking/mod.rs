//! Battle state tracking from server messages

mod battle;
mod legal;
mod resync;
mod updater;

pub use battle::BattleState;
pub use legal::{DecisionKind, LegalActions, LegalMove, LegalSwitch};
