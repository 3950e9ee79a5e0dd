//! Domain types for battle state tracking

mod conditions;
mod field;
mod pokemon;
mod pokemon_type;
mod side;
mod stats;
mod status;

pub use conditions::{ConditionCategory, SideCondition, Terrain, Weather};
pub use field::FieldState;
pub use pokemon::Combatant;
pub(crate) use pokemon::round1;
pub use pokemon_type::Type;
pub use side::SideState;
pub use stats::{BattleStats, StatStages};
pub use status::{Status, Volatile};
