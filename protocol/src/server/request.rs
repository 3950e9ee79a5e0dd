//! Battle request types
//!
//! These types represent the JSON structure of |request| messages. Every
//! field has a default and unknown fields are ignored, so server-side
//! additions to the payload never break parsing.

use super::battle::Player;
use serde::{Deserialize, Deserializer};

/// A battle request describing our side and, when present, the decision to make
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BattleRequest {
    /// Request ID for synchronization
    pub rqid: Option<u64>,

    /// Active pokemon and their available moves
    pub active: Vec<ActivePokemon>,

    /// Information about the player's side/team
    pub side: Option<SideInfo>,

    /// Which slots need to switch
    pub force_switch: Vec<bool>,

    /// Whether this is team preview
    pub team_preview: bool,

    /// Whether we're waiting for opponent
    pub wait: bool,

    /// Whether the choice can no longer be cancelled
    pub no_cancel: bool,
}

impl BattleRequest {
    /// Parse a request from its JSON text
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Check if this request requires a decision
    pub fn needs_decision(&self) -> bool {
        !self.wait && (self.team_preview || self.is_force_switch() || !self.active.is_empty())
    }

    /// Check if this is a force switch request
    pub fn is_force_switch(&self) -> bool {
        self.force_switch.iter().any(|&b| b)
    }

    /// The player this request belongs to
    pub fn player(&self) -> Option<Player> {
        self.side.as_ref().and_then(SideInfo::player)
    }
}

/// Information about an active pokemon in battle
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivePokemon {
    /// Move slots, in the order the server indexes them
    pub moves: Vec<MoveSlot>,

    /// Whether the pokemon is trapped
    pub trapped: bool,

    /// Whether the pokemon might be trapped
    pub maybe_trapped: bool,

    /// Terastallization type (if available)
    pub can_terastallize: Option<String>,
}

impl ActivePokemon {
    /// Get non-disabled moves with their 0-based slot index
    pub fn available_moves(&self) -> Vec<(usize, &MoveSlot)> {
        self.moves
            .iter()
            .enumerate()
            .filter(|(_, m)| !m.disabled)
            .collect()
    }

    /// Check if the pokemon can switch out
    pub fn can_switch(&self) -> bool {
        !self.trapped
    }
}

/// A move slot on an active pokemon
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct MoveSlot {
    /// Display name of the move
    #[serde(rename = "move")]
    pub name: String,

    /// Move ID (lowercase, no spaces)
    pub id: String,

    /// Current PP
    pub pp: u32,

    /// Maximum PP
    #[serde(rename = "maxpp")]
    pub max_pp: u32,

    /// Target type (normal, self, allySide, etc.)
    pub target: String,

    /// Move type, when the server includes it
    #[serde(rename = "type")]
    pub move_type: Option<String>,

    /// Whether the move is disabled; the server sends either a bool or the disabling source
    #[serde(deserialize_with = "truthy")]
    pub disabled: bool,
}

/// Information about the player's side
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct SideInfo {
    /// Player's display name
    pub name: String,

    /// Player ID (p1, p2)
    pub id: String,

    /// Pokemon on this side, in switch-index order
    pub pokemon: Vec<SidePokemon>,
}

impl SideInfo {
    /// Get the player enum
    pub fn player(&self) -> Option<Player> {
        Player::parse(&self.id)
    }
}

/// A pokemon on the player's side
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SidePokemon {
    /// Pokemon identifier (e.g., "p1: Pikachu")
    pub ident: String,

    /// Details string (species, level, gender, shiny)
    pub details: String,

    /// Current condition (HP/MaxHP status)
    pub condition: String,

    /// Whether this pokemon is currently active
    pub active: bool,

    /// Stats (atk, def, spa, spd, spe)
    pub stats: PokemonStats,

    /// Move IDs
    pub moves: Vec<String>,

    /// Base ability
    pub base_ability: String,

    /// Current ability
    pub ability: String,

    /// Held item
    pub item: String,

    /// Terastallize type
    pub tera_type: Option<String>,

    /// Type this pokemon terastallized into, empty or absent if it has not
    pub terastallized: Option<String>,

    /// Explicit fainted flag (not sent by every server version)
    #[serde(deserialize_with = "truthy")]
    pub fainted: bool,
}

impl SidePokemon {
    /// Name part of the ident ("p1: Name" -> "Name")
    pub fn name(&self) -> &str {
        self.ident
            .split_once(": ")
            .map(|(_, name)| name)
            .unwrap_or(&self.ident)
    }

    /// Check if the pokemon is fainted
    ///
    /// Any one of these counts: the explicit flag, a zero-HP condition
    /// ("0", "0/250"), or a "fnt" token in the condition.
    pub fn is_fainted(&self) -> bool {
        if self.fainted {
            return true;
        }

        let mut tokens = self.condition.split_whitespace();
        let zero_hp = tokens
            .next()
            .map(|hp| hp.split('/').next() == Some("0"))
            .unwrap_or(false);

        zero_hp || self.condition.split_whitespace().any(|t| t == "fnt")
    }

    /// Get current HP as a fraction (current, max)
    pub fn hp(&self) -> Option<(u32, u32)> {
        let hp_part = self.condition.split_whitespace().next()?;
        let (current, max) = hp_part.split_once('/')?;
        Some((current.parse().ok()?, max.parse().ok()?))
    }

    /// Get the status condition (if any)
    pub fn status(&self) -> Option<&str> {
        self.condition.split_whitespace().nth(1)
    }

    /// Get the species name from details
    pub fn species(&self) -> &str {
        self.details.split(',').next().unwrap_or(&self.details)
    }

    /// Whether the pokemon has terastallized
    pub fn is_terastallized(&self) -> bool {
        self.terastallized.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Pokemon stats
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct PokemonStats {
    pub atk: u32,
    pub def: u32,
    pub spa: u32,
    pub spd: u32,
    pub spe: u32,
}

/// Accept `true`/`false`, a non-empty string, or a non-zero number as a flag
fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    })
}
