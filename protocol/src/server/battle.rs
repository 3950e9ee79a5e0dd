//! Shared types for battle protocol messages

use crate::ParseError;

/// Player in a singles battle (p1 or p2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    P1,
    P2,
}

impl Player {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "p1" => Some(Player::P1),
            "p2" => Some(Player::P2),
            _ => None,
        }
    }

    /// Parse the player from a position prefix such as "p1a" or "p2: Name"
    pub fn from_prefix(s: &str) -> Option<Self> {
        if s.starts_with("p1") {
            Some(Player::P1)
        } else if s.starts_with("p2") {
            Some(Player::P2)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Player::P1 => "p1",
            Player::P2 => "p2",
        }
    }

    pub fn opponent(&self) -> Player {
        match self {
            Player::P1 => Player::P2,
            Player::P2 => Player::P1,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Player::P1 => 0,
            Player::P2 => 1,
        }
    }
}

/// Pokemon identifier in the form "POSITION: NAME" (e.g., "p1a: Pikachu")
#[derive(Debug, Clone, PartialEq)]
pub struct Pokemon {
    /// Player who owns this pokemon
    pub player: Player,
    /// Position letter (a for the active slot, or None in requests)
    pub position: Option<char>,
    /// Pokemon's name/nickname
    pub name: String,
}

impl Pokemon {
    /// Parse a pokemon ID string like "p1a: Pikachu" or "p1: Pikachu"
    pub fn parse(s: &str) -> Option<Self> {
        let (pos_part, name) = s.split_once(": ")?;
        let player = Player::from_prefix(pos_part)?;
        let position = pos_part.chars().nth(2);

        Some(Pokemon {
            player,
            position,
            name: name.to_string(),
        })
    }
}

/// Pokemon details string (species, level, gender, shiny, tera)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PokemonDetails {
    pub species: String,
    pub level: Option<u8>,
    pub gender: Option<char>,
    pub shiny: bool,
    pub tera_type: Option<String>,
}

impl PokemonDetails {
    /// Parse a details string like "Pikachu, L50, M, shiny" or "Ogerpon, L80, F, tera:Fire"
    pub fn parse(s: &str) -> Self {
        let mut details = PokemonDetails::default();
        let mut parts = s.split(',').map(str::trim);

        if let Some(species) = parts.next() {
            details.species = species.to_string();
        }

        for part in parts {
            if let Some(level_str) = part.strip_prefix('L') {
                details.level = level_str.parse().ok();
            } else if part == "M" {
                details.gender = Some('M');
            } else if part == "F" {
                details.gender = Some('F');
            } else if part == "shiny" {
                details.shiny = true;
            } else if let Some(tera) = part.strip_prefix("tera:") {
                details.tera_type = Some(tera.to_string());
            }
        }

        details
    }
}

/// HP and status condition (e.g., "100/100", "50/100 slp", "0 fnt")
#[derive(Debug, Clone, PartialEq)]
pub struct HpStatus {
    /// Current HP (exact for our side, out of 100 for the opponent)
    pub current: u32,
    /// Max HP (absent for the "0 fnt" sentinel)
    pub max: Option<u32>,
    /// Status condition (slp, par, brn, psn, tox, frz, fnt)
    pub status: Option<String>,
}

impl HpStatus {
    /// Parse an HP status string like "100/100", "50/100 slp", or "0 fnt"
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split_whitespace();
        let hp_part = parts.next()?;
        let status = parts.next().map(|s| s.to_string());

        if let Some((current_str, max_str)) = hp_part.split_once('/') {
            Some(HpStatus {
                current: current_str.parse().ok()?,
                max: Some(max_str.parse().ok()?),
                status,
            })
        } else {
            Some(HpStatus {
                current: hp_part.parse().ok()?,
                max: None,
                status,
            })
        }
    }

    /// Whether this condition denotes a fainted pokemon
    pub fn is_fainted(&self) -> bool {
        self.current == 0 || self.status.as_deref() == Some("fnt")
    }
}

/// Stat abbreviation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    Atk,
    Def,
    Spa,
    Spd,
    Spe,
    Accuracy,
    Evasion,
}

impl Stat {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "atk" => Some(Stat::Atk),
            "def" => Some(Stat::Def),
            "spa" => Some(Stat::Spa),
            "spd" => Some(Stat::Spd),
            "spe" => Some(Stat::Spe),
            "accuracy" => Some(Stat::Accuracy),
            "evasion" => Some(Stat::Evasion),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stat::Atk => "atk",
            Stat::Def => "def",
            Stat::Spa => "spa",
            Stat::Spd => "spd",
            Stat::Spe => "spe",
            Stat::Accuracy => "accuracy",
            Stat::Evasion => "evasion",
        }
    }

    /// Name used in battle text ("Special Attack", "evasiveness")
    pub fn display_name(&self) -> &'static str {
        match self {
            Stat::Atk => "Attack",
            Stat::Def => "Defense",
            Stat::Spa => "Special Attack",
            Stat::Spd => "Special Defense",
            Stat::Spe => "Speed",
            Stat::Accuracy => "accuracy",
            Stat::Evasion => "evasiveness",
        }
    }
}

/// Side of the field (for side conditions), e.g. "p1: Username"
#[derive(Debug, Clone, PartialEq)]
pub struct Side {
    pub player: Player,
    pub raw: String,
}

impl Side {
    pub fn parse(s: &str) -> Option<Self> {
        Some(Side {
            player: Player::from_prefix(s)?,
            raw: s.to_string(),
        })
    }
}

/// Helper to parse Pokemon from message parts
pub fn parse_pokemon(parts: &[&str], index: usize) -> Result<Pokemon, anyhow::Error> {
    parts
        .get(index)
        .and_then(|s| Pokemon::parse(s))
        .ok_or_else(|| ParseError::MissingField("pokemon".to_string()).into())
}

/// Helper to parse PokemonDetails from message parts
pub fn parse_details(parts: &[&str], index: usize) -> PokemonDetails {
    parts
        .get(index)
        .map(|s| PokemonDetails::parse(s))
        .unwrap_or_default()
}

/// Helper to parse HpStatus from message parts
pub fn parse_hp_status(parts: &[&str], index: usize) -> Option<HpStatus> {
    parts.get(index).and_then(|s| HpStatus::parse(s))
}

/// Helper to parse a Stat from message parts
pub fn parse_stat(parts: &[&str], index: usize) -> Result<Stat, anyhow::Error> {
    parts
        .get(index)
        .and_then(|s| Stat::parse(s))
        .ok_or_else(|| ParseError::MissingField("stat".to_string()).into())
}
