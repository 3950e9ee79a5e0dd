//! Combatant state

use pilot_protocol::{HpStatus, PokemonDetails, to_id};

use super::stats::{BattleStats, StatStages};
use super::status::{Status, Volatile};

/// One Pokemon instance in a battle
///
/// HP is stored as a `current/max` pair. Our own side reports exact values;
/// the opponent's HP arrives out of 100.
#[derive(Debug, Clone, PartialEq)]
pub struct Combatant {
    /// Identity name (nickname, or the species when none was given)
    pub name: String,

    /// Species name including forme (e.g. "Rotom-Wash")
    pub species: String,

    pub level: u8,

    pub hp_current: u32,
    pub hp_max: u32,

    /// Once set, never cleared for the rest of the battle
    pub fainted: bool,

    /// Major status ailment
    pub status: Option<Status>,

    /// Ability, once revealed
    pub ability: Option<String>,

    /// Held item, once revealed (cleared when consumed or removed)
    pub item: Option<String>,

    /// Moves seen so far, de-duplicated by move id
    pub known_moves: Vec<String>,

    /// Volatile conditions in the order they started
    pub volatiles: Vec<Volatile>,

    pub boosts: StatStages,

    pub tera_type: Option<String>,
    pub terastallized: bool,

    /// Battle stats (our own side only)
    pub stats: Option<BattleStats>,

    /// Currently on the field
    pub active: bool,

    /// Seen in battle, as opposed to only in team preview
    pub revealed: bool,
}

impl Combatant {
    pub fn new(name: impl Into<String>, species: impl Into<String>, level: u8) -> Self {
        Self {
            name: name.into(),
            species: species.into(),
            level,
            hp_current: 100,
            hp_max: 100,
            fainted: false,
            status: None,
            ability: None,
            item: None,
            known_moves: Vec::new(),
            volatiles: Vec::new(),
            boosts: StatStages::new(),
            tera_type: None,
            terastallized: false,
            stats: None,
            active: false,
            revealed: false,
        }
    }

    /// Create from protocol details under the given identity name
    pub fn from_details(name: &str, details: &PokemonDetails) -> Self {
        let mut combatant = Self::new(name, &details.species, details.level.unwrap_or(100));
        combatant.tera_type = details.tera_type.clone();
        combatant
    }

    /// Refresh species, level and tera type from a details string
    pub fn apply_details(&mut self, details: &PokemonDetails) {
        if !details.species.is_empty() {
            self.species = details.species.clone();
        }
        if let Some(level) = details.level {
            self.level = level;
        }
        if let Some(tera) = &details.tera_type {
            self.tera_type = Some(tera.clone());
            self.terastallized = true;
        }
    }

    /// HP as a percentage rounded to one decimal; 0 once fainted
    pub fn hp_percent(&self) -> f64 {
        if self.fainted || self.hp_max == 0 {
            return 0.0;
        }
        let percent = f64::from(self.hp_current) / f64::from(self.hp_max) * 100.0;
        round1(percent.clamp(0.0, 100.0))
    }

    /// Set HP, clamped to `[0, max]`; a zero max is ignored
    pub fn set_hp(&mut self, current: u32, max: u32) {
        if self.fainted || max == 0 {
            return;
        }
        self.hp_max = max;
        self.hp_current = current.min(max);
    }

    /// Apply a condition token such as "81/100 par" or "0 fnt"
    pub fn apply_condition(&mut self, condition: &HpStatus) {
        if condition.is_fainted() {
            self.faint();
            return;
        }

        let max = condition.max.unwrap_or(self.hp_max);
        self.set_hp(condition.current, max);
        self.status = condition.status.as_deref().and_then(Status::from_protocol);
    }

    /// Mark fainted: HP pinned at 0 and combat state dropped
    pub fn faint(&mut self) {
        self.fainted = true;
        self.hp_current = 0;
        self.status = None;
        self.active = false;
        self.reset_combat_state();
    }

    /// Record a revealed move, returns false if it was already known
    pub fn record_move(&mut self, move_name: &str) -> bool {
        let id = to_id(move_name);
        if id.is_empty() || self.knows_move(&id) {
            return false;
        }
        self.known_moves.push(move_name.to_string());
        true
    }

    /// Whether a move (by name or id) is already known
    pub fn knows_move(&self, move_name: &str) -> bool {
        let id = to_id(move_name);
        self.known_moves.iter().any(|m| to_id(m) == id)
    }

    pub fn add_volatile(&mut self, volatile: Volatile) {
        if !self.volatiles.contains(&volatile) {
            self.volatiles.push(volatile);
        }
    }

    pub fn remove_volatile(&mut self, volatile: &Volatile) -> bool {
        let before = self.volatiles.len();
        self.volatiles.retain(|v| v != volatile);
        self.volatiles.len() != before
    }

    /// Boosts and volatiles back to neutral (on switch in or out)
    pub fn reset_combat_state(&mut self) {
        self.boosts.clear();
        self.volatiles.clear();
    }

    /// Check if Pokemon is alive (not fainted)
    pub fn is_alive(&self) -> bool {
        !self.fainted && self.hp_current > 0
    }
}

/// Round to one decimal place
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hp(current: u32, max: Option<u32>, status: Option<&str>) -> HpStatus {
        HpStatus {
            current,
            max,
            status: status.map(str::to_string),
        }
    }

    #[test]
    fn test_from_details() {
        let details = PokemonDetails::parse("Ogerpon-Wellspring, L80, F, tera:Water");
        let combatant = Combatant::from_details("Ogerpon", &details);
        assert_eq!(combatant.name, "Ogerpon");
        assert_eq!(combatant.species, "Ogerpon-Wellspring");
        assert_eq!(combatant.level, 80);
        assert_eq!(combatant.tera_type.as_deref(), Some("Water"));
        assert!(!combatant.terastallized);
        assert!(!combatant.revealed);
    }

    #[test]
    fn test_hp_percent_rounding() {
        let mut combatant = Combatant::new("Rotom", "Rotom-Wash", 86);
        combatant.set_hp(200, 240);
        assert_eq!(combatant.hp_percent(), 83.3);

        combatant.set_hp(500, 240);
        assert_eq!(combatant.hp_current, 240);
        assert_eq!(combatant.hp_percent(), 100.0);
    }

    #[test]
    fn test_apply_condition() {
        let mut combatant = Combatant::new("Heatran", "Heatran", 80);
        combatant.apply_condition(&hp(81, Some(100), Some("par")));
        assert_eq!(combatant.hp_current, 81);
        assert_eq!(combatant.status, Some(Status::Paralysis));

        combatant.apply_condition(&hp(60, Some(100), None));
        assert_eq!(combatant.status, None);

        combatant.apply_condition(&hp(0, None, Some("fnt")));
        assert!(combatant.fainted);
        assert_eq!(combatant.hp_percent(), 0.0);

        combatant.apply_condition(&hp(50, Some(100), None));
        assert_eq!(combatant.hp_current, 0);
    }

    #[test]
    fn test_record_move_dedupes_by_id() {
        let mut combatant = Combatant::new("Garchomp", "Garchomp", 77);
        assert!(combatant.record_move("Earthquake"));
        assert!(combatant.record_move("Swords Dance"));
        assert!(!combatant.record_move("earthquake"));
        assert!(!combatant.record_move("swordsdance"));

        assert_eq!(combatant.known_moves, vec!["Earthquake", "Swords Dance"]);
    }

    #[test]
    fn test_volatiles_keep_order() {
        let mut combatant = Combatant::new("Test", "Test", 100);
        combatant.add_volatile(Volatile::Substitute);
        combatant.add_volatile(Volatile::Confusion);
        combatant.add_volatile(Volatile::Substitute);
        assert_eq!(
            combatant.volatiles,
            vec![Volatile::Substitute, Volatile::Confusion]
        );

        assert!(combatant.remove_volatile(&Volatile::Substitute));
        assert!(!combatant.remove_volatile(&Volatile::Taunt));
        assert_eq!(combatant.volatiles, vec![Volatile::Confusion]);
    }
}
