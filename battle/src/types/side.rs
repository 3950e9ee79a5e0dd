//! Side (player) state

use pilot_protocol::{Player, PokemonDetails};

use super::conditions::{ConditionCategory, SideCondition};
use super::pokemon::Combatant;

/// One player's side of the battle
#[derive(Debug, Clone, PartialEq)]
pub struct SideState {
    /// Player identifier (P1, P2)
    pub player: Player,

    /// Player's username
    pub username: String,

    /// Combatants in roster order
    pub roster: Vec<Combatant>,

    /// Roster index of the active Combatant
    pub active: Option<usize>,

    /// Entry hazards; stackable hazards appear once per layer
    pub hazards: Vec<SideCondition>,

    /// Active screens
    pub screens: Vec<SideCondition>,

    /// Terastallization has been spent (never resets within a battle)
    pub tera_used: bool,
}

impl SideState {
    /// Create a new side state
    pub fn new(player: Player, username: impl Into<String>) -> Self {
        Self {
            player,
            username: username.into(),
            roster: Vec::new(),
            active: None,
            hazards: Vec::new(),
            screens: Vec::new(),
            tera_used: false,
        }
    }

    /// Get the active Combatant
    pub fn active_combatant(&self) -> Option<&Combatant> {
        self.active.and_then(|idx| self.roster.get(idx))
    }

    /// Get the active Combatant mutably
    pub fn active_combatant_mut(&mut self) -> Option<&mut Combatant> {
        self.active.and_then(|idx| self.roster.get_mut(idx))
    }

    /// Find a Combatant by identity name or species
    pub fn find(&self, name: &str) -> Option<usize> {
        self.roster
            .iter()
            .position(|c| c.name == name)
            .or_else(|| self.roster.iter().position(|c| c.species == name))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Combatant> {
        let idx = self.find(name)?;
        self.roster.get_mut(idx)
    }

    /// Resolve the Combatant a switch refers to, creating it if needed
    ///
    /// A nicknamed Pokemon first appears in team preview under its species,
    /// so an unrevealed entry with the same species is adopted and renamed.
    pub fn resolve_or_insert(&mut self, name: &str, details: &PokemonDetails) -> usize {
        if let Some(idx) = self.roster.iter().position(|c| c.name == name) {
            return idx;
        }

        let preview = self
            .roster
            .iter()
            .position(|c| !c.revealed && c.species == details.species);
        if let Some(idx) = preview {
            self.roster[idx].name = name.to_string();
            return idx;
        }

        self.roster.push(Combatant::from_details(name, details));
        self.roster.len() - 1
    }

    /// Make the Combatant at `idx` the active one
    ///
    /// Both the outgoing and incoming Combatant have their boosts and
    /// volatiles reset. Returns false (and changes nothing) if the target is
    /// fainted or out of range.
    pub fn switch_in(&mut self, idx: usize) -> bool {
        match self.roster.get(idx) {
            Some(c) if !c.fainted => {}
            _ => return false,
        }

        if let Some(outgoing) = self.active_combatant_mut() {
            outgoing.active = false;
            outgoing.reset_combat_state();
        }

        let incoming = &mut self.roster[idx];
        incoming.reset_combat_state();
        incoming.active = true;
        incoming.revealed = true;
        self.active = Some(idx);
        true
    }

    /// Add one layer of a hazard or screen, returns false if already at the cap
    pub fn add_condition(&mut self, condition: SideCondition) -> bool {
        let max = condition.max_layers();
        let list = match condition.category() {
            ConditionCategory::Hazard => &mut self.hazards,
            ConditionCategory::Screen => &mut self.screens,
            ConditionCategory::Tailwind => return false,
        };

        if list.iter().filter(|c| **c == condition).count() >= max {
            return false;
        }
        list.push(condition);
        true
    }

    /// Remove every layer of a condition, returns how many were removed
    pub fn remove_condition(&mut self, condition: SideCondition) -> usize {
        let list = match condition.category() {
            ConditionCategory::Hazard => &mut self.hazards,
            ConditionCategory::Screen => &mut self.screens,
            ConditionCategory::Tailwind => return 0,
        };

        let before = list.len();
        list.retain(|c| *c != condition);
        before - list.len()
    }

    /// Layers of a condition (0 if not present)
    pub fn layers(&self, condition: SideCondition) -> usize {
        self.hazards
            .iter()
            .chain(self.screens.iter())
            .filter(|c| **c == condition)
            .count()
    }

    /// Count non-fainted Combatants
    pub fn alive_count(&self) -> usize {
        self.roster.iter().filter(|c| !c.fainted).count()
    }

    /// Count fainted Combatants
    pub fn fainted_count(&self) -> usize {
        self.roster.iter().filter(|c| c.fainted).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_side() -> SideState {
        let mut side = SideState::new(Player::P1, "TestUser");

        side.roster.push(Combatant::new("Pikachu", "Pikachu", 92));
        side.roster.push(Combatant::new("Charizard", "Charizard", 84));

        let mut fainted = Combatant::new("Blastoise", "Blastoise", 86);
        fainted.faint();
        side.roster.push(fainted);

        side
    }

    #[test]
    fn test_switch_in_resets_both_sides_of_the_switch() {
        let mut side = create_test_side();
        assert!(side.switch_in(0));

        side.roster[0].boosts.atk = 2;
        side.roster[1].boosts.spe = 1;

        assert!(side.switch_in(1));
        assert!(!side.roster[0].active);
        assert!(side.roster[0].boosts.is_clear());
        assert!(side.roster[1].active);
        assert!(side.roster[1].boosts.is_clear());
        assert!(side.roster[1].revealed);
        assert_eq!(side.active, Some(1));
    }

    #[test]
    fn test_switch_in_refuses_fainted() {
        let mut side = create_test_side();
        side.switch_in(0);

        assert!(!side.switch_in(2));
        assert_eq!(side.active, Some(0));
        assert!(!side.roster[2].active);
        assert!(!side.switch_in(9));
    }

    #[test]
    fn test_resolve_adopts_preview_entry() {
        let mut side = SideState::new(Player::P2, "rival");
        side.roster.push(Combatant::new("Garchomp", "Garchomp", 77));

        let details = PokemonDetails::parse("Garchomp, L77, M");
        let idx = side.resolve_or_insert("Chompy", &details);
        assert_eq!(idx, 0);
        assert_eq!(side.roster[0].name, "Chompy");

        let other = PokemonDetails::parse("Heatran, L80");
        assert_eq!(side.resolve_or_insert("Heatran", &other), 1);
        assert_eq!(side.roster.len(), 2);
    }

    #[test]
    fn test_find_by_name_or_species() {
        let side = create_test_side();
        assert_eq!(side.find("Charizard"), Some(1));
        assert_eq!(side.find("Unknown"), None);
    }

    #[test]
    fn test_hazard_layers() {
        let mut side = SideState::new(Player::P1, "Test");

        assert!(side.add_condition(SideCondition::StealthRock));
        assert!(!side.add_condition(SideCondition::StealthRock));

        assert!(side.add_condition(SideCondition::Spikes));
        assert!(side.add_condition(SideCondition::Spikes));
        assert!(side.add_condition(SideCondition::Spikes));
        assert!(!side.add_condition(SideCondition::Spikes));
        assert_eq!(side.layers(SideCondition::Spikes), 3);
        assert_eq!(side.hazards.len(), 4);

        assert_eq!(side.remove_condition(SideCondition::Spikes), 3);
        assert_eq!(side.hazards, vec![SideCondition::StealthRock]);
    }

    #[test]
    fn test_screens_are_separate() {
        let mut side = SideState::new(Player::P1, "Test");
        side.add_condition(SideCondition::Reflect);
        side.add_condition(SideCondition::StickyWeb);

        assert_eq!(side.screens, vec![SideCondition::Reflect]);
        assert_eq!(side.hazards, vec![SideCondition::StickyWeb]);
        assert!(!side.add_condition(SideCondition::Tailwind));
    }

    #[test]
    fn test_alive_and_fainted_counts() {
        let side = create_test_side();
        assert_eq!(side.alive_count(), 2);
        assert_eq!(side.fainted_count(), 1);
    }
}
