//! Global field state

use pilot_protocol::Player;

use super::conditions::{Terrain, Weather};

/// Global field state affecting all Pokemon
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldState {
    /// Current weather condition
    pub weather: Option<Weather>,

    /// Current terrain
    pub terrain: Option<Terrain>,

    /// Trick Room active (slower Pokemon move first)
    pub trick_room: bool,

    /// Tailwind per side, indexed by [`Player::index`]
    pub tailwind: [bool; 2],
}

impl FieldState {
    /// Create a new empty field state
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the weather from a `-weather` argument; "none" clears it
    pub fn set_weather(&mut self, weather: &str) {
        self.weather = Weather::from_protocol(weather);
    }

    /// Apply a `-fieldstart` condition
    ///
    /// Matching is by substring: "trick room" and the four terrains are the
    /// only field conditions tracked. An unrecognised terrain leaves the
    /// current one in place.
    pub fn apply_field_start(&mut self, condition: &str) {
        let lower = condition.to_lowercase();

        if lower.contains("trick room") {
            self.trick_room = true;
        } else if lower.contains("terrain")
            && let Some(terrain) = Terrain::from_protocol(&lower)
        {
            self.terrain = Some(terrain);
        }
    }

    /// Apply a `-fieldend` condition
    pub fn apply_field_end(&mut self, condition: &str) {
        let lower = condition.to_lowercase();

        if lower.contains("trick room") {
            self.trick_room = false;
        } else if lower.contains("terrain") {
            self.terrain = None;
        }
    }

    pub fn tailwind(&self, player: Player) -> bool {
        self.tailwind[player.index()]
    }

    pub fn set_tailwind(&mut self, player: Player, active: bool) {
        self.tailwind[player.index()] = active;
    }

    /// Check if any field condition is active
    pub fn has_any_condition(&self) -> bool {
        self.weather.is_some() || self.terrain.is_some() || self.trick_room
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_field_is_empty() {
        let field = FieldState::new();
        assert!(field.weather.is_none());
        assert!(field.terrain.is_none());
        assert!(!field.has_any_condition());
    }

    #[test]
    fn test_field_start_and_end() {
        let mut field = FieldState::new();

        field.apply_field_start("move: Trick Room");
        assert!(field.trick_room);

        field.apply_field_start("move: Grassy Terrain");
        assert_eq!(field.terrain, Some(Terrain::Grassy));

        field.apply_field_end("move: Trick Room");
        assert!(!field.trick_room);
        assert_eq!(field.terrain, Some(Terrain::Grassy));

        field.apply_field_end("Grassy Terrain");
        assert!(field.terrain.is_none());
    }

    #[test]
    fn test_unknown_terrain_keeps_current() {
        let mut field = FieldState::new();
        field.apply_field_start("move: Misty Terrain");
        field.apply_field_start("move: Sparkling Terrain");
        assert_eq!(field.terrain, Some(Terrain::Misty));
    }

    #[test]
    fn test_untracked_field_condition_is_ignored() {
        let mut field = FieldState::new();
        field.apply_field_start("move: Gravity");
        assert_eq!(field, FieldState::new());
    }

    #[test]
    fn test_weather_replace_and_clear() {
        let mut field = FieldState::new();
        field.set_weather("RainDance");
        assert_eq!(field.weather, Some(Weather::Rain));

        field.set_weather("none");
        assert!(field.weather.is_none());
    }

    #[test]
    fn test_tailwind_per_side() {
        let mut field = FieldState::new();
        field.set_tailwind(Player::P2, true);
        assert!(field.tailwind(Player::P2));
        assert!(!field.tailwind(Player::P1));
        assert!(!field.has_any_condition());
    }
}
