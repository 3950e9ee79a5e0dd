//! BattleState - the model of one battle as seen from one player

use pilot_protocol::{Player, to_id};

use super::legal::LegalActions;
use crate::types::{FieldState, SideState};

/// A battle being tracked from server messages
///
/// This struct reconstructs battle state from the protocol messages
/// received from the Pokemon Showdown server. It keeps the perspective
/// of one player and only knows what the server has revealed to it.
#[derive(Debug, Clone, PartialEq)]
pub struct BattleState {
    // === Battle metadata ===
    /// Room the battle runs in (e.g. "battle-gen9randombattle-123")
    pub room_id: String,

    /// Format/tier name
    pub format: String,

    /// Generation (1-9)
    pub generation: u8,

    /// Current turn number (0 = not started)
    pub turn: u32,

    // === State ===
    /// Global field state (weather, terrain, etc.)
    pub field: FieldState,

    /// Player sides, indexed by [`Player::index`]
    pub(crate) sides: [Option<SideState>; 2],

    // === Perspective ===
    /// Which player we are, assigned once
    perspective: Option<Player>,

    /// Our own username, used to recognize our side in `|player|`
    own_username: Option<String>,

    // === Decision tracking ===
    /// A request is waiting for our answer
    pub decision_pending: bool,

    /// What the latest request allows, replaced wholesale on every request
    pub legal: Option<LegalActions>,

    /// Bumped on every request that requires action
    pub request_seq: u64,

    /// Bumped on every `|error|` line
    pub rejection_seq: u64,

    /// Text of the latest `|error|` line
    pub last_rejection: Option<String>,

    // === Outcome ===
    /// Whether the battle has ended
    pub ended: bool,

    /// Winner's username (if ended)
    pub winner: Option<String>,

    /// Whether the battle ended in a tie
    pub tie: bool,
}

impl BattleState {
    /// Create a state for a battle room with no known perspective
    pub fn new(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            format: String::new(),
            generation: 9,
            turn: 0,
            field: FieldState::new(),
            sides: [None, None],
            perspective: None,
            own_username: None,
            decision_pending: false,
            legal: None,
            request_seq: 0,
            rejection_seq: 0,
            last_rejection: None,
            ended: false,
            winner: None,
            tie: false,
        }
    }

    /// Create a state that will take the side of `username` once `|player|` names it
    pub fn for_user(room_id: impl Into<String>, username: &str) -> Self {
        let mut state = Self::new(room_id);
        state.own_username = Some(username.to_string());
        state
    }

    /// Set the perspective, returns false if one was already assigned
    pub fn set_perspective(&mut self, player: Player) -> bool {
        if self.perspective.is_some() {
            return false;
        }
        self.perspective = Some(player);
        true
    }

    pub fn perspective(&self) -> Option<Player> {
        self.perspective
    }

    pub fn own_username(&self) -> Option<&str> {
        self.own_username.as_deref()
    }

    /// Whether `username` is our own account (compared by id)
    pub fn is_own_username(&self, username: &str) -> bool {
        self.own_username
            .as_deref()
            .is_some_and(|own| to_id(own) == to_id(username))
    }

    /// Get our side (based on perspective)
    pub fn me(&self) -> Option<&SideState> {
        self.perspective.and_then(|p| self.side(p))
    }

    pub fn me_mut(&mut self) -> Option<&mut SideState> {
        self.perspective.and_then(|p| self.side_mut(p))
    }

    /// Get the opponent's side
    pub fn opponent(&self) -> Option<&SideState> {
        self.perspective.and_then(|p| self.side(p.opponent()))
    }

    pub fn opponent_mut(&mut self) -> Option<&mut SideState> {
        self.perspective.and_then(|p| self.side_mut(p.opponent()))
    }

    /// Get a side by player
    pub fn side(&self, player: Player) -> Option<&SideState> {
        self.sides[player.index()].as_ref()
    }

    pub fn side_mut(&mut self, player: Player) -> Option<&mut SideState> {
        self.sides[player.index()].as_mut()
    }

    /// Get or create a side for a player
    pub fn side_entry(&mut self, player: Player) -> &mut SideState {
        self.sides[player.index()].get_or_insert_with(|| SideState::new(player, ""))
    }

    /// Iterate over all initialized sides
    pub fn sides(&self) -> impl Iterator<Item = &SideState> {
        self.sides.iter().filter_map(|s| s.as_ref())
    }

    pub fn sides_mut(&mut self) -> impl Iterator<Item = &mut SideState> {
        self.sides.iter_mut().filter_map(|s| s.as_mut())
    }

    /// Whether `player` is the opponent; false while the perspective is unknown
    pub fn is_opponent(&self, player: Player) -> bool {
        self.perspective.is_some_and(|p| p != player)
    }

    /// Name as used in battle text ("The opposing Garchomp" for the opponent)
    pub fn display_name(&self, player: Player, name: &str) -> String {
        if self.is_opponent(player) {
            format!("The opposing {}", name)
        } else {
            name.to_string()
        }
    }

    /// Check if the battle is in progress
    pub fn is_active(&self) -> bool {
        self.turn > 0 && !self.ended
    }

    /// Whether our side has spent its terastallization
    pub fn tera_used(&self) -> bool {
        self.me().is_some_and(|side| side.tera_used)
    }

    /// Set our side's tera flag; it never goes back to false
    pub fn mark_tera_used(&mut self) {
        if let Some(side) = self.me_mut() {
            side.tera_used = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_battle() {
        let battle = BattleState::new("battle-gen9randombattle-1");
        assert_eq!(battle.turn, 0);
        assert!(!battle.ended);
        assert!(battle.perspective().is_none());
        assert!(!battle.decision_pending);
        assert!(battle.legal.is_none());
    }

    #[test]
    fn test_perspective_is_assigned_once() {
        let mut battle = BattleState::new("room");
        assert!(battle.set_perspective(Player::P2));
        assert!(!battle.set_perspective(Player::P1));
        assert_eq!(battle.perspective(), Some(Player::P2));
    }

    #[test]
    fn test_me_and_opponent() {
        let mut battle = BattleState::new("room");
        battle.side_entry(Player::P1).username = "Alice".to_string();
        battle.side_entry(Player::P2).username = "Bob".to_string();

        assert!(battle.me().is_none());
        assert!(battle.opponent().is_none());

        battle.set_perspective(Player::P2);
        assert_eq!(battle.me().unwrap().username, "Bob");
        assert_eq!(battle.opponent().unwrap().username, "Alice");
    }

    #[test]
    fn test_display_name_follows_perspective() {
        let mut battle = BattleState::new("room");
        assert_eq!(battle.display_name(Player::P2, "Garchomp"), "Garchomp");

        battle.set_perspective(Player::P2);
        assert_eq!(battle.display_name(Player::P2, "Garchomp"), "Garchomp");
        assert_eq!(
            battle.display_name(Player::P1, "Garchomp"),
            "The opposing Garchomp"
        );
    }

    #[test]
    fn test_own_username_compares_ids() {
        let battle = BattleState::for_user("room", "Pilot Bot");
        assert!(battle.is_own_username("pilotbot"));
        assert!(battle.is_own_username(" Pilot-Bot"));
        assert!(!battle.is_own_username("rival"));
    }

    #[test]
    fn test_mark_tera_used_needs_perspective() {
        let mut battle = BattleState::new("room");
        battle.side_entry(Player::P1);
        battle.mark_tera_used();
        assert!(!battle.tera_used());

        battle.set_perspective(Player::P1);
        battle.mark_tera_used();
        assert!(battle.tera_used());
    }
}
