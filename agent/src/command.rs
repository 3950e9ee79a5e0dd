//! Oracle reply parsing and local validation of battle choices

use std::collections::BTreeSet;
use std::str::FromStr;

use pilot_battle::{BattleState, DecisionKind};
use thiserror::Error;

/// Marker the oracle puts in front of its choice
pub const CHOICE_MARKER: &str = "CHOSEN MOVE:";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("reply has no \"CHOSEN MOVE:\" line")]
    MissingMarker,

    #[error("empty command")]
    Empty,

    #[error("unrecognized command {0:?}, expected \"move N\", \"move Nt\" or \"switch N\"")]
    Unrecognized(String),

    #[error("invalid index in {0:?}")]
    InvalidIndex(String),

    #[error("no decision is pending")]
    NoDecision,

    #[error("a {0} decision cannot be answered with {1:?}")]
    WrongKind(DecisionKind, String),

    #[error("move {0} is not available")]
    MoveUnavailable(usize),

    #[error("switch {0} is not available")]
    SwitchUnavailable(usize),

    #[error("switching is not possible right now")]
    SwitchingBlocked,

    #[error("{0:?} was already rejected, choose something else")]
    Excluded(String),

    #[error("cannot terastallize: {0}")]
    TeraUnavailable(&'static str),
}

/// A parsed battle choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Use the move at a 1-based index, optionally terastallizing
    Move { index: usize, tera: bool },
    /// Switch to the roster member at a 1-based index
    Switch { index: usize },
}

impl Command {
    /// Parse a command such as `move 2`, `move 1t`, `move 3 tera` or `switch 4`
    ///
    /// Matching ignores case and surrounding whitespace or markdown.
    pub fn parse(text: &str) -> Result<Self, CommandError> {
        let cleaned = text
            .trim()
            .trim_matches(|c: char| matches!(c, '*' | '`' | '"' | '\'' | '.' | '!'))
            .trim()
            .to_ascii_lowercase();

        if cleaned.is_empty() {
            return Err(CommandError::Empty);
        }

        if let Some(rest) = cleaned.strip_prefix("move") {
            let (index, suffix) = split_index(rest).ok_or_else(|| CommandError::InvalidIndex(cleaned.clone()))?;
            let suffix = suffix.trim_start_matches([',', ' ', '\t']).trim();
            let tera = match suffix {
                "" => false,
                "t" | "tera" | "terastallize" | "terastalize" | "terastallise" | "transform" => true,
                _ => return Err(CommandError::Unrecognized(cleaned)),
            };
            return Ok(Command::Move { index, tera });
        }

        if let Some(rest) = cleaned.strip_prefix("switch") {
            let (index, suffix) = split_index(rest).ok_or_else(|| CommandError::InvalidIndex(cleaned.clone()))?;
            if !suffix.trim().is_empty() {
                return Err(CommandError::Unrecognized(cleaned));
            }
            return Ok(Command::Switch { index });
        }

        Err(CommandError::Unrecognized(cleaned))
    }

    /// Argument for `/choose`
    pub fn to_choice(&self) -> String {
        match self {
            Command::Move { index, tera: false } => format!("move {}", index),
            Command::Move { index, tera: true } => format!("move {} terastallize", index),
            Command::Switch { index } => format!("switch {}", index),
        }
    }

    pub fn is_tera(&self) -> bool {
        matches!(self, Command::Move { tera: true, .. })
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::parse(s)
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_choice())
    }
}

/// Leading 1-based index and whatever follows it
fn split_index(text: &str) -> Option<(usize, &str)> {
    let text = text.trim_start();
    let end = text.find(|c: char| !c.is_ascii_digit()).unwrap_or(text.len());
    let index: usize = text[..end].parse().ok()?;
    (index > 0).then_some((index, &text[end..]))
}

/// Split an oracle reply into its rationale and the chosen command
///
/// The reply is cut at the first `CHOSEN MOVE:`; the first non-empty line
/// after it is the command.
pub fn parse_reply(reply: &str) -> (String, Result<Command, CommandError>) {
    let Some((rationale, rest)) = reply.split_once(CHOICE_MARKER) else {
        return (reply.trim().to_string(), Err(CommandError::MissingMarker));
    };

    let line = rest.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    (rationale.trim().to_string(), Command::parse(line))
}

/// Options ruled out for the current decision point
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusions {
    moves: BTreeSet<usize>,
    tera_moves: BTreeSet<usize>,
    switches: BTreeSet<usize>,
    no_switching: bool,
    no_tera: bool,
}

impl Exclusions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rule out exactly this command
    pub fn exclude(&mut self, command: Command) {
        match command {
            Command::Move { index, tera: false } => {
                self.moves.insert(index);
            }
            Command::Move { index, tera: true } => {
                self.tera_moves.insert(index);
            }
            Command::Switch { index } => {
                self.switches.insert(index);
            }
        }
    }

    /// Rule out a move with or without tera
    pub fn exclude_move(&mut self, index: usize) {
        self.moves.insert(index);
    }

    pub fn block_switching(&mut self) {
        self.no_switching = true;
    }

    pub fn block_tera(&mut self) {
        self.no_tera = true;
    }

    pub fn allows_move(&self, index: usize) -> bool {
        !self.moves.contains(&index)
    }

    pub fn allows_tera(&self, index: usize) -> bool {
        !self.no_tera && self.allows_move(index) && !self.tera_moves.contains(&index)
    }

    pub fn allows_switch(&self, index: usize) -> bool {
        !self.no_switching && !self.switches.contains(&index)
    }

    pub fn switching_blocked(&self) -> bool {
        self.no_switching
    }

    pub fn allows(&self, command: Command) -> bool {
        match command {
            Command::Move { index, tera: false } => self.allows_move(index),
            Command::Move { index, tera: true } => self.allows_tera(index),
            Command::Switch { index } => self.allows_switch(index),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Check a command against the latest request before sending it
pub fn validate(command: Command, battle: &BattleState, exclusions: &Exclusions) -> Result<(), CommandError> {
    let legal = battle
        .legal
        .as_ref()
        .filter(|_| battle.decision_pending)
        .ok_or(CommandError::NoDecision)?;

    match command {
        Command::Move { index, tera } => {
            if legal.kind != DecisionKind::Move {
                return Err(CommandError::WrongKind(legal.kind, command.to_choice()));
            }
            let mv = legal.move_by_index(index).ok_or(CommandError::MoveUnavailable(index))?;

            if tera {
                let active_tera = battle
                    .me()
                    .and_then(|side| side.active_combatant())
                    .is_some_and(|c| c.terastallized);

                if battle.tera_used() {
                    return Err(CommandError::TeraUnavailable("already used this battle"));
                }
                if active_tera {
                    return Err(CommandError::TeraUnavailable("the active Pokemon is already terastallized"));
                }
                if !mv.can_terastallize {
                    return Err(CommandError::TeraUnavailable("not offered for this move"));
                }
            }

            if !exclusions.allows(command) {
                return Err(CommandError::Excluded(command.to_choice()));
            }
        }
        Command::Switch { index } => {
            if legal.kind == DecisionKind::TeamPreview {
                return Err(CommandError::WrongKind(legal.kind, command.to_choice()));
            }
            if legal.trapped || exclusions.switching_blocked() {
                return Err(CommandError::SwitchingBlocked);
            }
            legal.switch_by_index(index).ok_or(CommandError::SwitchUnavailable(index))?;
            if !exclusions.allows(command) {
                return Err(CommandError::Excluded(command.to_choice()));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pilot_protocol::parse_server_message;

    fn battle_with_request(request: &str) -> BattleState {
        let mut battle = BattleState::for_user("battle-gen9randombattle-1", "Pilot");
        let message = parse_server_message(&format!("|request|{}", request)).unwrap();
        battle.apply(&message);
        battle
    }

    const MOVE_REQUEST: &str = r#"{"active":[{"moves":[{"move":"Earthquake","id":"earthquake","pp":16,"maxpp":16,"disabled":false},{"move":"Dragon Claw","id":"dragonclaw","pp":24,"maxpp":24,"disabled":true},{"move":"Swords Dance","id":"swordsdance","pp":32,"maxpp":32,"disabled":false}],"canTerastallize":"Ground"}],"side":{"name":"Pilot","id":"p1","pokemon":[{"ident":"p1: Garchomp","details":"Garchomp, L77, M","condition":"271/271","active":true,"moves":["earthquake","dragonclaw","swordsdance"],"teraType":"Ground","terastallized":""},{"ident":"p1: Rotom","details":"Rotom-Wash, L86","condition":"240/240","active":false,"moves":["hydropump"]},{"ident":"p1: Gholdengo","details":"Gholdengo, L79","condition":"0 fnt","active":false,"moves":["makeitrain"]}]},"rqid":3}"#;

    #[test]
    fn test_parse_grammar() {
        let cases = [
            ("move 1", Command::Move { index: 1, tera: false }),
            ("MOVE 2", Command::Move { index: 2, tera: false }),
            ("move 1t", Command::Move { index: 1, tera: true }),
            ("move 3 t", Command::Move { index: 3, tera: true }),
            ("move 2 tera", Command::Move { index: 2, tera: true }),
            ("move 4 terastallize", Command::Move { index: 4, tera: true }),
            ("move 1,transform", Command::Move { index: 1, tera: true }),
            ("  switch 5 ", Command::Switch { index: 5 }),
            ("**switch 2**", Command::Switch { index: 2 }),
            ("`move 1`.", Command::Move { index: 1, tera: false }),
        ];

        for (text, expected) in cases {
            assert_eq!(Command::parse(text), Ok(expected), "parsing {:?}", text);
        }
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Command::parse("   "), Err(CommandError::Empty));
        assert!(matches!(Command::parse("move"), Err(CommandError::InvalidIndex(_))));
        assert!(matches!(Command::parse("move 0"), Err(CommandError::InvalidIndex(_))));
        assert!(matches!(Command::parse("switch two"), Err(CommandError::InvalidIndex(_))));
        assert!(matches!(Command::parse("move 1 mega"), Err(CommandError::Unrecognized(_))));
        assert!(matches!(Command::parse("switch 2t"), Err(CommandError::Unrecognized(_))));
        assert!(matches!(Command::parse("use earthquake"), Err(CommandError::Unrecognized(_))));
    }

    #[test]
    fn test_to_choice() {
        assert_eq!(Command::Move { index: 2, tera: false }.to_choice(), "move 2");
        assert_eq!(Command::Move { index: 1, tera: true }.to_choice(), "move 1 terastallize");
        assert_eq!(Command::Switch { index: 3 }.to_string(), "switch 3");
        assert_eq!("move 1t".parse::<Command>().unwrap().to_choice(), "move 1 terastallize");
    }

    #[test]
    fn test_parse_reply() {
        let reply = "Heatran is weak to Ground.\nEarthquake should finish it.\n\nCHOSEN MOVE: move 1\nGood luck!";
        let (rationale, command) = parse_reply(reply);
        assert_eq!(rationale, "Heatran is weak to Ground.\nEarthquake should finish it.");
        assert_eq!(command, Ok(Command::Move { index: 1, tera: false }));

        // Command on the line after the marker, second marker ignored
        let (_, command) = parse_reply("ok\nCHOSEN MOVE:\n  switch 2\nCHOSEN MOVE: move 1");
        assert_eq!(command, Ok(Command::Switch { index: 2 }));

        let (rationale, command) = parse_reply("I would use Earthquake.");
        assert_eq!(rationale, "I would use Earthquake.");
        assert_eq!(command, Err(CommandError::MissingMarker));

        let (_, command) = parse_reply("CHOSEN MOVE: Earthquake");
        assert!(matches!(command, Err(CommandError::Unrecognized(_))));
    }

    #[test]
    fn test_exclusions() {
        let mut exclusions = Exclusions::new();
        assert!(exclusions.is_empty());

        exclusions.exclude(Command::Move { index: 1, tera: true });
        assert!(exclusions.allows(Command::Move { index: 1, tera: false }));
        assert!(!exclusions.allows(Command::Move { index: 1, tera: true }));

        exclusions.exclude(Command::Move { index: 2, tera: false });
        assert!(!exclusions.allows_move(2));
        assert!(!exclusions.allows_tera(2));

        exclusions.exclude(Command::Switch { index: 3 });
        assert!(!exclusions.allows_switch(3));
        assert!(exclusions.allows_switch(4));

        exclusions.block_switching();
        assert!(!exclusions.allows_switch(4));

        exclusions.block_tera();
        assert!(!exclusions.allows_tera(3));
        assert!(!exclusions.is_empty());
    }

    #[test]
    fn test_validate_moves() {
        let battle = battle_with_request(MOVE_REQUEST);
        let none = Exclusions::new();

        assert_eq!(validate(Command::Move { index: 1, tera: false }, &battle, &none), Ok(()));
        assert_eq!(validate(Command::Move { index: 3, tera: true }, &battle, &none), Ok(()));
        // Disabled moves are not in the legal list
        assert_eq!(
            validate(Command::Move { index: 2, tera: false }, &battle, &none),
            Err(CommandError::MoveUnavailable(2))
        );
        assert_eq!(
            validate(Command::Move { index: 5, tera: false }, &battle, &none),
            Err(CommandError::MoveUnavailable(5))
        );

        let mut excluded = Exclusions::new();
        excluded.exclude(Command::Move { index: 1, tera: false });
        assert_eq!(
            validate(Command::Move { index: 1, tera: false }, &battle, &excluded),
            Err(CommandError::Excluded("move 1".to_string()))
        );
    }

    #[test]
    fn test_validate_tera_after_use() {
        let mut battle = battle_with_request(MOVE_REQUEST);
        battle.mark_tera_used();

        let result = validate(Command::Move { index: 1, tera: true }, &battle, &Exclusions::new());
        assert!(matches!(result, Err(CommandError::TeraUnavailable(_))));
        assert_eq!(validate(Command::Move { index: 1, tera: false }, &battle, &Exclusions::new()), Ok(()));
    }

    #[test]
    fn test_validate_switches() {
        let battle = battle_with_request(MOVE_REQUEST);
        let none = Exclusions::new();

        assert_eq!(validate(Command::Switch { index: 2 }, &battle, &none), Ok(()));
        // Active and fainted members are not switch targets
        assert_eq!(
            validate(Command::Switch { index: 1 }, &battle, &none),
            Err(CommandError::SwitchUnavailable(1))
        );
        assert_eq!(
            validate(Command::Switch { index: 3 }, &battle, &none),
            Err(CommandError::SwitchUnavailable(3))
        );

        let mut blocked = Exclusions::new();
        blocked.block_switching();
        assert_eq!(
            validate(Command::Switch { index: 2 }, &battle, &blocked),
            Err(CommandError::SwitchingBlocked)
        );
    }

    #[test]
    fn test_validate_without_request() {
        let battle = BattleState::for_user("battle-gen9randombattle-1", "Pilot");
        assert_eq!(
            validate(Command::Move { index: 1, tera: false }, &battle, &Exclusions::new()),
            Err(CommandError::NoDecision)
        );
    }

    #[test]
    fn test_validate_force_switch() {
        let battle = battle_with_request(
            r#"{"forceSwitch":[true],"side":{"name":"Pilot","id":"p1","pokemon":[{"ident":"p1: Garchomp","details":"Garchomp, L77, M","condition":"0 fnt","active":true},{"ident":"p1: Rotom","details":"Rotom-Wash, L86","condition":"240/240","active":false}]},"rqid":5}"#,
        );

        assert!(matches!(
            validate(Command::Move { index: 1, tera: false }, &battle, &Exclusions::new()),
            Err(CommandError::WrongKind(DecisionKind::ForceSwitch, _))
        ));
        assert_eq!(validate(Command::Switch { index: 2 }, &battle, &Exclusions::new()), Ok(()));
    }
}
