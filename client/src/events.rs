use pilot_battle::{BattleState, Transcript};
use pilot_protocol::ChallengeState;

/// How a battle ended, from our side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won,
    Lost,
    Tie,
    /// We forfeited
    Forfeited,
    /// The room closed before a result was announced
    Abandoned,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Outcome::Won => "won",
            Outcome::Lost => "lost",
            Outcome::Tie => "tie",
            Outcome::Forfeited => "forfeited",
            Outcome::Abandoned => "abandoned",
        };
        f.write_str(text)
    }
}

/// Final snapshot of a battle, delivered once when it ends
#[derive(Debug, Clone)]
pub struct BattleConcluded {
    pub room_id: String,
    pub final_state: BattleState,
    pub transcript: Transcript,
    pub outcome: Outcome,
}

/// Something the receive loop observed, in arrival order
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Challstr(String),
    UserUpdated {
        username: String,
        named: bool,
    },
    NameTaken {
        username: String,
        message: String,
    },
    Challenges(ChallengeState),
    Popup(String),
    Pm {
        from: String,
        message: String,
    },
    BattleStarted {
        room_id: String,
    },
    BattleEvents {
        room_id: String,
        events: Vec<String>,
    },
    BattleConcluded(Box<BattleConcluded>),
    /// Room or global line with no dedicated event
    Raw {
        room: Option<String>,
        line: String,
    },
}
