//! Legal actions derived from a `|request|` payload

use pilot_protocol::{BattleRequest, SidePokemon};

use crate::types::round1;

/// What kind of answer the current request expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecisionKind {
    Move,
    ForceSwitch,
    TeamPreview,
}

impl std::fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DecisionKind::Move => "move",
            DecisionKind::ForceSwitch => "force switch",
            DecisionKind::TeamPreview => "team preview",
        };
        f.write_str(name)
    }
}

/// A move the server will accept
#[derive(Debug, Clone, PartialEq)]
pub struct LegalMove {
    /// 1-based position in the request's move list
    pub index: usize,
    pub name: String,
    pub id: String,
    pub move_type: Option<String>,
    pub pp: u32,
    pub max_pp: u32,
    /// May be combined with terastallization
    pub can_terastallize: bool,
}

/// A roster member that can be switched in
#[derive(Debug, Clone, PartialEq)]
pub struct LegalSwitch {
    /// 1-based position in the request's roster
    pub index: usize,
    pub name: String,
    pub species: String,
    /// Condition text as sent by the server ("187/250 par")
    pub condition: String,
    pub hp_percent: f64,
}

/// Everything the latest request allows
#[derive(Debug, Clone, PartialEq)]
pub struct LegalActions {
    pub kind: DecisionKind,
    pub moves: Vec<LegalMove>,
    pub switches: Vec<LegalSwitch>,
    /// The active Pokemon cannot switch out
    pub trapped: bool,
    pub can_terastallize: bool,
}

impl LegalActions {
    /// Compute legal actions from a request, `None` if it needs no answer
    pub fn from_request(request: &BattleRequest, tera_used: bool) -> Option<Self> {
        if !request.needs_decision() {
            return None;
        }

        let roster = request
            .side
            .as_ref()
            .map(|side| side.pokemon.as_slice())
            .unwrap_or_default();

        if request.team_preview {
            return Some(LegalActions {
                kind: DecisionKind::TeamPreview,
                moves: Vec::new(),
                switches: roster
                    .iter()
                    .enumerate()
                    .map(|(i, member)| legal_switch(i, member))
                    .collect(),
                trapped: false,
                can_terastallize: false,
            });
        }

        let switches = roster
            .iter()
            .enumerate()
            .filter(|(_, member)| !member.active && !member.is_fainted())
            .map(|(i, member)| legal_switch(i, member))
            .collect();

        if request.is_force_switch() {
            return Some(LegalActions {
                kind: DecisionKind::ForceSwitch,
                moves: Vec::new(),
                switches,
                trapped: false,
                can_terastallize: false,
            });
        }

        let active = request.active.first();
        let can_terastallize =
            !tera_used && active.is_some_and(|a| a.can_terastallize.is_some());

        let moves = active
            .map(|a| {
                a.available_moves()
                    .into_iter()
                    .map(|(i, slot)| LegalMove {
                        index: i + 1,
                        name: slot.name.clone(),
                        id: slot.id.clone(),
                        move_type: slot.move_type.clone(),
                        pp: slot.pp,
                        max_pp: slot.max_pp,
                        can_terastallize,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(LegalActions {
            kind: DecisionKind::Move,
            moves,
            switches,
            trapped: active.is_some_and(|a| a.trapped),
            can_terastallize,
        })
    }

    /// Look up a legal move by its 1-based index
    pub fn move_by_index(&self, index: usize) -> Option<&LegalMove> {
        self.moves.iter().find(|m| m.index == index)
    }

    /// Look up a legal switch by its 1-based index
    pub fn switch_by_index(&self, index: usize) -> Option<&LegalSwitch> {
        self.switches.iter().find(|s| s.index == index)
    }
}

fn legal_switch(position: usize, member: &SidePokemon) -> LegalSwitch {
    let hp_percent = match member.hp() {
        _ if member.is_fainted() => 0.0,
        Some((_, 0)) | None => 0.0,
        Some((current, max)) => round1(f64::from(current) / f64::from(max) * 100.0),
    };

    LegalSwitch {
        index: position + 1,
        name: member.name().to_string(),
        species: member.species().to_string(),
        condition: member.condition.clone(),
        hp_percent,
    }
}
