mod battle;
mod battle_init;
mod battle_major;
mod battle_minor;
mod battle_progress;
mod global;
mod request;
mod room;
mod tests;

use std::collections::HashMap;

use anyhow::Result;
use serde::Deserialize;

use crate::ParseError;

pub use battle::{HpStatus, Player, Pokemon, PokemonDetails, Side, Stat};
pub use request::{
    ActivePokemon, BattleRequest, MoveSlot, PokemonStats, SideInfo, SidePokemon,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    // === Global ===
    Challstr(String),
    UpdateUser {
        user: User,
        named: bool,
        avatar: String,
    },
    NameTaken {
        username: String,
        message: String,
    },
    Popup(String),
    Pm {
        sender: User,
        receiver: User,
        message: String,
    },
    UpdateChallenges(ChallengeState),

    // === Room ===
    Init(RoomType),
    Title(String),
    Deinit,
    Error(String),

    // === Battle initialization ===
    BattlePlayer {
        player: Player,
        username: String,
        avatar: String,
        rating: Option<u32>,
    },
    TeamSize {
        player: Player,
        size: u8,
    },
    Gen(u8),
    Tier(String),
    ClearPoke,
    Poke {
        player: Player,
        details: PokemonDetails,
        has_item: bool,
    },
    TeamPreview,
    BattleStart,

    // === Battle progress ===
    Request(Box<BattleRequest>),
    Upkeep,
    Turn(u32),
    Win(String),
    Tie,

    // === Major actions ===
    Move {
        pokemon: Pokemon,
        move_name: String,
        target: Option<Pokemon>,
        from: Option<String>,
        miss: bool,
    },
    Switch {
        pokemon: Pokemon,
        details: PokemonDetails,
        hp_status: Option<HpStatus>,
    },
    Drag {
        pokemon: Pokemon,
        details: PokemonDetails,
        hp_status: Option<HpStatus>,
    },
    DetailsChange {
        pokemon: Pokemon,
        details: PokemonDetails,
        hp_status: Option<HpStatus>,
    },
    Cant {
        pokemon: Pokemon,
        reason: String,
        move_name: Option<String>,
    },
    Faint(Pokemon),

    // === Minor actions ===
    Damage {
        pokemon: Pokemon,
        hp_status: Option<HpStatus>,
        from: Option<String>,
    },
    Heal {
        pokemon: Pokemon,
        hp_status: Option<HpStatus>,
        from: Option<String>,
    },
    SetHp {
        pokemon: Pokemon,
        hp_status: Option<HpStatus>,
    },
    Status {
        pokemon: Pokemon,
        status: String,
    },
    CureStatus {
        pokemon: Pokemon,
        status: String,
    },
    CureTeam(Pokemon),
    Boost {
        pokemon: Pokemon,
        stat: Stat,
        amount: i8,
    },
    Unboost {
        pokemon: Pokemon,
        stat: Stat,
        amount: i8,
    },
    SetBoost {
        pokemon: Pokemon,
        stat: Stat,
        amount: i8,
    },
    ClearBoost(Pokemon),
    ClearAllBoost,
    Weather {
        weather: String,
        upkeep: bool,
    },
    FieldStart(String),
    FieldEnd(String),
    SideStart {
        side: Side,
        condition: String,
    },
    SideEnd {
        side: Side,
        condition: String,
    },
    VolatileStart {
        pokemon: Pokemon,
        effect: String,
    },
    VolatileEnd {
        pokemon: Pokemon,
        effect: String,
    },
    Item {
        pokemon: Pokemon,
        item: String,
        from: Option<String>,
    },
    EndItem {
        pokemon: Pokemon,
        item: String,
        from: Option<String>,
    },
    Ability {
        pokemon: Pokemon,
        ability: String,
        from: Option<String>,
    },
    Terastallize {
        pokemon: Pokemon,
        tera_type: String,
    },
    Crit(Pokemon),
    SuperEffective(Pokemon),
    Resisted(Pokemon),
    Immune(Pokemon),
    Miss {
        source: Pokemon,
        target: Option<Pokemon>,
    },
    Fail {
        pokemon: Pokemon,
        action: Option<String>,
    },
    Message(String),

    // === Fallbacks ===
    /// A line with a keyword this crate does not model
    Raw(String),
    /// A line with a known keyword whose arguments could not be parsed
    Unparsed {
        line: String,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerFrame {
    pub room_id: Option<String>,
    pub messages: Vec<ServerMessage>,
}

/// A user as displayed by the server: rank symbol followed by the name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub rank: char,
    pub username: String,
}

impl User {
    /// Parse a user string like " Guest 123", "+Voiced" or "Name@!"
    pub fn parse(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        let first = chars.next()?;

        let (rank, rest) = if first.is_alphanumeric() {
            (' ', s)
        } else {
            (first, chars.as_str())
        };

        // Busy/away markers follow an '@'
        let username = rest.split('@').next().unwrap_or(rest).trim();
        if username.is_empty() {
            return None;
        }

        Some(User {
            rank,
            username: username.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomType {
    Chat,
    Battle,
}

/// Payload of |updatechallenges|
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeState {
    /// Incoming challenges: username -> format
    #[serde(default)]
    pub challenges_from: HashMap<String, String>,

    /// Our outgoing challenge, if any
    #[serde(default)]
    pub challenge_to: Option<ChallengeTo>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChallengeTo {
    pub to: String,
    #[serde(default)]
    pub format: String,
}

/// Parse a complete WebSocket frame into structured messages
///
/// Every line is parsed on its own. A line that fails to parse is kept as
/// [`ServerMessage::Unparsed`] so the rest of the frame still goes through.
pub fn parse_server_frame(frame: &str) -> ServerFrame {
    let mut lines = frame.lines().peekable();
    let mut room_id = None;

    // Check if first line is >ROOMID
    if let Some(room) = lines.peek().and_then(|line| line.strip_prefix('>')) {
        room_id = Some(room.trim().to_string());
        lines.next();
    }

    let messages = lines
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            parse_server_message(line).unwrap_or_else(|e| ServerMessage::Unparsed {
                line: line.to_string(),
                error: e.to_string(),
            })
        })
        .collect();

    ServerFrame { room_id, messages }
}

/// Parse a single line from the server into a ServerMessage
pub fn parse_server_message(line: &str) -> Result<ServerMessage> {
    let line = line.trim_end_matches(['\r', '\n']);

    if line.is_empty() {
        return Ok(ServerMessage::Raw(String::new()));
    }

    if !line.starts_with('|') {
        return Ok(ServerMessage::Raw(line.to_string()));
    }

    let parts: Vec<&str> = line.split('|').collect();

    if parts.len() < 2 {
        return Ok(ServerMessage::Raw(line.to_string()));
    }

    match parts[1] {
        // Global
        "challstr" => global::parse_challstr(&parts),
        "updateuser" => global::parse_updateuser(&parts),
        "nametaken" => global::parse_nametaken(&parts),
        "popup" => global::parse_popup(&parts),
        "pm" => global::parse_pm(&parts),
        "updatechallenges" => global::parse_updatechallenges(&parts),

        // Room
        "init" => room::parse_init(&parts),
        "title" => room::parse_title(&parts),
        "deinit" => Ok(ServerMessage::Deinit),
        "error" => room::parse_error(&parts),

        // Battle initialization
        "player" => battle_init::parse_player(&parts),
        "teamsize" => battle_init::parse_teamsize(&parts),
        "gen" => battle_init::parse_gen(&parts),
        "tier" => battle_init::parse_tier(&parts),
        "clearpoke" => Ok(ServerMessage::ClearPoke),
        "poke" => battle_init::parse_poke(&parts),
        "teampreview" => Ok(ServerMessage::TeamPreview),
        "start" => Ok(ServerMessage::BattleStart),

        // Battle progress
        "request" => battle_progress::parse_request(&parts),
        "upkeep" => Ok(ServerMessage::Upkeep),
        "turn" => battle_progress::parse_turn(&parts),
        "win" => battle_progress::parse_win(&parts),
        "tie" => Ok(ServerMessage::Tie),

        // Major actions
        "move" => battle_major::parse_move(&parts),
        "switch" => battle_major::parse_switch(&parts),
        "drag" => battle_major::parse_drag(&parts),
        "detailschange" => battle_major::parse_detailschange(&parts),
        "cant" => battle_major::parse_cant(&parts),
        "faint" => battle_major::parse_faint(&parts),

        // Minor actions
        "-damage" => battle_minor::parse_damage(&parts),
        "-heal" => battle_minor::parse_heal(&parts),
        "-sethp" => battle_minor::parse_sethp(&parts),
        "-status" => battle_minor::parse_status(&parts),
        "-curestatus" => battle_minor::parse_curestatus(&parts),
        "-cureteam" => battle_minor::parse_cureteam(&parts),
        "-boost" => battle_minor::parse_boost(&parts),
        "-unboost" => battle_minor::parse_unboost(&parts),
        "-setboost" => battle_minor::parse_setboost(&parts),
        "-clearboost" => battle_minor::parse_clearboost(&parts),
        "-clearallboost" => Ok(ServerMessage::ClearAllBoost),
        "-weather" => battle_minor::parse_weather(&parts),
        "-fieldstart" => battle_minor::parse_fieldstart(&parts),
        "-fieldend" => battle_minor::parse_fieldend(&parts),
        "-sidestart" => battle_minor::parse_sidestart(&parts),
        "-sideend" => battle_minor::parse_sideend(&parts),
        "-start" => battle_minor::parse_volatile_start(&parts),
        "-end" => battle_minor::parse_volatile_end(&parts),
        "-item" => battle_minor::parse_item(&parts),
        "-enditem" => battle_minor::parse_enditem(&parts),
        "-ability" => battle_minor::parse_ability(&parts),
        "-terastallize" => battle_minor::parse_terastallize(&parts),
        "-crit" => battle_minor::parse_crit(&parts),
        "-supereffective" => battle_minor::parse_supereffective(&parts),
        "-resisted" => battle_minor::parse_resisted(&parts),
        "-immune" => battle_minor::parse_immune(&parts),
        "-miss" => battle_minor::parse_miss(&parts),
        "-fail" => battle_minor::parse_fail(&parts),
        "-message" => battle_minor::parse_message(&parts),

        _ => Ok(ServerMessage::Raw(line.to_string())),
    }
}

/// Non-empty field at `index`
pub(crate) fn field<'a>(parts: &[&'a str], index: usize, name: &str) -> Result<&'a str, ParseError> {
    parts
        .get(index)
        .copied()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ParseError::MissingField(name.to_string()))
}

/// Field at `index` parsed as `T`
pub(crate) fn number<T: std::str::FromStr>(parts: &[&str], index: usize, name: &str) -> Result<T, ParseError> {
    let raw = field(parts, index, name)?;
    raw.trim()
        .parse()
        .map_err(|_| ParseError::InvalidFormat(format!("{} is not a number: {:?}", name, raw)))
}

/// Fields from `index` on, rejoined with `|`
///
/// Free text and JSON payloads may themselves contain `|`.
pub(crate) fn tail(parts: &[&str], index: usize) -> String {
    parts.get(index..).map(|rest| rest.join("|")).unwrap_or_default()
}

/// Find the `[from] EFFECT` tag among trailing message parts
pub(crate) fn find_from_tag(parts: &[&str], start: usize) -> Option<String> {
    parts.iter().skip(start).find_map(|part| {
        part.strip_prefix("[from]")
            .map(|effect| effect.trim().to_string())
    })
}
