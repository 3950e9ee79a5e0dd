//! Parsers for major actions: moves, switches and faints

use anyhow::Result;

use super::battle::{HpStatus, Pokemon, PokemonDetails, parse_details, parse_hp_status, parse_pokemon};
use super::{ServerMessage, field, find_from_tag};

/// POKEMON|DETAILS|HP STATUS, shared by switch, drag and detailschange
fn entrance(parts: &[&str]) -> Result<(Pokemon, PokemonDetails, Option<HpStatus>)> {
    Ok((parse_pokemon(parts, 2)?, parse_details(parts, 3), parse_hp_status(parts, 4)))
}

/// |move|POKEMON|MOVE|TARGET followed by tags such as `[miss]` or `[from]`
pub fn parse_move(parts: &[&str]) -> Result<ServerMessage> {
    let pokemon = parse_pokemon(parts, 2)?;
    let move_name = field(parts, 3, "move name")?.to_string();
    let tags = parts.get(5..).unwrap_or_default();

    Ok(ServerMessage::Move {
        pokemon,
        move_name,
        target: parts.get(4).and_then(|s| Pokemon::parse(s)),
        from: find_from_tag(parts, 5),
        miss: tags.contains(&"[miss]"),
    })
}

pub fn parse_switch(parts: &[&str]) -> Result<ServerMessage> {
    let (pokemon, details, hp_status) = entrance(parts)?;
    Ok(ServerMessage::Switch { pokemon, details, hp_status })
}

/// Forced switch by Roar, Whirlwind, Dragon Tail and the like
pub fn parse_drag(parts: &[&str]) -> Result<ServerMessage> {
    let (pokemon, details, hp_status) = entrance(parts)?;
    Ok(ServerMessage::Drag { pokemon, details, hp_status })
}

pub fn parse_detailschange(parts: &[&str]) -> Result<ServerMessage> {
    let (pokemon, details, hp_status) = entrance(parts)?;
    Ok(ServerMessage::DetailsChange { pokemon, details, hp_status })
}

/// |cant|POKEMON|REASON with the blocked move when it is known
pub fn parse_cant(parts: &[&str]) -> Result<ServerMessage> {
    Ok(ServerMessage::Cant {
        pokemon: parse_pokemon(parts, 2)?,
        reason: parts.get(3).map(|s| s.to_string()).unwrap_or_default(),
        move_name: parts.get(4).map(|s| s.to_string()),
    })
}

pub fn parse_faint(parts: &[&str]) -> Result<ServerMessage> {
    Ok(ServerMessage::Faint(parse_pokemon(parts, 2)?))
}
