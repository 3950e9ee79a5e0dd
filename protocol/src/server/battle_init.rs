//! Parsers for the lines that set a battle up

use anyhow::Result;

use super::battle::{Player, PokemonDetails};
use super::{ServerMessage, field, number};
use crate::ParseError;

fn player(parts: &[&str]) -> Result<Player, ParseError> {
    let raw = field(parts, 2, "player")?;
    Player::parse(raw).ok_or_else(|| ParseError::InvalidFormat(format!("unknown player: {}", raw)))
}

/// |player|PLAYER|USERNAME|AVATAR|RATING
///
/// The server repeats this line with an empty username when a player leaves.
pub fn parse_player(parts: &[&str]) -> Result<ServerMessage> {
    let text = |index: usize| parts.get(index).map(|s| s.to_string()).unwrap_or_default();

    Ok(ServerMessage::BattlePlayer {
        player: player(parts)?,
        username: text(3),
        avatar: text(4),
        rating: number(parts, 5, "rating").ok(),
    })
}

/// |teamsize|PLAYER|NUMBER
pub fn parse_teamsize(parts: &[&str]) -> Result<ServerMessage> {
    Ok(ServerMessage::TeamSize {
        player: player(parts)?,
        size: number(parts, 3, "team size")?,
    })
}

pub fn parse_gen(parts: &[&str]) -> Result<ServerMessage> {
    Ok(ServerMessage::Gen(number(parts, 2, "generation")?))
}

pub fn parse_tier(parts: &[&str]) -> Result<ServerMessage> {
    Ok(ServerMessage::Tier(parts.get(2).map(|s| s.to_string()).unwrap_or_default()))
}

/// |poke|PLAYER|DETAILS|ITEM, sent during team preview
pub fn parse_poke(parts: &[&str]) -> Result<ServerMessage> {
    Ok(ServerMessage::Poke {
        player: player(parts)?,
        details: PokemonDetails::parse(field(parts, 3, "poke details")?),
        has_item: parts.get(4) == Some(&"item"),
    })
}
