//! Parsers for turn flow and decision requests

use anyhow::Result;

use super::request::BattleRequest;
use super::{ServerMessage, number, tail};
use crate::ParseError;

/// |request|JSON
pub fn parse_request(parts: &[&str]) -> Result<ServerMessage> {
    let json = tail(parts, 2);
    if json.trim().is_empty() {
        return Err(ParseError::MissingField("request json".to_string()).into());
    }

    let request = BattleRequest::from_json(&json)
        .map_err(|e| ParseError::InvalidFormat(format!("request json: {}", e)))?;
    Ok(ServerMessage::Request(Box::new(request)))
}

pub fn parse_turn(parts: &[&str]) -> Result<ServerMessage> {
    Ok(ServerMessage::Turn(number(parts, 2, "turn")?))
}

/// |win|USER
pub fn parse_win(parts: &[&str]) -> Result<ServerMessage> {
    Ok(ServerMessage::Win(tail(parts, 2)))
}
