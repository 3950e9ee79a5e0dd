//! Parsers for room lifecycle lines

use anyhow::Result;

use super::{RoomType, ServerMessage, field, tail};
use crate::ParseError;

/// |init|ROOMTYPE
pub fn parse_init(parts: &[&str]) -> Result<ServerMessage> {
    let room_type = match field(parts, 2, "room type")? {
        "battle" => RoomType::Battle,
        "chat" => RoomType::Chat,
        other => return Err(ParseError::InvalidFormat(format!("unknown room type: {}", other)).into()),
    };
    Ok(ServerMessage::Init(room_type))
}

pub fn parse_title(parts: &[&str]) -> Result<ServerMessage> {
    let title = tail(parts, 2);
    if title.is_empty() {
        return Err(ParseError::MissingField("title".to_string()).into());
    }
    Ok(ServerMessage::Title(title))
}

/// |error|MESSAGE, e.g. "[Invalid choice] Can't move: ..."
pub fn parse_error(parts: &[&str]) -> Result<ServerMessage> {
    Ok(ServerMessage::Error(tail(parts, 2)))
}
