//! Parsers for lines that arrive outside any room

use anyhow::Result;

use super::{ChallengeState, ServerMessage, User, field, tail};
use crate::ParseError;

fn user(parts: &[&str], index: usize, name: &str) -> Result<User, ParseError> {
    let raw = field(parts, index, name)?;
    User::parse(raw).ok_or_else(|| ParseError::InvalidFormat(format!("{} is not a user: {:?}", name, raw)))
}

/// |challstr|CHALLSTR, which itself contains `|`
pub fn parse_challstr(parts: &[&str]) -> Result<ServerMessage> {
    let challstr = tail(parts, 2);
    if challstr.is_empty() {
        return Err(ParseError::MissingField("challstr".to_string()).into());
    }
    Ok(ServerMessage::Challstr(challstr))
}

/// |updateuser|USER|NAMED|AVATAR|SETTINGS
pub fn parse_updateuser(parts: &[&str]) -> Result<ServerMessage> {
    Ok(ServerMessage::UpdateUser {
        user: user(parts, 2, "updateuser user")?,
        named: field(parts, 3, "updateuser named flag")? == "1",
        avatar: parts.get(4).map(|s| s.to_string()).unwrap_or_default(),
    })
}

/// |nametaken|USERNAME|MESSAGE
pub fn parse_nametaken(parts: &[&str]) -> Result<ServerMessage> {
    let username = parts
        .get(2)
        .ok_or_else(|| ParseError::MissingField("nametaken username".to_string()))?;

    Ok(ServerMessage::NameTaken {
        username: username.to_string(),
        message: tail(parts, 3),
    })
}

pub fn parse_popup(parts: &[&str]) -> Result<ServerMessage> {
    if parts.len() < 3 {
        return Err(ParseError::MissingField("popup message".to_string()).into());
    }
    Ok(ServerMessage::Popup(tail(parts, 2)))
}

/// |pm|SENDER|RECEIVER|MESSAGE
pub fn parse_pm(parts: &[&str]) -> Result<ServerMessage> {
    let sender = user(parts, 2, "pm sender")?;
    let receiver = user(parts, 3, "pm receiver")?;
    if parts.len() < 5 {
        return Err(ParseError::MissingField("pm message".to_string()).into());
    }

    Ok(ServerMessage::Pm {
        sender,
        receiver,
        message: tail(parts, 4),
    })
}

/// |updatechallenges|JSON
pub fn parse_updatechallenges(parts: &[&str]) -> Result<ServerMessage> {
    let json = tail(parts, 2);
    if json.trim().is_empty() {
        return Err(ParseError::MissingField("updatechallenges json".to_string()).into());
    }

    let state: ChallengeState = serde_json::from_str(&json)
        .map_err(|e| ParseError::InvalidFormat(format!("updatechallenges json: {}", e)))?;
    Ok(ServerMessage::UpdateChallenges(state))
}
