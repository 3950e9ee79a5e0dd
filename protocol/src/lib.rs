use thiserror::Error;

pub mod client;
pub mod server;

pub use client::{ClientCommand, ClientMessage};
pub use server::{
    ActivePokemon, BattleRequest, ChallengeState, ChallengeTo, HpStatus, MoveSlot, Player,
    Pokemon, PokemonDetails, PokemonStats, RoomType, ServerFrame, ServerMessage, Side,
    SideInfo, SidePokemon, Stat, User, parse_server_frame, parse_server_message,
};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid message format: {0}")]
    InvalidFormat(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Empty message")]
    EmptyMessage,
}

/// Normalize a name to a Showdown ID (lowercase ASCII alphanumerics only)
///
/// `"Stealth Rock"` and `"stealthrock"` both become `"stealthrock"`.
pub fn to_id(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::to_id;

    #[test]
    fn test_to_id() {
        assert_eq!(to_id("Stealth Rock"), "stealthrock");
        assert_eq!(to_id("Farfetch’d"), "farfetchd");
        assert_eq!(to_id(" Guest 123"), "guest123");
    }
}
