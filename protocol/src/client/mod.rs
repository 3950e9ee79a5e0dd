/// Commands that clients can send to server
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    /// /trn USERNAME,0,ASSERTION
    TrustedLogin { username: String, assertion: String },

    /// /join ROOMID
    JoinRoom(String),

    /// /challenge USERNAME, FORMAT
    Challenge { username: String, format: String },

    /// /choose CHOICE (move 1, move 2 terastallize, switch 3, team 123456)
    Choose(String),

    /// /forfeit
    Forfeit,

    /// /avatar AVATAR
    Avatar(String),

    /// /pm USERNAME, MESSAGE
    Pm { username: String, message: String },

    /// Raw command for catch-all
    Raw(String),
}

impl ClientCommand {
    /// Serialize command to protocol format
    pub fn to_protocol_string(&self) -> String {
        match self {
            Self::TrustedLogin {
                username,
                assertion,
            } => format!("/trn {},0,{}", username, assertion),
            Self::JoinRoom(room) => format!("/join {}", room),
            Self::Challenge { username, format } => format!("/challenge {}, {}", username, format),
            Self::Choose(choice) => format!("/choose {}", choice),
            Self::Forfeit => "/forfeit".to_string(),
            Self::Avatar(avatar) => format!("/avatar {}", avatar),
            Self::Pm { username, message } => format!("/pm {}, {}", username, message),
            Self::Raw(command) => command.clone(),
        }
    }
}

/// Client message with optional room context
#[derive(Debug, Clone, PartialEq)]
pub struct ClientMessage {
    pub room_id: Option<String>,
    pub command: ClientCommand,
}

impl ClientMessage {
    /// A command scoped to a room
    pub fn in_room(room_id: impl Into<String>, command: ClientCommand) -> Self {
        Self {
            room_id: Some(room_id.into()),
            command,
        }
    }

    /// A command sent outside of any room (login, challenge, pm)
    pub fn global(command: ClientCommand) -> Self {
        Self {
            room_id: None,
            command,
        }
    }

    /// Serialize to wire format: ROOMID|TEXT or |TEXT
    pub fn to_wire_format(&self) -> String {
        let text = self.command.to_protocol_string();
        match &self.room_id {
            Some(room) => format!("{}|{}", room, text),
            None => format!("|{}", text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trusted_login_wire_format() {
        let msg = ClientMessage::global(ClientCommand::TrustedLogin {
            username: "pilotbot".into(),
            assertion: "abc,def;sig".into(),
        });
        assert_eq!(msg.to_wire_format(), "|/trn pilotbot,0,abc,def;sig");
    }

    #[test]
    fn test_challenge_wire_format() {
        let msg = ClientMessage::global(ClientCommand::Challenge {
            username: "rival".into(),
            format: "gen9randombattle".into(),
        });
        assert_eq!(msg.to_wire_format(), "|/challenge rival, gen9randombattle");
    }

    #[test]
    fn test_choose_wire_format() {
        let room = "battle-gen9randombattle-1";
        let msg = ClientMessage::in_room(room, ClientCommand::Choose("move 2 terastallize".into()));
        assert_eq!(
            msg.to_wire_format(),
            "battle-gen9randombattle-1|/choose move 2 terastallize"
        );

        let msg = ClientMessage::in_room(room, ClientCommand::Choose("switch 3".into()));
        assert_eq!(msg.to_wire_format(), "battle-gen9randombattle-1|/choose switch 3");
    }

    #[test]
    fn test_forfeit_wire_format() {
        let msg = ClientMessage::in_room("battle-x-1", ClientCommand::Forfeit);
        assert_eq!(msg.to_wire_format(), "battle-x-1|/forfeit");
    }
}
