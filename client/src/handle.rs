use std::sync::Arc;

use pilot_battle::BattleState;
use pilot_protocol::{ClientCommand, ClientMessage};
use tokio::sync::{mpsc, watch};

use crate::auth;
use crate::connection::Outgoing;
use crate::error::SessionError;
use crate::state::SessionState;

/// Cloneable handle for sending commands and reading shared state
///
/// Sending never waits on the receive loop: commands are queued on an
/// unbounded channel drained by the writer task.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<Outgoing>,
    state: Arc<SessionState>,
    login_url: String,
}

impl SessionHandle {
    /// Build a handle over an existing channel and state
    pub fn new(
        tx: mpsc::UnboundedSender<Outgoing>,
        state: Arc<SessionState>,
        login_url: impl Into<String>,
    ) -> Self {
        Self {
            tx,
            state,
            login_url: login_url.into(),
        }
    }

    fn send(&self, msg: ClientMessage) -> Result<(), SessionError> {
        self.tx
            .send(Outgoing::Text(msg.to_wire_format()))
            .map_err(|_| SessionError::Send)
    }

    /// Authenticate with the stored challstr and send `/trn`
    pub async fn login(&self, username: &str, password: &str) -> Result<(), SessionError> {
        let challstr = self
            .state
            .challstr()
            .ok_or_else(|| SessionError::Auth("challstr not received yet".to_string()))?;

        let assertion =
            auth::get_assertion(&self.login_url, username, password, &challstr).await?;

        self.state.set_own_username(username);
        self.send(ClientMessage::global(ClientCommand::TrustedLogin {
            username: username.to_string(),
            assertion,
        }))?;

        tracing::info!(username = %username, "login sent");
        Ok(())
    }

    /// Challenge a user; the answer arrives as `updatechallenges` or a popup
    pub fn challenge(&self, opponent: &str, format: &str) -> Result<(), SessionError> {
        self.send(ClientMessage::global(ClientCommand::Challenge {
            username: opponent.to_string(),
            format: format.to_string(),
        }))
    }

    /// Send `ROOM|TEXT`, or `|TEXT` when `room` is empty
    pub fn send_command(&self, room: &str, text: &str) -> Result<(), SessionError> {
        let command = ClientCommand::Raw(text.to_string());
        if room.is_empty() {
            self.send(ClientMessage::global(command))
        } else {
            self.send(ClientMessage::in_room(room, command))
        }
    }

    /// Send `ROOM|/choose CHOICE`
    pub fn choose(&self, room: &str, choice: &str) -> Result<(), SessionError> {
        self.send(ClientMessage::in_room(
            room,
            ClientCommand::Choose(choice.to_string()),
        ))
    }

    /// Forfeit a battle; its snapshot disappears immediately
    pub fn forfeit(&self, room: &str) -> Result<(), SessionError> {
        self.state.mark_forfeited(room);
        self.send(ClientMessage::in_room(room, ClientCommand::Forfeit))
    }

    pub fn set_avatar(&self, avatar: &str) -> Result<(), SessionError> {
        self.send(ClientMessage::global(ClientCommand::Avatar(avatar.to_string())))
    }

    pub fn pm(&self, username: &str, message: &str) -> Result<(), SessionError> {
        self.send(ClientMessage::global(ClientCommand::Pm {
            username: username.to_string(),
            message: message.to_string(),
        }))
    }

    /// Close the socket; `Session::run` returns once the server acknowledges
    pub fn quit(&self) -> Result<(), SessionError> {
        self.tx.send(Outgoing::Close).map_err(|_| SessionError::Send)
    }

    /// Consistent copy of the battle in `room`, `None` once it is over
    pub fn snapshot(&self, room: &str) -> Option<BattleState> {
        self.state.snapshot(room)
    }

    /// Notified after every frame
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.state.subscribe()
    }

    pub fn mark_tera_used(&self, room: &str) {
        self.state.mark_tera_used(room);
    }

    /// Add a line to the battle transcript
    pub fn note(&self, room: &str, text: impl Into<String>) {
        self.state.note(room, text);
    }

    pub fn state(&self) -> &Arc<SessionState> {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::DEFAULT_LOGIN_URL;

    fn handle() -> (SessionHandle, mpsc::UnboundedReceiver<Outgoing>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = SessionHandle::new(tx, Arc::new(SessionState::new()), DEFAULT_LOGIN_URL);
        (handle, rx)
    }

    fn sent(rx: &mut mpsc::UnboundedReceiver<Outgoing>) -> Vec<Outgoing> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    #[test]
    fn test_wire_commands() {
        let (handle, mut rx) = handle();
        handle.challenge("Rival", "gen9randombattle").unwrap();
        handle.choose("battle-gen9randombattle-1", "move 2 terastallize").unwrap();
        handle.forfeit("battle-gen9randombattle-1").unwrap();
        handle.set_avatar("lucas").unwrap();
        handle.pm("Rival", "gg").unwrap();
        handle.send_command("", "/cancelchallenge Rival").unwrap();
        handle.quit().unwrap();

        assert_eq!(
            sent(&mut rx),
            vec![
                Outgoing::Text("|/challenge Rival, gen9randombattle".to_string()),
                Outgoing::Text("battle-gen9randombattle-1|/choose move 2 terastallize".to_string()),
                Outgoing::Text("battle-gen9randombattle-1|/forfeit".to_string()),
                Outgoing::Text("|/avatar lucas".to_string()),
                Outgoing::Text("|/pm Rival, gg".to_string()),
                Outgoing::Text("|/cancelchallenge Rival".to_string()),
                Outgoing::Close,
            ]
        );
    }

    #[test]
    fn test_send_after_close_fails() {
        let (handle, rx) = handle();
        drop(rx);
        assert!(matches!(
            handle.challenge("Rival", "gen9randombattle"),
            Err(SessionError::Send)
        ));
    }

    #[tokio::test]
    async fn test_login_requires_challstr() {
        let (handle, mut rx) = handle();
        let result = handle.login("Pilot", "hunter2").await;
        assert!(matches!(result, Err(SessionError::Auth(_))));
        assert!(sent(&mut rx).is_empty());
    }
}
