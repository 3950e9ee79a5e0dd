use async_trait::async_trait;
use pilot_protocol::ChallengeState;

use crate::events::{BattleConcluded, SessionEvent};

/// Trait for reacting to session events.
///
/// All methods have default no-op implementations, so you only need to
/// implement the events you care about.
///
/// # Example
///
/// ```ignore
/// struct Pilot {
///     handle: SessionHandle,
/// }
///
/// #[async_trait]
/// impl SessionHandler for Pilot {
///     async fn on_challstr(&mut self, _challstr: &str) {
///         self.handle.login("user", "pass").await.ok();
///     }
/// }
/// ```
#[async_trait]
pub trait SessionHandler: Send {
    /// Called when the server sends a challenge string.
    /// This indicates that login is now possible.
    async fn on_challstr(&mut self, challstr: &str) {
        let _ = challstr;
    }

    /// Called when the server confirms a registered name
    async fn on_logged_in(&mut self, username: &str) {
        let _ = username;
    }

    /// Called when a login attempt fails.
    async fn on_name_taken(&mut self, username: &str, message: &str) {
        let _ = (username, message);
    }

    async fn on_challenges(&mut self, challenges: &ChallengeState) {
        let _ = challenges;
    }

    async fn on_popup(&mut self, message: &str) {
        let _ = message;
    }

    async fn on_pm(&mut self, from: &str, message: &str) {
        let _ = (from, message);
    }

    /// Called when a battle room opens and its state is created
    async fn on_battle_started(&mut self, room_id: &str) {
        let _ = room_id;
    }

    /// Called with the narrated events of each battle message
    async fn on_battle_events(&mut self, room_id: &str, events: &[String]) {
        let _ = (room_id, events);
    }

    /// Called once per battle, after the battle state has been retired
    async fn on_battle_concluded(&mut self, concluded: BattleConcluded) {
        let _ = concluded;
    }

    /// Called for any message not handled by a specific method.
    /// The room parameter is Some if the message was sent in a room context.
    async fn on_raw(&mut self, room: Option<&str>, content: &str) {
        let _ = (room, content);
    }
}

/// Route one event to the matching handler method
pub(crate) async fn dispatch<H: SessionHandler + ?Sized>(handler: &mut H, event: SessionEvent) {
    match event {
        SessionEvent::Challstr(challstr) => handler.on_challstr(&challstr).await,
        SessionEvent::UserUpdated { username, named } => {
            if named {
                handler.on_logged_in(&username).await;
            }
        }
        SessionEvent::NameTaken { username, message } => {
            handler.on_name_taken(&username, &message).await
        }
        SessionEvent::Challenges(challenges) => handler.on_challenges(&challenges).await,
        SessionEvent::Popup(message) => handler.on_popup(&message).await,
        SessionEvent::Pm { from, message } => handler.on_pm(&from, &message).await,
        SessionEvent::BattleStarted { room_id } => handler.on_battle_started(&room_id).await,
        SessionEvent::BattleEvents { room_id, events } => {
            handler.on_battle_events(&room_id, &events).await
        }
        SessionEvent::BattleConcluded(concluded) => handler.on_battle_concluded(*concluded).await,
        SessionEvent::Raw { room, line } => handler.on_raw(room.as_deref(), &line).await,
    }
}
