//! Async websocket session for Pokemon Showdown battles.
//!
//! [`Session::connect`] opens the socket and returns the receive side plus a
//! cloneable [`SessionHandle`] for sending. [`Session::run`] reads frames,
//! applies them to the shared [`SessionState`] and dispatches the resulting
//! events to a [`SessionHandler`].

mod auth;
mod connection;
mod error;
mod events;
mod handle;
mod handler;
mod state;

use std::sync::Arc;

use pilot_protocol::parse_server_frame;
use tokio::task::JoinHandle;

pub use pilot_protocol::{ClientCommand, ClientMessage, ServerFrame, ServerMessage};

pub use auth::DEFAULT_LOGIN_URL;
pub use connection::Outgoing;
pub use error::SessionError;
pub use events::{BattleConcluded, Outcome, SessionEvent};
pub use handle::SessionHandle;
pub use handler::SessionHandler;
pub use state::{BattleRoom, SessionState, UserInfo};

use connection::Connection;

pub const DEFAULT_SERVER_URL: &str = "wss://sim3.psim.us/showdown/websocket";

/// Where to connect and authenticate
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub server_url: String,
    pub login_url: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            login_url: DEFAULT_LOGIN_URL.to_string(),
        }
    }
}

/// Receive side of a Pokemon Showdown connection
pub struct Session {
    connection: Connection,
    state: Arc<SessionState>,
    writer: JoinHandle<()>,
}

impl Session {
    /// Connect to a Pokemon Showdown server
    ///
    /// Handshake and TLS failures are returned as [`SessionError::Connect`]
    /// and are not retried.
    pub async fn connect(config: &SessionConfig) -> Result<(Session, SessionHandle), SessionError> {
        let (connection, tx, writer) = Connection::connect(&config.server_url).await?;
        let state = Arc::new(SessionState::new());
        let handle = SessionHandle::new(tx, Arc::clone(&state), config.login_url.clone());

        Ok((
            Session {
                connection,
                state,
                writer,
            },
            handle,
        ))
    }

    /// Run the receive loop, dispatching events to the handler.
    ///
    /// Returns `Ok(())` when the socket closes in an orderly way and
    /// [`SessionError::Disconnected`] when it drops.
    pub async fn run<H: SessionHandler + ?Sized>(&mut self, handler: &mut H) -> Result<(), SessionError> {
        while let Some(text) = self.connection.recv().await {
            let text = text?;
            let frame = parse_server_frame(&text);

            for event in self.state.process_frame(&frame) {
                handler::dispatch(handler, event).await;
            }
        }

        tracing::info!("session closed");
        Ok(())
    }

    pub fn state(&self) -> &Arc<SessionState> {
        &self.state
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.writer.abort();
    }
}
