use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors that end a session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("failed to connect to {url}")]
    Connect {
        url: String,
        #[source]
        source: tungstenite::Error,
    },

    #[error("login failed: {0}")]
    Auth(String),

    #[error("connection lost: {0}")]
    Disconnected(String),

    #[error("session is closed, cannot send")]
    Send,
}
