use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use crate::error::SessionError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// What the writer task should do next
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    /// A wire-format text frame
    Text(String),
    /// Close the socket
    Close,
}

/// Read half of the websocket
pub(crate) struct Connection {
    stream: SplitStream<WsStream>,
}

impl Connection {
    /// Open the websocket and spawn the writer task
    pub(crate) async fn connect(
        url: &str,
    ) -> Result<(Self, mpsc::UnboundedSender<Outgoing>, JoinHandle<()>), SessionError> {
        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|source| SessionError::Connect {
                url: url.to_string(),
                source,
            })?;

        tracing::info!(url = %url, "connected");

        let (sink, stream) = ws_stream.split();
        let (tx, rx) = mpsc::unbounded_channel();
        let writer = tokio::spawn(write_loop(sink, rx));

        Ok((Self { stream }, tx, writer))
    }

    /// Next text frame, `None` once the server closes the socket
    pub(crate) async fn recv(&mut self) -> Option<Result<String, SessionError>> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Some(Ok(text)),
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!(frame = ?frame, "server closed the connection");
                    return None;
                }
                // Pings are answered by tungstenite on the next write
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Some(Err(SessionError::Disconnected(e.to_string()))),
                None => return None,
            }
        }
    }
}

async fn write_loop(
    mut sink: SplitSink<WsStream, Message>,
    mut rx: mpsc::UnboundedReceiver<Outgoing>,
) {
    while let Some(outgoing) = rx.recv().await {
        match outgoing {
            Outgoing::Text(text) => {
                tracing::debug!(message = %text, "send");
                if let Err(e) = sink.send(Message::Text(text)).await {
                    tracing::warn!(error = %e, "failed to send message, stopping writer");
                    break;
                }
            }
            Outgoing::Close => {
                if let Err(e) = sink.close().await {
                    tracing::debug!(error = %e, "error while closing socket");
                }
                break;
            }
        }
    }
}
