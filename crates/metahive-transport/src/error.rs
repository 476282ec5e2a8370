use std::io;

/// Errors raised while listening for or talking to clients.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("could not listen on {addr}: {source}")]
    BindFailed {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The TCP accept itself failed.
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    #[error("listener address unavailable: {0}")]
    LocalAddr(#[source] io::Error),

    /// Upgrade, read, write or close failed at the WebSocket layer.
    #[cfg(feature = "websocket")]
    #[error("websocket: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

impl TransportError {
    /// Whether the peer is simply gone, as opposed to a local failure.
    pub fn is_disconnect(&self) -> bool {
        match self {
            #[cfg(feature = "websocket")]
            Self::WebSocket(e) => {
                use tokio_tungstenite::tungstenite::Error as WsError;
                matches!(
                    e,
                    WsError::ConnectionClosed
                        | WsError::AlreadyClosed
                        | WsError::Io(_)
                        | WsError::Protocol(_)
                )
            }
            _ => false,
        }
    }
}
