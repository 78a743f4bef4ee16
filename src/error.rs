use serde::ser::Serializer;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScannerError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("websocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("json decode error: {0}")]
    Decode(#[from] simd_json::Error),
}

impl From<tokio_tungstenite::tungstenite::Error> for ScannerError {
    fn from(value: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(value))
    }
}

impl serde::Serialize for ScannerError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
