pub mod channel;
pub mod coordinator;
pub mod dispatch;
pub mod endpoints;
pub mod subscribers;
pub mod types;

pub const MSG_SIGNALS_UPDATE: &str = "signals_update";
pub const MSG_WHALE_TRADE: &str = "whale_trade";
pub const MSG_CONNECTION_ACK: &str = "connection_ack";
pub const MSG_PING: &str = "ping";
pub const MSG_PONG: &str = "pong";

/// Outbound heartbeat envelope, sent verbatim while the channel is open.
pub const PING_TEXT: &str = r#"{"type":"ping"}"#;
