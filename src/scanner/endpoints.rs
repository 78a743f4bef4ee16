use crate::error::ScannerError;
use crate::scanner::types::{
    collect_valid_signals, HotStrategy, ScannerConfig, SignalWire, SignalsUpdate, ViewKind,
    WhaleTrade, WhaleTradeWire,
};
use reqwest::Client;
use serde::Deserialize;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::{connect_async_with_config, MaybeTlsStream, WebSocketStream};

const CHANNEL_PATH: &str = "/ws";
const SIGNALS_BASE_PATH: &str = "/api/signals";
const WHALE_TRADES_PATH: &str = "/api/whales/trades";
const WHALE_PULL_MIN_USD: u64 = 10_000;

pub type ChannelStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Resolves the channel endpoint: an explicit override wins, otherwise the
/// configured origin is mapped scheme-for-scheme onto ws(s).
pub fn channel_endpoint(config: &ScannerConfig) -> String {
    if let Some(url) = &config.channel_override {
        return url.clone();
    }

    if let Some(rest) = config.origin.strip_prefix("https://") {
        format!("wss://{rest}{CHANNEL_PATH}")
    } else {
        let rest = config.origin.strip_prefix("http://").unwrap_or(&config.origin);
        format!("ws://{rest}{CHANNEL_PATH}")
    }
}

fn signals_endpoint(origin: &str, view: ViewKind, strategy: HotStrategy) -> String {
    match view {
        ViewKind::Scanner => format!("{origin}{SIGNALS_BASE_PATH}/"),
        ViewKind::Equilibrage => format!("{origin}{SIGNALS_BASE_PATH}/equilibrage"),
        ViewKind::Hot => format!(
            "{origin}{SIGNALS_BASE_PATH}/hot?strategy={}",
            strategy.as_str()
        ),
        ViewKind::Contrarian => format!("{origin}{SIGNALS_BASE_PATH}/contrarian"),
        ViewKind::Quant => format!("{origin}{SIGNALS_BASE_PATH}/quant"),
    }
}

fn whale_trades_endpoint(origin: &str, limit: usize) -> String {
    format!("{origin}{WHALE_TRADES_PATH}?limit={limit}&min_usd={WHALE_PULL_MIN_USD}")
}

pub async fn connect_channel(endpoint: &str) -> Result<ChannelStream, ScannerError> {
    let ws_config = WebSocketConfig {
        max_message_size: Some(16 << 20),
        max_frame_size: Some(4 << 20),
        ..Default::default()
    };

    let (stream, _) = connect_async_with_config(endpoint, Some(ws_config), true).await?;
    Ok(stream)
}

#[derive(Debug, Default, Deserialize)]
struct SignalsResponseWire {
    #[serde(default)]
    signals: Vec<SignalWire>,
    #[serde(default)]
    cached: bool,
    #[serde(default)]
    cache_age: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WhaleTradesResponseWire {
    #[serde(default)]
    trades: Vec<WhaleTradeWire>,
    #[serde(default)]
    error: Option<String>,
}

/// Pulls the signal set for one view. Transport and HTTP-status failures are
/// errors; a server-reported `error` travels inside the Ok payload with
/// whatever data accompanied it.
pub async fn fetch_signals(
    client: &Client,
    origin: &str,
    view: ViewKind,
    strategy: HotStrategy,
) -> Result<SignalsUpdate, ScannerError> {
    let endpoint = signals_endpoint(origin, view, strategy);
    let response = client.get(endpoint).send().await?.error_for_status()?;
    let payload = response.json::<SignalsResponseWire>().await?;

    Ok(SignalsUpdate {
        signals: collect_valid_signals(payload.signals),
        cached: payload.cached,
        cache_age: payload.cache_age,
        error: payload.error,
    })
}

pub async fn fetch_whale_trades(
    client: &Client,
    origin: &str,
    limit: usize,
) -> Result<(Vec<WhaleTrade>, Option<String>), ScannerError> {
    let endpoint = whale_trades_endpoint(origin, limit);
    let response = client.get(endpoint).send().await?.error_for_status()?;
    let payload = response.json::<WhaleTradesResponseWire>().await?;

    let mut trades = Vec::with_capacity(payload.trades.len());
    for wire in payload.trades {
        match WhaleTrade::try_from(wire) {
            Ok(trade) => trades.push(trade),
            Err(error) => tracing::warn!(%error, "dropping invalid whale trade record"),
        }
    }

    Ok((trades, payload.error))
}
