use crate::error::ScannerError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ORIGIN: &str = "http://127.0.0.1:8000";
pub const DEFAULT_HEARTBEAT_INTERVAL_SECS: u64 = 25;
pub const DEFAULT_RECONNECT_DELAY_SECS: u64 = 5;
pub const DEFAULT_PULL_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_WHALE_CAPACITY: usize = 50;
pub const DEFAULT_LIVE_MODE: bool = true;
pub const DEFAULT_VIEW: ViewKind = ViewKind::Scanner;
pub const DEFAULT_HOT_STRATEGY: HotStrategy = HotStrategy::Fade;
pub const MIN_HEARTBEAT_INTERVAL_SECS: u64 = 5;
pub const MAX_HEARTBEAT_INTERVAL_SECS: u64 = 120;
pub const MIN_RECONNECT_DELAY_SECS: u64 = 1;
pub const MAX_RECONNECT_DELAY_SECS: u64 = 60;
pub const MIN_PULL_INTERVAL_SECS: u64 = 5;
pub const MAX_PULL_INTERVAL_SECS: u64 = 300;
pub const MIN_WHALE_CAPACITY: usize = 10;
pub const MAX_WHALE_CAPACITY: usize = 500;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
    Closing,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    Scanner,
    Equilibrage,
    Hot,
    Contrarian,
    Quant,
}

impl ViewKind {
    pub const ALL: [ViewKind; 5] = [
        Self::Scanner,
        Self::Equilibrage,
        Self::Hot,
        Self::Contrarian,
        Self::Quant,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scanner => "scanner",
            Self::Equilibrage => "equilibrage",
            Self::Hot => "hot",
            Self::Contrarian => "contrarian",
            Self::Quant => "quant",
        }
    }

    pub fn parse_str(value: &str) -> Result<Self, ScannerError> {
        match value {
            "scanner" => Ok(Self::Scanner),
            "equilibrage" => Ok(Self::Equilibrage),
            "hot" => Ok(Self::Hot),
            "contrarian" => Ok(Self::Contrarian),
            "quant" => Ok(Self::Quant),
            other => Err(ScannerError::InvalidArgument(format!(
                "unknown view '{other}'"
            ))),
        }
    }

    /// The channel broadcasts signal updates for this view only; every other
    /// view is fed by periodic pulls.
    pub fn channel_covered(self) -> bool {
        matches!(self, Self::Scanner)
    }

    /// Equilibrage hunts balanced wide-spread books, so whale activity is not
    /// a gate there.
    pub fn gates_whale_activity(self) -> bool {
        !matches!(self, Self::Equilibrage)
    }

    /// Equilibrage captures the spread itself; the max-spread predicate is
    /// disabled for it no matter what the profile says.
    pub fn gates_spread(self) -> bool {
        !matches!(self, Self::Equilibrage)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HotStrategy {
    Fade,
    NegativeRisk,
}

impl HotStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fade => "fade",
            Self::NegativeRisk => "negative_risk",
        }
    }

    pub fn parse_str(value: &str) -> Result<Self, ScannerError> {
        match value {
            "fade" => Ok(Self::Fade),
            "negative_risk" => Ok(Self::NegativeRisk),
            other => Err(ScannerError::InvalidArgument(format!(
                "unknown hot strategy '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum SignalLevel {
    Watch,
    Interesting,
    Strong,
    Opportunity,
}

impl SignalLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Watch => "watch",
            Self::Interesting => "interesting",
            Self::Strong => "strong",
            Self::Opportunity => "opportunity",
        }
    }

    pub fn parse_str(value: &str) -> Result<Self, ScannerError> {
        match value {
            "watch" => Ok(Self::Watch),
            "interesting" => Ok(Self::Interesting),
            "strong" => Ok(Self::Strong),
            "opportunity" => Ok(Self::Opportunity),
            other => Err(ScannerError::InvalidArgument(format!(
                "unknown signal level '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Signal {
    pub id: String,
    pub market_id: String,
    pub slug: String,
    pub question: String,
    pub score: i64,
    pub level: SignalLevel,
    pub direction: String,
    pub whale_count: u32,
    pub unique_whale_count: u32,
    pub volume_24h: f64,
    pub liquidity: f64,
    pub spread: f64,
    pub yes_price: f64,
    pub no_price: f64,
    pub price_movement: f64,
    pub hours_remaining: Option<f64>,
    pub end_date: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SignalWire {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub market_id: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub market_question: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub direction: String,
    #[serde(default)]
    pub whale_count: u32,
    #[serde(default)]
    pub unique_whale_count: u32,
    #[serde(default)]
    pub volume_24h: f64,
    #[serde(default)]
    pub liquidity: f64,
    #[serde(default)]
    pub spread: f64,
    #[serde(default)]
    pub yes_price: f64,
    #[serde(default)]
    pub no_price: f64,
    #[serde(default)]
    pub price_movement: f64,
    #[serde(default)]
    pub hours_remaining: Option<f64>,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl TryFrom<SignalWire> for Signal {
    type Error = ScannerError;

    fn try_from(value: SignalWire) -> Result<Self, Self::Error> {
        if value.id.is_empty() {
            return Err(ScannerError::InvalidArgument(
                "signal id must be non-empty".to_string(),
            ));
        }
        if !(0..=100).contains(&value.score) {
            return Err(ScannerError::InvalidArgument(format!(
                "signal score {} outside 0-100",
                value.score
            )));
        }
        if !value.volume_24h.is_finite()
            || !value.liquidity.is_finite()
            || !value.spread.is_finite()
            || value.volume_24h < 0.0
            || value.liquidity < 0.0
            || value.spread < 0.0
        {
            return Err(ScannerError::InvalidArgument(
                "volume/liquidity/spread must be finite and non-negative".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&value.yes_price) || !(0.0..=1.0).contains(&value.no_price) {
            return Err(ScannerError::InvalidArgument(
                "prices must lie within [0, 1]".to_string(),
            ));
        }
        if !value.price_movement.is_finite() {
            return Err(ScannerError::InvalidArgument(
                "price movement must be finite".to_string(),
            ));
        }
        if let Some(hours) = value.hours_remaining {
            if !hours.is_finite() || hours < 0.0 {
                return Err(ScannerError::InvalidArgument(
                    "hours remaining must be finite and non-negative".to_string(),
                ));
            }
        }
        let level = SignalLevel::parse_str(&value.level)?;

        Ok(Self {
            id: value.id,
            market_id: value.market_id,
            slug: value.slug,
            question: value.market_question,
            score: value.score,
            level,
            direction: value.direction,
            whale_count: value.whale_count,
            unique_whale_count: value.unique_whale_count,
            volume_24h: value.volume_24h,
            liquidity: value.liquidity,
            spread: value.spread,
            yes_price: value.yes_price,
            no_price: value.no_price,
            price_movement: value.price_movement,
            hours_remaining: value.hours_remaining,
            end_date: if value.end_date.is_empty() {
                None
            } else {
                Some(value.end_date)
            },
            created_at: value.created_at,
        })
    }
}

/// Converts a delivered batch, skipping records that fail validation so one
/// malformed entry never poisons the rest of the set.
pub fn collect_valid_signals(wires: Vec<SignalWire>) -> Vec<Signal> {
    let mut signals = Vec::with_capacity(wires.len());
    for wire in wires {
        match Signal::try_from(wire) {
            Ok(signal) => signals.push(signal),
            Err(error) => tracing::warn!(%error, "dropping invalid signal record"),
        }
    }
    signals
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WhaleTrade {
    pub id: String,
    pub trader: String,
    pub market_id: String,
    pub question: String,
    pub slug: String,
    pub side: String,
    pub size_usd: f64,
    pub price: f64,
    pub timestamp: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct WhaleTradeWire {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub trader: String,
    #[serde(default)]
    pub market_id: String,
    #[serde(default)]
    pub market_question: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub side: String,
    #[serde(default)]
    pub size_usd: f64,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub timestamp: String,
}

impl TryFrom<WhaleTradeWire> for WhaleTrade {
    type Error = ScannerError;

    fn try_from(value: WhaleTradeWire) -> Result<Self, Self::Error> {
        if value.id.is_empty() {
            return Err(ScannerError::InvalidArgument(
                "whale trade id must be non-empty".to_string(),
            ));
        }
        if !value.size_usd.is_finite() || value.size_usd < 0.0 {
            return Err(ScannerError::InvalidArgument(
                "trade size must be finite and non-negative".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&value.price) {
            return Err(ScannerError::InvalidArgument(
                "trade price must lie within [0, 1]".to_string(),
            ));
        }

        Ok(Self {
            id: value.id,
            trader: value.trader,
            market_id: value.market_id,
            question: value.market_question,
            slug: value.slug,
            side: value.side,
            size_usd: value.size_usd,
            price: value.price,
            timestamp: value.timestamp,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct EnvelopeWire {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Option<simd_json::OwnedValue>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SignalsPayloadWire {
    #[serde(default)]
    pub signals: Vec<SignalWire>,
    #[serde(default)]
    pub cached: bool,
    #[serde(default)]
    pub cache_age: Option<u64>,
}

/// One delivered signal set, from either the channel or a pull.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SignalsUpdate {
    pub signals: Vec<Signal>,
    pub cached: bool,
    pub cache_age: Option<u64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelStatusSnapshot {
    pub state: ConnectionState,
    pub endpoint: String,
    pub connection_error: Option<String>,
    pub reason: Option<String>,
}

impl ChannelStatusSnapshot {
    pub fn disconnected(endpoint: String, reason: Option<String>) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            endpoint,
            connection_error: None,
            reason,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScannerArgs {
    pub origin: Option<String>,
    pub channel_url: Option<String>,
    pub heartbeat_interval_secs: Option<u64>,
    pub reconnect_delay_secs: Option<u64>,
    pub pull_interval_secs: Option<u64>,
    pub whale_capacity: Option<usize>,
    pub live_mode: Option<bool>,
    pub active_view: Option<ViewKind>,
    pub hot_strategy: Option<HotStrategy>,
}

#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub origin: String,
    pub channel_override: Option<String>,
    pub heartbeat_interval_secs: u64,
    pub reconnect_delay_secs: u64,
    pub pull_interval_secs: u64,
    pub whale_capacity: usize,
    pub live_mode: bool,
    pub active_view: ViewKind,
    pub hot_strategy: HotStrategy,
}

impl ScannerArgs {
    pub fn normalize(self) -> Result<ScannerConfig, ScannerError> {
        let origin = self
            .origin
            .unwrap_or_else(|| DEFAULT_ORIGIN.to_string())
            .trim()
            .trim_end_matches('/')
            .to_string();

        let scheme_rest = origin
            .strip_prefix("https://")
            .or_else(|| origin.strip_prefix("http://"));
        match scheme_rest {
            Some(host) if !host.is_empty() => {}
            _ => {
                return Err(ScannerError::InvalidArgument(
                    "origin must be a non-empty http(s) URL".to_string(),
                ));
            }
        }

        let channel_override = match self.channel_url {
            Some(url) => {
                let url = url.trim().to_string();
                if !url.starts_with("ws://") && !url.starts_with("wss://") {
                    return Err(ScannerError::InvalidArgument(
                        "channelUrl must be a ws(s) URL".to_string(),
                    ));
                }
                Some(url)
            }
            None => None,
        };

        let heartbeat_interval_secs = self
            .heartbeat_interval_secs
            .unwrap_or(DEFAULT_HEARTBEAT_INTERVAL_SECS);
        if !(MIN_HEARTBEAT_INTERVAL_SECS..=MAX_HEARTBEAT_INTERVAL_SECS)
            .contains(&heartbeat_interval_secs)
        {
            return Err(ScannerError::InvalidArgument(format!(
                "heartbeatIntervalSecs must be between {MIN_HEARTBEAT_INTERVAL_SECS} and {MAX_HEARTBEAT_INTERVAL_SECS}"
            )));
        }

        let reconnect_delay_secs = self
            .reconnect_delay_secs
            .unwrap_or(DEFAULT_RECONNECT_DELAY_SECS);
        if !(MIN_RECONNECT_DELAY_SECS..=MAX_RECONNECT_DELAY_SECS).contains(&reconnect_delay_secs) {
            return Err(ScannerError::InvalidArgument(format!(
                "reconnectDelaySecs must be between {MIN_RECONNECT_DELAY_SECS} and {MAX_RECONNECT_DELAY_SECS}"
            )));
        }

        let pull_interval_secs = self.pull_interval_secs.unwrap_or(DEFAULT_PULL_INTERVAL_SECS);
        if !(MIN_PULL_INTERVAL_SECS..=MAX_PULL_INTERVAL_SECS).contains(&pull_interval_secs) {
            return Err(ScannerError::InvalidArgument(format!(
                "pullIntervalSecs must be between {MIN_PULL_INTERVAL_SECS} and {MAX_PULL_INTERVAL_SECS}"
            )));
        }

        let whale_capacity = self.whale_capacity.unwrap_or(DEFAULT_WHALE_CAPACITY);
        if !(MIN_WHALE_CAPACITY..=MAX_WHALE_CAPACITY).contains(&whale_capacity) {
            return Err(ScannerError::InvalidArgument(format!(
                "whaleCapacity must be between {MIN_WHALE_CAPACITY} and {MAX_WHALE_CAPACITY}"
            )));
        }

        Ok(ScannerConfig {
            origin,
            channel_override,
            heartbeat_interval_secs,
            reconnect_delay_secs,
            pull_interval_secs,
            whale_capacity,
            live_mode: self.live_mode.unwrap_or(DEFAULT_LIVE_MODE),
            active_view: self.active_view.unwrap_or(DEFAULT_VIEW),
            hot_strategy: self.hot_strategy.unwrap_or(DEFAULT_HOT_STRATEGY),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_signal_wire() -> SignalWire {
        SignalWire {
            id: "sig-1".to_string(),
            market_id: "m-1".to_string(),
            slug: "rate-cut-march".to_string(),
            market_question: "Will rates be cut in March?".to_string(),
            score: 72,
            level: "strong".to_string(),
            direction: "YES".to_string(),
            whale_count: 4,
            unique_whale_count: 3,
            volume_24h: 125_000.0,
            liquidity: 60_000.0,
            spread: 0.04,
            yes_price: 0.62,
            no_price: 0.38,
            price_movement: 7.5,
            hours_remaining: Some(96.0),
            end_date: "2026-03-18".to_string(),
            created_at: None,
        }
    }

    #[test]
    fn converts_valid_signal_wire() {
        let signal = Signal::try_from(sample_signal_wire()).expect("wire should convert");
        assert_eq!(signal.id, "sig-1");
        assert_eq!(signal.level, SignalLevel::Strong);
        assert_eq!(signal.end_date.as_deref(), Some("2026-03-18"));
    }

    #[test]
    fn rejects_signal_with_empty_id() {
        let wire = SignalWire {
            id: String::new(),
            ..sample_signal_wire()
        };
        assert!(Signal::try_from(wire).is_err());
    }

    #[test]
    fn rejects_signal_with_negative_liquidity() {
        let wire = SignalWire {
            liquidity: -1.0,
            ..sample_signal_wire()
        };
        assert!(Signal::try_from(wire).is_err());
    }

    #[test]
    fn rejects_signal_with_price_outside_unit_range() {
        let wire = SignalWire {
            yes_price: 1.2,
            ..sample_signal_wire()
        };
        assert!(Signal::try_from(wire).is_err());
    }

    #[test]
    fn rejects_signal_with_unknown_level() {
        let wire = SignalWire {
            level: "mythic".to_string(),
            ..sample_signal_wire()
        };
        assert!(Signal::try_from(wire).is_err());
    }

    #[test]
    fn skips_invalid_records_without_dropping_valid_ones() {
        let bad = SignalWire {
            score: 400,
            ..sample_signal_wire()
        };
        let signals = collect_valid_signals(vec![sample_signal_wire(), bad]);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].id, "sig-1");
    }

    #[test]
    fn orders_signal_levels() {
        assert!(SignalLevel::Watch < SignalLevel::Interesting);
        assert!(SignalLevel::Interesting < SignalLevel::Strong);
        assert!(SignalLevel::Strong < SignalLevel::Opportunity);
    }

    #[test]
    fn converts_whale_trade_and_bounds_price() {
        let wire = WhaleTradeWire {
            id: "t-9".to_string(),
            trader: "0xabc...".to_string(),
            side: "YES".to_string(),
            size_usd: 25_000.0,
            price: 0.41,
            ..WhaleTradeWire::default()
        };
        let trade = WhaleTrade::try_from(wire).expect("trade should convert");
        assert_eq!(trade.side, "YES");

        let out_of_range = WhaleTradeWire {
            id: "t-10".to_string(),
            price: 1.5,
            ..WhaleTradeWire::default()
        };
        assert!(WhaleTrade::try_from(out_of_range).is_err());
    }

    #[test]
    fn normalizes_args_defaults() {
        let config = ScannerArgs::default()
            .normalize()
            .expect("defaults should be valid");

        assert_eq!(config.origin, DEFAULT_ORIGIN);
        assert_eq!(config.channel_override, None);
        assert_eq!(
            config.heartbeat_interval_secs,
            DEFAULT_HEARTBEAT_INTERVAL_SECS
        );
        assert_eq!(config.reconnect_delay_secs, DEFAULT_RECONNECT_DELAY_SECS);
        assert_eq!(config.pull_interval_secs, DEFAULT_PULL_INTERVAL_SECS);
        assert_eq!(config.whale_capacity, DEFAULT_WHALE_CAPACITY);
        assert!(config.live_mode);
        assert_eq!(config.active_view, ViewKind::Scanner);
        assert_eq!(config.hot_strategy, HotStrategy::Fade);
    }

    #[test]
    fn trims_trailing_slash_from_origin() {
        let config = ScannerArgs {
            origin: Some("https://scanner.example.com/".to_string()),
            ..ScannerArgs::default()
        }
        .normalize()
        .expect("origin should normalize");

        assert_eq!(config.origin, "https://scanner.example.com");
    }

    #[test]
    fn rejects_non_http_origin() {
        let result = ScannerArgs {
            origin: Some("ftp://scanner.example.com".to_string()),
            ..ScannerArgs::default()
        }
        .normalize();
        assert!(result.is_err());
    }

    #[test]
    fn rejects_non_ws_channel_override() {
        let result = ScannerArgs {
            channel_url: Some("https://scanner.example.com/ws".to_string()),
            ..ScannerArgs::default()
        }
        .normalize();
        assert!(result.is_err());
    }

    #[test]
    fn validates_heartbeat_interval_range() {
        let result = ScannerArgs {
            heartbeat_interval_secs: Some(1),
            ..ScannerArgs::default()
        }
        .normalize();
        assert!(result.is_err());
    }

    #[test]
    fn validates_pull_interval_range() {
        let result = ScannerArgs {
            pull_interval_secs: Some(10_000),
            ..ScannerArgs::default()
        }
        .normalize();
        assert!(result.is_err());
    }

    #[test]
    fn parses_view_and_strategy_round_trip() {
        for view in ViewKind::ALL {
            assert_eq!(ViewKind::parse_str(view.as_str()).unwrap(), view);
        }
        assert_eq!(
            HotStrategy::parse_str("negative_risk").unwrap(),
            HotStrategy::NegativeRisk
        );
        assert!(ViewKind::parse_str("orderflow").is_err());
    }
}
