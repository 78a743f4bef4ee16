use crate::scanner::types::{
    HotStrategy, ScannerConfig, Signal, SignalsUpdate, ViewKind, WhaleTrade,
};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateSource {
    Push,
    Pull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The update targeted a view that is not (or no longer) the active one.
    InactiveView,
    /// A push arrived while live mode is disabled; pulls are authoritative.
    LiveModeOff,
}

/// Freshness and error surface for the record set currently on display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewDataStatus {
    pub view: ViewKind,
    pub source: Option<UpdateSource>,
    /// Monotonic stamp of the last accepted update; later receipt wins.
    pub receipt: u64,
    pub error: Option<String>,
    pub cached: bool,
    pub cache_age: Option<u64>,
}

/// Authoritative in-memory record state for the active view.
///
/// Two writers feed it: channel pushes and periodic pulls. Every accepted
/// update is stamped with a monotonic receipt counter, so whichever arrived
/// last wins regardless of source.
#[derive(Debug)]
pub struct ViewDataState {
    active_view: ViewKind,
    hot_strategy: HotStrategy,
    live_mode: bool,
    records: Vec<Signal>,
    last_source: Option<UpdateSource>,
    receipt_counter: u64,
    error: Option<String>,
    cached: bool,
    cache_age: Option<u64>,
    whale_trades: VecDeque<WhaleTrade>,
    whale_capacity: usize,
}

impl ViewDataState {
    pub fn new(config: &ScannerConfig) -> Self {
        Self {
            active_view: config.active_view,
            hot_strategy: config.hot_strategy,
            live_mode: config.live_mode,
            records: Vec::new(),
            last_source: None,
            receipt_counter: 0,
            error: None,
            cached: false,
            cache_age: None,
            whale_trades: VecDeque::with_capacity(config.whale_capacity),
            whale_capacity: config.whale_capacity,
        }
    }

    pub fn active_view(&self) -> ViewKind {
        self.active_view
    }

    pub fn hot_strategy(&self) -> HotStrategy {
        self.hot_strategy
    }

    pub fn live_mode(&self) -> bool {
        self.live_mode
    }

    pub fn set_live_mode(&mut self, enabled: bool) -> bool {
        if self.live_mode == enabled {
            return false;
        }
        self.live_mode = enabled;
        true
    }

    pub fn records(&self) -> &[Signal] {
        &self.records
    }

    pub fn status(&self) -> ViewDataStatus {
        ViewDataStatus {
            view: self.active_view,
            source: self.last_source,
            receipt: self.receipt_counter,
            error: self.error.clone(),
            cached: self.cached,
            cache_age: self.cache_age,
        }
    }

    pub fn error(&self) -> Option<String> {
        self.error.clone()
    }

    /// A channel push is accepted only while live mode is on and the active
    /// view is the one the channel broadcasts for.
    pub fn apply_push(&mut self, update: SignalsUpdate) -> ApplyOutcome {
        if !self.live_mode {
            return ApplyOutcome::LiveModeOff;
        }
        if !self.active_view.channel_covered() {
            return ApplyOutcome::InactiveView;
        }
        self.apply_update(UpdateSource::Push, update);
        ApplyOutcome::Applied
    }

    /// A pull result is tagged with the view it was issued for; if the active
    /// view moved on while the request was in flight, the result is stale and
    /// discarded.
    pub fn apply_pull(&mut self, view: ViewKind, update: SignalsUpdate) -> ApplyOutcome {
        if view != self.active_view {
            return ApplyOutcome::InactiveView;
        }
        self.apply_update(UpdateSource::Pull, update);
        ApplyOutcome::Applied
    }

    /// A failed pull keeps whatever is on display; stale-but-present data
    /// beats an empty panel. Only the error banner changes.
    pub fn record_pull_failure(&mut self, view: ViewKind, message: String) {
        if view == self.active_view {
            self.error = Some(message);
        }
    }

    fn apply_update(&mut self, source: UpdateSource, update: SignalsUpdate) {
        self.receipt_counter += 1;
        self.last_source = Some(source);
        self.records = update.signals;
        self.error = update.error;
        self.cached = update.cached;
        self.cache_age = update.cache_age;
    }

    /// Switching views discards the displayed set outright; the caller issues
    /// one immediate pull for the new view when this returns true.
    pub fn set_active_view(&mut self, view: ViewKind) -> bool {
        if view == self.active_view {
            return false;
        }
        self.active_view = view;
        self.records.clear();
        self.last_source = None;
        self.error = None;
        self.cached = false;
        self.cache_age = None;
        true
    }

    pub fn set_hot_strategy(&mut self, strategy: HotStrategy) -> bool {
        if strategy == self.hot_strategy {
            return false;
        }
        self.hot_strategy = strategy;
        self.active_view == ViewKind::Hot
    }

    /// Whether the periodic pull should run: whenever pushes are not
    /// authoritative for what is on display.
    pub fn needs_pull(&self, channel_open: bool) -> bool {
        !self.live_mode || !channel_open || !self.active_view.channel_covered()
    }

    pub fn push_whale(&mut self, trade: WhaleTrade) {
        if self.whale_trades.iter().any(|known| known.id == trade.id) {
            return;
        }
        if self.whale_trades.len() == self.whale_capacity {
            self.whale_trades.pop_front();
        }
        self.whale_trades.push_back(trade);
    }

    pub fn extend_whales(&mut self, trades: Vec<WhaleTrade>) {
        for trade in trades {
            self.push_whale(trade);
        }
    }

    pub fn whale_trades(&self) -> Vec<WhaleTrade> {
        self.whale_trades.iter().cloned().collect()
    }
}
