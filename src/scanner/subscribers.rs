use crate::scanner::types::{SignalsUpdate, WhaleTrade};
use parking_lot::Mutex;
use std::sync::Arc;

pub type ConnectionCallback = Box<dyn Fn() + Send + Sync>;
pub type SignalsCallback = Box<dyn Fn(SignalsUpdate) + Send + Sync>;
pub type WhaleTradeCallback = Box<dyn Fn(WhaleTrade) + Send + Sync>;

/// The callback set a host installs to observe the channel. Every field is
/// optional; the host typically replaces the whole set on each re-render.
#[derive(Default)]
pub struct SubscriberSet {
    pub on_connect: Option<ConnectionCallback>,
    pub on_disconnect: Option<ConnectionCallback>,
    pub on_signals: Option<SignalsCallback>,
    pub on_whale_trade: Option<WhaleTradeCallback>,
}

impl SubscriberSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_on_connect(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_connect = Some(Box::new(callback));
        self
    }

    pub fn with_on_disconnect(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_disconnect = Some(Box::new(callback));
        self
    }

    pub fn with_on_signals(
        mut self,
        callback: impl Fn(SignalsUpdate) + Send + Sync + 'static,
    ) -> Self {
        self.on_signals = Some(Box::new(callback));
        self
    }

    pub fn with_on_whale_trade(
        mut self,
        callback: impl Fn(WhaleTrade) + Send + Sync + 'static,
    ) -> Self {
        self.on_whale_trade = Some(Box::new(callback));
        self
    }
}

/// One mutable cell holding the latest callback set. The dispatcher snapshots
/// it at call time, so swapping subscribers never touches the channel and the
/// cell lock is never held while a callback runs.
pub struct SubscriberRegistry {
    current: Mutex<Arc<SubscriberSet>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(Arc::new(SubscriberSet::default())),
        }
    }

    pub fn replace(&self, set: SubscriberSet) {
        *self.current.lock() = Arc::new(set);
    }

    pub fn snapshot(&self) -> Arc<SubscriberSet> {
        Arc::clone(&self.current.lock())
    }

    pub fn notify_connect(&self) {
        let set = self.snapshot();
        if let Some(callback) = &set.on_connect {
            callback();
        }
    }

    pub fn notify_disconnect(&self) {
        let set = self.snapshot();
        if let Some(callback) = &set.on_disconnect {
            callback();
        }
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}
