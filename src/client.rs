use crate::error::ScannerError;
use crate::scanner::channel::{run_scanner, ScannerShared};
use crate::scanner::coordinator::ViewDataStatus;
use crate::scanner::subscribers::SubscriberSet;
use crate::scanner::types::{
    ChannelStatusSnapshot, HotStrategy, ScannerArgs, Signal, ViewKind, WhaleTrade,
};
use crate::state::{RuntimeHandle, SessionState};
use crate::views::filter;
use crate::views::profile::FilterProfile;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Facade over the scanner core: one client owns one channel, the per-view
/// record state, the subscriber cell, and the profile store.
pub struct ScannerClient {
    shared: Arc<ScannerShared>,
    session: SessionState,
}

impl ScannerClient {
    pub fn new(args: ScannerArgs) -> Result<Self, ScannerError> {
        let config = args.normalize()?;
        Ok(Self {
            shared: Arc::new(ScannerShared::new(config)),
            session: SessionState::new(),
        })
    }

    /// Starts the runtime. Idempotent: a no-op (returning false) while a
    /// runtime is already alive, whether connecting, open, or waiting out a
    /// reconnect delay.
    pub async fn open(&self) -> bool {
        let mut slot = self.session.runtime.lock().await;
        if let Some(handle) = slot.as_ref() {
            if !handle.join_handle.is_finished() {
                return false;
            }
        }

        let cancellation_token = CancellationToken::new();
        let task_token = cancellation_token.clone();
        let shared = Arc::clone(&self.shared);
        let join_handle = tokio::spawn(async move {
            run_scanner(shared, task_token).await;
        });

        *slot = Some(RuntimeHandle {
            cancellation_token,
            join_handle,
        });
        true
    }

    /// Tears down any open channel and cancels every pending timer, then
    /// waits for the runtime to finish so no callback fires afterwards. Safe
    /// to call repeatedly; returns false when nothing was running.
    pub async fn close(&self) -> bool {
        let existing = { self.session.runtime.lock().await.take() };
        match existing {
            Some(handle) => {
                handle.cancellation_token.cancel();
                let _ = handle.join_handle.await;
                true
            }
            None => false,
        }
    }

    pub async fn status(&self) -> ChannelStatusSnapshot {
        self.shared.status.read().await.clone()
    }

    /// Installs the latest callback set. Never touches the channel.
    pub fn set_subscribers(&self, set: SubscriberSet) {
        self.shared.subscribers.replace(set);
    }

    pub fn active_view(&self) -> ViewKind {
        self.shared.coordinator.lock().active_view()
    }

    /// Switches the active view, discarding the displayed set and requesting
    /// one immediate pull for the new view.
    pub fn set_active_view(&self, view: ViewKind) -> bool {
        let changed = self.shared.coordinator.lock().set_active_view(view);
        if changed {
            self.shared.pull_wakeup.notify_one();
        }
        changed
    }

    pub fn set_hot_strategy(&self, strategy: HotStrategy) -> bool {
        let refresh = self.shared.coordinator.lock().set_hot_strategy(strategy);
        if refresh {
            self.shared.pull_wakeup.notify_one();
        }
        refresh
    }

    pub fn live_mode(&self) -> bool {
        self.shared.coordinator.lock().live_mode()
    }

    /// Toggles whether channel pushes are authoritative; turning live mode
    /// off hands authority to pulls and requests one right away.
    pub fn set_live_mode(&self, enabled: bool) {
        let changed = self.shared.coordinator.lock().set_live_mode(enabled);
        if changed && !enabled {
            self.shared.pull_wakeup.notify_one();
        }
    }

    pub fn profile(&self, view: ViewKind) -> FilterProfile {
        self.shared.profiles.lock().profile(view)
    }

    pub fn update_profile(
        &self,
        view: ViewKind,
        profile: FilterProfile,
    ) -> Result<(), ScannerError> {
        let profile = profile.validated()?;
        self.shared.profiles.lock().update(view, profile);
        Ok(())
    }

    /// The raw record set currently held for the active view.
    pub fn signals(&self) -> Vec<Signal> {
        self.shared.coordinator.lock().records().to_vec()
    }

    /// The active view's record set narrowed through its profile.
    pub fn visible_signals(&self) -> Vec<Signal> {
        let (records, view) = {
            let coordinator = self.shared.coordinator.lock();
            (coordinator.records().to_vec(), coordinator.active_view())
        };
        let profile = self.shared.profiles.lock().profile(view);
        filter::visible(&records, &profile, view)
    }

    pub fn whale_trades(&self) -> Vec<WhaleTrade> {
        self.shared.coordinator.lock().whale_trades()
    }

    pub fn view_status(&self) -> ViewDataStatus {
        self.shared.coordinator.lock().status()
    }

    pub fn view_error(&self) -> Option<String> {
        self.shared.coordinator.lock().error()
    }
}
