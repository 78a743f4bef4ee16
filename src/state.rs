use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Handle to a running scanner runtime: one token tears down the channel
/// loop, its timers, and the pull loop together.
pub struct RuntimeHandle {
    pub cancellation_token: CancellationToken,
    pub join_handle: JoinHandle<()>,
}

pub struct SessionState {
    pub runtime: Mutex<Option<RuntimeHandle>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            runtime: Mutex::new(None),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
