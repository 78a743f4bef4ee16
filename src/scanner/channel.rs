use crate::scanner::coordinator::ViewDataState;
use crate::scanner::dispatch::{dispatch_envelope, InboundMessage};
use crate::scanner::endpoints::{self, connect_channel};
use crate::scanner::subscribers::SubscriberRegistry;
use crate::scanner::types::{ChannelStatusSnapshot, ConnectionState, ScannerConfig};
use crate::scanner::PING_TEXT;
use crate::views::profile::ViewProfileStore;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, RwLock};
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Everything the runtime tasks and the client facade share.
pub struct ScannerShared {
    pub config: ScannerConfig,
    pub endpoint: String,
    pub coordinator: Mutex<ViewDataState>,
    pub subscribers: SubscriberRegistry,
    pub profiles: Mutex<ViewProfileStore>,
    pub status: RwLock<ChannelStatusSnapshot>,
    pub pull_wakeup: Notify,
}

impl ScannerShared {
    pub fn new(config: ScannerConfig) -> Self {
        let endpoint = endpoints::channel_endpoint(&config);
        let coordinator = ViewDataState::new(&config);
        let status = ChannelStatusSnapshot::disconnected(
            endpoint.clone(),
            Some("channel idle".to_string()),
        );

        Self {
            config,
            endpoint,
            coordinator: Mutex::new(coordinator),
            subscribers: SubscriberRegistry::new(),
            profiles: Mutex::new(ViewProfileStore::new()),
            status: RwLock::new(status),
            pull_wakeup: Notify::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChannelDirective {
    Continue,
    Closed,
}

/// Runs the whole subsystem until the token is cancelled: the channel loop on
/// this task, the pull loop beside it. Cancellation tears both down before
/// the final status is published, so no callback fires afterwards.
pub async fn run_scanner(shared: Arc<ScannerShared>, cancel_token: CancellationToken) {
    let http_client = Client::new();

    let pull_shared = Arc::clone(&shared);
    let pull_client = http_client.clone();
    let pull_cancel = cancel_token.clone();
    let pull_handle = tokio::spawn(async move {
        run_pull_loop(pull_shared, pull_client, pull_cancel).await;
    });

    run_channel_loop(&shared, &cancel_token).await;

    cancel_token.cancel();
    let _ = pull_handle.await;

    publish_status(
        &shared,
        ConnectionState::Disconnected,
        Some("scanner stopped".to_string()),
    )
    .await;
}

async fn run_channel_loop(shared: &ScannerShared, cancel_token: &CancellationToken) {
    let heartbeat_period = Duration::from_secs(shared.config.heartbeat_interval_secs);
    let reconnect_delay = Duration::from_secs(shared.config.reconnect_delay_secs);

    while !cancel_token.is_cancelled() {
        publish_status(
            shared,
            ConnectionState::Connecting,
            Some("opening channel".to_string()),
        )
        .await;

        let connected = tokio::select! {
            _ = cancel_token.cancelled() => break,
            result = connect_channel(&shared.endpoint) => result,
        };

        match connected {
            Ok(mut stream) => {
                info!(endpoint = %shared.endpoint, "channel open");
                set_connection_error(shared, None).await;
                publish_status(
                    shared,
                    ConnectionState::Open,
                    Some("channel open".to_string()),
                )
                .await;
                shared.subscribers.notify_connect();

                // First heartbeat one full period after the handshake.
                let mut heartbeat = tokio::time::interval_at(
                    tokio::time::Instant::now() + heartbeat_period,
                    heartbeat_period,
                );
                heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);

                let mut explicit_close = false;
                loop {
                    tokio::select! {
                        _ = cancel_token.cancelled() => {
                            explicit_close = true;
                            break;
                        }
                        _ = heartbeat.tick() => {
                            if let Err(error) = stream.send(Message::Text(PING_TEXT.to_string())).await {
                                warn!(%error, "heartbeat send failed");
                                break;
                            }
                        }
                        next_frame = stream.next() => {
                            let Some(frame) = next_frame else {
                                break;
                            };
                            match frame {
                                Ok(message) => {
                                    if handle_frame(shared, message) == ChannelDirective::Closed {
                                        break;
                                    }
                                }
                                Err(error) => {
                                    warn!(%error, "channel frame error");
                                    break;
                                }
                            }
                        }
                    }
                }

                if explicit_close {
                    publish_status(
                        shared,
                        ConnectionState::Closing,
                        Some("closing channel".to_string()),
                    )
                    .await;
                    publish_status(
                        shared,
                        ConnectionState::Disconnected,
                        Some("channel closed by caller".to_string()),
                    )
                    .await;
                    shared.subscribers.notify_disconnect();
                    break;
                }

                publish_status(
                    shared,
                    ConnectionState::Disconnected,
                    Some("channel closed".to_string()),
                )
                .await;
                shared.subscribers.notify_disconnect();
            }
            Err(error) => {
                warn!(endpoint = %shared.endpoint, %error, "channel connect failed");
                set_connection_error(shared, Some(error.to_string())).await;
                publish_status(
                    shared,
                    ConnectionState::Disconnected,
                    Some("channel connect failed".to_string()),
                )
                .await;
            }
        }

        // Exactly one reconnect attempt per closure, after a fixed delay.
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            _ = tokio::time::sleep(reconnect_delay) => {}
        }
    }
}

fn handle_frame(shared: &ScannerShared, message: Message) -> ChannelDirective {
    match message {
        Message::Text(text) => {
            let mut payload = text.into_bytes();
            ingest_payload(shared, payload.as_mut_slice());
            ChannelDirective::Continue
        }
        Message::Binary(mut payload) => {
            ingest_payload(shared, payload.as_mut_slice());
            ChannelDirective::Continue
        }
        Message::Close(_) => ChannelDirective::Closed,
        // Transport-level ping/pong is handled by tungstenite itself; the
        // protocol's pong arrives as a text envelope.
        _ => ChannelDirective::Continue,
    }
}

fn ingest_payload(shared: &ScannerShared, payload: &mut [u8]) {
    let Some(message) = dispatch_envelope(payload, &shared.subscribers) else {
        return;
    };

    match message {
        InboundMessage::Signals(update) => {
            let outcome = shared.coordinator.lock().apply_push(update);
            debug!(?outcome, "channel signals update");
        }
        InboundMessage::Whale(trade) => {
            shared.coordinator.lock().push_whale(trade);
        }
        InboundMessage::ConnectionAck { .. }
        | InboundMessage::Pong
        | InboundMessage::Unrecognized { .. } => {}
    }
}

async fn run_pull_loop(
    shared: Arc<ScannerShared>,
    client: Client,
    cancel_token: CancellationToken,
) {
    let mut ticker =
        tokio::time::interval(Duration::from_secs(shared.config.pull_interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            _ = shared.pull_wakeup.notified() => execute_pull(&shared, &client, true).await,
            _ = ticker.tick() => execute_pull(&shared, &client, false).await,
        }
    }
}

/// One pull round. A forced round (view switch, strategy change, live-mode
/// toggle) always fetches the active view's signals; a periodic round first
/// checks whether pulls are authoritative right now.
async fn execute_pull(shared: &ScannerShared, client: &Client, forced: bool) {
    let (view, strategy) = {
        let coordinator = shared.coordinator.lock();
        (coordinator.active_view(), coordinator.hot_strategy())
    };

    if !forced {
        let channel_open = shared.status.read().await.state == ConnectionState::Open;
        if !shared.coordinator.lock().needs_pull(channel_open) {
            return;
        }
    }

    match endpoints::fetch_signals(client, &shared.config.origin, view, strategy).await {
        Ok(update) => {
            let outcome = shared.coordinator.lock().apply_pull(view, update);
            debug!(view = view.as_str(), ?outcome, "signals pull completed");
        }
        Err(error) => {
            warn!(view = view.as_str(), %error, "signals pull failed");
            shared
                .coordinator
                .lock()
                .record_pull_failure(view, error.to_string());
        }
    }

    if !forced {
        match endpoints::fetch_whale_trades(
            client,
            &shared.config.origin,
            shared.config.whale_capacity,
        )
        .await
        {
            Ok((trades, error)) => {
                if let Some(error) = error {
                    warn!(%error, "whale trades pull reported error");
                }
                shared.coordinator.lock().extend_whales(trades);
            }
            Err(error) => warn!(%error, "whale trades pull failed"),
        }
    }
}

async fn publish_status(shared: &ScannerShared, state: ConnectionState, reason: Option<String>) {
    let mut writable = shared.status.write().await;
    let connection_error = writable.connection_error.clone();
    *writable = ChannelStatusSnapshot {
        state,
        endpoint: shared.endpoint.clone(),
        connection_error,
        reason,
    };
}

async fn set_connection_error(shared: &ScannerShared, error: Option<String>) {
    shared.status.write().await.connection_error = error;
}
