use crate::error::ScannerError;
use crate::scanner::subscribers::SubscriberRegistry;
use crate::scanner::types::{
    collect_valid_signals, EnvelopeWire, SignalsPayloadWire, SignalsUpdate, WhaleTrade,
    WhaleTradeWire,
};
use crate::scanner::{MSG_CONNECTION_ACK, MSG_PONG, MSG_SIGNALS_UPDATE, MSG_WHALE_TRADE};
use tracing::{debug, warn};

#[derive(Debug, PartialEq)]
pub enum InboundMessage {
    Signals(SignalsUpdate),
    Whale(WhaleTrade),
    ConnectionAck { message: Option<String> },
    Pong,
    Unrecognized { kind: String },
}

/// Structural decode of one inbound frame. Pure classification: no filtering,
/// no merging, no connection-state changes.
pub fn classify_envelope(payload: &mut [u8]) -> Result<InboundMessage, ScannerError> {
    let envelope: EnvelopeWire = simd_json::serde::from_slice(payload)?;

    match envelope.kind.as_str() {
        MSG_SIGNALS_UPDATE => {
            let wire = match envelope.data {
                Some(value) => simd_json::serde::from_owned_value::<SignalsPayloadWire>(value)?,
                None => SignalsPayloadWire::default(),
            };
            Ok(InboundMessage::Signals(SignalsUpdate {
                signals: collect_valid_signals(wire.signals),
                cached: wire.cached,
                cache_age: wire.cache_age,
                error: envelope.error,
            }))
        }
        MSG_WHALE_TRADE => {
            let value = envelope.data.ok_or_else(|| {
                ScannerError::InvalidArgument("whale_trade envelope is missing data".to_string())
            })?;
            let wire: WhaleTradeWire = simd_json::serde::from_owned_value(value)?;
            Ok(InboundMessage::Whale(wire.try_into()?))
        }
        MSG_CONNECTION_ACK => Ok(InboundMessage::ConnectionAck {
            message: envelope.message,
        }),
        MSG_PONG => Ok(InboundMessage::Pong),
        other => Ok(InboundMessage::Unrecognized {
            kind: other.to_string(),
        }),
    }
}

/// Decodes one frame and fans it out to the current subscriber set. Decode
/// failures are discarded here; the connection is never affected. Returns the
/// classification so the caller can merge it into view state afterwards.
pub fn dispatch_envelope(
    payload: &mut [u8],
    registry: &SubscriberRegistry,
) -> Option<InboundMessage> {
    let message = match classify_envelope(payload) {
        Ok(message) => message,
        Err(error) => {
            warn!(%error, "discarding malformed envelope");
            return None;
        }
    };

    let subscribers = registry.snapshot();
    match &message {
        InboundMessage::Signals(update) => {
            if let Some(callback) = &subscribers.on_signals {
                callback(update.clone());
            }
        }
        InboundMessage::Whale(trade) => {
            if let Some(callback) = &subscribers.on_whale_trade {
                callback(trade.clone());
            }
        }
        InboundMessage::ConnectionAck { message } => {
            debug!(message = message.as_deref(), "connection acknowledged");
        }
        InboundMessage::Pong => {
            debug!("heartbeat acknowledged");
        }
        InboundMessage::Unrecognized { kind } => {
            warn!(kind = %kind, "discarding unrecognized envelope type");
        }
    }

    Some(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::subscribers::SubscriberSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_registry() -> (SubscriberRegistry, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let registry = SubscriberRegistry::new();
        let signal_hits = Arc::new(AtomicUsize::new(0));
        let whale_hits = Arc::new(AtomicUsize::new(0));

        let signals = Arc::clone(&signal_hits);
        let whales = Arc::clone(&whale_hits);
        registry.replace(
            SubscriberSet::new()
                .with_on_signals(move |_| {
                    signals.fetch_add(1, Ordering::SeqCst);
                })
                .with_on_whale_trade(move |_| {
                    whales.fetch_add(1, Ordering::SeqCst);
                }),
        );

        (registry, signal_hits, whale_hits)
    }

    #[test]
    fn classifies_signals_update_with_payload_defaults() {
        let mut payload = br#"{"type":"signals_update","data":{}}"#.to_vec();
        let message = classify_envelope(payload.as_mut_slice()).expect("envelope should decode");

        match message {
            InboundMessage::Signals(update) => {
                assert!(update.signals.is_empty());
                assert!(!update.cached);
                assert_eq!(update.cache_age, None);
                assert_eq!(update.error, None);
            }
            other => panic!("expected signals update, got {other:?}"),
        }
    }

    #[test]
    fn signals_update_carries_envelope_error_alongside_data() {
        let mut payload = br#"{
            "type": "signals_update",
            "data": {"signals": [], "cached": true, "cache_age": 90},
            "error": "stale upstream"
        }"#
        .to_vec();
        let message = classify_envelope(payload.as_mut_slice()).expect("envelope should decode");

        match message {
            InboundMessage::Signals(update) => {
                assert!(update.cached);
                assert_eq!(update.cache_age, Some(90));
                assert_eq!(update.error.as_deref(), Some("stale upstream"));
            }
            other => panic!("expected signals update, got {other:?}"),
        }
    }

    #[test]
    fn whale_envelope_reaches_only_whale_subscribers() {
        let (registry, signal_hits, whale_hits) = counting_registry();
        let mut payload = br#"{
            "type": "whale_trade",
            "data": {"id": "t-1", "trader": "0xfeed...", "side": "NO", "size_usd": 18000.0, "price": 0.37}
        }"#
        .to_vec();

        let message = dispatch_envelope(payload.as_mut_slice(), &registry);

        assert!(matches!(message, Some(InboundMessage::Whale(_))));
        assert_eq!(signal_hits.load(Ordering::SeqCst), 0);
        assert_eq!(whale_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn signals_envelope_reaches_only_signal_subscribers() {
        let (registry, signal_hits, whale_hits) = counting_registry();
        let mut payload = br#"{"type":"signals_update","data":{"signals":[]}}"#.to_vec();

        dispatch_envelope(payload.as_mut_slice(), &registry);

        assert_eq!(signal_hits.load(Ordering::SeqCst), 1);
        assert_eq!(whale_hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unrecognized_type_is_dropped_without_callbacks() {
        let (registry, signal_hits, whale_hits) = counting_registry();
        let mut payload = br#"{"type":"orderbook_delta","data":{"bids":[]}}"#.to_vec();

        let message = dispatch_envelope(payload.as_mut_slice(), &registry);

        match message {
            Some(InboundMessage::Unrecognized { kind }) => assert_eq!(kind, "orderbook_delta"),
            other => panic!("expected unrecognized, got {other:?}"),
        }
        assert_eq!(signal_hits.load(Ordering::SeqCst), 0);
        assert_eq!(whale_hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn malformed_envelope_is_discarded() {
        let (registry, signal_hits, whale_hits) = counting_registry();
        let mut payload = b"not json at all".to_vec();

        let message = dispatch_envelope(payload.as_mut_slice(), &registry);

        assert!(message.is_none());
        assert_eq!(signal_hits.load(Ordering::SeqCst), 0);
        assert_eq!(whale_hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn whale_envelope_without_data_is_an_error() {
        let mut payload = br#"{"type":"whale_trade"}"#.to_vec();
        assert!(classify_envelope(payload.as_mut_slice()).is_err());
    }

    #[test]
    fn pong_and_ack_are_informational() {
        let mut pong = br#"{"type":"pong"}"#.to_vec();
        assert_eq!(
            classify_envelope(pong.as_mut_slice()).expect("pong should decode"),
            InboundMessage::Pong
        );

        let mut ack = br#"{"type":"connection_ack","message":"Connected to scanner"}"#.to_vec();
        match classify_envelope(ack.as_mut_slice()).expect("ack should decode") {
            InboundMessage::ConnectionAck { message } => {
                assert_eq!(message.as_deref(), Some("Connected to scanner"));
            }
            other => panic!("expected ack, got {other:?}"),
        }
    }

    #[test]
    fn ping_constant_round_trips_as_an_envelope() {
        let mut payload = crate::scanner::PING_TEXT.as_bytes().to_vec();
        let envelope: EnvelopeWire =
            simd_json::serde::from_slice(payload.as_mut_slice()).expect("ping should decode");
        assert_eq!(envelope.kind, crate::scanner::MSG_PING);
    }
}
