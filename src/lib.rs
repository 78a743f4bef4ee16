//! Client core for the live signal scanner dashboard.
//!
//! Keeps exactly one persistent channel open to the scanner backend with
//! heartbeat and fixed-delay recovery, dispatches typed envelopes to the
//! current subscriber callbacks, reconciles channel pushes with periodic
//! REST pulls into one record set per view, and filters that set through
//! independently configurable view profiles.

pub mod client;
pub mod error;
pub mod scanner;
pub mod state;
pub mod views;

pub use client::ScannerClient;
pub use error::ScannerError;
pub use scanner::coordinator::{ApplyOutcome, UpdateSource, ViewDataStatus};
pub use scanner::subscribers::{SubscriberRegistry, SubscriberSet};
pub use scanner::types::{
    ChannelStatusSnapshot, ConnectionState, HotStrategy, ScannerArgs, ScannerConfig, Signal,
    SignalLevel, SignalsUpdate, ViewKind, WhaleTrade,
};
pub use views::filter::visible;
pub use views::profile::{FilterProfile, ViewProfileStore};
