use crate::scanner::types::{Signal, SignalLevel, ViewKind};
use crate::views::profile::FilterProfile;

/// Conjunctive threshold check for a single record. Predicates are
/// independent, so evaluation order never changes the result.
pub fn passes(signal: &Signal, profile: &FilterProfile, view: ViewKind) -> bool {
    if signal.score < profile.min_score {
        return false;
    }
    if signal.volume_24h < profile.min_volume_usd {
        return false;
    }
    if signal.liquidity < profile.min_liquidity {
        return false;
    }
    if view.gates_whale_activity()
        && (signal.whale_count < profile.min_whale_count
            || signal.unique_whale_count < profile.min_unique_whales)
    {
        return false;
    }
    if view.gates_spread() && profile.max_spread > 0.0 && signal.spread > profile.max_spread {
        return false;
    }
    if profile.max_time_hours > 0.0 {
        // Records without a remaining-time value always satisfy this gate.
        if let Some(hours) = signal.hours_remaining {
            if hours > profile.max_time_hours {
                return false;
            }
        }
    }
    if signal.level == SignalLevel::Watch && !profile.show_watch_level {
        return false;
    }
    true
}

/// The visible subset of a record set for one view. Pure: a fixed record set
/// and profile yield the same subset no matter how often it is recomputed.
pub fn visible(records: &[Signal], profile: &FilterProfile, view: ViewKind) -> Vec<Signal> {
    records
        .iter()
        .filter(|signal| passes(signal, profile, view))
        .cloned()
        .collect()
}
