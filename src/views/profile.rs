use crate::error::ScannerError;
use crate::scanner::types::ViewKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Threshold criteria for one view. A `max_*` value of zero means unbounded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterProfile {
    pub min_score: i64,
    pub min_volume_usd: f64,
    pub min_liquidity: f64,
    pub min_whale_count: u32,
    pub min_unique_whales: u32,
    pub max_spread: f64,
    pub max_time_hours: f64,
    pub show_watch_level: bool,
}

impl FilterProfile {
    /// Baseline for the scanner view: surface everything above the watch
    /// threshold with a minimum of real activity behind it.
    pub fn baseline() -> Self {
        Self {
            min_score: 40,
            min_volume_usd: 1_000.0,
            min_liquidity: 0.0,
            min_whale_count: 0,
            min_unique_whales: 0,
            max_spread: 0.0,
            max_time_hours: 0.0,
            show_watch_level: false,
        }
    }

    pub fn default_for(view: ViewKind) -> Self {
        match view {
            ViewKind::Scanner => Self::baseline(),
            // Equilibrage ranks by traded volume around the 50/50 line; score
            // and whale gates stay out of the way.
            ViewKind::Equilibrage => Self {
                min_score: 0,
                min_volume_usd: 10_000.0,
                show_watch_level: true,
                ..Self::baseline()
            },
            // Hot strategies need exit liquidity more than raw score.
            ViewKind::Hot => Self {
                min_score: 0,
                min_volume_usd: 0.0,
                min_liquidity: 10_000.0,
                show_watch_level: true,
                ..Self::baseline()
            },
            ViewKind::Contrarian => Self {
                min_score: 60,
                min_liquidity: 10_000.0,
                ..Self::baseline()
            },
            ViewKind::Quant => Self {
                min_score: 50,
                min_volume_usd: 5_000.0,
                min_liquidity: 25_000.0,
                max_time_hours: 24.0 * 30.0,
                ..Self::baseline()
            },
        }
    }

    pub fn validated(self) -> Result<Self, ScannerError> {
        if !(0..=100).contains(&self.min_score) {
            return Err(ScannerError::InvalidArgument(
                "minScore must lie within 0-100".to_string(),
            ));
        }
        for (name, value) in [
            ("minVolumeUsd", self.min_volume_usd),
            ("minLiquidity", self.min_liquidity),
            ("maxSpread", self.max_spread),
            ("maxTimeHours", self.max_time_hours),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ScannerError::InvalidArgument(format!(
                    "{name} must be finite and non-negative"
                )));
            }
        }
        Ok(self)
    }
}

/// One owned profile per named view. Profiles are handed out and stored by
/// value, so mutating one view can never alias another.
#[derive(Debug)]
pub struct ViewProfileStore {
    profiles: HashMap<ViewKind, FilterProfile>,
}

impl ViewProfileStore {
    pub fn new() -> Self {
        let mut profiles = HashMap::with_capacity(ViewKind::ALL.len());
        for view in ViewKind::ALL {
            profiles.insert(view, FilterProfile::default_for(view));
        }
        Self { profiles }
    }

    pub fn profile(&self, view: ViewKind) -> FilterProfile {
        self.profiles
            .get(&view)
            .cloned()
            .unwrap_or_else(|| FilterProfile::default_for(view))
    }

    pub fn update(&mut self, view: ViewKind, profile: FilterProfile) {
        self.profiles.insert(view, profile);
    }
}

impl Default for ViewProfileStore {
    fn default() -> Self {
        Self::new()
    }
}
