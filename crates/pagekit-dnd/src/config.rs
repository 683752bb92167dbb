#![forbid(unsafe_code)]

//! Tunables for drag resolution and activation timing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Range |
//! |----------|---------|-------|
//! | `PAGEKIT_NEST_BAND_LOW` | 0.25 | 0.0–0.5 |
//! | `PAGEKIT_NEST_BAND_HIGH` | 0.75 | 0.5–1.0 |
//! | `PAGEKIT_SIBLING_SPLIT` | 0.5 | 0.0–1.0 |
//! | `PAGEKIT_DRAG_THRESHOLD_PX` | 3 | 0–64 |
//! | `PAGEKIT_DOUBLE_ACTIVATION_MS` | 300 | 100–1000 |

use std::time::Duration;

/// Default lower edge of the container "nest inside" band.
pub const DEFAULT_NEST_BAND_LOW: f64 = 0.25;
/// Default upper edge of the container "nest inside" band.
pub const DEFAULT_NEST_BAND_HIGH: f64 = 0.75;
/// Default split between "insert before" and "insert after" for siblings.
pub const DEFAULT_SIBLING_SPLIT: f64 = 0.5;
/// Default pointer travel (CSS px) before a synthetic drag starts tracking.
pub const DEFAULT_DRAG_THRESHOLD_PX: f64 = 3.0;
/// Default window for two activations to count as a double activation.
pub const DEFAULT_DOUBLE_ACTIVATION_MS: u64 = 300;

const MAX_DRAG_THRESHOLD_PX: f64 = 64.0;
const MIN_DOUBLE_ACTIVATION_MS: u64 = 100;
const MAX_DOUBLE_ACTIVATION_MS: u64 = 1000;

/// Drag/drop tuning shared by the resolver, the session machine, and the
/// inline edit bridge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragConfig {
    /// Relative height above which a container hit nests inside (exclusive).
    pub nest_band_low: f64,
    /// Relative height below which a container hit nests inside (exclusive).
    pub nest_band_high: f64,
    /// Relative height at or below which a sibling hit inserts before.
    pub sibling_split: f64,
    /// Pointer travel before an armed synthetic drag starts tracking.
    pub drag_threshold: f64,
    /// Maximum gap between the two activations of a double activation.
    pub double_activation: Duration,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            nest_band_low: DEFAULT_NEST_BAND_LOW,
            nest_band_high: DEFAULT_NEST_BAND_HIGH,
            sibling_split: DEFAULT_SIBLING_SPLIT,
            drag_threshold: DEFAULT_DRAG_THRESHOLD_PX,
            double_activation: Duration::from_millis(DEFAULT_DOUBLE_ACTIVATION_MS),
        }
    }
}

impl DragConfig {
    #[must_use]
    pub fn with_nest_band(mut self, low: f64, high: f64) -> Self {
        self.nest_band_low = low;
        self.nest_band_high = high;
        self
    }

    #[must_use]
    pub fn with_sibling_split(mut self, split: f64) -> Self {
        self.sibling_split = split;
        self
    }

    #[must_use]
    pub fn with_drag_threshold(mut self, px: f64) -> Self {
        self.drag_threshold = px;
        self
    }

    #[must_use]
    pub fn with_double_activation(mut self, window: Duration) -> Self {
        self.double_activation = window;
        self
    }

    /// Read overrides from the process environment. See the module docs.
    ///
    /// Values are automatically clamped to valid ranges.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`Self::from_env`] with an injectable variable source.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let float = |key: &str| lookup(key).and_then(|val| val.trim().parse::<f64>().ok());

        if let Some(low) = float("PAGEKIT_NEST_BAND_LOW") {
            config.nest_band_low = low;
        }
        if let Some(high) = float("PAGEKIT_NEST_BAND_HIGH") {
            config.nest_band_high = high;
        }
        if let Some(split) = float("PAGEKIT_SIBLING_SPLIT") {
            config.sibling_split = split;
        }
        if let Some(px) = float("PAGEKIT_DRAG_THRESHOLD_PX") {
            config.drag_threshold = px;
        }
        if let Some(val) = lookup("PAGEKIT_DOUBLE_ACTIVATION_MS")
            && let Ok(ms) = val.trim().parse::<u64>()
        {
            config.double_activation = Duration::from_millis(ms);
        }

        config.validated()
    }

    /// Validate and clamp values to safe ranges.
    ///
    /// Non-finite values fall back to defaults. The nest band always
    /// straddles the middle of the box, so a container hit can nest.
    #[must_use]
    pub fn validated(mut self) -> Self {
        fn finite_or(value: f64, fallback: f64) -> f64 {
            if value.is_finite() { value } else { fallback }
        }

        self.nest_band_low = finite_or(self.nest_band_low, DEFAULT_NEST_BAND_LOW).clamp(0.0, 0.5);
        self.nest_band_high =
            finite_or(self.nest_band_high, DEFAULT_NEST_BAND_HIGH).clamp(0.5, 1.0);
        self.sibling_split = finite_or(self.sibling_split, DEFAULT_SIBLING_SPLIT).clamp(0.0, 1.0);
        self.drag_threshold = finite_or(self.drag_threshold, DEFAULT_DRAG_THRESHOLD_PX)
            .clamp(0.0, MAX_DRAG_THRESHOLD_PX);
        let ms = u64::try_from(self.double_activation.as_millis()).unwrap_or(u64::MAX);
        self.double_activation =
            Duration::from_millis(ms.clamp(MIN_DOUBLE_ACTIVATION_MS, MAX_DOUBLE_ACTIVATION_MS));
        self
    }

    /// Check if values are within valid ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        *self == self.validated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = DragConfig::default();
        assert!(config.is_valid());
        assert_eq!(config.nest_band_low, 0.25);
        assert_eq!(config.nest_band_high, 0.75);
        assert_eq!(config.double_activation, Duration::from_millis(300));
    }

    #[test]
    fn env_overrides_are_read_and_clamped() {
        let config = DragConfig::from_lookup(lookup(&[
            ("PAGEKIT_NEST_BAND_LOW", "0.3"),
            ("PAGEKIT_NEST_BAND_HIGH", "2.0"),
            ("PAGEKIT_DRAG_THRESHOLD_PX", " 8 "),
            ("PAGEKIT_DOUBLE_ACTIVATION_MS", "5000"),
        ]));
        assert_eq!(config.nest_band_low, 0.3);
        assert_eq!(config.nest_band_high, 1.0);
        assert_eq!(config.drag_threshold, 8.0);
        assert_eq!(config.double_activation, Duration::from_millis(1000));
    }

    #[test]
    fn garbage_env_values_are_ignored() {
        let config = DragConfig::from_lookup(lookup(&[
            ("PAGEKIT_NEST_BAND_LOW", "a quarter"),
            ("PAGEKIT_DOUBLE_ACTIVATION_MS", "-3"),
        ]));
        assert_eq!(config, DragConfig::default());
    }

    #[test]
    fn non_finite_values_fall_back() {
        let config = DragConfig::default()
            .with_nest_band(f64::NAN, f64::INFINITY)
            .with_drag_threshold(-4.0)
            .validated();
        assert_eq!(config.nest_band_low, DEFAULT_NEST_BAND_LOW);
        assert_eq!(config.nest_band_high, DEFAULT_NEST_BAND_HIGH);
        assert_eq!(config.drag_threshold, 0.0);
    }
}
