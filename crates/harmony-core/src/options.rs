//! User-tunable view state for match results.
//!
//! [`ResultsOptions`] mirrors the object the web app keeps in memory and
//! persists inside a harmonisation snapshot, so its JSON shape uses the same
//! camelCase keys and a two-element threshold array.
//!
//! # Intra-instrument override
//!
//! With exactly one instrument loaded there are no cross-instrument matches,
//! so the "show within-instrument matches" toggle is forced on and its prior
//! value parked in `intraInstrumentPreviousState`. Once more instruments are
//! present the parked value is restored and the slot cleared:
//!
//! ```text
//!   normal ──(count == 1 && !intra)──▶ forced { saved = intra }
//!   forced ──(count > 1)─────────────▶ normal  (intra = saved)
//! ```

use serde::{Deserialize, Serialize};

use crate::error::OptionsError;

/// Inclusive `[min, max]` percentage range applied to `|score|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[u8; 2]", into = "[u8; 2]")]
pub struct Threshold {
    min: u8,
    max: u8,
}

impl Threshold {
    pub fn new(min: u8, max: u8) -> Result<Self, OptionsError> {
        if min > 100 || max > 100 {
            return Err(OptionsError::ThresholdOutOfRange(min, max));
        }
        if min > max {
            return Err(OptionsError::ThresholdInverted(min, max));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> u8 {
        self.min
    }

    pub fn max(&self) -> u8 {
        self.max
    }

    /// Whether `|score|` falls inside the range. The sign is ignored.
    pub fn admits(&self, score: f64) -> bool {
        let magnitude = score.abs();
        magnitude >= f64::from(self.min) / 100.0 && magnitude <= f64::from(self.max) / 100.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self { min: 70, max: 100 }
    }
}

impl TryFrom<[u8; 2]> for Threshold {
    type Error = OptionsError;

    fn try_from(value: [u8; 2]) -> Result<Self, Self::Error> {
        Threshold::new(value[0], value[1])
    }
}

impl From<Threshold> for [u8; 2] {
    fn from(t: Threshold) -> Self {
        [t.min, t.max]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsOptions {
    #[serde(default)]
    pub threshold: Threshold,
    /// Free-text filter; matched as a case-insensitive substring.
    #[serde(default)]
    pub search_term: String,
    #[serde(default)]
    pub intra_instrument: bool,
    #[serde(default)]
    pub only_selected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intra_instrument_previous_state: Option<bool>,
}

impl Default for ResultsOptions {
    fn default() -> Self {
        Self {
            threshold: Threshold::default(),
            search_term: String::new(),
            intra_instrument: false,
            only_selected: false,
            intra_instrument_previous_state: None,
        }
    }
}

impl ResultsOptions {
    /// Apply the intra-instrument override for the current instrument count.
    ///
    /// Returns `true` if the options changed.
    pub fn sync_instrument_count(&mut self, count: usize) -> bool {
        if count == 1 && !self.intra_instrument {
            self.intra_instrument_previous_state = Some(self.intra_instrument);
            self.intra_instrument = true;
            tracing::debug!("single instrument loaded, forcing intra-instrument matches on");
            return true;
        }
        if count > 1 {
            if let Some(previous) = self.intra_instrument_previous_state.take() {
                self.intra_instrument = previous;
                tracing::debug!(restored = previous, "multiple instruments loaded, restoring intra-instrument toggle");
                return true;
            }
        }
        false
    }

    /// Whether the toggle is currently held on by the single-instrument override.
    pub fn is_forced(&self) -> bool {
        self.intra_instrument_previous_state.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_web_app() {
        let opts = ResultsOptions::default();
        assert_eq!(opts.threshold.min(), 70);
        assert_eq!(opts.threshold.max(), 100);
        assert!(opts.search_term.is_empty());
        assert!(!opts.intra_instrument);
        assert!(!opts.only_selected);
        assert!(!opts.is_forced());
    }

    #[test]
    fn test_threshold_validation() {
        assert!(Threshold::new(0, 100).is_ok());
        assert_eq!(
            Threshold::new(80, 20),
            Err(OptionsError::ThresholdInverted(80, 20))
        );
        assert_eq!(
            Threshold::new(10, 120),
            Err(OptionsError::ThresholdOutOfRange(10, 120))
        );
    }

    #[test]
    fn test_threshold_bounds_are_inclusive_and_signless() {
        let t = Threshold::new(70, 90).unwrap();
        assert!(t.admits(0.7));
        assert!(t.admits(0.9));
        assert!(t.admits(-0.8));
        assert!(!t.admits(0.69));
        assert!(!t.admits(-0.91));
    }

    #[test]
    fn test_single_instrument_forces_and_restores() {
        let mut opts = ResultsOptions::default();
        assert!(opts.sync_instrument_count(1));
        assert!(opts.intra_instrument);
        assert!(opts.is_forced());
        assert_eq!(opts.intra_instrument_previous_state, Some(false));

        assert!(opts.sync_instrument_count(2));
        assert!(!opts.intra_instrument);
        assert!(!opts.is_forced());
    }

    #[test]
    fn test_no_force_when_already_on() {
        let mut opts = ResultsOptions {
            intra_instrument: true,
            ..Default::default()
        };
        assert!(!opts.sync_instrument_count(1));
        assert!(opts.intra_instrument);
        assert!(!opts.is_forced());
        assert!(!opts.sync_instrument_count(3));
        assert!(opts.intra_instrument);
    }

    #[test]
    fn test_refresh_reenters_forced_state() {
        let mut opts = ResultsOptions::default();
        opts.sync_instrument_count(1);
        opts.sync_instrument_count(2);
        // user leaves it off, then narrows back to one instrument
        assert!(opts.sync_instrument_count(1));
        assert!(opts.intra_instrument);
        assert_eq!(opts.intra_instrument_previous_state, Some(false));
    }

    #[test]
    fn test_user_toggle_while_forced_is_overwritten_on_restore() {
        let mut opts = ResultsOptions::default();
        opts.sync_instrument_count(1);
        opts.intra_instrument = true;
        opts.sync_instrument_count(2);
        assert!(!opts.intra_instrument);
    }

    #[test]
    fn test_zero_instruments_is_a_no_op() {
        let mut opts = ResultsOptions::default();
        assert!(!opts.sync_instrument_count(0));
        assert_eq!(opts, ResultsOptions::default());
    }

    #[test]
    fn test_json_shape() {
        let mut opts = ResultsOptions::default();
        opts.sync_instrument_count(1);
        let v = serde_json::to_value(&opts).unwrap();
        assert_eq!(v["threshold"], serde_json::json!([70, 100]));
        assert_eq!(v["intraInstrument"], true);
        assert_eq!(v["intraInstrumentPreviousState"], false);
        assert_eq!(v["searchTerm"], "");

        let parsed: ResultsOptions =
            serde_json::from_str(r#"{"threshold":[50,90],"searchTerm":"sleep"}"#).unwrap();
        assert_eq!(parsed.threshold, Threshold::new(50, 90).unwrap());
        assert_eq!(parsed.search_term, "sleep");
        assert!(!parsed.intra_instrument);
    }

    #[test]
    fn test_json_rejects_inverted_threshold() {
        let parsed = serde_json::from_str::<ResultsOptions>(r#"{"threshold":[90,50]}"#);
        assert!(parsed.is_err());
    }
}
