//! Data-driven balance for the three brewing games
//!
//! Defaults are the shipped balance. Everything here serializes, so a build
//! can override balance from a JSON blob without recompiling.

use serde::{Deserialize, Serialize};

/// Bean-sort balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortTuning {
    // === Physics (per nominal 60 Hz frame) ===
    /// Velocity retained by a loose bean each frame
    pub damping: f32,
    /// Speed kept when bouncing off a tray wall
    pub restitution: f32,
    /// Horizontal velocity gained per pixel of sweep
    pub sweep_impulse: f32,
    /// Random vertical kick per pixel of sweep
    pub sweep_jitter: f32,
    /// Speed a pardoned good bean is pushed back toward the tray center
    pub return_speed: f32,
    /// Opacity lost per frame once a bean is removed
    pub fade_step: f32,

    // === Exits ===
    /// Distance past the tray rim at which a flying bean counts as discarded
    pub exit_margin: f32,
    /// Rim margin when a held bean is dragged out by hand
    pub drag_exit_margin: f32,

    // === Scoring ===
    /// Points per defect discarded
    pub correct_points: u32,
    /// Points lost per good bean discarded
    pub wrong_penalty: u32,
    /// Bonus for removing every defect with no mistakes
    pub clean_bonus: u32,
    pub max_score: u32,
}

impl Default for SortTuning {
    fn default() -> Self {
        Self {
            damping: 0.95,
            restitution: 0.6,
            sweep_impulse: 0.12,
            sweep_jitter: 0.03,
            return_speed: 4.0,
            fade_step: 0.05,

            exit_margin: 40.0,
            drag_exit_margin: 10.0,

            correct_points: 5,
            wrong_penalty: 3,
            clean_bonus: 5,
            max_score: 25,
        }
    }
}

/// Grind balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrindTuning {
    /// Total grind length in ms
    pub duration_ms: f32,
    /// Crank speed recording cadence
    pub sample_interval_ms: f32,
    /// Pace hint cadence
    pub hint_interval_ms: f32,

    // === Crank speed bands (revolutions per second) ===
    /// Scored band, inclusive on both ends
    pub target_min_rps: f32,
    pub target_max_rps: f32,
    /// Hint thresholds, looser than the scored band
    pub slow_hint_rps: f32,
    pub fast_hint_rps: f32,

    /// Weight of the newest crank reading in the smoothed velocity
    pub smoothing: f32,
    pub max_score: u32,
}

impl Default for GrindTuning {
    fn default() -> Self {
        Self {
            duration_ms: 12000.0,
            sample_interval_ms: 100.0,
            hint_interval_ms: 600.0,

            target_min_rps: 1.0,
            target_max_rps: 1.8,
            slow_hint_rps: 0.8,
            fast_hint_rps: 2.2,

            smoothing: 0.3,
            max_score: 30,
        }
    }
}

/// Pour balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PourTuning {
    // === Phase durations (ms) ===
    pub first_pour_ms: f32,
    pub steaming_ms: f32,
    pub second_pour_ms: f32,
    pub settling_ms: f32,

    // === Flow model ===
    /// Distance from the dripper center at which the stream misses entirely
    pub flow_falloff: f32,
    /// Distance counted as pouring in-center
    pub target_radius: f32,
    /// Tilt that reaches full flow, given perfect aim
    pub full_tilt_deg: f32,
    /// Furthest forward the kettle tips
    pub max_tilt_deg: f32,
    /// An open spout never drops below this flow
    pub min_flow: f32,

    // === Accumulation per sample ===
    /// Bloom gained per sample, times flow
    pub bloom_rate: f32,
    /// Cup level gained per sample, times flow
    pub liquid_rate: f32,

    // === Hints ===
    /// Flow below this reads as a trickle
    pub weak_flow: f32,
    /// Flow above this reads as a torrent
    pub strong_flow: f32,
    /// Bloom level that counts as fully developed
    pub rich_bloom: f32,

    // === Scoring ===
    /// Penalty slope on flow variance
    pub variance_gain: f32,
    pub flow_weight: f32,
    pub center_weight: f32,
    pub steam_weight: f32,
}

impl Default for PourTuning {
    fn default() -> Self {
        Self {
            first_pour_ms: 5000.0,
            steaming_ms: 3000.0,
            second_pour_ms: 11000.0,
            settling_ms: 500.0,

            flow_falloff: 100.0,
            target_radius: 50.0,
            full_tilt_deg: 12.0,
            max_tilt_deg: 45.0,
            min_flow: 0.1,

            bloom_rate: 0.015,
            liquid_rate: 0.008,

            weak_flow: 0.2,
            strong_flow: 0.7,
            rich_bloom: 0.6,

            variance_gain: 3.0,
            flow_weight: 40.0,
            center_weight: 30.0,
            steam_weight: 30.0,
        }
    }
}

/// Full balance set, one block per game
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub sort: SortTuning,
    pub grind: GrindTuning,
    pub pour: PourTuning,
}

impl Tuning {
    /// Parse a tuning override blob, falling back to defaults on any error
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(tuning) => {
                log::info!("Loaded tuning overrides");
                tuning
            }
            Err(e) => {
                log::warn!("Tuning parse failed ({e}), using defaults");
                Self::default()
            }
        }
    }

    /// Serialize for export or storage
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_trip() {
        let mut tuning = Tuning::default();
        tuning.grind.target_max_rps = 2.0;
        let restored = Tuning::from_json(&tuning.to_json());
        assert_eq!(restored.grind.target_max_rps, 2.0);
        assert_eq!(restored.sort.max_score, 25);
    }

    #[test]
    fn test_bad_json_falls_back_to_defaults() {
        let tuning = Tuning::from_json("not json");
        assert_eq!(tuning.grind.max_score, 30);
        assert_eq!(tuning.pour.first_pour_ms, 5000.0);
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let tuning = Tuning::from_json(r#"{"grind": {"duration_ms": 6000.0,
            "sample_interval_ms": 100.0, "hint_interval_ms": 600.0,
            "target_min_rps": 1.0, "target_max_rps": 1.8,
            "slow_hint_rps": 0.8, "fast_hint_rps": 2.2,
            "smoothing": 0.3, "max_score": 30}}"#);
        assert_eq!(tuning.grind.duration_ms, 6000.0);
        assert_eq!(tuning.sort.damping, 0.95);
    }
}
