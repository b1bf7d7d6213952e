//! Crank grinding: hold a steady cadence for the whole run
//!
//! The crank follows the pointer around a fixed pivot; its smoothed angular
//! speed is sampled on a fixed cadence for the length of the run. Score is
//! the fraction of samples inside the target band. Spinning in either
//! direction counts - only the speed matters.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{GRIND_HANDLE_LENGTH, GRIND_PIVOT, POINTER_FRAME_MS};
use crate::normalize_angle;
use crate::sim::sampler::{RateSample, SampleClock};
use crate::tuning::GrindTuning;

/// Where the grind stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrindPhase {
    Idle,
    Grinding,
    Finished,
}

/// Cadence coaching while grinding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaceHint {
    TooSlow,
    TooFast,
    Steady,
}

/// Feedback drained by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrindEvent {
    Hint(PaceHint),
    Finished { score: u32 },
}

/// Render-ready view of the grinder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrindSnapshot {
    pub phase: GrindPhase,
    /// Unbounded crank angle in radians
    pub handle_angle: f32,
    pub handle_tip: Vec2,
    /// Ground-powder fill, 0-1
    pub fill_level: f32,
    /// Run progress, 0-1
    pub progress: f32,
    /// Current smoothed crank speed in revolutions per second
    pub rps: f32,
    pub elapsed_ms: f32,
}

/// The crank-grind game
#[derive(Debug, Clone)]
pub struct GrindSim {
    phase: GrindPhase,
    handle_angle: f32,
    last_pointer_angle: f32,
    dragging: bool,
    /// Smoothed crank speed, rad/s; hard-zeroed on release
    angular_vel: f32,
    elapsed_ms: f32,
    samples: Vec<RateSample>,
    sample_clock: SampleClock,
    hint_clock: SampleClock,
    tuning: GrindTuning,
    score: Option<u32>,
    events: Vec<GrindEvent>,
}

impl GrindSim {
    pub fn new() -> Self {
        Self::with_tuning(GrindTuning::default())
    }

    pub fn with_tuning(tuning: GrindTuning) -> Self {
        Self {
            phase: GrindPhase::Idle,
            handle_angle: -FRAC_PI_2,
            last_pointer_angle: 0.0,
            dragging: false,
            angular_vel: 0.0,
            elapsed_ms: 0.0,
            samples: Vec::new(),
            sample_clock: SampleClock::new(tuning.sample_interval_ms),
            hint_clock: SampleClock::new(tuning.hint_interval_ms),
            tuning,
            score: None,
            events: Vec::new(),
        }
    }

    /// Pointer angle about the crank pivot
    fn pointer_angle(p: Vec2) -> f32 {
        (p - GRIND_PIVOT).to_angle()
    }

    /// Press: take hold of the crank; the first press starts the run
    pub fn pointer_down(&mut self, p: Vec2) {
        self.last_pointer_angle = Self::pointer_angle(p);
        self.dragging = true;
        if self.phase == GrindPhase::Idle {
            self.phase = GrindPhase::Grinding;
            log::debug!("grind started");
        }
    }

    /// Drag: turn the crank, feeding the smoothed angular speed
    pub fn pointer_move(&mut self, p: Vec2) {
        if !self.dragging || self.phase != GrindPhase::Grinding {
            return;
        }
        let angle = Self::pointer_angle(p);
        let delta = normalize_angle(angle - self.last_pointer_angle);
        self.handle_angle += delta;
        self.last_pointer_angle = angle;

        let instantaneous = delta / POINTER_FRAME_MS * 1000.0;
        let s = self.tuning.smoothing;
        self.angular_vel = self.angular_vel * (1.0 - s) + instantaneous * s;
    }

    /// Release: the crank stops dead
    pub fn pointer_up(&mut self) {
        self.dragging = false;
        self.angular_vel = 0.0;
    }

    /// Advance the run clock, recording cadence samples and pace hints
    pub fn tick(&mut self, dt_ms: f32) {
        if self.phase != GrindPhase::Grinding {
            return;
        }
        self.elapsed_ms += dt_ms;

        // Time up: score before taking any sample this tick
        if self.elapsed_ms >= self.tuning.duration_ms {
            self.finish();
            return;
        }

        if self.sample_clock.try_fire(self.elapsed_ms) {
            let rps = self.angular_vel.abs() / TAU;
            let in_target = rps >= self.tuning.target_min_rps && rps <= self.tuning.target_max_rps;
            self.samples.push(RateSample {
                at_ms: self.elapsed_ms,
                rate: rps,
                in_target,
            });

            if self.hint_clock.try_fire(self.elapsed_ms) {
                let hint = if rps < self.tuning.slow_hint_rps {
                    PaceHint::TooSlow
                } else if rps > self.tuning.fast_hint_rps {
                    PaceHint::TooFast
                } else {
                    PaceHint::Steady
                };
                self.events.push(GrindEvent::Hint(hint));
            }
        }
    }

    fn finish(&mut self) {
        let total = self.samples.len();
        let ideal = self.samples.iter().filter(|s| s.in_target).count();
        let score = if total == 0 {
            0
        } else {
            let ratio = ideal as f32 / total as f32;
            ((ratio * self.tuning.max_score as f32).floor() as u32).min(self.tuning.max_score)
        };
        self.phase = GrindPhase::Finished;
        self.score = Some(score);
        self.events.push(GrindEvent::Finished { score });
        log::info!("grind finished: {ideal}/{total} samples in band, score {score}");
    }

    /// Drain feedback accumulated since the last call
    pub fn take_events(&mut self) -> Vec<GrindEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn phase(&self) -> GrindPhase {
        self.phase
    }

    pub fn score(&self) -> Option<u32> {
        self.score
    }

    pub fn snapshot(&self) -> GrindSnapshot {
        let progress = (self.elapsed_ms / self.tuning.duration_ms).clamp(0.0, 1.0);
        GrindSnapshot {
            phase: self.phase,
            handle_angle: self.handle_angle,
            handle_tip: GRIND_PIVOT + Vec2::from_angle(self.handle_angle) * GRIND_HANDLE_LENGTH,
            fill_level: progress,
            progress,
            rps: self.angular_vel.abs() / TAU,
            elapsed_ms: self.elapsed_ms,
        }
    }
}

impl Default for GrindSim {
    fn default() -> Self {
        Self::new()
    }
}
