//! Two-stage pour-over: wake the grounds, let them steam, then extract
//!
//! The kettle follows the pointer; horizontal drag tips it forward and flow
//! comes from tilt times aim. The run is a fixed phase chain - first pour,
//! steaming rest, second pour, settling - driven entirely by the tick clock.
//! Releasing the pointer never closes the spout; the phase does.
//!
//! Scoring blends flow steadiness (variance), aim (fraction of samples on
//! center), and how fully the bloom developed before steaming.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{
    BREW_TARGET, KETTLE_GRAB_RADIUS, KETTLE_MAX, KETTLE_MIN, KETTLE_START, SPOUT_OFFSET,
};
use crate::sim::sampler::SampleClock;
use crate::tuning::PourTuning;

/// Where the brew stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PourPhase {
    Idle,
    FirstPour,
    Steaming,
    SecondPour,
    Settling,
    Complete,
}

/// One recorded reading of the pour stream
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PourSample {
    pub at_ms: f32,
    /// Stream strength, 0-1
    pub flow: f32,
    /// Spout aimed inside the target radius
    pub in_target: bool,
    pub tilt_deg: f32,
}

/// Pouring coachmarks, plus the bloom verdict when steaming starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PourHint {
    TiltMore,
    AimCenter,
    TooStrong,
    Steady,
    RichBloom,
    ThinBloom,
}

/// Feedback drained by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PourEvent {
    Hint(PourHint),
    Finished { score: u32 },
}

/// Render-ready view of the brew station
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PourSnapshot {
    pub phase: PourPhase,
    pub kettle_pos: Vec2,
    pub tilt_deg: f32,
    /// Spout open; set by the phase, never by input
    pub pouring: bool,
    pub spout: Vec2,
    pub flow: f32,
    pub in_target: bool,
    pub bloom: f32,
    pub liquid: f32,
    pub steam_intensity: f32,
    /// Progress through the current phase, 0-1
    pub phase_progress: f32,
}

/// The pour-over game
#[derive(Debug, Clone)]
pub struct PourSim {
    phase: PourPhase,
    kettle_pos: Vec2,
    /// Forward tip in degrees; 0 upright, negative toward the dripper
    tilt_deg: f32,
    pouring: bool,
    dragging: bool,
    last_pointer: Vec2,
    /// Run clock since the first press
    elapsed_ms: f32,
    phase_elapsed_ms: f32,
    samples: Vec<PourSample>,
    /// Single synthetic sample frozen when steaming starts
    steam_sample: Option<PourSample>,
    bloom: f32,
    liquid: f32,
    steam_intensity: f32,
    sample_clock: SampleClock,
    last_hint: Option<PourHint>,
    tuning: PourTuning,
    score: Option<u32>,
    events: Vec<PourEvent>,
}

impl PourSim {
    pub fn new() -> Self {
        Self::with_tuning(PourTuning::default())
    }

    pub fn with_tuning(tuning: PourTuning) -> Self {
        Self {
            phase: PourPhase::Idle,
            kettle_pos: KETTLE_START,
            tilt_deg: 0.0,
            pouring: false,
            dragging: false,
            last_pointer: Vec2::ZERO,
            elapsed_ms: 0.0,
            phase_elapsed_ms: 0.0,
            samples: Vec::new(),
            steam_sample: None,
            bloom: 0.0,
            liquid: 0.0,
            steam_intensity: 0.0,
            // Interval 0: record on every tick while the spout is open
            sample_clock: SampleClock::new(0.0),
            last_hint: None,
            tuning,
            score: None,
            events: Vec::new(),
        }
    }

    /// Spout tip for the current kettle pose
    fn spout(&self) -> Vec2 {
        self.kettle_pos + Vec2::from_angle(self.tilt_deg.to_radians()).rotate(SPOUT_OFFSET)
    }

    /// Stream strength and aim for the current pose; strength is zero while
    /// the spout is closed, and never below the floor while open
    fn flow(&self) -> (f32, bool) {
        let dist = self.spout().distance(BREW_TARGET);
        let in_target = dist < self.tuning.target_radius;
        if !self.pouring {
            return (0.0, in_target);
        }
        let dist_score = (1.0 - dist / self.tuning.flow_falloff).max(0.0);
        let tilt_score = (self.tilt_deg.abs() / self.tuning.full_tilt_deg).min(1.0);
        ((dist_score * tilt_score).max(self.tuning.min_flow), in_target)
    }

    /// Press: any press starts from rest; afterwards only a press near the
    /// kettle takes hold of it. Dead while steaming, settling, and done
    pub fn pointer_down(&mut self, p: Vec2) {
        match self.phase {
            PourPhase::Idle => {
                self.dragging = true;
                self.last_pointer = p;
                self.start_first_pour();
            }
            PourPhase::FirstPour | PourPhase::SecondPour => {
                if p.distance(self.kettle_pos) < KETTLE_GRAB_RADIUS {
                    self.dragging = true;
                    self.last_pointer = p;
                }
            }
            _ => {}
        }
    }

    /// Drag: horizontal motion tips the kettle, the kettle rides the pointer
    pub fn pointer_move(&mut self, p: Vec2) {
        if !self.dragging {
            return;
        }
        let dx = p.x - self.last_pointer.x;
        self.tilt_deg = (self.tilt_deg + dx).clamp(-self.tuning.max_tilt_deg, 0.0);
        self.kettle_pos = p.clamp(KETTLE_MIN, KETTLE_MAX);
        self.last_pointer = p;
    }

    /// Release lets go of the kettle but never stops the pour
    pub fn pointer_up(&mut self) {
        self.dragging = false;
    }

    fn start_first_pour(&mut self) {
        self.phase = PourPhase::FirstPour;
        self.phase_elapsed_ms = 0.0;
        self.pouring = true;
        self.samples.clear();
        self.bloom = 0.0;
        log::debug!("pour started");
    }

    fn start_steaming(&mut self) {
        self.phase = PourPhase::Steaming;
        self.phase_elapsed_ms = 0.0;
        self.pouring = false;
        self.steam_intensity = self.bloom;
        self.steam_sample = Some(PourSample {
            at_ms: self.elapsed_ms,
            flow: self.bloom,
            in_target: true,
            tilt_deg: 0.0,
        });
        let verdict = if self.bloom > self.tuning.rich_bloom {
            PourHint::RichBloom
        } else {
            PourHint::ThinBloom
        };
        self.push_hint(verdict);
        log::debug!("steaming, bloom {:.2}", self.bloom);
    }

    fn start_second_pour(&mut self) {
        self.phase = PourPhase::SecondPour;
        self.phase_elapsed_ms = 0.0;
        self.pouring = true;
        log::debug!("second pour");
    }

    /// Advance the phase chain; a tick that hands off between phases records
    /// nothing, and leftover time past the boundary is discarded
    pub fn tick(&mut self, dt_ms: f32) {
        if matches!(self.phase, PourPhase::Idle | PourPhase::Complete) {
            return;
        }
        self.elapsed_ms += dt_ms;
        self.phase_elapsed_ms += dt_ms;

        match self.phase {
            PourPhase::FirstPour if self.phase_elapsed_ms >= self.tuning.first_pour_ms => {
                self.start_steaming();
                return;
            }
            PourPhase::Steaming => {
                let progress = (self.phase_elapsed_ms / self.tuning.steaming_ms).min(1.0);
                self.steam_intensity = self.bloom * (1.0 - progress * 0.3);
                if self.phase_elapsed_ms >= self.tuning.steaming_ms {
                    self.start_second_pour();
                    return;
                }
            }
            PourPhase::SecondPour if self.phase_elapsed_ms >= self.tuning.second_pour_ms => {
                self.phase = PourPhase::Settling;
                self.phase_elapsed_ms = 0.0;
                self.pouring = false;
                return;
            }
            PourPhase::Settling if self.phase_elapsed_ms >= self.tuning.settling_ms => {
                self.finish();
                return;
            }
            _ => {}
        }

        let (flow, in_target) = self.flow();

        if self.pouring && self.sample_clock.try_fire(self.elapsed_ms) {
            self.samples.push(PourSample {
                at_ms: self.elapsed_ms,
                flow,
                in_target,
                tilt_deg: self.tilt_deg,
            });
            match self.phase {
                PourPhase::FirstPour => {
                    self.bloom = (self.bloom + flow * self.tuning.bloom_rate).min(1.0);
                }
                PourPhase::SecondPour => {
                    self.liquid = (self.liquid + flow * self.tuning.liquid_rate).min(1.0);
                }
                _ => {}
            }
        }

        if matches!(self.phase, PourPhase::FirstPour | PourPhase::SecondPour) {
            let hint = if flow < self.tuning.weak_flow {
                PourHint::TiltMore
            } else if !in_target {
                PourHint::AimCenter
            } else if flow > self.tuning.strong_flow {
                PourHint::TooStrong
            } else {
                PourHint::Steady
            };
            self.push_hint(hint);
        }
    }

    /// Hints only fire when the advice changes
    fn push_hint(&mut self, hint: PourHint) {
        if self.last_hint != Some(hint) {
            self.last_hint = Some(hint);
            self.events.push(PourEvent::Hint(hint));
        }
    }

    fn finish(&mut self) {
        let score = self.compute_score();
        self.phase = PourPhase::Complete;
        self.score = Some(score);
        self.events.push(PourEvent::Finished { score });
        log::info!("pour complete: {} samples, score {}", self.samples.len(), score);
    }

    /// Flow steadiness + aim + bloom, rounded and clamped
    fn compute_score(&self) -> u32 {
        let t = &self.tuning;
        let all: Vec<&PourSample> = self.samples.iter().chain(self.steam_sample.iter()).collect();
        if all.is_empty() {
            return 0;
        }
        let n = all.len() as f32;
        let mean = all.iter().map(|s| s.flow).sum::<f32>() / n;
        let variance = all.iter().map(|s| (s.flow - mean).powi(2)).sum::<f32>() / n;
        let flow_score = (1.0 - variance * t.variance_gain).max(0.0) * t.flow_weight;

        let hits = all.iter().filter(|s| s.in_target).count() as f32;
        let center_score = hits / n * t.center_weight;

        let steam_score = self
            .steam_sample
            .map(|s| (s.flow * t.steam_weight).min(t.steam_weight))
            .unwrap_or(0.0);

        (flow_score + center_score + steam_score)
            .round()
            .clamp(0.0, 100.0) as u32
    }

    /// Drain feedback accumulated since the last call
    pub fn take_events(&mut self) -> Vec<PourEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn phase(&self) -> PourPhase {
        self.phase
    }

    pub fn score(&self) -> Option<u32> {
        self.score
    }

    fn phase_duration(&self) -> f32 {
        match self.phase {
            PourPhase::Idle | PourPhase::Complete => 0.0,
            PourPhase::FirstPour => self.tuning.first_pour_ms,
            PourPhase::Steaming => self.tuning.steaming_ms,
            PourPhase::SecondPour => self.tuning.second_pour_ms,
            PourPhase::Settling => self.tuning.settling_ms,
        }
    }

    pub fn snapshot(&self) -> PourSnapshot {
        let (flow, in_target) = self.flow();
        let duration = self.phase_duration();
        let phase_progress = if duration > 0.0 {
            (self.phase_elapsed_ms / duration).min(1.0)
        } else if self.phase == PourPhase::Complete {
            1.0
        } else {
            0.0
        };
        PourSnapshot {
            phase: self.phase,
            kettle_pos: self.kettle_pos,
            tilt_deg: self.tilt_deg,
            pouring: self.pouring,
            spout: self.spout(),
            flow,
            in_target,
            bloom: self.bloom,
            liquid: self.liquid,
            steam_intensity: self.steam_intensity,
            phase_progress,
        }
    }
}

impl Default for PourSim {
    fn default() -> Self {
        Self::new()
    }
}
