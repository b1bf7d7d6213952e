//! Bean sorting: pick the defects out of a freshly dealt tray
//!
//! A batch hides a few defect beans among the good ones. Beans leave the tray
//! by dragging them over the rim or by sweeping hard enough that they fly out.
//! A good bean gets one warning - it bounces back toward the tray center - and
//! is only lost if discarded again. Scoring pays per defect removed, charges
//! per good bean lost, and adds a bonus for a flawless clear.

use glam::Vec2;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::{
    BEAN_PICK_RADIUS, BEAN_RADIUS, GOOD_BEAN_COUNT, NOMINAL_FRAME_MS, TRAY_H, TRAY_MARGIN, TRAY_W,
};
use crate::tuning::SortTuning;

/// Defects dealt into every batch, alongside the good beans
const DEFECT_MIX: [BeanKind; 4] = [
    BeanKind::Green,
    BeanKind::Green,
    BeanKind::Worm,
    BeanKind::Broken,
];

/// What a bean turns out to be when inspected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeanKind {
    Good,
    /// Unripe, off-color
    Green,
    /// Cracked during hulling
    Broken,
    /// Insect-damaged
    Worm,
}

impl BeanKind {
    /// Anything that should leave the tray
    pub fn is_defect(&self) -> bool {
        !matches!(self, BeanKind::Good)
    }
}

/// A single bean on the tray
#[derive(Debug, Clone)]
pub struct Bean {
    pub id: u32,
    pub kind: BeanKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub rotation_deg: f32,
    /// Fades out once removed
    pub opacity: f32,
    /// A good bean already pardoned once
    pub bounced_once: bool,
    pub removed: bool,
}

/// What the pointer currently holds
#[derive(Debug, Clone, Copy, PartialEq)]
enum Grip {
    Idle,
    /// Dragging one bean, grabbed at `offset` from its center
    Bean { id: u32, offset: Vec2 },
    /// Sweeping across open tray
    Sweep { last_x: f32 },
}

/// Feedback produced while sorting, drained by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortEvent {
    /// A defect left the tray
    DefectPicked { kind: BeanKind },
    /// A good bean got its warning bounce
    GoodReturned,
    /// A good bean was discarded for the second time
    GoodDiscarded,
    /// The round was scored
    Finished { score: u32 },
}

/// Render-ready view of one bean
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeanView {
    pub id: u32,
    pub kind: BeanKind,
    pub pos: Vec2,
    pub rotation_deg: f32,
    pub opacity: f32,
    pub held: bool,
}

/// Render-ready view of the whole tray
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortSnapshot {
    pub beans: Vec<BeanView>,
    pub removed: u32,
    pub remaining: u32,
    pub finished: bool,
    pub score: Option<u32>,
}

/// The bean-sort game
#[derive(Debug, Clone)]
pub struct SortSim {
    beans: Vec<Bean>,
    grip: Grip,
    rng: Pcg32,
    tuning: SortTuning,
    /// Defects removed so far
    correct: u32,
    /// Good beans lost so far
    wrong: u32,
    defect_total: u32,
    /// Set once by `finalize`
    score: Option<u32>,
    events: Vec<SortEvent>,
    next_id: u32,
}

impl SortSim {
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, SortTuning::default())
    }

    pub fn with_tuning(seed: u64, tuning: SortTuning) -> Self {
        let mut sim = Self {
            beans: Vec::new(),
            grip: Grip::Idle,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            correct: 0,
            wrong: 0,
            defect_total: DEFECT_MIX.len() as u32,
            score: None,
            events: Vec::new(),
            next_id: 0,
        };
        sim.spawn_batch();
        sim
    }

    /// Deal a fresh batch: the defect mix plus the good beans, shuffled and
    /// scattered inside the tray margin
    fn spawn_batch(&mut self) {
        self.beans.clear();
        let mut kinds: Vec<BeanKind> = DEFECT_MIX.to_vec();
        kinds.extend(std::iter::repeat_n(BeanKind::Good, GOOD_BEAN_COUNT));
        kinds.shuffle(&mut self.rng);

        for kind in kinds {
            let id = self.next_id;
            self.next_id += 1;
            let pos = Vec2::new(
                self.rng.random_range(TRAY_MARGIN..TRAY_W - TRAY_MARGIN),
                self.rng.random_range(TRAY_MARGIN..TRAY_H - TRAY_MARGIN),
            );
            self.beans.push(Bean {
                id,
                kind,
                pos,
                vel: Vec2::ZERO,
                rotation_deg: self.rng.random_range(0.0..360.0),
                opacity: 1.0,
                bounced_once: false,
                removed: false,
            });
        }
    }

    /// Topmost live bean under the pointer, if any
    fn bean_at(&self, p: Vec2) -> Option<u32> {
        self.beans
            .iter()
            .rev()
            .find(|b| !b.removed && b.opacity > 0.01 && b.pos.distance(p) < BEAN_PICK_RADIUS)
            .map(|b| b.id)
    }

    /// Press: grab the bean under the pointer, or start a sweep on open tray
    pub fn pointer_down(&mut self, p: Vec2) {
        if self.score.is_some() {
            return;
        }
        match self.bean_at(p) {
            Some(id) => {
                if let Some(bean) = self.beans.iter_mut().find(|b| b.id == id) {
                    bean.vel = Vec2::ZERO;
                    self.grip = Grip::Bean {
                        id,
                        offset: bean.pos - p,
                    };
                }
            }
            None => self.grip = Grip::Sweep { last_x: p.x },
        }
    }

    /// Move: carry the held bean (discarding it past the rim), or push loose
    /// beans around with the sweep
    pub fn pointer_move(&mut self, p: Vec2) {
        if self.score.is_some() {
            return;
        }
        match self.grip {
            Grip::Idle => {}
            Grip::Bean { id, offset } => {
                let Some(idx) = self.beans.iter().position(|b| b.id == id) else {
                    self.grip = Grip::Idle;
                    return;
                };
                let out = {
                    let bean = &mut self.beans[idx];
                    bean.pos = p + offset;
                    bean.rotation_deg += 2.0;
                    let m = self.tuning.drag_exit_margin;
                    bean.pos.x < -m
                        || bean.pos.x > TRAY_W + m
                        || bean.pos.y < -m
                        || bean.pos.y > TRAY_H + m
                };
                if out {
                    self.discard(idx);
                    self.grip = Grip::Idle;
                }
            }
            Grip::Sweep { last_x } => {
                let dx = p.x - last_x;
                self.grip = Grip::Sweep { last_x: p.x };
                if dx.abs() > 1.0 {
                    let impulse = dx * self.tuning.sweep_impulse;
                    let jitter = dx.abs() * self.tuning.sweep_jitter;
                    for bean in self.beans.iter_mut().filter(|b| !b.removed) {
                        bean.vel.x += impulse;
                        bean.vel.y += (self.rng.random::<f32>() - 0.5) * jitter;
                    }
                }
            }
        }
    }

    /// Release whatever the pointer held; a released bean simply stays put
    pub fn pointer_up(&mut self) {
        self.grip = Grip::Idle;
    }

    /// Advance loose-bean physics; displacement scales with `dt_ms`, decay and
    /// fade apply once per tick
    pub fn tick(&mut self, dt_ms: f32) {
        let step = dt_ms / NOMINAL_FRAME_MS;
        let held = match self.grip {
            Grip::Bean { id, .. } => Some(id),
            _ => None,
        };
        let damping = self.tuning.damping;
        let restitution = self.tuning.restitution;
        let exit = self.tuning.exit_margin;
        let fade = self.tuning.fade_step;

        for i in 0..self.beans.len() {
            if Some(self.beans[i].id) == held {
                continue;
            }
            if self.beans[i].removed {
                let bean = &mut self.beans[i];
                bean.opacity = (bean.opacity - fade).max(0.0);
                continue;
            }

            let out = {
                let bean = &mut self.beans[i];
                bean.vel *= damping;
                bean.pos += bean.vel * step;
                bean.rotation_deg += (bean.vel.x + bean.vel.y) * 2.0 * step;
                bean.pos.x < -exit
                    || bean.pos.x > TRAY_W + exit
                    || bean.pos.y < -exit
                    || bean.pos.y > TRAY_H + exit
            };
            // Checked before the walls, so a hard sweep can fling a bean clear out
            if out {
                self.discard(i);
                continue;
            }

            // Walls keep everything else on the tray
            let bean = &mut self.beans[i];
            if bean.pos.x < BEAN_RADIUS {
                bean.pos.x = BEAN_RADIUS;
                bean.vel.x *= -restitution;
            } else if bean.pos.x > TRAY_W - BEAN_RADIUS {
                bean.pos.x = TRAY_W - BEAN_RADIUS;
                bean.vel.x *= -restitution;
            }
            if bean.pos.y < BEAN_RADIUS {
                bean.pos.y = BEAN_RADIUS;
                bean.vel.y *= -restitution;
            } else if bean.pos.y > TRAY_H - BEAN_RADIUS {
                bean.pos.y = TRAY_H - BEAN_RADIUS;
                bean.vel.y *= -restitution;
            }
        }

        // Compact fully faded beans; the tallies already hold their outcome
        self.beans.retain(|b| !b.removed || b.opacity > 0.0);
    }

    /// One bean crossed the rim: judge it
    fn discard(&mut self, idx: usize) {
        let bean = &mut self.beans[idx];
        if bean.kind.is_defect() {
            bean.removed = true;
            self.correct += 1;
            self.events.push(SortEvent::DefectPicked { kind: bean.kind });
        } else if bean.bounced_once {
            bean.removed = true;
            self.wrong += 1;
            self.events.push(SortEvent::GoodDiscarded);
        } else {
            // First offense: bounce it back toward the middle of the tray
            bean.bounced_once = true;
            let center = Vec2::new(TRAY_W / 2.0, TRAY_H / 2.0);
            bean.vel = (center - bean.pos).normalize_or_zero() * self.tuning.return_speed;
            bean.pos.x = bean.pos.x.clamp(TRAY_MARGIN, TRAY_W - TRAY_MARGIN);
            bean.pos.y = bean.pos.y.clamp(TRAY_MARGIN, TRAY_H - TRAY_MARGIN);
            self.events.push(SortEvent::GoodReturned);
        }
    }

    /// Score the round. Idempotent; pointer input is dead afterwards but
    /// removed beans keep fading
    pub fn finalize(&mut self) -> u32 {
        if let Some(score) = self.score {
            return score;
        }
        let t = &self.tuning;
        let mut total = self.correct as i32 * t.correct_points as i32
            - self.wrong as i32 * t.wrong_penalty as i32;
        if self.correct == self.defect_total && self.wrong == 0 {
            total += t.clean_bonus as i32;
        }
        let score = total.clamp(0, t.max_score as i32) as u32;
        self.score = Some(score);
        self.grip = Grip::Idle;
        self.events.push(SortEvent::Finished { score });
        log::info!(
            "bean sort finished: {} correct, {} wrong, score {}",
            self.correct,
            self.wrong,
            score
        );
        score
    }

    /// Deal a new batch; does nothing once the round is scored
    pub fn reset(&mut self) {
        if self.score.is_some() {
            return;
        }
        self.correct = 0;
        self.wrong = 0;
        self.grip = Grip::Idle;
        self.events.clear();
        self.spawn_batch();
    }

    /// Drain feedback accumulated since the last call
    pub fn take_events(&mut self) -> Vec<SortEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn finished(&self) -> bool {
        self.score.is_some()
    }

    pub fn score(&self) -> Option<u32> {
        self.score
    }

    pub fn snapshot(&self) -> SortSnapshot {
        let held = match self.grip {
            Grip::Bean { id, .. } => Some(id),
            _ => None,
        };
        SortSnapshot {
            beans: self
                .beans
                .iter()
                .map(|b| BeanView {
                    id: b.id,
                    kind: b.kind,
                    pos: b.pos,
                    rotation_deg: b.rotation_deg,
                    opacity: b.opacity,
                    held: Some(b.id) == held,
                })
                .collect(),
            removed: self.correct + self.wrong,
            remaining: self.beans.iter().filter(|b| !b.removed).count() as u32,
            finished: self.score.is_some(),
            score: self.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Park a bean far outside the tray, grab it there, and tug it further out
    fn drag_out(sim: &mut SortSim, idx: usize) {
        let spot = Vec2::new(500.0, 120.0);
        sim.beans[idx].pos = spot;
        sim.pointer_down(spot);
        sim.pointer_move(Vec2::new(520.0, 120.0));
    }

    fn defect_index(sim: &SortSim) -> usize {
        sim.beans
            .iter()
            .position(|b| b.kind.is_defect() && !b.removed)
            .unwrap()
    }

    fn good_index(sim: &SortSim) -> usize {
        sim.beans
            .iter()
            .position(|b| b.kind == BeanKind::Good && !b.removed)
            .unwrap()
    }

    #[test]
    fn test_batch_composition() {
        for seed in [0, 1, 7, 99, 12345] {
            let sim = SortSim::new(seed);
            assert_eq!(sim.beans.len(), GOOD_BEAN_COUNT + DEFECT_MIX.len());
            let count = |k: BeanKind| sim.beans.iter().filter(|b| b.kind == k).count();
            assert_eq!(count(BeanKind::Good), 20);
            assert_eq!(count(BeanKind::Green), 2);
            assert_eq!(count(BeanKind::Broken), 1);
            assert_eq!(count(BeanKind::Worm), 1);
            // Everything dealt inside the margin
            for bean in &sim.beans {
                assert!(bean.pos.x >= TRAY_MARGIN && bean.pos.x <= TRAY_W - TRAY_MARGIN);
                assert!(bean.pos.y >= TRAY_MARGIN && bean.pos.y <= TRAY_H - TRAY_MARGIN);
            }
        }
    }

    #[test]
    fn test_same_seed_same_layout() {
        let a = SortSim::new(42);
        let b = SortSim::new(42);
        for (x, y) in a.beans.iter().zip(b.beans.iter()) {
            assert_eq!(x.kind, y.kind);
            assert_eq!(x.pos, y.pos);
            assert_eq!(x.rotation_deg, y.rotation_deg);
        }
    }

    #[test]
    fn test_different_seed_different_layout() {
        let a = SortSim::new(1);
        let b = SortSim::new(2);
        assert!(a.beans.iter().zip(b.beans.iter()).any(|(x, y)| x.pos != y.pos));
    }

    #[test]
    fn test_drag_defect_out_counts_correct() {
        let mut sim = SortSim::new(3);
        let idx = defect_index(&sim);
        let kind = sim.beans[idx].kind;
        drag_out(&mut sim, idx);

        assert!(sim.beans[idx].removed);
        assert_eq!(sim.correct, 1);
        assert_eq!(sim.wrong, 0);
        assert_eq!(sim.grip, Grip::Idle);
        assert_eq!(sim.take_events(), vec![SortEvent::DefectPicked { kind }]);
    }

    #[test]
    fn test_good_bean_gets_second_chance() {
        let mut sim = SortSim::new(3);
        let idx = good_index(&sim);
        drag_out(&mut sim, idx);

        // First offense: pardoned, bounced back inside, aimed at the center
        let bean = &sim.beans[idx];
        assert!(!bean.removed);
        assert!(bean.bounced_once);
        assert!(bean.pos.x <= TRAY_W - TRAY_MARGIN);
        assert!(bean.vel.x < 0.0, "bounce aims back toward the tray center");
        assert_eq!(sim.wrong, 0);
        assert_eq!(sim.take_events(), vec![SortEvent::GoodReturned]);

        // Second offense sticks
        drag_out(&mut sim, idx);
        assert!(sim.beans[idx].removed);
        assert_eq!(sim.wrong, 1);
        assert_eq!(sim.take_events(), vec![SortEvent::GoodDiscarded]);
    }

    #[test]
    fn test_hard_sweep_clears_all_defects_scores_max() {
        let mut sim = SortSim::new(7);
        sim.pointer_down(Vec2::ZERO);
        for i in 1..=10 {
            sim.pointer_move(Vec2::new(i as f32 * 400.0, 0.0));
        }
        sim.tick(NOMINAL_FRAME_MS);

        // Every bean flew past the rim: defects gone, good beans pardoned back
        assert_eq!(sim.correct, 4);
        assert_eq!(sim.wrong, 0);
        let events = sim.take_events();
        let picked = events
            .iter()
            .filter(|e| matches!(e, SortEvent::DefectPicked { .. }))
            .count();
        let returned = events.iter().filter(|e| **e == SortEvent::GoodReturned).count();
        assert_eq!(picked, 4);
        assert_eq!(returned, 20);
        for bean in sim.beans.iter().filter(|b| !b.removed) {
            assert!(bean.bounced_once);
            assert!(bean.pos.x <= TRAY_W - TRAY_MARGIN);
        }

        // A clean clear earns the bonus on top of full marks
        assert_eq!(sim.finalize(), 25);
    }

    #[test]
    fn test_gentle_sweep_keeps_beans_on_tray() {
        let mut sim = SortSim::new(11);
        sim.pointer_down(Vec2::ZERO);
        sim.pointer_move(Vec2::new(40.0, 0.0));
        for _ in 0..120 {
            sim.tick(NOMINAL_FRAME_MS);
        }
        assert_eq!(sim.correct + sim.wrong, 0);
        assert_eq!(sim.beans.len(), 24);
        for bean in &sim.beans {
            assert!(bean.pos.x >= BEAN_RADIUS && bean.pos.x <= TRAY_W - BEAN_RADIUS);
            assert!(bean.pos.y >= BEAN_RADIUS && bean.pos.y <= TRAY_H - BEAN_RADIUS);
        }
    }

    #[test]
    fn test_wall_bounce_reflects() {
        let mut sim = SortSim::new(5);
        sim.beans[0].pos = Vec2::new(12.0, 100.0);
        sim.beans[0].vel = Vec2::new(-5.0, 0.0);
        sim.tick(NOMINAL_FRAME_MS);

        let bean = &sim.beans[0];
        assert!((bean.pos.x - BEAN_RADIUS).abs() < 1e-4);
        assert!((bean.vel.x - 2.85).abs() < 1e-4); // -5 * 0.95, reflected at 0.6
    }

    #[test]
    fn test_score_clamps_at_zero() {
        let mut sim = SortSim::new(13);
        let idx = defect_index(&sim);
        drag_out(&mut sim, idx);
        for _ in 0..3 {
            let idx = good_index(&sim);
            drag_out(&mut sim, idx);
            drag_out(&mut sim, idx);
        }
        // 1 * 5 - 3 * 3 = -4, clamped
        assert_eq!(sim.finalize(), 0);
    }

    #[test]
    fn test_mistake_forfeits_clean_bonus() {
        let mut sim = SortSim::new(17);
        let idx = good_index(&sim);
        drag_out(&mut sim, idx);
        drag_out(&mut sim, idx);
        for _ in 0..4 {
            let idx = defect_index(&sim);
            drag_out(&mut sim, idx);
        }
        // 4 * 5 - 1 * 3, no bonus
        assert_eq!(sim.finalize(), 17);
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let mut sim = SortSim::new(19);
        let idx = defect_index(&sim);
        drag_out(&mut sim, idx);
        assert_eq!(sim.finalize(), 5);
        assert_eq!(sim.finalize(), 5);
        let finishes = sim
            .take_events()
            .iter()
            .filter(|e| matches!(e, SortEvent::Finished { .. }))
            .count();
        assert_eq!(finishes, 1);
        assert!(sim.take_events().is_empty());
    }

    #[test]
    fn test_pointer_dead_after_finalize() {
        let mut sim = SortSim::new(23);
        sim.finalize();
        let pos = sim.beans[0].pos;
        sim.pointer_down(pos);
        assert_eq!(sim.grip, Grip::Idle);
        sim.pointer_move(pos + Vec2::new(50.0, 0.0));
        assert_eq!(sim.beans[0].pos, pos);
    }

    #[test]
    fn test_reset_redeals_before_finalize() {
        let mut sim = SortSim::new(29);
        let idx = defect_index(&sim);
        drag_out(&mut sim, idx);
        assert_eq!(sim.correct, 1);

        sim.reset();
        assert_eq!(sim.correct, 0);
        assert_eq!(sim.beans.len(), 24);
        assert!(sim.beans.iter().all(|b| !b.removed));
        assert!(sim.take_events().is_empty());

        // After scoring, reset is dead too
        let score = sim.finalize();
        sim.reset();
        assert_eq!(sim.score(), Some(score));
    }

    #[test]
    fn test_removed_beans_fade_then_compact() {
        let mut sim = SortSim::new(31);
        let idx = defect_index(&sim);
        drag_out(&mut sim, idx);
        assert_eq!(sim.beans.len(), 24);

        for _ in 0..25 {
            sim.tick(NOMINAL_FRAME_MS);
        }
        assert_eq!(sim.beans.len(), 23);
        assert_eq!(sim.correct, 1, "tally survives compaction");
        assert_eq!(sim.snapshot().removed, 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let sim = SortSim::new(1);
        let json = serde_json::to_string(&sim.snapshot()).unwrap();
        assert!(json.contains("\"remaining\":24"));
        assert!(json.contains("\"kind\":\"Good\""));
        assert!(json.contains("\"score\":null"));
    }

    #[test]
    fn test_determinism() {
        let script = |sim: &mut SortSim| {
            sim.pointer_down(Vec2::ZERO);
            for i in 1..20 {
                sim.pointer_move(Vec2::new(i as f32 * 30.0, 10.0));
                sim.tick(NOMINAL_FRAME_MS);
            }
            sim.pointer_up();
            for _ in 0..30 {
                sim.tick(NOMINAL_FRAME_MS);
            }
        };
        let mut a = SortSim::new(99);
        let mut b = SortSim::new(99);
        script(&mut a);
        script(&mut b);

        assert_eq!(a.beans.len(), b.beans.len());
        for (x, y) in a.beans.iter().zip(b.beans.iter()) {
            assert!((x.pos - y.pos).length() < 1e-4);
            assert_eq!(x.removed, y.removed);
        }
        assert_eq!(a.correct, b.correct);
        assert_eq!(a.wrong, b.wrong);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_score_stays_in_bounds(
            seed in 0u64..500,
            moves in proptest::collection::vec((-50.0f32..450.0, -50.0f32..300.0), 0..40),
        ) {
            let mut sim = SortSim::new(seed);
            for (i, (x, y)) in moves.iter().enumerate() {
                let p = Vec2::new(*x, *y);
                match i % 3 {
                    0 => sim.pointer_down(p),
                    1 => sim.pointer_move(p),
                    _ => sim.pointer_up(),
                }
                sim.tick(NOMINAL_FRAME_MS);
            }
            let score = sim.finalize();
            prop_assert!(score <= 25);
        }
    }
}
