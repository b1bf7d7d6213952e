//! Zen Brew - a pointer-driven hand-brew coffee game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (bean sorting, grinding, pouring)
//! - `score`: Score card aggregation and reward draw
//! - `tuning`: Data-driven game balance

pub mod score;
pub mod sim;
pub mod tuning;

pub use score::{RewardTier, ScoreCard, draw_reward};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    use glam::Vec2;

    /// One nominal 60 Hz frame in milliseconds; per-frame physics scales by dt / this
    pub const NOMINAL_FRAME_MS: f32 = 1000.0 / 60.0;
    /// Pointer-event cadence assumed when converting per-move deltas to rates
    pub const POINTER_FRAME_MS: f32 = 16.0;

    /// Sorting tray dimensions
    pub const TRAY_W: f32 = 360.0;
    pub const TRAY_H: f32 = 240.0;
    /// Beans spawn and settle at least this far from the tray edge
    pub const TRAY_MARGIN: f32 = 25.0;

    /// Bean defaults
    pub const BEAN_RADIUS: f32 = 10.0;
    /// Slightly forgiving pick-up radius
    pub const BEAN_PICK_RADIUS: f32 = 14.0;
    /// Good beans per batch (defect mix is fixed in the sort simulator)
    pub const GOOD_BEAN_COUNT: usize = 20;

    /// Grinder crank pivot and handle
    pub const GRIND_PIVOT: Vec2 = Vec2::new(180.0, 200.0);
    pub const GRIND_HANDLE_LENGTH: f32 = 90.0;

    /// Brew station dimensions
    pub const BREW_W: f32 = 360.0;
    pub const BREW_H: f32 = 520.0;
    /// Kettle rest position and drag bounds
    pub const KETTLE_START: Vec2 = Vec2::new(80.0, 80.0);
    pub const KETTLE_MIN: Vec2 = Vec2::new(50.0, 40.0);
    pub const KETTLE_MAX: Vec2 = Vec2::new(BREW_W - 50.0, BREW_H - 180.0);
    /// Spout tip offset from kettle center at zero tilt
    pub const SPOUT_OFFSET: Vec2 = Vec2::new(-48.0, -6.0);
    /// Center of the dripper bed the pour aims for
    pub const BREW_TARGET: Vec2 = Vec2::new(180.0, 200.0);
    /// Pointer must press within this distance of the kettle to grab it
    pub const KETTLE_GRAB_RADIUS: f32 = 60.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}
