//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Explicit millisecond timesteps only
//! - Seeded RNG only (the pour stage draws nothing)
//! - No rendering or platform dependencies
//!
//! Each brewing stage is its own self-contained state machine, driven by
//! pointer events plus `tick`, and reports back through drainable event
//! queues and serializable snapshots.

pub mod grind;
pub mod pour;
pub mod sampler;
pub mod sort;

pub use grind::{GrindEvent, GrindPhase, GrindSim, GrindSnapshot, PaceHint};
pub use pour::{PourEvent, PourHint, PourPhase, PourSample, PourSim, PourSnapshot};
pub use sampler::{RateSample, SampleClock};
pub use sort::{BeanKind, BeanView, SortEvent, SortSim, SortSnapshot};
