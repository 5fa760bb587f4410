//! Movement domain: state machine персонажа
//!
//! Содержит:
//! - MovementSettings / MovementModel / MovementModelTable (per-stance скорости и кривые)
//! - Rotation smoothing (constant + exponential interpolation)
//! - MovementState / GaitState / StanceState + MovementEvent
//! - EssentialValues (производные величины кадра)
//! - StanceTimeline
//! - MovementStateMachine (per-frame pipeline)

pub mod essentials;
pub mod events;
pub mod rotation;
pub mod settings;
pub mod stance;
pub mod state;
pub mod state_machine;

#[cfg(test)]
mod state_machine_tests;

// Re-export
pub use essentials::{EssentialValues, KinematicSample};
pub use events::MovementEvent;
pub use rotation::{interp_constant_to, interp_to, rinterp_constant_to, rinterp_to};
pub use settings::{MovementModel, MovementModelTable, MovementSettings};
pub use stance::{StanceTimeline, TimelineDirection};
pub use state::{GaitState, MovementState, StanceState, StateChange};
pub use state_machine::MovementStateMachine;
