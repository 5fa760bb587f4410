//! Physics module
//!
//! Solver + injected integrator. Сами коллизии/интеграция: забота интегратора,
//! solver только считает caps и ведёт authority protocol.

pub mod integrator;
pub mod kinematic;
pub mod solver;


// Re-export основных типов
pub use integrator::{MovementCaps, MovementMode, PhysicsIntegrator};
pub use kinematic::KinematicIntegrator;
pub use solver::{AuthoritativeMovementSolver, Role, SettingsChangeRequest, FLAG_SETTINGS_CHANGE};
