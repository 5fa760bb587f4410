//! Shared domain: cross-cutting типы
//!
//! Содержит:
//! - Rotator (pitch/yaw/roll в градусах, Z-up конвенция)
//! - Keyed curves (FloatCurve, VectorCurve)

pub mod curve;
pub mod rotator;

pub use curve::*;
pub use rotator::*;
