//! Rotation smoothing primitives
//!
//! Две интерполяции, обе frame-rate independent:
//! - constant: шаг не больше `speed * dt` (linear approach)
//! - exponential: alpha = 1 - exp(-speed * dt) (как в fistforce player smoothing)
//!
//! Rotator варианты работают по каждой оси по кратчайшей дельте.

use crate::shared::Rotator;

/// Constant-rate приближение к target
pub fn interp_constant_to(current: f32, target: f32, dt: f32, speed: f32) -> f32 {
    let distance = target - current;
    if dt <= 0.0 || distance == 0.0 {
        return current;
    }
    if speed <= 0.0 {
        return target;
    }
    let step = speed * dt;
    current + distance.clamp(-step, step)
}

/// Exponential-decay приближение к target
pub fn interp_to(current: f32, target: f32, dt: f32, speed: f32) -> f32 {
    if dt <= 0.0 || current == target {
        return current;
    }
    if speed <= 0.0 {
        return target;
    }
    let alpha = 1.0 - (-speed * dt).exp();
    current + (target - current) * alpha
}

pub fn rinterp_constant_to(current: Rotator, target: Rotator, dt: f32, speed: f32) -> Rotator {
    if dt <= 0.0 || current == target {
        return current;
    }
    if speed <= 0.0 {
        return target.normalized();
    }
    let delta = target.delta(current);
    let step = speed * dt;
    Rotator::new(
        current.pitch + delta.pitch.clamp(-step, step),
        current.yaw + delta.yaw.clamp(-step, step),
        current.roll + delta.roll.clamp(-step, step),
    )
    .normalized()
}

pub fn rinterp_to(current: Rotator, target: Rotator, dt: f32, speed: f32) -> Rotator {
    if dt <= 0.0 || current == target {
        return current;
    }
    if speed <= 0.0 {
        return target.normalized();
    }
    let alpha = 1.0 - (-speed * dt).exp();
    let delta = target.delta(current);
    Rotator::new(
        current.pitch + delta.pitch * alpha,
        current.yaw + delta.yaw * alpha,
        current.roll + delta.roll * alpha,
    )
    .normalized()
}
