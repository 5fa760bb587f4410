//! Essential values: производные кинематические величины кадра
//!
//! Пересчитываются каждый tick в фиксированном порядке (поздние зависят от ранних):
//! aiming rotation → acceleration → speed → is_moving → eased max acceleration
//! → input amount → has_movement_input → aim yaw rate.

use crate::movement::rotation::rinterp_to;
use crate::shared::{normalize_axis, Rotator};
use bevy::prelude::*;

/// Снимок физики и контроля на текущий кадр (вход `update_essential_values`)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct KinematicSample {
    pub velocity: Vec3,
    /// Raw input acceleration интегратора (input * max acceleration)
    pub current_acceleration: Vec3,
    /// Текущий max acceleration solver'а (после curve override)
    pub max_acceleration: f32,
    pub control_rotation: Rotator,
    pub is_locally_controlled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub struct EssentialValues {
    pub velocity: Vec3,
    pub acceleration: Vec3,
    /// Горизонтальная (x, y) скорость
    pub speed: f32,
    pub movement_input_amount: f32,
    pub aiming_rotation: Rotator,
    pub aim_yaw_rate: f32,
    pub is_moving: bool,
    pub has_movement_input: bool,
    pub last_velocity_rotation: Rotator,
    pub last_movement_input_rotation: Rotator,
    pub current_acceleration: Vec3,
    pub eased_max_acceleration: f32,
}

impl EssentialValues {
    pub const MOVING_SPEED_THRESHOLD: f32 = 1.0;

    /// `previous_velocity` / `previous_aim_yaw`: значения прошлого кадра
    pub fn update(
        &mut self,
        dt: f32,
        sample: &KinematicSample,
        previous_velocity: Vec3,
        previous_aim_yaw: f32,
        aiming_interp_speed: f32,
    ) {
        self.aiming_rotation = rinterp_to(self.aiming_rotation, sample.control_rotation, dt, aiming_interp_speed);

        self.velocity = sample.velocity;
        self.current_acceleration = sample.current_acceleration;
        let has_raw_input = !sample.current_acceleration.abs_diff_eq(Vec3::ZERO, 1e-4);

        self.acceleration = if !sample.is_locally_controlled && !has_raw_input {
            self.acceleration / 2.0
        } else if dt > 0.0 {
            (sample.velocity - previous_velocity) / dt
        } else {
            self.acceleration
        };

        self.speed = Vec2::new(sample.velocity.x, sample.velocity.y).length();

        self.is_moving = self.speed > Self::MOVING_SPEED_THRESHOLD;
        if self.is_moving {
            self.last_velocity_rotation = Rotator::from_direction(sample.velocity);
        }

        // Remote proxy может прислать 0: плавно гасим вместо скачка
        self.eased_max_acceleration = if sample.is_locally_controlled || sample.max_acceleration != 0.0 {
            sample.max_acceleration
        } else {
            self.eased_max_acceleration / 2.0
        };

        self.movement_input_amount = if self.eased_max_acceleration > f32::EPSILON {
            (sample.current_acceleration.length() / self.eased_max_acceleration).clamp(0.0, 1.0)
        } else {
            0.0
        };

        self.has_movement_input = self.movement_input_amount > 0.0;
        if self.has_movement_input {
            self.last_movement_input_rotation = Rotator::from_direction(sample.current_acceleration);
        }

        self.aim_yaw_rate = if dt > 0.0 {
            // кратчайшая дельта: переход через ±180 не даёт скачка rate
            normalize_axis(self.aiming_rotation.yaw - previous_aim_yaw).abs() / dt
        } else {
            0.0
        };
    }
}
