//! Kinematic integrator (headless)
//!
//! Архитектура:
//! - Custom velocity integration: walking (friction + accel + braking), falling (gravity + air control)
//! - Ground check: плоский пол на `floor_z`
//! - Caps приходят от solver'а каждый step
//!
//! Детерминизм: только f32 арифметика, без RNG и системного времени.

use crate::physics::integrator::{MovementCaps, MovementMode, PhysicsIntegrator};
use bevy::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub struct KinematicIntegrator {
    location: Vec3,
    velocity: Vec3,
    mode: MovementMode,
    input: Vec3,
    current_acceleration: Vec3,
    crouched: bool,
    /// Скорость отрыва при прыжке (cm/s)
    pub jump_z_velocity: f32,
    /// cm/s², отрицательная (Z вверх)
    pub gravity_z: f32,
    /// Доля max acceleration, доступная в воздухе
    pub air_control: f32,
    pub floor_z: f32,
    pub defaults: MovementCaps,
}

impl Default for KinematicIntegrator {
    fn default() -> Self {
        Self {
            location: Vec3::ZERO,
            velocity: Vec3::ZERO,
            mode: MovementMode::Walking,
            input: Vec3::ZERO,
            current_acceleration: Vec3::ZERO,
            crouched: false,
            jump_z_velocity: 420.0,
            gravity_z: -980.0,
            air_control: 0.35,
            floor_z: 0.0,
            defaults: MovementCaps::default(),
        }
    }
}

impl KinematicIntegrator {
    pub fn new(location: Vec3) -> Self {
        let mut integrator = Self::default();
        integrator.teleport(location);
        integrator
    }

    /// Принудительная смена режима (например Flying для скриптов)
    pub fn set_movement_mode(&mut self, mode: MovementMode) {
        self.mode = mode;
        if mode == MovementMode::Walking {
            self.velocity.z = 0.0;
        }
    }

    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn max_speed(&self, caps: &MovementCaps) -> f32 {
        if self.crouched {
            caps.max_walk_speed_crouched
        } else {
            caps.max_walk_speed
        }
    }

    fn step_walking(&mut self, dt: f32, caps: &MovementCaps) {
        let horizontal = Vec3::new(self.velocity.x, self.velocity.y, 0.0);
        let max_speed = self.max_speed(caps);

        let new_horizontal = if self.current_acceleration.length_squared() > 0.0 {
            // Friction поворачивает скорость к направлению input (steering)
            let accel_dir = self.current_acceleration.normalize_or_zero();
            let speed = horizontal.length();
            let steered = horizontal - (horizontal - accel_dir * speed) * (caps.ground_friction * dt).min(1.0);
            (steered + self.current_acceleration * dt).clamp_length_max(max_speed)
        } else {
            Self::apply_braking(horizontal, dt, caps.ground_friction, caps.max_braking_deceleration)
        };

        self.velocity = Vec3::new(new_horizontal.x, new_horizontal.y, 0.0);
        self.location += self.velocity * dt;
        self.location.z = self.floor_z;
    }

    /// v += (-friction * v - decel * dir) * dt, остановка при смене направления
    fn apply_braking(velocity: Vec3, dt: f32, friction: f32, deceleration: f32) -> Vec3 {
        if velocity.length_squared() <= f32::EPSILON {
            return Vec3::ZERO;
        }
        let direction = velocity.normalize();
        let braked = velocity + (-friction * velocity - deceleration * direction) * dt;
        if braked.dot(velocity) <= 0.0 {
            Vec3::ZERO
        } else {
            braked
        }
    }

    fn step_falling(&mut self, dt: f32, caps: &MovementCaps) {
        let air_accel = self.current_acceleration * self.air_control;
        let mut horizontal = Vec3::new(self.velocity.x, self.velocity.y, 0.0) + air_accel * dt;
        // Air control не разгоняет выше walk cap, но и не тормозит быстрый прыжок
        let limit = horizontal.length().min(self.max_speed(caps).max(
            Vec2::new(self.velocity.x, self.velocity.y).length(),
        ));
        horizontal = horizontal.clamp_length_max(limit);

        self.velocity = Vec3::new(horizontal.x, horizontal.y, self.velocity.z + self.gravity_z * dt);
        self.location += self.velocity * dt;

        if self.location.z <= self.floor_z && self.velocity.z <= 0.0 {
            self.location.z = self.floor_z;
            self.velocity.z = 0.0;
            self.mode = MovementMode::Walking;
        }
    }
}

impl PhysicsIntegrator for KinematicIntegrator {
    fn location(&self) -> Vec3 {
        self.location
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn movement_mode(&self) -> MovementMode {
        self.mode
    }

    fn current_acceleration(&self) -> Vec3 {
        self.current_acceleration
    }

    fn default_caps(&self) -> MovementCaps {
        self.defaults
    }

    fn set_movement_input(&mut self, input: Vec3) {
        self.input = Vec3::new(input.x, input.y, 0.0).clamp_length_max(1.0);
    }

    fn set_crouched(&mut self, crouched: bool) {
        self.crouched = crouched;
    }

    fn is_crouched(&self) -> bool {
        self.crouched
    }

    fn jump(&mut self) -> bool {
        if self.mode != MovementMode::Walking {
            return false;
        }
        self.velocity.z = self.jump_z_velocity;
        self.mode = MovementMode::Falling;
        true
    }

    fn teleport(&mut self, location: Vec3) {
        self.location = location;
        if location.z > self.floor_z {
            self.mode = MovementMode::Falling;
        } else {
            self.location.z = self.floor_z;
        }
    }

    fn step(&mut self, dt: f32, caps: &MovementCaps) {
        if dt <= 0.0 {
            return;
        }
        self.current_acceleration = self.input * caps.max_acceleration;

        match self.mode {
            MovementMode::Walking => self.step_walking(dt, caps),
            MovementMode::Falling => self.step_falling(dt, caps),
            // Flying / Swimming / None: свободный полёт без гравитации
            _ => self.location += self.velocity * dt,
        }
    }
}
