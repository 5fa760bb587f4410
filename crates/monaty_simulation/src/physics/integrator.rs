//! PhysicsIntegrator: strategy trait внешней физики
//!
//! Solver не интегрирует движение сам: он считает caps (speed / accel / friction)
//! и отдаёт их интегратору на каждый step. Headless реализация: `KinematicIntegrator`,
//! движковый слой может подставить свою (character body движка).

use bevy::prelude::*;

/// Movement mode интегратора (источник MovementState)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub enum MovementMode {
    #[default]
    None,
    Walking,
    Falling,
    Flying,
    Swimming,
}

/// Ограничения движения на один physics step
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct MovementCaps {
    pub max_walk_speed: f32,
    pub max_walk_speed_crouched: f32,
    pub max_acceleration: f32,
    pub max_braking_deceleration: f32,
    pub ground_friction: f32,
}

impl Default for MovementCaps {
    fn default() -> Self {
        Self {
            max_walk_speed: 600.0,
            max_walk_speed_crouched: 300.0,
            max_acceleration: 2048.0,
            max_braking_deceleration: 2048.0,
            ground_friction: 8.0,
        }
    }
}

pub trait PhysicsIntegrator: Send + Sync {
    fn location(&self) -> Vec3;

    fn velocity(&self) -> Vec3;

    fn movement_mode(&self) -> MovementMode;

    /// Input acceleration последнего step (input * max acceleration)
    fn current_acceleration(&self) -> Vec3;

    /// Caps движка до любых override (fallback solver'а)
    fn default_caps(&self) -> MovementCaps;

    fn is_moving_on_ground(&self) -> bool {
        self.movement_mode() == MovementMode::Walking
    }

    /// World-space input, длина clamp'ится интегратором к 1
    fn set_movement_input(&mut self, input: Vec3);

    fn set_crouched(&mut self, crouched: bool);

    fn is_crouched(&self) -> bool;

    /// false если прыжок сейчас невозможен (не на земле)
    fn jump(&mut self) -> bool;

    fn teleport(&mut self, location: Vec3);

    fn step(&mut self, dt: f32, caps: &MovementCaps);
}
