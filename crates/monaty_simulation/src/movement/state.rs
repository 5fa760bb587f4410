//! Movement / gait / stance состояния персонажа

use bevy::prelude::*;

/// Производное от movement mode интегратора (Walking → Grounded, Falling → InAir)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub enum MovementState {
    #[default]
    None,
    Grounded,
    InAir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub enum GaitState {
    None,
    #[default]
    Walking,
    Sprinting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub enum StanceState {
    #[default]
    Standing,
    Crouching,
}

impl StanceState {
    pub fn toggled(self) -> Self {
        match self {
            StanceState::Standing => StanceState::Crouching,
            StanceState::Crouching => StanceState::Standing,
        }
    }
}

/// Запрос смены одного из трёх состояний (вход `MovementStateMachine::set_state`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    Movement(MovementState),
    Gait(GaitState),
    Stance(StanceState),
}
