//! Character input actions
//!
//! Axes хранятся до следующего update (как held-state), кнопки: одноразовые действия.

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum InputAction {
    /// [-1, 1], вперёд по yaw control rotation
    MoveForward(f32),
    /// [-1, 1], вправо по yaw control rotation
    MoveRight(f32),
    /// Pitch axis (умножается на look up rate)
    LookUp(f32),
    /// Yaw axis (умножается на look right rate)
    LookRight(f32),
    SprintPressed,
    SprintReleased,
    JumpPressed,
    StancePressed,
    /// Toggle place mode
    PlaceMode,
    Construct,
}

/// Held axes персонажа
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub struct CharacterInput {
    pub forward: f32,
    pub right: f32,
}

impl CharacterInput {
    pub fn has_input(&self) -> bool {
        self.forward != 0.0 || self.right != 0.0
    }
}
