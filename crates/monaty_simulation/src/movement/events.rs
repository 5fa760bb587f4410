//! Movement events

use crate::movement::state::{GaitState, MovementState, StanceState};

/// Уведомление о смене состояния (для animation / UI слушателей)
///
/// Генерируется:
/// - MovementStateMachine::set_state (только при реальной смене значения)
///
/// Обрабатывается:
/// - CharacterController::drain_events → ECS events (MovementStateChanged, GaitChanged, StanceChanged)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementEvent {
    MovementStateChanged {
        previous: MovementState,
        current: MovementState,
    },
    GaitChanged {
        previous: GaitState,
        current: GaitState,
    },
    StanceChanged {
        previous: StanceState,
        current: StanceState,
    },
}
