//! Character module: CharacterController + ECS интеграция
//!
//! ECS ответственность:
//! - Input: CharacterInputEvent → CharacterController::handle_input
//! - Tick: CharacterController::update (FixedUpdate)
//! - Events: MovementStateChanged, GaitChanged, StanceChanged
//! - Sync: CharacterStatus + Transform из контроллера
//!
//! Placement мир: опциональный resource (`PlacementWorldResource`):
//! без него тикается только движение.

use bevy::prelude::*;

pub mod controller;
pub mod input;

pub use controller::{CharacterController, MAX_LOOK_PITCH};
pub use input::{CharacterInput, InputAction};

use crate::movement::{GaitState, MovementEvent, MovementState, StanceState};
use crate::placement::PlacementWorld;

/// Event: input action для конкретного персонажа
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct CharacterInputEvent {
    pub entity: Entity,
    pub action: InputAction,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementStateChanged {
    pub entity: Entity,
    pub previous: MovementState,
    pub current: MovementState,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GaitChanged {
    pub entity: Entity,
    pub previous: GaitState,
    pub current: GaitState,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StanceChanged {
    pub entity: Entity,
    pub previous: StanceState,
    pub current: StanceState,
}

/// Персонаж (контроллер целиком живёт в компоненте)
#[derive(Component, Debug)]
pub struct Character(pub CharacterController);

/// Read-only снимок для animation / UI (обновляется каждый tick)
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Reflect)]
#[reflect(Component)]
pub struct CharacterStatus {
    pub movement_state: MovementState,
    pub gait: GaitState,
    pub stance: StanceState,
    pub stance_alpha: f32,
    pub speed: f32,
    pub movement_input_amount: f32,
    pub is_in_place_mode: bool,
    pub is_placing: bool,
    pub can_place: bool,
}

/// Общий placement мир для всех персонажей
#[derive(Resource)]
pub struct PlacementWorldResource(pub Box<dyn PlacementWorld>);

/// Character Plugin
///
/// Порядок выполнения (FixedUpdate):
/// 1. apply_character_input: CharacterInputEvent → handle_input
/// 2. tick_characters: CharacterController::update
/// 3. publish_character_state: события + CharacterStatus / Transform
pub struct CharacterPlugin;

impl Plugin for CharacterPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<CharacterInputEvent>()
            .add_event::<MovementStateChanged>()
            .add_event::<GaitChanged>()
            .add_event::<StanceChanged>()
            .register_type::<CharacterStatus>();

        app.add_systems(
            FixedUpdate,
            (apply_character_input, tick_characters, publish_character_state).chain(),
        );
    }
}

/// Spawn helper: Character + CharacterStatus + Transform
pub fn spawn_character(commands: &mut Commands, controller: CharacterController) -> Entity {
    let transform = controller.transform();
    commands
        .spawn((transform, CharacterStatus::default(), Character(controller)))
        .id()
}

/// System: input events → контроллеры
pub fn apply_character_input(
    mut input_events: EventReader<CharacterInputEvent>,
    mut characters: Query<&mut Character>,
) {
    for event in input_events.read() {
        let Ok(mut character) = characters.get_mut(event.entity) else {
            crate::log(&format!("Input for unknown character {:?}: {:?}", event.entity, event.action));
            continue;
        };
        character.0.handle_input(event.action);
    }
}

/// System: один tick каждого персонажа
pub fn tick_characters(
    time: Res<Time>,
    mut characters: Query<&mut Character>,
    mut placement_world: Option<ResMut<PlacementWorldResource>>,
) {
    let dt = time.delta_secs();
    for mut character in characters.iter_mut() {
        let world = placement_world
            .as_deref_mut()
            .map(|resource| resource.0.as_mut() as &mut dyn PlacementWorld);
        character.0.update(dt, world);
    }
}

/// System: movement events → ECS events, sync CharacterStatus / Transform
pub fn publish_character_state(
    mut characters: Query<(Entity, &mut Character, &mut CharacterStatus, &mut Transform)>,
    mut movement_events: EventWriter<MovementStateChanged>,
    mut gait_events: EventWriter<GaitChanged>,
    mut stance_events: EventWriter<StanceChanged>,
) {
    for (entity, mut character, mut status, mut transform) in characters.iter_mut() {
        for event in character.0.drain_events() {
            match event {
                MovementEvent::MovementStateChanged { previous, current } => {
                    movement_events.write(MovementStateChanged {
                        entity,
                        previous,
                        current,
                    });
                }
                MovementEvent::GaitChanged { previous, current } => {
                    gait_events.write(GaitChanged {
                        entity,
                        previous,
                        current,
                    });
                }
                MovementEvent::StanceChanged { previous, current } => {
                    stance_events.write(StanceChanged {
                        entity,
                        previous,
                        current,
                    });
                }
            }
        }

        let controller = &character.0;
        *status = CharacterStatus {
            movement_state: controller.movement_state(),
            gait: controller.gait(),
            stance: controller.stance(),
            stance_alpha: controller.stance_alpha(),
            speed: controller.essentials().speed,
            movement_input_amount: controller.essentials().movement_input_amount,
            is_in_place_mode: controller.is_in_place_mode(),
            is_placing: controller.is_placing(),
            can_place: controller.can_place(),
        };
        *transform = controller.transform();
    }
}
