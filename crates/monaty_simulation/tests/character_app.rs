//! Character ECS integration test
//!
//! Проверяем:
//! - CharacterInputEvent → движение персонажа в FixedUpdate
//! - MovementStateChanged / GaitChanged / StanceChanged публикуются в ECS
//! - CharacterStatus + Transform синхронизируются с контроллером
//! - Placement через PlacementWorldResource

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use monaty_simulation::*;
use std::time::Duration;

/// Helper: headless app с ручным временем (один fixed tick на update)
fn create_character_app() -> App {
    let mut app = create_headless_app();
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(1.0 / SIMULATION_HZ)));
    app
}

fn spawn_test_character(app: &mut App, role: Role) -> Entity {
    let mut controller = CharacterController::new(
        CharacterConfig::default(),
        role,
        Box::new(KinematicIntegrator::new(Vec3::ZERO)),
    );
    controller.apply_movement_model(&MovementModelTable::with_default_model());
    controller.select_placeable(Some(PlaceableDescriptor::single(PlaceableClass::new(
        "crate",
        Vec3::splat(25.0),
        1,
    ))));
    let entity = spawn_character(&mut app.world_mut().commands(), controller);
    app.world_mut().flush();
    entity
}

fn send(app: &mut App, entity: Entity, action: InputAction) {
    app.world_mut().send_event(CharacterInputEvent { entity, action });
}

fn run(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        app.update();
    }
}

/// События персонажей, накопленные с начала теста
#[derive(Resource, Default)]
struct Collected {
    movement: Vec<MovementStateChanged>,
    gait: Vec<GaitChanged>,
    stance: Vec<StanceChanged>,
}

fn collect_events(
    mut collected: ResMut<Collected>,
    mut movement: EventReader<MovementStateChanged>,
    mut gait: EventReader<GaitChanged>,
    mut stance: EventReader<StanceChanged>,
) {
    collected.movement.extend(movement.read().copied());
    collected.gait.extend(gait.read().copied());
    collected.stance.extend(stance.read().copied());
}

fn with_collector(app: &mut App) {
    app.init_resource::<Collected>();
    app.add_systems(Update, collect_events);
}

#[test]
fn test_character_walks_forward() {
    let mut app = create_character_app();
    let entity = spawn_test_character(&mut app, Role::ListenServer);

    send(&mut app, entity, InputAction::MoveForward(1.0));
    run(&mut app, 120);

    let status = *app.world().get::<CharacterStatus>(entity).unwrap();
    assert_eq!(status.movement_state, MovementState::Grounded);
    assert_eq!(status.gait, GaitState::Walking);
    assert!((status.speed - 165.0).abs() < 1.0, "speed {}", status.speed);
    assert!((status.movement_input_amount - 1.0).abs() < 1e-3);

    let transform = app.world().get::<Transform>(entity).unwrap();
    assert!(transform.translation.x > 100.0);
    assert!(transform.translation.y.abs() < 1e-3);
}

#[test]
fn test_state_events_are_published() {
    let mut app = create_character_app();
    with_collector(&mut app);
    let entity = spawn_test_character(&mut app, Role::ListenServer);

    run(&mut app, 2);
    send(&mut app, entity, InputAction::StancePressed);
    run(&mut app, 2);
    send(&mut app, entity, InputAction::JumpPressed); // встать
    run(&mut app, 2);
    send(&mut app, entity, InputAction::JumpPressed); // прыжок
    run(&mut app, 90);

    let collected = app.world().resource::<Collected>();
    assert_eq!(
        collected.movement,
        vec![
            MovementStateChanged {
                entity,
                previous: MovementState::None,
                current: MovementState::Grounded,
            },
            MovementStateChanged {
                entity,
                previous: MovementState::Grounded,
                current: MovementState::InAir,
            },
            MovementStateChanged {
                entity,
                previous: MovementState::InAir,
                current: MovementState::Grounded,
            },
        ]
    );
    assert_eq!(
        collected.stance,
        vec![
            StanceChanged {
                entity,
                previous: StanceState::Standing,
                current: StanceState::Crouching,
            },
            StanceChanged {
                entity,
                previous: StanceState::Crouching,
                current: StanceState::Standing,
            },
        ]
    );
    assert!(collected.gait.is_empty());
}

#[test]
fn test_sprint_cap_keeps_actual_gait_walking() {
    let mut app = create_character_app();
    with_collector(&mut app);
    let entity = spawn_test_character(&mut app, Role::ListenServer);

    send(&mut app, entity, InputAction::MoveForward(1.0));
    send(&mut app, entity, InputAction::SprintPressed);
    run(&mut app, 240);

    // Actual gait переключается только выше sprint speed + hysteresis: 375 cap не даёт Sprinting
    let status = *app.world().get::<CharacterStatus>(entity).unwrap();
    assert!((status.speed - 375.0).abs() < 1.0);
    assert_eq!(status.gait, GaitState::Walking);
    assert!(app.world().resource::<Collected>().gait.is_empty());
}

#[test]
fn test_input_for_unknown_entity_is_ignored() {
    let mut app = create_character_app();
    let entity = spawn_test_character(&mut app, Role::ListenServer);
    let ghost = app.world_mut().spawn_empty().id();
    app.world_mut().despawn(ghost);

    send(&mut app, ghost, InputAction::MoveForward(1.0));
    run(&mut app, 30);

    let status = app.world().get::<CharacterStatus>(entity).unwrap();
    assert_eq!(status.speed, 0.0);
}

#[test]
fn test_remote_character_ignores_input() {
    let mut app = create_character_app();
    let entity = spawn_test_character(&mut app, Role::Remote);

    send(&mut app, entity, InputAction::MoveForward(1.0));
    run(&mut app, 30);

    let transform = app.world().get::<Transform>(entity).unwrap();
    assert_eq!(transform.translation, Vec3::ZERO);
}

#[test]
fn test_placement_through_resource() {
    let mut app = create_character_app();
    let mut world = RapierPlacementWorld::new();
    world.add_ground(0.0);
    app.insert_resource(PlacementWorldResource(Box::new(world)));
    let entity = spawn_test_character(&mut app, Role::ListenServer);

    send(&mut app, entity, InputAction::LookUp(-40.0));
    send(&mut app, entity, InputAction::PlaceMode);
    run(&mut app, 2);

    let status = *app.world().get::<CharacterStatus>(entity).unwrap();
    assert!(status.is_in_place_mode);
    assert!(status.is_placing);
    assert!(status.can_place);

    send(&mut app, entity, InputAction::Construct);
    run(&mut app, 2);

    let character = app.world().get::<Character>(entity).unwrap();
    assert!(character.0.is_placing());
    let preview = character.0.placement().preview();
    assert!(preview.is_some());

    send(&mut app, entity, InputAction::PlaceMode);
    run(&mut app, 1);
    let status = *app.world().get::<CharacterStatus>(entity).unwrap();
    assert!(!status.is_in_place_mode);
    assert!(!status.is_placing);
}

#[test]
fn test_placement_input_without_world_is_dropped() {
    let mut app = create_character_app();
    let entity = spawn_test_character(&mut app, Role::ListenServer);

    send(&mut app, entity, InputAction::PlaceMode);
    run(&mut app, 2);

    let status = app.world().get::<CharacterStatus>(entity).unwrap();
    assert!(!status.is_in_place_mode);
    assert_eq!(status.movement_state, MovementState::Grounded);
}
