//! Headless симуляция Monaty
//!
//! Один персонаж (LocalPredicted) + placement мир на rapier3d.
//! Сервер эмулируется loopback'ом: запросы settings change сразу подтверждаются флагом.
//!
//! Использование: `monaty_simulation [character.toml] [movement_models.toml]`

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use monaty_simulation::physics::FLAG_SETTINGS_CHANGE;
use monaty_simulation::{
    create_headless_app, log_error, log_info, spawn_character, Character, CharacterConfig, CharacterController,
    CharacterInputEvent, CharacterStatus, InputAction, KinematicIntegrator, MovementModelTable, PlaceableClass,
    PlaceableDescriptor, PlacementWorldResource, RapierPlacementWorld, Role, SIMULATION_HZ,
};
use std::path::Path;
use std::time::Duration;

const TICKS: u32 = 600;

fn main() {
    let mut app = create_headless_app();
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(1.0 / SIMULATION_HZ)));

    let args: Vec<String> = std::env::args().collect();
    let config = match args.get(1) {
        Some(path) => match CharacterConfig::from_file(Path::new(path)) {
            Ok(config) => config,
            Err(err) => {
                log_error(&format!("❌ {}", err));
                std::process::exit(1);
            }
        },
        None => CharacterConfig::default(),
    };
    let models = match args.get(2) {
        Some(path) => match MovementModelTable::from_file(Path::new(path)) {
            Ok(models) => models,
            Err(err) => {
                log_error(&format!("❌ {}", err));
                std::process::exit(1);
            }
        },
        None => MovementModelTable::with_default_model(),
    };

    let mut world = RapierPlacementWorld::new();
    world.add_ground(0.0);
    world.add_static_box(Vec3::new(1500.0, 0.0, 150.0), Vec3::new(20.0, 400.0, 150.0));
    app.insert_resource(PlacementWorldResource(Box::new(world)));

    let mut controller = CharacterController::new(
        config,
        Role::LocalPredicted,
        Box::new(KinematicIntegrator::new(Vec3::ZERO)),
    );
    controller.apply_movement_model(&models);
    controller.select_placeable(Some(PlaceableDescriptor::single(PlaceableClass::new(
        "crate",
        Vec3::splat(40.0),
        2,
    ))));
    let entity = spawn_character(&mut app.world_mut().commands(), controller);
    app.world_mut().flush();

    log_info(&format!("Starting Monaty headless simulation ({} ticks)", TICKS));

    for tick in 0..TICKS {
        for action in scripted_input(tick) {
            app.world_mut().send_event(CharacterInputEvent { entity, action });
        }

        app.update();
        loopback_server(&mut app, entity);

        if tick % 60 == 0 {
            if let Some(status) = app.world().get::<CharacterStatus>(entity) {
                let translation = app.world().get::<Transform>(entity).map(|t| t.translation);
                log_info(&format!(
                    "Tick {}: {:?} {:?} {:?} speed {:.1} at {:?}",
                    tick, status.movement_state, status.gait, status.stance, status.speed, translation
                ));
            }
        }
    }

    log_info("Simulation complete!");
}

/// Сценарий: walk → sprint → jump → crouch → place
fn scripted_input(tick: u32) -> Vec<InputAction> {
    match tick {
        10 => vec![InputAction::MoveForward(1.0)],
        120 => vec![InputAction::SprintPressed],
        240 => vec![InputAction::SprintReleased, InputAction::JumpPressed],
        330 => vec![InputAction::MoveForward(0.0), InputAction::StancePressed],
        400 => vec![InputAction::StancePressed, InputAction::LookUp(-30.0)],
        420 => vec![InputAction::PlaceMode],
        480 => vec![InputAction::LookRight(45.0)],
        500 => vec![InputAction::Construct],
        560 => vec![InputAction::PlaceMode],
        _ => Vec::new(),
    }
}

/// Сервер принимает запрос и подтверждает его в следующем move
fn loopback_server(app: &mut App, entity: Entity) {
    let Some(mut character) = app.world_mut().get_mut::<Character>(entity) else {
        return;
    };
    let solver = character.0.solver_mut();
    if !solver.take_requests().is_empty() {
        solver.update_from_compressed_flags(FLAG_SETTINGS_CHANGE);
    }
}
