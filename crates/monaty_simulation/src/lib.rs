//! Monaty Simulation Core
//!
//! Third-person character movement + placement на Bevy 0.16 (headless).
//!
//! Слои:
//! - movement: state machine (movement / gait / stance), essential values, rotation
//! - physics: AuthoritativeMovementSolver (client/server settings protocol) + integrator
//! - placement: raycast-driven preview → construct
//! - character: CharacterController + ECS plugin
//!
//! Единицы: сантиметры, градусы, Z вверх.

use bevy::prelude::*;

// Публичные модули
pub mod character;
pub mod config;
pub mod logger;
pub mod movement;
pub mod physics;
pub mod placement;
pub mod shared;

// Re-export основных типов
pub use character::{
    spawn_character, Character, CharacterController, CharacterInputEvent, CharacterPlugin, CharacterStatus,
    GaitChanged, InputAction, MovementStateChanged, PlacementWorldResource, StanceChanged,
};
pub use config::{CharacterConfig, ConfigError};
pub use movement::{GaitState, MovementModelTable, MovementState, StanceState};
pub use physics::{AuthoritativeMovementSolver, KinematicIntegrator, Role};
pub use placement::{PlaceableClass, PlaceableDescriptor, PlacementController, RapierPlacementWorld};
pub use shared::Rotator;

// Logger (crate::log в модулях)
pub use logger::{
    init_logger, log, log_error, log_info, log_warning, log_with_level, set_log_level, set_logger,
    set_logger_if_needed, LogLevel, LogPrinter,
};

/// Частота FixedUpdate (simulation tick)
pub const SIMULATION_HZ: f64 = 60.0;

/// Главный plugin симуляции
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(SIMULATION_HZ))
            .add_plugins(CharacterPlugin);
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app() -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins((MinimalPlugins, SimulationPlugin));

    app
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    // Собираем все компоненты в детерминированный формат
    let mut snapshot = Vec::new();
    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
