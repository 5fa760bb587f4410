//! CharacterController: персонаж целиком
//!
//! Связывает MovementStateMachine + AuthoritativeMovementSolver (+ интегратор)
//! + PlacementController. Input → held axes / actions, `update` прогоняет кадр:
//! 1. placement requests (place mode / construct)
//! 2. movement state ← movement mode интегратора
//! 3. crouch + movement input → интегратор
//! 4. kinematic sample → state machine (gait, settings → solver, rotation)
//! 5. solver step (интеграция + применение одобренных settings)
//! 6. placement tick от viewpoint

use crate::character::input::{CharacterInput, InputAction};
use crate::config::CharacterConfig;
use crate::movement::{
    EssentialValues, GaitState, KinematicSample, MovementEvent, MovementModelTable, MovementState,
    MovementStateMachine, StanceState,
};
use crate::physics::{AuthoritativeMovementSolver, MovementMode, PhysicsIntegrator, Role};
use crate::placement::{
    ObjectHandle, PlaceableDescriptor, PlaceableTransform, PlacementController, PlacementError, PlacementWorld,
    Viewpoint,
};
use crate::shared::{normalize_axis, Rotator};
use bevy::prelude::*;

/// Предел pitch камеры (градусы)
pub const MAX_LOOK_PITCH: f32 = 89.9;

/// Placement действия ждут мира до следующего update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlacementRequest {
    TogglePlaceMode,
    Construct,
}

#[derive(Debug)]
pub struct CharacterController {
    config: CharacterConfig,
    state_machine: MovementStateMachine,
    solver: AuthoritativeMovementSolver,
    placement: PlacementController,
    control_rotation: Rotator,
    input: CharacterInput,
    selected_placeable: Option<PlaceableDescriptor>,
    placement_requests: Vec<PlacementRequest>,
}

impl CharacterController {
    pub fn new(config: CharacterConfig, role: Role, integrator: Box<dyn PhysicsIntegrator>) -> Self {
        Self {
            state_machine: MovementStateMachine::new(&config),
            solver: AuthoritativeMovementSolver::new(role, integrator),
            placement: PlacementController::new(config.placement.clone()),
            config,
            control_rotation: Rotator::ZERO,
            input: CharacterInput::default(),
            selected_placeable: None,
            placement_requests: Vec::new(),
        }
    }

    /// Модель по ключу из config. Нет ключа: warning, остаётся прежняя модель.
    pub fn apply_movement_model(&mut self, table: &MovementModelTable) -> bool {
        match table.get(&self.config.movement_model) {
            Ok(model) => {
                self.state_machine.set_movement_model(model.clone());
                true
            }
            Err(err) => {
                crate::log_warning(&format!("⚠️ {}; keeping previous movement model", err));
                false
            }
        }
    }

    // --- Input ---

    pub fn handle_input(&mut self, action: InputAction) {
        if !self.solver.role().is_locally_controlled() {
            return;
        }

        match action {
            InputAction::MoveForward(value) => self.input.forward = value.clamp(-1.0, 1.0),
            InputAction::MoveRight(value) => self.input.right = value.clamp(-1.0, 1.0),
            InputAction::LookUp(value) => {
                let pitch = self.control_rotation.pitch + value * self.config.look.look_up_rate;
                self.control_rotation.pitch = pitch.clamp(-MAX_LOOK_PITCH, MAX_LOOK_PITCH);
            }
            InputAction::LookRight(value) => {
                let yaw = self.control_rotation.yaw + value * self.config.look.look_right_rate;
                self.control_rotation.yaw = normalize_axis(yaw);
            }
            InputAction::SprintPressed => self.state_machine.set_desired_gait(GaitState::Sprinting),
            InputAction::SprintReleased => self.state_machine.set_desired_gait(GaitState::Walking),
            InputAction::JumpPressed => self.jump(),
            InputAction::StancePressed => {
                self.state_machine.toggle_stance();
            }
            InputAction::PlaceMode => self.placement_requests.push(PlacementRequest::TogglePlaceMode),
            InputAction::Construct => self.placement_requests.push(PlacementRequest::Construct),
        }
    }

    /// Crouched → встать; иначе прыжок (если интегратор разрешил)
    fn jump(&mut self) {
        if self.state_machine.stance() == StanceState::Crouching {
            self.state_machine.set_stance(StanceState::Standing);
            return;
        }
        if self.solver.integrator_mut().jump() {
            self.state_machine.on_jumped();
        }
    }

    fn movement_input(&self) -> Vec3 {
        let yaw = Rotator::from_yaw(self.control_rotation.yaw);
        yaw.forward() * self.input.forward + yaw.right() * self.input.right
    }

    // --- Tick ---

    pub fn update(&mut self, dt: f32, world: Option<&mut dyn PlacementWorld>) {
        let mut world = world;
        if let Some(world) = world.as_deref_mut() {
            self.process_placement_requests(world);
        } else if !self.placement_requests.is_empty() {
            crate::log("Placement input dropped: no placement world");
            self.placement_requests.clear();
        }

        self.sync_movement_state();

        let crouched = self.state_machine.stance() == StanceState::Crouching;
        let input = self.movement_input();
        let integrator = self.solver.integrator_mut();
        integrator.set_crouched(crouched);
        integrator.set_movement_input(input);

        let sample = KinematicSample {
            velocity: self.solver.integrator().velocity(),
            current_acceleration: self.solver.integrator().current_acceleration(),
            max_acceleration: self.solver.max_acceleration(),
            control_rotation: self.control_rotation,
            is_locally_controlled: self.solver.role().is_locally_controlled(),
        };
        self.state_machine.update(dt, &sample, &mut self.solver);
        self.solver.step(dt);

        if let Some(world) = world {
            let viewpoint = self.viewpoint();
            if let Err(err) = self.placement.tick(world, &viewpoint) {
                crate::log(&format!("Placement session ended: {}", err));
            }
        }
    }

    fn sync_movement_state(&mut self) {
        let state = match self.solver.integrator().movement_mode() {
            MovementMode::Walking => MovementState::Grounded,
            MovementMode::Falling => MovementState::InAir,
            _ => MovementState::None,
        };
        self.state_machine.set_movement_state(state);
    }

    fn process_placement_requests(&mut self, world: &mut dyn PlacementWorld) {
        for request in std::mem::take(&mut self.placement_requests) {
            match request {
                PlacementRequest::TogglePlaceMode => self.toggle_place_mode(world),
                PlacementRequest::Construct => self.construct(world),
            }
        }
    }

    fn toggle_place_mode(&mut self, world: &mut dyn PlacementWorld) {
        if self.placement.is_in_place_mode() {
            self.placement.exit_place_mode(world);
            return;
        }
        self.placement.enter_place_mode();
        self.start_selected_placing(world);
    }

    fn start_selected_placing(&mut self, world: &mut dyn PlacementWorld) {
        let Some(descriptor) = self.selected_placeable.clone() else {
            return;
        };
        let placer_transform = self.placer_transform();
        if let Err(err) = self.placement.start_placing(world, descriptor, &placer_transform) {
            crate::log_warning(&format!("⚠️ Cannot start placing: {}", err));
        }
    }

    fn construct(&mut self, world: &mut dyn PlacementWorld) {
        match self.placement.construct(world) {
            Ok(_) => {
                if self.placement.is_in_place_mode() {
                    self.start_selected_placing(world);
                }
            }
            Err(PlacementError::CannotPlace | PlacementError::NothingToPlace) => {}
            Err(err) => crate::log_warning(&format!("⚠️ Construct failed: {}", err)),
        }
    }

    // --- Placement setup ---

    /// Что ставить при входе в place mode
    pub fn select_placeable(&mut self, descriptor: Option<PlaceableDescriptor>) {
        self.selected_placeable = descriptor;
    }

    pub fn selected_placeable(&self) -> Option<&PlaceableDescriptor> {
        self.selected_placeable.as_ref()
    }

    /// Объект персонажа в placement мире (исключается из raycast)
    pub fn set_placer(&mut self, placer: Option<ObjectHandle>) {
        self.placement.set_placer(placer);
    }

    // --- Pose ---

    pub fn teleport(&mut self, location: Vec3, rotation: Rotator) {
        self.solver.integrator_mut().teleport(location);
        self.state_machine.set_actor_and_target_rotation(rotation.yaw_only());
        self.control_rotation = rotation.normalized();
    }

    pub fn location(&self) -> Vec3 {
        self.solver.integrator().location()
    }

    pub fn velocity(&self) -> Vec3 {
        self.solver.integrator().velocity()
    }

    pub fn actor_rotation(&self) -> Rotator {
        self.state_machine.actor_rotation()
    }

    pub fn transform(&self) -> Transform {
        Transform {
            translation: self.location(),
            rotation: self.actor_rotation().to_quat(),
            scale: Vec3::ONE,
        }
    }

    pub fn placer_transform(&self) -> PlaceableTransform {
        PlaceableTransform::new(self.actor_rotation(), self.location())
    }

    pub fn viewpoint(&self) -> Viewpoint {
        Viewpoint::new(self.location() + Vec3::Z * self.config.eye_height, self.control_rotation)
    }

    pub fn control_rotation(&self) -> Rotator {
        self.control_rotation
    }

    /// Replication / scripted camera
    pub fn set_control_rotation(&mut self, rotation: Rotator) {
        self.control_rotation = Rotator::new(
            rotation.pitch.clamp(-MAX_LOOK_PITCH, MAX_LOOK_PITCH),
            rotation.yaw,
            rotation.roll,
        )
        .normalized();
    }

    // --- Accessors ---

    pub fn config(&self) -> &CharacterConfig {
        &self.config
    }

    pub fn input(&self) -> &CharacterInput {
        &self.input
    }

    pub fn essentials(&self) -> &EssentialValues {
        self.state_machine.essentials()
    }

    pub fn movement_state(&self) -> MovementState {
        self.state_machine.movement_state()
    }

    pub fn gait(&self) -> GaitState {
        self.state_machine.gait()
    }

    pub fn stance(&self) -> StanceState {
        self.state_machine.stance()
    }

    pub fn stance_alpha(&self) -> f32 {
        self.state_machine.stance_alpha()
    }

    pub fn state_machine(&self) -> &MovementStateMachine {
        &self.state_machine
    }

    pub fn solver(&self) -> &AuthoritativeMovementSolver {
        &self.solver
    }

    /// Network glue: take_requests / update_from_compressed_flags
    pub fn solver_mut(&mut self) -> &mut AuthoritativeMovementSolver {
        &mut self.solver
    }

    pub fn placement(&self) -> &PlacementController {
        &self.placement
    }

    pub fn is_in_place_mode(&self) -> bool {
        self.placement.is_in_place_mode()
    }

    pub fn is_placing(&self) -> bool {
        self.placement.is_placing()
    }

    pub fn can_place(&self) -> bool {
        self.placement.can_place()
    }

    /// Без CharacterPlugin вызывать каждый tick: очередь ограничена MAX_QUEUED_EVENTS
    pub fn drain_events(&mut self) -> Vec<MovementEvent> {
        self.state_machine.drain_events()
    }
}
