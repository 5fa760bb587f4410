//! MovementStateMachine: per-frame movement pipeline персонажа
//!
//! Владеет {MovementState, GaitState, StanceState}, essential values и rotation.
//! Порядок tick'а (`update`):
//! 1. essential values (фиксированный порядок внутри)
//! 2. Grounded: gait (allowed → actual), settings + max walk speed → solver, grounded rotation
//!    InAir: in-air rotation
//! 3. stance timeline
//! 4. кэш previous velocity / aim yaw
//!
//! Смена состояния только при реальной смене значения: previous сохраняется,
//! в очередь кладётся MovementEvent. Повторный set того же значения: no-op.

use crate::config::{CharacterConfig, GaitConfig, RotationConfig};
use crate::movement::essentials::{EssentialValues, KinematicSample};
use crate::movement::events::MovementEvent;
use crate::movement::rotation::{rinterp_constant_to, rinterp_to};
use crate::movement::settings::{MovementModel, MovementSettings};
use crate::movement::stance::StanceTimeline;
use crate::movement::state::{GaitState, MovementState, StanceState, StateChange};
use crate::physics::AuthoritativeMovementSolver;
use crate::shared::{map_range_clamped, normalize_axis, FloatCurve, Rotator};
use bevy::prelude::*;
use std::collections::VecDeque;

/// Очередь событий без drain_events (headless без плагина) не растёт дальше этого;
/// самые старые события вытесняются.
pub const MAX_QUEUED_EVENTS: usize = 64;

#[derive(Debug, Clone)]
pub struct MovementStateMachine {
    rotation_config: RotationConfig,
    gait_config: GaitConfig,
    stance_curve: FloatCurve,

    movement_state: MovementState,
    previous_movement_state: MovementState,
    gait: GaitState,
    previous_gait: GaitState,
    stance: StanceState,
    previous_stance: StanceState,
    desired_gait: GaitState,
    desired_stance: StanceState,

    essentials: EssentialValues,
    actor_rotation: Rotator,
    target_rotation: Rotator,
    in_air_rotation: Rotator,
    previous_velocity: Vec3,
    previous_aim_yaw: f32,

    model: MovementModel,
    stance_timeline: StanceTimeline,
    events: VecDeque<MovementEvent>,
}

impl MovementStateMachine {
    pub fn new(config: &CharacterConfig) -> Self {
        Self {
            rotation_config: config.rotation.clone(),
            gait_config: config.gait.clone(),
            stance_curve: config.stance.curve.clone(),
            movement_state: MovementState::None,
            previous_movement_state: MovementState::None,
            gait: GaitState::Walking,
            previous_gait: GaitState::Walking,
            stance: StanceState::Standing,
            previous_stance: StanceState::Standing,
            desired_gait: GaitState::Walking,
            desired_stance: StanceState::Standing,
            essentials: EssentialValues::default(),
            actor_rotation: Rotator::ZERO,
            target_rotation: Rotator::ZERO,
            in_air_rotation: Rotator::ZERO,
            previous_velocity: Vec3::ZERO,
            previous_aim_yaw: 0.0,
            model: MovementModel::default(),
            stance_timeline: StanceTimeline::new(config.stance.transition_duration),
            events: VecDeque::new(),
        }
    }

    // --- State transitions ---

    /// true если значение изменилось (и событие поставлено в очередь)
    pub fn set_state(&mut self, change: StateChange) -> bool {
        match change {
            StateChange::Movement(new_state) => {
                if new_state == self.movement_state {
                    return false;
                }
                self.previous_movement_state = self.movement_state;
                self.movement_state = new_state;
                self.queue_event(MovementEvent::MovementStateChanged {
                    previous: self.previous_movement_state,
                    current: new_state,
                });
                self.on_movement_state_changed();
            }
            StateChange::Gait(new_gait) => {
                if new_gait == self.gait {
                    return false;
                }
                self.previous_gait = self.gait;
                self.gait = new_gait;
                self.queue_event(MovementEvent::GaitChanged {
                    previous: self.previous_gait,
                    current: new_gait,
                });
            }
            StateChange::Stance(new_stance) => {
                if new_stance == self.stance {
                    return false;
                }
                self.previous_stance = self.stance;
                self.stance = new_stance;
                self.desired_stance = new_stance;
                self.queue_event(MovementEvent::StanceChanged {
                    previous: self.previous_stance,
                    current: new_stance,
                });
                self.on_stance_changed();
            }
        }
        true
    }

    pub fn set_movement_state(&mut self, state: MovementState) -> bool {
        self.set_state(StateChange::Movement(state))
    }

    pub fn set_gait(&mut self, gait: GaitState) -> bool {
        self.set_state(StateChange::Gait(gait))
    }

    pub fn set_stance(&mut self, stance: StanceState) -> bool {
        self.set_state(StateChange::Stance(stance))
    }

    fn on_movement_state_changed(&mut self) {
        crate::log(&format!(
            "Movement: {:?} → {:?}",
            self.previous_movement_state, self.movement_state
        ));
        if self.movement_state == MovementState::InAir {
            self.capture_in_air_rotation();
            if self.stance == StanceState::Crouching {
                self.set_stance(StanceState::Standing);
            }
        }
    }

    fn on_stance_changed(&mut self) {
        match self.stance {
            StanceState::Crouching => self.stance_timeline.play(),
            StanceState::Standing => self.stance_timeline.reverse(),
        }
    }

    /// Прыжок начат: in-air rotation по тому же правилу что и при отрыве
    pub fn on_jumped(&mut self) {
        self.capture_in_air_rotation();
    }

    fn capture_in_air_rotation(&mut self) {
        self.in_air_rotation = if self.essentials.speed > self.rotation_config.in_air_launch_speed {
            self.essentials.last_velocity_rotation
        } else {
            self.actor_rotation
        };
    }

    /// Stance toggle: только на земле; crouch запрещён во время sprint
    pub fn toggle_stance(&mut self) -> bool {
        if self.movement_state != MovementState::Grounded {
            return false;
        }
        let next = self.stance.toggled();
        if next == StanceState::Crouching && self.gait == GaitState::Sprinting {
            return false;
        }
        self.set_stance(next)
    }

    pub fn set_desired_gait(&mut self, gait: GaitState) {
        self.desired_gait = gait;
    }

    // --- Gait ---

    pub fn can_sprint(&self) -> bool {
        if !self.essentials.has_movement_input {
            return false;
        }
        let acceleration_rotation = Rotator::from_direction(self.essentials.current_acceleration);
        let yaw_delta = normalize_axis(acceleration_rotation.yaw - self.essentials.aiming_rotation.yaw);
        self.essentials.movement_input_amount > self.gait_config.sprint_input_threshold
            && yaw_delta.abs() <= self.gait_config.sprint_yaw_tolerance
    }

    pub fn compute_allowed_gait(&self) -> GaitState {
        if self.stance == StanceState::Standing && self.desired_gait != GaitState::Walking {
            if self.can_sprint() {
                return GaitState::Sprinting;
            }
            return GaitState::None;
        }
        self.desired_gait
    }

    pub fn compute_actual_gait(&self) -> GaitState {
        let sprint_speed = self.current_settings().sprint_speed;
        if self.essentials.speed > sprint_speed + self.gait_config.actual_gait_hysteresis {
            GaitState::Sprinting
        } else {
            GaitState::Walking
        }
    }

    // --- Settings ---

    pub fn set_movement_model(&mut self, model: MovementModel) {
        self.model = model;
    }

    pub fn movement_model(&self) -> &MovementModel {
        &self.model
    }

    pub fn current_settings(&self) -> &MovementSettings {
        self.model.settings_for(self.stance)
    }

    // --- Per-frame ---

    pub fn update_essential_values(&mut self, dt: f32, sample: &KinematicSample) {
        self.essentials.update(
            dt,
            sample,
            self.previous_velocity,
            self.previous_aim_yaw,
            self.rotation_config.aiming_interp_speed,
        );
    }

    /// Gait + settings → solver (только Grounded)
    pub fn update_character_movement(&mut self, solver: &mut AuthoritativeMovementSolver) {
        let allowed_gait = self.compute_allowed_gait();
        let actual_gait = self.compute_actual_gait();
        self.set_gait(actual_gait);

        let settings = self.current_settings().clone();
        let max_walk_speed = settings.speed_for_gait(allowed_gait);
        solver.set_movement_settings(settings);
        solver.set_max_walking_speed(max_walk_speed);
    }

    pub fn calculate_grounded_rotation_rate(&self) -> f32 {
        let settings = self.current_settings();
        let mapped_speed = settings.mapped_speed(self.essentials.speed);
        settings.rotation_rate(mapped_speed)
            * map_range_clamped(self.rotation_config.aim_yaw_rate_range, (1.0, 3.0), self.essentials.aim_yaw_rate)
    }

    pub fn update_grounded_rotation(&mut self, dt: f32) {
        let rotation = &self.rotation_config;
        let moving_with_input = self.essentials.is_moving && self.essentials.has_movement_input;
        if moving_with_input || self.essentials.speed > rotation.grounded_speed_threshold {
            let target = Rotator::from_yaw(self.essentials.aiming_rotation.yaw);
            let target_speed = rotation.target_interp_speed;
            let actor_speed = self.calculate_grounded_rotation_rate();
            self.smooth_character_rotation(target, target_speed, actor_speed, dt);
        } else {
            let band = rotation.limit_yaw_band;
            let speed = rotation.limit_interp_speed;
            self.limit_rotation(-band, band, speed, dt);
        }
    }

    pub fn update_in_air_rotation(&mut self, dt: f32) {
        let target = Rotator::from_yaw(self.in_air_rotation.yaw);
        let speed = self.rotation_config.in_air_interp_speed;
        self.smooth_character_rotation(target, 0.0, speed, dt);
    }

    /// Если actor вне [aim + min, aim + max], поворачиваем к ближайшей границе
    pub fn limit_rotation(&mut self, aim_yaw_min: f32, aim_yaw_max: f32, interp_speed: f32, dt: f32) {
        let delta = self.essentials.aiming_rotation.delta(self.actor_rotation).yaw;
        if delta < aim_yaw_min || delta > aim_yaw_max {
            let bound = if delta > 0.0 { aim_yaw_min } else { aim_yaw_max };
            let target = Rotator::from_yaw(self.essentials.aiming_rotation.yaw + bound);
            self.smooth_character_rotation(target, 0.0, interp_speed, dt);
        }
    }

    /// target ← constant interp к `target`, actor ← exponential interp к target
    pub fn smooth_character_rotation(&mut self, target: Rotator, target_speed: f32, actor_speed: f32, dt: f32) {
        self.target_rotation = rinterp_constant_to(self.target_rotation, target, dt, target_speed);
        self.actor_rotation = rinterp_to(self.actor_rotation, self.target_rotation, dt, actor_speed);
    }

    pub fn update(&mut self, dt: f32, sample: &KinematicSample, solver: &mut AuthoritativeMovementSolver) {
        self.update_essential_values(dt, sample);

        match self.movement_state {
            MovementState::Grounded => {
                self.update_character_movement(solver);
                self.update_grounded_rotation(dt);
            }
            MovementState::InAir => self.update_in_air_rotation(dt),
            MovementState::None => {}
        }

        self.stance_timeline.tick(dt);

        self.previous_velocity = self.essentials.velocity;
        self.previous_aim_yaw = self.essentials.aiming_rotation.yaw;
    }

    /// Teleport support: actor и target rotation одновременно
    pub fn set_actor_and_target_rotation(&mut self, rotation: Rotator) {
        self.actor_rotation = rotation.normalized();
        self.target_rotation = self.actor_rotation;
    }

    // --- Accessors ---

    pub fn essentials(&self) -> &EssentialValues {
        &self.essentials
    }

    /// Прямой доступ для сетевого слоя / тестов (replicated values)
    pub fn essentials_mut(&mut self) -> &mut EssentialValues {
        &mut self.essentials
    }

    pub fn movement_state(&self) -> MovementState {
        self.movement_state
    }

    pub fn previous_movement_state(&self) -> MovementState {
        self.previous_movement_state
    }

    pub fn gait(&self) -> GaitState {
        self.gait
    }

    pub fn previous_gait(&self) -> GaitState {
        self.previous_gait
    }

    pub fn desired_gait(&self) -> GaitState {
        self.desired_gait
    }

    pub fn stance(&self) -> StanceState {
        self.stance
    }

    pub fn previous_stance(&self) -> StanceState {
        self.previous_stance
    }

    pub fn desired_stance(&self) -> StanceState {
        self.desired_stance
    }

    pub fn actor_rotation(&self) -> Rotator {
        self.actor_rotation
    }

    pub fn target_rotation(&self) -> Rotator {
        self.target_rotation
    }

    pub fn in_air_rotation(&self) -> Rotator {
        self.in_air_rotation
    }

    pub fn stance_timeline(&self) -> &StanceTimeline {
        &self.stance_timeline
    }

    /// 0 = стоит, 1 = полностью присел
    pub fn stance_alpha(&self) -> f32 {
        self.stance_timeline.sample(&self.stance_curve)
    }

    /// Вызывать каждый tick (CharacterPlugin делает это в publish_character_state)
    pub fn drain_events(&mut self) -> Vec<MovementEvent> {
        self.events.drain(..).collect()
    }

    fn queue_event(&mut self, event: MovementEvent) {
        if self.events.len() >= MAX_QUEUED_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}
