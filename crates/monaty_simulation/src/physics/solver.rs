//! AuthoritativeMovementSolver: caps поверх внешнего интегратора
//!
//! Override points:
//! - max acceleration / braking deceleration / ground friction = movement curve(mapped speed)
//!   пока персонаж на земле и кривая задана, иначе defaults интегратора
//! - max walk speed: через authority protocol (Role)
//!
//! Authority protocol:
//! - LocalPredicted: запоминаем скорость, ставим request flag, кладём SettingsChangeRequest
//!   в outbox. Caps меняются только когда сервер вернёт flag (update_from_compressed_flags).
//! - Remote: caps применяются сразу.
//! - Authoritative: прямых изменений нет; значение приходит через receive_settings_request,
//!   применяется в on_movement_updated когда flags клиента просят.
//! - ListenServer: тот же путь запроса, но сервер: мы сами: echo сразу.

use crate::movement::settings::MovementSettings;
use crate::physics::integrator::{MovementCaps, PhysicsIntegrator};
use bevy::prelude::*;

/// Бит "settings change requested" в compressed move flags
pub const FLAG_SETTINGS_CHANGE: u8 = 1 << 4;

/// Роль экземпляра персонажа в client/server split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub enum Role {
    /// Владеющий клиент (prediction)
    #[default]
    LocalPredicted,
    /// Simulated proxy на чужом клиенте
    Remote,
    /// Серверная копия персонажа удалённого клиента
    Authoritative,
    /// Сервер и владелец одновременно
    ListenServer,
}

impl Role {
    pub fn is_locally_controlled(self) -> bool {
        matches!(self, Role::LocalPredicted | Role::ListenServer)
    }

    pub fn has_authority(self) -> bool {
        matches!(self, Role::Authoritative | Role::ListenServer)
    }
}

/// Reliable, ordered, fire-and-forget запрос клиент → сервер
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettingsChangeRequest {
    pub max_walk_speed: f32,
}

pub struct AuthoritativeMovementSolver {
    role: Role,
    integrator: Box<dyn PhysicsIntegrator>,
    settings: MovementSettings,
    new_max_walk_speed: f32,
    /// Исходящий flag (compressed_flags)
    request_settings_change: bool,
    /// Flag от counterpart'а: применять new_max_walk_speed в on_movement_updated
    apply_settings_change: bool,
    outbox: Vec<SettingsChangeRequest>,
    max_walk_speed: f32,
    max_walk_speed_crouched: f32,
}

impl AuthoritativeMovementSolver {
    pub fn new(role: Role, integrator: Box<dyn PhysicsIntegrator>) -> Self {
        let defaults = integrator.default_caps();
        Self {
            role,
            integrator,
            settings: MovementSettings::default(),
            new_max_walk_speed: 0.0,
            request_settings_change: false,
            apply_settings_change: false,
            outbox: Vec::new(),
            max_walk_speed: defaults.max_walk_speed,
            max_walk_speed_crouched: defaults.max_walk_speed_crouched,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn integrator(&self) -> &dyn PhysicsIntegrator {
        self.integrator.as_ref()
    }

    pub fn integrator_mut(&mut self) -> &mut dyn PhysicsIntegrator {
        self.integrator.as_mut()
    }

    pub fn settings(&self) -> &MovementSettings {
        &self.settings
    }

    pub fn set_movement_settings(&mut self, settings: MovementSettings) {
        self.settings = settings;
    }

    pub fn mapped_speed(&self) -> f32 {
        let velocity = self.integrator.velocity();
        self.settings.mapped_speed(Vec2::new(velocity.x, velocity.y).length())
    }

    fn curve_caps(&self) -> Option<Vec3> {
        if !self.integrator.is_moving_on_ground() {
            return None;
        }
        self.settings.movement_curve_value(self.mapped_speed())
    }

    pub fn max_acceleration(&self) -> f32 {
        self.curve_caps()
            .map(|v| v.x)
            .unwrap_or_else(|| self.integrator.default_caps().max_acceleration)
    }

    pub fn max_braking_deceleration(&self) -> f32 {
        self.curve_caps()
            .map(|v| v.y)
            .unwrap_or_else(|| self.integrator.default_caps().max_braking_deceleration)
    }

    pub fn ground_friction(&self) -> f32 {
        self.curve_caps()
            .map(|v| v.z)
            .unwrap_or_else(|| self.integrator.default_caps().ground_friction)
    }

    pub fn max_walk_speed(&self) -> f32 {
        self.max_walk_speed
    }

    pub fn max_walk_speed_crouched(&self) -> f32 {
        self.max_walk_speed_crouched
    }

    /// Последнее запрошенное значение (ещё не обязательно применённое)
    pub fn pending_max_walk_speed(&self) -> f32 {
        self.new_max_walk_speed
    }

    pub fn is_settings_change_requested(&self) -> bool {
        self.request_settings_change
    }

    pub fn caps(&self) -> MovementCaps {
        let curve = self.curve_caps();
        let defaults = self.integrator.default_caps();
        MovementCaps {
            max_walk_speed: self.max_walk_speed,
            max_walk_speed_crouched: self.max_walk_speed_crouched,
            max_acceleration: curve.map(|v| v.x).unwrap_or(defaults.max_acceleration),
            max_braking_deceleration: curve.map(|v| v.y).unwrap_or(defaults.max_braking_deceleration),
            ground_friction: curve.map(|v| v.z).unwrap_or(defaults.ground_friction),
        }
    }

    pub fn set_max_walking_speed(&mut self, speed: f32) {
        if speed == self.new_max_walk_speed {
            return;
        }
        match self.role {
            Role::LocalPredicted => self.request_max_walk_speed(speed),
            Role::Remote => {
                self.new_max_walk_speed = speed;
                self.max_walk_speed = speed;
                self.max_walk_speed_crouched = speed;
            }
            Role::Authoritative => {}
            Role::ListenServer => {
                self.request_max_walk_speed(speed);
                self.receive_settings_request(SettingsChangeRequest { max_walk_speed: speed });
                self.update_from_compressed_flags(FLAG_SETTINGS_CHANGE);
            }
        }
    }

    fn request_max_walk_speed(&mut self, speed: f32) {
        self.new_max_walk_speed = speed;
        self.request_settings_change = true;
        // Новый запрос вытесняет ещё не отправленный
        self.outbox.clear();
        self.outbox.push(SettingsChangeRequest { max_walk_speed: speed });
        crate::log(&format!("🏃 Settings change requested: max walk speed {:.1}", speed));
    }

    /// Серверный handler запроса клиента
    pub fn receive_settings_request(&mut self, request: SettingsChangeRequest) {
        self.new_max_walk_speed = request.max_walk_speed;
    }

    /// Исходящие запросы для transport (drain)
    pub fn take_requests(&mut self) -> Vec<SettingsChangeRequest> {
        std::mem::take(&mut self.outbox)
    }

    pub fn compressed_flags(&self) -> u8 {
        if self.request_settings_change {
            FLAG_SETTINGS_CHANGE
        } else {
            0
        }
    }

    /// Flags от counterpart'а (клиентские moves на сервере, echo на клиенте)
    ///
    /// LocalPredicted: echo подтверждает только текущий запрос; без запроса echo игнорируется.
    pub fn update_from_compressed_flags(&mut self, flags: u8) {
        let requested = flags & FLAG_SETTINGS_CHANGE != 0;
        match self.role {
            Role::LocalPredicted => {
                if requested && self.request_settings_change {
                    self.request_settings_change = false;
                    self.apply_settings_change = true;
                }
            }
            _ => self.apply_settings_change = requested,
        }
    }

    /// Применяет pending скорость один раз на каждый полученный flag
    pub fn on_movement_updated(&mut self) {
        if self.apply_settings_change {
            self.max_walk_speed = self.new_max_walk_speed;
            self.max_walk_speed_crouched = self.new_max_walk_speed;
            self.apply_settings_change = false;
        }
    }

    pub fn step(&mut self, dt: f32) {
        let caps = self.caps();
        self.integrator.step(dt, &caps);
        self.on_movement_updated();
    }
}

impl std::fmt::Debug for AuthoritativeMovementSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthoritativeMovementSolver")
            .field("role", &self.role)
            .field("new_max_walk_speed", &self.new_max_walk_speed)
            .field("request_settings_change", &self.request_settings_change)
            .field("apply_settings_change", &self.apply_settings_change)
            .field("max_walk_speed", &self.max_walk_speed)
            .field("max_walk_speed_crouched", &self.max_walk_speed_crouched)
            .field("location", &self.integrator.location())
            .field("velocity", &self.integrator.velocity())
            .finish()
    }
}
