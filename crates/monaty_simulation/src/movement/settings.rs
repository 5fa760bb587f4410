//! Movement settings model
//!
//! MovementSettings: скорости и кривые одной стойки.
//! MovementModel: пара (standing, crouching), выбирается по ключу из MovementModelTable.
//!
//! Mapped speed: [0, walk] → [0, 1], (walk, sprint] → [1, 2], clamp.
//! Единственный вход всех speed-dependent кривых.

use crate::config::ConfigError;
use crate::movement::state::{GaitState, StanceState};
use crate::shared::{map_range_clamped, CurveKey, FloatCurve, VectorCurve};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementSettings {
    pub walk_speed: f32,
    pub sprint_speed: f32,
    /// mapped speed → (max acceleration, braking deceleration, ground friction)
    pub movement_curve: Option<VectorCurve>,
    /// mapped speed → yaw rate multiplier
    pub rotation_rate_curve: Option<FloatCurve>,
}

impl Default for MovementSettings {
    fn default() -> Self {
        Self {
            walk_speed: 165.0,
            sprint_speed: 375.0,
            movement_curve: None,
            rotation_rate_curve: None,
        }
    }
}

impl MovementSettings {
    /// `GaitState::None` → walk speed
    pub fn speed_for_gait(&self, gait: GaitState) -> f32 {
        match gait {
            GaitState::Sprinting => self.sprint_speed,
            GaitState::Walking | GaitState::None => self.walk_speed,
        }
    }

    pub fn mapped_speed(&self, speed: f32) -> f32 {
        if speed > self.walk_speed {
            map_range_clamped((self.walk_speed, self.sprint_speed), (1.0, 2.0), speed)
        } else {
            map_range_clamped((0.0, self.walk_speed), (0.0, 1.0), speed)
        }
    }

    /// (accel, decel, friction) для mapped speed, `None` без movement curve
    pub fn movement_curve_value(&self, mapped_speed: f32) -> Option<bevy::math::Vec3> {
        self.movement_curve
            .as_ref()
            .and_then(|curve| curve.sample_vec3(mapped_speed))
    }

    /// Множитель yaw rate; без кривой = 1.0
    pub fn rotation_rate(&self, mapped_speed: f32) -> f32 {
        self.rotation_rate_curve
            .as_ref()
            .and_then(|curve| curve.sample(mapped_speed))
            .unwrap_or(1.0)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.walk_speed.is_finite() || !self.sprint_speed.is_finite() {
            return Err(ConfigError::InvalidSettings(format!(
                "speeds must be finite (walk {}, sprint {})",
                self.walk_speed, self.sprint_speed
            )));
        }
        let curves_finite = self.movement_curve.as_ref().map_or(true, |curve| curve.is_finite())
            && self.rotation_rate_curve.as_ref().map_or(true, |curve| curve.is_finite());
        if !curves_finite {
            return Err(ConfigError::InvalidSettings("curve keys must be finite".to_string()));
        }
        if self.walk_speed < 0.0 {
            return Err(ConfigError::InvalidSettings(format!(
                "walk_speed must be >= 0 (got {})",
                self.walk_speed
            )));
        }
        if self.sprint_speed < self.walk_speed {
            return Err(ConfigError::InvalidSettings(format!(
                "sprint_speed ({}) < walk_speed ({})",
                self.sprint_speed, self.walk_speed
            )));
        }
        Ok(())
    }
}

/// Настройки для обеих стоек
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementModel {
    pub standing: MovementSettings,
    pub crouching: MovementSettings,
}

impl Default for MovementModel {
    fn default() -> Self {
        Self {
            standing: MovementSettings {
                walk_speed: 165.0,
                sprint_speed: 375.0,
                movement_curve: Some(VectorCurve::new(vec![
                    CurveKey::new(0.0, [800.0, 800.0, 8.0]),
                    CurveKey::new(1.0, [800.0, 800.0, 8.0]),
                    CurveKey::new(2.0, [1200.0, 400.0, 6.0]),
                ])),
                rotation_rate_curve: Some(FloatCurve::new(vec![
                    CurveKey::new(0.0, 5.0),
                    CurveKey::new(1.0, 10.0),
                    CurveKey::new(2.0, 15.0),
                ])),
            },
            crouching: MovementSettings {
                walk_speed: 150.0,
                sprint_speed: 300.0,
                movement_curve: Some(VectorCurve::new(vec![
                    CurveKey::new(0.0, [600.0, 600.0, 8.0]),
                    CurveKey::new(2.0, [600.0, 600.0, 8.0]),
                ])),
                rotation_rate_curve: Some(FloatCurve::new(vec![
                    CurveKey::new(0.0, 5.0),
                    CurveKey::new(2.0, 10.0),
                ])),
            },
        }
    }
}

impl MovementModel {
    pub fn settings_for(&self, stance: StanceState) -> &MovementSettings {
        match stance {
            StanceState::Standing => &self.standing,
            StanceState::Crouching => &self.crouching,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.standing.validate()?;
        self.crouching.validate()
    }
}

/// Keyed lookup movement models (movement_models.toml)
///
/// Формат: одна таблица на модель, подтаблицы `standing` / `crouching`:
/// ```toml
/// [Normal.standing]
/// walk_speed = 165.0
/// sprint_speed = 375.0
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovementModelTable {
    models: HashMap<String, MovementModel>,
}

impl MovementModelTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::parse(&content, &path.display().to_string())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, "<inline>")
    }

    fn parse(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let table: MovementModelTable =
            toml::from_str(content).map_err(|e| ConfigError::Parse(origin.to_string(), e))?;
        for (key, model) in &table.models {
            model.validate().map_err(|e| match e {
                ConfigError::InvalidSettings(reason) => {
                    ConfigError::InvalidSettings(format!("model '{}': {}", key, reason))
                }
                other => other,
            })?;
        }
        Ok(table)
    }

    /// Таблица с единственной моделью `Normal` (MovementModel::default)
    pub fn with_default_model() -> Self {
        let mut table = Self::new();
        table.models.insert("Normal".to_string(), MovementModel::default());
        table
    }

    pub fn insert(&mut self, key: impl Into<String>, model: MovementModel) -> Result<(), ConfigError> {
        model.validate()?;
        self.models.insert(key.into(), model);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<&MovementModel, ConfigError> {
        self.models
            .get(key)
            .ok_or_else(|| ConfigError::MissingMovementModel(key.to_string()))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
