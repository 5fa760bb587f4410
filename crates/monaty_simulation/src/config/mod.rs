//! Character configuration (character.toml)
//!
//! Все поля имеют defaults: пустой файл = валидная конфигурация.
//! Movement model таблица грузится отдельно (`MovementModelTable`), здесь только ключ.

use crate::shared::{CurveKey, FloatCurve};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Input rates (множители осей LookUp / LookRight)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookConfig {
    pub look_up_rate: f32,
    pub look_right_rate: f32,
}

impl Default for LookConfig {
    fn default() -> Self {
        Self {
            look_up_rate: 1.25,
            look_right_rate: 1.25,
        }
    }
}

/// Скорости интерполяции поворота и пороги grounded/in-air rotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Aiming rotation → control rotation
    pub aiming_interp_speed: f32,
    /// Target rotation → desired (constant rate)
    pub target_interp_speed: f32,
    /// Полуширина yaw band вокруг aim (LimitRotation)
    pub limit_yaw_band: f32,
    pub limit_interp_speed: f32,
    pub in_air_interp_speed: f32,
    /// Выше этой скорости персонаж поворачивается к aim даже без input
    pub grounded_speed_threshold: f32,
    /// Выше этой скорости in-air rotation = направление скорости
    pub in_air_launch_speed: f32,
    /// Входной диапазон aim yaw rate (deg/sec) для множителя [1, 3]
    pub aim_yaw_rate_range: (f32, f32),
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            aiming_interp_speed: 30.0,
            target_interp_speed: 500.0,
            limit_yaw_band: 100.0,
            limit_interp_speed: 20.0,
            in_air_interp_speed: 5.0,
            grounded_speed_threshold: 150.0,
            in_air_launch_speed: 100.0,
            aim_yaw_rate_range: (0.0, 300.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaitConfig {
    pub sprint_input_threshold: f32,
    /// Максимальный |yaw delta| между acceleration и aim для спринта (градусы)
    pub sprint_yaw_tolerance: f32,
    /// Hysteresis над sprint speed для actual gait
    pub actual_gait_hysteresis: f32,
}

impl Default for GaitConfig {
    fn default() -> Self {
        Self {
            sprint_input_threshold: 0.9,
            sprint_yaw_tolerance: 50.0,
            actual_gait_hysteresis: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StanceConfig {
    /// Длительность stand ↔ crouch перехода (секунды)
    pub transition_duration: f32,
    /// progress [0, 1] → stance alpha
    pub curve: FloatCurve,
}

impl Default for StanceConfig {
    fn default() -> Self {
        Self {
            transition_duration: 0.2,
            curve: FloatCurve::new(vec![CurveKey::new(0.0, 0.0), CurveKey::new(1.0, 1.0)]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub trace_distance: f32,
    /// Добавка к yaw viewpoint (помимо фиксированных +90)
    pub yaw_offset: f32,
    pub z_bias: f32,
    pub transform_tolerance: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            trace_distance: 1500.0,
            yaw_offset: 0.0,
            z_bias: 0.0,
            transform_tolerance: 0.01,
        }
    }
}

/// Конфигурация персонажа (character.toml)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterConfig {
    /// Ключ в MovementModelTable
    pub movement_model: String,
    /// Высота viewpoint над location (cm)
    pub eye_height: f32,
    pub look: LookConfig,
    pub rotation: RotationConfig,
    pub gait: GaitConfig,
    pub stance: StanceConfig,
    pub placement: PlacementConfig,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            movement_model: "Normal".to_string(),
            eye_height: 160.0,
            look: LookConfig::default(),
            rotation: RotationConfig::default(),
            gait: GaitConfig::default(),
            stance: StanceConfig::default(),
            placement: PlacementConfig::default(),
        }
    }
}

impl CharacterConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::parse(&content, &path.display().to_string())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, "<inline>")
    }

    fn parse(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: CharacterConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(origin.to_string(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stance.transition_duration < 0.0 {
            return Err(ConfigError::InvalidSettings(format!(
                "stance.transition_duration must be >= 0 (got {})",
                self.stance.transition_duration
            )));
        }
        if self.placement.trace_distance <= 0.0 {
            return Err(ConfigError::InvalidSettings(format!(
                "placement.trace_distance must be > 0 (got {})",
                self.placement.trace_distance
            )));
        }
        if self.rotation.limit_yaw_band < 0.0 || self.rotation.limit_yaw_band > 180.0 {
            return Err(ConfigError::InvalidSettings(format!(
                "rotation.limit_yaw_band must be within [0, 180] (got {})",
                self.rotation.limit_yaw_band
            )));
        }
        Ok(())
    }
}

/// Ошибки загрузки конфигурации и movement model таблиц
#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    /// (origin, error): origin = путь файла или `<inline>`
    Parse(String, toml::de::Error),
    /// Movement model ключ отсутствует в таблице
    MissingMovementModel(String),
    InvalidSettings(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Failed to read {}: {}", path.display(), e),
            ConfigError::Parse(origin, e) => write!(f, "Failed to parse {}: {}", origin, e),
            ConfigError::MissingMovementModel(key) => {
                write!(f, "Movement model '{}' not found", key)
            }
            ConfigError::InvalidSettings(reason) => write!(f, "Invalid settings: {}", reason),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(_, e) => Some(e),
            ConfigError::Parse(_, e) => Some(e),
            _ => None,
        }
    }
}
