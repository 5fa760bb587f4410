//! Rotator: ориентация в градусах (pitch/yaw/roll)
//!
//! Конвенция мира: Z вверх, X вперёд при yaw = 0, Y вправо при yaw = 90.
//! Положительный pitch смотрит вверх.

use bevy::prelude::*;
use std::ops::{Add, Sub};

/// Нормализует угол в диапазон (-180, 180]
pub fn normalize_axis(angle: f32) -> f32 {
    let mut wrapped = angle % 360.0;
    if wrapped < 0.0 {
        wrapped += 360.0;
    }
    if wrapped > 180.0 {
        wrapped -= 360.0;
    }
    wrapped
}

/// Линейно отображает `value` из `input` в `output` с clamp по входному диапазону.
///
/// Вырожденный входной диапазон (min == max) даёт край выхода: верхний если
/// `value > max`, иначе нижний.
pub fn map_range_clamped(input: (f32, f32), output: (f32, f32), value: f32) -> f32 {
    let (in_min, in_max) = input;
    let (out_min, out_max) = output;
    let divisor = in_max - in_min;
    let pct = if divisor.abs() > f32::EPSILON {
        (value - in_min) / divisor
    } else if value > in_max {
        1.0
    } else {
        0.0
    };
    out_min + (out_max - out_min) * pct.clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub struct Rotator {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Rotator {
    pub const ZERO: Rotator = Rotator {
        pitch: 0.0,
        yaw: 0.0,
        roll: 0.0,
    };

    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    pub fn from_yaw(yaw: f32) -> Self {
        Self::new(0.0, yaw, 0.0)
    }

    /// Ориентация вектора направления. Roll всегда 0, нулевой вектор → ZERO.
    pub fn from_direction(direction: Vec3) -> Self {
        if direction.length_squared() <= f32::EPSILON {
            return Self::ZERO;
        }
        let horizontal = Vec2::new(direction.x, direction.y).length();
        Self {
            pitch: direction.z.atan2(horizontal).to_degrees(),
            yaw: direction.y.atan2(direction.x).to_degrees(),
            roll: 0.0,
        }
    }

    pub fn normalized(self) -> Self {
        Self {
            pitch: normalize_axis(self.pitch),
            yaw: normalize_axis(self.yaw),
            roll: normalize_axis(self.roll),
        }
    }

    /// Только yaw-составляющая (pitch/roll обнулены)
    pub fn yaw_only(self) -> Self {
        Self::from_yaw(self.yaw)
    }

    /// Кратчайшая разница `self - other` по каждой оси
    pub fn delta(self, other: Rotator) -> Self {
        (self - other).normalized()
    }

    pub fn is_nearly_zero(self, tolerance: f32) -> bool {
        let n = self.normalized();
        n.pitch.abs() <= tolerance && n.yaw.abs() <= tolerance && n.roll.abs() <= tolerance
    }

    pub fn equals(self, other: Rotator, tolerance: f32) -> bool {
        self.delta(other).is_nearly_zero(tolerance)
    }

    /// Единичный вектор взгляда (учитывает pitch)
    pub fn forward(self) -> Vec3 {
        let (sp, cp) = self.pitch.to_radians().sin_cos();
        let (sy, cy) = self.yaw.to_radians().sin_cos();
        Vec3::new(cp * cy, cp * sy, sp)
    }

    /// Горизонтальный вектор вправо (yaw + 90)
    pub fn right(self) -> Vec3 {
        let (sy, cy) = self.yaw.to_radians().sin_cos();
        Vec3::new(-sy, cy, 0.0)
    }

    pub fn to_quat(self) -> Quat {
        Quat::from_euler(
            EulerRot::ZYX,
            self.yaw.to_radians(),
            -self.pitch.to_radians(),
            self.roll.to_radians(),
        )
    }
}

impl Add for Rotator {
    type Output = Rotator;

    fn add(self, rhs: Rotator) -> Rotator {
        Rotator::new(self.pitch + rhs.pitch, self.yaw + rhs.yaw, self.roll + rhs.roll)
    }
}

impl Sub for Rotator {
    type Output = Rotator;

    fn sub(self, rhs: Rotator) -> Rotator {
        Rotator::new(self.pitch - rhs.pitch, self.yaw - rhs.yaw, self.roll - rhs.roll)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_axis_range() {
        assert_eq!(normalize_axis(0.0), 0.0);
        assert_eq!(normalize_axis(180.0), 180.0);
        assert_eq!(normalize_axis(-180.0), 180.0);
        assert_eq!(normalize_axis(190.0), -170.0);
        assert_eq!(normalize_axis(-190.0), 170.0);
        assert_eq!(normalize_axis(720.0 + 45.0), 45.0);
    }

    #[test]
    fn test_delta_takes_shortest_path() {
        let a = Rotator::from_yaw(170.0);
        let b = Rotator::from_yaw(-170.0);
        assert!((a.delta(b).yaw - (-20.0)).abs() < 1e-4);
        assert!((b.delta(a).yaw - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_from_direction_yaw() {
        assert!((Rotator::from_direction(Vec3::X).yaw).abs() < 1e-4);
        assert!((Rotator::from_direction(Vec3::Y).yaw - 90.0).abs() < 1e-4);
        assert!((Rotator::from_direction(Vec3::Z).pitch - 90.0).abs() < 1e-4);
        assert_eq!(Rotator::from_direction(Vec3::ZERO), Rotator::ZERO);
    }

    #[test]
    fn test_forward_matches_quat() {
        let rot = Rotator::new(30.0, 60.0, 0.0);
        let via_quat = rot.to_quat() * Vec3::X;
        assert!((via_quat - rot.forward()).length() < 1e-4, "{:?} vs {:?}", via_quat, rot.forward());
    }

    #[test]
    fn test_map_range_clamped_degenerate_range() {
        assert_eq!(map_range_clamped((0.0, 0.0), (0.0, 1.0), -1.0), 0.0);
        assert_eq!(map_range_clamped((0.0, 0.0), (0.0, 1.0), 0.0), 0.0);
        assert_eq!(map_range_clamped((0.0, 0.0), (0.0, 1.0), 5.0), 1.0);
        assert_eq!(map_range_clamped((0.0, 300.0), (1.0, 3.0), 150.0), 2.0);
        assert_eq!(map_range_clamped((0.0, 300.0), (1.0, 3.0), 900.0), 3.0);
    }
}
