//! Keyed curves (piecewise-linear)
//!
//! Используются для всех speed-dependent lookups: mapped speed → (accel, decel, friction),
//! mapped speed → rotation rate multiplier, stance progress → stance alpha.
//!
//! Вне диапазона ключей значение clamp'ится к крайнему ключу.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Значение, которое можно линейно интерполировать между ключами
pub trait CurveValue: Copy {
    fn lerp(a: Self, b: Self, t: f32) -> Self;

    fn is_finite(&self) -> bool;
}

impl CurveValue for f32 {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a + (b - a) * t
    }

    fn is_finite(&self) -> bool {
        f32::is_finite(*self)
    }
}

impl CurveValue for [f32; 3] {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        [
            <f32 as CurveValue>::lerp(a[0], b[0], t),
            <f32 as CurveValue>::lerp(a[1], b[1], t),
            <f32 as CurveValue>::lerp(a[2], b[2], t),
        ]
    }

    fn is_finite(&self) -> bool {
        self.iter().all(|v| v.is_finite())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveKey<T> {
    pub time: f32,
    pub value: T,
}

impl<T> CurveKey<T> {
    pub fn new(time: f32, value: T) -> Self {
        Self { time, value }
    }
}

/// Ключи всегда отсортированы по `time` (сортировка при создании/десериализации).
/// Десериализация отклоняет non-finite time / value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CurveKey<T>>", into = "Vec<CurveKey<T>>")]
#[serde(bound(deserialize = "T: CurveValue + Deserialize<'de>"))]
pub struct Curve<T: Clone> {
    keys: Vec<CurveKey<T>>,
}

pub type FloatCurve = Curve<f32>;

/// Три канала на ключ: (x, y, z)
pub type VectorCurve = Curve<[f32; 3]>;

impl<T: CurveValue> TryFrom<Vec<CurveKey<T>>> for Curve<T> {
    type Error = String;

    fn try_from(keys: Vec<CurveKey<T>>) -> Result<Self, Self::Error> {
        if let Some(key) = keys.iter().find(|key| !key.time.is_finite() || !key.value.is_finite()) {
            return Err(format!("curve key must be finite (time = {})", key.time));
        }
        Ok(Self::sorted(keys))
    }
}

impl<T: Clone> Default for Curve<T> {
    fn default() -> Self {
        Self { keys: Vec::new() }
    }
}

impl<T: Clone> From<Curve<T>> for Vec<CurveKey<T>> {
    fn from(curve: Curve<T>) -> Self {
        curve.keys
    }
}

impl<T: CurveValue> Curve<T> {
    pub fn new(keys: Vec<CurveKey<T>>) -> Self {
        Self::sorted(keys)
    }

    fn sorted(mut keys: Vec<CurveKey<T>>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    pub fn keys(&self) -> &[CurveKey<T>] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn is_finite(&self) -> bool {
        self.keys.iter().all(|key| key.time.is_finite() && key.value.is_finite())
    }

    /// `None` только для пустой кривой
    pub fn sample(&self, time: f32) -> Option<T> {
        let first = self.keys.first()?;
        let last = self.keys.last()?;

        if time <= first.time {
            return Some(first.value);
        }
        if time >= last.time {
            return Some(last.value);
        }

        // NaN time (или NaN ключи) не проходят сравнения выше: нет пары соседних ключей
        let upper = self.keys.partition_point(|key| key.time <= time);
        let (Some(a), Some(b)) = (upper.checked_sub(1).and_then(|i| self.keys.get(i)), self.keys.get(upper)) else {
            return Some(first.value);
        };
        let span = b.time - a.time;
        if span <= f32::EPSILON {
            return Some(b.value);
        }
        Some(T::lerp(a.value, b.value, (time - a.time) / span))
    }
}

impl VectorCurve {
    pub fn sample_vec3(&self, time: f32) -> Option<Vec3> {
        self.sample(time).map(Vec3::from_array)
    }
}
