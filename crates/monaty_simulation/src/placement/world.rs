//! PlacementWorld: то, что placement потребляет от мира
//!
//! raycast / spawn / destroy / per-surface material / transform.
//! Реализации: `RapierPlacementWorld` (headless), движковый слой.

use crate::placement::descriptor::{PlaceableClass, PlaceableTransform, PlacementMaterial};
use crate::shared::Rotator;
use bevy::prelude::*;

/// Непрозрачный handle объекта мира
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect)]
pub struct ObjectHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// Blocking hit
    pub hit: bool,
    /// Точка попадания, без hit: конец луча
    pub point: Vec3,
}

impl RaycastHit {
    pub fn blocking(point: Vec3) -> Self {
        Self { hit: true, point }
    }

    pub fn miss(end: Vec3) -> Self {
        Self { hit: false, point: end }
    }
}

/// Поза камеры / глаз персонажа
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewpoint {
    pub location: Vec3,
    pub rotation: Rotator,
}

impl Viewpoint {
    pub fn new(location: Vec3, rotation: Rotator) -> Self {
        Self { location, rotation }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation.forward()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpawnKind {
    /// Ghost объект сессии: не блокирует raycast'ы
    Preview,
    Permanent,
}

pub trait PlacementWorld: Send + Sync {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, exclude: &[ObjectHandle]) -> RaycastHit;

    /// `None` если мир отказался создавать объект
    fn spawn(&mut self, class: &PlaceableClass, transform: &PlaceableTransform, kind: SpawnKind) -> Option<ObjectHandle>;

    fn destroy(&mut self, handle: ObjectHandle) -> bool;

    fn is_valid(&self, handle: ObjectHandle) -> bool;

    fn surface_count(&self, handle: ObjectHandle) -> usize;

    fn set_surface_material(&mut self, handle: ObjectHandle, surface: usize, material: PlacementMaterial) -> bool;

    fn set_transform(&mut self, handle: ObjectHandle, transform: &PlaceableTransform) -> bool;
}
