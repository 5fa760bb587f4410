//! Placeable descriptor / transform / material

use crate::shared::Rotator;
use bevy::prelude::*;

/// Класс объекта, который PlacementWorld умеет спаунить
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceableClass {
    pub name: String,
    /// Footprint (cm), центр на translation
    pub half_extents: Vec3,
    /// Количество mesh surfaces (материал применяется к каждой)
    pub surface_count: usize,
}

impl PlaceableClass {
    pub fn new(name: impl Into<String>, half_extents: Vec3, surface_count: usize) -> Self {
        Self {
            name: name.into(),
            half_extents,
            surface_count,
        }
    }
}

/// spawn_class: preview, placed_class: постоянный объект после construct
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaceableDescriptor {
    pub spawn_class: Option<PlaceableClass>,
    pub placed_class: Option<PlaceableClass>,
}

impl PlaceableDescriptor {
    /// Preview и постоянный объект одного класса
    pub fn single(class: PlaceableClass) -> Self {
        Self {
            spawn_class: Some(class),
            placed_class: None,
        }
    }

    pub fn with_placed_class(mut self, class: PlaceableClass) -> Self {
        self.placed_class = Some(class);
        self
    }

    /// Placed class, без неё: spawn class
    pub fn commit_class(&self) -> Option<&PlaceableClass> {
        self.placed_class.as_ref().or(self.spawn_class.as_ref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct PlaceableTransform {
    pub rotation: Rotator,
    pub translation: Vec3,
    pub scale: Vec3,
}

impl Default for PlaceableTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl PlaceableTransform {
    pub const IDENTITY: PlaceableTransform = PlaceableTransform {
        rotation: Rotator::ZERO,
        translation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    pub fn new(rotation: Rotator, translation: Vec3) -> Self {
        Self {
            rotation,
            translation,
            scale: Vec3::ONE,
        }
    }

    /// true если хоть одна компонента отличается больше чем на tolerance
    pub fn differs_from(&self, other: &PlaceableTransform, tolerance: f32) -> bool {
        !self.rotation.equals(other.rotation, tolerance)
            || !self.translation.abs_diff_eq(other.translation, tolerance)
            || !self.scale.abs_diff_eq(other.scale, tolerance)
    }

    pub fn to_transform(&self) -> Transform {
        Transform {
            translation: self.translation,
            rotation: self.rotation.to_quat(),
            scale: self.scale,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum PlacementMaterial {
    Allowed,
    Denied,
}
