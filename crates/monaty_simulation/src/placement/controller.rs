//! PlacementController: raycast-driven placement session
//!
//! Idle → Placing: start_placing (только в place mode, нужен spawn class)
//! Placing → Idle: stop_placing (preview уничтожается) или construct (commit, только если can_place)
//!
//! Preview принадлежит только контроллеру: transform и материалы меняет только он.
//! Невалидный preview handle завершает сессию при следующем использовании.

use crate::config::PlacementConfig;
use crate::placement::descriptor::{PlaceableDescriptor, PlaceableTransform, PlacementMaterial};
use crate::placement::world::{ObjectHandle, PlacementWorld, SpawnKind, Viewpoint};
use crate::shared::Rotator;
use bevy::prelude::*;

/// Фиксированный поворот preview относительно yaw viewpoint
const PREVIEW_YAW_OFFSET: f32 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementError {
    NotInPlaceMode,
    /// Descriptor без spawn class
    InvalidDescriptor,
    /// Мир отказался спаунить preview или постоянный объект
    SpawnFailure,
    NothingToPlace,
    CannotPlace,
    /// Preview handle стал невалидным
    StaleReference,
}

impl std::fmt::Display for PlacementError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlacementError::NotInPlaceMode => write!(f, "not in place mode"),
            PlacementError::InvalidDescriptor => write!(f, "placeable descriptor has no spawn class"),
            PlacementError::SpawnFailure => write!(f, "world refused to spawn object"),
            PlacementError::NothingToPlace => write!(f, "no placement preview"),
            PlacementError::CannotPlace => write!(f, "placement target is not valid"),
            PlacementError::StaleReference => write!(f, "placement preview no longer exists"),
        }
    }
}

impl std::error::Error for PlacementError {}

#[derive(Debug, Clone)]
pub struct PlacementController {
    config: PlacementConfig,
    place_mode: bool,
    descriptor: Option<PlaceableDescriptor>,
    preview: Option<ObjectHandle>,
    transform: PlaceableTransform,
    can_place: bool,
    applied_material: Option<PlacementMaterial>,
    placer: Option<ObjectHandle>,
}

impl PlacementController {
    pub fn new(config: PlacementConfig) -> Self {
        Self {
            config,
            place_mode: false,
            descriptor: None,
            preview: None,
            transform: PlaceableTransform::IDENTITY,
            can_place: false,
            applied_material: None,
            placer: None,
        }
    }

    /// Объект самого персонажа в мире (исключается из raycast)
    pub fn set_placer(&mut self, placer: Option<ObjectHandle>) {
        self.placer = placer;
    }

    pub fn placer(&self) -> Option<ObjectHandle> {
        self.placer
    }

    pub fn enter_place_mode(&mut self) {
        self.place_mode = true;
    }

    /// Выход из place mode завершает текущую сессию
    pub fn exit_place_mode(&mut self, world: &mut dyn PlacementWorld) {
        self.place_mode = false;
        self.stop_placing(world);
    }

    pub fn is_in_place_mode(&self) -> bool {
        self.place_mode
    }

    pub fn start_placing(
        &mut self,
        world: &mut dyn PlacementWorld,
        descriptor: PlaceableDescriptor,
        placer_transform: &PlaceableTransform,
    ) -> Result<ObjectHandle, PlacementError> {
        if !self.place_mode {
            return Err(PlacementError::NotInPlaceMode);
        }
        let Some(spawn_class) = descriptor.spawn_class.as_ref() else {
            return Err(PlacementError::InvalidDescriptor);
        };

        self.stop_placing(world);

        let preview = world
            .spawn(spawn_class, placer_transform, SpawnKind::Preview)
            .ok_or(PlacementError::SpawnFailure)?;

        crate::log(&format!("🧱 Placing '{}' (preview {:?})", spawn_class.name, preview));
        self.preview = Some(preview);
        self.descriptor = Some(descriptor);
        self.transform = PlaceableTransform::IDENTITY;
        self.can_place = false;
        self.applied_material = None;
        Ok(preview)
    }

    /// true если была активная сессия
    pub fn stop_placing(&mut self, world: &mut dyn PlacementWorld) -> bool {
        let Some(preview) = self.preview else {
            return false;
        };
        if world.is_valid(preview) {
            world.destroy(preview);
        }
        self.clear_session();
        true
    }

    pub fn tick(&mut self, world: &mut dyn PlacementWorld, viewpoint: &Viewpoint) -> Result<(), PlacementError> {
        let Some(preview) = self.preview else {
            return Ok(());
        };
        if !world.is_valid(preview) {
            self.clear_session();
            return Err(PlacementError::StaleReference);
        }

        let direction = viewpoint.forward();
        let distance = self.config.trace_distance;
        let mut exclude = vec![preview];
        exclude.extend(self.placer);
        let hit = world.raycast(viewpoint.location, direction, distance, &exclude);

        let base = if hit.hit {
            hit.point
        } else {
            viewpoint.location + direction * distance
        };
        let candidate = PlaceableTransform::new(
            Rotator::from_yaw(viewpoint.rotation.yaw + self.config.yaw_offset + PREVIEW_YAW_OFFSET).normalized(),
            base + Vec3::Z * self.config.z_bias,
        );

        if candidate.differs_from(&self.transform, self.config.transform_tolerance) {
            self.transform = candidate;
            world.set_transform(preview, &candidate);
        }

        self.can_place = hit.hit;
        let material = if self.can_place {
            PlacementMaterial::Allowed
        } else {
            PlacementMaterial::Denied
        };
        if self.applied_material != Some(material) {
            for surface in 0..world.surface_count(preview) {
                world.set_surface_material(preview, surface, material);
            }
            self.applied_material = Some(material);
        }
        Ok(())
    }

    /// Commit: постоянный объект на последнем transform, затем preview уничтожается
    pub fn construct(&mut self, world: &mut dyn PlacementWorld) -> Result<ObjectHandle, PlacementError> {
        let Some(preview) = self.preview else {
            return Err(PlacementError::NothingToPlace);
        };
        if !world.is_valid(preview) {
            self.clear_session();
            return Err(PlacementError::StaleReference);
        }
        if !self.can_place {
            return Err(PlacementError::CannotPlace);
        }
        let class = self
            .descriptor
            .as_ref()
            .and_then(|descriptor| descriptor.commit_class())
            .ok_or(PlacementError::InvalidDescriptor)?;

        let placed = world
            .spawn(class, &self.transform, SpawnKind::Permanent)
            .ok_or(PlacementError::SpawnFailure)?;

        crate::log_info(&format!(
            "✅ Constructed '{}' at {:?} ({:?})",
            class.name, self.transform.translation, placed
        ));
        world.destroy(preview);
        self.clear_session();
        Ok(placed)
    }

    fn clear_session(&mut self) {
        self.preview = None;
        self.descriptor = None;
        self.transform = PlaceableTransform::IDENTITY;
        self.can_place = false;
        self.applied_material = None;
    }

    pub fn is_placing(&self) -> bool {
        self.preview.is_some()
    }

    pub fn can_place(&self) -> bool {
        self.can_place
    }

    pub fn preview(&self) -> Option<ObjectHandle> {
        self.preview
    }

    pub fn descriptor(&self) -> Option<&PlaceableDescriptor> {
        self.descriptor.as_ref()
    }

    pub fn placeable_transform(&self) -> &PlaceableTransform {
        &self.transform
    }

    pub fn applied_material(&self) -> Option<PlacementMaterial> {
        self.applied_material
    }
}
