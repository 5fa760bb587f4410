//! RapierPlacementWorld: headless PlacementWorld на rapier3d query pipeline
//!
//! Только коллизии (без динамики): после каждой мутации `CollisionPipeline::step`
//! обновляет broad/narrow phase, raycast идёт через borrowed `QueryPipeline`.
//!
//! Preview: sensor collider (не блокирует raycast), permanent: solid cuboid.

use crate::placement::descriptor::{PlaceableClass, PlaceableTransform, PlacementMaterial};
use crate::placement::world::{ObjectHandle, PlacementWorld, RaycastHit, SpawnKind};
use bevy::prelude::*;
use rapier3d::na::{Point3, Quaternion, Translation3, UnitQuaternion, Vector3};
use rapier3d::prelude::{
    BroadPhaseBvh, Collider, ColliderBuilder, ColliderHandle, ColliderSet, CollisionPipeline, IslandManager, Isometry,
    NarrowPhase, QueryFilter, Ray, Real, RigidBodySet, SharedShape, Vector,
};
use std::collections::{BTreeMap, HashMap};

/// Объект мира + его collider
#[derive(Debug, Clone)]
pub struct WorldObject {
    pub class: String,
    pub kind: SpawnKind,
    pub half_extents: Vec3,
    pub transform: PlaceableTransform,
    pub materials: Vec<Option<PlacementMaterial>>,
    collider: ColliderHandle,
}

pub struct RapierPlacementWorld {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    islands: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    pipeline: CollisionPipeline,
    objects: BTreeMap<ObjectHandle, WorldObject>,
    by_collider: HashMap<ColliderHandle, ObjectHandle>,
    next_id: u64,
}

impl Default for RapierPlacementWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl RapierPlacementWorld {
    pub fn new() -> Self {
        Self {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            pipeline: CollisionPipeline::new(),
            objects: BTreeMap::new(),
            by_collider: HashMap::new(),
            next_id: 0,
        }
    }

    /// Бесконечный пол (half-space, нормаль +Z) на высоте `z`
    pub fn add_ground(&mut self, z: f32) {
        let ground = ColliderBuilder::halfspace(Vector::z_axis())
            .translation(Vector3::new(0.0, 0.0, z))
            .build();
        self.colliders.insert(ground);
        self.refresh();
    }

    /// Статичный блокирующий box (стены, сам персонаж как placer)
    pub fn add_static_box(&mut self, center: Vec3, half_extents: Vec3) -> ObjectHandle {
        let class = PlaceableClass::new("static", half_extents, 0);
        let transform = PlaceableTransform::new(crate::shared::Rotator::ZERO, center);
        self.insert_object(&class, &transform, SpawnKind::Permanent)
    }

    pub fn object(&self, handle: ObjectHandle) -> Option<&WorldObject> {
        self.objects.get(&handle)
    }

    pub fn material(&self, handle: ObjectHandle, surface: usize) -> Option<PlacementMaterial> {
        self.objects
            .get(&handle)
            .and_then(|object| object.materials.get(surface).copied().flatten())
    }

    pub fn count(&self, kind: SpawnKind) -> usize {
        self.objects.values().filter(|object| object.kind == kind).count()
    }

    pub fn objects(&self) -> impl Iterator<Item = (&ObjectHandle, &WorldObject)> {
        self.objects.iter()
    }

    fn insert_object(&mut self, class: &PlaceableClass, transform: &PlaceableTransform, kind: SpawnKind) -> ObjectHandle {
        let mut collider = ColliderBuilder::cuboid(
            class.half_extents.x * transform.scale.x,
            class.half_extents.y * transform.scale.y,
            class.half_extents.z * transform.scale.z,
        )
        .sensor(kind == SpawnKind::Preview)
        .build();
        collider.set_position(isometry(transform));
        let collider = self.colliders.insert(collider);

        self.next_id += 1;
        let handle = ObjectHandle(self.next_id);
        self.objects.insert(
            handle,
            WorldObject {
                class: class.name.clone(),
                kind,
                half_extents: class.half_extents,
                transform: *transform,
                materials: vec![None; class.surface_count],
                collider,
            },
        );
        self.by_collider.insert(collider, handle);
        self.refresh();
        handle
    }

    /// Обновить broad/narrow phase после изменения colliders
    fn refresh(&mut self) {
        self.pipeline.step(
            0.0,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &(),
            &(),
        );
    }
}

fn isometry(transform: &PlaceableTransform) -> Isometry<Real> {
    let q = transform.rotation.to_quat();
    let rotation = UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z));
    let t = transform.translation;
    Isometry::from_parts(Translation3::new(t.x, t.y, t.z), rotation)
}

impl PlacementWorld for RapierPlacementWorld {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, exclude: &[ObjectHandle]) -> RaycastHit {
        let direction = direction.normalize_or_zero();
        let end = origin + direction * max_distance;
        if direction == Vec3::ZERO || max_distance <= 0.0 {
            return RaycastHit::miss(end);
        }

        let not_excluded = |collider: ColliderHandle, _: &Collider| {
            self.by_collider
                .get(&collider)
                .map_or(true, |handle| !exclude.contains(handle))
        };
        let filter = QueryFilter::default().exclude_sensors().predicate(&not_excluded);
        let pipeline = self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        );

        let ray = Ray::new(
            Point3::new(origin.x, origin.y, origin.z),
            Vector3::new(direction.x, direction.y, direction.z),
        );
        match pipeline.cast_ray(&ray, max_distance, true) {
            Some((_collider, toi)) => RaycastHit::blocking(origin + direction * toi),
            None => RaycastHit::miss(end),
        }
    }

    fn spawn(&mut self, class: &PlaceableClass, transform: &PlaceableTransform, kind: SpawnKind) -> Option<ObjectHandle> {
        if class.half_extents.min_element() <= 0.0 {
            crate::log_warning(&format!("⚠️ Refusing to spawn '{}': empty footprint", class.name));
            return None;
        }
        Some(self.insert_object(class, transform, kind))
    }

    fn destroy(&mut self, handle: ObjectHandle) -> bool {
        let Some(object) = self.objects.remove(&handle) else {
            return false;
        };
        self.by_collider.remove(&object.collider);
        self.colliders
            .remove(object.collider, &mut self.islands, &mut self.bodies, false);
        self.refresh();
        true
    }

    fn is_valid(&self, handle: ObjectHandle) -> bool {
        self.objects.contains_key(&handle)
    }

    fn surface_count(&self, handle: ObjectHandle) -> usize {
        self.objects.get(&handle).map_or(0, |object| object.materials.len())
    }

    fn set_surface_material(&mut self, handle: ObjectHandle, surface: usize, material: PlacementMaterial) -> bool {
        match self
            .objects
            .get_mut(&handle)
            .and_then(|object| object.materials.get_mut(surface))
        {
            Some(slot) => {
                *slot = Some(material);
                true
            }
            None => false,
        }
    }

    fn set_transform(&mut self, handle: ObjectHandle, transform: &PlaceableTransform) -> bool {
        let Some(object) = self.objects.get_mut(&handle) else {
            return false;
        };
        let Some(collider) = self.colliders.get_mut(object.collider) else {
            return false;
        };

        if !object.transform.scale.abs_diff_eq(transform.scale, f32::EPSILON) {
            let half = object.half_extents * transform.scale;
            collider.set_shape(SharedShape::cuboid(half.x, half.y, half.z));
        }
        collider.set_position(isometry(transform));
        object.transform = *transform;
        self.refresh();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Rotator;

    fn world_with_ground() -> RapierPlacementWorld {
        let mut world = RapierPlacementWorld::new();
        world.add_ground(0.0);
        world
    }

    #[test]
    fn test_ray_hits_ground() {
        let world = world_with_ground();
        let hit = world.raycast(Vec3::new(0.0, 0.0, 100.0), Vec3::NEG_Z, 1000.0, &[]);
        assert!(hit.hit);
        assert!(hit.point.abs_diff_eq(Vec3::ZERO, 1e-3));
    }

    #[test]
    fn test_ray_miss_returns_end() {
        let world = world_with_ground();
        let hit = world.raycast(Vec3::new(0.0, 0.0, 100.0), Vec3::X, 500.0, &[]);
        assert!(!hit.hit);
        assert!(hit.point.abs_diff_eq(Vec3::new(500.0, 0.0, 100.0), 1e-3));
    }

    #[test]
    fn test_excluded_object_is_ignored() {
        let mut world = world_with_ground();
        let wall = world.add_static_box(Vec3::new(200.0, 0.0, 100.0), Vec3::new(10.0, 100.0, 100.0));

        let origin = Vec3::new(0.0, 0.0, 50.0);
        let blocked = world.raycast(origin, Vec3::X, 1000.0, &[]);
        assert!(blocked.hit);
        assert!((blocked.point.x - 190.0).abs() < 1e-2);

        let through = world.raycast(origin, Vec3::X, 1000.0, &[wall]);
        assert!(!through.hit);
    }

    #[test]
    fn test_preview_does_not_block() {
        let mut world = world_with_ground();
        let class = PlaceableClass::new("crate", Vec3::splat(50.0), 2);
        let transform = PlaceableTransform::new(Rotator::ZERO, Vec3::new(0.0, 0.0, 50.0));
        let preview = world.spawn(&class, &transform, SpawnKind::Preview).unwrap();

        let hit = world.raycast(Vec3::new(0.0, 0.0, 500.0), Vec3::NEG_Z, 1000.0, &[]);
        assert!(hit.hit);
        assert!(hit.point.z.abs() < 1e-3);
        assert_eq!(world.surface_count(preview), 2);

        let solid = world.spawn(&class, &transform, SpawnKind::Permanent).unwrap();
        let hit = world.raycast(Vec3::new(0.0, 0.0, 500.0), Vec3::NEG_Z, 1000.0, &[]);
        assert!((hit.point.z - 100.0).abs() < 1e-2);
        assert_eq!(world.count(SpawnKind::Permanent), 1);
        assert!(world.destroy(solid));
        assert!(!world.is_valid(solid));
        assert!(!world.destroy(solid));
    }

    #[test]
    fn test_moved_object_blocks_at_new_location() {
        let mut world = world_with_ground();
        let class = PlaceableClass::new("crate", Vec3::splat(50.0), 1);
        let solid = world
            .spawn(&class, &PlaceableTransform::IDENTITY, SpawnKind::Permanent)
            .unwrap();

        let moved = PlaceableTransform::new(Rotator::from_yaw(45.0), Vec3::new(1000.0, 0.0, 50.0));
        assert!(world.set_transform(solid, &moved));

        let hit = world.raycast(Vec3::new(1000.0, 0.0, 500.0), Vec3::NEG_Z, 1000.0, &[]);
        assert!((hit.point.z - 100.0).abs() < 1e-2);
        assert_eq!(world.object(solid).map(|o| o.transform), Some(moved));
    }

    #[test]
    fn test_material_per_surface() {
        let mut world = RapierPlacementWorld::new();
        let class = PlaceableClass::new("crate", Vec3::splat(10.0), 2);
        let handle = world
            .spawn(&class, &PlaceableTransform::IDENTITY, SpawnKind::Preview)
            .unwrap();

        assert!(world.set_surface_material(handle, 1, PlacementMaterial::Denied));
        assert!(!world.set_surface_material(handle, 2, PlacementMaterial::Denied));
        assert_eq!(world.material(handle, 0), None);
        assert_eq!(world.material(handle, 1), Some(PlacementMaterial::Denied));
    }

    #[test]
    fn test_empty_footprint_refused() {
        let mut world = RapierPlacementWorld::new();
        let class = PlaceableClass::new("flat", Vec3::new(10.0, 10.0, 0.0), 1);
        assert!(world.spawn(&class, &PlaceableTransform::IDENTITY, SpawnKind::Preview).is_none());
    }
}
