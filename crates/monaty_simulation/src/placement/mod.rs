//! Placement domain: raycast-driven размещение объектов
//!
//! - PlaceableDescriptor / PlaceableTransform / PlacementMaterial
//! - PlacementWorld trait (raycast, spawn, materials) + ObjectHandle
//! - PlacementController (preview session → construct)
//! - RapierPlacementWorld (headless реализация на rapier3d)

pub mod controller;
pub mod descriptor;
pub mod rapier_world;
pub mod world;


pub use controller::{PlacementController, PlacementError};
pub use descriptor::{PlaceableClass, PlaceableDescriptor, PlaceableTransform, PlacementMaterial};
pub use rapier_world::{RapierPlacementWorld, WorldObject};
pub use world::{ObjectHandle, PlacementWorld, RaycastHit, SpawnKind, Viewpoint};
