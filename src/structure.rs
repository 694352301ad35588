//! Structure subsystem: static obstacles and their registry, plus the
//! top-level `World` that answers ground probes.

use glam::{Vec2, Vec3};
use std::collections::HashMap;
use std::sync::Arc;

use crate::query::{CollideMask, CollisionHit, GroundQueryResult, SpatialQuery, TERRAIN_TAG};
use crate::terrain::TerrainSource;

// ---------------------------------------------------------------------------
// Structure instance
// ---------------------------------------------------------------------------

/// A static obstacle placed in the world (rock, tree, wall …).
///
/// Modelled as an upright cylinder standing on `position`.
#[derive(Debug, Clone)]
pub struct StructureInstance {
    /// Globally unique identifier for the structure.
    pub id: String,
    /// World-space base of the structure.
    pub position: Vec3,
    /// Footprint radius in the XY plane.
    pub radius: f32,
    /// Height of the top face above `position`.
    pub height: f32,
    /// Surface tag reported to ground probes.
    pub tag: String,
    /// Layers the structure can be hit on.
    pub mask: CollideMask,
}

impl StructureInstance {
    pub fn new(id: impl Into<String>, position: Vec3, radius: f32, height: f32) -> Self {
        Self {
            id: id.into(),
            position,
            radius,
            height,
            tag: "obstacle".into(),
            mask: CollideMask::GROUND,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn top(&self) -> f32 {
        self.position.z + self.height
    }

    pub fn covers(&self, x: f32, y: f32) -> bool {
        Vec2::new(x - self.position.x, y - self.position.y).length_squared()
            <= self.radius * self.radius
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds all static structures placed in the world.
#[derive(Debug, Default)]
pub struct StructureRegistry {
    instances: HashMap<String, StructureInstance>,
}

impl StructureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, structure: StructureInstance) {
        self.instances.insert(structure.id.clone(), structure);
    }

    pub fn remove(&mut self, id: &str) -> Option<StructureInstance> {
        self.instances.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&StructureInstance> {
        self.instances.get(id)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Structures whose footprint contains the planar point.
    pub fn query_point(&self, x: f32, y: f32) -> impl Iterator<Item = &StructureInstance> {
        self.instances.values().filter(move |s| s.covers(x, y))
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Axis-aligned planar extent of the walkable terrain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl WorldBounds {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.min.x && x <= self.max.x && y >= self.min.y && y <= self.max.y
    }
}

/// The scene as the controllers see it: terrain plus obstacles.
pub struct World {
    pub terrain: Arc<dyn TerrainSource>,
    pub structures: StructureRegistry,
    /// Terrain exists only inside these bounds; `None` means unbounded.
    pub bounds: Option<WorldBounds>,
    /// Layers the terrain can be hit on.
    pub terrain_mask: CollideMask,
}

impl World {
    pub fn new(terrain: Arc<dyn TerrainSource>) -> Self {
        Self {
            terrain,
            structures: StructureRegistry::new(),
            bounds: None,
            terrain_mask: CollideMask::GROUND,
        }
    }

    pub fn with_bounds(mut self, bounds: WorldBounds) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

impl SpatialQuery for World {
    fn cast_down(&self, origin: Vec3, mask: CollideMask) -> GroundQueryResult {
        let mut hits = Vec::new();
        let (x, y) = (origin.x, origin.y);

        let in_bounds = self.bounds.is_none_or(|b| b.contains(x, y));
        if in_bounds && mask.intersects(self.terrain_mask) {
            let h = self.terrain.height_at(x, y);
            if h <= origin.z {
                hits.push(CollisionHit::new(Vec3::new(x, y, h), TERRAIN_TAG));
            }
        }

        for s in self.structures.query_point(x, y) {
            if mask.intersects(s.mask) && s.top() <= origin.z {
                hits.push(CollisionHit::new(Vec3::new(x, y, s.top()), s.tag.clone()));
            }
        }

        GroundQueryResult::from_hits(hits)
    }
}
