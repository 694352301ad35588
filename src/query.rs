//! Downward ground probes.
//!
//! The controllers never see the scene. They ask a [`SpatialQuery`] to cast
//! a ray straight down from a point and get back every surface it crossed,
//! ordered by height. A physics engine, a heightmap sampler or a test
//! double can all stand behind the trait.

use glam::Vec3;

use crate::types::GroundPick;

/// Tag carried by walkable ground.
pub const TERRAIN_TAG: &str = "terrain";

// ---------------------------------------------------------------------------
// Collide layers
// ---------------------------------------------------------------------------

/// Bit set of collision layers a probe is allowed to hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CollideMask(pub u32);

impl CollideMask {
    /// Surfaces avatars and cameras can stand on or be blocked by.
    pub const GROUND: CollideMask = CollideMask::bit(0);
    pub const NONE: CollideMask = CollideMask(0);
    pub const ALL: CollideMask = CollideMask(u32::MAX);

    pub const fn bit(n: u32) -> Self {
        CollideMask(1 << n)
    }

    pub fn intersects(self, other: CollideMask) -> bool {
        self.0 & other.0 != 0
    }
}

impl std::ops::BitOr for CollideMask {
    type Output = CollideMask;

    fn bitor(self, rhs: Self) -> Self {
        CollideMask(self.0 | rhs.0)
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// One surface crossed by a probe.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionHit {
    /// World-space point where the ray met the surface.
    pub point: Vec3,
    /// Tag of the surface that owns the point.
    pub surface: String,
}

impl CollisionHit {
    pub fn new(point: Vec3, surface: impl Into<String>) -> Self {
        Self {
            point,
            surface: surface.into(),
        }
    }

    pub fn terrain(point: Vec3) -> Self {
        Self::new(point, TERRAIN_TAG)
    }

    pub fn is_terrain(&self) -> bool {
        self.surface == TERRAIN_TAG
    }

    pub fn height(&self) -> f32 {
        self.point.z
    }
}

/// Hits of a single probe, sorted ascending by height.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroundQueryResult {
    hits: Vec<CollisionHit>,
}

impl GroundQueryResult {
    pub fn from_hits(mut hits: Vec<CollisionHit>) -> Self {
        hits.sort_by(|a, b| a.height().total_cmp(&b.height()));
        Self { hits }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn hits(&self) -> &[CollisionHit] {
        &self.hits
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// The hit that decides walkability under `pick`.
    pub fn select(&self, pick: GroundPick) -> Option<&CollisionHit> {
        match pick {
            GroundPick::Lowest => self.hits.first(),
            GroundPick::Highest => self.hits.last(),
        }
    }

    /// Height of the selected hit, if that hit is terrain.
    pub fn terrain_height(&self, pick: GroundPick) -> Option<f32> {
        self.select(pick)
            .filter(|hit| hit.is_terrain())
            .map(CollisionHit::height)
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Anything that can answer a straight-down ray cast.
pub trait SpatialQuery {
    /// Cast from `origin` toward -Z and return every surface on a layer in
    /// `mask`. Implementations must not block.
    fn cast_down(&self, origin: Vec3, mask: CollideMask) -> GroundQueryResult;
}

impl<T: SpatialQuery + ?Sized> SpatialQuery for &T {
    fn cast_down(&self, origin: Vec3, mask: CollideMask) -> GroundQueryResult {
        (**self).cast_down(origin, mask)
    }
}

/// Probe the ground under `position` from `probe_height` above it.
pub fn probe_ground(
    query: &dyn SpatialQuery,
    position: Vec3,
    probe_height: f32,
) -> GroundQueryResult {
    query.cast_down(position + Vec3::Z * probe_height, CollideMask::GROUND)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed() -> GroundQueryResult {
        GroundQueryResult::from_hits(vec![
            CollisionHit::new(Vec3::new(0.0, 0.0, 4.0), "rock"),
            CollisionHit::terrain(Vec3::new(0.0, 0.0, 1.5)),
        ])
    }

    #[test]
    fn hits_sort_ascending_by_height() {
        let result = mixed();
        let heights: Vec<f32> = result.hits().iter().map(CollisionHit::height).collect();
        assert_eq!(heights, vec![1.5, 4.0]);
    }

    #[test]
    fn lowest_pick_accepts_terrain_under_an_obstacle() {
        assert_eq!(mixed().terrain_height(GroundPick::Lowest), Some(1.5));
    }

    #[test]
    fn highest_pick_rejects_obstacle_on_top() {
        assert_eq!(mixed().terrain_height(GroundPick::Highest), None);
    }

    #[test]
    fn empty_result_has_no_terrain() {
        let result = GroundQueryResult::empty();
        assert!(result.is_empty());
        assert_eq!(result.terrain_height(GroundPick::Lowest), None);
    }

    #[test]
    fn mask_bits() {
        assert!(CollideMask::GROUND.intersects(CollideMask::ALL));
        assert!(!CollideMask::GROUND.intersects(CollideMask::bit(1)));
        assert!((CollideMask::GROUND | CollideMask::bit(3)).intersects(CollideMask::bit(3)));
        assert!(!CollideMask::NONE.intersects(CollideMask::ALL));
    }
}
