//! Chase camera: zoom, orbit, distance clamp, ground settle and aim.
//!
//! The camera never stores an orientation. Its axes are derived from its
//! position and the last aim target. The input motions of one tick all take
//! the [`CameraBasis`] captured when the tick began, so the frame stays put
//! until the camera is re-aimed.

use glam::{Mat3, Quat, Vec2, Vec3};
use log::trace;

use crate::input::{InputSnapshot, Trigger};
use crate::query::{probe_ground, SpatialQuery};
use crate::types::{Avatar, CameraConfig};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Pointer-drag bookkeeping, alive only while the drag trigger is held.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub last: Vec2,
    pub default: Vec2,
}

impl DragSession {
    pub fn new(default: Vec2) -> Self {
        Self {
            last: default,
            default,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Point the camera looked at when it was last aimed.
    pub target: Vec3,
    pub zoom_level: u8,
    /// Planar distance to the avatar after the last clamp.
    pub follow_distance: f32,
    pub drag: Option<DragSession>,
}

/// Camera axes in world space: +X right, +Y forward (depth), +Z up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    pub right: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
}

impl Camera {
    pub fn new(position: Vec3, target: Vec3, zoom_level: u8) -> Self {
        Self {
            position,
            target,
            zoom_level,
            follow_distance: planar(target - position).length(),
            drag: None,
        }
    }

    pub fn basis(&self) -> CameraBasis {
        let forward = (self.target - self.position)
            .try_normalize()
            .unwrap_or(Vec3::Y);
        let right = forward.cross(Vec3::Z).try_normalize().unwrap_or(Vec3::X);
        let up = right.cross(forward);
        CameraBasis { right, forward, up }
    }

    pub fn orientation(&self) -> Quat {
        let b = self.basis();
        Quat::from_mat3(&Mat3::from_cols(b.right, b.forward, b.up))
    }
}

fn planar(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.y, 0.0)
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct CameraController {
    config: CameraConfig,
}

impl CameraController {
    pub fn new(config: CameraConfig) -> Self {
        Self { config }
    }

    /// Camera placed at its spawn offset from `avatar`, aimed at the floater.
    pub fn spawn(&self, avatar: &Avatar) -> Camera {
        // max-then-min never panics, even on an unvalidated config.
        let zoom = self
            .config
            .initial_zoom
            .max(self.config.min_zoom)
            .min(self.config.max_zoom);
        Camera::new(
            avatar.position + self.config.start_offset,
            self.floater(avatar),
            zoom,
        )
    }

    pub fn floater(&self, avatar: &Avatar) -> Vec3 {
        avatar.position + Vec3::Z * self.config.floater_height
    }

    /// One zoom step per press. Returns the zoom level change.
    pub fn zoom(
        &self,
        camera: &mut Camera,
        basis: &CameraBasis,
        input: &InputSnapshot,
        dt: f32,
    ) -> i8 {
        let mut change = 0;
        if input.is_pressed(Trigger::CamZoomUp) && camera.zoom_level > self.config.min_zoom {
            camera.position += basis.forward * self.config.zoom_speed * dt;
            camera.zoom_level -= 1;
            change -= 1;
        }
        if input.is_pressed(Trigger::CamZoomDown) && camera.zoom_level < self.config.max_zoom {
            camera.position -= basis.forward * self.config.zoom_speed * dt;
            camera.zoom_level += 1;
            change += 1;
        }
        change
    }

    /// Slide sideways for cam-left / cam-right.
    pub fn keyboard_orbit(
        &self,
        camera: &mut Camera,
        basis: &CameraBasis,
        input: &InputSnapshot,
        dt: f32,
    ) {
        let right = basis.right;
        if input.is_pressed(Trigger::CamLeft) {
            camera.position -= right * self.config.orbit_speed * dt;
        }
        if input.is_pressed(Trigger::CamRight) {
            camera.position += right * self.config.orbit_speed * dt;
        }
    }

    /// Swing with the avatar while it turns in place.
    pub fn turn_follow(
        &self,
        camera: &mut Camera,
        basis: &CameraBasis,
        input: &InputSnapshot,
        dt: f32,
    ) {
        let right = basis.right;
        if input.is_pressed(Trigger::Left) {
            camera.position += right * self.config.turn_follow_speed * dt;
        }
        if input.is_pressed(Trigger::Right) {
            camera.position -= right * self.config.turn_follow_speed * dt;
        }
    }

    /// Sample the pointer for an active drag.
    ///
    /// Returns the sampled position when it differs from the previous
    /// sample. Nothing is applied while the baseline still equals the
    /// default position, which makes the first sample of a drag a no-op.
    pub fn pointer_drag(
        &self,
        camera: &mut Camera,
        basis: &CameraBasis,
        input: &InputSnapshot,
        dt: f32,
    ) -> Option<Vec2> {
        let session = camera
            .drag
            .get_or_insert_with(|| DragSession::new(Vec2::ZERO));
        let sample = input.pointer;
        let moved = sample != session.last;

        // Both deltas read the X coordinate, so lateral and depth motion are
        // always equal. Kept as-is because existing controls are tuned to it.
        // TODO: derive delta_depth from the pointer Y once the drag speed is retuned.
        let delta_lateral = sample.x - session.last.x;
        let delta_depth = sample.x - session.last.x;

        if session.last != session.default {
            camera.position += basis.right * delta_lateral * dt;
            camera.position += basis.forward * delta_depth * dt;
        }
        session.last = sample;

        moved.then_some(sample)
    }

    /// Drop the drag session; the next drag starts from the default baseline.
    pub fn end_drag(&self, camera: &mut Camera) {
        camera.drag = None;
    }

    /// Keep the planar camera→avatar distance within bounds.
    pub fn clamp_distance(&self, camera: &mut Camera, avatar: &Avatar) -> f32 {
        let to_avatar = planar(avatar.position - camera.position);
        let mut distance = to_avatar.length();
        let dir = to_avatar
            .try_normalize()
            .unwrap_or_else(|| -avatar.forward_axis());

        if distance > self.config.max_distance {
            camera.position += dir * (distance - self.config.max_distance);
            distance = self.config.max_distance;
        }
        if distance < self.config.min_distance {
            camera.position -= dir * (self.config.min_distance - distance);
            distance = self.config.min_distance;
        }

        camera.follow_distance = distance;
        distance
    }

    /// Rest the camera above the terrain and above the avatar.
    ///
    /// Returns the terrain height found under the camera, if any.
    pub fn settle(&self, camera: &mut Camera, avatar: &Avatar, query: &dyn SpatialQuery) -> Option<f32> {
        let ground = probe_ground(query, camera.position, self.config.probe_height);
        let terrain = ground.terrain_height(self.config.ground_pick);

        match terrain {
            Some(height) => camera.position.z = height + self.config.ground_clearance,
            None => trace!("No terrain under camera at {:?}", camera.position),
        }

        let floor = avatar.position.z + self.config.avatar_clearance;
        if camera.position.z < floor {
            camera.position.z = floor;
        }
        terrain
    }

    pub fn aim(&self, camera: &mut Camera, avatar: &Avatar) {
        camera.target = self.floater(avatar);
    }
}
