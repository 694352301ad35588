//! Core controller types shared across all modules.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Avatar
// ---------------------------------------------------------------------------

/// Discrete animation state of the avatar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationState {
    #[default]
    Idle,
    Moving,
}

impl AnimationState {
    pub fn is_moving(self) -> bool {
        self == AnimationState::Moving
    }
}

impl std::fmt::Display for AnimationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnimationState::Idle => write!(f, "idle"),
            AnimationState::Moving => write!(f, "moving"),
        }
    }
}

/// The player-controlled character.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Avatar {
    pub position: Vec3,
    /// Heading about +Z in degrees. 0° means the local +Y axis points along world +Y.
    pub heading: f32,
    pub scale: f32,
    pub animation: AnimationState,
}

impl Avatar {
    pub fn new(position: Vec3, scale: f32) -> Self {
        Self {
            position,
            heading: 0.0,
            scale,
            animation: AnimationState::Idle,
        }
    }

    /// The avatar's local +Y axis in world space (always horizontal).
    pub fn forward_axis(&self) -> Vec3 {
        let (sin, cos) = self.heading.to_radians().sin_cos();
        Vec3::new(-sin, cos, 0.0)
    }
}

// ---------------------------------------------------------------------------
// Ground selection
// ---------------------------------------------------------------------------

/// Which sorted ground hit decides whether a position is walkable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroundPick {
    /// The lowest hit along the probe. Obstacles standing on terrain never
    /// block because the terrain under them sorts first.
    #[default]
    Lowest,
    /// The highest hit along the probe (the first surface the ray meets).
    Highest,
}

/// Outbound message encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireFormat {
    /// `{"character : "[x, y, z]}`, the shape existing peers parse.
    #[default]
    Legacy,
    /// Well-formed JSON: `{"character":[x,y,z]}`.
    Json,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Heading change while a turn trigger is held, degrees per second.
    pub turn_rate: f32,
    /// Translation speed along the local forward axis, units per second.
    pub move_speed: f32,
    /// Height above the entity the ground probe starts from.
    pub probe_height: f32,
    pub ground_pick: GroundPick,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            turn_rate: 300.0,
            move_speed: 25.0,
            probe_height: 9.0,
            ground_pick: GroundPick::Lowest,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Distance moved along the depth axis per zoom step, scaled by dt.
    pub zoom_speed: f32,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub initial_zoom: u8,
    /// Lateral speed for the cam-left / cam-right triggers.
    pub orbit_speed: f32,
    /// Lateral speed applied while the avatar turns.
    pub turn_follow_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Clearance kept above terrain under the camera.
    pub ground_clearance: f32,
    /// Clearance kept above the avatar.
    pub avatar_clearance: f32,
    /// Height of the aim point above the avatar.
    pub floater_height: f32,
    pub probe_height: f32,
    /// Camera spawn offset from the avatar.
    pub start_offset: Vec3,
    pub ground_pick: GroundPick,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            zoom_speed: 80.0,
            min_zoom: 1,
            max_zoom: 16,
            initial_zoom: 10,
            orbit_speed: 20.0,
            turn_follow_speed: 50.0,
            min_distance: 5.0,
            max_distance: 20.0,
            ground_clearance: 1.0,
            avatar_clearance: 2.0,
            floater_height: 2.0,
            probe_height: 9.0,
            start_offset: Vec3::new(0.0, 20.0, 2.0),
            ground_pick: GroundPick::Lowest,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub run_clip: String,
    pub run_rate: f32,
    pub idle_clip: String,
    pub idle_frame: u32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            run_clip: "run".into(),
            run_rate: 1.3,
            idle_clip: "walk".into(),
            idle_frame: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastConfig {
    /// Counter value at which the throttle wraps and may publish.
    pub period: u32,
    pub wire_format: WireFormat,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            period: 6,
            wire_format: WireFormat::Legacy,
        }
    }
}

/// Every tunable of the frame controller, grouped per sub-controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub avatar_scale: f32,
    pub locomotion: LocomotionConfig,
    pub camera: CameraConfig,
    pub animation: AnimationConfig,
    pub broadcast: BroadcastConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            avatar_scale: 0.2,
            locomotion: LocomotionConfig::default(),
            camera: CameraConfig::default(),
            animation: AnimationConfig::default(),
            broadcast: BroadcastConfig::default(),
        }
    }
}

impl ControllerConfig {
    /// Layer an optional TOML file and `ROAM__*` environment variables over
    /// the defaults.
    ///
    /// Environment keys use `__` as the section separator, e.g.
    /// `ROAM__CAMERA__MAX_DISTANCE=30`.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix("ROAM")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject tunables the controllers cannot honour.
    pub fn validate(&self) -> Result<()> {
        let cam = &self.camera;
        if cam.min_zoom > cam.max_zoom {
            return Err(Error::InvalidConfig(format!(
                "camera.min_zoom ({}) exceeds camera.max_zoom ({})",
                cam.min_zoom, cam.max_zoom
            )));
        }
        if !(cam.min_distance >= 0.0 && cam.min_distance <= cam.max_distance) {
            return Err(Error::InvalidConfig(format!(
                "camera.min_distance ({}) must be non-negative and at most camera.max_distance ({})",
                cam.min_distance, cam.max_distance
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerStats {
    pub total_ticks: u64,
    pub accepted_moves: u64,
    pub rollbacks: u64,
    pub broadcasts: u64,
    pub zoom_level: u8,
    pub follow_distance: f32,
}
