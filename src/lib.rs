//! Terrain Roam
//!
//! A per-frame controller that walks an avatar over uneven ground, keeps a
//! chase camera at a bounded distance and height, drives a two-state
//! animation machine and throttles a position broadcast.
//!
//! ## Architecture
//!
//! ```text
//! RoamHost  (host.rs)              ← frame loop, input script, shutdown
//!   └── FrameController  (controller.rs)
//!         ├── InputQueue             (input.rs)      ← event channel → snapshot
//!         ├── LocomotionController   (locomotion.rs)
//!         ├── AnimationStateMachine  (animation.rs)
//!         ├── CameraController       (camera.rs)
//!         └── BroadcastThrottle      (broadcast.rs)  → BroadcastSink
//!
//! SpatialQuery  (query.rs)  ← implemented by World (structure.rs)
//!                              over HeightmapTerrain (terrain.rs)
//! Link / ChannelSink  (net.rs)     ← handshake + writer task
//! ```
//!
//! The controller core has no runtime dependencies beyond a channel; the
//! `host` feature adds the world, the network link and the loop.

// Controller core is always available.
pub mod animation;
pub mod broadcast;
pub mod camera;
pub mod controller;
pub mod error;
pub mod input;
pub mod locomotion;
pub mod protocol;
pub mod query;
pub mod types;

// Host-side modules require the `host` feature.
#[cfg(feature = "host")]
pub mod host;
#[cfg(feature = "host")]
pub mod net;
#[cfg(feature = "host")]
pub mod structure;
#[cfg(feature = "host")]
pub mod terrain;

pub use animation::{AnimationStateMachine, Animator, LogAnimator};
pub use broadcast::{BroadcastSink, BroadcastThrottle, NullSink, RecordingSink};
pub use camera::{Camera, CameraBasis, CameraController, DragSession};
pub use controller::{FrameController, TickReport};
pub use error::{Error, Result};
pub use input::{InputEvent, InputHandle, InputQueue, InputSnapshot, Trigger};
pub use locomotion::{LocomotionController, MoveOutcome};
pub use query::{CollideMask, CollisionHit, GroundQueryResult, SpatialQuery, TERRAIN_TAG};
pub use types::{
    AnimationState, Avatar, ControllerConfig, ControllerStats, GroundPick, WireFormat,
};

// Convenience re-exports (host only)
#[cfg(feature = "host")]
pub use host::{HostConfig, RoamHost};
#[cfg(feature = "host")]
pub use net::{ChannelSink, Link, NetConfig};
#[cfg(feature = "host")]
pub use structure::{StructureInstance, StructureRegistry, World, WorldBounds};
#[cfg(feature = "host")]
pub use terrain::{FlatTerrain, HeightmapTerrain, TerrainSource};
