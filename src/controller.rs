//! FrameController – one tick of locomotion, animation, camera and broadcast.

use glam::{Vec2, Vec3};
use log::debug;

use crate::animation::{AnimationStateMachine, Animator};
use crate::broadcast::{BroadcastSink, BroadcastThrottle};
use crate::camera::{Camera, CameraBasis, CameraController};
use crate::input::{InputHandle, InputQueue, InputSnapshot, Trigger};
use crate::locomotion::{LocomotionController, MoveOutcome};
use crate::protocol::encode_pointer;
use crate::query::SpatialQuery;
use crate::types::{AnimationState, Avatar, ControllerConfig, ControllerStats};

// ---------------------------------------------------------------------------
// Tick result
// ---------------------------------------------------------------------------

/// What a single [`FrameController::tick`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// The tick counter that produced this report.
    pub tick: u64,
    pub movement: MoveOutcome,
    /// New animation state, when an edge was crossed.
    pub transition: Option<AnimationState>,
    /// Zoom level change applied this tick.
    pub zoom_change: i8,
    /// Pointer telemetry built during a drag.
    pub pointer_telemetry: Option<String>,
    /// Position message handed to the sink.
    pub broadcast: Option<String>,
    /// The exit trigger has fired; the host should stop ticking.
    pub exit_requested: bool,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct FrameController {
    config: ControllerConfig,
    avatar: Avatar,
    camera: Camera,
    input: InputQueue,
    locomotion: LocomotionController,
    animation: AnimationStateMachine,
    camera_ctl: CameraController,
    throttle: BroadcastThrottle,
    stats: ControllerStats,
}

impl FrameController {
    /// Place the avatar at `start` and the camera at its spawn offset.
    ///
    /// Returns the controller and the handle the input layer writes to.
    pub fn new(config: ControllerConfig, start: Vec3) -> (Self, InputHandle) {
        let (handle, input) = InputQueue::channel();
        let avatar = Avatar::new(start, config.avatar_scale);
        let camera_ctl = CameraController::new(config.camera.clone());
        let camera = camera_ctl.spawn(&avatar);

        let controller = Self {
            avatar,
            stats: ControllerStats {
                zoom_level: camera.zoom_level,
                follow_distance: camera.follow_distance,
                ..Default::default()
            },
            camera,
            input,
            locomotion: LocomotionController::new(config.locomotion.clone()),
            animation: AnimationStateMachine::new(config.animation.clone()),
            camera_ctl,
            throttle: BroadcastThrottle::new(config.broadcast.clone()),
            config,
        };
        (controller, handle)
    }

    pub fn avatar(&self) -> &Avatar {
        &self.avatar
    }

    pub fn avatar_mut(&mut self) -> &mut Avatar {
        &mut self.avatar
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn broadcast_counter(&self) -> u32 {
        self.throttle.counter()
    }

    pub fn stats(&self) -> ControllerStats {
        self.stats.clone()
    }

    // -----------------------------------------------------------------------
    // Main tick
    // -----------------------------------------------------------------------

    /// Advance every sub-controller by `dt` seconds.
    ///
    /// Order: input snapshot, camera input motion, locomotion, animation,
    /// distance clamp, camera settle, aim, broadcast. The broadcast always
    /// sees this tick's committed avatar position.
    pub fn tick(
        &mut self,
        dt: f32,
        query: &dyn SpatialQuery,
        animator: &mut dyn Animator,
        sink: &mut dyn BroadcastSink,
    ) -> TickReport {
        self.stats.total_ticks += 1;
        let input = self.input.drain();

        // All input motions use the frame the camera had at tick start.
        let basis = self.camera.basis();
        let zoom_change = self.camera_ctl.zoom(&mut self.camera, &basis, &input, dt);
        self.consume_zoom(&input);
        self.camera_ctl
            .keyboard_orbit(&mut self.camera, &basis, &input, dt);
        let pointer = self.drive_drag(&basis, &input, dt);
        self.camera_ctl
            .turn_follow(&mut self.camera, &basis, &input, dt);

        let movement = self
            .locomotion
            .step(&mut self.avatar, &input, dt, query);
        match movement {
            MoveOutcome::Accepted { .. } => self.stats.accepted_moves += 1,
            MoveOutcome::RolledBack => self.stats.rollbacks += 1,
        }

        let transition = self
            .animation
            .update(&mut self.avatar.animation, &input, animator);
        if let Some(state) = transition {
            debug!("Avatar is now {} at {:?}", state, self.avatar.position);
        }

        self.camera_ctl.clamp_distance(&mut self.camera, &self.avatar);
        self.camera_ctl.settle(&mut self.camera, &self.avatar, query);
        self.camera_ctl.aim(&mut self.camera, &self.avatar);

        let broadcast = self
            .throttle
            .tick(self.avatar.animation, self.avatar.position, sink);
        if broadcast.is_some() {
            self.stats.broadcasts += 1;
        }

        self.stats.zoom_level = self.camera.zoom_level;
        self.stats.follow_distance = self.camera.follow_distance;

        TickReport {
            tick: self.stats.total_ticks,
            movement,
            transition,
            zoom_change,
            pointer_telemetry: pointer
                .map(|p| encode_pointer(self.config.broadcast.wire_format, p)),
            broadcast,
            exit_requested: input.exit,
        }
    }

    /// Zoom triggers are one-shot: a press yields one step, even when the
    /// zoom level is already at its bound.
    fn consume_zoom(&mut self, input: &InputSnapshot) {
        for trigger in [Trigger::CamZoomUp, Trigger::CamZoomDown] {
            if input.is_pressed(trigger) {
                self.input.clear(trigger);
            }
        }
    }

    /// A cam-multi-end press with no drag held stays latched, so the next
    /// cam-multi press starts and ends its drag in the same tick.
    fn drive_drag(&mut self, basis: &CameraBasis, input: &InputSnapshot, dt: f32) -> Option<Vec2> {
        let held = input.is_pressed(Trigger::CamMulti);
        if held && input.is_pressed(Trigger::CamMultiEnd) {
            self.input.clear(Trigger::CamMulti);
            self.input.clear(Trigger::CamMultiEnd);
            self.camera_ctl.end_drag(&mut self.camera);
            return None;
        }
        if !held {
            return None;
        }
        self.camera_ctl
            .pointer_drag(&mut self.camera, basis, input, dt)
    }
}
