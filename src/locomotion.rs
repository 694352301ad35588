//! Avatar locomotion: turn, translate, then validate against the ground.

use log::trace;

use crate::input::{InputSnapshot, Trigger};
use crate::query::{probe_ground, SpatialQuery};
use crate::types::{Avatar, LocomotionConfig};

/// Result of one locomotion step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveOutcome {
    /// The probe found terrain; the avatar now stands at `height`.
    Accepted { height: f32 },
    /// No terrain under the proposed position; the translation was undone.
    RolledBack,
}

pub struct LocomotionController {
    config: LocomotionConfig,
}

impl LocomotionController {
    pub fn new(config: LocomotionConfig) -> Self {
        Self { config }
    }

    /// Advance the avatar by `dt` seconds.
    ///
    /// Heading changes are kept even when the translation is rolled back.
    pub fn step(
        &self,
        avatar: &mut Avatar,
        input: &InputSnapshot,
        dt: f32,
        query: &dyn SpatialQuery,
    ) -> MoveOutcome {
        let start = avatar.position;

        if input.is_pressed(Trigger::Left) {
            avatar.heading += self.config.turn_rate * dt;
        }
        if input.is_pressed(Trigger::Right) {
            avatar.heading -= self.config.turn_rate * dt;
        }

        // The model faces its local -Y, so "forward" walks against the axis.
        let axis = avatar.forward_axis();
        if input.is_pressed(Trigger::Forward) {
            avatar.position -= axis * self.config.move_speed * dt;
        }
        if input.is_pressed(Trigger::Backward) {
            avatar.position += axis * self.config.move_speed * dt;
        }

        let ground = probe_ground(query, avatar.position, self.config.probe_height);
        match ground.terrain_height(self.config.ground_pick) {
            Some(height) => {
                avatar.position.z = height;
                MoveOutcome::Accepted { height }
            }
            None => {
                trace!(
                    "No terrain under {:?} ({} hits), rolling back to {:?}",
                    avatar.position,
                    ground.hits().len(),
                    start
                );
                avatar.position = start;
                MoveOutcome::RolledBack
            }
        }
    }
}
