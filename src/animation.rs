//! Two-state animation machine (Idle / Moving).

use log::debug;

use crate::input::{InputSnapshot, Trigger};
use crate::types::{AnimationConfig, AnimationState};

/// Playback surface supplied by the host (actor, skeleton, sprite…).
pub trait Animator {
    /// Start looping `clip` at `rate` times normal speed.
    fn play_loop(&mut self, clip: &str, rate: f32);
    /// Stop whatever is playing.
    fn stop(&mut self);
    /// Hold `clip` at a single frame.
    fn pose(&mut self, clip: &str, frame: u32);
}

/// Animator for headless hosts: logs every command.
#[derive(Debug, Default)]
pub struct LogAnimator;

impl Animator for LogAnimator {
    fn play_loop(&mut self, clip: &str, rate: f32) {
        debug!("animation: loop '{}' at {:.2}x", clip, rate);
    }

    fn stop(&mut self) {
        debug!("animation: stop");
    }

    fn pose(&mut self, clip: &str, frame: u32) {
        debug!("animation: pose '{}' frame {}", clip, frame);
    }
}

pub struct AnimationStateMachine {
    config: AnimationConfig,
}

impl AnimationStateMachine {
    pub fn new(config: AnimationConfig) -> Self {
        Self { config }
    }

    /// Update `state` from the input snapshot.
    ///
    /// Animator commands fire only on an edge; the new state is returned
    /// when one was crossed.
    pub fn update(
        &self,
        state: &mut AnimationState,
        input: &InputSnapshot,
        animator: &mut dyn Animator,
    ) -> Option<AnimationState> {
        let wants_move = input.any_pressed(&Trigger::MOVEMENT);

        match (*state, wants_move) {
            (AnimationState::Idle, true) => {
                animator.play_loop(&self.config.run_clip, self.config.run_rate);
                *state = AnimationState::Moving;
                Some(AnimationState::Moving)
            }
            (AnimationState::Moving, false) => {
                animator.stop();
                animator.pose(&self.config.idle_clip, self.config.idle_frame);
                *state = AnimationState::Idle;
                Some(AnimationState::Idle)
            }
            _ => None,
        }
    }
}
