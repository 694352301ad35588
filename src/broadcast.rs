//! Periodic best-effort position broadcast.

use glam::Vec3;

use crate::protocol::encode_position;
use crate::types::{AnimationState, BroadcastConfig};

/// Where broadcast messages go. Publishing never fails from the caller's
/// point of view; implementations log and drop what they cannot deliver.
pub trait BroadcastSink {
    fn publish(&mut self, message: &str);
}

/// Sink that discards everything (no peer configured).
#[derive(Debug, Default)]
pub struct NullSink;

impl BroadcastSink for NullSink {
    fn publish(&mut self, _message: &str) {}
}

/// Sink that keeps every message, for inspection.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub messages: Vec<String>,
}

impl BroadcastSink for RecordingSink {
    fn publish(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

/// Frame counter that opens a publish window every `period + 1` ticks.
pub struct BroadcastThrottle {
    config: BroadcastConfig,
    counter: u32,
}

impl BroadcastThrottle {
    pub fn new(config: BroadcastConfig) -> Self {
        Self { config, counter: 0 }
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Advance one tick and publish the committed position if the window
    /// opened while the avatar is moving. Returns the message sent.
    pub fn tick(
        &mut self,
        state: AnimationState,
        position: Vec3,
        sink: &mut dyn BroadcastSink,
    ) -> Option<String> {
        if self.counter < self.config.period {
            self.counter += 1;
            return None;
        }

        self.counter = 0;
        if !state.is_moving() {
            return None;
        }

        let message = encode_position(self.config.wire_format, position);
        sink.publish(&message);
        Some(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publishes_once_every_seven_ticks_while_moving() {
        let mut throttle = BroadcastThrottle::new(BroadcastConfig::default());
        let mut sink = RecordingSink::default();

        for _ in 0..21 {
            throttle.tick(AnimationState::Moving, Vec3::ONE, &mut sink);
        }
        assert_eq!(sink.messages.len(), 3);
    }

    #[test]
    fn wraps_silently_while_idle() {
        let mut throttle = BroadcastThrottle::new(BroadcastConfig::default());
        let mut sink = RecordingSink::default();

        for _ in 0..7 {
            assert!(throttle.tick(AnimationState::Idle, Vec3::ONE, &mut sink).is_none());
        }
        assert_eq!(throttle.counter(), 0);
        assert!(sink.messages.is_empty());
    }

    #[test]
    fn counter_stays_within_period() {
        let mut throttle = BroadcastThrottle::new(BroadcastConfig::default());
        let mut sink = NullSink;
        for _ in 0..50 {
            throttle.tick(AnimationState::Moving, Vec3::ZERO, &mut sink);
            assert!(throttle.counter() <= 6);
        }
    }
}
