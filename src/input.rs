//! Input triggers, the event channel the host writes into, and the
//! per-tick snapshot the controllers read.
//!
//! The host's input layer never touches controller state directly. It
//! sends [`InputEvent`]s through an [`InputHandle`]; the frame controller
//! drains them into the live [`InputState`] at the start of each tick and
//! hands every sub-controller the same immutable [`InputSnapshot`].

use glam::Vec2;
use std::str::FromStr;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Triggers
// ---------------------------------------------------------------------------

/// A named boolean input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Left,
    Right,
    Forward,
    Backward,
    CamLeft,
    CamRight,
    /// Pointer-drag orbit is held.
    CamMulti,
    /// Pointer-drag orbit was released.
    CamMultiEnd,
    CamZoomUp,
    CamZoomDown,
    Chat,
}

impl Trigger {
    pub const COUNT: usize = 11;

    pub const ALL: [Trigger; Trigger::COUNT] = [
        Trigger::Left,
        Trigger::Right,
        Trigger::Forward,
        Trigger::Backward,
        Trigger::CamLeft,
        Trigger::CamRight,
        Trigger::CamMulti,
        Trigger::CamMultiEnd,
        Trigger::CamZoomUp,
        Trigger::CamZoomDown,
        Trigger::Chat,
    ];

    /// The four triggers that make the avatar "moving".
    pub const MOVEMENT: [Trigger; 4] = [
        Trigger::Forward,
        Trigger::Backward,
        Trigger::Left,
        Trigger::Right,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Trigger::Left => "left",
            Trigger::Right => "right",
            Trigger::Forward => "forward",
            Trigger::Backward => "backward",
            Trigger::CamLeft => "cam-left",
            Trigger::CamRight => "cam-right",
            Trigger::CamMulti => "cam-multi",
            Trigger::CamMultiEnd => "cam-multi-end",
            Trigger::CamZoomUp => "cam-zoom-up",
            Trigger::CamZoomDown => "cam-zoom-down",
            Trigger::Chat => "chat",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseInputError {
    #[error("unknown trigger '{0}'")]
    UnknownTrigger(String),
    #[error("unknown input command '{0}'")]
    UnknownCommand(String),
    #[error("malformed input line '{0}'")]
    Malformed(String),
}

impl FromStr for Trigger {
    type Err = ParseInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Trigger::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| ParseInputError::UnknownTrigger(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// One change reported by the host's input layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Press(Trigger),
    Release(Trigger),
    /// Pointer moved to a window position.
    Pointer(Vec2),
    /// Terminate the session.
    Exit,
}

impl FromStr for InputEvent {
    type Err = ParseInputError;

    /// Parse one line of the text input script:
    /// `press <trigger>`, `release <trigger>`, `pointer <x> <y>` or `exit`.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let malformed = || ParseInputError::Malformed(line.to_string());
        let command = parts.next().ok_or_else(malformed)?;

        let event = match command {
            "press" => InputEvent::Press(parts.next().ok_or_else(malformed)?.parse()?),
            "release" => InputEvent::Release(parts.next().ok_or_else(malformed)?.parse()?),
            "pointer" => {
                let x = parts.next().and_then(|v| v.parse().ok()).ok_or_else(malformed)?;
                let y = parts.next().and_then(|v| v.parse().ok()).ok_or_else(malformed)?;
                InputEvent::Pointer(Vec2::new(x, y))
            }
            "exit" => InputEvent::Exit,
            other => return Err(ParseInputError::UnknownCommand(other.to_string())),
        };

        if parts.next().is_some() {
            return Err(malformed());
        }
        Ok(event)
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Immutable view of the input at the start of a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    pressed: [bool; Trigger::COUNT],
    pub pointer: Vec2,
    pub exit: bool,
}

impl InputSnapshot {
    pub fn is_pressed(&self, trigger: Trigger) -> bool {
        self.pressed[trigger.index()]
    }

    pub fn any_pressed(&self, triggers: &[Trigger]) -> bool {
        triggers.iter().any(|t| self.is_pressed(*t))
    }

    /// Build a snapshot with the given triggers held.
    pub fn with_pressed(triggers: &[Trigger]) -> Self {
        let mut snapshot = Self::default();
        for t in triggers {
            snapshot.pressed[t.index()] = true;
        }
        snapshot
    }
}

// ---------------------------------------------------------------------------
// Live state
// ---------------------------------------------------------------------------

/// The accumulated input, owned by the frame controller.
#[derive(Debug, Default)]
pub struct InputState {
    current: InputSnapshot,
}

impl InputState {
    pub fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::Press(t) => self.current.pressed[t.index()] = true,
            InputEvent::Release(t) => self.current.pressed[t.index()] = false,
            InputEvent::Pointer(p) => self.current.pointer = p,
            InputEvent::Exit => self.current.exit = true,
        }
    }

    /// Clear a trigger from inside a tick. Used for one-shot triggers.
    pub fn clear(&mut self, trigger: Trigger) {
        self.current.pressed[trigger.index()] = false;
    }

    pub fn snapshot(&self) -> InputSnapshot {
        self.current
    }
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// Sending half handed to the host's input layer. Cheap to clone.
#[derive(Debug, Clone)]
pub struct InputHandle {
    tx: mpsc::UnboundedSender<InputEvent>,
}

impl InputHandle {
    /// Queue an event for the next tick. Returns `false` once the
    /// controller has been dropped.
    pub fn send(&self, event: InputEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Receiving half, drained by the frame controller.
#[derive(Debug)]
pub struct InputQueue {
    rx: mpsc::UnboundedReceiver<InputEvent>,
    state: InputState,
}

impl InputQueue {
    pub fn channel() -> (InputHandle, InputQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            InputHandle { tx },
            InputQueue {
                rx,
                state: InputState::default(),
            },
        )
    }

    /// Apply every queued event and return the resulting snapshot.
    pub fn drain(&mut self) -> InputSnapshot {
        while let Ok(event) = self.rx.try_recv() {
            self.state.apply(event);
        }
        self.state.snapshot()
    }

    pub fn clear(&mut self, trigger: Trigger) {
        self.state.clear(trigger);
    }
}
