//! Outbound wire messages.
//!
//! Two message kinds leave the controller:
//!
//! | Message            | Legacy shape                  | JSON shape               |
//! |--------------------|-------------------------------|--------------------------|
//! | position broadcast | `{"character : "[x, y, z]}`   | `{"character":[x,y,z]}`  |
//! | pointer telemetry  | `{"mouse : "[x, y]}`          | `{"mouse":[x,y]}`        |
//!
//! The legacy shape is not valid JSON (the key swallows the colon and the
//! value is unquoted). Peers already parse it that way, so it is the
//! default and is reproduced byte for byte.

use glam::{Vec2, Vec3};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::types::WireFormat;

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Avatar position published by the broadcast throttle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub character: [f32; 3],
}

impl From<Vec3> for PositionUpdate {
    fn from(v: Vec3) -> Self {
        Self {
            character: v.to_array(),
        }
    }
}

/// Pointer position sampled during a drag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerTelemetry {
    pub mouse: [f32; 2],
}

impl From<Vec2> for PointerTelemetry {
    fn from(v: Vec2) -> Self {
        Self { mouse: v.to_array() }
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Render floats as a bracketed list: `[1.0, -2.5, 3.0]`.
pub fn format_list(values: &[f32]) -> String {
    let items: Vec<String> = values.iter().map(|v| format!("{v:?}")).collect();
    format!("[{}]", items.join(", "))
}

fn legacy(key: &str, values: &[f32]) -> String {
    format!("{{\"{key} : \"{}}}", format_list(values))
}

fn json<T: Serialize>(payload: &T, fallback: impl FnOnce() -> String) -> String {
    serde_json::to_string(payload).unwrap_or_else(|e| {
        warn!("Failed to serialise payload, falling back to legacy shape: {}", e);
        fallback()
    })
}

pub fn encode_position(format: WireFormat, position: Vec3) -> String {
    let update = PositionUpdate::from(position);
    match format {
        WireFormat::Legacy => legacy("character", &update.character),
        WireFormat::Json => json(&update, || legacy("character", &update.character)),
    }
}

pub fn encode_pointer(format: WireFormat, pointer: Vec2) -> String {
    let telemetry = PointerTelemetry::from(pointer);
    match format {
        WireFormat::Legacy => legacy("mouse", &telemetry.mouse),
        WireFormat::Json => json(&telemetry, || legacy("mouse", &telemetry.mouse)),
    }
}
