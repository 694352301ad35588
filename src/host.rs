//! Host loop – drives a [`FrameController`] at a fixed rate.
//!
//! ## Inputs
//!
//! The host reads a line-based input script (normally stdin):
//!
//! | Line                 | Event                          |
//! |----------------------|--------------------------------|
//! | `press <trigger>`    | trigger held                   |
//! | `release <trigger>`  | trigger released               |
//! | `pointer <x> <y>`    | pointer moved                  |
//! | `exit`               | stop after the current tick    |
//!
//! Blank lines and lines starting with `#` are skipped.
//!
//! ## Shutdown
//!
//! The loop ends on the exit trigger or on SIGINT, whichever comes first.

use log::{debug, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::animation::LogAnimator;
use crate::broadcast::BroadcastSink;
use crate::controller::FrameController;
use crate::input::{InputEvent, InputHandle};
use crate::structure::World;
use crate::terrain::HeightmapTerrain;
use crate::types::ControllerStats;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Shortest frame the loop will schedule, whatever the tick rate says.
pub const MIN_FRAME_BUDGET: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Frames per second.
    pub tick_rate_hz: f32,
    /// Terrain chunks kept around the avatar (Chebyshev radius).
    pub cache_radius_chunks: i32,
    /// Ticks between chunk cache sweeps.
    pub cache_sweep_interval: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60.0,
            cache_radius_chunks: 4,
            cache_sweep_interval: 300,
        }
    }
}

impl HostConfig {
    /// Wall time per tick. Rates below 1 Hz run at 1 Hz; huge or infinite
    /// rates are floored at [`MIN_FRAME_BUDGET`].
    pub fn frame_budget(&self) -> Duration {
        let secs = 1.0 / self.tick_rate_hz.max(1.0);
        Duration::from_secs_f32(secs).max(MIN_FRAME_BUDGET)
    }
}

// ---------------------------------------------------------------------------
// Input script
// ---------------------------------------------------------------------------

/// Parse `reader` line by line into `handle` until EOF.
///
/// Returns the number of events queued. Bad lines are logged and skipped.
pub async fn feed_script<R>(reader: R, handle: InputHandle) -> usize
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut sent = 0;
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("Input script read failed: {}", e);
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.parse::<InputEvent>() {
            Ok(event) => {
                if !handle.send(event) {
                    break;
                }
                sent += 1;
            }
            Err(e) => warn!("Skipping input line: {}", e),
        }
    }
    debug!("Input script finished after {} events", sent);
    sent
}

// ---------------------------------------------------------------------------
// RoamHost
// ---------------------------------------------------------------------------

/// Owns the controller, the world it walks on and the broadcast sink.
pub struct RoamHost<S: BroadcastSink> {
    config: HostConfig,
    controller: FrameController,
    input: InputHandle,
    world: World,
    heightmap: Option<Arc<HeightmapTerrain>>,
    sink: S,
    animator: LogAnimator,
}

impl<S: BroadcastSink> RoamHost<S> {
    pub fn new(
        config: HostConfig,
        controller: FrameController,
        input: InputHandle,
        world: World,
        sink: S,
    ) -> Self {
        Self {
            config,
            controller,
            input,
            world,
            heightmap: None,
            sink,
            animator: LogAnimator,
        }
    }

    /// Periodically evict heightmap chunks far from the avatar.
    pub fn with_chunk_eviction(mut self, heightmap: Arc<HeightmapTerrain>) -> Self {
        self.heightmap = Some(heightmap);
        self
    }

    pub fn input(&self) -> InputHandle {
        self.input.clone()
    }

    /// Feed `reader` as the input script and tick until exit or SIGINT.
    pub async fn run<R>(mut self, script: R) -> ControllerStats
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let reader: JoinHandle<usize> = tokio::spawn(feed_script(script, self.input.clone()));

        info!(
            "RoamHost active – ticking at {:.0}Hz",
            self.config.tick_rate_hz
        );

        tokio::select! {
            _ = self.frame_loop() => {
                info!("Exit trigger received, stopping frame loop");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("RoamHost shutting down (SIGINT)");
            }
        }

        reader.abort();
        let stats = self.controller.stats();
        info!(
            "Session ended after {} ticks ({} rollbacks, {} broadcasts)",
            stats.total_ticks, stats.rollbacks, stats.broadcasts
        );
        stats
    }

    async fn frame_loop(&mut self) {
        let budget = self.config.frame_budget();
        let mut timer = tokio::time::interval(budget);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last = Instant::now();

        loop {
            timer.tick().await;
            let now = Instant::now();
            let dt = now.duration_since(last).as_secs_f32().max(f32::EPSILON);
            last = now;

            let report = {
                let _span = tracing::debug_span!("tick").entered();
                self.controller
                    .tick(dt, &self.world, &mut self.animator, &mut self.sink)
            };

            let took = now.elapsed();
            if took > budget {
                debug!("Tick {} took {:?} (budget {:?})", report.tick, took, budget);
            }
            if let Some(msg) = &report.pointer_telemetry {
                log::trace!("pointer telemetry: {}", msg);
            }
            if report.tick % self.config.cache_sweep_interval.max(1) == 0 {
                self.sweep_chunks();
            }
            if report.exit_requested {
                break;
            }
        }
    }

    fn sweep_chunks(&self) {
        let Some(heightmap) = &self.heightmap else {
            return;
        };
        let pos = self.controller.avatar().position;
        let (cx, cy) = heightmap.chunk_coord(pos.x, pos.y);
        heightmap.evict_distant_chunks(cx, cy, self.config.cache_radius_chunks);
    }
}
