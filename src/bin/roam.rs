//! terrain-roam binary
//!
//! Connects to the broadcast peer, builds a heightmap world and runs the
//! frame controller against an input script read from stdin.
//!
//! ## Configuration (CLI / env, plus an optional TOML file via `config`)
//!
//! | Key                        | Default      | Description                          |
//! |----------------------------|--------------|--------------------------------------|
//! | `ROAM_HOST`                | `127.0.0.1`  | Broadcast peer host                  |
//! | `ROAM_PORT`                | `12345`      | Broadcast peer port                  |
//! | `ROAM_CONFIG`              | *(none)*     | TOML file with controller tunables   |
//! | `ROAM_TICK_RATE_HZ`        | `60`         | Frame rate                           |
//! | `ROAM_SEED`                | `42`         | Terrain seed                         |
//! | `ROAM_CONNECT_TIMEOUT_MS`  | `5000`       | Connect / greeting timeout           |
//! | `ROAM_WORLD_HALF_EXTENT`   | `128`        | Terrain spans ±this on X and Y       |
//! | `ROAM_OBSTACLE_SPACING`    | `24`         | Rock lattice spacing (0 = no rocks)  |
//!
//! Controller tunables can also be overridden with `ROAM__<SECTION>__<KEY>`,
//! e.g. `ROAM__CAMERA__MAX_DISTANCE=30`.

use anyhow::{Context, Result};
use clap::Parser;
use glam::{Vec2, Vec3};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use terrain_roam::{
    controller::FrameController,
    host::{HostConfig, RoamHost},
    net::{self, NetConfig},
    structure::{StructureInstance, World, WorldBounds},
    terrain::{HeightmapTerrain, TerrainSource},
    types::ControllerConfig,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "terrain-roam", about = "Terrain-following avatar and chase camera", version)]
struct Args {
    /// Broadcast peer host
    #[arg(long, env = "ROAM_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Broadcast peer port
    #[arg(long, env = "ROAM_PORT", default_value_t = 12345)]
    port: u16,

    /// TOML file with controller tunables
    #[arg(long, env = "ROAM_CONFIG")]
    config: Option<PathBuf>,

    /// Frame rate (Hz)
    #[arg(long, env = "ROAM_TICK_RATE_HZ", default_value_t = 60.0)]
    tick_rate_hz: f32,

    /// Terrain seed
    #[arg(long, env = "ROAM_SEED", default_value_t = 42)]
    seed: u64,

    /// Connect and greeting timeout in milliseconds
    #[arg(long, env = "ROAM_CONNECT_TIMEOUT_MS", default_value_t = 5000)]
    connect_timeout_ms: u64,

    /// Terrain spans ±this many units on X and Y
    #[arg(long, env = "ROAM_WORLD_HALF_EXTENT", default_value_t = 128.0)]
    world_half_extent: f32,

    /// Spacing of the rock lattice; 0 disables obstacles
    #[arg(long, env = "ROAM_OBSTACLE_SPACING", default_value_t = 24.0)]
    obstacle_spacing: f32,
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

fn build_world(args: &Args, heightmap: Arc<HeightmapTerrain>) -> World {
    let extent = args.world_half_extent;
    let mut world = World::new(heightmap.clone()).with_bounds(WorldBounds {
        min: Vec2::splat(-extent),
        max: Vec2::splat(extent),
    });

    if args.obstacle_spacing > 0.0 {
        let steps = (extent / args.obstacle_spacing).floor() as i32;
        for gx in -steps..=steps {
            for gy in -steps..=steps {
                // Keep the spawn point clear.
                if gx == 0 && gy == 0 {
                    continue;
                }
                let x = gx as f32 * args.obstacle_spacing;
                let y = gy as f32 * args.obstacle_spacing;
                let base = Vec3::new(x, y, heightmap.height_at(x, y));
                world.structures.insert(
                    StructureInstance::new(format!("rock.{gx}.{gy}"), base, 1.5, 2.0)
                        .with_tag("rock"),
                );
            }
        }
    }

    log::info!(
        "World ready: ±{} units, {} obstacles",
        extent,
        world.structures.len()
    );
    world
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("terrain_roam=debug".parse()?),
        )
        .init();

    let args = Args::parse();

    let controller_config = ControllerConfig::load(args.config.as_deref())
        .context("Failed to load controller configuration")?;

    log::info!(
        "Starting terrain-roam (peer={}:{}, seed={}, tick_rate={}Hz)",
        args.host,
        args.port,
        args.seed,
        args.tick_rate_hz,
    );

    // The handshake must succeed before any interactive state exists.
    let net_config = NetConfig {
        host: args.host.clone(),
        port: args.port,
        timeout: Duration::from_millis(args.connect_timeout_ms),
        ..Default::default()
    };
    let link = net::connect(&net_config)
        .await
        .context("Failed to establish the broadcast connection")?;
    let (sink, writer) = link.into_sink();

    let heightmap = Arc::new(HeightmapTerrain::new(args.seed, 32.0, 32));
    let world = build_world(&args, heightmap.clone());
    let start = Vec3::new(0.0, 0.0, heightmap.height_at(0.0, 0.0));

    let (controller, input) = FrameController::new(controller_config, start);
    let host_config = HostConfig {
        tick_rate_hz: args.tick_rate_hz,
        ..Default::default()
    };

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    RoamHost::new(host_config, controller, input, world, sink)
        .with_chunk_eviction(heightmap)
        .run(stdin)
        .await;

    // The sink was dropped with the host; give the writer a moment to flush.
    if tokio::time::timeout(Duration::from_secs(1), writer).await.is_err() {
        log::warn!("Broadcast writer did not finish in time");
    }

    // The blocking stdin reader cannot be cancelled and would hold the
    // runtime open until the next line arrives.
    std::process::exit(0)
}
