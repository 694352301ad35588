//! Terrain subsystem: TerrainSource trait, a flat plane, and a seeded
//! heightmap with a chunk cache.

use parking_lot::RwLock;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Anything that can provide a ground height for a planar position.
pub trait TerrainSource: Send + Sync {
    fn height_at(&self, x: f32, y: f32) -> f32;
}

/// Level ground at a fixed height.
#[derive(Debug, Clone, Copy)]
pub struct FlatTerrain {
    pub height: f32,
}

impl TerrainSource for FlatTerrain {
    fn height_at(&self, _x: f32, _y: f32) -> f32 {
        self.height
    }
}

// ---------------------------------------------------------------------------
// Height chunk
// ---------------------------------------------------------------------------

/// `(resolution + 1)²` samples so neighbouring chunks share their edge.
pub struct HeightChunk {
    pub heights: Vec<f32>,
    pub resolution: usize,
    pub world_origin_x: f32,
    pub world_origin_y: f32,
    pub cell_size: f32,
}

impl HeightChunk {
    fn sample(&self, col: usize, row: usize) -> f32 {
        self.heights[row * (self.resolution + 1) + col]
    }

    /// Bilinear height at a world position inside this chunk.
    fn interpolate(&self, x: f32, y: f32) -> f32 {
        let max = self.resolution as f32;
        let gx = ((x - self.world_origin_x) / self.cell_size).clamp(0.0, max);
        let gy = ((y - self.world_origin_y) / self.cell_size).clamp(0.0, max);

        let ix = (gx.floor() as usize).min(self.resolution - 1);
        let iy = (gy.floor() as usize).min(self.resolution - 1);
        let fx = gx - ix as f32;
        let fy = gy - iy as f32;

        let h00 = self.sample(ix, iy);
        let h10 = self.sample(ix + 1, iy);
        let h01 = self.sample(ix, iy + 1);
        let h11 = self.sample(ix + 1, iy + 1);

        let bottom = h00 + (h10 - h00) * fx;
        let top = h01 + (h11 - h01) * fx;
        bottom + (top - bottom) * fy
    }
}

// ---------------------------------------------------------------------------
// Heightmap terrain
// ---------------------------------------------------------------------------

pub struct HeightmapTerrain {
    pub seed: u64,
    /// World-space width/height of a single terrain chunk.
    pub chunk_size: f32,
    /// Cells per chunk side.
    pub resolution: usize,
    /// Peak deviation from zero height.
    pub amplitude: f32,
    cache: RwLock<HashMap<(i32, i32), Arc<HeightChunk>>>,
}

impl HeightmapTerrain {
    pub fn new(seed: u64, chunk_size: f32, resolution: usize) -> Self {
        Self {
            seed,
            chunk_size,
            resolution: resolution.max(1),
            amplitude: 3.0,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn chunk_coord(&self, x: f32, y: f32) -> (i32, i32) {
        (
            (x / self.chunk_size).floor() as i32,
            (y / self.chunk_size).floor() as i32,
        )
    }

    pub fn cached_chunks(&self) -> usize {
        self.cache.read().len()
    }

    // -----------------------------------------------------------------------
    // Cache helpers
    // -----------------------------------------------------------------------

    pub fn get_or_generate_chunk(&self, cx: i32, cy: i32) -> Arc<HeightChunk> {
        if let Some(chunk) = self.cache.read().get(&(cx, cy)) {
            return chunk.clone();
        }
        let mut cache = self.cache.write();
        match cache.entry((cx, cy)) {
            Entry::Occupied(e) => e.get().clone(),
            Entry::Vacant(v) => {
                let chunk = Arc::new(self.generate_chunk(cx, cy));
                v.insert(chunk.clone());
                chunk
            }
        }
    }

    /// Evict every chunk further than `max_chunks` from `origin` in
    /// Chebyshev distance.
    pub fn evict_distant_chunks(&self, origin_cx: i32, origin_cy: i32, max_chunks: i32) {
        let mut cache = self.cache.write();
        cache.retain(|(cx, cy), _| {
            let dx = (cx - origin_cx).abs();
            let dy = (cy - origin_cy).abs();
            dx <= max_chunks && dy <= max_chunks
        });
    }

    // -----------------------------------------------------------------------
    // Generation
    // -----------------------------------------------------------------------

    fn generate_chunk(&self, cx: i32, cy: i32) -> HeightChunk {
        let resolution = self.resolution;
        let cell_size = self.chunk_size / resolution as f32;
        let world_origin_x = cx as f32 * self.chunk_size;
        let world_origin_y = cy as f32 * self.chunk_size;

        let mut heights = Vec::with_capacity((resolution + 1) * (resolution + 1));
        for row in 0..=resolution {
            for col in 0..=resolution {
                let wx = world_origin_x + col as f32 * cell_size;
                let wy = world_origin_y + row as f32 * cell_size;
                heights.push(self.sample_noise(wx, wy));
            }
        }

        HeightChunk {
            heights,
            resolution,
            world_origin_x,
            world_origin_y,
            cell_size,
        }
    }

    /// Two octaves of seeded sine ridges, bounded by `amplitude`.
    fn sample_noise(&self, x: f32, y: f32) -> f32 {
        let phase = (self.seed.wrapping_mul(6364136223846793005).wrapping_add(1) >> 40) as f32
            * 1e-3;
        let broad = (x * 0.03 + phase).sin() * (y * 0.03 - phase).cos();
        let fine = (x * 0.11 - phase).sin() * (y * 0.13 + phase).sin();
        (broad * 0.75 + fine * 0.25) * self.amplitude
    }
}

impl TerrainSource for HeightmapTerrain {
    fn height_at(&self, x: f32, y: f32) -> f32 {
        let (cx, cy) = self.chunk_coord(x, y);
        self.get_or_generate_chunk(cx, cy).interpolate(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_edges_agree() {
        let t = HeightmapTerrain::new(7, 16.0, 8);
        // x = 16.0 is the far edge of chunk 0 and the near edge of chunk 1.
        let left = t.get_or_generate_chunk(0, 0).interpolate(16.0, 5.0);
        let right = t.get_or_generate_chunk(1, 0).interpolate(16.0, 5.0);
        assert!((left - right).abs() < 1e-4);
    }

    #[test]
    fn interpolation_hits_samples_on_grid_points() {
        let t = HeightmapTerrain::new(3, 8.0, 4);
        let chunk = t.get_or_generate_chunk(0, 0);
        assert_eq!(chunk.interpolate(2.0, 4.0), chunk.sample(1, 2));
    }
}
