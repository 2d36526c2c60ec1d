//! Tile layout, update policy and the combined surface configuration file.

use std::path::Path;

use glam::{UVec2, Vec2};
use log::debug;
use serde::{Deserialize, Serialize};

use super::wave::WaveParameters;
use crate::error::{Result, WaterError};

/// Geometry of one water tile, consumed by the flat-grid generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileLayout {
    /// Size of one grid segment in world units (meters), X and Z
    pub segment_size_m: Vec2,

    /// Number of segments along X and Z
    pub segments: UVec2,

    /// How often the texture repeats across the whole tile (U, V)
    pub uv_repeat: Vec2,

    /// Number of vertex buffers (row bands) the tile is split into
    pub buffers: u32,
}

impl Default for TileLayout {
    fn default() -> Self {
        // 1000m tile with 20 segments per side, texture repeated 10 times
        Self {
            segment_size_m: Vec2::splat(50.0),
            segments: UVec2::splat(20),
            uv_repeat: Vec2::splat(10.0),
            buffers: 1,
        }
    }
}

impl TileLayout {
    pub fn new(segment_size_m: Vec2, segments: UVec2) -> Self {
        Self {
            segment_size_m,
            segments,
            ..Self::default()
        }
    }

    /// Total tile extent in world units (meters)
    pub fn extent_m(&self) -> Vec2 {
        self.segment_size_m * self.segments.as_vec2()
    }

    pub fn validate(&self) -> Result<()> {
        if self.segments.x == 0 || self.segments.y == 0 {
            return Err(WaterError::invalid(
                "segments",
                format!("segment counts must be > 0, got {}", self.segments),
            ));
        }
        let size = self.segment_size_m;
        if !size.is_finite() || size.x <= 0.0 || size.y <= 0.0 {
            return Err(WaterError::invalid(
                "segment_size",
                format!("must be finite and > 0, got {size}"),
            ));
        }
        if !self.uv_repeat.is_finite() {
            return Err(WaterError::invalid(
                "uv_repeat",
                format!("must be finite, got {}", self.uv_repeat),
            ));
        }
        if self.buffers == 0 || self.buffers > self.segments.y {
            return Err(WaterError::invalid(
                "buffers",
                format!(
                    "must be in 1..={} (one band needs at least one segment row), got {}",
                    self.segments.y, self.buffers
                ),
            ));
        }
        Ok(())
    }
}

/// How vertex normals are rebuilt after the height pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NormalMode {
    /// Evaluate the wave field's analytic normal at each vertex (seam-exact)
    #[default]
    Analytic,

    /// Average the cross products of edges to grid neighbours
    Grid,
}

/// Per-tick update policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    pub normal_mode: NormalMode,

    /// Minimum simulated interval between normal rebuilds (milliseconds).
    /// 0 rebuilds every tick.
    pub normal_refresh_ms: u32,

    /// Multiplier on elapsed milliseconds before dividing by wave speed
    pub time_scale: f32,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            normal_mode: NormalMode::Analytic,
            normal_refresh_ms: 0,
            time_scale: 1.0,
        }
    }
}

impl UpdateConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.time_scale.is_finite() || self.time_scale <= 0.0 {
            return Err(WaterError::invalid(
                "time_scale",
                format!("must be finite and > 0, got {}", self.time_scale),
            ));
        }
        Ok(())
    }
}

/// Everything needed to build a tiled water surface, loadable from RON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub wave: WaveParameters,
    pub layout: TileLayout,
    pub update: UpdateConfig,

    /// Tile grid dimensions (columns along X, rows along Z)
    pub tiles: UVec2,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            wave: WaveParameters::default(),
            layout: TileLayout::default(),
            update: UpdateConfig::default(),
            tiles: UVec2::ONE,
        }
    }
}

impl SurfaceConfig {
    /// Parse and validate a RON document.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_ron_str(&text)?;
        debug!(
            "Loaded surface config from {}: {}x{} tiles",
            path.display(),
            config.tiles.x,
            config.tiles.y
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.layout.validate()?;
        self.update.validate()?;
        if self.tiles.x == 0 || self.tiles.y == 0 {
            return Err(WaterError::invalid(
                "tiles",
                format!("tile grid must be at least 1x1, got {}", self.tiles),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_is_thousand_meter_tile() {
        let layout = TileLayout::default();
        assert!(layout.validate().is_ok());
        assert_eq!(layout.extent_m(), Vec2::splat(1000.0));
    }

    #[test]
    fn test_layout_rejects_zero_segments() {
        let layout = TileLayout::new(Vec2::ONE, UVec2::new(0, 4));
        assert!(matches!(
            layout.validate(),
            Err(WaterError::InvalidParameter { name: "segments", .. })
        ));
    }

    #[test]
    fn test_layout_rejects_bad_sizes_and_buffers() {
        let layout = TileLayout::new(Vec2::new(1.0, -1.0), UVec2::splat(4));
        assert!(layout.validate().is_err());

        let layout = TileLayout {
            buffers: 5,
            ..TileLayout::new(Vec2::ONE, UVec2::splat(4))
        };
        assert!(matches!(
            layout.validate(),
            Err(WaterError::InvalidParameter { name: "buffers", .. })
        ));
    }

    #[test]
    fn test_update_config_rejects_zero_time_scale() {
        let config = UpdateConfig {
            time_scale: 0.0,
            ..UpdateConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_surface_config_from_ron() {
        let text = r#"(
            wave: (height_m: 1.0, length_m: 40.0, speed: 2.0, octaves: 3),
            layout: (segment_size_m: (2.0, 2.0), segments: (16, 16), buffers: 2),
            update: (normal_mode: Grid),
            tiles: (3, 2),
        )"#;
        let config = SurfaceConfig::from_ron_str(text).unwrap();
        assert_eq!(config.wave.octaves(), 3);
        assert_eq!(config.layout.segments, UVec2::splat(16));
        assert_eq!(config.layout.uv_repeat, Vec2::splat(10.0));
        assert_eq!(config.update.normal_mode, NormalMode::Grid);
        assert_eq!(config.tiles, UVec2::new(3, 2));
    }

    #[test]
    fn test_load_shipped_config() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/open_sea.ron");
        let config = SurfaceConfig::load_ron(path).unwrap();
        assert_eq!(config.tiles, UVec2::splat(3));
        assert_eq!(config.layout.buffers, 2);
        assert_eq!(config.wave.model(), crate::params::WaveModel::Gerstner { steepness: 0.5 });
    }

    #[test]
    fn test_missing_config_file_is_io_error() {
        let result = SurfaceConfig::load_ron("does/not/exist.ron");
        assert!(matches!(result, Err(WaterError::Io(_))));
    }

    #[test]
    fn test_surface_config_rejects_invalid_wave() {
        let text = "(wave: (length_m: 0.0))";
        assert!(SurfaceConfig::from_ron_str(text).is_err());
    }
}
