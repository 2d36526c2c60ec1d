//! Command-line argument parsing for the demo host.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use glam::{UVec2, Vec2};
use log::{info, warn};

use crate::error::Result;
use crate::params::{
    CameraPreset, FixedCamera, FlyoverCamera, NormalMode, OrbitCamera, RecordingConfig,
    SurfaceConfig, WaveModel, WaveParameters,
};

/// Normal rebuild strategy as spelled on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NormalsArg {
    Analytic,
    Grid,
}

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Wavesurface")]
#[command(about = "Animated, seamlessly tiled water surface viewer", long_about = None)]
pub struct Args {
    /// RON surface configuration; wave flags below override its values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Wave amplitude bound (meters)
    #[arg(long, value_name = "METERS")]
    pub wave_height: Option<f32>,

    /// Wave length (meters)
    #[arg(long, value_name = "METERS")]
    pub wave_length: Option<f32>,

    /// Wave speed (time divisor)
    #[arg(long)]
    pub wave_speed: Option<f32>,

    /// Number of superposed wave octaves (1-4)
    #[arg(long)]
    pub octaves: Option<u32>,

    /// Gerstner steepness (0-1); omit for plain sine waves
    #[arg(long, value_name = "Q")]
    pub steepness: Option<f32>,

    /// Tile grid size (N x N tiles)
    #[arg(long, value_name = "N")]
    pub tiles: Option<u32>,

    /// Normal rebuild strategy
    #[arg(long, value_enum)]
    pub normals: Option<NormalsArg>,

    /// Record frames to disk (duration in seconds)
    #[arg(long, value_name = "SECONDS")]
    pub record: Option<f32>,

    /// Camera preset: orbit (default), flyover, fixed
    #[arg(long, value_name = "PRESET", default_value = "orbit")]
    pub camera_preset: String,

    /// Draw triangle edges instead of filled faces
    #[arg(long)]
    pub wireframe: bool,
}

impl Args {
    /// Load the configuration file (if any) and apply command-line overrides.
    pub fn surface_config(&self) -> Result<SurfaceConfig> {
        let mut config = match &self.config {
            Some(path) => SurfaceConfig::load_ron(path)?,
            None => Self::demo_defaults(),
        };

        let mut wave = config.wave.settings();
        if let Some(height) = self.wave_height {
            wave.height_m = height;
        }
        if let Some(length) = self.wave_length {
            wave.length_m = length;
        }
        if let Some(speed) = self.wave_speed {
            wave.speed = speed;
        }
        if let Some(octaves) = self.octaves {
            wave.octaves = octaves;
        }
        if let Some(steepness) = self.steepness {
            wave.model = WaveModel::Gerstner { steepness };
        }
        config.wave = WaveParameters::from_settings(&wave)?;

        if let Some(n) = self.tiles {
            config.tiles = UVec2::splat(n);
        }
        if let Some(normals) = self.normals {
            config.update.normal_mode = match normals {
                NormalsArg::Analytic => NormalMode::Analytic,
                NormalsArg::Grid => NormalMode::Grid,
            };
        }

        config.validate()?;
        info!(
            "Surface: {}x{} tiles, wave height {}m length {}m speed {}, {} octave(s), {:?} normals",
            config.tiles.x,
            config.tiles.y,
            config.wave.height(),
            config.wave.length(),
            config.wave.speed(),
            config.wave.octaves(),
            config.update.normal_mode
        );
        Ok(config)
    }

    /// Viewer defaults: 3x3 tiles of 1000m, waves slow enough to watch at 60 FPS
    fn demo_defaults() -> SurfaceConfig {
        let mut config = SurfaceConfig {
            tiles: UVec2::splat(3),
            ..SurfaceConfig::default()
        };
        config.layout.segments = UVec2::splat(100);
        config.layout.segment_size_m = Vec2::splat(10.0);
        // Milliseconds to seconds
        config.update.time_scale = 0.001;
        let mut wave = config.wave.settings();
        wave.height_m = 6.0;
        wave.length_m = 120.0;
        wave.speed = 0.1;
        wave.octaves = 3;
        config.wave = WaveParameters::from_settings(&wave).unwrap_or_default();
        config
    }

    /// Parse camera preset from command-line arguments
    pub fn parse_camera_preset(&self) -> CameraPreset {
        match self.camera_preset.to_lowercase().as_str() {
            "orbit" => {
                info!("Camera: Orbit");
                CameraPreset::Orbit(OrbitCamera::default())
            }
            "flyover" => {
                info!("Camera: Flyover (straight-line flight)");
                CameraPreset::Flyover(FlyoverCamera::default())
            }
            "fixed" => {
                info!("Camera: Fixed");
                CameraPreset::Fixed(FixedCamera::default())
            }
            other => {
                warn!("Unknown camera preset '{}', using orbit", other);
                CameraPreset::Orbit(OrbitCamera::default())
            }
        }
    }

    /// Create recording configuration if recording mode is enabled
    pub fn create_recording_config(&self) -> Result<Option<RecordingConfig>> {
        let Some(duration) = self.record else {
            return Ok(None);
        };
        let config = RecordingConfig::new(duration);

        // Create output directories
        std::fs::create_dir_all(config.frames_dir())?;
        Ok(Some(config))
    }
}
