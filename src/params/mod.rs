//! Parameter definitions with physical units and documented semantics.
//!
//! All tunables are collected here with:
//! - Physical units (meters, seconds, milliseconds)
//! - Documented ranges and meanings
//! - Validation at construction time

mod camera;
mod render;
mod surface;
mod wave;

// Re-export all types
pub use camera::{CameraPreset, FixedCamera, FlyoverCamera, OrbitCamera};
pub use render::{RecordingConfig, RenderConfig};
pub use surface::{NormalMode, SurfaceConfig, TileLayout, UpdateConfig};
pub use wave::{
    WaveModel, WaveParameters, WaveSettings, MAX_OCTAVES, OCTAVE_ANGLES_RAD, OCTAVE_FALLOFF,
    OCTAVE_HARMONICS,
};
