//! Wavesurface library - procedural water surface simulation and mesh update
//!
//! The core (`wave`, `surface`, `node`) has no rendering dependency; `camera`,
//! `cli` and `rendering` make up the demo host that drives it.

pub mod camera;
pub mod cli;
pub mod error;
pub mod node;
pub mod params;
pub mod rendering;
pub mod surface;
pub mod wave;

pub use error::{Result, WaterError};
pub use node::{Animatable, MeshDataProvider, RenderSink, WaterNode};
pub use params::{NormalMode, SurfaceConfig, TileLayout, UpdateConfig, WaveModel, WaveParameters};
pub use surface::{
    LatticePlacement, SurfaceInstance, SurfacePatchSet, SurfaceUpdater, TileMesh, Vertex, WorldTransform,
};
pub use wave::WaveField;
