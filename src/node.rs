//! Host-engine adapter: capability traits and a composable water node.
//!
//! The host's scene graph owns node placement, visibility culling and drawing.
//! It talks to water through two narrow capabilities:
//!
//! - [`Animatable`]: called once per frame with the elapsed time and the
//!   node's current world transform.
//! - [`MeshDataProvider`]: hands dirty mesh buffers to a [`RenderSink`], one
//!   draw per material group.
//!
//! Service handles (transform, renderer) are passed in per call and never stored.

use std::sync::Arc;

use glam::Vec3;
use log::{debug, warn};

use crate::error::Result;
use crate::params::{SurfaceConfig, TileLayout, UpdateConfig, WaveParameters};
use crate::surface::{
    Aabb, Material, MeshBuffer, SurfaceInstance, SurfaceUpdater, TextureHandle, TileMesh,
    WorldTransform, MATERIAL_MAX_TEXTURES,
};

/// Something that advances with the host's animation clock.
pub trait Animatable {
    fn on_animate(&mut self, time_ms: u32, transform: &dyn WorldTransform) -> Result<()>;
}

/// Host renderer endpoint for mesh submission.
pub trait RenderSink {
    /// Translation to apply to the following buffers
    fn set_world_translation(&mut self, translation: Vec3);

    /// Draw one buffer with its material
    fn draw_mesh_buffer(&mut self, buffer: &MeshBuffer);
}

/// Provides mesh data for rendering.
pub trait MeshDataProvider {
    fn mesh(&self) -> &TileMesh;

    /// Read and clear the dirty flag; `true` means GPU copies must be re-uploaded.
    fn take_dirty(&mut self) -> bool;

    /// Submit every buffer to `sink`.
    fn submit(&self, sink: &mut dyn RenderSink);
}

impl MeshDataProvider for SurfaceInstance {
    fn mesh(&self) -> &TileMesh {
        SurfaceInstance::mesh(self)
    }

    fn take_dirty(&mut self) -> bool {
        self.mesh_mut().take_dirty()
    }

    fn submit(&self, sink: &mut dyn RenderSink) {
        sink.set_world_translation(self.origin());
        for buffer in SurfaceInstance::mesh(self).buffers() {
            sink.draw_mesh_buffer(buffer);
        }
    }
}

/// A single animated water surface, ready to be composed into a host node.
#[derive(Debug)]
pub struct WaterNode {
    surface: SurfaceInstance,
    updater: SurfaceUpdater,
    visible: bool,
}

impl WaterNode {
    pub fn new(params: Arc<WaveParameters>, layout: &TileLayout, config: UpdateConfig) -> Result<Self> {
        let surface = SurfaceInstance::from_layout(layout, params)?;
        let updater = SurfaceUpdater::new(config)?;
        debug!(
            "Created water node: {} vertices, wave height {}m length {}m speed {}",
            surface.mesh().total_vertex_count(),
            surface.params().height(),
            surface.params().length(),
            surface.params().speed()
        );
        Ok(Self {
            surface,
            updater,
            visible: true,
        })
    }

    /// Single node from a loaded configuration (the tile grid size is ignored).
    pub fn from_config(config: &SurfaceConfig) -> Result<Self> {
        config.validate()?;
        Self::new(
            Arc::new(config.wave.clone()),
            &config.layout,
            config.update.clone(),
        )
    }

    pub fn surface(&self) -> &SurfaceInstance {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut SurfaceInstance {
        &mut self.surface
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Hidden nodes neither animate nor submit geometry.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Local-space bounds of the current mesh
    pub fn bounding_box(&self) -> Aabb {
        self.surface.mesh().bounding_box()
    }

    pub fn material_count(&self) -> usize {
        self.surface.mesh().buffer_count()
    }

    pub fn material(&self, index: usize) -> Option<&Material> {
        self.surface.mesh().buffers().get(index).map(|b| &b.material)
    }

    /// Bind `texture` to `layer` on every buffer's material.
    ///
    /// Layers beyond [`MATERIAL_MAX_TEXTURES`] are ignored.
    pub fn set_material_texture(&mut self, layer: usize, texture: Option<TextureHandle>) {
        if layer >= MATERIAL_MAX_TEXTURES {
            warn!("Ignoring texture for layer {layer}: only {MATERIAL_MAX_TEXTURES} layers supported");
            return;
        }
        for buffer in self.surface.mesh_mut().buffers_mut() {
            buffer.material.textures[layer] = texture;
        }
    }
}

impl Animatable for WaterNode {
    fn on_animate(&mut self, time_ms: u32, transform: &dyn WorldTransform) -> Result<()> {
        if !self.visible {
            return Ok(());
        }
        self.updater
            .advance_with_transform(&mut self.surface, time_ms, transform)
    }
}

impl MeshDataProvider for WaterNode {
    fn mesh(&self) -> &TileMesh {
        self.surface.mesh()
    }

    fn take_dirty(&mut self) -> bool {
        self.surface.mesh_mut().take_dirty()
    }

    fn submit(&self, sink: &mut dyn RenderSink) {
        if self.visible {
            self.surface.submit(sink);
        }
    }
}
