//! Water surface tiles and their per-tick update.

mod mesh;
mod patch_set;
mod updater;

use std::sync::Arc;

use glam::{Affine3A, DVec2, IVec2, Mat4, UVec2, Vec2, Vec3};

use crate::error::{Result, WaterError};
use crate::params::{TileLayout, WaveParameters};

// Re-export public types
pub use mesh::{
    Aabb, Material, MeshBuffer, TextureHandle, TileMesh, Vertex, MATERIAL_MAX_TEXTURES,
};
pub use patch_set::SurfacePatchSet;
pub use updater::SurfaceUpdater;

/// Source of a node's absolute world translation.
///
/// Only the translation feeds the wave math; rotation and scale of the water
/// plane are applied by the host when drawing.
pub trait WorldTransform {
    fn absolute_translation(&self) -> Vec3;
}

impl WorldTransform for Mat4 {
    fn absolute_translation(&self) -> Vec3 {
        self.w_axis.truncate()
    }
}

impl WorldTransform for Affine3A {
    fn absolute_translation(&self) -> Vec3 {
        self.translation.into()
    }
}

impl WorldTransform for Vec3 {
    fn absolute_translation(&self) -> Vec3 {
        *self
    }
}

/// Placement of a tile on a segment lattice shared with its neighbours.
///
/// Tiles on the same lattice sample the wave field at
/// `anchor + (corner + index) * segment_size`, evaluated in f64 from integer
/// indices, so a vertex shared by two tiles gets the same sample point bit for bit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticePlacement {
    /// World XZ of lattice point (0, 0)
    pub anchor: DVec2,
    /// Lattice index of the tile's first vertex (its -X, -Z corner)
    pub corner: IVec2,
}

/// Maps a vertex's tile lattice index to the world XZ it samples.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SampleFrame {
    base: DVec2,
    corner: IVec2,
    spacing: DVec2,
}

impl SampleFrame {
    #[inline]
    pub(crate) fn world(&self, index: UVec2) -> Vec2 {
        let lattice = (self.corner + index.as_ivec2()).as_dvec2();
        (self.base + lattice * self.spacing).as_vec2()
    }
}

/// One tile mesh bound to a wave parameter set and a world-space origin.
///
/// Many instances may share the same `Arc<WaveParameters>`; that is what keeps
/// a tiled ocean seamless.
#[derive(Debug, Clone)]
pub struct SurfaceInstance {
    mesh: TileMesh,
    params: Arc<WaveParameters>,
    /// Absolute translation of the owning node
    origin: Vec3,
    /// Exact lattice placement; `None` samples at `origin + rest`
    lattice: Option<LatticePlacement>,
    /// Refresh bucket of the last normal rebuild (`None` forces a rebuild)
    pub(crate) normals_bucket: Option<u32>,
}

impl SurfaceInstance {
    pub fn new(mesh: TileMesh, params: Arc<WaveParameters>) -> Self {
        Self {
            mesh,
            params,
            origin: Vec3::ZERO,
            lattice: None,
            normals_bucket: None,
        }
    }

    /// Build the flat tile mesh for `layout` and bind it to `params`.
    pub fn from_layout(layout: &TileLayout, params: Arc<WaveParameters>) -> Result<Self> {
        Ok(Self::new(TileMesh::hill_plane(layout)?, params))
    }

    /// Place the instance at `origin` (builder form of [`Self::set_world_transform`]).
    pub fn with_origin(mut self, origin: Vec3) -> Result<Self> {
        self.set_world_transform(&origin)?;
        Ok(self)
    }

    /// Pin the instance to a shared lattice (see [`LatticePlacement`]).
    ///
    /// Call after placing the origin; moving the instance afterwards drops the
    /// placement.
    pub fn with_lattice(mut self, placement: LatticePlacement) -> Self {
        self.lattice = Some(placement);
        self.normals_bucket = None;
        self
    }

    pub fn lattice(&self) -> Option<LatticePlacement> {
        self.lattice
    }

    pub fn mesh(&self) -> &TileMesh {
        &self.mesh
    }

    pub fn mesh_mut(&mut self) -> &mut TileMesh {
        &mut self.mesh
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut TileMesh, &WaveParameters) {
        (&mut self.mesh, &self.params)
    }

    pub fn params(&self) -> &Arc<WaveParameters> {
        &self.params
    }

    /// Swap in a new parameter set; takes effect on the next advance.
    pub fn set_wave_parameters(&mut self, params: Arc<WaveParameters>) {
        self.params = params;
        self.normals_bucket = None;
    }

    /// Absolute translation of the owning node
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// XZ of the origin; free tiles sample the wave field around it
    pub fn world_offset(&self) -> Vec2 {
        Vec2::new(self.origin.x, self.origin.z)
    }

    pub(crate) fn sample_frame(&self) -> SampleFrame {
        let spacing = self.mesh.segment_size().as_dvec2();
        match self.lattice {
            Some(placement) => SampleFrame {
                base: placement.anchor,
                corner: placement.corner,
                spacing,
            },
            None => {
                let half = self.mesh.segments().as_dvec2() * spacing * 0.5;
                let origin = DVec2::new(f64::from(self.origin.x), f64::from(self.origin.z));
                SampleFrame {
                    base: origin - half,
                    corner: IVec2::ZERO,
                    spacing,
                }
            }
        }
    }

    /// World XZ where vertex `local` of `buffer` samples the wave field.
    pub fn sample_position(&self, buffer: usize, local: usize) -> Option<Vec2> {
        let band = self.mesh.buffers().get(buffer)?;
        (local < band.vertices().len()).then(|| self.sample_frame().world(band.lattice_index(local)))
    }

    /// Refresh the origin from the host's transform.
    ///
    /// Non-finite translations are rejected and leave the instance unchanged.
    /// A changed origin drops any lattice placement.
    pub fn set_world_transform(&mut self, transform: &(impl WorldTransform + ?Sized)) -> Result<()> {
        let origin = transform.absolute_translation();
        if !origin.is_finite() {
            return Err(WaterError::PreconditionViolated(format!(
                "world translation must be finite, got {origin}"
            )));
        }
        if origin != self.origin {
            self.normals_bucket = None;
            self.lattice = None;
        }
        self.origin = origin;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    fn instance() -> SurfaceInstance {
        let layout = TileLayout::new(Vec2::ONE, UVec2::splat(2));
        SurfaceInstance::from_layout(&layout, Arc::new(WaveParameters::default())).unwrap()
    }

    #[test]
    fn test_translation_from_transforms() {
        let t = Vec3::new(3.0, 4.0, 5.0);
        let mat = Mat4::from_scale_rotation_translation(Vec3::splat(2.0), Quat::from_rotation_y(0.7), t);
        assert_eq!(mat.absolute_translation(), t);
        assert_eq!(Affine3A::from_translation(t).absolute_translation(), t);
        assert_eq!(t.absolute_translation(), t);
    }

    #[test]
    fn test_world_offset_uses_xz_only() {
        let inst = instance().with_origin(Vec3::new(10.0, 99.0, -4.0)).unwrap();
        assert_eq!(inst.world_offset(), Vec2::new(10.0, -4.0));
    }

    #[test]
    fn test_rejects_non_finite_transform() {
        let mut inst = instance().with_origin(Vec3::X).unwrap();
        let err = inst.set_world_transform(&Vec3::new(f32::NAN, 0.0, 0.0));
        assert!(matches!(err, Err(WaterError::PreconditionViolated(_))));
        assert_eq!(inst.origin(), Vec3::X);
    }

    #[test]
    fn test_parameter_swap_forces_normal_rebuild() {
        let mut inst = instance();
        inst.normals_bucket = Some(3);
        inst.set_wave_parameters(Arc::new(WaveParameters::new(1.0, 5.0, 1.0).unwrap()));
        assert_eq!(inst.normals_bucket, None);
        assert_eq!(inst.params().height(), 1.0);
    }

    #[test]
    fn test_free_sample_position_is_origin_plus_rest() {
        let inst = instance().with_origin(Vec3::new(10.0, 0.0, -4.0)).unwrap();
        // 2x2 segments of 1m: first vertex at local (-1, -1)
        assert_eq!(inst.sample_position(0, 0), Some(Vec2::new(9.0, -5.0)));
        assert_eq!(inst.sample_position(0, 8), Some(Vec2::new(11.0, -3.0)));
        assert_eq!(inst.sample_position(0, 9), None);
        assert_eq!(inst.sample_position(1, 0), None);
    }

    #[test]
    fn test_lattice_sampling_and_moving_drops_it() {
        let placement = LatticePlacement {
            anchor: DVec2::new(0.1, 0.2),
            corner: IVec2::new(2, 4),
        };
        let mut inst = instance().with_lattice(placement);
        assert_eq!(inst.lattice(), Some(placement));
        // (0.1 + 3 * 1.0, 0.2 + 5 * 1.0) for lattice index (1, 1)
        assert_eq!(inst.sample_position(0, 4), Some(Vec2::new(3.1, 5.2)));

        inst.set_world_transform(&Vec3::ZERO).unwrap();
        assert_eq!(inst.lattice(), Some(placement));
        inst.set_world_transform(&Vec3::X).unwrap();
        assert_eq!(inst.lattice(), None);
    }
}
