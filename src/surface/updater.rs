//! Per-tick surface update: height pass, barrier, normal pass, dirty flag.

use glam::{UVec2, Vec2, Vec3};
use log::warn;

use super::mesh::{BandLattice, TileMesh, Vertex};
use super::{SampleFrame, SurfaceInstance, WorldTransform};
use crate::error::{Result, WaterError};
use crate::params::{NormalMode, UpdateConfig, WaveModel, WaveParameters};
use crate::wave::WaveField;

/// Rewrites tile vertex data from the wave field.
///
/// Holds only the update policy; all surface state lives in the instance, so
/// one updater can drive any number of tiles.
#[derive(Debug, Clone, Default)]
pub struct SurfaceUpdater {
    config: UpdateConfig,
}

impl SurfaceUpdater {
    pub fn new(config: UpdateConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &UpdateConfig {
        &self.config
    }

    /// Simulation time for `elapsed_ms`, folded into one wave period.
    ///
    /// `t = elapsed_ms * time_scale / speed`
    pub fn simulation_time(&self, elapsed_ms: u32, params: &WaveParameters) -> Result<f32> {
        let t = f64::from(elapsed_ms) * f64::from(self.config.time_scale) / f64::from(params.speed());
        if !t.is_finite() {
            return Err(WaterError::PreconditionViolated(format!(
                "simulation time is not finite for elapsed_ms={elapsed_ms}"
            )));
        }
        Ok(params.fold_time(t))
    }

    /// Advance one tile to `elapsed_ms` at its current origin.
    ///
    /// Vertex data is a pure function of `elapsed_ms`, the placement and the
    /// parameters, so identical inputs always produce identical bytes. On
    /// error no vertex is modified.
    pub fn advance(&self, instance: &mut SurfaceInstance, elapsed_ms: u32) -> Result<()> {
        let times = self.checked_time(instance, elapsed_ms)?;
        self.apply(instance, times);
        Ok(())
    }

    /// Refresh the origin from `transform`, then advance.
    pub fn advance_with_transform(
        &self,
        instance: &mut SurfaceInstance,
        elapsed_ms: u32,
        transform: &(impl WorldTransform + ?Sized),
    ) -> Result<()> {
        let translation = transform.absolute_translation();
        if !translation.is_finite() {
            warn!("Rejected water update: non-finite world translation {translation}");
            return Err(WaterError::PreconditionViolated(format!(
                "world translation must be finite, got {translation}"
            )));
        }
        let times = self.tick_times(elapsed_ms, instance.params())?;
        instance.set_world_transform(&translation)?;
        self.apply(instance, times);
        Ok(())
    }

    /// Validate the instance and compute its tick times without mutating anything.
    pub(crate) fn checked_time(&self, instance: &SurfaceInstance, elapsed_ms: u32) -> Result<TickTimes> {
        if !instance.origin().is_finite() {
            warn!("Rejected water update: non-finite origin {}", instance.origin());
            return Err(WaterError::PreconditionViolated(format!(
                "tile origin must be finite, got {}",
                instance.origin()
            )));
        }
        if let Some(placement) = instance.lattice() {
            if !placement.anchor.is_finite() {
                warn!("Rejected water update: non-finite lattice anchor {}", placement.anchor);
                return Err(WaterError::PreconditionViolated(format!(
                    "lattice anchor must be finite, got {}",
                    placement.anchor
                )));
            }
        }
        self.tick_times(elapsed_ms, instance.params())
    }

    fn tick_times(&self, elapsed_ms: u32, params: &WaveParameters) -> Result<TickTimes> {
        let positions = self.simulation_time(elapsed_ms, params)?;
        let bucket = match self.config.normal_refresh_ms {
            0 => None,
            interval => Some(elapsed_ms / interval),
        };
        // Normals belong to the start of their refresh interval, whenever they
        // happen to be rebuilt.
        let normals = match bucket {
            Some(b) => self.simulation_time(b * self.config.normal_refresh_ms, params)?,
            None => positions,
        };
        Ok(TickTimes {
            positions,
            normals,
            bucket,
        })
    }

    /// Infallible part of the tick, run only after validation.
    pub(crate) fn apply(&self, instance: &mut SurfaceInstance, times: TickTimes) {
        let frame = instance.sample_frame();
        let rebuild_normals = times.bucket.is_none() || times.bucket != instance.normals_bucket;
        let grid_rebuild = rebuild_normals && self.config.normal_mode == NormalMode::Grid;

        let (mesh, params) = instance.parts_mut();

        // Face normals need every position of their time written first.
        if grid_rebuild {
            Self::write_positions(mesh, frame, times.normals, params);
            mesh.recalculate_normals();
        }
        if !grid_rebuild || times.normals != times.positions {
            Self::write_positions(mesh, frame, times.positions, params);
        }
        if rebuild_normals && self.config.normal_mode == NormalMode::Analytic {
            Self::write_analytic_normals(mesh, frame, times.normals, params);
        }

        mesh.recompute_bounds();
        mesh.mark_dirty();

        if rebuild_normals {
            instance.normals_bucket = times.bucket;
        }
    }

    fn write_positions(mesh: &mut TileMesh, frame: SampleFrame, t: f32, params: &WaveParameters) {
        for buffer in mesh.buffers_mut() {
            let lattice = buffer.lattice();
            let (vertices, rest) = buffer.split_mut();
            match params.model() {
                WaveModel::Sine => for_each_vertex(vertices, rest, lattice, |vertex, r, index| {
                    let world = frame.world(index);
                    vertex.position = [r.x, WaveField::height(world.x, world.y, t, params), r.y];
                }),
                WaveModel::Gerstner { .. } => {
                    for_each_vertex(vertices, rest, lattice, |vertex, r, index| {
                        let world = frame.world(index);
                        let d = WaveField::displacement(world.x, world.y, t, params);
                        vertex.position = [r.x + d.x, d.y, r.y + d.z];
                    })
                }
            }
        }
    }

    fn write_analytic_normals(mesh: &mut TileMesh, frame: SampleFrame, t: f32, params: &WaveParameters) {
        for buffer in mesh.buffers_mut() {
            let lattice = buffer.lattice();
            let (vertices, rest) = buffer.split_mut();
            for_each_vertex(vertices, rest, lattice, |vertex, _, index| {
                let world = frame.world(index);
                let n: Vec3 = WaveField::normal(world.x, world.y, t, params);
                vertex.normal = n.to_array();
            });
        }
    }
}

/// Simulation times of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TickTimes {
    pub(crate) positions: f32,
    /// Start of the current normal refresh interval
    pub(crate) normals: f32,
    /// Refresh interval index (`None` when normals rebuild every tick)
    pub(crate) bucket: Option<u32>,
}

#[cfg(feature = "parallel")]
fn for_each_vertex<F>(vertices: &mut [Vertex], rest: &[Vec2], lattice: BandLattice, f: F)
where
    F: Fn(&mut Vertex, Vec2, UVec2) + Sync + Send,
{
    use rayon::prelude::*;

    vertices
        .par_iter_mut()
        .zip(rest.par_iter())
        .enumerate()
        .for_each(|(local, (vertex, r))| f(vertex, *r, lattice.index(local)));
}

#[cfg(not(feature = "parallel"))]
fn for_each_vertex<F>(vertices: &mut [Vertex], rest: &[Vec2], lattice: BandLattice, f: F)
where
    F: Fn(&mut Vertex, Vec2, UVec2),
{
    for (local, (vertex, r)) in vertices.iter_mut().zip(rest).enumerate() {
        f(vertex, *r, lattice.index(local));
    }
}
