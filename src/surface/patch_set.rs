//! Multi-tile coordinator for seamless water surfaces.

use std::sync::Arc;

use glam::{DVec2, UVec2, Vec3};
use log::{debug, warn};

use super::updater::{SurfaceUpdater, TickTimes};
use super::{LatticePlacement, SurfaceInstance};
use crate::error::{Result, WaterError};
use crate::params::{SurfaceConfig, TileLayout, UpdateConfig, WaveParameters};

/// A set of water tiles advanced together at one shared simulation time.
///
/// All tiles sample the wave field in world space at the same `elapsed_ms`, so
/// vertices that coincide across a shared edge get identical heights. Tiles do
/// not read each other, so iteration order does not matter.
#[derive(Debug, Default)]
pub struct SurfacePatchSet {
    tiles: Vec<SurfaceInstance>,
    updater: SurfaceUpdater,
}

impl SurfacePatchSet {
    pub fn new(config: UpdateConfig) -> Result<Self> {
        Ok(Self {
            tiles: Vec::new(),
            updater: SurfaceUpdater::new(config)?,
        })
    }

    /// Lay out `tiles.x` by `tiles.y` tiles edge to edge, centered on `center`.
    ///
    /// Every tile is pinned to one shared segment lattice, so shared edge
    /// vertices sample identical world positions.
    pub fn tile_grid(
        params: Arc<WaveParameters>,
        layout: &TileLayout,
        tiles: UVec2,
        center: Vec3,
        config: UpdateConfig,
    ) -> Result<Self> {
        if tiles.x == 0 || tiles.y == 0 {
            return Err(WaterError::invalid(
                "tiles",
                format!("tile grid must be at least 1x1, got {tiles}"),
            ));
        }

        let mut set = Self::new(config)?;
        let spacing = layout.segment_size_m.as_dvec2();
        let extent = layout.segments.as_dvec2() * spacing;
        let anchor = DVec2::new(f64::from(center.x), f64::from(center.z)) - tiles.as_dvec2() * extent * 0.5;

        for row in 0..tiles.y {
            for column in 0..tiles.x {
                let corner = (UVec2::new(column, row) * layout.segments).as_ivec2();
                let middle = (anchor + corner.as_dvec2() * spacing + extent * 0.5).as_vec2();
                let origin = Vec3::new(middle.x, center.y, middle.y);
                let tile = SurfaceInstance::from_layout(layout, Arc::clone(&params))?
                    .with_origin(origin)?
                    .with_lattice(LatticePlacement { anchor, corner });
                set.add_tile(tile);
            }
        }

        debug!(
            "Built {}x{} water tile grid ({:.0}m x {:.0}m per tile)",
            tiles.x, tiles.y, extent.x, extent.y
        );
        Ok(set)
    }

    /// Build the tile grid described by a loaded configuration.
    pub fn from_config(config: &SurfaceConfig, center: Vec3) -> Result<Self> {
        config.validate()?;
        Self::tile_grid(
            Arc::new(config.wave.clone()),
            &config.layout,
            config.tiles,
            center,
            config.update.clone(),
        )
    }

    /// Add a tile; returns its index.
    pub fn add_tile(&mut self, instance: SurfaceInstance) -> usize {
        self.tiles.push(instance);
        self.tiles.len() - 1
    }

    /// Advance every tile to `elapsed_ms`.
    ///
    /// All tiles are validated first; if any is rejected, no tile is modified.
    pub fn advance_all(&mut self, elapsed_ms: u32) -> Result<()> {
        let times = self
            .tiles
            .iter()
            .map(|tile| self.updater.checked_time(tile, elapsed_ms))
            .collect::<Result<Vec<TickTimes>>>()
            .inspect_err(|err| warn!("Skipped water tick at {elapsed_ms}ms: {err}"))?;

        let updater = &self.updater;
        Self::for_each_tile(&mut self.tiles, &times, |tile, tick| updater.apply(tile, tick));
        Ok(())
    }

    #[cfg(feature = "parallel")]
    fn for_each_tile<F>(tiles: &mut [SurfaceInstance], times: &[TickTimes], f: F)
    where
        F: Fn(&mut SurfaceInstance, TickTimes) + Sync + Send,
    {
        use rayon::prelude::*;

        tiles
            .par_iter_mut()
            .zip(times.par_iter())
            .for_each(|(tile, t)| f(tile, *t));
    }

    #[cfg(not(feature = "parallel"))]
    fn for_each_tile<F>(tiles: &mut [SurfaceInstance], times: &[TickTimes], f: F)
    where
        F: Fn(&mut SurfaceInstance, TickTimes),
    {
        for (tile, t) in tiles.iter_mut().zip(times) {
            f(tile, *t);
        }
    }

    pub fn tiles(&self) -> &[SurfaceInstance] {
        &self.tiles
    }

    pub fn tiles_mut(&mut self) -> &mut [SurfaceInstance] {
        &mut self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn updater(&self) -> &SurfaceUpdater {
        &self.updater
    }

    /// Swap the wave parameters of every tile at once.
    pub fn set_wave_parameters(&mut self, params: Arc<WaveParameters>) {
        for tile in &mut self.tiles {
            tile.set_wave_parameters(Arc::clone(&params));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{IVec2, Vec2};

    fn layout() -> TileLayout {
        TileLayout::new(Vec2::splat(2.0), UVec2::splat(4))
    }

    #[test]
    fn test_tile_grid_places_tiles_edge_to_edge() {
        let set = SurfacePatchSet::tile_grid(
            Arc::new(WaveParameters::default()),
            &layout(),
            UVec2::new(3, 2),
            Vec3::ZERO,
            UpdateConfig::default(),
        )
        .unwrap();

        assert_eq!(set.len(), 6);
        let origins: Vec<Vec3> = set.tiles().iter().map(|t| t.origin()).collect();
        assert_eq!(origins[0], Vec3::new(-8.0, 0.0, -4.0));
        assert_eq!(origins[1], Vec3::new(0.0, 0.0, -4.0));
        assert_eq!(origins[5], Vec3::new(8.0, 0.0, 4.0));
    }

    #[test]
    fn test_tile_grid_pins_tiles_to_shared_lattice() {
        let layout = TileLayout::new(Vec2::splat(0.3), UVec2::splat(7));
        let set = SurfacePatchSet::tile_grid(
            Arc::new(WaveParameters::default()),
            &layout,
            UVec2::new(3, 1),
            Vec3::new(1234.567, 0.0, -89.1),
            UpdateConfig::default(),
        )
        .unwrap();

        let first = set.tiles()[0].lattice().unwrap();
        let second = set.tiles()[1].lattice().unwrap();
        assert_eq!(first.anchor, second.anchor);
        assert_eq!(first.corner, IVec2::ZERO);
        assert_eq!(second.corner, IVec2::new(7, 0));

        // Last column of tile 0 is the first column of tile 1
        let stride = 8;
        for row in 0..8 {
            let left = set.tiles()[0].sample_position(0, row * stride + 7).unwrap();
            let right = set.tiles()[1].sample_position(0, row * stride).unwrap();
            assert_eq!(left, right);
        }
    }

    #[test]
    fn test_tile_grid_rejects_empty_grid() {
        let result = SurfacePatchSet::tile_grid(
            Arc::new(WaveParameters::default()),
            &layout(),
            UVec2::new(0, 2),
            Vec3::ZERO,
            UpdateConfig::default(),
        );
        assert!(matches!(result, Err(WaterError::InvalidParameter { .. })));
    }

    #[test]
    fn test_iteration_order_does_not_matter() {
        let params = Arc::new(WaveParameters::default());
        let a = SurfaceInstance::from_layout(&layout(), Arc::clone(&params))
            .unwrap()
            .with_origin(Vec3::new(8.0, 0.0, 0.0))
            .unwrap();
        let b = SurfaceInstance::from_layout(&layout(), params)
            .unwrap()
            .with_origin(Vec3::new(0.0, 0.0, 8.0))
            .unwrap();

        let mut forward = SurfacePatchSet::default();
        forward.add_tile(a.clone());
        forward.add_tile(b.clone());
        let mut reverse = SurfacePatchSet::default();
        reverse.add_tile(b);
        reverse.add_tile(a);

        forward.advance_all(640).unwrap();
        reverse.advance_all(640).unwrap();

        let verts = |set: &SurfacePatchSet, i: usize| set.tiles()[i].mesh().buffers()[0].vertices().to_vec();
        assert_eq!(verts(&forward, 0), verts(&reverse, 1));
        assert_eq!(verts(&forward, 1), verts(&reverse, 0));
    }

    #[test]
    fn test_one_bad_tile_blocks_whole_tick() {
        let mut set = SurfacePatchSet::tile_grid(
            Arc::new(WaveParameters::default()),
            &layout(),
            UVec2::new(2, 1),
            Vec3::ZERO,
            UpdateConfig::default(),
        )
        .unwrap();
        for tile in set.tiles_mut() {
            tile.mesh_mut().take_dirty();
        }

        // Bypass set_world_transform validation through a fresh instance
        let mut bad = SurfaceInstance::from_layout(&layout(), Arc::new(WaveParameters::default())).unwrap();
        bad.origin = Vec3::NAN;
        bad.mesh_mut().take_dirty();
        set.add_tile(bad);

        assert!(set.advance_all(100).is_err());
        assert!(set.tiles().iter().all(|t| !t.mesh().is_dirty()));
    }

    #[test]
    fn test_tile_added_mid_interval_matches_neighbour_normals() {
        let config = UpdateConfig {
            normal_refresh_ms: 100,
            time_scale: 0.01,
            ..UpdateConfig::default()
        };
        let params = Arc::new(WaveParameters::new(1.0, 7.0, 2.0).unwrap());
        let mut set =
            SurfacePatchSet::tile_grid(Arc::clone(&params), &layout(), UVec2::ONE, Vec3::ZERO, config).unwrap();
        set.advance_all(110).unwrap();

        let placement = set.tiles()[0].lattice().unwrap();
        let neighbour = SurfaceInstance::from_layout(&layout(), params)
            .unwrap()
            .with_origin(Vec3::new(8.0, 0.0, 0.0))
            .unwrap()
            .with_lattice(LatticePlacement {
                corner: placement.corner + IVec2::new(4, 0),
                ..placement
            });
        set.add_tile(neighbour);
        set.advance_all(190).unwrap();

        let stride = 5;
        for row in 0..5 {
            let left = set.tiles()[0].mesh().buffers()[0].vertices()[row * stride + 4];
            let right = set.tiles()[1].mesh().buffers()[0].vertices()[row * stride];
            assert_eq!(left.position[1], right.position[1]);
            assert_eq!(left.normal, right.normal);
        }
    }

    #[test]
    fn test_from_config_builds_grid() {
        let config = SurfaceConfig {
            tiles: UVec2::new(2, 2),
            layout: layout(),
            ..SurfaceConfig::default()
        };
        let mut set = SurfacePatchSet::from_config(&config, Vec3::ZERO).unwrap();
        assert_eq!(set.len(), 4);
        set.advance_all(0).unwrap();
        assert!(set.tiles().iter().all(|t| t.mesh().is_dirty()));
    }
}
