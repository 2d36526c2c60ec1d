//! Coincident vertices on shared tile edges must agree after every tick.

use std::sync::Arc;

use glam::{DVec2, IVec2, UVec2, Vec2, Vec3};
use wavesurface::params::{WaveSettings, MAX_OCTAVES};
use wavesurface::{
    LatticePlacement, NormalMode, SurfaceInstance, SurfacePatchSet, TileLayout, UpdateConfig, Vertex,
    WaveModel, WaveParameters,
};

fn layout(buffers: u32) -> TileLayout {
    TileLayout {
        buffers,
        ..TileLayout::new(Vec2::splat(2.0), UVec2::splat(4))
    }
}

/// 0.3m segments are not exactly representable, so rest + origin would round
/// differently on either side of an edge.
fn odd_layout() -> TileLayout {
    TileLayout::new(Vec2::splat(0.3), UVec2::splat(7))
}

const ODD_CENTER: Vec3 = Vec3::new(1234.567, 0.0, -89.1);

struct Sample {
    tile: usize,
    world: Vec2,
    rest: Vec2,
    vertex: Vertex,
}

/// Every vertex of every tile, keyed by the world position it samples.
fn world_vertices(set: &SurfacePatchSet) -> Vec<Sample> {
    let mut out = Vec::new();
    for (tile, instance) in set.tiles().iter().enumerate() {
        for (b, buffer) in instance.mesh().buffers().iter().enumerate() {
            for (local, (vertex, rest)) in buffer.vertices().iter().zip(buffer.rest_positions()).enumerate() {
                let world = instance.sample_position(b, local).unwrap();
                out.push(Sample {
                    tile,
                    world,
                    rest: *rest,
                    vertex: *vertex,
                });
            }
        }
    }
    out
}

/// Pairs of vertices from different tiles that sample the same world position.
fn shared_pairs(samples: &[Sample]) -> Vec<(&Sample, &Sample)> {
    let mut pairs = Vec::new();
    for (i, a) in samples.iter().enumerate() {
        for b in &samples[i + 1..] {
            if a.tile != b.tile && a.world == b.world {
                pairs.push((a, b));
            }
        }
    }
    pairs
}

/// Heights and normals of shared vertices must be bit-identical.
/// Returns the number of pairs checked.
fn assert_seams_match(set: &SurfacePatchSet) -> usize {
    let samples = world_vertices(set);
    let pairs = shared_pairs(&samples);
    for (a, b) in &pairs {
        assert!(
            a.vertex.position[1] == b.vertex.position[1],
            "height mismatch at {}: {} vs {}",
            a.world,
            a.vertex.position[1],
            b.vertex.position[1]
        );
        assert!(
            a.vertex.normal == b.vertex.normal,
            "normal mismatch at {}: {:?} vs {:?}",
            a.world,
            a.vertex.normal,
            b.vertex.normal
        );
    }
    pairs.len()
}

#[test]
fn test_two_tiles_share_edge_heights_and_normals() {
    let mut set = SurfacePatchSet::tile_grid(
        Arc::new(WaveParameters::default()),
        &layout(1),
        UVec2::new(2, 1),
        Vec3::ZERO,
        UpdateConfig::default(),
    )
    .unwrap();

    for elapsed_ms in [0, 16, 333, 1250, 9999] {
        set.advance_all(elapsed_ms).unwrap();
        // One shared edge of 5 vertices
        assert_eq!(assert_seams_match(&set), 5);
    }
}

#[test]
fn test_grid_of_tiles_with_octaves_and_bands() {
    let settings = WaveSettings {
        height_m: 1.5,
        length_m: 7.0,
        speed: 2.0,
        direction: Vec2::new(1.0, 0.4),
        octaves: MAX_OCTAVES,
        ..WaveSettings::default()
    };
    let mut set = SurfacePatchSet::tile_grid(
        Arc::new(WaveParameters::from_settings(&settings).unwrap()),
        &layout(2),
        UVec2::new(2, 2),
        Vec3::new(30.0, 0.0, -12.0),
        UpdateConfig::default(),
    )
    .unwrap();

    set.advance_all(777).unwrap();
    assert!(assert_seams_match(&set) > 0);
}

#[test]
fn test_odd_segment_size_far_from_origin_is_bit_identical() {
    let settings = WaveSettings {
        height_m: 0.8,
        length_m: 3.7,
        direction: Vec2::new(0.3, 1.0),
        octaves: 3,
        ..WaveSettings::default()
    };
    let mut set = SurfacePatchSet::tile_grid(
        Arc::new(WaveParameters::from_settings(&settings).unwrap()),
        &odd_layout(),
        UVec2::new(3, 1),
        ODD_CENTER,
        UpdateConfig::default(),
    )
    .unwrap();

    set.advance_all(777).unwrap();
    // Two shared edges of 8 vertices
    assert_eq!(assert_seams_match(&set), 16);
}

#[test]
fn test_gerstner_tiles_stay_seamless() {
    let settings = WaveSettings {
        octaves: 3,
        length_m: 3.7,
        model: WaveModel::Gerstner { steepness: 0.6 },
        ..WaveSettings::default()
    };
    let mut set = SurfacePatchSet::tile_grid(
        Arc::new(WaveParameters::from_settings(&settings).unwrap()),
        &odd_layout(),
        UVec2::new(3, 1),
        ODD_CENTER,
        UpdateConfig::default(),
    )
    .unwrap();

    set.advance_all(1234).unwrap();
    assert_eq!(assert_seams_match(&set), 16);

    // Horizontal displacement matches too
    let samples = world_vertices(&set);
    for (a, b) in shared_pairs(&samples) {
        let sway_a = Vec2::new(a.vertex.position[0], a.vertex.position[2]) - a.rest;
        let sway_b = Vec2::new(b.vertex.position[0], b.vertex.position[2]) - b.rest;
        assert!(sway_a.distance(sway_b) < 1e-5, "{sway_a} vs {sway_b}");
    }
}

#[test]
fn test_normal_refresh_interval_keeps_seams() {
    let config = UpdateConfig {
        normal_refresh_ms: 100,
        ..UpdateConfig::default()
    };
    let mut set = SurfacePatchSet::tile_grid(
        Arc::new(WaveParameters::default()),
        &layout(1),
        UVec2::new(2, 1),
        Vec3::ZERO,
        config,
    )
    .unwrap();

    for elapsed_ms in [0, 40, 90, 150, 420] {
        set.advance_all(elapsed_ms).unwrap();
        assert_eq!(assert_seams_match(&set), 5);
    }
}

#[test]
fn test_tile_added_mid_refresh_interval_stays_seamless() {
    let config = UpdateConfig {
        normal_refresh_ms: 100,
        time_scale: 0.01,
        ..UpdateConfig::default()
    };
    let params = Arc::new(WaveParameters::new(0.8, 3.7, 2.0).unwrap());
    let layout = odd_layout();
    let mut set =
        SurfacePatchSet::tile_grid(Arc::clone(&params), &layout, UVec2::new(3, 1), ODD_CENTER, config).unwrap();
    set.advance_all(110).unwrap();

    // Extend the row by one tile on the same lattice
    let placement = set.tiles()[2].lattice().unwrap();
    let corner = placement.corner + IVec2::new(7, 0);
    let spacing = layout.segment_size_m.as_dvec2();
    let middle = placement.anchor + corner.as_dvec2() * spacing + DVec2::splat(3.5) * spacing;
    let neighbour = SurfaceInstance::from_layout(&layout, params)
        .unwrap()
        .with_origin(Vec3::new(middle.x as f32, ODD_CENTER.y, middle.y as f32))
        .unwrap()
        .with_lattice(LatticePlacement { corner, ..placement });
    set.add_tile(neighbour);

    set.advance_all(190).unwrap();
    assert_eq!(assert_seams_match(&set), 24);
}

#[test]
fn test_grid_normals_are_unit_length() {
    let config = UpdateConfig {
        normal_mode: NormalMode::Grid,
        ..UpdateConfig::default()
    };
    let mut set = SurfacePatchSet::tile_grid(
        Arc::new(WaveParameters::default()),
        &layout(1),
        UVec2::new(2, 2),
        Vec3::ZERO,
        config,
    )
    .unwrap();

    set.advance_all(500).unwrap();
    for sample in world_vertices(&set) {
        let n = Vec3::from_array(sample.vertex.normal);
        assert!((n.length() - 1.0).abs() < 1e-4);
        assert!(n.y > 0.0);
    }
}
