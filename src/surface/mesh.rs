//! Tile mesh: a flat grid of vertices split into one or more material buffers.

use bytemuck::{Pod, Zeroable};
use glam::{UVec2, Vec2, Vec3};
use log::debug;

use crate::error::Result;
use crate::params::TileLayout;

/// Texture slots per material
pub const MATERIAL_MAX_TEXTURES: usize = 4;

/// Host-owned texture identifier. The core never interprets it.
pub type TextureHandle = u32;

/// Vertex data for the water mesh (position + normal + UV coordinates)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Per-buffer material binding, passed through to the host renderer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Material {
    pub textures: [Option<TextureHandle>; MATERIAL_MAX_TEXTURES],
}

/// Axis-aligned bounding box in local tile space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Box enclosing all points, or `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| match acc {
            None => Some(Self { min: p, max: p }),
            Some(b) => Some(Self {
                min: b.min.min(p),
                max: b.max.max(p),
            }),
        })
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self {
            min: Vec3::ZERO,
            max: Vec3::ONE,
        }
    }
}

/// Maps a band-local vertex index to its (column, row) in the tile lattice.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BandLattice {
    stride: u32,
    first_row: u32,
}

impl BandLattice {
    #[inline]
    pub(crate) fn index(&self, local: usize) -> UVec2 {
        let local = local as u32;
        UVec2::new(local % self.stride, self.first_row + local / self.stride)
    }
}

/// One contiguous band of the tile grid sharing a single material.
#[derive(Debug, Clone)]
pub struct MeshBuffer {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    /// Undisplaced (x, z) of every vertex, in the same order as `vertices`
    rest: Vec<Vec2>,
    /// Grid dimensions of this band in segments (x, z)
    segments: UVec2,
    /// Tile row of this band's first vertex row
    first_row: u32,
    pub material: Material,
}

impl MeshBuffer {
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn vertices_mut(&mut self) -> &mut [Vertex] {
        &mut self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn rest_positions(&self) -> &[Vec2] {
        &self.rest
    }

    /// Band dimensions in segments (x, z)
    pub fn segments(&self) -> UVec2 {
        self.segments
    }

    /// Tile row of this band's first vertex row
    pub fn first_row(&self) -> u32 {
        self.first_row
    }

    /// (column, row) of vertex `local` in the whole tile's lattice
    pub fn lattice_index(&self, local: usize) -> UVec2 {
        self.lattice().index(local)
    }

    pub(crate) fn lattice(&self) -> BandLattice {
        BandLattice {
            stride: self.segments.x + 1,
            first_row: self.first_row,
        }
    }

    /// Vertices mutably alongside their rest positions.
    pub(crate) fn split_mut(&mut self) -> (&mut [Vertex], &[Vec2]) {
        (&mut self.vertices, &self.rest)
    }

    /// Add the unit face normal of every triangle to its three corners.
    ///
    /// `normals` is indexed like this band's vertices.
    fn accumulate_face_normals(&self, normals: &mut [Vec3]) {
        for tri in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let v0 = Vec3::from_array(self.vertices[i0].position);
            let v1 = Vec3::from_array(self.vertices[i1].position);
            let v2 = Vec3::from_array(self.vertices[i2].position);

            let face = (v1 - v0).cross(v2 - v0).normalize_or_zero();
            normals[i0] += face;
            normals[i1] += face;
            normals[i2] += face;
        }
    }

    fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.vertices.iter().map(|v| Vec3::from_array(v.position)))
    }
}

/// Vertex grid of one water tile.
///
/// Built once from [`TileMesh::hill_plane`]; afterwards only vertex attributes
/// change, never the buffer layout.
#[derive(Debug, Clone)]
pub struct TileMesh {
    buffers: Vec<MeshBuffer>,
    segments: UVec2,
    segment_size: Vec2,
    bounds: Aabb,
    dirty: bool,
}

impl TileMesh {
    /// Create a flat grid centered on the tile origin.
    ///
    /// The grid spans `[-W/2, W/2] x [-D/2, D/2]` on the XZ plane at height 0.
    /// UVs run from 0 to `uv_repeat` across the whole tile, so bands continue
    /// the same texture mapping.
    pub fn hill_plane(layout: &TileLayout) -> Result<Self> {
        layout.validate()?;

        let segments = layout.segments;
        let size = layout.segment_size_m;
        let half = layout.extent_m() / 2.0;

        let buffers: Vec<MeshBuffer> = (0..layout.buffers)
            .map(|band| {
                let row_start = band * segments.y / layout.buffers;
                let row_end = (band + 1) * segments.y / layout.buffers;
                Self::build_band(row_start, row_end, half, layout)
            })
            .collect();

        let mut mesh = Self {
            buffers,
            segments,
            segment_size: size,
            bounds: Aabb::default(),
            dirty: true,
        };
        mesh.recompute_bounds();

        debug!(
            "Built hill plane: {}x{} segments, {} vertices in {} buffer(s)",
            segments.x,
            segments.y,
            mesh.total_vertex_count(),
            mesh.buffer_count()
        );

        Ok(mesh)
    }

    fn build_band(row_start: u32, row_end: u32, half: Vec2, layout: &TileLayout) -> MeshBuffer {
        let segments = layout.segments;
        let size = layout.segment_size_m;
        let columns = segments.x;
        let rows = row_end - row_start;
        let stride = columns + 1;

        let mut vertices = Vec::with_capacity((stride * (rows + 1)) as usize);
        let mut rest = Vec::with_capacity(vertices.capacity());

        // Generate flat XZ plane grid
        for z in row_start..=row_end {
            for x in 0..=columns {
                let pos = Vec2::new(x as f32 * size.x - half.x, z as f32 * size.y - half.y);
                let uv = Vec2::new(
                    x as f32 / segments.x as f32,
                    z as f32 / segments.y as f32,
                ) * layout.uv_repeat;

                rest.push(pos);
                vertices.push(Vertex {
                    position: [pos.x, 0.0, pos.y],
                    normal: [0.0, 1.0, 0.0],
                    uv: uv.to_array(),
                });
            }
        }

        // Generate triangle indices (counter-clockwise winding, +Y facing)
        let mut indices = Vec::with_capacity((columns * rows * 6) as usize);
        for z in 0..rows {
            for x in 0..columns {
                let top_left = z * stride + x;
                let top_right = top_left + 1;
                let bottom_left = (z + 1) * stride + x;
                let bottom_right = bottom_left + 1;

                indices.extend_from_slice(&[
                    top_left,
                    bottom_left,
                    top_right,
                    top_right,
                    bottom_left,
                    bottom_right,
                ]);
            }
        }

        MeshBuffer {
            vertices,
            indices,
            rest,
            segments: UVec2::new(columns, rows),
            first_row: row_start,
            material: Material::default(),
        }
    }

    /// Mutable access to one vertex, `None` when either index is out of range.
    pub fn vertex_at(&mut self, buffer: usize, local: usize) -> Option<&mut Vertex> {
        self.buffers.get_mut(buffer)?.vertices.get_mut(local)
    }

    /// Vertex count of one buffer (0 for a buffer that does not exist)
    pub fn vertex_count(&self, buffer: usize) -> usize {
        self.buffers.get(buffer).map_or(0, |b| b.vertices.len())
    }

    pub fn total_vertex_count(&self) -> usize {
        self.buffers.iter().map(|b| b.vertices.len()).sum()
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn buffers(&self) -> &[MeshBuffer] {
        &self.buffers
    }

    pub fn buffers_mut(&mut self) -> &mut [MeshBuffer] {
        &mut self.buffers
    }

    /// Tile dimensions in segments (x, z)
    pub fn segments(&self) -> UVec2 {
        self.segments
    }

    /// Size of one segment (meters)
    pub fn segment_size(&self) -> Vec2 {
        self.segment_size
    }

    /// Flag GPU-side copies as stale.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Read and clear the dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Local-space bounds as of the last [`TileMesh::recompute_bounds`]
    pub fn bounding_box(&self) -> Aabb {
        self.bounds
    }

    pub fn recompute_bounds(&mut self) {
        if let Some(bounds) = self
            .buffers
            .iter()
            .filter_map(MeshBuffer::bounds)
            .reduce(Aabb::union)
        {
            self.bounds = bounds;
        }
    }

    /// Rebuild smooth normals from current positions.
    ///
    /// Each vertex gets the normalized sum of the unit face normals of the
    /// triangles around it in the whole tile, so rows shared by two bands see
    /// the faces of both. Tile-edge vertices only see the faces that exist.
    pub fn recalculate_normals(&mut self) {
        let stride = self.segments.x as usize + 1;
        let mut normals = vec![Vec3::ZERO; stride * (self.segments.y as usize + 1)];

        for buffer in &self.buffers {
            let base = buffer.first_row as usize * stride;
            buffer.accumulate_face_normals(&mut normals[base..]);
        }

        for buffer in &mut self.buffers {
            let base = buffer.first_row as usize * stride;
            for (vertex, n) in buffer.vertices.iter_mut().zip(&normals[base..]) {
                vertex.normal = n.normalize_or(Vec3::Y).to_array();
            }
        }
    }
}
