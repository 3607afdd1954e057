//! `TriMesh`: the in-memory triangle mesh produced by a shape provider.
//!
//! Grounded on `original_source/src/runtime/mesh/TriMesh.{h,cpp}`. Index
//! buffers are laid out as quads of four `u32` (spec.md §3): the first three
//! are the triangle's vertex indices, the fourth is the material id carried
//! from the source file.

use glam::{Affine3A, Vec2, Vec3};

use crate::database::BoundingBox;

/// A mesh invariant was violated. These are programmer/provider errors,
/// caught with `debug_assert!` at construction and re-checked explicitly by
/// the loader before a mesh is serialized (spec.md §7: invariant violation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TriMeshInvariantError {
    #[error("index buffer length {0} is not a multiple of 4")]
    IndicesNotQuads(usize),
    #[error("normal count {normals} does not match vertex count {vertices}")]
    NormalCountMismatch { vertices: usize, normals: usize },
    #[error("texcoord count {texcoords} does not match vertex count {vertices}")]
    TexcoordCountMismatch { vertices: usize, texcoords: usize },
}

/// Ordered arrays of vertices, per-vertex normals/texcoords, and a
/// quad-packed (`v0, v1, v2, material`) index buffer.
#[derive(Debug, Clone, Default)]
pub struct TriMesh {
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub texcoords: Vec<Vec2>,
    /// Quads of `[i0, i1, i2, material_id]`, one quad per triangle.
    pub indices: Vec<u32>,
}

impl TriMesh {
    #[must_use]
    pub fn new(vertices: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            normals: Vec::new(),
            texcoords: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.indices.len() / 4
    }

    /// Checks the mesh invariants of spec.md §3:
    /// `|indices| % 4 == 0`; normals empty or `|vertices|`; texcoords empty
    /// or `|vertices|`.
    pub fn validate(&self) -> Result<(), TriMeshInvariantError> {
        if self.indices.len() % 4 != 0 {
            return Err(TriMeshInvariantError::IndicesNotQuads(self.indices.len()));
        }
        if !self.normals.is_empty() && self.normals.len() != self.vertices.len() {
            return Err(TriMeshInvariantError::NormalCountMismatch {
                vertices: self.vertices.len(),
                normals: self.normals.len(),
            });
        }
        if !self.texcoords.is_empty() && self.texcoords.len() != self.vertices.len() {
            return Err(TriMeshInvariantError::TexcoordCountMismatch {
                vertices: self.vertices.len(),
                texcoords: self.texcoords.len(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn triangle(&self, face: usize) -> (Vec3, Vec3, Vec3) {
        let base = face * 4;
        (
            self.vertices[self.indices[base] as usize],
            self.vertices[self.indices[base + 1] as usize],
            self.vertices[self.indices[base + 2] as usize],
        )
    }

    #[must_use]
    pub fn material_of(&self, face: usize) -> u32 {
        self.indices[face * 4 + 3]
    }

    /// Replaces NaN normals with unit-y, matching the original's fallback
    /// for degenerate per-vertex normals.
    pub fn fix_normals(&mut self) {
        for n in &mut self.normals {
            if n.is_nan() || n.length_squared() < 1e-12 {
                *n = Vec3::Y;
            }
        }
    }

    pub fn flip_normals(&mut self) {
        for n in &mut self.normals {
            *n = -*n;
        }
    }

    /// Discards per-vertex normals and replaces them with the flat face
    /// normal of each triangle's owning face, splatted to its three corners.
    /// Only sound when vertices are not shared between faces with differing
    /// normals; callers invoke this before plane/sphere detection runs.
    pub fn use_face_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.vertices.len()];
        for face in 0..self.face_count() {
            let (p0, p1, p2) = self.triangle(face);
            let n = (p1 - p0).cross(p2 - p0).normalize_or_zero();
            let base = face * 4;
            for k in 0..3 {
                normals[self.indices[base + k] as usize] = n;
            }
        }
        self.normals = normals;
    }

    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        self.vertices
            .iter()
            .fold(BoundingBox::EMPTY, |bb, &v| bb.extend_point(v))
    }

    /// Sum of triangle areas (used for area-light sampling stats downstream).
    #[must_use]
    pub fn surface_area(&self) -> f32 {
        (0..self.face_count())
            .map(|f| {
                let (p0, p1, p2) = self.triangle(f);
                0.5 * (p1 - p0).cross(p2 - p0).length()
            })
            .sum()
    }

    /// Applies a local-to-world transform to vertices and (inverse-transpose)
    /// normals.
    pub fn transform(&mut self, matrix: Affine3A) {
        for v in &mut self.vertices {
            *v = matrix.transform_point3(*v);
        }
        if !self.normals.is_empty() {
            let normal_matrix = matrix.matrix3.inverse().transpose();
            for n in &mut self.normals {
                *n = (normal_matrix * *n).normalize_or_zero();
            }
        }
    }
}
