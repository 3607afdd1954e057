//! Analytic plane approximation and detection (spec.md §3/§4.1/§8).
//!
//! Grounded on `original_source/src/runtime/mesh/PlaneShape.h`: a plane is
//! `origin + two edge vectors`, with the four UV corners of a unit quad.

use glam::{Vec2, Vec3};

use crate::mesh::tri_mesh::TriMesh;

const PLANE_EPS: f32 = 1e-5;

/// Compact analytic plane a two-triangle quad `TriMesh` may collapse to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneShape {
    pub origin: Vec3,
    pub x_axis: Vec3,
    pub y_axis: Vec3,
    pub uv: [Vec2; 4],
}

impl PlaneShape {
    #[must_use]
    pub fn new(origin: Vec3, x_axis: Vec3, y_axis: Vec3) -> Self {
        Self {
            origin,
            x_axis,
            y_axis,
            uv: [
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(0.0, 1.0),
            ],
        }
    }

    #[must_use]
    pub fn corners(&self) -> [Vec3; 4] {
        [
            self.origin,
            self.origin + self.x_axis,
            self.origin + self.x_axis + self.y_axis,
            self.origin + self.y_axis,
        ]
    }
}

/// Builds a two-triangle quad `TriMesh` spanning `origin + {x_axis, y_axis}`,
/// matching `TriMesh::MakePlane` in the original.
#[must_use]
pub fn make_plane(origin: Vec3, x_axis: Vec3, y_axis: Vec3) -> TriMesh {
    let p0 = origin;
    let p1 = origin + x_axis;
    let p2 = origin + x_axis + y_axis;
    let p3 = origin + y_axis;
    make_rectangle(p0, p1, p2, p3)
}

/// Builds a two-triangle quad from four explicit corners (CCW winding),
/// matching `TriMesh::MakeRectangle`.
#[must_use]
pub fn make_rectangle(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3) -> TriMesh {
    let normal = (p1 - p0).cross(p3 - p0).normalize_or_zero();
    let mut mesh = TriMesh::new(vec![p0, p1, p2, p3], vec![0, 1, 2, 0, 0, 2, 3, 0]);
    mesh.normals = vec![normal; 4];
    mesh.texcoords = vec![
        Vec2::new(0.0, 0.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(0.0, 1.0),
    ];
    mesh
}

/// Attempts to collapse `mesh` to a [`PlaneShape`].
///
/// Requires exactly 2 faces forming a quad with compatible normals, 4 unique
/// vertices, and matching edge lengths (`ε = 1e-5`), per spec.md §4.1.
#[must_use]
pub fn detect_plane(mesh: &TriMesh) -> Option<PlaneShape> {
    if mesh.face_count() != 2 || mesh.vertex_count() != 4 {
        return None;
    }

    // Both faces must share the same (up to sign) normal.
    let (a0, a1, a2) = mesh.triangle(0);
    let (b0, b1, b2) = mesh.triangle(1);
    let n0 = (a1 - a0).cross(a2 - a0).normalize_or_zero();
    let n1 = (b1 - b0).cross(b2 - b0).normalize_or_zero();
    if n0.dot(n1).abs() < 1.0 - PLANE_EPS {
        return None;
    }

    let corners = &mesh.vertices;
    let origin = corners[0];
    let x_axis = corners[1] - corners[0];
    let y_axis = corners[3] - corners[0];

    // Opposite edges must match in length within epsilon.
    let opposite = corners[2] - corners[1];
    if (opposite - y_axis).length() > PLANE_EPS {
        return None;
    }
    let opposite2 = corners[2] - corners[3];
    if (opposite2 - x_axis).length() > PLANE_EPS {
        return None;
    }

    Some(PlaneShape::new(origin, x_axis, y_axis))
}
