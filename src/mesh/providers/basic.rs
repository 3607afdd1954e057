//! Flat-geometry providers: triangle, rectangle, cube.

use glam::Vec3;

use crate::errors::Result;
use crate::mesh::plane_shape::make_rectangle;
use crate::mesh::provider::{ShapeObject, ShapeProvider};
use crate::mesh::tri_mesh::TriMesh;

pub struct TriangleProvider;

impl ShapeProvider for TriangleProvider {
    fn plugin_types(&self) -> &'static [&'static str] {
        &["triangle"]
    }

    fn build_mesh(&self, _name: &str, obj: &ShapeObject) -> Result<TriMesh> {
        let p0 = obj.vector3("p0", Vec3::new(0.0, 0.0, 0.0));
        let p1 = obj.vector3("p1", Vec3::new(1.0, 0.0, 0.0));
        let p2 = obj.vector3("p2", Vec3::new(0.0, 1.0, 0.0));
        let normal = (p1 - p0).cross(p2 - p0).normalize_or_zero();
        let mut mesh = TriMesh::new(vec![p0, p1, p2], vec![0, 1, 2, 0]);
        mesh.normals = vec![normal; 3];
        Ok(mesh)
    }
}

pub struct RectangleProvider;

impl ShapeProvider for RectangleProvider {
    fn plugin_types(&self) -> &'static [&'static str] {
        &["rectangle"]
    }

    fn build_mesh(&self, _name: &str, obj: &ShapeObject) -> Result<TriMesh> {
        if obj.properties.contains_key("p0") {
            let p0 = obj.vector3("p0", Vec3::new(-1.0, -1.0, 0.0));
            let p1 = obj.vector3("p1", Vec3::new(1.0, -1.0, 0.0));
            let p2 = obj.vector3("p2", Vec3::new(1.0, 1.0, 0.0));
            let p3 = obj.vector3("p3", Vec3::new(-1.0, 1.0, 0.0));
            Ok(make_rectangle(p0, p1, p2, p3))
        } else {
            let width = obj.number("width", 2.0);
            let height = obj.number("height", 2.0);
            let origin = obj.vector3("origin", Vec3::new(-width / 2.0, -height / 2.0, 0.0));
            Ok(crate::mesh::plane_shape::make_plane(
                origin,
                Vec3::X * width,
                Vec3::Y * height,
            ))
        }
    }
}

pub struct CubeProvider;

impl ShapeProvider for CubeProvider {
    fn plugin_types(&self) -> &'static [&'static str] {
        &["cube", "box"]
    }

    fn build_mesh(&self, _name: &str, obj: &ShapeObject) -> Result<TriMesh> {
        let width = obj.number("width", 2.0);
        let height = obj.number("height", 2.0);
        let depth = obj.number("depth", 2.0);
        let origin = obj.vector3(
            "origin",
            Vec3::new(-width / 2.0, -height / 2.0, -depth / 2.0),
        );

        let dx = Vec3::X * width;
        let dy = Vec3::Y * height;
        let dz = Vec3::Z * depth;

        // Six faces, each a two-triangle quad; reuse make_rectangle per face
        // and stitch the resulting vertex/index buffers together.
        let faces = [
            make_rectangle(origin, origin + dx, origin + dx + dy, origin + dy), // bottom (-z)
            make_rectangle(
                origin + dz,
                origin + dy + dz,
                origin + dx + dy + dz,
                origin + dx + dz,
            ), // top (+z)
            make_rectangle(origin, origin + dz, origin + dx + dz, origin + dx), // front (-y)
            make_rectangle(
                origin + dy,
                origin + dx + dy,
                origin + dx + dy + dz,
                origin + dy + dz,
            ), // back (+y)
            make_rectangle(origin, origin + dy, origin + dy + dz, origin + dz), // left (-x)
            make_rectangle(
                origin + dx,
                origin + dx + dz,
                origin + dx + dy + dz,
                origin + dx + dy,
            ), // right (+x)
        ];

        let mut vertices = Vec::new();
        let mut normals = Vec::new();
        let mut indices = Vec::new();
        for face in &faces {
            let base = vertices.len() as u32;
            vertices.extend_from_slice(&face.vertices);
            normals.extend_from_slice(&face.normals);
            indices.extend(face.indices.iter().enumerate().map(|(i, &idx)| {
                if i % 4 == 3 { idx } else { idx + base }
            }));
        }

        let mut mesh = TriMesh::new(vertices, indices);
        mesh.normals = normals;
        Ok(mesh)
    }
}
