//! Revolution-based providers: icosphere, uvsphere, cylinder, cone, disk.

use std::f32::consts::TAU;

use glam::Vec3;

use crate::errors::Result;
use crate::mesh::provider::{ShapeObject, ShapeProvider};
use crate::mesh::sphere_shape::make_icosphere;
use crate::mesh::tri_mesh::TriMesh;

/// Builds an orthonormal basis `(tangent, bitangent)` perpendicular to `axis`.
fn orthonormal_basis(axis: Vec3) -> (Vec3, Vec3) {
    let axis = axis.normalize_or(Vec3::Z);
    let up = if axis.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    let tangent = up.cross(axis).normalize_or(Vec3::X);
    let bitangent = axis.cross(tangent);
    (tangent, bitangent)
}

pub struct IcoSphereProvider;

impl ShapeProvider for IcoSphereProvider {
    fn plugin_types(&self) -> &'static [&'static str] {
        &["sphere", "icosphere"]
    }

    fn build_mesh(&self, _name: &str, obj: &ShapeObject) -> Result<TriMesh> {
        let center = obj.vector3("center", Vec3::ZERO);
        let radius = obj.number("radius", 1.0);
        let subdivisions = obj.integer("subdivisions", 4).max(0) as u32;
        Ok(make_icosphere(center, radius, subdivisions))
    }
}

pub struct UvSphereProvider;

impl ShapeProvider for UvSphereProvider {
    fn plugin_types(&self) -> &'static [&'static str] {
        &["uvsphere"]
    }

    fn build_mesh(&self, _name: &str, obj: &ShapeObject) -> Result<TriMesh> {
        let center = obj.vector3("center", Vec3::ZERO);
        let radius = obj.number("radius", 1.0);
        let stacks = obj.integer("stacks", 32).max(2) as u32;
        let slices = obj.integer("slices", 16).max(3) as u32;

        let mut vertices = Vec::new();
        for i in 0..=stacks {
            let phi = std::f32::consts::PI * i as f32 / stacks as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();
            for j in 0..=slices {
                let theta = TAU * j as f32 / slices as f32;
                let (sin_t, cos_t) = theta.sin_cos();
                let dir = Vec3::new(sin_phi * cos_t, cos_phi, sin_phi * sin_t);
                vertices.push(center + dir * radius);
            }
        }

        let ring = slices + 1;
        let mut indices = Vec::new();
        for i in 0..stacks {
            for j in 0..slices {
                let a = i * ring + j;
                let b = a + ring;
                indices.extend_from_slice(&[a, a + 1, b, 0]);
                indices.extend_from_slice(&[a + 1, b + 1, b, 0]);
            }
        }

        let mut mesh = TriMesh::new(vertices, indices);
        mesh.normals = mesh
            .vertices
            .iter()
            .map(|&v| (v - center).normalize_or(Vec3::Y))
            .collect();
        Ok(mesh)
    }
}

pub struct CylinderProvider;

impl ShapeProvider for CylinderProvider {
    fn plugin_types(&self) -> &'static [&'static str] {
        &["cylinder"]
    }

    fn build_mesh(&self, _name: &str, obj: &ShapeObject) -> Result<TriMesh> {
        let base_center = obj.vector3("p0", Vec3::ZERO);
        let tip_center = obj.vector3("p1", Vec3::new(0.0, 0.0, 1.0));
        let sections = obj.integer("sections", 32).max(3) as u32;
        let filled = obj.properties.get("filled").is_none_or(|_| true);

        let (base_radius, tip_radius) = if obj.properties.contains_key("radius") {
            let r = obj.number("radius", 1.0);
            (r, r)
        } else {
            let base_radius = obj.number("bottom_radius", 1.0);
            (base_radius, obj.number("top_radius", base_radius))
        };

        Ok(build_frustum(
            base_center,
            base_radius,
            tip_center,
            tip_radius,
            sections,
            filled,
        ))
    }
}

pub struct ConeProvider;

impl ShapeProvider for ConeProvider {
    fn plugin_types(&self) -> &'static [&'static str] {
        &["cone"]
    }

    fn build_mesh(&self, _name: &str, obj: &ShapeObject) -> Result<TriMesh> {
        let base_center = obj.vector3("p0", Vec3::ZERO);
        let tip_center = obj.vector3("p1", Vec3::new(0.0, 0.0, 1.0));
        let radius = obj.number("radius", 1.0);
        let sections = obj.integer("sections", 32).max(3) as u32;
        let filled = obj.properties.get("filled").is_none_or(|_| true);
        Ok(build_frustum(
            base_center,
            radius,
            tip_center,
            0.0,
            sections,
            filled,
        ))
    }
}

/// Shared cylinder/cone construction: a ring at `base` of radius
/// `base_radius`, a ring at `tip` of radius `tip_radius`, side quads between
/// them, and optional filled caps. `tip_radius == 0` degenerates the tip
/// ring to a point, producing a cone.
fn build_frustum(
    base: Vec3,
    base_radius: f32,
    tip: Vec3,
    tip_radius: f32,
    sections: u32,
    filled: bool,
) -> TriMesh {
    let axis = tip - base;
    let (tangent, bitangent) = orthonormal_basis(axis);

    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    let base_ring_start = vertices.len() as u32;
    for i in 0..sections {
        let theta = TAU * i as f32 / sections as f32;
        let dir = tangent * theta.cos() + bitangent * theta.sin();
        vertices.push(base + dir * base_radius);
    }
    let tip_ring_start = vertices.len() as u32;
    for i in 0..sections {
        let theta = TAU * i as f32 / sections as f32;
        let dir = tangent * theta.cos() + bitangent * theta.sin();
        vertices.push(tip + dir * tip_radius);
    }

    for i in 0..sections {
        let j = (i + 1) % sections;
        let b0 = base_ring_start + i;
        let b1 = base_ring_start + j;
        let t0 = tip_ring_start + i;
        let t1 = tip_ring_start + j;
        indices.extend_from_slice(&[b0, b1, t1, 0]);
        indices.extend_from_slice(&[b0, t1, t0, 0]);
    }

    if filled {
        let base_center_idx = vertices.len() as u32;
        vertices.push(base);
        for i in 0..sections {
            let j = (i + 1) % sections;
            indices.extend_from_slice(&[base_center_idx, base_ring_start + j, base_ring_start + i, 0]);
        }

        if tip_radius > 0.0 {
            let tip_center_idx = vertices.len() as u32;
            vertices.push(tip);
            for i in 0..sections {
                let j = (i + 1) % sections;
                indices.extend_from_slice(&[tip_center_idx, tip_ring_start + i, tip_ring_start + j, 0]);
            }
        }
    }

    TriMesh::new(vertices, indices)
}

pub struct DiskProvider;

impl ShapeProvider for DiskProvider {
    fn plugin_types(&self) -> &'static [&'static str] {
        &["disk"]
    }

    fn build_mesh(&self, _name: &str, obj: &ShapeObject) -> Result<TriMesh> {
        let origin = obj.vector3("origin", Vec3::ZERO);
        let normal = obj.vector3("normal", Vec3::Z);
        let radius = obj.number("radius", 1.0);
        let sections = obj.integer("sections", 32).max(3) as u32;

        let (tangent, bitangent) = orthonormal_basis(normal);
        let mut vertices = vec![origin];
        for i in 0..sections {
            let theta = TAU * i as f32 / sections as f32;
            let dir = tangent * theta.cos() + bitangent * theta.sin();
            vertices.push(origin + dir * radius);
        }

        let mut indices = Vec::new();
        for i in 0..sections {
            let a = 1 + i;
            let b = 1 + (i + 1) % sections;
            indices.extend_from_slice(&[0, a, b, 0]);
        }

        let mut mesh = TriMesh::new(vertices, indices);
        mesh.normals = vec![normal.normalize_or(Vec3::Z); mesh.vertex_count()];
        Ok(mesh)
    }
}
