//! Analytic sphere approximation, icosphere tessellation, and detection
//! (spec.md §3/§4.1/§8).

use std::collections::HashMap;

use glam::Vec3;

use crate::mesh::tri_mesh::TriMesh;

const SPHERE_EPS: f32 = 1e-5;
const MIN_SPHERE_FACES: usize = 32;

/// Compact analytic sphere a sufficiently fine `TriMesh` may collapse to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereShape {
    pub origin: Vec3,
    pub radius: f32,
}

/// Regular icosahedron vertices (before normalization to `radius`).
fn icosahedron() -> (Vec<Vec3>, Vec<[u32; 3]>) {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let raw = [
        (-1.0, t, 0.0),
        (1.0, t, 0.0),
        (-1.0, -t, 0.0),
        (1.0, -t, 0.0),
        (0.0, -1.0, t),
        (0.0, 1.0, t),
        (0.0, -1.0, -t),
        (0.0, 1.0, -t),
        (t, 0.0, -1.0),
        (t, 0.0, 1.0),
        (-t, 0.0, -1.0),
        (-t, 0.0, 1.0),
    ];
    let vertices: Vec<Vec3> = raw
        .iter()
        .map(|&(x, y, z)| Vec3::new(x, y, z).normalize())
        .collect();

    let faces = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];
    (vertices, faces)
}

/// Builds an icosphere of `radius` centered at `center`, subdivided
/// `subdivisions` times (`subdivisions == 0` is the bare icosahedron).
#[must_use]
pub fn make_icosphere(center: Vec3, radius: f32, subdivisions: u32) -> TriMesh {
    let (mut vertices, mut faces) = icosahedron();

    for _ in 0..subdivisions {
        let mut midpoint_cache: HashMap<(u32, u32), u32> = HashMap::new();
        let mut next_faces = Vec::with_capacity(faces.len() * 4);

        let mut midpoint = |a: u32, b: u32, vertices: &mut Vec<Vec3>| -> u32 {
            let key = if a < b { (a, b) } else { (b, a) };
            if let Some(&idx) = midpoint_cache.get(&key) {
                return idx;
            }
            let mid = ((vertices[a as usize] + vertices[b as usize]) * 0.5).normalize();
            let idx = vertices.len() as u32;
            vertices.push(mid);
            midpoint_cache.insert(key, idx);
            idx
        };

        for f in &faces {
            let [a, b, c] = *f;
            let ab = midpoint(a, b, &mut vertices);
            let bc = midpoint(b, c, &mut vertices);
            let ca = midpoint(c, a, &mut vertices);
            next_faces.push([a, ab, ca]);
            next_faces.push([b, bc, ab]);
            next_faces.push([c, ca, bc]);
            next_faces.push([ab, bc, ca]);
        }
        faces = next_faces;
    }

    let mut indices = Vec::with_capacity(faces.len() * 4);
    for f in &faces {
        indices.extend_from_slice(&[f[0], f[1], f[2], 0]);
    }

    let mut mesh = TriMesh::new(
        vertices.iter().map(|&v| center + v * radius).collect(),
        indices,
    );
    mesh.normals = vertices;
    mesh
}

/// Attempts to collapse `mesh` to a [`SphereShape`].
///
/// Requires `>= 32` faces, a symmetric bounding box, constant radial distance
/// from the bbox center, and vertices populating all 8 octants (all within
/// `ε = 1e-5`), per spec.md §4.1.
#[must_use]
pub fn detect_sphere(mesh: &TriMesh) -> Option<SphereShape> {
    if mesh.face_count() < MIN_SPHERE_FACES {
        return None;
    }

    let bbox = mesh.bounding_box();
    let center = bbox.center();
    let extent = bbox.max - bbox.min;
    // Symmetric bbox: half-extents equal in all 3 axes within epsilon.
    if (extent.x - extent.y).abs() > SPHERE_EPS || (extent.y - extent.z).abs() > SPHERE_EPS {
        return None;
    }

    let radius = extent.x * 0.5;
    let mut octants = [false; 8];
    for &v in &mesh.vertices {
        let d = v - center;
        if (d.length() - radius).abs() > SPHERE_EPS {
            return None;
        }
        let octant = usize::from(d.x >= 0.0)
            | (usize::from(d.y >= 0.0) << 1)
            | (usize::from(d.z >= 0.0) << 2);
        octants[octant] = true;
    }

    if octants.iter().any(|&o| !o) {
        return None;
    }

    Some(SphereShape {
        origin: center,
        radius,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icosphere_collapses_to_sphere_shape() {
        let center = Vec3::new(0.5, -0.5, 1.0);
        let radius = 2.0;
        let mesh = make_icosphere(center, radius, 2);

        let sphere = detect_sphere(&mesh).expect("subdivided icosphere should detect as a sphere");
        assert!((sphere.origin - center).length() < SPHERE_EPS * 10.0);
        assert!((sphere.radius - radius).abs() < SPHERE_EPS * 10.0);
    }

    #[test]
    fn coarse_icosahedron_is_rejected_for_too_few_faces() {
        let mesh = make_icosphere(Vec3::ZERO, 1.0, 0);
        assert_eq!(mesh.face_count(), 20);
        assert!(detect_sphere(&mesh).is_none());
    }

    #[test]
    fn icosphere_face_count_quadruples_per_subdivision() {
        for k in 0..4 {
            let mesh = make_icosphere(Vec3::ZERO, 1.0, k);
            assert_eq!(mesh.face_count(), 20 * 4usize.pow(k));
        }
    }
}
