//! Binary SAH BVH builder over primitive proxies (spec.md §4.2).
//!
//! Grounded on the binned-SAH top-down builder `bvh::v2::DefaultBuilder`
//! referenced from `original_source/src/runtime/bvh/SceneBVHAdapter.h` and
//! `TriBVHAdapter.h`: primitives are recursively partitioned by centroid
//! along the widest axis of their bounding extent, picking the split bin
//! that minimizes the surface-area-heuristic cost. [`crate::bvh::nary`]
//! collapses the resulting binary tree into the wide node layout shaders
//! actually traverse.

use glam::Vec3;

use crate::database::BoundingBox;

/// A thing a BVH can be built over: its world-space bounds and centroid.
pub trait Primitive {
    fn bounding_box(&self) -> BoundingBox;
    fn center(&self) -> Vec3;
}

/// A node of the intermediate binary tree. `Leaf` ranges index into the
/// `order` permutation returned alongside the tree by [`build`].
#[derive(Debug, Clone)]
pub enum BinaryNode {
    Leaf {
        bbox: BoundingBox,
        first: u32,
        count: u32,
    },
    Interior {
        bbox: BoundingBox,
        left: Box<BinaryNode>,
        right: Box<BinaryNode>,
    },
}

impl BinaryNode {
    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            BinaryNode::Leaf { bbox, .. } | BinaryNode::Interior { bbox, .. } => *bbox,
        }
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, BinaryNode::Leaf { .. })
    }

    #[must_use]
    pub fn surface_area(&self) -> f32 {
        surface_area(&self.bounding_box())
    }
}

#[must_use]
pub fn surface_area(bbox: &BoundingBox) -> f32 {
    if bbox.is_empty() {
        return 0.0;
    }
    let d = bbox.max - bbox.min;
    2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
}

const SAH_BINS: usize = 12;
const TRAVERSAL_COST: f32 = 1.0;

/// Builds a binary BVH over `primitives`. Returns the tree plus the
/// primitive-index permutation (`order`): a leaf's `[first, first+count)`
/// range indexes into `order`, not directly into `primitives`.
pub fn build<P: Primitive>(primitives: &[P], max_leaf_size: u32) -> (BinaryNode, Vec<u32>) {
    let bboxes: Vec<BoundingBox> = primitives.iter().map(Primitive::bounding_box).collect();
    let centers: Vec<Vec3> = primitives.iter().map(Primitive::center).collect();
    let mut order: Vec<u32> = (0..primitives.len() as u32).collect();

    let root = if order.is_empty() {
        BinaryNode::Leaf {
            bbox: BoundingBox::EMPTY,
            first: 0,
            count: 0,
        }
    } else {
        build_range(&bboxes, &centers, &mut order, 0, max_leaf_size.max(1))
    };
    (root, order)
}

fn range_bbox(bboxes: &[BoundingBox], indices: &[u32]) -> BoundingBox {
    indices
        .iter()
        .fold(BoundingBox::EMPTY, |bb, &i| bb.extend(bboxes[i as usize]))
}

fn centroid_bbox(centers: &[Vec3], indices: &[u32]) -> BoundingBox {
    indices.iter().fold(BoundingBox::EMPTY, |bb, &i| {
        bb.extend_point(centers[i as usize])
    })
}

/// Recursively splits `indices[..]` in place (a sub-slice of the global
/// `order` array, starting at `base_offset`) using a binned SAH cost
/// estimate; falls back to an axis-median split whenever every candidate
/// split bin would be empty (e.g. all centroids identical).
fn build_range(
    bboxes: &[BoundingBox],
    centers: &[Vec3],
    indices: &mut [u32],
    base_offset: u32,
    max_leaf_size: u32,
) -> BinaryNode {
    let bbox = range_bbox(bboxes, indices);

    if indices.len() as u32 <= max_leaf_size {
        return BinaryNode::Leaf {
            bbox,
            first: base_offset,
            count: indices.len() as u32,
        };
    }

    let centroid_bounds = centroid_bbox(centers, indices);
    let extent = centroid_bounds.max - centroid_bounds.min;
    let axis = if extent.x >= extent.y && extent.x >= extent.z {
        0
    } else if extent.y >= extent.z {
        1
    } else {
        2
    };

    let axis_extent = extent[axis];
    let split = if axis_extent <= f32::EPSILON {
        // All centroids coincide on this axis: equal-count split keeps
        // recursion terminating instead of looping on a degenerate bin.
        indices.len() / 2
    } else {
        binned_sah_split(bboxes, centers, indices, axis, centroid_bounds.min[axis], axis_extent)
            .unwrap_or(indices.len() / 2)
    };
    let split = split.clamp(1, indices.len() - 1);

    indices.select_nth_unstable_by(split, |&a, &b| {
        centers[a as usize][axis]
            .partial_cmp(&centers[b as usize][axis])
            .unwrap()
    });
    let (left_indices, right_indices) = indices.split_at_mut(split);

    let left = build_range(bboxes, centers, left_indices, base_offset, max_leaf_size);
    let right = build_range(
        bboxes,
        centers,
        right_indices,
        base_offset + split as u32,
        max_leaf_size,
    );

    BinaryNode::Interior {
        bbox,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Bins centroids into [`SAH_BINS`] buckets along `axis` and returns the
/// split index (a count, not a bin) minimizing `cost = SA(left) * count(left)
/// + SA(right) * count(right)`, or `None` if no bin boundary separates any
/// primitives.
fn binned_sah_split(
    bboxes: &[BoundingBox],
    centers: &[Vec3],
    indices: &[u32],
    axis: usize,
    axis_min: f32,
    axis_extent: f32,
) -> Option<usize> {
    #[derive(Clone, Copy)]
    struct Bin {
        bbox: BoundingBox,
        count: u32,
    }
    let mut bins = [Bin {
        bbox: BoundingBox::EMPTY,
        count: 0,
    }; SAH_BINS];

    let bin_of = |c: f32| -> usize {
        let t = ((c - axis_min) / axis_extent * SAH_BINS as f32) as usize;
        t.min(SAH_BINS - 1)
    };

    for &i in indices {
        let b = bin_of(centers[i as usize][axis]);
        bins[b].bbox = bins[b].bbox.extend(bboxes[i as usize]);
        bins[b].count += 1;
    }

    let mut left_area = [0.0f32; SAH_BINS];
    let mut left_count = [0u32; SAH_BINS];
    let mut running_bbox = BoundingBox::EMPTY;
    let mut running_count = 0u32;
    for b in 0..SAH_BINS {
        running_bbox = running_bbox.extend(bins[b].bbox);
        running_count += bins[b].count;
        left_area[b] = surface_area(&running_bbox);
        left_count[b] = running_count;
    }

    let mut right_area = [0.0f32; SAH_BINS];
    let mut right_count = [0u32; SAH_BINS];
    let mut running_bbox = BoundingBox::EMPTY;
    let mut running_count = 0u32;
    for b in (0..SAH_BINS).rev() {
        running_bbox = running_bbox.extend(bins[b].bbox);
        running_count += bins[b].count;
        right_area[b] = surface_area(&running_bbox);
        right_count[b] = running_count;
    }

    let mut best_cost = f32::INFINITY;
    let mut best_split = None;
    for b in 0..SAH_BINS - 1 {
        if left_count[b] == 0 || right_count[b + 1] == 0 {
            continue;
        }
        let cost = TRAVERSAL_COST
            + left_area[b] * left_count[b] as f32
            + right_area[b + 1] * right_count[b + 1] as f32;
        if cost < best_cost {
            best_cost = cost;
            best_split = Some(left_count[b] as usize);
        }
    }
    best_split
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Point(Vec3);

    impl Primitive for Point {
        fn bounding_box(&self) -> BoundingBox {
            BoundingBox::EMPTY.extend_point(self.0)
        }
        fn center(&self) -> Vec3 {
            self.0
        }
    }

    #[test]
    fn single_primitive_builds_one_leaf() {
        let pts = [Point(Vec3::ZERO)];
        let (root, order) = build(&pts, 4);
        assert!(root.is_leaf());
        assert_eq!(order, vec![0]);
    }

    #[test]
    fn many_primitives_respect_max_leaf_size() {
        let pts: Vec<Point> = (0..64).map(|i| Point(Vec3::new(i as f32, 0.0, 0.0))).collect();
        let (root, order) = build(&pts, 4);
        assert_eq!(order.len(), 64);
        fn check(node: &BinaryNode, max_leaf: u32) {
            match node {
                BinaryNode::Leaf { count, .. } => assert!(*count <= max_leaf),
                BinaryNode::Interior { left, right, .. } => {
                    check(left, max_leaf);
                    check(right, max_leaf);
                }
            }
        }
        check(&root, 4);
    }

    #[test]
    fn order_is_a_permutation_of_primitive_indices() {
        let pts: Vec<Point> = (0..32).map(|i| Point(Vec3::new(i as f32 * 0.3, i as f32, 0.0))).collect();
        let (_, mut order) = build(&pts, 2);
        order.sort_unstable();
        assert_eq!(order, (0..32).collect::<Vec<_>>());
    }
}
