//! Collapses a binary BVH into the wide node layout shaders traverse
//! (spec.md §4.2, §6).
//!
//! Grounded on `original_source/src/runtime/bvh/BvhNAdapter.h`'s
//! `write_node`/`write_leaf` pair: a treelet around each binary node is
//! greedily expanded (always opening the largest-surface-area interior
//! child) until it has `fan_out` children or runs out of interior nodes to
//! open, then each child is written into a lane of a flat [`NaryNode`] with
//! the remaining lanes padded to an empty, non-intersecting bound. Interior
//! child indices are one-based (`0` means "no child"); leaf child indices
//! are the bitwise NOT of the starting offset into the leaf record array
//! written by the caller's [`LeafWriter`].

use crate::bvh::binary::BinaryNode;
use crate::database::BoundingBox;

pub const MAX_FAN_OUT: usize = 8;

/// One wide BVH node. `bounds[0..3]` hold per-lane axis minimums,
/// `bounds[3..6]` per-lane maximums; only the first `fan_out` lanes of a
/// node matter, the rest are padding.
#[derive(Debug, Clone, Copy)]
pub struct NaryNode {
    pub bounds: [[f32; MAX_FAN_OUT]; 6],
    /// `0` = empty slot, `>0` = one-based node index, `<0` = bit-inverted
    /// leaf record offset.
    pub child: [i32; MAX_FAN_OUT],
}

impl NaryNode {
    fn empty() -> Self {
        let mut bounds = [[0.0f32; MAX_FAN_OUT]; 6];
        for axis in 0..3 {
            bounds[axis] = [f32::INFINITY; MAX_FAN_OUT];
            bounds[axis + 3] = [f32::NEG_INFINITY; MAX_FAN_OUT];
        }
        Self {
            bounds,
            child: [0; MAX_FAN_OUT],
        }
    }

    fn set_lane(&mut self, lane: usize, bbox: BoundingBox) {
        self.bounds[0][lane] = bbox.min.x;
        self.bounds[1][lane] = bbox.min.y;
        self.bounds[2][lane] = bbox.min.z;
        self.bounds[3][lane] = bbox.max.x;
        self.bounds[4][lane] = bbox.max.y;
        self.bounds[5][lane] = bbox.max.z;
    }
}

/// Receives the primitive indices of a collapsed BVH leaf, in traversal
/// order, and returns the starting offset of the records it wrote into its
/// own output buffer (for the caller to bit-invert into the parent's child
/// slot).
pub trait LeafWriter {
    fn write_leaf(&mut self, order: &[u32], first: u32, count: u32) -> u32;
}

/// An intermediate treelet: either a binary leaf, or an interior node with
/// between 2 and `fan_out` children (each itself a treelet). Interior nodes
/// carry their own bounding box since it's no longer recoverable once the
/// underlying binary nodes have been flattened into a lane list.
enum Collapsed<'a> {
    Leaf(&'a BinaryNode),
    Interior(BoundingBox, Vec<Collapsed<'a>>),
}

impl Collapsed<'_> {
    fn bounding_box(&self) -> BoundingBox {
        match self {
            Collapsed::Leaf(n) => n.bounding_box(),
            Collapsed::Interior(bbox, _) => *bbox,
        }
    }
}

fn collapse_node(node: &BinaryNode, fan_out: usize) -> Collapsed<'_> {
    let BinaryNode::Interior { left, right, .. } = node else {
        return Collapsed::Leaf(node);
    };

    let mut candidates: Vec<&BinaryNode> = vec![left, right];
    loop {
        if candidates.len() >= fan_out {
            break;
        }
        let expand = candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_leaf())
            .max_by(|(_, a), (_, b)| a.surface_area().partial_cmp(&b.surface_area()).unwrap());
        let Some((idx, _)) = expand else { break };
        let BinaryNode::Interior { left, right, .. } = candidates.remove(idx) else {
            unreachable!("filtered to interior nodes above")
        };
        candidates.push(left);
        candidates.push(right);
    }

    Collapsed::Interior(
        node.bounding_box(),
        candidates.into_iter().map(|c| collapse_node(c, fan_out)).collect(),
    )
}

/// Collapses `root` (with its primitive-index permutation `order`, as
/// returned by [`crate::bvh::binary::build`]) into a flat array of
/// `fan_out`-wide nodes, writing leaves through `writer`.
pub fn build<W: LeafWriter>(
    root: &BinaryNode,
    order: &[u32],
    fan_out: usize,
    writer: &mut W,
) -> Vec<NaryNode> {
    assert!((2..=MAX_FAN_OUT).contains(&fan_out));
    let mut nodes = Vec::new();

    if root.is_leaf() {
        // A scene with too few primitives to split collapses to a single
        // interior node wrapping the one leaf, matching the adapter's
        // root-is-leaf special case.
        write_node(&mut nodes, &[Collapsed::Leaf(root)], None, 0, order, writer);
    } else {
        let collapsed = collapse_node(root, fan_out);
        let Collapsed::Interior(_, children) = collapsed else {
            unreachable!("collapse_node only returns Leaf for a BinaryNode::Leaf input")
        };
        write_node(&mut nodes, &children, None, 0, order, writer);
    }
    nodes
}

fn write_node<W: LeafWriter>(
    nodes: &mut Vec<NaryNode>,
    children: &[Collapsed<'_>],
    parent: Option<(usize, usize)>,
    _depth: usize,
    order: &[u32],
    writer: &mut W,
) {
    let node_id = nodes.len();
    if let Some((parent_id, lane)) = parent {
        nodes[parent_id].child[lane] = (node_id as i32) + 1;
    }
    nodes.push(NaryNode::empty());

    // Two passes: first record every lane's bounds, then recurse into
    // interior lanes (recursion may realloc `nodes`, which would invalidate
    // a `&mut NaryNode` held across the call).
    for (lane, child) in children.iter().enumerate() {
        nodes[node_id].set_lane(lane, child.bounding_box());
    }

    for (lane, child) in children.iter().enumerate() {
        match child {
            Collapsed::Leaf(leaf_node) => {
                let BinaryNode::Leaf { first, count, .. } = leaf_node else {
                    unreachable!("Collapsed::Leaf always wraps a BinaryNode::Leaf")
                };
                let offset = writer.write_leaf(order, *first, *count);
                nodes[node_id].child[lane] = !(offset as i32);
            }
            Collapsed::Interior(_, grandchildren) => {
                write_node(nodes, grandchildren, Some((node_id, lane)), _depth + 1, order, writer);
            }
        }
    }
}
