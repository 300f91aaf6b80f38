use std::cmp::Ordering::Equal;
use log::info;
use typed_arena::Arena;
use crate::core::primitive::{Primitive, GeometricPrimitive};
use crate::core::geometry::bounds::Bounds3f;
use crate::core::geometry::point::Point3f;
use crate::core::geometry::vector::Vector3f;
use crate::core::geometry::ray::Ray;
use crate::core::interaction::SurfaceInteraction;
use crate::{stat_counter, stat_int_distribution};

stat_int_distribution!("BVH/Primitives per leaf node", primitives_per_leaf);
stat_counter!("BVH/Interior nodes", interior_nodes);
stat_counter!("BVH/Leaf nodes", leaf_nodes);

pub fn init_stats() {
    primitives_per_leaf::init();
    interior_nodes::init();
    leaf_nodes::init();
}

const MAX_TODO: usize = 64;

#[derive(Debug, Default, Copy, Clone)]
struct BVHPrimitiveInfo {
    primitive_number: usize,
    bounds          : Bounds3f,
    centroid        : Point3f
}

impl BVHPrimitiveInfo {
    fn new(primitive_number: usize, bounds: &Bounds3f) -> Self {
        Self {
            primitive_number,
            bounds: *bounds,
            centroid: bounds.p_min * 0.5 + bounds.p_max * 0.5
        }
    }
}

#[derive(Debug, Default, Copy, Clone)]
struct LinearBVHNode {
    bounds      : Bounds3f,
    n_primitives: u16,
    // Leaf: first primitive. Interior: second child.
    offset      : u32,
    axis        : u8
}

#[derive(Debug, Default)]
struct BVHBuildNode<'a> {
    bounds              : Bounds3f,
    left                : Option<&'a BVHBuildNode<'a>>,
    right               : Option<&'a BVHBuildNode<'a>>,
    split_axis          : usize,
    first_prim_offset   : usize,
    n_primitives        : usize
}

impl<'a> BVHBuildNode<'a> {
    fn init_leaf(&mut self, first: usize, n: usize, b: &Bounds3f) {
        self.first_prim_offset = first;
        self.n_primitives = n;
        self.bounds = *b;
        leaf_nodes::inc();
        primitives_per_leaf::report_value(n as u64);
    }

    fn init_interior(&mut self, axis: usize, left: &'a BVHBuildNode<'a>, right: &'a BVHBuildNode<'a>) {
        self.bounds = left.bounds.union_bounds(&right.bounds);
        self.left = Some(left);
        self.right = Some(right);
        self.split_axis = axis;
        self.n_primitives = 0;
        interior_nodes::inc();
    }
}

/// Bounding volume hierarchy over the scene's geometric primitives, split
/// into equal-count halves along the axis of largest centroid extent.
///
/// Hits report the index of the primitive in this aggregate, which is what
/// `primitive()` takes.
pub struct BVHAccel {
    max_prims   : usize,
    primitives  : Vec<GeometricPrimitive>,
    nodes       : Vec<LinearBVHNode>
}

impl BVHAccel {
    pub fn new(prims: Vec<GeometricPrimitive>, max_prims: usize) -> Self {
        info!("Building BVH accelerator with {} primitives", prims.len());
        let max_prims = max_prims.clamp(1, 255);

        if prims.is_empty() {
            return Self { max_prims, primitives: prims, nodes: Vec::new() };
        }

        let mut primitive_info: Vec<BVHPrimitiveInfo> = prims
            .iter()
            .enumerate()
            .map(|(i, p)| BVHPrimitiveInfo::new(i, &p.world_bound()))
            .collect();

        let arena = Arena::with_capacity(2 * prims.len());
        let mut total_nodes = 0;
        let mut ordered = Vec::with_capacity(prims.len());
        let n = prims.len();
        let root = recursive_build(
            &arena, max_prims, &mut primitive_info, 0, n, &mut total_nodes, &mut ordered);

        let mut nodes = vec![LinearBVHNode::default(); total_nodes];
        let mut offset = 0;
        flatten_bvhtree(&mut nodes, root, &mut offset);
        debug_assert_eq!(total_nodes, offset);

        info!("BVH created with {} nodes for {} primitives", total_nodes, n);

        let primitives = ordered.into_iter().map(|i| prims[i].clone()).collect();

        Self { max_prims, primitives, nodes }
    }

    pub fn primitive(&self, idx: usize) -> &GeometricPrimitive {
        &self.primitives[idx]
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn max_prims_in_node(&self) -> usize {
        self.max_prims
    }

    pub fn world_bound(&self) -> Bounds3f {
        match self.nodes.first() {
            Some(n) => n.bounds,
            None    => Bounds3f::default()
        }
    }

    /// Closest hit along `r`, shortening `r.t_max`. The interaction carries
    /// the index of the primitive that was hit.
    pub fn intersect(&self, r: &mut Ray) -> Option<SurfaceInteraction> {
        let mut hit = None;

        self.traverse(r, |prim_idx, ray| {
            if let Some(mut isect) = self.primitives[prim_idx].intersect(ray) {
                isect.primitive = Some(prim_idx);
                hit = Some(isect);
            }

            false
        });

        hit
    }

    pub fn intersect_p(&self, r: &Ray) -> bool {
        let mut ray = *r;
        let mut occluded = false;

        self.traverse(&mut ray, |prim_idx, ray| {
            occluded = self.primitives[prim_idx].intersect_p(ray);
            occluded
        });

        occluded
    }

    /// Visits leaf primitives front to back. `visit` returns true to stop.
    fn traverse<F>(&self, r: &mut Ray, mut visit: F)
    where
        F: FnMut(usize, &mut Ray) -> bool
    {
        if self.nodes.is_empty() { return; }

        let inv_dir = Vector3f::new(1.0 / r.d.x, 1.0 / r.d.y, 1.0 / r.d.z);
        let dir_is_neg: [usize; 3] = [
            (inv_dir.x < 0.0) as usize,
            (inv_dir.y < 0.0) as usize,
            (inv_dir.z < 0.0) as usize
        ];

        let mut to_visit_offset = 0;
        let mut current = 0;
        let mut nodes_to_visit = [0usize; MAX_TODO];

        loop {
            let node = &self.nodes[current];

            if node.bounds.intersect_p(r, &inv_dir, dir_is_neg) {
                if node.n_primitives > 0 {
                    for i in 0..node.n_primitives as usize {
                        if visit(node.offset as usize + i, r) { return; }
                    }

                    if to_visit_offset == 0 { break; }
                    to_visit_offset -= 1;
                    current = nodes_to_visit[to_visit_offset];
                } else if dir_is_neg[node.axis as usize] != 0 {
                    // Far child is the first one
                    nodes_to_visit[to_visit_offset] = current + 1;
                    to_visit_offset += 1;
                    current = node.offset as usize;
                } else {
                    nodes_to_visit[to_visit_offset] = node.offset as usize;
                    to_visit_offset += 1;
                    current += 1;
                }
            } else {
                if to_visit_offset == 0 { break; }
                to_visit_offset -= 1;
                current = nodes_to_visit[to_visit_offset];
            }
        }
    }
}

fn recursive_build<'a>(
    arena: &'a Arena<BVHBuildNode<'a>>, max_prims: usize,
    primitive_info: &mut [BVHPrimitiveInfo], start: usize, end: usize,
    total_nodes: &mut usize, ordered: &mut Vec<usize>) -> &'a BVHBuildNode<'a> {
    let node = arena.alloc(BVHBuildNode::default());
    *total_nodes += 1;

    let bounds = primitive_info[start..end]
        .iter()
        .fold(Bounds3f::default(), |b, p| b.union_bounds(&p.bounds));
    let centroid_bounds = primitive_info[start..end]
        .iter()
        .fold(Bounds3f::default(), |b, p| b.union_point(&p.centroid));
    let dim = centroid_bounds.maximum_extent();
    let nprims = end - start;

    if nprims <= max_prims || centroid_bounds.p_max[dim] == centroid_bounds.p_min[dim] {
        let offset = ordered.len();
        ordered.extend(primitive_info[start..end].iter().map(|p| p.primitive_number));
        node.init_leaf(offset, nprims, &bounds);

        return node;
    }

    // Partition into equally sized subsets around the median centroid
    let mid = (start + end) / 2;
    primitive_info[start..end].select_nth_unstable_by(mid - start, |a, b| {
        a.centroid[dim].partial_cmp(&b.centroid[dim]).unwrap_or(Equal)
    });

    let left = recursive_build(arena, max_prims, primitive_info, start, mid, total_nodes, ordered);
    let right = recursive_build(arena, max_prims, primitive_info, mid, end, total_nodes, ordered);
    node.init_interior(dim, left, right);

    node
}

fn flatten_bvhtree(nodes: &mut [LinearBVHNode], node: &BVHBuildNode, offset: &mut usize) -> usize {
    let my_offset = *offset;
    *offset += 1;

    if node.n_primitives > 0 {
        nodes[my_offset] = LinearBVHNode {
            bounds: node.bounds,
            n_primitives: node.n_primitives as u16,
            offset: node.first_prim_offset as u32,
            axis: 0
        };
    } else if let (Some(l), Some(r)) = (node.left, node.right) {
        flatten_bvhtree(nodes, l, offset);
        let second = flatten_bvhtree(nodes, r, offset);

        nodes[my_offset] = LinearBVHNode {
            bounds: node.bounds,
            n_primitives: 0,
            offset: second as u32,
            axis: node.split_axis as u8
        };
    }

    my_offset
}
