use crate::core::pbrt::{Float, INFINITY, gamma};
use super::point::{Point2i, Point3f};
use super::vector::Vector3f;
use super::ray::Ray;

pub type Bounds2i = Bounds2<i32>;

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Bounds2<T> {
    pub p_min: super::point::Point2<T>,
    pub p_max: super::point::Point2<T>
}

impl Bounds2i {
    pub fn new(p1: Point2i, p2: Point2i) -> Self {
        Self {
            p_min: Point2i::new(p1.x.min(p2.x), p1.y.min(p2.y)),
            p_max: Point2i::new(p1.x.max(p2.x), p1.y.max(p2.y))
        }
    }

    pub fn area(&self) -> i32 {
        let d = self.p_max - self.p_min;

        d.x * d.y
    }

    pub fn inside_exclusive(&self, p: &Point2i) -> bool {
        p.x >= self.p_min.x && p.x < self.p_max.x && p.y >= self.p_min.y && p.y < self.p_max.y
    }

    /// Iterates pixel coordinates in scanline order.
    pub fn iter(&self) -> impl Iterator<Item = Point2i> {
        let b = *self;

        (b.p_min.y..b.p_max.y)
            .flat_map(move |y| (b.p_min.x..b.p_max.x).map(move |x| Point2i::new(x, y)))
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bounds3f {
    pub p_min: Point3f,
    pub p_max: Point3f
}

impl Default for Bounds3f {
    fn default() -> Self {
        Self {
            p_min: Point3f::new(INFINITY, INFINITY, INFINITY),
            p_max: Point3f::new(-INFINITY, -INFINITY, -INFINITY)
        }
    }
}

impl Bounds3f {
    pub fn new(p1: Point3f, p2: Point3f) -> Self {
        Self { p_min: p1.min(&p2), p_max: p1.max(&p2) }
    }

    pub fn from_point(p: Point3f) -> Self {
        Self { p_min: p, p_max: p }
    }

    pub fn is_empty(&self) -> bool {
        self.p_min.x > self.p_max.x || self.p_min.y > self.p_max.y || self.p_min.z > self.p_max.z
    }

    pub fn diagonal(&self) -> Vector3f {
        self.p_max - self.p_min
    }

    pub fn maximum_extent(&self) -> usize {
        self.diagonal().max_dimension()
    }

    pub fn centroid(&self) -> Point3f {
        self.p_min * 0.5 + self.p_max * 0.5
    }

    pub fn union_point(&self, p: &Point3f) -> Self {
        Self { p_min: self.p_min.min(p), p_max: self.p_max.max(p) }
    }

    pub fn union_bounds(&self, b: &Self) -> Self {
        Self { p_min: self.p_min.min(&b.p_min), p_max: self.p_max.max(&b.p_max) }
    }

    pub fn surface_area(&self) -> Float {
        let d = self.diagonal();

        2.0 * (d.x * d.y + d.x * d.z + d.y * d.z)
    }

    pub fn bounding_sphere(&self) -> (Point3f, Float) {
        let center = self.centroid();
        let radius = if self.is_empty() { 0.0 } else { center.distance(&self.p_max) };

        (center, radius)
    }

    pub fn expand(&self, delta: Float) -> Self {
        let d = Vector3f::new(delta, delta, delta);

        Self { p_min: self.p_min - d, p_max: self.p_max + d }
    }

    /// Slab test against precomputed reciprocal direction.
    pub fn intersect_p(&self, ray: &Ray, inv_dir: &Vector3f, dir_is_neg: [usize; 3]) -> bool {
        let corner = |neg: usize| if neg == 1 { self.p_max } else { self.p_min };
        let robust = 1.0 + 2.0 * gamma(3);

        let mut tmin = (corner(dir_is_neg[0]).x - ray.o.x) * inv_dir.x;
        let mut tmax = (corner(1 - dir_is_neg[0]).x - ray.o.x) * inv_dir.x * robust;
        let tymin = (corner(dir_is_neg[1]).y - ray.o.y) * inv_dir.y;
        let tymax = (corner(1 - dir_is_neg[1]).y - ray.o.y) * inv_dir.y * robust;

        if tmin > tymax || tymin > tmax { return false; }
        if tymin > tmin { tmin = tymin; }
        if tymax < tmax { tmax = tymax; }

        let tzmin = (corner(dir_is_neg[2]).z - ray.o.z) * inv_dir.z;
        let tzmax = (corner(1 - dir_is_neg[2]).z - ray.o.z) * inv_dir.z * robust;

        if tmin > tzmax || tzmin > tmax { return false; }
        if tzmin > tmin { tmin = tzmin; }
        if tzmax < tmax { tmax = tzmax; }

        tmin < ray.t_max && tmax > 0.0
    }
}
