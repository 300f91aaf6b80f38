use std::sync::Arc;
use crate::core::geometry::point::{Point2f, Point3f};
use crate::core::geometry::normal::Normal3f;
use crate::core::geometry::vector::{Vector3f, vec3_coordinate_system};
use crate::core::geometry::bounds::Bounds3f;
use crate::core::geometry::ray::Ray;
use crate::core::pbrt::{Float, gamma};
use crate::core::shape::{Shape, Shapes};
use crate::core::interaction::{SurfaceInteraction, InteractionData};
use crate::core::sampling::uniform_sample_triangle;

/// World-space vertex positions shared by the triangles of one mesh.
#[derive(Debug)]
pub struct TriangleMesh {
    vertex_indices      : Vec<usize>,
    p                   : Vec<Point3f>,
    reverse_orientation : bool
}

#[derive(Debug, Clone)]
pub struct Triangle {
    mesh: Arc<TriangleMesh>,
    v   : usize
}

impl Triangle {
    fn vertices(&self) -> (Point3f, Point3f, Point3f) {
        let idx = &self.mesh.vertex_indices;

        (self.mesh.p[idx[self.v]], self.mesh.p[idx[self.v + 1]], self.mesh.p[idx[self.v + 2]])
    }

    fn oriented(&self, n: Normal3f) -> Normal3f {
        if self.mesh.reverse_orientation { -n } else { n }
    }
}

/// Builds one shape per index triple.
pub fn create_triangle_mesh(
    p: Vec<Point3f>, vertex_indices: Vec<usize>, reverse_orientation: bool) -> Vec<Arc<Shapes>> {
    let ntris = vertex_indices.len() / 3;
    let mesh = Arc::new(TriangleMesh { vertex_indices, p, reverse_orientation });

    (0..ntris)
        .map(|i| Arc::new(Triangle { mesh: mesh.clone(), v: 3 * i }.into()))
        .collect()
}

/// Planar quad p0 p1 p2 p3 as two triangles. The front face is the one
/// (p1 - p0) x (p2 - p0) points to.
pub fn create_quad(p0: Point3f, p1: Point3f, p2: Point3f, p3: Point3f, reverse_orientation: bool) -> Vec<Arc<Shapes>> {
    create_triangle_mesh(vec![p0, p1, p2, p3], vec![0, 1, 2, 0, 2, 3], reverse_orientation)
}

fn permute(v: &Vector3f, x: usize, y: usize, z: usize) -> Vector3f {
    Vector3f::new(v[x], v[y], v[z])
}

fn edge_function(a: &Vector3f, b: &Vector3f) -> Float {
    let e = a.x * b.y - a.y * b.x;
    if e != 0.0 { return e; }

    // Fall back to double precision exactly on an edge
    (a.x as f64 * b.y as f64 - a.y as f64 * b.x as f64) as Float
}

impl Shape for Triangle {
    fn world_bound(&self) -> Bounds3f {
        let (p0, p1, p2) = self.vertices();

        Bounds3f::new(p0, p1).union_point(&p2)
    }

    fn intersect(&self, r: &Ray) -> Option<(Float, SurfaceInteraction)> {
        let (p0, p1, p2) = self.vertices();

        // Translate to the ray origin and permute so the ray points along +z
        let kz = r.d.abs().max_dimension();
        let kx = (kz + 1) % 3;
        let ky = (kx + 1) % 3;
        let d = permute(&r.d, kx, ky, kz);
        let mut p0t = permute(&(p0 - r.o), kx, ky, kz);
        let mut p1t = permute(&(p1 - r.o), kx, ky, kz);
        let mut p2t = permute(&(p2 - r.o), kx, ky, kz);

        // Shear so the ray becomes the +z axis
        let sx = -d.x / d.z;
        let sy = -d.y / d.z;
        let sz = 1.0 / d.z;
        for pt in [&mut p0t, &mut p1t, &mut p2t].iter_mut() {
            pt.x += sx * pt.z;
            pt.y += sy * pt.z;
        }

        let e0 = edge_function(&p1t, &p2t);
        let e1 = edge_function(&p2t, &p0t);
        let e2 = edge_function(&p0t, &p1t);

        if (e0 < 0.0 || e1 < 0.0 || e2 < 0.0) && (e0 > 0.0 || e1 > 0.0 || e2 > 0.0) {
            return None;
        }
        let det = e0 + e1 + e2;
        if det == 0.0 { return None; }

        p0t.z *= sz;
        p1t.z *= sz;
        p2t.z *= sz;
        let t_scaled = e0 * p0t.z + e1 * p1t.z + e2 * p2t.z;
        if det < 0.0 && (t_scaled >= 0.0 || t_scaled < r.t_max * det) {
            return None;
        } else if det > 0.0 && (t_scaled <= 0.0 || t_scaled > r.t_max * det) {
            return None;
        }

        let inv_det = 1.0 / det;
        let (b0, b1, b2) = (e0 * inv_det, e1 * inv_det, e2 * inv_det);
        let t = t_scaled * inv_det;

        // Reject hits whose t is within the rounding error of zero
        let max_zt = Vector3f::new(p0t.z, p1t.z, p2t.z).abs().max_component();
        let max_xt = Vector3f::new(p0t.x, p1t.x, p2t.x).abs().max_component();
        let max_yt = Vector3f::new(p0t.y, p1t.y, p2t.y).abs().max_component();
        let delta_z = gamma(3) * max_zt;
        let delta_x = gamma(5) * (max_xt + max_zt);
        let delta_y = gamma(5) * (max_yt + max_zt);
        let delta_e = 2.0 * (gamma(2) * max_xt * max_yt + delta_y * max_xt + delta_x * max_yt);
        let max_e = Vector3f::new(e0, e1, e2).abs().max_component();
        let delta_t = 3.0 * (gamma(3) * max_e * max_zt + delta_e * max_zt + delta_z * max_e) * inv_det.abs();
        if t <= delta_t { return None; }

        let dp02 = p0 - p2;
        let dp12 = p1 - p2;
        let cross = dp02.cross(&dp12);
        if cross.length_squared() == 0.0 { return None; }

        // Parameterization with uv (0,0), (1,0), (1,1)
        let mut dpdu = p1 - p0;
        if dpdu.length_squared() == 0.0 {
            dpdu = vec3_coordinate_system(&cross.normalize()).0;
        }

        let p_hit = p0 * b0 + p1 * b1 + p2 * b2;
        let uv = Point2f::new(b1 + b2, b2);
        let abs_sum = (Vector3f::from(p0) * b0).abs() + (Vector3f::from(p1) * b1).abs() + (Vector3f::from(p2) * b2).abs();
        let p_error = abs_sum * gamma(7);
        let n = self.oriented(Normal3f::from(cross.normalize()));

        Some((t, SurfaceInteraction::new(p_hit, p_error, uv, -r.d, dpdu, n, r.time)))
    }

    fn area(&self) -> Float {
        let (p0, p1, p2) = self.vertices();

        0.5 * (p1 - p0).cross(&(p2 - p0)).length()
    }

    fn sample(&self, u: &Point2f) -> (InteractionData, Float) {
        let (p0, p1, p2) = self.vertices();
        let b = uniform_sample_triangle(u);
        let b2 = 1.0 - b.x - b.y;

        let mut it = InteractionData::default();
        it.p = p0 * b.x + p1 * b.y + p2 * b2;
        it.n = self.oriented(Normal3f::from((p1 - p0).cross(&(p2 - p0)).normalize()));
        let abs_sum = (Vector3f::from(p0) * b.x).abs() + (Vector3f::from(p1) * b.y).abs() + (Vector3f::from(p2) * b2).abs();
        it.p_error = abs_sum * gamma(6);

        (it, 1.0 / self.area())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::relative_eq;

    fn floor() -> Vec<Arc<Shapes>> {
        create_quad(
            Point3f::new(-1.0, 0.0, -1.0), Point3f::new(-1.0, 0.0, 1.0),
            Point3f::new(1.0, 0.0, 1.0), Point3f::new(1.0, 0.0, -1.0), false)
    }

    #[test]
    fn quad_faces_up_and_has_unit_area_halves() {
        let tris = floor();
        let (it, pdf) = tris[0].sample(&Point2f::new(0.3, 0.6));

        assert!(relative_eq!(it.n.y, 1.0));
        assert!(relative_eq!(tris[0].area() + tris[1].area(), 4.0));
        assert!(relative_eq!(pdf, 0.5));
    }

    #[test]
    fn ray_hits_one_of_the_halves() {
        let tris = floor();
        let r = Ray::new(Point3f::new(0.2, 1.0, 0.3), Vector3f::new(0.0, -1.0, 0.0), Float::INFINITY, 0.0, None);
        let hits: Vec<_> = tris.iter().filter_map(|t| t.intersect(&r)).collect();

        assert_eq!(hits.len(), 1);
        assert!(relative_eq!(hits[0].0, 1.0, epsilon = 1e-5));
        assert!(relative_eq!(hits[0].1.it.p.x, 0.2, epsilon = 1e-5));
    }

    #[test]
    fn misses_outside_and_behind() {
        let tris = floor();
        let outside = Ray::new(Point3f::new(2.0, 1.0, 0.0), Vector3f::new(0.0, -1.0, 0.0), Float::INFINITY, 0.0, None);
        let behind = Ray::new(Point3f::new(0.0, 1.0, 0.0), Vector3f::new(0.0, 1.0, 0.0), Float::INFINITY, 0.0, None);

        assert!(tris.iter().all(|t| t.intersect(&outside).is_none()));
        assert!(tris.iter().all(|t| t.intersect(&behind).is_none()));
    }
}
