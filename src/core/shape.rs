use enum_dispatch::enum_dispatch;
use crate::core::geometry::bounds::Bounds3f;
use crate::core::geometry::ray::Ray;
use crate::core::geometry::point::Point2f;
use crate::core::geometry::vector::Vector3f;
use crate::core::interaction::{SurfaceInteraction, InteractionData, Interaction};
use crate::core::pbrt::Float;
use crate::shapes::sphere::Sphere;
use crate::shapes::triangle::Triangle;

#[enum_dispatch]
pub trait Shape {
    fn world_bound(&self) -> Bounds3f;

    /// Closest hit with parametric distance in (0, r.t_max).
    fn intersect(&self, r: &Ray) -> Option<(Float, SurfaceInteraction)>;

    fn intersect_p(&self, r: &Ray) -> bool {
        self.intersect(r).is_some()
    }

    fn area(&self) -> Float;

    /// Point uniformly distributed over the surface with its area density.
    fn sample(&self, u: &Point2f) -> (InteractionData, Float);

    /// Point on the surface as seen from `refp`, density w.r.t. solid angle at `refp`.
    fn sample_ref(&self, refp: &InteractionData, u: &Point2f) -> (InteractionData, Float) {
        shape_sample_by_area(self, refp, u)
    }

    /// Solid-angle density at `refp` of hitting the shape along `wi`.
    fn pdf_ref(&self, refp: &InteractionData, wi: &Vector3f) -> Float {
        shape_pdf_by_area(self, refp, wi)
    }
}

#[enum_dispatch(Shape)]
#[derive(Debug, Clone)]
pub enum Shapes {
    Sphere,
    Triangle
}

/// Area sampling converted to solid angle at `refp`.
pub fn shape_sample_by_area<S: Shape + ?Sized>(
    s: &S, refp: &InteractionData, u: &Point2f) -> (InteractionData, Float) {
    let (intr, pdf) = s.sample(u);
    let wi = intr.p - refp.p;
    if wi.length_squared() == 0.0 { return (intr, 0.0); }

    let wi = wi.normalize();
    let pdf = pdf * refp.p.distance_squared(&intr.p) / intr.n.abs_dot_vec(&-wi);

    (intr, if pdf.is_infinite() { 0.0 } else { pdf })
}

pub fn shape_pdf_by_area<S: Shape + ?Sized>(s: &S, refp: &InteractionData, wi: &Vector3f) -> Float {
    let ray = refp.spawn_ray(wi);

    match s.intersect(&ray) {
        Some((_, isect)) => {
            let pdf = refp.p.distance_squared(&isect.it.p) / (isect.it.n.abs_dot_vec(&-*wi) * s.area());
            if pdf.is_infinite() { 0.0 } else { pdf }
        }
        None => 0.0
    }
}
