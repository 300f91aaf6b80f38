use crate::core::pbrt::{Float, next_float_up, next_float_down};
use super::point::Point3f;
use super::vector::Vector3f;
use super::normal::Normal3f;

/// Pushes p off the surface along n, far enough to clear the rounding error
/// bound p_error, on the side w points to.
pub fn offset_ray_origin(p: &Point3f, p_error: &Vector3f, n: &Normal3f, w: &Vector3f) -> Point3f {
    let d = n.x.abs() * p_error.x + n.y.abs() * p_error.y + n.z.abs() * p_error.z;
    let mut offset = Vector3f::from(*n) * d;

    if w.dot_norm(n) < 0.0 {
        offset = -offset;
    }

    let po = *p + offset;
    let bump = |v: Float, o: Float| {
        if o > 0.0 {
            next_float_up(v)
        } else if o < 0.0 {
            next_float_down(v)
        } else {
            v
        }
    };

    Point3f::new(bump(po.x, offset.x), bump(po.y, offset.y), bump(po.z, offset.z))
}

pub fn spherical_direction(sin_theta: Float, cos_theta: Float, phi: Float) -> Vector3f {
    Vector3f::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

pub fn spherical_direction_frame(
    sin_theta: Float, cos_theta: Float, phi: Float,
    x: &Vector3f, y: &Vector3f, z: &Vector3f) -> Vector3f {
    *x * (sin_theta * phi.cos()) + *y * (sin_theta * phi.sin()) + *z * cos_theta
}
