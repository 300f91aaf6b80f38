use std::fmt::{Display, Formatter, Result};
use crate::core::pbrt::Float;
use crate::impl_componentwise;
use super::vector::Vector3f;

pub type Normal3f = Normal3<Float>;

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Normal3<T> {
    pub x: T,
    pub y: T,
    pub z: T
}

impl_componentwise!(Normal3; x, y, z);

impl<T> Normal3<T> {
    pub fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }
}

impl Normal3f {
    pub fn dot(&self, n: &Self) -> Float {
        self.x * n.x + self.y * n.y + self.z * n.z
    }

    pub fn dot_vec(&self, v: &Vector3f) -> Float {
        self.x * v.x + self.y * v.y + self.z * v.z
    }

    pub fn abs_dot_vec(&self, v: &Vector3f) -> Float {
        self.dot_vec(v).abs()
    }

    pub fn length(&self) -> Float {
        self.dot(self).sqrt()
    }

    pub fn normalize(&self) -> Self {
        *self / self.length()
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    /// Flips the normal so it lies in the same hemisphere as v.
    pub fn face_forward(&self, v: &Vector3f) -> Self {
        if self.dot_vec(v) < 0.0 { -*self } else { *self }
    }

    pub fn face_forward_norm(&self, n: &Self) -> Self {
        if self.dot(n) < 0.0 { -*self } else { *self }
    }

    pub fn cross_vec(&self, v: &Vector3f) -> Vector3f {
        Vector3f::from(*self).cross(v)
    }
}

impl From<Vector3f> for Normal3f {
    fn from(v: Vector3f) -> Self {
        Normal3f::new(v.x, v.y, v.z)
    }
}

impl<T: Display> Display for Normal3<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "[ {}, {}, {} ]", self.x, self.y, self.z)
    }
}
