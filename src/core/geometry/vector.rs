use std::ops::{Sub, Mul, SubAssign, DivAssign, Index};
use std::fmt::{Display, Formatter, Result};
use crate::core::pbrt::Float;
use super::normal::Normal3;

pub type Vector2f = Vector2<Float>;
pub type Vector2i = Vector2<i32>;
pub type Vector3f = Vector3<Float>;

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Vector2<T> {
    pub x: T,
    pub y: T
}

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Vector3<T> {
    pub x: T,
    pub y: T,
    pub z: T
}

/// Component-wise arithmetic shared by the vector-like types.
#[macro_export]
macro_rules! impl_componentwise {
    ($ty:ident; $($f:ident),+) => {
        impl<T: Copy + std::ops::Add<Output = T>> std::ops::Add for $ty<T> {
            type Output = Self;

            fn add(self, rhs: Self) -> Self {
                $ty { $($f: self.$f + rhs.$f),+ }
            }
        }

        impl<T: Copy + std::ops::AddAssign> std::ops::AddAssign for $ty<T> {
            fn add_assign(&mut self, rhs: Self) {
                $(self.$f += rhs.$f;)+
            }
        }

        impl<T: Copy + std::ops::Mul<Output = T>> std::ops::Mul<T> for $ty<T> {
            type Output = Self;

            fn mul(self, s: T) -> Self {
                $ty { $($f: self.$f * s),+ }
            }
        }

        impl<T: Copy + std::ops::MulAssign> std::ops::MulAssign<T> for $ty<T> {
            fn mul_assign(&mut self, s: T) {
                $(self.$f *= s;)+
            }
        }

        impl<T: Copy + std::ops::Div<Output = T>> std::ops::Div<T> for $ty<T> {
            type Output = Self;

            fn div(self, s: T) -> Self {
                $ty { $($f: self.$f / s),+ }
            }
        }

        impl<T: Copy + std::ops::Neg<Output = T>> std::ops::Neg for $ty<T> {
            type Output = Self;

            fn neg(self) -> Self {
                $ty { $($f: -self.$f),+ }
            }
        }
    }
}

impl_componentwise!(Vector2; x, y);
impl_componentwise!(Vector3; x, y, z);

impl<T> Vector2<T> {
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T: Copy + Sub<Output = T>> Sub for Vector2<T> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Vector2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Vector2f {
    pub fn length(&self) -> Float {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

impl<T> Vector3<T> {
    pub fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }
}

impl<T: Copy + Sub<Output = T>> Sub for Vector3<T> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl<T: Copy + SubAssign> SubAssign for Vector3<T> {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
        self.z -= rhs.z;
    }
}

impl<T: Copy + DivAssign> DivAssign<T> for Vector3<T> {
    fn div_assign(&mut self, s: T) {
        self.x /= s;
        self.y /= s;
        self.z /= s;
    }
}

impl<T> Index<usize> for Vector3<T> {
    type Output = T;

    fn index(&self, i: usize) -> &T {
        match i {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Vector3 index {} out of bounds", i)
        }
    }
}

impl Vector3f {
    pub fn has_nans(&self) -> bool {
        self.x.is_nan() || self.y.is_nan() || self.z.is_nan()
    }

    pub fn dot(&self, v: &Self) -> Float {
        self.x * v.x + self.y * v.y + self.z * v.z
    }

    pub fn abs_dot(&self, v: &Self) -> Float {
        self.dot(v).abs()
    }

    pub fn dot_norm(&self, n: &Normal3<Float>) -> Float {
        self.x * n.x + self.y * n.y + self.z * n.z
    }

    pub fn abs_dot_norm(&self, n: &Normal3<Float>) -> Float {
        self.dot_norm(n).abs()
    }

    pub fn cross(&self, v: &Self) -> Self {
        // Promote to f64 to avoid catastrophic cancellation
        let (vx, vy, vz) = (self.x as f64, self.y as f64, self.z as f64);
        let (wx, wy, wz) = (v.x as f64, v.y as f64, v.z as f64);

        Vector3f::new(
            (vy * wz - vz * wy) as Float,
            (vz * wx - vx * wz) as Float,
            (vx * wy - vy * wx) as Float)
    }

    pub fn length_squared(&self) -> Float {
        self.dot(self)
    }

    pub fn length(&self) -> Float {
        self.length_squared().sqrt()
    }

    pub fn normalize(&self) -> Self {
        *self / self.length()
    }

    pub fn abs(&self) -> Self {
        Vector3f::new(self.x.abs(), self.y.abs(), self.z.abs())
    }

    pub fn max_component(&self) -> Float {
        self.x.max(self.y.max(self.z))
    }

    pub fn max_dimension(&self) -> usize {
        if self.x > self.y {
            if self.x > self.z { 0 } else { 2 }
        } else if self.y > self.z {
            1
        } else {
            2
        }
    }

    pub fn face_forward(&self, v: &Self) -> Self {
        if self.dot(v) < 0.0 { -*self } else { *self }
    }
}

impl Mul<Vector3f> for Float {
    type Output = Vector3f;

    fn mul(self, v: Vector3f) -> Vector3f {
        v * self
    }
}

impl From<Normal3<Float>> for Vector3f {
    fn from(n: Normal3<Float>) -> Self {
        Vector3f::new(n.x, n.y, n.z)
    }
}

impl<T: Display> Display for Vector3<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "[ {}, {}, {} ]", self.x, self.y, self.z)
    }
}

/// Builds an orthonormal basis (v2, v3) around the unit vector v1.
pub fn vec3_coordinate_system(v1: &Vector3f) -> (Vector3f, Vector3f) {
    let v2 = if v1.x.abs() > v1.y.abs() {
        Vector3f::new(-v1.z, 0.0, v1.x) / (v1.x * v1.x + v1.z * v1.z).sqrt()
    } else {
        Vector3f::new(0.0, v1.z, -v1.y) / (v1.y * v1.y + v1.z * v1.z).sqrt()
    };

    (v2, v1.cross(&v2))
}

