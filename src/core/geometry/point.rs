use std::ops::{Add, Sub, AddAssign, Index};
use std::fmt::{Display, Formatter, Result};
use crate::core::pbrt::Float;
use crate::impl_componentwise;
use super::vector::{Vector2, Vector3, Vector3f};

pub type Point2f = Point2<Float>;
pub type Point2i = Point2<i32>;
pub type Point3f = Point3<Float>;

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Point2<T> {
    pub x: T,
    pub y: T
}

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Point3<T> {
    pub x: T,
    pub y: T,
    pub z: T
}

impl_componentwise!(Point2; x, y);
impl_componentwise!(Point3; x, y, z);

impl<T> Point2<T> {
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T: Copy + Sub<Output = T>> Sub for Point2<T> {
    type Output = Vector2<T>;

    fn sub(self, rhs: Self) -> Vector2<T> {
        Vector2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl<T: Copy + Add<Output = T>> Add<Vector2<T>> for Point2<T> {
    type Output = Self;

    fn add(self, v: Vector2<T>) -> Self {
        Point2::new(self.x + v.x, self.y + v.y)
    }
}

impl<T> Index<usize> for Point2<T> {
    type Output = T;

    fn index(&self, i: usize) -> &T {
        match i {
            0 => &self.x,
            1 => &self.y,
            _ => panic!("Point2 index {} out of bounds", i)
        }
    }
}

impl From<Point2i> for Point2f {
    fn from(p: Point2i) -> Self {
        Point2f::new(p.x as Float, p.y as Float)
    }
}

impl From<Point2f> for Point2i {
    fn from(p: Point2f) -> Self {
        Point2i::new(p.x.floor() as i32, p.y.floor() as i32)
    }
}

impl<T> Point3<T> {
    pub fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }
}

impl<T: Copy + Sub<Output = T>> Sub for Point3<T> {
    type Output = Vector3<T>;

    fn sub(self, rhs: Self) -> Vector3<T> {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl<T: Copy + Add<Output = T>> Add<Vector3<T>> for Point3<T> {
    type Output = Self;

    fn add(self, v: Vector3<T>) -> Self {
        Point3::new(self.x + v.x, self.y + v.y, self.z + v.z)
    }
}

impl<T: Copy + AddAssign> AddAssign<Vector3<T>> for Point3<T> {
    fn add_assign(&mut self, v: Vector3<T>) {
        self.x += v.x;
        self.y += v.y;
        self.z += v.z;
    }
}

impl<T: Copy + Sub<Output = T>> Sub<Vector3<T>> for Point3<T> {
    type Output = Self;

    fn sub(self, v: Vector3<T>) -> Self {
        Point3::new(self.x - v.x, self.y - v.y, self.z - v.z)
    }
}

impl<T> Index<usize> for Point3<T> {
    type Output = T;

    fn index(&self, i: usize) -> &T {
        match i {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Point3 index {} out of bounds", i)
        }
    }
}

impl Point3f {
    pub fn distance(&self, p: &Self) -> Float {
        (*self - *p).length()
    }

    pub fn distance_squared(&self, p: &Self) -> Float {
        (*self - *p).length_squared()
    }

    pub fn min(&self, p: &Self) -> Self {
        Point3f::new(self.x.min(p.x), self.y.min(p.y), self.z.min(p.z))
    }

    pub fn max(&self, p: &Self) -> Self {
        Point3f::new(self.x.max(p.x), self.y.max(p.y), self.z.max(p.z))
    }

    pub fn has_nans(&self) -> bool {
        self.x.is_nan() || self.y.is_nan() || self.z.is_nan()
    }

    pub fn lerp(&self, t: Float, p: &Self) -> Self {
        *self * (1.0 - t) + *p * t
    }
}

impl From<Vector3f> for Point3f {
    fn from(v: Vector3f) -> Self {
        Point3f::new(v.x, v.y, v.z)
    }
}

impl From<Point3f> for Vector3f {
    fn from(p: Point3f) -> Self {
        Vector3f::new(p.x, p.y, p.z)
    }
}

impl<T: Display> Display for Point2<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "[ {}, {} ]", self.x, self.y)
    }
}

impl<T: Display> Display for Point3<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "[ {}, {}, {} ]", self.x, self.y, self.z)
    }
}
