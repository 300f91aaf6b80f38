use std::fmt::{Display, Formatter, Result};
use crate::core::pbrt::{Float, INFINITY};
use crate::core::medium::MediumId;
use super::point::Point3f;
use super::vector::Vector3f;

#[derive(Debug, Copy, Clone)]
pub struct Ray {
    pub o       : Point3f,
    pub d       : Vector3f,
    pub t_max   : Float,
    pub time    : Float,
    pub medium  : Option<MediumId>
}

impl Ray {
    pub fn new(o: Point3f, d: Vector3f, t_max: Float, time: Float, medium: Option<MediumId>) -> Self {
        Self { o, d, t_max, time, medium }
    }

    pub fn find_point(&self, t: Float) -> Point3f {
        self.o + self.d * t
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self {
            o: Point3f::default(),
            d: Vector3f::default(),
            t_max: INFINITY,
            time: 0.0,
            medium: None
        }
    }
}

impl Display for Ray {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "[ o={}, d={}, tMax={}, time={} ]", self.o, self.d, self.t_max, self.time)
    }
}
