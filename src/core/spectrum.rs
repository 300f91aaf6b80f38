use std::ops::{Add, AddAssign, Sub, Mul, MulAssign, Div, DivAssign, Neg, Index};
use std::fmt::{Display, Formatter, Result};
use crate::core::pbrt::Float;

pub type Spectrum = RGBSpectrum;

const Y_WEIGHT: [Float; 3] = [0.212671, 0.715160, 0.072169];

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct RGBSpectrum {
    c: [Float; 3]
}

impl RGBSpectrum {
    pub fn new(v: Float) -> Self {
        Self { c: [v; 3] }
    }

    pub fn from_rgb(r: Float, g: Float, b: Float) -> Self {
        Self { c: [r, g, b] }
    }

    pub fn to_rgb(&self) -> [Float; 3] {
        self.c
    }

    pub fn is_black(&self) -> bool {
        self.c.iter().all(|v| *v == 0.0)
    }

    pub fn has_nans(&self) -> bool {
        self.c.iter().any(|v| v.is_nan())
    }

    pub fn is_finite(&self) -> bool {
        self.c.iter().all(|v| v.is_finite())
    }

    /// Luminance.
    pub fn y(&self) -> Float {
        Y_WEIGHT[0] * self.c[0] + Y_WEIGHT[1] * self.c[1] + Y_WEIGHT[2] * self.c[2]
    }

    pub fn max_component_value(&self) -> Float {
        self.c[0].max(self.c[1].max(self.c[2]))
    }

    pub fn min_component_value(&self) -> Float {
        self.c[0].min(self.c[1].min(self.c[2]))
    }

    pub fn sqrt(&self) -> Self {
        self.map(Float::sqrt)
    }

    pub fn exp(&self) -> Self {
        self.map(Float::exp)
    }

    pub fn clamp(&self, low: Float, high: Float) -> Self {
        self.map(|v| v.max(low).min(high))
    }

    fn map<F: Fn(Float) -> Float>(&self, f: F) -> Self {
        Self { c: [f(self.c[0]), f(self.c[1]), f(self.c[2])] }
    }

    fn zip<F: Fn(Float, Float) -> Float>(&self, o: &Self, f: F) -> Self {
        Self { c: [f(self.c[0], o.c[0]), f(self.c[1], o.c[1]), f(self.c[2], o.c[2])] }
    }
}

impl Add for RGBSpectrum {
    type Output = Self;

    fn add(self, o: Self) -> Self {
        self.zip(&o, |a, b| a + b)
    }
}

impl AddAssign for RGBSpectrum {
    fn add_assign(&mut self, o: Self) {
        *self = *self + o;
    }
}

impl Sub for RGBSpectrum {
    type Output = Self;

    fn sub(self, o: Self) -> Self {
        self.zip(&o, |a, b| a - b)
    }
}

impl Mul for RGBSpectrum {
    type Output = Self;

    fn mul(self, o: Self) -> Self {
        self.zip(&o, |a, b| a * b)
    }
}

impl MulAssign for RGBSpectrum {
    fn mul_assign(&mut self, o: Self) {
        *self = *self * o;
    }
}

impl Mul<Float> for RGBSpectrum {
    type Output = Self;

    fn mul(self, s: Float) -> Self {
        self.map(|a| a * s)
    }
}

impl Mul<RGBSpectrum> for Float {
    type Output = RGBSpectrum;

    fn mul(self, s: RGBSpectrum) -> RGBSpectrum {
        s * self
    }
}

impl MulAssign<Float> for RGBSpectrum {
    fn mul_assign(&mut self, s: Float) {
        *self = *self * s;
    }
}

impl Div<Float> for RGBSpectrum {
    type Output = Self;

    fn div(self, s: Float) -> Self {
        debug_assert!(s != 0.0);
        self.map(|a| a / s)
    }
}

impl DivAssign<Float> for RGBSpectrum {
    fn div_assign(&mut self, s: Float) {
        *self = *self / s;
    }
}

/// Component-wise division; a zero denominator yields zero.
impl Div for RGBSpectrum {
    type Output = Self;

    fn div(self, o: Self) -> Self {
        self.zip(&o, |a, b| if b != 0.0 { a / b } else { 0.0 })
    }
}

impl Neg for RGBSpectrum {
    type Output = Self;

    fn neg(self) -> Self {
        self.map(|a| -a)
    }
}

impl Index<usize> for RGBSpectrum {
    type Output = Float;

    fn index(&self, i: usize) -> &Float {
        &self.c[i]
    }
}

impl Display for RGBSpectrum {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "RGB[ {}, {}, {} ]", self.c[0], self.c[1], self.c[2])
    }
}
