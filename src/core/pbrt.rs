use std::ops::{Add, Mul, Sub};
use std::sync::{Arc, Weak};
use num::One;
use lazy_static::lazy_static;
use indicatif::ProgressBar;
use parking_lot::RwLock;

lazy_static! {
    static ref PB: RwLock<Option<Weak<ProgressBar>>> = RwLock::new(None);
}

/// Registers the progress bar that log output should be printed above.
pub fn set_progress_bar(pb: Option<Weak<ProgressBar>>) {
    *PB.write() = pb;
}

pub fn get_progress_bar() -> Option<Arc<ProgressBar>> {
    PB.read().as_ref()?.upgrade()
}

pub type Float = f32;

pub const PI                : Float = std::f32::consts::PI;
pub const PI_OVER2          : Float = std::f32::consts::FRAC_PI_2;
pub const PI_OVER4          : Float = std::f32::consts::FRAC_PI_4;
pub const INV_PI            : Float = std::f32::consts::FRAC_1_PI;
pub const INV2_PI           : Float = 0.15915494309189533577;
pub const INV4_PI           : Float = 0.07957747154594766788;
pub const INFINITY          : Float = std::f32::INFINITY;
pub const SHADOW_EPSILON    : Float = 0.0001;
pub const MACHINE_EPSILON   : Float = std::f32::EPSILON * 0.5;

#[inline]
pub fn gamma(n: i32) -> Float {
    (n as Float * MACHINE_EPSILON) / (1.0 - n as Float * MACHINE_EPSILON)
}

pub fn next_float_up(v: Float) -> Float {
    if v.is_infinite() && v > 0.0 { return v; }

    let v = if v == -0.0 { 0.0 } else { v };
    let bits = v.to_bits();
    let bits = if v >= 0.0 { bits + 1 } else { bits - 1 };

    Float::from_bits(bits)
}

pub fn next_float_down(v: Float) -> Float {
    if v.is_infinite() && v < 0.0 { return v; }

    let v = if v == 0.0 { -0.0 } else { v };
    let bits = v.to_bits();
    let bits = if v > 0.0 { bits - 1 } else { bits + 1 };

    Float::from_bits(bits)
}

pub fn lerp<T, S>(t: S, x: T, y: T) -> T
where
    S: Copy + One + Sub<S, Output = S>,
    T: Add<T, Output = T> + Mul<S, Output = T>
{
    x * (S::one() - t) + y * t
}

pub fn clamp<T: PartialOrd>(val: T, low: T, high: T) -> T {
    if val < low {
        low
    } else if val > high {
        high
    } else {
        val
    }
}

/// Solves at^2 + bt + c = 0, returning the roots in ascending order.
pub fn quadratic(a: Float, b: Float, c: Float) -> Option<(Float, Float)> {
    let (a, b, c) = (a as f64, b as f64, c as f64);
    let discrim = b * b - 4.0 * a * c;
    if discrim < 0.0 { return None; }

    let root = discrim.sqrt();
    let q = if b < 0.0 { -0.5 * (b - root) } else { -0.5 * (b + root) };
    let t0 = (q / a) as Float;
    let t1 = (c / q) as Float;

    if t0 > t1 { Some((t1, t0)) } else { Some((t0, t1)) }
}

#[inline]
pub fn radians(deg: Float) -> Float {
    (PI / 180.0) * deg
}

pub fn gamma_correct(value: Float) -> Float {
    if value <= 0.0031308 {
        12.92 * value
    } else {
        1.055 * value.powf(1.0 / 2.4) - 0.055
    }
}

/// Bit mixer used to derive decorrelated seeds from small integers.
#[inline]
pub fn mix_bits(mut v: u64) -> u64 {
    v ^= v >> 31;
    v = v.wrapping_mul(0x7fb5_d329_728e_a185);
    v ^= v >> 27;
    v = v.wrapping_mul(0x81da_def4_bc2d_d44d);
    v ^= v >> 33;

    v
}
