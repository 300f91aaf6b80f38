use crate::core::geometry::point::Point2f;
use crate::core::geometry::vector::Vector3f;
use crate::core::pbrt::{Float, PI, PI_OVER2, PI_OVER4, INV_PI, INV4_PI};
use crate::core::rng::ONE_MINUS_EPSILON;

/// Piecewise-constant 1D distribution over [0, 1).
#[derive(Debug, Clone)]
pub struct Distribution1D {
    pub func        : Vec<Float>,
    pub cdf         : Vec<Float>,
    pub func_int    : Float
}

impl Distribution1D {
    pub fn new(func: Vec<Float>) -> Self {
        let n = func.len();
        let mut cdf = vec![0.0; n + 1];

        for i in 1..=n {
            cdf[i] = cdf[i - 1] + func[i - 1].abs() / n as Float;
        }

        let func_int = cdf[n];
        if func_int == 0.0 {
            for (i, c) in cdf.iter_mut().enumerate().skip(1) {
                *c = i as Float / n as Float;
            }
        } else {
            for c in cdf.iter_mut().skip(1) {
                *c /= func_int;
            }
        }

        Self { func, cdf, func_int }
    }

    pub fn count(&self) -> usize {
        self.func.len()
    }

    /// Index of the last CDF entry that is <= u.
    fn find_segment(&self, u: Float) -> usize {
        let idx = self.cdf.partition_point(|c| *c <= u);

        idx.saturating_sub(1).min(self.count().saturating_sub(1))
    }

    /// Returns (x in [0,1), pdf, segment index).
    pub fn sample_continuous(&self, u: Float) -> (Float, Float, usize) {
        let offset = self.find_segment(u);
        let mut du = u - self.cdf[offset];
        let width = self.cdf[offset + 1] - self.cdf[offset];
        if width > 0.0 {
            du /= width;
        }

        let pdf = if self.func_int > 0.0 { self.func[offset] / self.func_int } else { 0.0 };

        ((offset as Float + du) / self.count() as Float, pdf, offset)
    }

    /// Returns (index, probability of that index).
    pub fn sample_discrete(&self, u: Float) -> (usize, Float) {
        let offset = self.find_segment(u);

        (offset, self.discrete_pdf(offset))
    }

    pub fn discrete_pdf(&self, index: usize) -> Float {
        if self.func_int == 0.0 {
            return 1.0 / self.count() as Float;
        }

        self.func[index] / (self.func_int * self.count() as Float)
    }
}

pub fn concentric_sample_disk(u: &Point2f) -> Point2f {
    let ox = 2.0 * u.x - 1.0;
    let oy = 2.0 * u.y - 1.0;

    if ox == 0.0 && oy == 0.0 {
        return Point2f::default();
    }

    let (r, theta) = if ox.abs() > oy.abs() {
        (ox, PI_OVER4 * (oy / ox))
    } else {
        (oy, PI_OVER2 - PI_OVER4 * (ox / oy))
    };

    Point2f::new(r * theta.cos(), r * theta.sin())
}

pub fn cosine_sample_hemisphere(u: &Point2f) -> Vector3f {
    let d = concentric_sample_disk(u);
    let z = (1.0 - d.x * d.x - d.y * d.y).max(0.0).sqrt();

    Vector3f::new(d.x, d.y, z)
}

#[inline]
pub fn cosine_hemisphere_pdf(cos_theta: Float) -> Float {
    cos_theta * INV_PI
}

pub fn uniform_sample_sphere(u: &Point2f) -> Vector3f {
    let z = 1.0 - 2.0 * u.x;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * u.y;

    Vector3f::new(r * phi.cos(), r * phi.sin(), z)
}

#[inline]
pub fn uniform_sphere_pdf() -> Float {
    INV4_PI
}

/// Direction inside the cone around +z with the given cosine of its half-angle.
pub fn uniform_sample_cone(u: &Point2f, cos_theta_max: Float) -> Vector3f {
    let cos_theta = (1.0 - u.x) + u.x * cos_theta_max;
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = u.y * 2.0 * PI;

    Vector3f::new(phi.cos() * sin_theta, phi.sin() * sin_theta, cos_theta)
}

#[inline]
pub fn uniform_cone_pdf(cos_theta_max: Float) -> Float {
    1.0 / (2.0 * PI * (1.0 - cos_theta_max))
}

/// Barycentrics (b0, b1) uniformly distributed over a triangle.
pub fn uniform_sample_triangle(u: &Point2f) -> Point2f {
    let su0 = u.x.sqrt();

    Point2f::new(1.0 - su0, u.y * su0)
}

#[inline]
pub fn balance_heuristic(nf: usize, fpdf: Float, ng: usize, gpdf: Float) -> Float {
    let f = nf as Float * fpdf;

    f / (f + ng as Float * gpdf)
}

#[inline]
pub fn power_heuristic(nf: usize, fpdf: Float, ng: usize, gpdf: Float) -> Float {
    let f = nf as Float * fpdf;
    let g = ng as Float * gpdf;

    (f * f) / (f * f + g * g)
}

/// Remaps the leftover fraction of a sample that already selected one of
/// `n` discrete choices back into [0, 1).
#[inline]
pub fn remap_discrete_sample(u: Float, n: usize, chosen: usize) -> Float {
    (u * n as Float - chosen as Float).min(ONE_MINUS_EPSILON)
}
