use std::f32::consts::PI;

const EPSILON: f32 = 0.001;

/// A reconstruction filter with finite support.
///
/// `weight` must return zero for `|x| > radius()` even when called outside the
/// support.
pub trait Kernel: Copy + Send + Sync {
    /// The support radius of the filter.
    fn radius(&self) -> f32;

    /// The filter weight at signed distance `x`.
    fn weight(&self, x: f32) -> f32;
}

/// Normalised sinc, `sin(pi x) / (pi x)`.
///
/// Returns 1 around the origin and flushes tiny results to 0.
#[inline]
pub fn sinc(x: f32) -> f32 {
    if x.abs() > EPSILON {
        let x = x * PI;
        let r = x.sin() / x;
        if r.abs() < EPSILON {
            0.0
        } else {
            r
        }
    } else {
        1.0
    }
}

/// Nearest neighbour; the weight is a pass-through within the support.
///
/// Only the fast path consumes this filter and it never convolves with it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NearestNeighborKernel;

impl Kernel for NearestNeighborKernel {
    fn radius(&self) -> f32 {
        1.0
    }

    #[inline]
    fn weight(&self, x: f32) -> f32 {
        if x.abs() <= 1.0 {
            x
        } else {
            0.0
        }
    }
}

/// Box filter, 1 on `(-0.5, 0.5]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoxKernel;

impl Kernel for BoxKernel {
    fn radius(&self) -> f32 {
        0.5
    }

    #[inline]
    fn weight(&self, x: f32) -> f32 {
        if x > -0.5 && x <= 0.5 {
            1.0
        } else {
            0.0
        }
    }
}

/// Triangle (bilinear) filter.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TriangleKernel;

impl Kernel for TriangleKernel {
    fn radius(&self) -> f32 {
        1.0
    }

    #[inline]
    fn weight(&self, x: f32) -> f32 {
        let x = x.abs();
        if x < 1.0 {
            1.0 - x
        } else {
            0.0
        }
    }
}

/// Keys bicubic filter with `a = -0.5`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BicubicKernel;

impl Kernel for BicubicKernel {
    fn radius(&self) -> f32 {
        2.0
    }

    #[inline]
    fn weight(&self, x: f32) -> f32 {
        const A: f32 = -0.5;
        let x = x.abs();
        if x <= 1.0 {
            (1.5 * x - 2.5) * x * x + 1.0
        } else if x < 2.0 {
            ((A * x + 2.5) * x - 4.0) * x + 2.0
        } else {
            0.0
        }
    }
}

/// Mitchell–Netravali style cubic parameterised by `(b, c)`.
///
/// See <https://www.cs.utexas.edu/~fussell/courses/cs384g-fall2013/lectures/mitchell/Mitchell.pdf>
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicKernel {
    /// The B parameter.
    pub b: f32,
    /// The C parameter.
    pub c: f32,
}

impl CubicKernel {
    /// Catmull-Rom spline.
    pub const CATMULL_ROM: Self = Self { b: 0.0, c: 0.5 };
    /// Hermite spline.
    pub const HERMITE: Self = Self { b: 0.0, c: 0.0 };
    /// Mitchell-Netravali, `B = C = 1/3`.
    pub const MITCHELL_NETRAVALI: Self = Self {
        b: 1.0 / 3.0,
        c: 1.0 / 3.0,
    };
    /// Robidoux cylindrical cubic.
    pub const ROBIDOUX: Self = Self {
        b: 0.378_215_75,
        c: 0.310_892_12,
    };
    /// Sharper variant of Robidoux.
    pub const ROBIDOUX_SHARP: Self = Self {
        b: 0.262_014_5,
        c: 0.368_992_75,
    };
    /// Cubic B-spline.
    pub const SPLINE: Self = Self { b: 1.0, c: 0.0 };
}

impl Kernel for CubicKernel {
    fn radius(&self) -> f32 {
        2.0
    }

    #[inline]
    fn weight(&self, x: f32) -> f32 {
        let (b, c) = (self.b, self.c);
        let x = x.abs();
        let x2 = x * x;
        let w = if x < 1.0 {
            (12.0 - 9.0 * b - 6.0 * c) * (x * x2)
                + (-18.0 + 12.0 * b + 6.0 * c) * x2
                + (6.0 - 2.0 * b)
        } else if x < 2.0 {
            (-b - 6.0 * c) * (x * x2)
                + (6.0 * b + 30.0 * c) * x2
                + (-12.0 * b - 48.0 * c) * x
                + (8.0 * b + 24.0 * c)
        } else {
            0.0
        };
        w / 6.0
    }
}

/// Lanczos windowed sinc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LanczosKernel {
    /// Number of lobes.
    pub radius: f32,
}

impl Kernel for LanczosKernel {
    fn radius(&self) -> f32 {
        self.radius
    }

    #[inline]
    fn weight(&self, x: f32) -> f32 {
        if x.abs() < self.radius {
            sinc(x) * sinc(x / self.radius)
        } else {
            0.0
        }
    }
}

/// Welch windowed sinc with radius 3.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WelchKernel;

impl Kernel for WelchKernel {
    fn radius(&self) -> f32 {
        3.0
    }

    #[inline]
    fn weight(&self, x: f32) -> f32 {
        if x.abs() < 3.0 {
            sinc(x) * (1.0 - x * x / 9.0)
        } else {
            0.0
        }
    }
}

/// The available resampling filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Resampler {
    /// Nearest neighbour, sampled through the fast path.
    NearestNeighbor,
    /// Box filter.
    Box,
    /// Triangle (bilinear) filter.
    Triangle,
    /// Keys bicubic.
    #[default]
    Bicubic,
    /// Catmull-Rom cubic.
    CatmullRom,
    /// Hermite cubic.
    Hermite,
    /// Mitchell-Netravali cubic.
    MitchellNetravali,
    /// Robidoux cubic.
    Robidoux,
    /// Robidoux sharp cubic.
    RobidouxSharp,
    /// Cubic B-spline.
    Spline,
    /// Lanczos, 2 lobes.
    Lanczos2,
    /// Lanczos, 3 lobes.
    Lanczos3,
    /// Lanczos, 5 lobes.
    Lanczos5,
    /// Lanczos, 8 lobes.
    Lanczos8,
    /// Welch windowed sinc.
    Welch,
}

/// Binds the concrete [`Kernel`] of a [`Resampler`] to `$k` and evaluates
/// `$body`, so the body is monomorphised per filter.
macro_rules! dispatch_kernel {
    ($resampler:expr, |$k:ident| $body:expr) => {{
        use $crate::interpolation::{
            BicubicKernel, BoxKernel, CubicKernel, LanczosKernel, NearestNeighborKernel,
            Resampler, TriangleKernel, WelchKernel,
        };
        match $resampler {
            Resampler::NearestNeighbor => {
                let $k = NearestNeighborKernel;
                $body
            }
            Resampler::Box => {
                let $k = BoxKernel;
                $body
            }
            Resampler::Triangle => {
                let $k = TriangleKernel;
                $body
            }
            Resampler::Bicubic => {
                let $k = BicubicKernel;
                $body
            }
            Resampler::CatmullRom => {
                let $k = CubicKernel::CATMULL_ROM;
                $body
            }
            Resampler::Hermite => {
                let $k = CubicKernel::HERMITE;
                $body
            }
            Resampler::MitchellNetravali => {
                let $k = CubicKernel::MITCHELL_NETRAVALI;
                $body
            }
            Resampler::Robidoux => {
                let $k = CubicKernel::ROBIDOUX;
                $body
            }
            Resampler::RobidouxSharp => {
                let $k = CubicKernel::ROBIDOUX_SHARP;
                $body
            }
            Resampler::Spline => {
                let $k = CubicKernel::SPLINE;
                $body
            }
            Resampler::Lanczos2 => {
                let $k = LanczosKernel { radius: 2.0 };
                $body
            }
            Resampler::Lanczos3 => {
                let $k = LanczosKernel { radius: 3.0 };
                $body
            }
            Resampler::Lanczos5 => {
                let $k = LanczosKernel { radius: 5.0 };
                $body
            }
            Resampler::Lanczos8 => {
                let $k = LanczosKernel { radius: 8.0 };
                $body
            }
            Resampler::Welch => {
                let $k = WelchKernel;
                $body
            }
        }
    }};
}

pub(crate) use dispatch_kernel;

impl Resampler {
    /// Every filter, in declaration order.
    pub const ALL: [Resampler; 15] = [
        Resampler::NearestNeighbor,
        Resampler::Box,
        Resampler::Triangle,
        Resampler::Bicubic,
        Resampler::CatmullRom,
        Resampler::Hermite,
        Resampler::MitchellNetravali,
        Resampler::Robidoux,
        Resampler::RobidouxSharp,
        Resampler::Spline,
        Resampler::Lanczos2,
        Resampler::Lanczos3,
        Resampler::Lanczos5,
        Resampler::Lanczos8,
        Resampler::Welch,
    ];

    /// The support radius of the filter.
    pub fn radius(&self) -> f32 {
        dispatch_kernel!(*self, |k| k.radius())
    }

    /// The filter weight at signed distance `x`.
    pub fn weight(&self, x: f32) -> f32 {
        dispatch_kernel!(*self, |k| k.weight(x))
    }

    /// Returns true for the filter sampled through the nearest neighbour fast path.
    pub fn is_nearest_neighbor(&self) -> bool {
        matches!(self, Resampler::NearestNeighbor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn radii() {
        assert_eq!(Resampler::NearestNeighbor.radius(), 1.0);
        assert_eq!(Resampler::Box.radius(), 0.5);
        assert_eq!(Resampler::Triangle.radius(), 1.0);
        assert_eq!(Resampler::CatmullRom.radius(), 2.0);
        assert_eq!(Resampler::Robidoux.radius(), 2.0);
        assert_eq!(Resampler::Lanczos3.radius(), 3.0);
        assert_eq!(Resampler::Lanczos8.radius(), 8.0);
        assert_eq!(Resampler::Welch.radius(), 3.0);
    }

    #[test]
    fn zero_outside_support() {
        for resampler in Resampler::ALL {
            let r = resampler.radius();
            for x in [r + 0.01, r + 1.0, -(r + 0.5), 100.0] {
                assert_eq!(resampler.weight(x), 0.0, "{resampler:?} at {x}");
            }
        }
    }

    #[test]
    fn interpolating_filters_are_one_at_origin() {
        for resampler in [
            Resampler::Box,
            Resampler::Triangle,
            Resampler::Bicubic,
            Resampler::CatmullRom,
            Resampler::Hermite,
            Resampler::Lanczos3,
            Resampler::Welch,
        ] {
            assert_relative_eq!(resampler.weight(0.0), 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn cubic_family_partition_of_unity() {
        // cubic filters sum to 1 over the integer lattice for any phase
        for resampler in [
            Resampler::Bicubic,
            Resampler::CatmullRom,
            Resampler::MitchellNetravali,
            Resampler::Robidoux,
            Resampler::Spline,
            Resampler::Triangle,
        ] {
            for phase in [0.0f32, 0.25, 0.5, 0.8] {
                let sum = (-3..=3)
                    .map(|i| resampler.weight(i as f32 - phase))
                    .sum::<f32>();
                assert_relative_eq!(sum, 1.0, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn bicubic_values() {
        let k = BicubicKernel;
        assert_relative_eq!(k.weight(0.5), 0.5625);
        assert_relative_eq!(k.weight(1.5), -0.0625);
        assert_relative_eq!(k.weight(1.0), 0.0);
    }

    #[test]
    fn mitchell_values() {
        let k = CubicKernel::MITCHELL_NETRAVALI;
        assert_relative_eq!(k.weight(0.0), 8.0 / 9.0, epsilon = 1e-6);
        assert_relative_eq!(k.weight(1.0), 1.0 / 18.0, epsilon = 1e-6);
    }

    #[test]
    fn sinc_values() {
        assert_eq!(sinc(0.0), 1.0);
        assert_eq!(sinc(1.0), 0.0);
        assert_relative_eq!(sinc(0.5), 2.0 / PI, epsilon = 1e-6);
        assert_eq!(sinc(-2.0), sinc(2.0));
    }

    #[test]
    fn box_is_half_open() {
        assert_eq!(BoxKernel.weight(0.5), 1.0);
        assert_eq!(BoxKernel.weight(-0.5), 0.0);
    }
}
