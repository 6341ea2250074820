use faer::prelude::SpSolver;
use glam::{Affine2, Mat4, Vec2, Vec4};
use warpkit_image::{ImageSize, Rectangle};

use crate::error::TransformError;

/// General purpose comparison tolerance.
pub const EPSILON: f32 = 0.001;

/// Determinants smaller than this in magnitude are treated as zero.
pub const EPSILON_SQUARED: f32 = EPSILON * EPSILON;

/// Lower bound on the homogeneous `w` before the perspective divide.
const PROJECTIVE_EPSILON: f32 = 1e-7;

/// Trigonometric results this close to 0 or 1 are snapped.
const TRIG_SNAP: f32 = 1e-6;

/// Sizes this close to an integer are rounded to it rather than up.
const SIZE_SNAP: f32 = 1e-3;

/// A 2x3 affine matrix, a linear map plus translation.
pub type AffineMatrix = Affine2;

/// A 4x4 homogeneous matrix whose third row and column are identity.
pub type ProjectiveMatrix = Mat4;

/// Operations shared by the affine and projective matrices.
///
/// Composition follows column-vector order: `a.then(b)` applies `a` first.
pub trait TransformMatrix: Copy + Send + Sync + PartialEq + std::fmt::Debug {
    /// The identity transform.
    const IDENTITY: Self;

    /// The all-zero matrix.
    const ZERO: Self;

    /// Maps a point through the matrix.
    fn transform_point(&self, p: Vec2) -> Vec2;

    /// Determinant of the matrix.
    fn determinant(&self) -> f32;

    /// Returns true if any coefficient is NaN.
    fn is_nan(&self) -> bool;

    /// Inverse of the matrix without any degeneracy check.
    fn inverse_unchecked(&self) -> Self;

    /// A pure translation.
    fn from_translation(t: Vec2) -> Self;

    /// Applies `self` followed by `next`.
    fn then(&self, next: &Self) -> Self;

    /// Returns true if the matrix contains NaN or its determinant is ~0.
    fn is_degenerate(&self) -> bool {
        self.is_nan() || self.determinant().abs() < EPSILON_SQUARED
    }

    /// Returns true for the identity matrix.
    fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Returns true for the all-zero matrix.
    fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// The inverse, or `None` if the matrix is degenerate.
    fn try_inverse(&self) -> Option<Self> {
        if self.is_degenerate() {
            return None;
        }
        let inv = self.inverse_unchecked();
        (!inv.is_nan()).then_some(inv)
    }

    /// Conjugates the matrix so that it maps pixel centres instead of pixel corners.
    fn normalize_to_pixel(&self) -> Self {
        Self::from_translation(Vec2::splat(0.5))
            .then(self)
            .then(&Self::from_translation(Vec2::splat(-0.5)))
    }
}

impl TransformMatrix for Affine2 {
    const IDENTITY: Self = Affine2::IDENTITY;
    const ZERO: Self = Affine2::ZERO;

    #[inline]
    fn transform_point(&self, p: Vec2) -> Vec2 {
        self.transform_point2(p)
    }

    fn determinant(&self) -> f32 {
        self.matrix2.determinant()
    }

    fn is_nan(&self) -> bool {
        Affine2::is_nan(self)
    }

    fn inverse_unchecked(&self) -> Self {
        self.inverse()
    }

    fn from_translation(t: Vec2) -> Self {
        Affine2::from_translation(t)
    }

    fn then(&self, next: &Self) -> Self {
        *next * *self
    }
}

impl TransformMatrix for Mat4 {
    const IDENTITY: Self = Mat4::IDENTITY;
    const ZERO: Self = Mat4::ZERO;

    #[inline]
    fn transform_point(&self, p: Vec2) -> Vec2 {
        projective_transform_2d(p.x, p.y, self)
    }

    fn determinant(&self) -> f32 {
        Mat4::determinant(self)
    }

    fn is_nan(&self) -> bool {
        Mat4::is_nan(self)
    }

    fn inverse_unchecked(&self) -> Self {
        self.inverse()
    }

    fn from_translation(t: Vec2) -> Self {
        Mat4::from_translation(t.extend(0.0))
    }

    fn then(&self, next: &Self) -> Self {
        *next * *self
    }
}

/// Returns true if the matrix contains NaN or its determinant is within
/// [`EPSILON_SQUARED`] of zero.
pub fn is_degenerate<M: TransformMatrix>(matrix: &M) -> bool {
    matrix.is_degenerate()
}

/// Applies a projective matrix to `(x, y, 0, 1)` and performs the perspective divide.
///
/// `w` is clamped to a small positive value so points behind the viewing plane
/// neither blow up nor flip sign.
#[inline]
pub fn projective_transform_2d(x: f32, y: f32, matrix: &Mat4) -> Vec2 {
    let v = *matrix * Vec4::new(x, y, 0.0, 1.0);
    Vec2::new(v.x, v.y) / v.w.max(PROJECTIVE_EPSILON)
}

/// Lifts an affine matrix into the projective representation.
pub fn affine_to_projective(matrix: &Affine2) -> Mat4 {
    let [m11, m12, m21, m22, m31, m32] = matrix.to_cols_array();
    Mat4::from_cols(
        Vec4::new(m11, m12, 0.0, 0.0),
        Vec4::new(m21, m22, 0.0, 0.0),
        Vec4::Z,
        Vec4::new(m31, m32, 0.0, 1.0),
    )
}

fn snapped_sin_cos(radians: f32) -> (f32, f32) {
    let (s, c) = radians.sin_cos();
    if s.abs() < TRIG_SNAP {
        (0.0, c.signum())
    } else if c.abs() < TRIG_SNAP {
        (s.signum(), 0.0)
    } else {
        (s, c)
    }
}

/// Rotation by `radians` about `center`.
///
/// Right angles produce exact coefficients.
pub fn create_rotation_about(radians: f32, center: Vec2) -> AffineMatrix {
    let (s, c) = snapped_sin_cos(radians);
    let t = Vec2::new(
        center.x * (1.0 - c) + center.y * s,
        center.y * (1.0 - c) - center.x * s,
    );
    Affine2::from_cols(Vec2::new(c, s), Vec2::new(-s, c), t)
}

/// Skew by the given angles about `center`.
pub fn create_skew_about(radians_x: f32, radians_y: f32, center: Vec2) -> AffineMatrix {
    let (tan_x, tan_y) = (radians_x.tan(), radians_y.tan());
    Affine2::from_cols(
        Vec2::new(1.0, tan_y),
        Vec2::new(tan_x, 1.0),
        Vec2::new(-center.y * tan_x, -center.x * tan_y),
    )
}

/// Rotation by `degrees`, centred so the content stays on a canvas of the
/// transformed size.
pub fn create_rotation(degrees: f32, size: ImageSize) -> AffineMatrix {
    create_rotation_radians(degrees.to_radians(), size)
}

/// Radian variant of [`create_rotation`].
pub fn create_rotation_radians(radians: f32, size: ImageSize) -> AffineMatrix {
    create_centered_transform(&create_rotation_about(radians, Vec2::ZERO), size)
}

/// Skew by the given angles, centred like [`create_rotation`].
pub fn create_skew(degrees_x: f32, degrees_y: f32, size: ImageSize) -> AffineMatrix {
    create_skew_radians(degrees_x.to_radians(), degrees_y.to_radians(), size)
}

/// Radian variant of [`create_skew`].
pub fn create_skew_radians(radians_x: f32, radians_y: f32, size: ImageSize) -> AffineMatrix {
    create_centered_transform(&create_skew_about(radians_x, radians_y, Vec2::ZERO), size)
}

/// Re-centres `matrix` so the centre of a `size` source lands on the centre
/// of the transformed bounds.
///
/// The centred matrix is built in the destination to source direction, as
/// `translate(-dst_center) . inverse(matrix) . translate(src_center)`, and
/// inverted back. A degenerate input is returned unchanged so the caller's
/// degeneracy check reports it.
pub fn create_centered_transform(matrix: &AffineMatrix, size: ImageSize) -> AffineMatrix {
    let Some(inverse) = matrix.try_inverse() else {
        return *matrix;
    };
    let transformed = raw_transformed_size(matrix, size);
    let to_target = Affine2::from_translation(-transformed * 0.5);
    let to_source =
        Affine2::from_translation(Vec2::new(size.width as f32, size.height as f32) * 0.5);

    to_target.then(&inverse).then(&to_source).inverse()
}

/// The side of the rectangle that tapers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaperSide {
    /// Taper the left side.
    Left,
    /// Taper the top side.
    Top,
    /// Taper the right side.
    Right,
    /// Taper the bottom side.
    Bottom,
}

/// Which corners of the tapered side move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaperCorner {
    /// The left or top corner.
    LeftOrTop,
    /// The right or bottom corner.
    RightOrBottom,
    /// Both corners, symmetrically.
    Both,
}

/// A projective taper of one side of a `size` rectangle by `fraction`.
pub fn create_taper(
    size: ImageSize,
    side: TaperSide,
    corner: TaperCorner,
    fraction: f32,
) -> ProjectiveMatrix {
    let (w, h) = (size.width as f32, size.height as f32);

    // rows of the row-vector form; each row becomes a glam column
    let mut m = Mat4::IDENTITY.to_cols_array_2d();

    match side {
        TaperSide::Left => {
            m[0][0] = fraction;
            m[1][1] = fraction;
            m[0][3] = (fraction - 1.0) / w;
            match corner {
                TaperCorner::RightOrBottom => {}
                TaperCorner::LeftOrTop => {
                    m[0][1] = h * m[0][3];
                    m[3][1] = h * (1.0 - fraction);
                }
                TaperCorner::Both => {
                    m[0][1] = h * 0.5 * m[0][3];
                    m[3][1] = h * (1.0 - fraction) / 2.0;
                }
            }
        }
        TaperSide::Top => {
            m[0][0] = fraction;
            m[1][1] = fraction;
            m[1][3] = (fraction - 1.0) / h;
            match corner {
                TaperCorner::RightOrBottom => {}
                TaperCorner::LeftOrTop => {
                    m[1][0] = w * m[1][3];
                    m[3][0] = w * (1.0 - fraction);
                }
                TaperCorner::Both => {
                    m[1][0] = w * 0.5 * m[1][3];
                    m[3][0] = w * (1.0 - fraction) * 0.5;
                }
            }
        }
        TaperSide::Right => {
            m[0][0] = 1.0 / fraction;
            m[0][3] = (1.0 - fraction) / (w * fraction);
            match corner {
                TaperCorner::RightOrBottom => {}
                TaperCorner::LeftOrTop => m[0][1] = h * m[0][3],
                TaperCorner::Both => m[0][1] = h * 0.5 * m[0][3],
            }
        }
        TaperSide::Bottom => {
            m[1][1] = 1.0 / fraction;
            m[1][3] = (1.0 - fraction) / (h * fraction);
            match corner {
                TaperCorner::RightOrBottom => {}
                TaperCorner::LeftOrTop => m[1][0] = w * m[1][3],
                TaperCorner::Both => m[1][0] = w * 0.5 * m[1][3],
            }
        }
    }

    Mat4::from_cols_array_2d(&m)
}

/// Destination corners of a quad distortion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    /// Where the top-left corner goes.
    pub top_left: Vec2,
    /// Where the top-right corner goes.
    pub top_right: Vec2,
    /// Where the bottom-right corner goes.
    pub bottom_right: Vec2,
    /// Where the bottom-left corner goes.
    pub bottom_left: Vec2,
}

/// The projective matrix mapping the corners of `rect` onto `quad`.
///
/// Solves the 8x8 homography system by LU decomposition in `f64`.
///
/// # Errors
///
/// Returns [`TransformError::InvalidGeometry`] if `rect` is empty and
/// [`TransformError::DegenerateTransform`] if the system is singular,
/// e.g. when three destination corners are collinear with the fourth.
pub fn create_quad_distortion(
    rect: Rectangle,
    quad: Quad,
) -> Result<ProjectiveMatrix, TransformError> {
    if rect.is_empty() {
        return Err(TransformError::InvalidGeometry(format!(
            "quad source rectangle must be non-empty, got {rect:?}"
        )));
    }

    let p = [
        (rect.left(), rect.top()),
        (rect.right(), rect.top()),
        (rect.right(), rect.bottom()),
        (rect.left(), rect.bottom()),
    ]
    .map(|(x, y)| (x as f64, y as f64));
    let q = [quad.top_left, quad.top_right, quad.bottom_right, quad.bottom_left]
        .map(|v| (v.x as f64, v.y as f64));

    let mut a = faer::Mat::<f64>::zeros(8, 8);
    let mut b = faer::Mat::<f64>::zeros(8, 1);
    for (i, (&(px, py), &(qx, qy))) in p.iter().zip(q.iter()).enumerate() {
        let (rx, ry) = (2 * i, 2 * i + 1);
        a.write(rx, 0, px);
        a.write(rx, 1, py);
        a.write(rx, 2, 1.0);
        a.write(rx, 6, -px * qx);
        a.write(rx, 7, -py * qx);
        b.write(rx, 0, qx);

        a.write(ry, 3, px);
        a.write(ry, 4, py);
        a.write(ry, 5, 1.0);
        a.write(ry, 6, -px * qy);
        a.write(ry, 7, -py * qy);
        b.write(ry, 0, qy);
    }

    // a singular system leaves infinities or NaNs behind
    let x = a.partial_piv_lu().solve(b);
    let h = x.col(0);
    if (0..8).any(|i| !h[i].is_finite()) {
        return Err(TransformError::DegenerateTransform);
    }
    let h: [f32; 8] = std::array::from_fn(|i| h[i] as f32);

    let m = Mat4::from_cols(
        Vec4::new(h[0], h[3], 0.0, h[6]),
        Vec4::new(h[1], h[4], 0.0, h[7]),
        Vec4::Z,
        Vec4::new(h[2], h[5], 0.0, 1.0),
    );

    if m.is_degenerate() {
        return Err(TransformError::DegenerateTransform);
    }
    Ok(m)
}

/// Float bounds `(min, max)` of the four transformed corners of `rect`.
fn transformed_bounds<M: TransformMatrix>(rect: Rectangle, matrix: &M) -> (Vec2, Vec2) {
    let (l, t, r, b) = (
        rect.left() as f32,
        rect.top() as f32,
        rect.right() as f32,
        rect.bottom() as f32,
    );
    [
        Vec2::new(l, t),
        Vec2::new(r, t),
        Vec2::new(l, b),
        Vec2::new(r, b),
    ]
    .into_iter()
    .map(|p| matrix.transform_point(p))
    .fold(
        (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
        |(min, max), p| (min.min(p), max.max(p)),
    )
}

fn raw_transformed_size<M: TransformMatrix>(matrix: &M, size: ImageSize) -> Vec2 {
    let source = Vec2::new(size.width as f32, size.height as f32);
    if matrix.is_identity() || matrix.is_zero() {
        return source;
    }
    let (min, max) = transformed_bounds(Rectangle::from(size), matrix);
    max - min
}

fn snap_floor(v: f32) -> f32 {
    let r = v.round();
    if (v - r).abs() < SIZE_SNAP {
        r
    } else {
        v.floor()
    }
}

fn snap_ceil(v: f32) -> f32 {
    let r = v.round();
    if (v - r).abs() < SIZE_SNAP {
        r
    } else {
        v.ceil()
    }
}

/// The integer rectangle containing the transformed corners of `rect`.
///
/// Rounds outward, floor for the minimum and ceil for the maximum, ignoring
/// float noise within a thousandth of a pixel.
pub fn transformed_bounding_rectangle<M: TransformMatrix>(
    rect: Rectangle,
    matrix: &M,
) -> Rectangle {
    if matrix.is_identity() {
        return rect;
    }
    let (min, max) = transformed_bounds(rect, matrix);
    Rectangle::from_ltrb(
        snap_floor(min.x) as i32,
        snap_floor(min.y) as i32,
        snap_ceil(max.x) as i32,
        snap_ceil(max.y) as i32,
    )
}

/// The canvas size needed to hold a `size` source transformed by `matrix`.
///
/// With `preserve_canvas` the size also covers the translation of the content,
/// so nothing is pushed off either edge. Identity and zero matrices return
/// `size` unchanged. The result is at least 1x1.
///
/// # Panics
///
/// Panics if either dimension of `size` is zero.
pub fn transformed_canvas_size<M: TransformMatrix>(
    matrix: &M,
    size: ImageSize,
    preserve_canvas: bool,
) -> ImageSize {
    assert!(
        !size.is_empty(),
        "source size dimensions cannot be 0, got {size}"
    );

    if matrix.is_identity() || matrix.is_zero() {
        return size;
    }

    let (min, max) = transformed_bounds(Rectangle::from(size), matrix);
    let extent = max - min;

    let canvas = if preserve_canvas {
        let width = if min.x < 0.0 { max.x } else { extent.x.max(max.x) };
        let height = if min.y < 0.0 { max.y } else { extent.y.max(max.y) };
        Vec2::new(
            if width <= 0.0 { extent.x } else { width },
            if height <= 0.0 { extent.y } else { height },
        )
    } else {
        extent
    };

    let to_dim = |v: f32| {
        if v.is_finite() {
            (snap_ceil(v) as usize).max(1)
        } else {
            1
        }
    };

    ImageSize {
        width: to_dim(canvas.x),
        height: to_dim(canvas.y),
    }
}

/// An axis remapping that can be approximated by a quad distortion.
pub trait Swizzler {
    /// Size of the remapped image.
    fn destination_size(&self) -> ImageSize;

    /// Where the source point `p` lands.
    fn transform(&self, p: Vec2) -> Vec2;
}

/// The projective matrix mapping the corners of `rect` the way `swizzler` does.
pub fn swizzler_matrix<S: Swizzler>(
    swizzler: &S,
    rect: Rectangle,
) -> Result<ProjectiveMatrix, TransformError> {
    let (l, t, r, b) = (
        rect.left() as f32,
        rect.top() as f32,
        rect.right() as f32,
        rect.bottom() as f32,
    );
    create_quad_distortion(
        rect,
        Quad {
            top_left: swizzler.transform(Vec2::new(l, t)),
            top_right: swizzler.transform(Vec2::new(r, t)),
            bottom_right: swizzler.transform(Vec2::new(r, b)),
            bottom_left: swizzler.transform(Vec2::new(l, b)),
        },
    )
}
