use glam::{Affine2, Mat4, Vec2};
use warpkit_image::{ImageSize, Rectangle};

use super::geometry::{
    affine_to_projective, create_quad_distortion, create_rotation_about, create_rotation_radians,
    create_skew_about, create_skew_radians, create_taper, AffineMatrix, ProjectiveMatrix, Quad,
    TaperCorner, TaperSide, TransformMatrix,
};
use crate::error::TransformError;

/// One step of an affine transform, resolved against the source size at build time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AffineStep {
    /// Rotation in radians, about the given point or centred on the source.
    Rotation {
        /// Angle in radians.
        radians: f32,
        /// Rotation centre, `None` to centre on the source.
        center: Option<Vec2>,
    },
    /// Skew in radians, about the given point or centred on the source.
    Skew {
        /// Angle along x in radians.
        radians_x: f32,
        /// Angle along y in radians.
        radians_y: f32,
        /// Skew centre, `None` to centre on the source.
        center: Option<Vec2>,
    },
    /// Scale about the origin.
    Scale(Vec2),
    /// Translation.
    Translation(Vec2),
    /// An arbitrary matrix.
    Matrix(AffineMatrix),
}

impl AffineStep {
    /// A rotation in degrees centred on the source.
    pub fn rotation_degrees(degrees: f32) -> Self {
        Self::Rotation {
            radians: degrees.to_radians(),
            center: None,
        }
    }

    /// A rotation in degrees about `center`.
    pub fn rotation_degrees_about(degrees: f32, center: Vec2) -> Self {
        Self::Rotation {
            radians: degrees.to_radians(),
            center: Some(center),
        }
    }

    /// A skew in degrees centred on the source.
    pub fn skew_degrees(degrees_x: f32, degrees_y: f32) -> Self {
        Self::Skew {
            radians_x: degrees_x.to_radians(),
            radians_y: degrees_y.to_radians(),
            center: None,
        }
    }

    /// A skew in degrees about `center`.
    pub fn skew_degrees_about(degrees_x: f32, degrees_y: f32, center: Vec2) -> Self {
        Self::Skew {
            radians_x: degrees_x.to_radians(),
            radians_y: degrees_y.to_radians(),
            center: Some(center),
        }
    }

    fn matrix(&self, size: ImageSize) -> AffineMatrix {
        match *self {
            Self::Rotation {
                radians,
                center: None,
            } => create_rotation_radians(radians, size),
            Self::Rotation {
                radians,
                center: Some(center),
            } => create_rotation_about(radians, center),
            Self::Skew {
                radians_x,
                radians_y,
                center: None,
            } => create_skew_radians(radians_x, radians_y, size),
            Self::Skew {
                radians_x,
                radians_y,
                center: Some(center),
            } => create_skew_about(radians_x, radians_y, center),
            Self::Scale(scale) => Affine2::from_scale(scale),
            Self::Translation(t) => Affine2::from_translation(t),
            Self::Matrix(m) => m,
        }
    }
}

/// One step of a projective transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectiveStep {
    /// An affine step lifted into the projective representation.
    Affine(AffineStep),
    /// A taper of one side of the source.
    Taper {
        /// Side to taper.
        side: TaperSide,
        /// Corners that move.
        corner: TaperCorner,
        /// Remaining fraction of the tapered side.
        fraction: f32,
    },
    /// Maps the source corners onto a quad.
    QuadDistortion(Quad),
    /// An arbitrary matrix.
    Matrix(ProjectiveMatrix),
}

impl From<AffineStep> for ProjectiveStep {
    fn from(step: AffineStep) -> Self {
        Self::Affine(step)
    }
}

impl ProjectiveStep {
    fn matrix(&self, size: ImageSize) -> Result<ProjectiveMatrix, TransformError> {
        Ok(match *self {
            Self::Affine(step) => affine_to_projective(&step.matrix(size)),
            Self::Taper {
                side,
                corner,
                fraction,
            } => create_taper(size, side, corner, fraction),
            Self::QuadDistortion(quad) => create_quad_distortion(Rectangle::from(size), quad)?,
            Self::Matrix(m) => m,
        })
    }
}

fn validate_rect(rect: Rectangle) -> Result<ImageSize, TransformError> {
    if rect.is_empty() {
        return Err(TransformError::InvalidGeometry(format!(
            "source rectangle must be non-empty, got {}x{}",
            rect.width, rect.height
        )));
    }
    Ok(ImageSize {
        width: rect.width as usize,
        height: rect.height as usize,
    })
}

fn checked<M: TransformMatrix>(matrix: M) -> Result<M, TransformError> {
    if matrix.is_degenerate() {
        return Err(TransformError::DegenerateTransform);
    }
    Ok(matrix)
}

/// Accumulates affine steps into a single matrix.
///
/// Appended steps apply after the existing ones, prepended steps before.
///
/// # Example
///
/// ```
/// use glam::Vec2;
/// use warpkit_image::Rectangle;
/// use warpkit_imgproc::warp::{AffineStep, AffineTransformBuilder, TransformMatrix};
///
/// let matrix = AffineTransformBuilder::new()
///     .append(AffineStep::Scale(Vec2::new(2.0, 0.5)))
///     .append(AffineStep::Translation(Vec2::new(3.0, 1.0)))
///     .build(Rectangle::new(0, 0, 100, 100))
///     .unwrap();
///
/// assert_eq!(matrix.transform_point(Vec2::new(10.0, 20.0)), Vec2::new(23.0, 11.0));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AffineTransformBuilder {
    steps: Vec<AffineStep>,
}

impl AffineTransformBuilder {
    /// An empty builder, which builds the identity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `step` after the existing steps.
    pub fn append(mut self, step: AffineStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Applies `step` before the existing steps.
    pub fn prepend(mut self, step: AffineStep) -> Self {
        self.steps.insert(0, step);
        self
    }

    /// Composes the steps for a source occupying `rect`.
    ///
    /// The rectangle location is removed first so the steps see the source at
    /// the origin.
    ///
    /// # Errors
    ///
    /// Fails for an empty rectangle or a degenerate result.
    pub fn build(&self, rect: Rectangle) -> Result<AffineMatrix, TransformError> {
        let size = validate_rect(rect)?;
        let origin = Affine2::from_translation(-Vec2::new(rect.x as f32, rect.y as f32));
        let matrix = self
            .steps
            .iter()
            .fold(origin, |m, step| m.then(&step.matrix(size)));
        checked(matrix)
    }
}

/// Accumulates projective steps into a single matrix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectiveTransformBuilder {
    steps: Vec<ProjectiveStep>,
}

impl ProjectiveTransformBuilder {
    /// An empty builder, which builds the identity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `step` after the existing steps.
    pub fn append(mut self, step: impl Into<ProjectiveStep>) -> Self {
        self.steps.push(step.into());
        self
    }

    /// Applies `step` before the existing steps.
    pub fn prepend(mut self, step: impl Into<ProjectiveStep>) -> Self {
        self.steps.insert(0, step.into());
        self
    }

    /// Composes the steps for a source occupying `rect`.
    ///
    /// # Errors
    ///
    /// Fails for an empty rectangle, a singular quad distortion or a degenerate result.
    pub fn build(&self, rect: Rectangle) -> Result<ProjectiveMatrix, TransformError> {
        let size = validate_rect(rect)?;
        let location = Vec2::new(rect.x as f32, rect.y as f32);
        let mut matrix = Mat4::from_translation(-location.extend(0.0));
        for step in &self.steps {
            matrix = matrix.then(&step.matrix(size)?);
        }
        checked(matrix)
    }
}
