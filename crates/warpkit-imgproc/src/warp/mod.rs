//! Geometric image transformations using affine and projective matrices.
//!
//! This module provides:
//!
//! - Matrix construction: centred rotation and skew, taper, quad distortion
//! - Canvas size and bounding rectangle derivation
//! - Transform builders and immutable transform plans
//! - The execution engine behind [`warp_affine`] and [`warp_perspective`]
//!
//! # Examples
//!
//! Rotating an image by 90 degrees:
//!
//! ```
//! use warpkit_image::{Image, ImageSize};
//! use warpkit_imgproc::interpolation::Resampler;
//! use warpkit_imgproc::parallel::ParallelExecutionSettings;
//! use warpkit_imgproc::warp::rotate;
//!
//! let src = Image::<u8, 3>::from_size_val(ImageSize { width: 8, height: 4 }, 255).unwrap();
//! let settings = ParallelExecutionSettings::default();
//! let dst = rotate(&src, 90.0, Resampler::NearestNeighbor, &settings).unwrap();
//!
//! assert_eq!(dst.size(), ImageSize { width: 4, height: 8 });
//! ```

mod builder;
mod engine;
mod geometry;
mod plan;
mod swizzle;

pub use builder::{AffineStep, AffineTransformBuilder, ProjectiveStep, ProjectiveTransformBuilder};
pub use geometry::{
    affine_to_projective, create_centered_transform, create_quad_distortion, create_rotation,
    create_rotation_about, create_rotation_radians, create_skew, create_skew_about,
    create_skew_radians, create_taper, is_degenerate, projective_transform_2d, swizzler_matrix,
    transformed_bounding_rectangle, transformed_canvas_size, AffineMatrix, ProjectiveMatrix, Quad,
    Swizzler, TaperCorner, TaperSide, TransformMatrix, EPSILON, EPSILON_SQUARED,
};
pub use plan::{AffineTransformPlan, ProjectiveTransformPlan, TransformPlan};
pub use swizzle::{swizzle, TransposeSwizzler};

use warpkit_image::{Image, ImageDtype};

use crate::error::TransformError;
use crate::interpolation::Resampler;
use crate::parallel::ParallelExecutionSettings;

/// Applies an affine transformation to an image.
///
/// # Arguments
///
/// * `src` - The input image.
/// * `dst` - The output image, of any size. Pixels mapping outside `src` are left untouched.
/// * `m` - The source to destination affine matrix.
/// * `resampler` - The resampling filter.
/// * `settings` - Parallelism and scratch allocation settings.
///
/// # Example
///
/// ```
/// use glam::Affine2;
/// use warpkit_image::{Image, ImageSize};
/// use warpkit_imgproc::interpolation::Resampler;
/// use warpkit_imgproc::parallel::ParallelExecutionSettings;
/// use warpkit_imgproc::warp::warp_affine;
///
/// let src = Image::<f32, 3>::from_size_val(ImageSize { width: 4, height: 5 }, 1.0).unwrap();
/// let mut dst = Image::<f32, 3>::from_size_val(ImageSize { width: 4, height: 5 }, 0.0).unwrap();
///
/// warp_affine(
///     &src,
///     &mut dst,
///     &Affine2::IDENTITY,
///     Resampler::Bicubic,
///     &ParallelExecutionSettings::default(),
/// )
/// .unwrap();
///
/// assert_eq!(dst.as_slice(), src.as_slice());
/// ```
pub fn warp_affine<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    m: &AffineMatrix,
    resampler: Resampler,
    settings: &ParallelExecutionSettings,
) -> Result<(), TransformError> {
    engine::transform_image(src, dst, m, resampler, settings)
}

/// Applies a projective transformation to an image.
///
/// Same contract as [`warp_affine`], with a perspective divide per sample.
pub fn warp_perspective<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    m: &ProjectiveMatrix,
    resampler: Resampler,
    settings: &ParallelExecutionSettings,
) -> Result<(), TransformError> {
    engine::transform_image(src, dst, m, resampler, settings)
}

/// Rotates an image by `degrees` onto a canvas that holds the whole result.
pub fn rotate<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    degrees: f32,
    resampler: Resampler,
    settings: &ParallelExecutionSettings,
) -> Result<Image<T, C>, TransformError> {
    AffineTransformPlan::new(create_rotation(degrees, src.size()), src.size(), resampler)?
        .execute(src, settings)
}

/// Skews an image by the given angles onto a canvas that holds the whole result.
pub fn skew<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    degrees_x: f32,
    degrees_y: f32,
    resampler: Resampler,
    settings: &ParallelExecutionSettings,
) -> Result<Image<T, C>, TransformError> {
    let matrix = create_skew(degrees_x, degrees_y, src.size());
    AffineTransformPlan::new(matrix, src.size(), resampler)?.execute(src, settings)
}

/// Tapers one side of an image.
pub fn taper<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    side: TaperSide,
    corner: TaperCorner,
    fraction: f32,
    resampler: Resampler,
    settings: &ParallelExecutionSettings,
) -> Result<Image<T, C>, TransformError> {
    let matrix = create_taper(src.size(), side, corner, fraction);
    ProjectiveTransformPlan::new(matrix, src.size(), resampler)?.execute(src, settings)
}
