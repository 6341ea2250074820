use thiserror::Error;
use warpkit_image::{AllocatorError, ImageError, ImageSize};

use crate::parallel::ParallelError;

/// An error type for transform and resize operations.
#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    /// The matrix contains NaN or its determinant is approximately zero.
    #[error("Transform matrix is degenerate")]
    DegenerateTransform,

    /// Invalid geometry passed to a constructor.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// The source image does not match the size a plan was built for.
    #[error("Source size {actual} does not match the planned size {expected}")]
    SourceSizeMismatch {
        /// Size the plan was built for.
        expected: ImageSize,
        /// Size of the image passed in.
        actual: ImageSize,
    },

    /// The destination image does not match the size a plan produces.
    #[error("Destination size {actual} does not match the planned size {expected}")]
    DestinationSizeMismatch {
        /// Size the plan produces.
        expected: ImageSize,
        /// Size of the image passed in.
        actual: ImageSize,
    },

    /// Image level error.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Scratch buffer allocation failed.
    #[error(transparent)]
    Allocation(#[from] AllocatorError),

    /// Parallel settings or partitioning failed.
    #[error(transparent)]
    Parallel(#[from] ParallelError),
}
