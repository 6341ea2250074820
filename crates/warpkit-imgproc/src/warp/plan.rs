use warpkit_image::{Image, ImageDtype, ImageError, ImageSize, Rectangle};

use super::builder::{AffineTransformBuilder, ProjectiveTransformBuilder};
use super::engine::transform_image;
use super::geometry::{transformed_canvas_size, AffineMatrix, ProjectiveMatrix, TransformMatrix};
use crate::error::TransformError;
use crate::interpolation::Resampler;
use crate::parallel::ParallelExecutionSettings;

/// An immutable, validated transform ready to be applied.
///
/// Planning fixes the matrix, the source size and the destination canvas; applying
/// only reads the plan, so one plan can be applied to many images of the same size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformPlan<M: TransformMatrix> {
    matrix: M,
    source_size: ImageSize,
    destination_size: ImageSize,
    resampler: Resampler,
}

/// A plan driven by a 2x3 affine matrix.
pub type AffineTransformPlan = TransformPlan<AffineMatrix>;

/// A plan driven by a 4x4 projective matrix.
pub type ProjectiveTransformPlan = TransformPlan<ProjectiveMatrix>;

impl<M: TransformMatrix> TransformPlan<M> {
    /// Plans a transform of a `source_size` image by `matrix`.
    ///
    /// The destination canvas is sized to hold all transformed content,
    /// including its translation.
    ///
    /// # Errors
    ///
    /// Fails for an empty source or a degenerate matrix.
    pub fn new(
        matrix: M,
        source_size: ImageSize,
        resampler: Resampler,
    ) -> Result<Self, TransformError> {
        if source_size.is_empty() {
            return Err(TransformError::InvalidGeometry(format!(
                "source size must be non-empty, got {source_size}"
            )));
        }
        if matrix.is_degenerate() {
            return Err(TransformError::DegenerateTransform);
        }

        let destination_size = transformed_canvas_size(&matrix, source_size, true);
        log::debug!("planned {resampler:?} transform {source_size} -> {destination_size}");

        Ok(Self {
            matrix,
            source_size,
            destination_size,
            resampler,
        })
    }

    /// The source to destination matrix.
    pub fn matrix(&self) -> &M {
        &self.matrix
    }

    /// Size of the images the plan accepts.
    pub fn source_size(&self) -> ImageSize {
        self.source_size
    }

    /// Size of the images the plan produces.
    pub fn destination_size(&self) -> ImageSize {
        self.destination_size
    }

    /// The resampling filter.
    pub fn resampler(&self) -> Resampler {
        self.resampler
    }

    /// Transforms `src` into `dst`.
    ///
    /// Pixels of `dst` that map outside the source keep their value.
    ///
    /// # Errors
    ///
    /// Fails if either image does not match the planned sizes or scratch
    /// allocation fails; `dst` is not written in either case.
    pub fn apply<T: ImageDtype, const C: usize>(
        &self,
        src: &Image<T, C>,
        dst: &mut Image<T, C>,
        settings: &ParallelExecutionSettings,
    ) -> Result<(), TransformError> {
        if src.size() != self.source_size {
            return Err(TransformError::SourceSizeMismatch {
                expected: self.source_size,
                actual: src.size(),
            });
        }
        if dst.size() != self.destination_size {
            return Err(TransformError::DestinationSizeMismatch {
                expected: self.destination_size,
                actual: dst.size(),
            });
        }
        transform_image(src, dst, &self.matrix, self.resampler, settings)
    }

    /// Transforms `src` into a new zero-initialised image of the destination size.
    ///
    /// The destination is taken from the settings' allocator, so a canvas too
    /// large for it fails with [`TransformError::Allocation`].
    pub fn execute<T: ImageDtype, const C: usize>(
        &self,
        src: &Image<T, C>,
        settings: &ParallelExecutionSettings,
    ) -> Result<Image<T, C>, TransformError> {
        let mut dst = Image::from_allocator(self.destination_size, settings.allocator())?;
        self.apply(src, &mut dst, settings)?;
        Ok(dst)
    }
}

fn rect_size(rect: Rectangle) -> Result<ImageSize, ImageError> {
    if rect.is_empty() {
        return Err(ImageError::InvalidImageSize(
            rect.width.max(0) as usize,
            rect.height.max(0) as usize,
        ));
    }
    Ok(ImageSize {
        width: rect.width as usize,
        height: rect.height as usize,
    })
}

impl AffineTransformPlan {
    /// Plans the transform accumulated by `builder` for a source occupying `rect`.
    pub fn from_builder(
        builder: &AffineTransformBuilder,
        rect: Rectangle,
        resampler: Resampler,
    ) -> Result<Self, TransformError> {
        let matrix = builder.build(rect)?;
        Self::new(matrix, rect_size(rect)?, resampler)
    }
}

impl ProjectiveTransformPlan {
    /// Plans the transform accumulated by `builder` for a source occupying `rect`.
    pub fn from_builder(
        builder: &ProjectiveTransformBuilder,
        rect: Rectangle,
        resampler: Resampler,
    ) -> Result<Self, TransformError> {
        let matrix = builder.build(rect)?;
        Self::new(matrix, rect_size(rect)?, resampler)
    }
}
