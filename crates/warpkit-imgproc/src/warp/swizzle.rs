use glam::Vec2;
use warpkit_image::{Image, ImageDtype, ImageSize, Rectangle};

use super::engine::transform_image;
use super::geometry::{swizzler_matrix, Swizzler};
use crate::error::TransformError;
use crate::interpolation::Resampler;
use crate::parallel::ParallelExecutionSettings;

/// Swaps the x and y axes of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransposeSwizzler {
    source_size: ImageSize,
}

impl TransposeSwizzler {
    /// A transpose of a `source_size` image.
    pub fn new(source_size: ImageSize) -> Self {
        Self { source_size }
    }
}

impl Swizzler for TransposeSwizzler {
    fn destination_size(&self) -> ImageSize {
        ImageSize {
            width: self.source_size.height,
            height: self.source_size.width,
        }
    }

    fn transform(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.y, p.x)
    }
}

/// Remaps the axes of `src` through `swizzler`.
///
/// The remap is approximated by the quad distortion through the transformed
/// corners of the source and sampled with nearest neighbour, so axis permutations
/// are reproduced exactly.
pub fn swizzle<S, T, const C: usize>(
    src: &Image<T, C>,
    swizzler: &S,
    settings: &ParallelExecutionSettings,
) -> Result<Image<T, C>, TransformError>
where
    S: Swizzler,
    T: ImageDtype,
{
    let matrix = swizzler_matrix(swizzler, Rectangle::from(src.size()))?;
    let mut dst = Image::from_allocator(swizzler.destination_size(), settings.allocator())?;
    transform_image(src, &mut dst, &matrix, Resampler::NearestNeighbor, settings)?;
    Ok(dst)
}
