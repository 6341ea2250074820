use crate::allocator::AllocatorError;

/// An error type for the image module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// Error when channel and shape are not valid.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when the image size is not valid.
    #[error("Image size ({0}x{1}) must be non-empty")]
    InvalidImageSize(usize, usize),

    /// Error when a pixel index is out of bounds.
    #[error("Pixel index ({0}, {1}) is out of bounds ({2}x{3})")]
    PixelIndexOutOfBounds(usize, usize, usize, usize),

    /// Error when a channel count has no 4-component vector mapping.
    #[error("Unsupported number of channels: {0}")]
    UnsupportedChannelCount(usize),

    /// Error when a region is empty or not contained in the image.
    #[error("Region ({0}, {1}, {2}x{3}) is not contained in the image ({4}x{5})")]
    InvalidRegion(i32, i32, i32, i32, usize, usize),

    /// Error when the pixel storage cannot be allocated.
    #[error(transparent)]
    Allocation(#[from] AllocatorError),
}
