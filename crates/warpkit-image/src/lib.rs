#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Scratch buffer allocation.
pub mod allocator;

/// Error types for the image module.
pub mod error;

/// Image representation and geometry primitives.
pub mod image;

/// Conversion between interleaved pixels and 4-component vectors.
pub mod pixel;

pub use crate::allocator::{AllocatorError, Buffer2D, CpuAllocator, ImageAllocator};
pub use crate::error::ImageError;
pub use crate::image::{Image, ImageDtype, ImageSize, Rectangle};
