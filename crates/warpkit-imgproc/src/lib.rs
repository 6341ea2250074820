#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// image cropping module.
pub mod crop;

/// error types for the transform operations.
pub mod error;

/// resampling filters and kernel maps.
pub mod interpolation;

/// parallel row iteration.
pub mod parallel;

/// image resizing module.
pub mod resize;

/// affine and projective warps.
pub mod warp;
