//! Resampling filters and the weight tables built from them.
//!
//! # Filters
//!
//! - **NearestNeighbor**: no reconstruction, takes the closest sample
//! - **Box / Triangle**: cheap averaging and linear reconstruction
//! - **Cubic family**: Keys bicubic and the (B, C) parameterised cubics
//! - **Windowed sinc**: Lanczos 2/3/5/8 and Welch
//!
//! # Kernel maps
//!
//! - [`KernelMap`] holds one normalised weight window per destination index of
//!   an axis-aligned resize.
//! - [`TwoAxisKernelMap`] holds per-row scratch weights for transforms whose
//!   sample points move continuously across a row.

mod alpha;
mod kernel_map;
mod resampler;
mod two_axis;

pub use alpha::{premultiply, unpremultiply};
pub use kernel_map::{KernelMap, KernelWindow};
pub use resampler::{
    sinc, BicubicKernel, BoxKernel, CubicKernel, Kernel, LanczosKernel, NearestNeighborKernel,
    Resampler, TriangleKernel, WelchKernel,
};
pub(crate) use resampler::dispatch_kernel;
pub use two_axis::{TwoAxisKernelMap, TwoAxisSampler};
