use glam::{Vec2, Vec4};
use warpkit_image::{pixel, AllocatorError, Buffer2D, Image, ImageAllocator, ImageDtype, ImageSize};

use super::alpha::{premultiply, unpremultiply};
use super::resampler::Kernel;

/// Per-row weight scratch for point-sampled transforms.
///
/// Holds one row of horizontal and one row of vertical weights per destination
/// scanline. The rows are overwritten for every pixel of their scanline, so a
/// worker only ever touches the rows of the interval it owns.
#[derive(Debug)]
pub struct TwoAxisKernelMap {
    sampler: TwoAxisSampler,
    x_weights: Buffer2D<f32>,
    y_weights: Buffer2D<f32>,
}

impl TwoAxisKernelMap {
    /// Allocates the scratch rows for a transform from `source` into `destination`.
    ///
    /// The radial extent of each axis is `max(1, source / destination) * radius`.
    pub fn build<K: Kernel, A: ImageAllocator>(
        kernel: &K,
        source: ImageSize,
        destination: ImageSize,
        allocator: &A,
    ) -> Result<Self, AllocatorError> {
        let x_scale = (source.width as f32 / destination.width as f32).max(1.0);
        let y_scale = (source.height as f32 / destination.height as f32).max(1.0);
        let extent = Vec2::new(x_scale, y_scale) * kernel.radius();

        let x_len = 2 * extent.x.ceil() as usize + 2;
        let y_len = 2 * extent.y.ceil() as usize + 2;

        let x_weights = allocator.allocate_2d::<f32>(x_len, destination.height)?;
        let y_weights = allocator.allocate_2d::<f32>(y_len, destination.height)?;

        Ok(Self {
            sampler: TwoAxisSampler { extent, source },
            x_weights,
            y_weights,
        })
    }

    /// The per-pixel sampler shared by every row.
    pub fn sampler(&self) -> TwoAxisSampler {
        self.sampler
    }

    /// Splits the map into its sampler and the two scratch buffers.
    pub fn parts_mut(&mut self) -> (TwoAxisSampler, &mut Buffer2D<f32>, &mut Buffer2D<f32>) {
        (self.sampler, &mut self.x_weights, &mut self.y_weights)
    }
}

/// Convolves a source image around a continuous sample point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoAxisSampler {
    extent: Vec2,
    source: ImageSize,
}

impl TwoAxisSampler {
    /// The radial extent of the sampling window on each axis.
    pub fn extent(&self) -> Vec2 {
        self.extent
    }

    /// Reconstructs the source at `point`.
    ///
    /// Returns `None` when the clamped window collapses on either axis, which
    /// means the point lies outside the source and the destination pixel must
    /// be left untouched. Weights are not renormalised.
    ///
    /// `x_row` and `y_row` are scratch slices of at least `2 * ceil(extent) + 2`
    /// elements.
    #[inline]
    pub fn convolve<K: Kernel, T: ImageDtype, const C: usize>(
        &self,
        kernel: &K,
        src: &Image<T, C>,
        point: Vec2,
        x_row: &mut [f32],
        y_row: &mut [f32],
    ) -> Option<Vec4> {
        if !point.is_finite() {
            return None;
        }

        let (left, right) = window(point.x, self.extent.x, self.source.width)?;
        let (top, bottom) = window(point.y, self.extent.y, self.source.height)?;

        let x_weights = &mut x_row[..=right - left];
        for (k, w) in x_weights.iter_mut().enumerate() {
            *w = kernel.weight((left + k) as f32 - point.x);
        }

        let y_weights = &mut y_row[..=bottom - top];
        for (k, w) in y_weights.iter_mut().enumerate() {
            *w = kernel.weight((top + k) as f32 - point.y);
        }

        let mut sum = Vec4::ZERO;
        for (&wy, y) in y_weights.iter().zip(top..=bottom) {
            let row = src.row(y);
            let mut row_sum = Vec4::ZERO;
            for (&wx, px) in x_weights
                .iter()
                .zip(row[left * C..(right + 1) * C].chunks_exact(C))
            {
                row_sum += wx * premultiply(pixel::to_vec4::<T, C>(px));
            }
            sum += wy * row_sum;
        }

        Some(unpremultiply(sum))
    }
}

/// Clamped `[min, max]` window around `p`, or `None` if it collapses.
#[inline]
fn window(p: f32, extent: f32, size: usize) -> Option<(usize, usize)> {
    let last = (size - 1) as f32;
    let min = (p - extent - 0.5).ceil().clamp(0.0, last);
    let max = (p + extent + 0.5).floor().clamp(0.0, last);
    if min >= max {
        return None;
    }
    Some((min as usize, max as usize))
}
