use glam::Vec4;
use warpkit_image::{AllocatorError, Buffer2D, ImageAllocator};

use super::resampler::Kernel;

/// The contiguous weights one destination index reads from the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelWindow<'a> {
    /// First contributing source index.
    pub left: usize,
    /// Weights for source indices `left..left + weights.len()`.
    pub weights: &'a [f32],
}

impl KernelWindow<'_> {
    /// Weighted sum of `sample(j)` over the window.
    #[inline]
    pub fn convolve(&self, mut sample: impl FnMut(usize) -> Vec4) -> Vec4 {
        self.weights
            .iter()
            .enumerate()
            .fold(Vec4::ZERO, |acc, (k, &w)| acc + w * sample(self.left + k))
    }
}

#[derive(Debug, Clone, Copy)]
struct WindowSpan {
    left: usize,
    len: usize,
}

/// Per-destination weight windows for resizing one axis.
///
/// All weights live in a single buffer with one row per destination index;
/// windows are `(left, len)` views into their row.
#[derive(Debug)]
pub struct KernelMap {
    source_size: usize,
    spans: Vec<WindowSpan>,
    weights: Buffer2D<f32>,
}

impl KernelMap {
    /// Builds the windows mapping `destination_size` indices onto `source_size`.
    ///
    /// # Arguments
    ///
    /// * `kernel` - The reconstruction filter.
    /// * `destination_size` - Number of destination indices, must be > 0.
    /// * `source_size` - Number of source indices, must be > 0.
    /// * `allocator` - Provides the weight buffer.
    ///
    /// # Errors
    ///
    /// Fails if the weight buffer cannot be allocated.
    ///
    /// # Panics
    ///
    /// Panics if either size is zero.
    pub fn build<K: Kernel, A: ImageAllocator>(
        kernel: &K,
        destination_size: usize,
        source_size: usize,
        allocator: &A,
    ) -> Result<Self, AllocatorError> {
        assert!(
            destination_size > 0 && source_size > 0,
            "kernel map sizes must be non-zero, got {destination_size} <- {source_size}"
        );

        let ratio = source_size as f64 / destination_size as f64;
        let scale = ratio.max(1.0);
        let radius = (scale * kernel.radius() as f64).ceil();
        let max_len = 2 * radius as usize + 1;

        let mut weights = allocator.allocate_2d::<f32>(max_len, destination_size)?;
        let mut spans = Vec::with_capacity(destination_size);
        let last = (source_size - 1) as f64;

        for i in 0..destination_size {
            let center = (i as f64 + 0.5) * ratio - 0.5;
            let left = (center - radius).ceil().clamp(0.0, last) as usize;
            let right = (center + radius).floor().clamp(0.0, last) as usize;
            let len = (right + 1).saturating_sub(left).min(max_len);

            let row = &mut weights.row_mut(i)[..len];
            let mut sum = 0.0f32;
            for (k, w) in row.iter_mut().enumerate() {
                let x = ((left + k) as f64 - center) / scale;
                *w = kernel.weight(x as f32);
                sum += *w;
            }

            if sum > 0.0 {
                row.iter_mut().for_each(|w| *w /= sum);
            }

            spans.push(WindowSpan { left, len });
        }

        Ok(Self {
            source_size,
            spans,
            weights,
        })
    }

    /// Number of destination indices.
    pub fn destination_size(&self) -> usize {
        self.spans.len()
    }

    /// Number of source indices.
    pub fn source_size(&self) -> usize {
        self.source_size
    }

    /// The window of destination index `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= destination_size()`.
    pub fn window(&self, i: usize) -> KernelWindow<'_> {
        let span = self.spans[i];
        KernelWindow {
            left: span.left,
            weights: &self.weights.row(i)[..span.len],
        }
    }
}
