use rayon::prelude::*;
use thiserror::Error;

use warpkit_image::{Buffer2D, CpuAllocator};

/// Errors that can occur during parallel execution.
#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    /// The requested degree of parallelism is invalid.
    #[error("max degree of parallelism must be > 0, got {0}")]
    InvalidThreadCount(usize),

    /// The minimum number of pixels per task is invalid.
    #[error("minimum pixels per task must be > 0, got {0}")]
    InvalidPixelsPerTask(usize),

    /// The region to partition has no rows or no columns.
    #[error("cannot partition an empty region ({0}x{1})")]
    EmptyRegion(usize, usize),

    /// A buffer does not cover the partitioned region.
    #[error("buffer of length {0} does not match the region ({1} rows of {2})")]
    SizeMismatch(usize, usize, usize),
}

/// Controls how row-parallel operations are split across workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParallelExecutionSettings {
    max_degree_of_parallelism: usize,
    min_pixels_per_task: usize,
    allocator: CpuAllocator,
}

impl ParallelExecutionSettings {
    /// Default lower bound on the pixels handled by one task.
    pub const DEFAULT_MIN_PIXELS_PER_TASK: usize = 4096;

    /// Creates validated settings.
    ///
    /// # Arguments
    ///
    /// * `max_degree_of_parallelism` - Upper bound on concurrently processed row intervals.
    /// * `min_pixels_per_task` - Minimum number of pixels a single interval should cover.
    /// * `allocator` - Allocator used for scratch buffers.
    pub fn new(
        max_degree_of_parallelism: usize,
        min_pixels_per_task: usize,
        allocator: CpuAllocator,
    ) -> Result<Self, ParallelError> {
        if max_degree_of_parallelism == 0 {
            return Err(ParallelError::InvalidThreadCount(max_degree_of_parallelism));
        }
        if min_pixels_per_task == 0 {
            return Err(ParallelError::InvalidPixelsPerTask(min_pixels_per_task));
        }
        Ok(Self {
            max_degree_of_parallelism,
            min_pixels_per_task,
            allocator,
        })
    }

    /// Settings that run every operation on the calling thread.
    pub fn serial() -> Self {
        Self {
            max_degree_of_parallelism: 1,
            ..Self::default()
        }
    }

    /// Returns a copy using `allocator` for scratch buffers.
    pub fn with_allocator(self, allocator: CpuAllocator) -> Self {
        Self { allocator, ..self }
    }

    /// Upper bound on concurrently processed row intervals.
    pub fn max_degree_of_parallelism(&self) -> usize {
        self.max_degree_of_parallelism
    }

    /// Minimum number of pixels per row interval.
    pub fn min_pixels_per_task(&self) -> usize {
        self.min_pixels_per_task
    }

    /// Allocator used for scratch buffers.
    pub fn allocator(&self) -> &CpuAllocator {
        &self.allocator
    }
}

impl Default for ParallelExecutionSettings {
    fn default() -> Self {
        Self {
            max_degree_of_parallelism: rayon::current_num_threads().max(1),
            min_pixels_per_task: Self::DEFAULT_MIN_PIXELS_PER_TASK,
            allocator: CpuAllocator::default(),
        }
    }
}

/// A half-open range of rows `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowInterval {
    /// First row of the interval.
    pub min: usize,
    /// One past the last row of the interval.
    pub max: usize,
}

impl RowInterval {
    /// Number of rows in the interval.
    pub fn height(&self) -> usize {
        self.max - self.min
    }

    /// Iterates the absolute row indices.
    pub fn rows(&self) -> std::ops::Range<usize> {
        self.min..self.max
    }
}

/// Splits a `width x height` region into contiguous row intervals.
///
/// The number of intervals is `min(max_degree_of_parallelism,
/// ceil(width * height / min_pixels_per_task))` and every interval but the last
/// spans `step = ceil(height / num_steps)` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPartition {
    height: usize,
    step: usize,
    num_steps: usize,
}

impl RowPartition {
    /// Computes the partition of a `width x height` region.
    pub fn new(
        settings: &ParallelExecutionSettings,
        width: usize,
        height: usize,
    ) -> Result<Self, ParallelError> {
        if width == 0 || height == 0 {
            return Err(ParallelError::EmptyRegion(width, height));
        }

        let max_steps = (width * height).div_ceil(settings.min_pixels_per_task);
        let num_steps = settings.max_degree_of_parallelism.min(max_steps).max(1);
        let step = height.div_ceil(num_steps);

        // a large step may cover the height in fewer intervals
        let num_steps = height.div_ceil(step);

        log::trace!("partitioned {width}x{height} into {num_steps} intervals of {step} rows");

        Ok(Self {
            height,
            step,
            num_steps,
        })
    }

    /// Rows per interval.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Number of intervals.
    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    /// Total number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The `i`-th interval.
    pub fn interval(&self, i: usize) -> RowInterval {
        let min = (i * self.step).min(self.height);
        RowInterval {
            min,
            max: (min + self.step).min(self.height),
        }
    }

    /// All intervals in order.
    pub fn intervals(&self) -> impl Iterator<Item = RowInterval> + '_ {
        (0..self.num_steps).map(|i| self.interval(i))
    }

    fn check_buffer(&self, len: usize, row_len: usize) -> Result<(), ParallelError> {
        if row_len == 0 || len != row_len * self.height {
            return Err(ParallelError::SizeMismatch(len, self.height, row_len));
        }
        Ok(())
    }
}

/// Runs `f` once per row interval, in parallel.
///
/// `dst` holds `partition.height()` rows of `row_len` elements; `f` receives the
/// interval and the rows it owns. Intervals are disjoint so no two tasks touch
/// the same element.
pub fn par_iter_row_intervals<T, F>(
    partition: &RowPartition,
    dst: &mut [T],
    row_len: usize,
    f: F,
) -> Result<(), ParallelError>
where
    T: Send,
    F: Fn(RowInterval, &mut [T]) + Send + Sync,
{
    partition.check_buffer(dst.len(), row_len)?;

    if partition.num_steps == 1 {
        f(partition.interval(0), dst);
        return Ok(());
    }

    dst.par_chunks_mut(partition.step * row_len)
        .enumerate()
        .for_each(|(i, rows)| f(partition.interval(i), rows));

    Ok(())
}

/// Runs `f` once per row interval with two row-partitioned scratch buffers.
///
/// Both scratch buffers must have `partition.height()` rows; each task receives
/// the scratch rows matching its interval.
pub fn par_iter_row_intervals_with_scratch<T, S, F>(
    partition: &RowPartition,
    dst: &mut [T],
    row_len: usize,
    scratch_a: &mut Buffer2D<S>,
    scratch_b: &mut Buffer2D<S>,
    f: F,
) -> Result<(), ParallelError>
where
    T: Send,
    S: Send,
    F: Fn(RowInterval, &mut [T], &mut [S], &mut [S]) + Send + Sync,
{
    partition.check_buffer(dst.len(), row_len)?;
    let (a_len, b_len) = (scratch_a.width(), scratch_b.width());
    partition.check_buffer(scratch_a.as_slice().len(), a_len)?;
    partition.check_buffer(scratch_b.as_slice().len(), b_len)?;

    if partition.num_steps == 1 {
        f(
            partition.interval(0),
            dst,
            scratch_a.as_mut_slice(),
            scratch_b.as_mut_slice(),
        );
        return Ok(());
    }

    let step = partition.step;
    dst.par_chunks_mut(step * row_len)
        .zip(scratch_a.as_mut_slice().par_chunks_mut(step * a_len))
        .zip(scratch_b.as_mut_slice().par_chunks_mut(step * b_len))
        .enumerate()
        .for_each(|(i, ((rows, a), b))| f(partition.interval(i), rows, a, b));

    Ok(())
}
