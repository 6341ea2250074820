use thiserror::Error;

/// An error type for scratch buffer allocation.
#[derive(Debug, Error, PartialEq)]
pub enum AllocatorError {
    /// The requested buffer is larger than the configured limit.
    #[error("Allocation of {requested} bytes exceeds the limit of {limit} bytes")]
    LimitExceeded {
        /// Requested size in bytes.
        requested: usize,
        /// Configured limit in bytes.
        limit: usize,
    },

    /// The buffer size does not fit in `usize`.
    #[error("Buffer of {0}x{1} elements overflows the address space")]
    Overflow(usize, usize),

    /// The system allocator could not satisfy the request.
    #[error("Out of memory while allocating {0} bytes")]
    OutOfMemory(usize),
}

/// A capability that hands out zero-initialised 2D scratch buffers.
///
/// Every buffer returned is fully initialised with `T::default()`, so callers
/// may rely on clean allocation.
pub trait ImageAllocator: Clone + Send + Sync {
    /// Allocates a `width x height` buffer filled with `T::default()`.
    fn allocate_2d<T: Clone + Default>(
        &self,
        width: usize,
        height: usize,
    ) -> Result<Buffer2D<T>, AllocatorError>;
}

/// An allocator backed by the global heap with an optional size limit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CpuAllocator {
    max_allocation_bytes: Option<usize>,
}

impl CpuAllocator {
    /// Creates an allocator that refuses single buffers larger than `bytes`.
    pub fn with_limit(bytes: usize) -> Self {
        Self {
            max_allocation_bytes: Some(bytes),
        }
    }

    /// The configured per-buffer limit in bytes, if any.
    pub fn max_allocation_bytes(&self) -> Option<usize> {
        self.max_allocation_bytes
    }
}

impl ImageAllocator for CpuAllocator {
    fn allocate_2d<T: Clone + Default>(
        &self,
        width: usize,
        height: usize,
    ) -> Result<Buffer2D<T>, AllocatorError> {
        let len = width
            .checked_mul(height)
            .ok_or(AllocatorError::Overflow(width, height))?;
        let bytes = len
            .checked_mul(std::mem::size_of::<T>())
            .ok_or(AllocatorError::Overflow(width, height))?;

        if let Some(limit) = self.max_allocation_bytes {
            if bytes > limit {
                return Err(AllocatorError::LimitExceeded {
                    requested: bytes,
                    limit,
                });
            }
        }

        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| AllocatorError::OutOfMemory(bytes))?;
        data.resize(len, T::default());

        log::trace!("allocated {width}x{height} scratch buffer ({bytes} bytes)");

        Ok(Buffer2D {
            width,
            height,
            data,
        })
    }
}

/// A contiguous row-major 2D buffer.
///
/// Backs kernel map weights and resize intermediates; rows are handed out as
/// plain slices so no unsafe aliasing is needed.
#[derive(Clone, Debug, PartialEq)]
pub struct Buffer2D<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T> Buffer2D<T> {
    /// Number of elements per row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row `y` of the buffer.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    pub fn row(&self, y: usize) -> &[T] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    /// Mutable row `y` of the buffer.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        &mut self.data[y * self.width..(y + 1) * self.width]
    }

    /// The whole buffer as a flat slice.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// The whole buffer as a flat mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consumes the buffer and returns its row-major elements.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_allocator_clean() -> Result<(), AllocatorError> {
        let allocator = CpuAllocator::default();
        let buffer = allocator.allocate_2d::<f32>(7, 3)?;
        assert_eq!(buffer.width(), 7);
        assert_eq!(buffer.height(), 3);
        assert_eq!(buffer.as_slice().len(), 21);
        assert!(buffer.as_slice().iter().all(|&v| v == 0.0));
        Ok(())
    }

    #[test]
    fn test_cpu_allocator_rows() -> Result<(), AllocatorError> {
        let mut buffer = CpuAllocator::default().allocate_2d::<u8>(2, 3)?;
        buffer.row_mut(1).copy_from_slice(&[4, 5]);
        assert_eq!(buffer.row(0), &[0, 0]);
        assert_eq!(buffer.row(1), &[4, 5]);
        assert_eq!(buffer.as_slice(), &[0, 0, 4, 5, 0, 0]);
        Ok(())
    }

    #[test]
    fn test_cpu_allocator_limit() {
        let allocator = CpuAllocator::with_limit(64);
        assert!(allocator.allocate_2d::<f32>(4, 4).is_ok());
        assert_eq!(
            allocator.allocate_2d::<f32>(5, 4),
            Err(AllocatorError::LimitExceeded {
                requested: 80,
                limit: 64
            })
        );
    }

    #[test]
    fn test_cpu_allocator_overflow() {
        let res = CpuAllocator::default().allocate_2d::<f32>(usize::MAX, 2);
        assert_eq!(res, Err(AllocatorError::Overflow(usize::MAX, 2)));
    }
}
