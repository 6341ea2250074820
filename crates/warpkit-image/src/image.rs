use num_traits::{AsPrimitive, Bounded};

use crate::allocator::{AllocatorError, ImageAllocator};
use crate::error::ImageError;

/// Image size in pixels
///
/// A struct to represent the size of an image in pixels.
///
/// # Examples
///
/// ```
/// use warpkit_image::ImageSize;
///
/// let image_size = ImageSize {
///   width: 10,
///   height: 20,
/// };
///
/// assert_eq!(image_size.width, 10);
/// assert_eq!(image_size.height, 20);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ImageSize {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
}

impl ImageSize {
    /// Returns true if either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of pixels covered by this size.
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "ImageSize {{ width: {}, height: {} }}",
            self.width, self.height
        )
    }
}

impl From<[usize; 2]> for ImageSize {
    fn from(size: [usize; 2]) -> Self {
        ImageSize {
            width: size[0],
            height: size[1],
        }
    }
}

/// An integer axis-aligned rectangle.
///
/// `right` and `bottom` are exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rectangle {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Rectangle {
    /// Creates a rectangle from its location and size.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle from its left, top, right and bottom edges.
    pub fn from_ltrb(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }

    /// The x coordinate of the left edge.
    pub fn left(&self) -> i32 {
        self.x
    }

    /// The y coordinate of the top edge.
    pub fn top(&self) -> i32 {
        self.y
    }

    /// The x coordinate one past the right edge.
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// The y coordinate one past the bottom edge.
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Returns true if the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Returns true if `other` lies entirely within this rectangle.
    pub fn contains(&self, other: &Rectangle) -> bool {
        self.left() <= other.left()
            && self.top() <= other.top()
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

impl From<ImageSize> for Rectangle {
    fn from(size: ImageSize) -> Self {
        Rectangle::new(0, 0, size.width as i32, size.height as i32)
    }
}

/// Trait for image data types.
///
/// Samples are converted to and from the unit range `[0, 1]` when a pixel is
/// expanded into a 4-component float vector.
pub trait ImageDtype: Copy + Default + Send + Sync + 'static {
    /// Convert the sample to a float in the unit range.
    fn to_scaled(self) -> f32;

    /// Convert a unit-range float back to the sample type.
    fn from_scaled(x: f32) -> Self;
}

impl ImageDtype for f32 {
    fn to_scaled(self) -> f32 {
        self
    }

    fn from_scaled(x: f32) -> Self {
        x
    }
}

macro_rules! impl_unsigned_dtype {
    ($($t:ty),*) => {
        $(
            impl ImageDtype for $t {
                fn to_scaled(self) -> f32 {
                    let max: f32 = <$t as Bounded>::max_value().as_();
                    AsPrimitive::<f32>::as_(self) / max
                }

                fn from_scaled(x: f32) -> Self {
                    let max: f32 = <$t as Bounded>::max_value().as_();
                    (x * max).round().clamp(0.0, max).as_()
                }
            }
        )*
    };
}

impl_unsigned_dtype!(u8, u16);

/// Number of samples in a `size` image with `channels` samples per pixel.
fn storage_len(size: ImageSize, channels: usize) -> Result<usize, AllocatorError> {
    size.width
        .checked_mul(size.height)
        .and_then(|n| n.checked_mul(channels))
        .ok_or(AllocatorError::Overflow(size.width, size.height))
}

/// Represents an image with pixel data.
///
/// The pixels are stored row-major and interleaved, `CHANNELS` samples per pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct Image<T, const CHANNELS: usize> {
    size: ImageSize,
    data: Vec<T>,
}

impl<T, const CHANNELS: usize> Image<T, CHANNELS> {
    /// Create a new image from pixel data.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the image in pixels.
    /// * `data` - The pixel data of the image.
    ///
    /// # Errors
    ///
    /// If the length of the pixel data does not match the image size, an error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use warpkit_image::{Image, ImageSize};
    ///
    /// let image = Image::<u8, 3>::new(
    ///     ImageSize {
    ///         width: 10,
    ///         height: 20,
    ///     },
    ///     vec![0u8; 10 * 20 * 3],
    /// ).unwrap();
    ///
    /// assert_eq!(image.size().width, 10);
    /// assert_eq!(image.size().height, 20);
    /// assert_eq!(image.num_channels(), 3);
    /// ```
    pub fn new(size: ImageSize, data: Vec<T>) -> Result<Self, ImageError> {
        let len = storage_len(size, CHANNELS)?;
        if data.len() != len {
            return Err(ImageError::InvalidChannelShape(data.len(), len));
        }

        Ok(Self { size, data })
    }

    /// Create a new image with the given size and default pixel data.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Allocation`] if the storage size overflows or the
    /// memory cannot be reserved.
    ///
    /// # Examples
    ///
    /// ```
    /// use warpkit_image::{Image, ImageSize};
    ///
    /// let image = Image::<u8, 3>::from_size_val(
    ///     ImageSize {
    ///         width: 10,
    ///         height: 20,
    ///     },
    ///     0u8,
    /// ).unwrap();
    ///
    /// assert_eq!(image.num_channels(), 3);
    /// ```
    pub fn from_size_val(size: ImageSize, val: T) -> Result<Self, ImageError>
    where
        T: Clone,
    {
        let len = storage_len(size, CHANNELS)?;
        let bytes = len.saturating_mul(std::mem::size_of::<T>());
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| AllocatorError::OutOfMemory(bytes))?;
        data.resize(len, val);

        Ok(Self { size, data })
    }

    /// Create a new image with default pixel data taken from `allocator`.
    ///
    /// The allocator's limits apply to the pixel storage, so oversized images
    /// are reported instead of aborting.
    ///
    /// # Examples
    ///
    /// ```
    /// use warpkit_image::{AllocatorError, CpuAllocator, Image};
    ///
    /// let allocator = CpuAllocator::with_limit(64);
    /// let small = Image::<u8, 4>::from_allocator([4, 4].into(), &allocator).unwrap();
    /// assert_eq!(small.as_slice(), &[0u8; 64]);
    ///
    /// let large = Image::<u8, 4>::from_allocator([8, 8].into(), &allocator);
    /// assert!(matches!(large, Err(AllocatorError::LimitExceeded { .. })));
    /// ```
    pub fn from_allocator<A: ImageAllocator>(
        size: ImageSize,
        allocator: &A,
    ) -> Result<Self, AllocatorError>
    where
        T: Clone + Default,
    {
        let row_len = size
            .width
            .checked_mul(CHANNELS)
            .ok_or(AllocatorError::Overflow(size.width, size.height))?;
        let buffer = allocator.allocate_2d::<T>(row_len, size.height)?;

        Ok(Self {
            size,
            data: buffer.into_vec(),
        })
    }

    /// Get the size of the image in pixels.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Get the width of the image in pixels.
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// Get the height of the image in pixels.
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// Get the number of columns of the image.
    pub fn cols(&self) -> usize {
        self.size.width
    }

    /// Get the number of rows of the image.
    pub fn rows(&self) -> usize {
        self.size.height
    }

    /// Get the number of channels in the image.
    pub fn num_channels(&self) -> usize {
        CHANNELS
    }

    /// The pixel data as a flat slice.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// The pixel data as a flat mutable slice.
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consumes the image and returns its pixel data.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// The interleaved samples of row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y` is out of bounds.
    pub fn row(&self, y: usize) -> &[T] {
        let stride = self.size.width * CHANNELS;
        &self.data[y * stride..(y + 1) * stride]
    }

    /// The samples of pixel `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the pixel is out of bounds.
    pub fn pixel(&self, x: usize, y: usize) -> &[T] {
        let offset = (y * self.size.width + x) * CHANNELS;
        &self.data[offset..offset + CHANNELS]
    }

    /// Get a pixel channel value, checking bounds.
    ///
    /// # Arguments
    ///
    /// * `x` - The x-coordinate of the pixel.
    /// * `y` - The y-coordinate of the pixel.
    /// * `ch` - The channel index of the pixel.
    pub fn get_pixel(&self, x: usize, y: usize, ch: usize) -> Result<&T, ImageError> {
        if x >= self.size.width || y >= self.size.height || ch >= CHANNELS {
            return Err(ImageError::PixelIndexOutOfBounds(
                x,
                y,
                self.size.width,
                self.size.height,
            ));
        }
        Ok(&self.data[(y * self.size.width + x) * CHANNELS + ch])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::CpuAllocator;

    #[test]
    fn image_size() {
        let image_size = ImageSize {
            width: 10,
            height: 20,
        };
        assert_eq!(image_size.area(), 200);
        assert!(!image_size.is_empty());
        assert!(ImageSize::from([0, 3]).is_empty());
    }

    #[test]
    fn image_smoke() -> Result<(), ImageError> {
        let image = Image::<u8, 3>::new(
            ImageSize {
                width: 10,
                height: 20,
            },
            vec![0u8; 10 * 20 * 3],
        )?;
        assert_eq!(image.size().width, 10);
        assert_eq!(image.size().height, 20);
        assert_eq!(image.num_channels(), 3);
        Ok(())
    }

    #[test]
    fn image_invalid_shape() {
        let res = Image::<u8, 3>::new([2, 2].into(), vec![0u8; 5]);
        assert_eq!(res, Err(ImageError::InvalidChannelShape(5, 12)));
    }

    #[test]
    fn image_storage_overflow() {
        let size = ImageSize {
            width: usize::MAX,
            height: 2,
        };
        let overflow = || ImageError::Allocation(AllocatorError::Overflow(usize::MAX, 2));
        assert_eq!(Image::<u8, 1>::from_size_val(size, 0), Err(overflow()));
        assert_eq!(Image::<u8, 1>::new(size, vec![]), Err(overflow()));
        assert_eq!(
            Image::<u8, 3>::from_allocator(size, &CpuAllocator::default()),
            Err(AllocatorError::Overflow(usize::MAX, 2))
        );
    }

    #[test]
    fn image_from_allocator_respects_limit() -> Result<(), AllocatorError> {
        let allocator = CpuAllocator::with_limit(4 * 4 * 3 * 4);
        let image = Image::<f32, 3>::from_allocator([4, 4].into(), &allocator)?;
        assert_eq!(image.size(), ImageSize::from([4, 4]));
        assert!(image.as_slice().iter().all(|&v| v == 0.0));

        assert_eq!(
            Image::<f32, 3>::from_allocator([5, 4].into(), &allocator),
            Err(AllocatorError::LimitExceeded {
                requested: 5 * 4 * 3 * 4,
                limit: 4 * 4 * 3 * 4,
            })
        );
        Ok(())
    }

    #[test]
    fn image_pixel_access() -> Result<(), ImageError> {
        let image = Image::<u8, 2>::new([2, 2].into(), (0..8).collect())?;
        assert_eq!(image.pixel(1, 0), &[2, 3]);
        assert_eq!(image.row(1), &[4, 5, 6, 7]);
        assert_eq!(*image.get_pixel(0, 1, 1)?, 5);
        assert!(matches!(
            image.get_pixel(2, 0, 0),
            Err(ImageError::PixelIndexOutOfBounds(2, 0, 2, 2))
        ));
        Ok(())
    }

    #[test]
    fn dtype_scaling() {
        assert_eq!(255u8.to_scaled(), 1.0);
        assert_eq!(0u8.to_scaled(), 0.0);
        assert_eq!(u8::from_scaled(1.5), 255);
        assert_eq!(u8::from_scaled(-0.2), 0);
        assert_eq!(u8::from_scaled(128.0 / 255.0), 128);
        assert_eq!(u16::from_scaled(1.0), u16::MAX);
        assert_eq!(f32::from_scaled(2.5), 2.5);
    }

    #[test]
    fn rectangle_edges() {
        let rect = Rectangle::new(1, 2, 3, 4);
        assert_eq!(rect.right(), 4);
        assert_eq!(rect.bottom(), 6);
        assert_eq!(Rectangle::from_ltrb(1, 2, 4, 6), rect);
        assert!(Rectangle::new(0, 0, 5, 6).contains(&rect));
        assert!(!Rectangle::new(0, 0, 3, 6).contains(&rect));
        assert!(Rectangle::new(0, 0, 0, 6).is_empty());
        assert_eq!(
            Rectangle::from(ImageSize::from([5, 6])),
            Rectangle::new(0, 0, 5, 6)
        );
    }
}
