use warpkit_image::{Image, ImageDtype, ImageError, ImageSize, Rectangle};

use crate::error::TransformError;
use crate::parallel::{par_iter_row_intervals, ParallelExecutionSettings, RowPartition};

/// Crop an image to a rectangular region.
///
/// # Arguments
///
/// * `src` - The source image to crop.
/// * `rect` - The region to keep, in source pixel coordinates.
/// * `settings` - Parallelism settings for the row copy.
///
/// # Errors
///
/// Returns [`ImageError::InvalidRegion`] if `rect` is empty or not fully contained
/// in the source.
///
/// # Examples
///
/// ```rust
/// use warpkit_image::{Image, ImageSize, Rectangle};
/// use warpkit_imgproc::crop::crop;
///
/// let image = Image::<_, 1>::new(ImageSize { width: 4, height: 4 }, vec![
///     0u8, 1, 2, 3,
///     4u8, 5, 6, 7,
///     8u8, 9, 10, 11,
///     12u8, 13, 14, 15
/// ]).unwrap();
///
/// let cropped = crop(&image, Rectangle::new(1, 1, 2, 2), &Default::default()).unwrap();
///
/// assert_eq!(cropped.as_slice(), &[5u8, 6, 9, 10]);
/// ```
pub fn crop<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    rect: Rectangle,
    settings: &ParallelExecutionSettings,
) -> Result<Image<T, C>, TransformError> {
    if rect.is_empty() || !Rectangle::from(src.size()).contains(&rect) {
        return Err(ImageError::InvalidRegion(
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            src.width(),
            src.height(),
        )
        .into());
    }

    let size = ImageSize {
        width: rect.width as usize,
        height: rect.height as usize,
    };
    let (x, y) = (rect.x as usize, rect.y as usize);
    let mut dst = Image::from_allocator(size, settings.allocator())?;

    let partition = RowPartition::new(settings, size.width, size.height)?;
    let row_len = size.width * C;

    par_iter_row_intervals(&partition, dst.as_slice_mut(), row_len, |interval, rows| {
        for (i, dst_row) in interval.rows().zip(rows.chunks_exact_mut(row_len)) {
            // the slice starting at the left edge of the region
            let offset = x * C;
            dst_row.copy_from_slice(&src.row(y + i)[offset..offset + row_len]);
        }
    })?;

    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop() -> Result<(), TransformError> {
        let image_size = ImageSize {
            width: 2,
            height: 3,
        };

        #[rustfmt::skip]
        let image = Image::<_, 3>::new(
            image_size,
            vec![
                0u8, 1, 2, 3, 4, 5,
                6u8, 7, 8, 9, 10, 11,
                12u8, 13, 14, 15, 16, 17,
            ],
        )?;

        let cropped = crop(&image, Rectangle::new(1, 1, 1, 2), &Default::default())?;

        assert_eq!(cropped.size(), ImageSize { width: 1, height: 2 });
        assert_eq!(cropped.as_slice(), &[9u8, 10, 11, 15, 16, 17]);
        Ok(())
    }

    #[test]
    fn test_crop_full_image() -> Result<(), TransformError> {
        let image = Image::<u8, 2>::new(
            ImageSize {
                width: 3,
                height: 2,
            },
            (0..12).collect(),
        )?;
        let cropped = crop(&image, Rectangle::from(image.size()), &Default::default())?;
        assert_eq!(cropped, image);
        Ok(())
    }

    #[test]
    fn test_crop_invalid_region() -> Result<(), TransformError> {
        let image = Image::<u8, 1>::from_size_val(
            ImageSize {
                width: 4,
                height: 4,
            },
            0,
        )?;

        for rect in [
            Rectangle::new(0, 0, 0, 2),
            Rectangle::new(3, 3, 2, 1),
            Rectangle::new(-1, 0, 2, 2),
        ] {
            assert_eq!(
                crop(&image, rect, &Default::default()),
                Err(TransformError::Image(ImageError::InvalidRegion(
                    rect.x,
                    rect.y,
                    rect.width,
                    rect.height,
                    4,
                    4
                )))
            );
        }
        Ok(())
    }
}
