use glam::Vec4;
use warpkit_image::{pixel, Image, ImageAllocator, ImageDtype, ImageError};

use crate::error::TransformError;
use crate::interpolation::{
    dispatch_kernel, premultiply, unpremultiply, Kernel, KernelMap, Resampler,
};
use crate::parallel::{par_iter_row_intervals, ParallelExecutionSettings, RowPartition};

/// Resize an image to the size of `dst`.
///
/// Nearest neighbour copies raw pixels. Every other filter resamples the two axes
/// separately over premultiplied colour, so transparent pixels do not bleed into
/// their neighbours.
///
/// # Arguments
///
/// * `src` - The input image.
/// * `dst` - The output image; its size selects the target size.
/// * `resampler` - The resampling filter.
/// * `settings` - Parallelism and scratch allocation settings.
///
/// # Errors
///
/// Fails for empty images, unsupported channel counts, or when scratch memory
/// cannot be allocated. `dst` is not written on failure.
///
/// # Example
///
/// ```
/// use warpkit_image::{Image, ImageSize};
/// use warpkit_imgproc::interpolation::Resampler;
/// use warpkit_imgproc::parallel::ParallelExecutionSettings;
/// use warpkit_imgproc::resize::resize;
///
/// let src = Image::<u8, 3>::from_size_val(ImageSize { width: 8, height: 6 }, 80).unwrap();
/// let mut dst = Image::<u8, 3>::from_size_val(ImageSize { width: 4, height: 3 }, 0).unwrap();
///
/// resize(&src, &mut dst, Resampler::Bicubic, &ParallelExecutionSettings::default()).unwrap();
///
/// assert!(dst.as_slice().iter().all(|&v| v == 80));
/// ```
pub fn resize<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    resampler: Resampler,
    settings: &ParallelExecutionSettings,
) -> Result<(), TransformError> {
    pixel::ensure_vec4_layout::<C>()?;
    for size in [src.size(), dst.size()] {
        if size.is_empty() {
            return Err(ImageError::InvalidImageSize(size.width, size.height).into());
        }
    }

    if src.size() == dst.size() {
        dst.as_slice_mut().copy_from_slice(src.as_slice());
        return Ok(());
    }

    log::debug!("{resampler:?} resize {} -> {}", src.size(), dst.size());

    if resampler.is_nearest_neighbor() {
        return resize_nearest(src, dst, settings);
    }

    dispatch_kernel!(resampler, |kernel| {
        resize_separable(&kernel, src, dst, settings)
    })
}

fn resize_nearest<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    settings: &ParallelExecutionSettings,
) -> Result<(), TransformError> {
    let partition = RowPartition::new(settings, dst.width(), dst.height())?;
    let (src_w, src_h) = (src.width(), src.height());
    let (dst_w, dst_h) = (dst.width(), dst.height());
    let row_len = dst_w * C;

    par_iter_row_intervals(&partition, dst.as_slice_mut(), row_len, |interval, rows| {
        for (y, row) in interval.rows().zip(rows.chunks_exact_mut(row_len)) {
            let sy = y * src_h / dst_h;
            for (x, px) in row.chunks_exact_mut(C).enumerate() {
                px.copy_from_slice(src.pixel(x * src_w / dst_w, sy));
            }
        }
    })?;

    Ok(())
}

fn resize_separable<K: Kernel, T: ImageDtype, const C: usize>(
    kernel: &K,
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    settings: &ParallelExecutionSettings,
) -> Result<(), TransformError> {
    let allocator = settings.allocator();
    let (dst_w, dst_h) = (dst.width(), dst.height());

    // all scratch memory is reserved before the destination is touched
    let x_map = KernelMap::build(kernel, dst_w, src.width(), allocator)?;
    let y_map = KernelMap::build(kernel, dst_h, src.height(), allocator)?;
    let mut horizontal = allocator.allocate_2d::<Vec4>(dst_w, src.height())?;
    let h_partition = RowPartition::new(settings, dst_w, src.height())?;
    let v_partition = RowPartition::new(settings, dst_w, dst_h)?;

    par_iter_row_intervals(
        &h_partition,
        horizontal.as_mut_slice(),
        dst_w,
        |interval, rows| {
            for (y, row) in interval.rows().zip(rows.chunks_exact_mut(dst_w)) {
                let src_row = src.row(y);
                for (x, out) in row.iter_mut().enumerate() {
                    *out = x_map.window(x).convolve(|j| {
                        premultiply(pixel::to_vec4::<T, C>(&src_row[j * C..(j + 1) * C]))
                    });
                }
            }
        },
    )?;

    let horizontal = &horizontal;
    let row_len = dst_w * C;
    par_iter_row_intervals(&v_partition, dst.as_slice_mut(), row_len, |interval, rows| {
        for (y, row) in interval.rows().zip(rows.chunks_exact_mut(row_len)) {
            let window = y_map.window(y);
            for (x, px) in row.chunks_exact_mut(C).enumerate() {
                let v = window.convolve(|j| horizontal.row(j)[x]);
                pixel::from_vec4::<T, C>(unpremultiply(v), px);
            }
        }
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use warpkit_image::{AllocatorError, CpuAllocator, ImageSize};

    #[test]
    fn resize_same_size_copies() -> Result<(), TransformError> {
        let size = ImageSize {
            width: 3,
            height: 2,
        };
        let src = Image::<u8, 1>::new(size, vec![1, 2, 3, 4, 5, 6])?;
        let mut dst = Image::<u8, 1>::from_size_val(size, 0)?;

        resize(&src, &mut dst, Resampler::Lanczos3, &Default::default())?;
        assert_eq!(dst.as_slice(), src.as_slice());
        Ok(())
    }

    #[test]
    fn resize_nearest_picks_floor() -> Result<(), TransformError> {
        #[rustfmt::skip]
        let src = Image::<u8, 1>::new(
            ImageSize { width: 4, height: 2 },
            vec![
                0, 1, 2, 3,
                4, 5, 6, 7,
            ],
        )?;
        let mut dst = Image::<u8, 1>::from_size_val(
            ImageSize {
                width: 2,
                height: 4,
            },
            0,
        )?;

        resize(&src, &mut dst, Resampler::NearestNeighbor, &Default::default())?;
        assert_eq!(dst.as_slice(), &[0, 2, 0, 2, 4, 6, 4, 6]);
        Ok(())
    }

    #[test]
    fn resize_uniform_stays_uniform() -> Result<(), TransformError> {
        let src = Image::<u8, 3>::from_size_val(
            ImageSize {
                width: 7,
                height: 5,
            },
            200,
        )?;

        for resampler in [Resampler::Lanczos3, Resampler::Triangle, Resampler::Box] {
            let mut dst = Image::<u8, 3>::from_size_val(
                ImageSize {
                    width: 3,
                    height: 9,
                },
                0,
            )?;
            resize(&src, &mut dst, resampler, &Default::default())?;
            assert!(dst.as_slice().iter().all(|&v| v == 200), "{resampler:?}");
        }
        Ok(())
    }

    #[test]
    fn resize_triangle_downscale_weights() -> Result<(), TransformError> {
        let (a, b, c, d) = (1.0f32, 0.5, 0.25, 0.0);
        #[rustfmt::skip]
        let src = Image::<f32, 1>::new(
            ImageSize { width: 4, height: 4 },
            vec![
                a, a, b, b,
                a, a, b, b,
                c, c, d, d,
                c, c, d, d,
            ],
        )?;
        let mut dst = Image::<f32, 1>::from_size_val(
            ImageSize {
                width: 2,
                height: 2,
            },
            0.0,
        )?;

        resize(&src, &mut dst, Resampler::Triangle, &Default::default())?;

        // per axis weights 3/7, 3/7, 1/7
        let top_left = (36.0 * a + 6.0 * b + 6.0 * c + d) / 49.0;
        let bottom_right = (36.0 * d + 6.0 * c + 6.0 * b + a) / 49.0;
        assert_relative_eq!(dst.as_slice()[0], top_left, epsilon = 1e-5);
        assert_relative_eq!(dst.as_slice()[3], bottom_right, epsilon = 1e-5);
        Ok(())
    }

    #[test]
    fn resize_transparent_neighbour_does_not_bleed() -> Result<(), TransformError> {
        let src = Image::<f32, 4>::new(
            ImageSize {
                width: 2,
                height: 1,
            },
            vec![1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0],
        )?;
        let mut dst = Image::<f32, 4>::from_size_val(
            ImageSize {
                width: 1,
                height: 1,
            },
            0.0,
        )?;

        resize(&src, &mut dst, Resampler::Box, &Default::default())?;

        let px = dst.as_slice();
        assert_relative_eq!(px[0], 1.0, epsilon = 1e-5);
        assert_relative_eq!(px[1], 0.0, epsilon = 1e-5);
        assert_relative_eq!(px[3], 0.5, epsilon = 1e-5);
        Ok(())
    }

    #[test]
    fn resize_allocation_failure_leaves_destination() -> Result<(), TransformError> {
        let src = Image::<u8, 1>::from_size_val(
            ImageSize {
                width: 64,
                height: 64,
            },
            9,
        )?;
        let mut dst = Image::<u8, 1>::from_size_val(
            ImageSize {
                width: 32,
                height: 32,
            },
            1,
        )?;
        let settings =
            ParallelExecutionSettings::default().with_allocator(CpuAllocator::with_limit(16));

        let res = resize(&src, &mut dst, Resampler::Bicubic, &settings);
        assert!(matches!(
            res,
            Err(TransformError::Allocation(AllocatorError::LimitExceeded { .. }))
        ));
        assert!(dst.as_slice().iter().all(|&v| v == 1));
        Ok(())
    }
}
