use glam::Vec2;
use warpkit_image::{pixel, Image, ImageDtype, ImageError, ImageSize};

use super::geometry::TransformMatrix;
use crate::error::TransformError;
use crate::interpolation::{dispatch_kernel, Kernel, Resampler, TwoAxisKernelMap};
use crate::parallel::{
    par_iter_row_intervals, par_iter_row_intervals_with_scratch, ParallelExecutionSettings,
    RowPartition,
};

fn ensure_non_empty(size: ImageSize) -> Result<(), TransformError> {
    if size.is_empty() {
        return Err(TransformError::Image(ImageError::InvalidImageSize(
            size.width,
            size.height,
        )));
    }
    Ok(())
}

/// Samples `src` through `matrix` into every pixel of `dst`.
///
/// `matrix` maps source coordinates to destination coordinates. Destination
/// pixels whose sample point falls outside the source keep their value.
pub(crate) fn transform_image<M, T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    matrix: &M,
    resampler: Resampler,
    settings: &ParallelExecutionSettings,
) -> Result<(), TransformError>
where
    M: TransformMatrix,
    T: ImageDtype,
{
    pixel::ensure_vec4_layout::<C>()?;
    ensure_non_empty(src.size())?;
    ensure_non_empty(dst.size())?;

    if (matrix.is_identity() || matrix.is_zero()) && src.size() == dst.size() {
        log::debug!("identity transform, copying {}", src.size());
        dst.as_slice_mut().copy_from_slice(src.as_slice());
        return Ok(());
    }

    if matrix.is_degenerate() {
        return Err(TransformError::DegenerateTransform);
    }

    // destination pixel centre to source pixel centre
    let inverse = matrix
        .normalize_to_pixel()
        .try_inverse()
        .ok_or(TransformError::DegenerateTransform)?;

    let partition = RowPartition::new(settings, dst.width(), dst.height())?;

    if resampler.is_nearest_neighbor() {
        log::debug!(
            "nearest neighbor transform {} -> {}",
            src.size(),
            dst.size()
        );
        return nearest_neighbor(src, dst, &inverse, &partition);
    }

    log::debug!(
        "{resampler:?} transform {} -> {} in {} intervals",
        src.size(),
        dst.size(),
        partition.num_steps()
    );
    dispatch_kernel!(resampler, |kernel| {
        convolve(&kernel, src, dst, &inverse, &partition, settings)
    })
}

fn nearest_neighbor<M, T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    inverse: &M,
    partition: &RowPartition,
) -> Result<(), TransformError>
where
    M: TransformMatrix,
    T: ImageDtype,
{
    let (src_w, src_h) = (src.width() as f32, src.height() as f32);
    let row_len = dst.width() * C;

    par_iter_row_intervals(partition, dst.as_slice_mut(), row_len, |interval, rows| {
        for (y, row) in interval.rows().zip(rows.chunks_exact_mut(row_len)) {
            for (x, px) in row.chunks_exact_mut(C).enumerate() {
                let p = inverse
                    .transform_point(Vec2::new(x as f32, y as f32))
                    .round();
                if p.is_finite() && p.x >= 0.0 && p.y >= 0.0 && p.x < src_w && p.y < src_h {
                    px.copy_from_slice(src.pixel(p.x as usize, p.y as usize));
                }
            }
        }
    })?;

    Ok(())
}

fn convolve<K, M, T, const C: usize>(
    kernel: &K,
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    inverse: &M,
    partition: &RowPartition,
    settings: &ParallelExecutionSettings,
) -> Result<(), TransformError>
where
    K: Kernel,
    M: TransformMatrix,
    T: ImageDtype,
{
    // allocated before any destination pixel is written
    let mut map = TwoAxisKernelMap::build(kernel, src.size(), dst.size(), settings.allocator())?;
    let (sampler, x_weights, y_weights) = map.parts_mut();
    let (x_len, y_len) = (x_weights.width(), y_weights.width());
    let row_len = dst.width() * C;

    par_iter_row_intervals_with_scratch(
        partition,
        dst.as_slice_mut(),
        row_len,
        x_weights,
        y_weights,
        |interval, rows, xs, ys| {
            for (((y, row), x_row), y_row) in interval
                .rows()
                .zip(rows.chunks_exact_mut(row_len))
                .zip(xs.chunks_exact_mut(x_len))
                .zip(ys.chunks_exact_mut(y_len))
            {
                for (x, px) in row.chunks_exact_mut(C).enumerate() {
                    let point = inverse.transform_point(Vec2::new(x as f32, y as f32));
                    if let Some(v) = sampler.convolve(kernel, src, point, x_row, y_row) {
                        pixel::from_vec4::<T, C>(v, px);
                    }
                }
            }
        },
    )?;

    Ok(())
}
