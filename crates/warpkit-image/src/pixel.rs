//! A pixel is exchanged with the resampling code as a [`Vec4`] laid out as
//! `(r, g, b, a)` with samples in the unit range.
//!
//! | channels | layout        | vector              |
//! |----------|---------------|---------------------|
//! | 1        | gray          | `(g, g, g, 1)`      |
//! | 2        | gray, alpha   | `(g, g, g, a)`      |
//! | 3        | rgb           | `(r, g, b, 1)`      |
//! | 4        | rgba          | `(r, g, b, a)`      |

use glam::Vec4;

use crate::error::ImageError;
use crate::image::ImageDtype;

/// Checks that `CHANNELS` has a 4-component vector mapping.
pub fn ensure_vec4_layout<const CHANNELS: usize>() -> Result<(), ImageError> {
    match CHANNELS {
        1..=4 => Ok(()),
        c => Err(ImageError::UnsupportedChannelCount(c)),
    }
}

/// Expands the samples of one pixel into a vector.
///
/// Layouts rejected by [`ensure_vec4_layout`] map to [`Vec4::ZERO`].
#[inline]
pub fn to_vec4<T: ImageDtype, const CHANNELS: usize>(px: &[T]) -> Vec4 {
    match CHANNELS {
        1 => {
            let g = px[0].to_scaled();
            Vec4::new(g, g, g, 1.0)
        }
        2 => {
            let g = px[0].to_scaled();
            Vec4::new(g, g, g, px[1].to_scaled())
        }
        3 => Vec4::new(px[0].to_scaled(), px[1].to_scaled(), px[2].to_scaled(), 1.0),
        4 => Vec4::new(
            px[0].to_scaled(),
            px[1].to_scaled(),
            px[2].to_scaled(),
            px[3].to_scaled(),
        ),
        _ => Vec4::ZERO,
    }
}

/// Packs a vector back into the samples of one pixel.
///
/// Colour-only layouts drop the alpha component.
#[inline]
pub fn from_vec4<T: ImageDtype, const CHANNELS: usize>(v: Vec4, px: &mut [T]) {
    match CHANNELS {
        1 => px[0] = T::from_scaled(v.x),
        2 => {
            px[0] = T::from_scaled(v.x);
            px[1] = T::from_scaled(v.w);
        }
        3 | 4 => px
            .iter_mut()
            .zip(v.to_array())
            .for_each(|(p, s)| *p = T::from_scaled(s)),
        _ => {}
    }
}
