use glam::{Vec4, Vec4Swizzles};

/// Scales the colour components of `v` by its alpha.
#[inline]
pub fn premultiply(v: Vec4) -> Vec4 {
    (v.xyz() * v.w).extend(v.w)
}

/// Reverses [`premultiply`].
///
/// A non-positive alpha yields fully transparent black.
#[inline]
pub fn unpremultiply(v: Vec4) -> Vec4 {
    if v.w <= 0.0 {
        return Vec4::ZERO;
    }
    (v.xyz() / v.w).extend(v.w)
}
