/// Clamp a floating-point channel value into `[0, 255]` and round to `u8`.
pub(crate) fn clamp_to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Linear interpolation `a*(1-t) + b*t`.
pub(crate) fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// Interpolation parameter for frame `i` of `total` frames.
///
/// `total == 1` is defined as `t = 0` (no division by zero, single frame
/// reproduces image A).
pub(crate) fn step_parameter(i: usize, total: usize) -> f32 {
    if total <= 1 {
        0.0
    } else {
        i as f32 / (total - 1) as f32
    }
}
