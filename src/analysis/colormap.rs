//! Attention-heatmap colorization and overlay rendering.

use crate::foundation::core::{FrameRgb, FrameSize};
use crate::foundation::math::clamp_to_u8;

use super::model::AttentionMap;

/// Map a normalized importance score to a jet-style color ramp
/// (blue -> cyan -> green -> yellow -> red), channels in `[0, 255]`.
pub fn jet(v: f32) -> [f32; 3] {
    let v = v.clamp(0.0, 1.0);
    let r = (1.5 - (4.0 * v - 3.0).abs()).clamp(0.0, 1.0);
    let g = (1.5 - (4.0 * v - 2.0).abs()).clamp(0.0, 1.0);
    let b = (1.5 - (4.0 * v - 1.0).abs()).clamp(0.0, 1.0);
    [r * 255.0, g * 255.0, b * 255.0]
}

/// Bilinearly resize an attention map to the target frame size.
pub fn resize_bilinear(map: &AttentionMap, size: FrameSize) -> AttentionMap {
    let mut data = Vec::with_capacity(size.pixel_count());
    let sx = if size.width > 1 {
        (map.width.saturating_sub(1)) as f32 / (size.width - 1) as f32
    } else {
        0.0
    };
    let sy = if size.height > 1 {
        (map.height.saturating_sub(1)) as f32 / (size.height - 1) as f32
    } else {
        0.0
    };

    for y in 0..size.height {
        let v = y as f32 * sy;
        let iv0 = v.floor() as u32;
        let iv1 = (iv0 + 1).min(map.height - 1);
        let fv = v - iv0 as f32;
        for x in 0..size.width {
            let u = x as f32 * sx;
            let iu0 = u.floor() as u32;
            let iu1 = (iu0 + 1).min(map.width - 1);
            let fu = u - iu0 as f32;

            let at = |cx: u32, cy: u32| map.data[(cy * map.width + cx) as usize];
            let top = at(iu0, iv0) * (1.0 - fu) + at(iu1, iv0) * fu;
            let bottom = at(iu0, iv1) * (1.0 - fu) + at(iu1, iv1) * fu;
            data.push(top * (1.0 - fv) + bottom * fv);
        }
    }

    AttentionMap {
        width: size.width,
        height: size.height,
        data,
    }
}

/// Blend a frame 50/50 with the jet-colored heatmap.
///
/// `map` must already be at frame resolution.
pub fn overlay_heatmap(frame: &FrameRgb, map: &AttentionMap) -> FrameRgb {
    debug_assert_eq!((map.width, map.height), (frame.width, frame.height));

    let mut data = Vec::with_capacity(frame.data.len());
    for (i, &score) in map.data.iter().enumerate() {
        let color = jet(score);
        let base = i * 3;
        for c in 0..3 {
            let blended = 0.5 * f32::from(frame.data[base + c]) + 0.5 * color[c];
            data.push(clamp_to_u8(blended));
        }
    }

    FrameRgb {
        width: frame.width,
        height: frame.height,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jet_endpoints_are_blue_and_red() {
        let low = jet(0.0);
        let high = jet(1.0);
        assert!(low[2] > 100.0 && low[0] == 0.0 && low[1] == 0.0);
        assert!(high[0] > 100.0 && high[2] == 0.0 && high[1] == 0.0);
    }

    #[test]
    fn resize_preserves_corner_values() {
        let map = AttentionMap::new(2, 2, vec![0.0, 1.0, 0.25, 0.75]).unwrap();
        let out = resize_bilinear(&map, FrameSize::new(4, 4).unwrap());
        assert_eq!(out.data.len(), 16);
        assert!((out.data[0] - 0.0).abs() < 1e-6);
        assert!((out.data[3] - 1.0).abs() < 1e-6);
        assert!((out.data[12] - 0.25).abs() < 1e-6);
        assert!((out.data[15] - 0.75).abs() < 1e-6);
    }

    #[test]
    fn overlay_mixes_frame_and_heat_equally() {
        let size = FrameSize::new(1, 1).unwrap();
        let frame = FrameRgb::from_raw(size, vec![100, 100, 100]).unwrap();
        let map = AttentionMap::new(1, 1, vec![1.0]).unwrap();
        let out = overlay_heatmap(&frame, &map);
        // 0.5*100 + 0.5*jet(1.0)
        let expect = jet(1.0);
        for c in 0..3 {
            assert_eq!(out.data[c], clamp_to_u8(50.0 + 0.5 * expect[c]));
        }
    }
}
