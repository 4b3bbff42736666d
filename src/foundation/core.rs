//! Shared value types for frames, sizes, and frame rates.

use crate::foundation::error::{MorphError, MorphResult};

/// Base canvas dimensions in pixels.
///
/// Every frame of one morph job shares a single `FrameSize`; both source
/// images are normalized to it before correspondence detection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameSize {
    /// Create a validated size with non-zero dimensions.
    pub fn new(width: u32, height: u32) -> MorphResult<Self> {
        if width == 0 || height == 0 {
            return Err(MorphError::validation("frame size must be non-zero"));
        }
        Ok(Self { width, height })
    }

    /// Number of pixels in one frame.
    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> MorphResult<Self> {
        if num == 0 || den == 0 {
            return Err(MorphError::validation("fps num/den must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }
}

/// A produced frame as RGB8 pixels, tightly packed, row-major.
///
/// Frames are immutable once produced: the sequencer creates them, the encoder
/// and the attention aggregator only read them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRgb {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGB8 bytes, `width * height * 3` long.
    pub data: Vec<u8>,
}

impl FrameRgb {
    /// Create a frame from raw RGB8 bytes, validating the buffer length.
    pub fn from_raw(size: FrameSize, data: Vec<u8>) -> MorphResult<Self> {
        if data.len() != size.pixel_count() * 3 {
            return Err(MorphError::validation(format!(
                "frame buffer size mismatch: got {} bytes, expected {}",
                data.len(),
                size.pixel_count() * 3
            )));
        }
        Ok(Self {
            width: size.width,
            height: size.height,
            data,
        })
    }

    /// The frame's size.
    pub fn size(&self) -> FrameSize {
        FrameSize {
            width: self.width,
            height: self.height,
        }
    }
}

/// Floating-point RGB accumulation surface used during warping and blending.
///
/// Channel values live in `[0, 255]` but are only clamped when the surface is
/// emitted as a [`FrameRgb`], so the 100+ per-triangle compositing passes of a
/// morph step never band through intermediate quantization.
#[derive(Clone, Debug)]
pub struct FramePlanes {
    /// Surface width in pixels.
    pub width: u32,
    /// Surface height in pixels.
    pub height: u32,
    /// RGB f32 triplets, row-major, `width * height * 3` long.
    pub data: Vec<f32>,
}

impl FramePlanes {
    /// Create a zeroed surface.
    pub fn zeroed(size: FrameSize) -> Self {
        Self {
            width: size.width,
            height: size.height,
            data: vec![0.0; size.pixel_count() * 3],
        }
    }

    /// Lift an RGB8 frame into floating point.
    pub fn from_frame(frame: &FrameRgb) -> Self {
        Self {
            width: frame.width,
            height: frame.height,
            data: frame.data.iter().map(|&b| f32::from(b)).collect(),
        }
    }

    /// Clamp to `[0, 255]` and quantize into a [`FrameRgb`].
    pub fn to_frame(&self) -> FrameRgb {
        FrameRgb {
            width: self.width,
            height: self.height,
            data: self
                .data
                .iter()
                .map(|&v| crate::foundation::math::clamp_to_u8(v))
                .collect(),
        }
    }

    /// Read one RGB pixel. Coordinates must be in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [f32; 3] {
        let base = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[base], self.data[base + 1], self.data[base + 2]]
    }

    /// Write one RGB pixel. Coordinates must be in bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: [f32; 3]) {
        let base = (y as usize * self.width as usize + x as usize) * 3;
        self.data[base] = rgb[0];
        self.data[base + 1] = rgb[1];
        self.data[base + 2] = rgb[2];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_size_rejects_zero() {
        assert!(FrameSize::new(0, 320).is_err());
        assert!(FrameSize::new(320, 0).is_err());
        assert!(FrameSize::new(320, 320).is_ok());
    }

    #[test]
    fn fps_rejects_zero_parts() {
        assert!(Fps::new(30, 0).is_err());
        assert!(Fps::new(0, 1).is_err());
        assert_eq!(Fps::new(30, 1).unwrap().as_f64(), 30.0);
    }

    #[test]
    fn from_raw_checks_length() {
        let size = FrameSize::new(2, 2).unwrap();
        assert!(FrameRgb::from_raw(size, vec![0; 12]).is_ok());
        assert!(FrameRgb::from_raw(size, vec![0; 11]).is_err());
    }

    #[test]
    fn planes_round_trip_and_clamp() {
        let size = FrameSize::new(2, 1).unwrap();
        let frame = FrameRgb::from_raw(size, vec![0, 128, 255, 1, 2, 3]).unwrap();
        let mut planes = FramePlanes::from_frame(&frame);
        assert_eq!(planes.to_frame(), frame);

        planes.set_pixel(0, 0, [-5.0, 300.0, 127.4]);
        let out = planes.to_frame();
        assert_eq!(&out.data[..3], &[0, 255, 127]);
    }
}
