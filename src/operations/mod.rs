pub mod blur;
pub mod sharpen;
pub mod weighted;

use crate::image::PixelDepth;

/// A channel sample the filters can do arithmetic on.
///
/// All math happens in `f64`; converting back rounds to nearest and saturates
/// for integer samples, and stores floats unclamped.
pub(crate) trait Sample: image::Primitive + bytemuck::Pod {
    const DEPTH: PixelDepth;

    fn widen(self) -> f64;
    fn narrow(value: f64) -> Self;
}

impl Sample for u8 {
    const DEPTH: PixelDepth = PixelDepth::U8;

    fn widen(self) -> f64 {
        f64::from(self)
    }

    fn narrow(value: f64) -> Self {
        // `as` saturates, and maps NaN to 0
        value.round() as u8
    }
}

impl Sample for u16 {
    const DEPTH: PixelDepth = PixelDepth::U16;

    fn widen(self) -> f64 {
        f64::from(self)
    }

    fn narrow(value: f64) -> Self {
        value.round() as u16
    }
}

impl Sample for f32 {
    const DEPTH: PixelDepth = PixelDepth::F32;

    fn widen(self) -> f64 {
        f64::from(self)
    }

    fn narrow(value: f64) -> Self {
        value as f32
    }
}
