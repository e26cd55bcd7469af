//! Helper functions for using `quickcheck`'s `Arbitrary` trait

use image::{DynamicImage, ImageBuffer};
use quickcheck::Arbitrary;

use crate::{
    image::Image,
    options::{MAX_AMOUNT, MAX_RADIUS},
};

/// Small rasters of every supported pixel format with random content.
#[derive(Debug, Clone)]
pub struct TestImage(pub Image);

impl Arbitrary for TestImage {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        let width = small_dimension(g);
        let height = small_dimension(g);
        let pixels = match u8::arbitrary(g) % 6 {
            0 => DynamicImage::ImageLuma8(ImageBuffer::from_fn(width, height, |_, _| {
                image::Luma([u8::arbitrary(g)])
            })),
            1 => DynamicImage::ImageLumaA8(ImageBuffer::from_fn(width, height, |_, _| {
                image::LumaA([u8::arbitrary(g), u8::arbitrary(g)])
            })),
            2 => DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |_, _| {
                image::Rgb([u8::arbitrary(g), u8::arbitrary(g), u8::arbitrary(g)])
            })),
            3 => DynamicImage::ImageRgba8(ImageBuffer::from_fn(width, height, |_, _| {
                image::Rgba([
                    u8::arbitrary(g),
                    u8::arbitrary(g),
                    u8::arbitrary(g),
                    u8::arbitrary(g),
                ])
            })),
            4 => DynamicImage::ImageLuma16(ImageBuffer::from_fn(width, height, |_, _| {
                image::Luma([u16::arbitrary(g)])
            })),
            _ => DynamicImage::ImageRgb32F(ImageBuffer::from_fn(width, height, |_, _| {
                image::Rgb([unit_float(g), unit_float(g), unit_float(g)])
            })),
        };
        Self(Image::new(pixels))
    }
}

/// A single color over the whole raster, in one of the supported pixel formats.
#[derive(Debug, Clone)]
pub struct FlatImage(pub Image);

impl Arbitrary for FlatImage {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        let width = small_dimension(g);
        let height = small_dimension(g);
        let pixels = match u8::arbitrary(g) % 5 {
            0 => DynamicImage::ImageLuma8(ImageBuffer::from_pixel(
                width,
                height,
                image::Luma([u8::arbitrary(g)]),
            )),
            1 => DynamicImage::ImageRgba8(ImageBuffer::from_pixel(
                width,
                height,
                image::Rgba([u8::arbitrary(g), u8::arbitrary(g), u8::arbitrary(g), u8::arbitrary(g)]),
            )),
            2 => DynamicImage::ImageLumaA16(ImageBuffer::from_pixel(
                width,
                height,
                image::LumaA([u16::arbitrary(g), u16::arbitrary(g)]),
            )),
            3 => DynamicImage::ImageRgb32F(ImageBuffer::from_pixel(
                width,
                height,
                image::Rgb([unit_float(g), unit_float(g), unit_float(g)]),
            )),
            _ => DynamicImage::ImageRgba32F(ImageBuffer::from_pixel(
                width,
                height,
                image::Rgba([unit_float(g), unit_float(g), unit_float(g), unit_float(g)]),
            )),
        };
        Self(Image::new(pixels))
    }
}

/// Any radius the options accept, with extra weight on the extremes:
/// zero, subnormals, tiny values whose square underflows, and the upper bound.
#[derive(Debug, Clone, Copy)]
pub struct AnyRadius(pub f64);

impl Arbitrary for AnyRadius {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        let radius = match u8::arbitrary(g) % 8 {
            0 => 0.0,
            1 => f64::from_bits(u64::arbitrary(g) % f64::MIN_POSITIVE.to_bits()),
            2 => 10f64.powi(-i32::from(u8::arbitrary(g) % 200) - 100),
            3 => MAX_RADIUS,
            _ => f64::from(u32::arbitrary(g)) / f64::from(u32::MAX) * MAX_RADIUS,
        };
        Self(radius)
    }
}

#[must_use]
pub fn small_dimension(gen: &mut quickcheck::Gen) -> u32 {
    u32::arbitrary(gen) % 12 + 1
}

#[must_use]
pub fn amount(gen: &mut quickcheck::Gen) -> i32 {
    (u32::arbitrary(gen) % (MAX_AMOUNT as u32 + 1)) as i32
}

/// Mostly modest radii, with an occasional automatic one.
#[must_use]
pub fn radius(gen: &mut quickcheck::Gen) -> f64 {
    if u8::arbitrary(gen) % 8 == 0 {
        0.0
    } else {
        f64::from(u16::arbitrary(gen) % 800 + 1) / 100.0
    }
}

#[must_use]
pub fn unit_float(gen: &mut quickcheck::Gen) -> f32 {
    f32::from(u16::arbitrary(gen)) / f32::from(u16::MAX)
}
