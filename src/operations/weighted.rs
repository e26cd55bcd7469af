use image::{DynamicImage, ImageBuffer, Pixel};

use crate::{
    error::{ErrorKind, SharpenError},
    image::Image,
    operations::Sample,
    sharpen_err,
    utils::buffer::try_with_capacity,
};

/// Computes `a * alpha + b * beta + gamma` for every sample.
///
/// Both images must have the same dimensions and pixel format.
/// Integer results are rounded to nearest and saturated, float results are left unclamped.
pub fn add_weighted(
    a: &Image,
    alpha: f64,
    b: &Image,
    beta: f64,
    gamma: f64,
) -> Result<Image, SharpenError> {
    if (a.width(), a.height()) != (b.width(), b.height()) {
        return Err(sharpen_err!(
            ErrorKind::InvalidArgument,
            "cannot combine a {}x{} image with a {}x{} image",
            a.width(),
            a.height(),
            b.width(),
            b.height()
        ));
    }
    let weights = Weights { alpha, beta, gamma };

    use image::DynamicImage::*;
    let pixels = match (&a.pixels, &b.pixels) {
        (ImageLuma8(a), ImageLuma8(b)) => ImageLuma8(combine(a, b, weights)?),
        (ImageLumaA8(a), ImageLumaA8(b)) => ImageLumaA8(combine(a, b, weights)?),
        (ImageRgb8(a), ImageRgb8(b)) => ImageRgb8(combine(a, b, weights)?),
        (ImageRgba8(a), ImageRgba8(b)) => ImageRgba8(combine(a, b, weights)?),
        (ImageLuma16(a), ImageLuma16(b)) => ImageLuma16(combine(a, b, weights)?),
        (ImageLumaA16(a), ImageLumaA16(b)) => ImageLumaA16(combine(a, b, weights)?),
        (ImageRgb16(a), ImageRgb16(b)) => ImageRgb16(combine(a, b, weights)?),
        (ImageRgba16(a), ImageRgba16(b)) => ImageRgba16(combine(a, b, weights)?),
        (ImageRgb32F(a), ImageRgb32F(b)) => ImageRgb32F(combine(a, b, weights)?),
        (ImageRgba32F(a), ImageRgba32F(b)) => ImageRgba32F(combine(a, b, weights)?),
        (a, b) => {
            return Err(sharpen_err!(
                ErrorKind::InvalidArgument,
                "cannot combine {:?} with {:?}",
                DynamicImage::color(a),
                DynamicImage::color(b)
            ))
        }
    };
    Ok(Image::new(pixels))
}

#[derive(Debug, Copy, Clone)]
struct Weights {
    alpha: f64,
    beta: f64,
    gamma: f64,
}

fn combine<P>(
    a: &ImageBuffer<P, Vec<P::Subpixel>>,
    b: &ImageBuffer<P, Vec<P::Subpixel>>,
    weights: Weights,
) -> Result<ImageBuffer<P, Vec<P::Subpixel>>, SharpenError>
where
    P: Pixel,
    P::Subpixel: Sample,
{
    let Weights { alpha, beta, gamma } = weights;
    let mut samples = try_with_capacity(a.as_raw().len())?;
    samples.extend(a.as_raw().iter().zip(b.as_raw().iter()).map(|(&a, &b)| {
        <P::Subpixel as Sample>::narrow(a.widen() * alpha + b.widen() * beta + gamma)
    }));
    let (width, height) = a.dimensions();
    ImageBuffer::from_raw(width, height, samples).ok_or_else(|| {
        sharpen_err!(
            ErrorKind::InvalidArgument,
            "sample count does not match {width}x{height}"
        )
    })
}
