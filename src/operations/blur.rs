use image::{DynamicImage, ImageBuffer, Pixel};

use crate::{
    error::{ErrorKind, SharpenError},
    image::{Image, PixelDepth},
    operations::Sample,
    options::validate_radius,
    sharpen_err,
    utils::buffer::{try_with_capacity, try_zeroed},
};

/// Kernel size used when the caller asks for an automatic radius.
pub const AUTO_KERNEL_SIZE: usize = 3;

/// Normalized one-dimensional Gaussian weights.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianKernel {
    sigma: f64,
    weights: Vec<f64>,
}

impl GaussianKernel {
    /// Kernel for 8-bit samples, see [GaussianKernel::for_depth].
    pub fn new(sigma: f64) -> Result<Self, SharpenError> {
        Self::for_depth(sigma, PixelDepth::U8)
    }

    /// `sigma == 0.0` selects a 3-tap kernel with the sigma that fits it.
    /// Otherwise the kernel spans three sigmas on either side for 8-bit samples
    /// and four for deeper ones.
    pub fn for_depth(sigma: f64, depth: PixelDepth) -> Result<Self, SharpenError> {
        validate_radius(sigma)?;
        let (sigma, size) = if sigma == 0.0 {
            (sigma_for_size(AUTO_KERNEL_SIZE), AUTO_KERNEL_SIZE)
        } else {
            (sigma, size_for_sigma(sigma, depth))
        };

        let center = size / 2;
        // sigma^2 underflows to zero for tiny radii, the center tap must not depend on it
        let scale = -0.5 / (sigma * sigma);
        let mut weights: Vec<f64> = try_with_capacity(size)?;
        weights.extend((0..size).map(|i| {
            if i == center {
                return 1.0;
            }
            let offset = i as f64 - center as f64;
            (scale * offset * offset).exp()
        }));
        let sum: f64 = weights.iter().sum();
        weights.iter_mut().for_each(|w| *w /= sum);

        Ok(Self { sigma, weights })
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Number of taps, always odd.
    pub fn size(&self) -> usize {
        self.weights.len()
    }

    /// Taps on either side of the center one.
    pub fn half_width(&self) -> usize {
        self.weights.len() / 2
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

fn size_for_sigma(sigma: f64, depth: PixelDepth) -> usize {
    let sigmas_per_side = match depth {
        PixelDepth::U8 => 3.0,
        PixelDepth::U16 | PixelDepth::F32 => 4.0,
    };
    ((sigma * sigmas_per_side * 2.0 + 1.0).round() as usize) | 1
}

fn sigma_for_size(size: usize) -> f64 {
    0.3 * ((size as f64 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Mirrors out-of-range indices without repeating the edge sample: `cba|abc|cba` becomes `cb|abc|ba`.
/// Folds as many times as needed for kernels wider than the image.
pub(crate) fn reflect_101(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let folded = index.rem_euclid(period);
    if folded < len as isize {
        folded as usize
    } else {
        (period - folded) as usize
    }
}

/// Gaussian-blurs every channel (alpha included) of the image.
///
/// The kernel is sized for the image's sample depth, see [GaussianKernel::for_depth].
/// The result has the same dimensions and pixel format as the input.
pub fn gaussian_blur(image: &Image, sigma: f64) -> Result<Image, SharpenError> {
    image.check_well_formed()?;
    validate_radius(sigma)?;

    use image::DynamicImage::*;
    let pixels = match &image.pixels {
        ImageLuma8(buf) => ImageLuma8(blur_buffer(buf, sigma)?),
        ImageLumaA8(buf) => ImageLumaA8(blur_buffer(buf, sigma)?),
        ImageRgb8(buf) => ImageRgb8(blur_buffer(buf, sigma)?),
        ImageRgba8(buf) => ImageRgba8(blur_buffer(buf, sigma)?),
        ImageLuma16(buf) => ImageLuma16(blur_buffer(buf, sigma)?),
        ImageLumaA16(buf) => ImageLumaA16(blur_buffer(buf, sigma)?),
        ImageRgb16(buf) => ImageRgb16(blur_buffer(buf, sigma)?),
        ImageRgba16(buf) => ImageRgba16(blur_buffer(buf, sigma)?),
        ImageRgb32F(buf) => ImageRgb32F(blur_buffer(buf, sigma)?),
        ImageRgba32F(buf) => ImageRgba32F(blur_buffer(buf, sigma)?),
        other => {
            return Err(sharpen_err!(
                ErrorKind::InvalidArgument,
                "unsupported pixel format {:?}",
                DynamicImage::color(other)
            ))
        }
    };
    Ok(Image::new(pixels))
}

fn blur_buffer<P>(
    input: &ImageBuffer<P, Vec<P::Subpixel>>,
    sigma: f64,
) -> Result<ImageBuffer<P, Vec<P::Subpixel>>, SharpenError>
where
    P: Pixel,
    P::Subpixel: Sample,
{
    let kernel = GaussianKernel::for_depth(sigma, <P::Subpixel as Sample>::DEPTH)?;
    let (width, height) = input.dimensions();
    let samples = blur_samples(
        input.as_raw(),
        width as usize,
        height as usize,
        usize::from(P::CHANNEL_COUNT),
        &kernel,
    )?;
    ImageBuffer::from_raw(width, height, samples).ok_or_else(|| {
        sharpen_err!(
            ErrorKind::InvalidArgument,
            "sample count does not match {width}x{height}"
        )
    })
}

/// Separable convolution over interleaved samples: rows first into an `f64` scratch buffer,
/// then columns into the output.
fn blur_samples<S: Sample>(
    src: &[S],
    width: usize,
    height: usize,
    channels: usize,
    kernel: &GaussianKernel,
) -> Result<Vec<S>, SharpenError> {
    let half = kernel.half_width() as isize;
    let weights = kernel.weights();
    let row_len = width * channels;

    let mut horizontal: Vec<f64> = try_zeroed(src.len())?;
    for (src_row, dst_row) in src.chunks_exact(row_len).zip(horizontal.chunks_exact_mut(row_len)) {
        for x in 0..width {
            for c in 0..channels {
                let mut acc = 0.0;
                for (k, weight) in weights.iter().enumerate() {
                    let sx = reflect_101(x as isize + k as isize - half, width);
                    acc += weight * src_row[sx * channels + c].widen();
                }
                dst_row[x * channels + c] = acc;
            }
        }
    }

    let mut output: Vec<S> = try_zeroed(src.len())?;
    for (y, dst_row) in output.chunks_exact_mut(row_len).enumerate() {
        for (i, dst) in dst_row.iter_mut().enumerate() {
            let mut acc = 0.0;
            for (k, weight) in weights.iter().enumerate() {
                let sy = reflect_101(y as isize + k as isize - half, height);
                acc += weight * horizontal[sy * row_len + i];
            }
            *dst = S::narrow(acc);
        }
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::arbitrary::TestImage;
    use image::{GrayImage, Luma, Rgb, Rgb32FImage};
    use quickcheck_macros::quickcheck;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-12, "{a} != {b}");
    }

    #[test]
    fn test_kernel_is_normalized_and_symmetric() {
        for sigma in [0.0, 0.3, 1.0, 2.5, 17.0] {
            let kernel = GaussianKernel::new(sigma).unwrap();
            assert_eq!(kernel.size() % 2, 1);
            assert_close(kernel.weights().iter().sum(), 1.0);
            let weights = kernel.weights();
            for i in 0..kernel.half_width() {
                assert_close(weights[i], weights[weights.len() - 1 - i]);
                assert!(weights[i] < weights[i + 1]);
            }
        }
    }

    #[test]
    fn test_kernel_size_follows_sigma() {
        assert_eq!(GaussianKernel::new(1.0).unwrap().size(), 7);
        assert_eq!(GaussianKernel::new(0.5).unwrap().size(), 5);
        assert_eq!(GaussianKernel::new(2.0).unwrap().size(), 13);
        assert_eq!(GaussianKernel::new(0.01).unwrap().size(), 1);
    }

    #[test]
    fn test_deeper_samples_get_wider_kernels() {
        for depth in [PixelDepth::U16, PixelDepth::F32] {
            assert_eq!(GaussianKernel::for_depth(1.0, depth).unwrap().size(), 9);
            assert_eq!(GaussianKernel::for_depth(0.5, depth).unwrap().size(), 5);
            assert_eq!(GaussianKernel::for_depth(2.0, depth).unwrap().size(), 17);
            assert_eq!(GaussianKernel::for_depth(0.0, depth).unwrap().size(), AUTO_KERNEL_SIZE);
        }
        assert_eq!(
            GaussianKernel::for_depth(2.0, PixelDepth::U8).unwrap(),
            GaussianKernel::new(2.0).unwrap()
        );
    }

    #[test]
    fn test_tiny_sigma_is_the_identity_kernel() {
        for sigma in [1e-200, 1e-160, f64::MIN_POSITIVE, 5e-324, 0.05] {
            for depth in [PixelDepth::U8, PixelDepth::F32] {
                let kernel = GaussianKernel::for_depth(sigma, depth).unwrap();
                assert_eq!(kernel.weights(), &[1.0], "sigma {sigma:e}");
            }
        }
    }

    #[test]
    fn test_tiny_sigma_leaves_images_alone() {
        let buf = Rgb32FImage::from_fn(5, 3, |x, y| Rgb([x as f32 * 0.1, y as f32, -0.5]));
        let image = Image::new(DynamicImage::ImageRgb32F(buf));
        assert_eq!(gaussian_blur(&image, 1e-200).unwrap(), image);
    }

    #[test]
    fn test_automatic_kernel() {
        let kernel = GaussianKernel::new(0.0).unwrap();
        assert_eq!(kernel.size(), AUTO_KERNEL_SIZE);
        assert_close(kernel.sigma(), 0.8);
        let expected_edge = (-0.5f64 / 0.64).exp() / (1.0 + 2.0 * (-0.5f64 / 0.64).exp());
        assert_close(kernel.weights()[0], expected_edge);
    }

    #[test]
    fn test_kernel_rejects_bad_sigma() {
        for sigma in [-1.0, f64::NAN, f64::INFINITY, 1e6] {
            let err = GaussianKernel::new(sigma).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
    }

    #[test]
    fn test_reflect_101() {
        let mapped: Vec<usize> = (-4..9).map(|i| reflect_101(i, 5)).collect();
        assert_eq!(mapped, vec![4, 3, 2, 1, 0, 1, 2, 3, 4, 3, 2, 1, 0]);
        assert_eq!(reflect_101(-7, 1), 0);
        assert_eq!(reflect_101(5, 2), 1);
        assert_eq!(reflect_101(-1, 2), 1);
    }

    #[test]
    fn test_flat_image_is_unchanged() {
        let image = Image::new(DynamicImage::ImageLuma8(GrayImage::from_pixel(7, 5, Luma([93]))));
        for sigma in [0.0, 0.7, 3.0, 40.0] {
            assert_eq!(gaussian_blur(&image, sigma).unwrap(), image);
        }
    }

    #[test]
    fn test_impulse_spreads_by_kernel_weights() {
        let mut buf = GrayImage::new(9, 9);
        buf.put_pixel(4, 4, Luma([200]));
        let image = Image::new(DynamicImage::ImageLuma8(buf));
        let blurred = gaussian_blur(&image, 1.0).unwrap();
        let blurred = blurred.pixels.as_luma8().unwrap();

        let w = GaussianKernel::new(1.0).unwrap().weights().to_vec();
        let at = |dx: usize, dy: usize| (200.0 * w[3 - dx] * w[3 - dy]).round() as u8;
        assert_eq!(blurred.get_pixel(4, 4).0[0], at(0, 0));
        assert_eq!(blurred.get_pixel(5, 4).0[0], at(1, 0));
        assert_eq!(blurred.get_pixel(3, 5).0[0], at(1, 1));
        assert_eq!(blurred.get_pixel(4, 6).0[0], at(0, 2));
        assert_eq!(blurred.get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn test_rejects_empty_image() {
        let image = Image::new(DynamicImage::new_rgb8(0, 3));
        let err = gaussian_blur(&image, 1.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[quickcheck]
    fn blur_preserves_layout(image: TestImage, sigma: u8) -> bool {
        let image = image.0;
        let blurred = gaussian_blur(&image, f64::from(sigma % 20) / 4.0).unwrap();
        blurred.pixels.color() == image.pixels.color()
            && blurred.width() == image.width()
            && blurred.height() == image.height()
    }
}
