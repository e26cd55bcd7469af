use log::debug;

use crate::{
    error::SharpenError,
    image::Image,
    operations::{blur::gaussian_blur, weighted::add_weighted},
    options::SharpenOptions,
};

/// Unsharp mask: boosts the image by `amount` percent and subtracts the same share of a
/// Gaussian-blurred copy, which amplifies edges and fine detail.
///
/// `radius` is the blur sigma; `0.0` picks a small kernel automatically.
/// The input is left untouched and the result is a new image with the same layout.
///
/// This is not idempotent: sharpening an already sharpened image sharpens it further.
pub fn sharpen(image: &Image, amount: i32, radius: f64) -> Result<Image, SharpenError> {
    image.sharpen(&SharpenOptions::new(amount, radius)?)
}

impl Image {
    pub fn sharpen(&self, options: &SharpenOptions) -> Result<Image, SharpenError> {
        options.validate()?;
        self.check_well_formed()?;
        debug!(
            "sharpening {}x{} {:?} image, amount {}%, radius {}",
            self.width(),
            self.height(),
            self.pixels.color(),
            options.amount,
            options.radius
        );

        if options.is_noop() {
            return self.try_clone();
        }
        let fraction = options.fraction();
        let blurred = gaussian_blur(self, options.radius)?;
        add_weighted(self, 1.0 + fraction, &blurred, -fraction, 0.0)
    }
}
