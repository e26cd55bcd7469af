use std::str::FromStr;

use crate::{
    error::{ErrorKind, SharpenError},
    sharpen_err,
};

#[cfg(test)]
use crate::utils::arbitrary;
#[cfg(test)]
use quickcheck::Arbitrary;

/// Strongest accepted sharpening, in percent.
pub const MAX_AMOUNT: i32 = 1000;
/// Widest accepted blur sigma. Kernels grow linearly with it.
pub const MAX_RADIUS: f64 = 250.0;

/// Strength and blur radius of an unsharp mask.
///
/// The zero value performs no sharpening at all.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct SharpenOptions {
    /// Strength in percent: 100 adds the full high-frequency detail back once more.
    pub amount: i32,
    /// Gaussian sigma; `0.0` picks a small kernel automatically.
    pub radius: f64,
}

#[cfg(test)]
impl Arbitrary for SharpenOptions {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        Self {
            amount: arbitrary::amount(g),
            radius: arbitrary::radius(g),
        }
    }
}

impl SharpenOptions {
    /// Validated options.
    pub fn new(amount: i32, radius: f64) -> Result<Self, SharpenError> {
        let options = Self { amount, radius };
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), SharpenError> {
        if !(0..=MAX_AMOUNT).contains(&self.amount) {
            return Err(sharpen_err!(
                ErrorKind::InvalidArgument,
                "amount must be between 0 and {MAX_AMOUNT}, got {}",
                self.amount
            ));
        }
        validate_radius(self.radius)
    }

    pub fn is_noop(&self) -> bool {
        self.amount == 0
    }

    /// `amount` as a fraction, i.e. the weight of the subtracted blur.
    pub fn fraction(&self) -> f64 {
        f64::from(self.amount) / 100.0
    }
}

pub(crate) fn validate_radius(radius: f64) -> Result<(), SharpenError> {
    // NaN fails the range check too
    if !(0.0..=MAX_RADIUS).contains(&radius) {
        return Err(sharpen_err!(
            ErrorKind::InvalidArgument,
            "radius must be between 0 and {MAX_RADIUS}, got {radius}"
        ));
    }
    Ok(())
}

/// Parses `AMOUNT`, `AMOUNTxRADIUS` or `xRADIUS`, e.g. `150x1.5`.
impl FromStr for SharpenOptions {
    type Err = SharpenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || sharpen_err!(ErrorKind::InvalidArgument, "invalid sharpen geometry: {s}");
        if !s.is_ascii() || s.trim().is_empty() {
            return Err(invalid());
        }

        let parts: Vec<&str> = s.split('x').collect();
        let options = match parts.as_slice() {
            [amount] => Self {
                amount: amount.trim().parse().map_err(|_| invalid())?,
                ..Default::default()
            },
            [amount, radius] => {
                let amount = if amount.trim().is_empty() {
                    0
                } else {
                    amount.trim().parse().map_err(|_| invalid())?
                };
                Self {
                    amount,
                    radius: radius.trim().parse().map_err(|_| invalid())?,
                }
            }
            _ => return Err(invalid()),
        };
        options.validate()?;
        Ok(options)
    }
}
