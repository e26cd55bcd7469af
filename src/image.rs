use image::{ColorType, DynamicImage, ImageBuffer, Pixel};

use crate::{
    error::{ErrorKind, SharpenError},
    sharpen_err,
    utils::buffer::try_zeroed,
};

/// Storage type of a single channel sample.
///
/// The discriminants are part of the C interface, see `include/sharpen.h`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, strum::FromRepr, strum::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
#[repr(u32)]
pub enum PixelDepth {
    U8 = 0,
    U16 = 1,
    F32 = 2,
}

impl PixelDepth {
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            PixelDepth::U8 => 1,
            PixelDepth::U16 => 2,
            PixelDepth::F32 => 4,
        }
    }
}

/// An owned raster. Dropping it releases the pixel memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub pixels: DynamicImage,
}

impl From<DynamicImage> for Image {
    fn from(pixels: DynamicImage) -> Self {
        Self { pixels }
    }
}

impl Image {
    pub fn new(pixels: DynamicImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Channel count and sample depth, or an error for pixel formats we cannot process.
    pub fn layout(&self) -> Result<(u32, PixelDepth), SharpenError> {
        layout_of(self.pixels.color())
    }

    /// Byte length of one tightly packed row.
    pub fn packed_stride(&self) -> Result<usize, SharpenError> {
        let (channels, depth) = self.layout()?;
        packed_row_len(self.width(), channels, depth)
    }

    /// Tightly packed samples in native byte order.
    pub fn as_bytes(&self) -> &[u8] {
        self.pixels.as_bytes()
    }

    /// Fails unless the image is non-empty and its pixel format is supported.
    pub fn check_well_formed(&self) -> Result<(), SharpenError> {
        if self.width() == 0 || self.height() == 0 {
            return Err(sharpen_err!(
                ErrorKind::InvalidArgument,
                "image must not be empty, got {}x{}",
                self.width(),
                self.height()
            ));
        }
        self.layout().map(|_| ())
    }

    /// Deep copy that reports allocation failure instead of aborting.
    pub fn try_clone(&self) -> Result<Self, SharpenError> {
        let (channels, depth) = self.layout()?;
        let stride = self.packed_stride()?;
        Self::from_bytes(
            self.width(),
            self.height(),
            channels,
            depth,
            stride,
            self.as_bytes(),
        )
    }

    /// Number of bytes a caller-provided buffer with this layout must span:
    /// every row but the last occupies `stride` bytes, the last one only its packed length.
    pub fn required_len(
        width: u32,
        height: u32,
        channels: u32,
        depth: PixelDepth,
        stride: usize,
    ) -> Result<usize, SharpenError> {
        if width == 0 || height == 0 {
            return Err(sharpen_err!(
                ErrorKind::InvalidArgument,
                "image must not be empty, got {width}x{height}"
            ));
        }
        color_type_of(channels, depth)?;
        let row_len = packed_row_len(width, channels, depth)?;
        if stride < row_len {
            return Err(sharpen_err!(
                ErrorKind::InvalidArgument,
                "stride {stride} is shorter than a row of {row_len} bytes"
            ));
        }
        let len = stride
            .checked_mul(height as usize - 1)
            .and_then(|len| len.checked_add(row_len))
            .filter(|len| *len <= isize::MAX as usize)
            .ok_or_else(|| {
                sharpen_err!(
                    ErrorKind::InvalidArgument,
                    "image of {width}x{height} with stride {stride} does not fit in memory"
                )
            })?;
        Ok(len)
    }

    /// Copies a possibly strided buffer into a new image.
    ///
    /// Row padding is skipped, and 16-bit and float samples are read in native byte order
    /// without any alignment requirement on `data`.
    pub fn from_bytes(
        width: u32,
        height: u32,
        channels: u32,
        depth: PixelDepth,
        stride: usize,
        data: &[u8],
    ) -> Result<Self, SharpenError> {
        let required = Self::required_len(width, height, channels, depth, stride)?;
        if data.len() < required {
            return Err(sharpen_err!(
                ErrorKind::InvalidArgument,
                "buffer holds {} bytes, {required} are needed",
                data.len()
            ));
        }
        Self::from_rows(width, height, channels, depth, |y, row| {
            let start = y * stride;
            row.copy_from_slice(&data[start..start + row.len()]);
        })
    }

    /// Allocates a tightly packed image and lets `fill_row` write the bytes of every row,
    /// top to bottom. `fill_row` is only called once the whole image has been allocated.
    pub fn from_rows(
        width: u32,
        height: u32,
        channels: u32,
        depth: PixelDepth,
        mut fill_row: impl FnMut(usize, &mut [u8]),
    ) -> Result<Self, SharpenError> {
        if width == 0 || height == 0 {
            return Err(sharpen_err!(
                ErrorKind::InvalidArgument,
                "image must not be empty, got {width}x{height}"
            ));
        }
        let color = color_type_of(channels, depth)?;
        let row_len = packed_row_len(width, channels, depth)?;
        let (w, h) = (width, height);
        let fill = &mut fill_row;

        use image::DynamicImage::*;
        let pixels = match color {
            ColorType::L8 => ImageLuma8(buffer(w, h, fill_rows(row_len, h, fill)?)?),
            ColorType::La8 => ImageLumaA8(buffer(w, h, fill_rows(row_len, h, fill)?)?),
            ColorType::Rgb8 => ImageRgb8(buffer(w, h, fill_rows(row_len, h, fill)?)?),
            ColorType::Rgba8 => ImageRgba8(buffer(w, h, fill_rows(row_len, h, fill)?)?),
            ColorType::L16 => ImageLuma16(buffer(w, h, fill_rows(row_len, h, fill)?)?),
            ColorType::La16 => ImageLumaA16(buffer(w, h, fill_rows(row_len, h, fill)?)?),
            ColorType::Rgb16 => ImageRgb16(buffer(w, h, fill_rows(row_len, h, fill)?)?),
            ColorType::Rgba16 => ImageRgba16(buffer(w, h, fill_rows(row_len, h, fill)?)?),
            ColorType::Rgb32F => ImageRgb32F(buffer(w, h, fill_rows(row_len, h, fill)?)?),
            ColorType::Rgba32F => ImageRgba32F(buffer(w, h, fill_rows(row_len, h, fill)?)?),
            other => {
                return Err(sharpen_err!(
                    ErrorKind::InvalidArgument,
                    "unsupported pixel format {other:?}"
                ))
            }
        };
        Ok(Self { pixels })
    }
}

fn layout_of(color: ColorType) -> Result<(u32, PixelDepth), SharpenError> {
    let depth = match color {
        ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8 => PixelDepth::U8,
        ColorType::L16 | ColorType::La16 | ColorType::Rgb16 | ColorType::Rgba16 => PixelDepth::U16,
        ColorType::Rgb32F | ColorType::Rgba32F => PixelDepth::F32,
        other => {
            return Err(sharpen_err!(
                ErrorKind::InvalidArgument,
                "unsupported pixel format {other:?}"
            ))
        }
    };
    Ok((u32::from(color.channel_count()), depth))
}

fn color_type_of(channels: u32, depth: PixelDepth) -> Result<ColorType, SharpenError> {
    match (channels, depth) {
        (1, PixelDepth::U8) => Ok(ColorType::L8),
        (2, PixelDepth::U8) => Ok(ColorType::La8),
        (3, PixelDepth::U8) => Ok(ColorType::Rgb8),
        (4, PixelDepth::U8) => Ok(ColorType::Rgba8),
        (1, PixelDepth::U16) => Ok(ColorType::L16),
        (2, PixelDepth::U16) => Ok(ColorType::La16),
        (3, PixelDepth::U16) => Ok(ColorType::Rgb16),
        (4, PixelDepth::U16) => Ok(ColorType::Rgba16),
        (3, PixelDepth::F32) => Ok(ColorType::Rgb32F),
        (4, PixelDepth::F32) => Ok(ColorType::Rgba32F),
        (channels, depth) => {
            let depth: &'static str = depth.into();
            Err(sharpen_err!(
                ErrorKind::InvalidArgument,
                "unsupported layout: {channels} channel(s) of {depth}"
            ))
        }
    }
}

fn packed_row_len(width: u32, channels: u32, depth: PixelDepth) -> Result<usize, SharpenError> {
    (width as usize)
        .checked_mul(channels as usize)
        .and_then(|samples| samples.checked_mul(depth.bytes_per_sample()))
        .ok_or_else(|| sharpen_err!(ErrorKind::InvalidArgument, "row of {width} pixels is too long"))
}

/// Allocates `height` packed rows of `row_len` bytes and fills them through `fill_row`.
fn fill_rows<S: bytemuck::Pod>(
    row_len: usize,
    height: u32,
    fill_row: &mut impl FnMut(usize, &mut [u8]),
) -> Result<Vec<S>, SharpenError> {
    let len = (row_len / std::mem::size_of::<S>())
        .checked_mul(height as usize)
        .ok_or_else(|| sharpen_err!(ErrorKind::InvalidArgument, "image is too large"))?;
    let mut samples: Vec<S> = try_zeroed(len)?;
    let dst: &mut [u8] = bytemuck::cast_slice_mut(&mut samples);
    for (y, dst_row) in dst.chunks_exact_mut(row_len).enumerate() {
        fill_row(y, dst_row);
    }
    Ok(samples)
}

fn buffer<P: Pixel>(
    width: u32,
    height: u32,
    samples: Vec<P::Subpixel>,
) -> Result<ImageBuffer<P, Vec<P::Subpixel>>, SharpenError> {
    ImageBuffer::from_raw(width, height, samples).ok_or_else(|| {
        sharpen_err!(
            ErrorKind::InvalidArgument,
            "sample count does not match {width}x{height}"
        )
    })
}
