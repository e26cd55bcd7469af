#![no_main]

use std::num::NonZeroU8;

use arbitrary::Unstructured;
use libfuzzer_sys::fuzz_target;
use sharpen::ffi::{
    self, RawImage, SHARPEN_DEPTH_F32, SHARPEN_DEPTH_U16, SHARPEN_DEPTH_U8, SHARPEN_OK,
};

/// Arbitrary raster with some row padding: 1 to 4 channels of 8 or 16 bit samples,
/// or 3 to 4 channels of floats (any bit pattern, NaN and infinities included).
#[derive(Debug)]
struct StructuredImage {
    width: NonZeroU8,
    height: NonZeroU8,
    channels: u32,
    depth: u32,
    padding: u8,
    data: Vec<u8>,
}

impl StructuredImage {
    fn bytes_per_sample(&self) -> usize {
        match self.depth {
            SHARPEN_DEPTH_U8 => 1,
            SHARPEN_DEPTH_U16 => 2,
            _ => 4,
        }
    }

    fn stride(&self) -> usize {
        self.width.get() as usize * self.channels as usize * self.bytes_per_sample()
            + self.padding as usize
    }
}

impl<'a> arbitrary::Arbitrary<'a> for StructuredImage {
    fn arbitrary(unstructured: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let width: NonZeroU8 = unstructured.arbitrary()?;
        let height: NonZeroU8 = unstructured.arbitrary()?;
        let (depth, channels) = match unstructured.int_in_range(0..=2u8)? {
            0 => (SHARPEN_DEPTH_U8, unstructured.int_in_range(1..=4)?),
            1 => (SHARPEN_DEPTH_U16, unstructured.int_in_range(1..=4)?),
            _ => (SHARPEN_DEPTH_F32, unstructured.int_in_range(3..=4)?),
        };
        let padding = unstructured.int_in_range(0..=7)?;
        let mut image = Self {
            width,
            height,
            channels,
            depth,
            padding,
            data: Vec::new(),
        };
        let len = image.stride() * height.get() as usize;
        image.data = unstructured.bytes(len)?.to_vec();
        Ok(image)
    }
}

fuzz_target!(|input: (StructuredImage, u16, u8)| {
    let (mut image, amount, radius) = input;
    let amount = i32::from(amount % 1001);
    let radius = f64::from(radius) / 16.0;
    let before = image.data.clone();

    let raw = RawImage {
        width: u32::from(image.width.get()),
        height: u32::from(image.height.get()),
        channels: image.channels,
        depth: image.depth,
        stride: image.stride(),
        data: image.data.as_mut_ptr(),
    };
    let output = unsafe { ffi::sharpen(&raw, amount, radius) };
    assert!(!output.is_null(), "valid input was rejected");

    let described = unsafe { &*output };
    assert_eq!((described.width, described.height), (raw.width, raw.height));
    assert_eq!(described.channels, raw.channels);
    assert_eq!(described.depth, raw.depth);
    assert_eq!(described.stride, raw.stride - image.padding as usize);
    assert_eq!(image.data, before, "input was modified");

    assert_eq!(unsafe { ffi::sharpen_release(output) }, SHARPEN_OK);
});
