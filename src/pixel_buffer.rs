//! Conversion between images and flat lists of pixel colors.

use crate::{Error, Result, MAX_PIXELS};
use std::array;
#[cfg(feature = "image")]
use {
    image::{DynamicImage, GrayAlphaImage, GrayImage, ImageFormat, RgbImage, RgbaImage},
    std::{io::Cursor, path::Path},
};

/// A decoded image as a flat, row-major buffer of 8-bit channel values.
///
/// Each pixel has `channels` interleaved values.
/// Supported channel counts are 1 (luma), 2 (luma and alpha), 3 (RGB), and 4 (RGBA).
///
/// # Examples
/// ```
/// # use kmeans_compress::PixelBuffer;
/// # fn main() -> Result<(), kmeans_compress::Error> {
/// let buffer = PixelBuffer::new(vec![0, 0, 0, 255, 255, 255], 2, 1, 3)?;
/// let colors = buffer.colors::<3>()?;
/// assert_eq!(colors, vec![[0, 0, 0], [255, 255, 255]]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    /// The interleaved channel values.
    data: Vec<u8>,
    /// The width of the image in pixels.
    width: u32,
    /// The height of the image in pixels.
    height: u32,
    /// The number of channels per pixel.
    channels: u8,
}

/// Returns the number of pixels in an image with the given dimensions,
/// ensuring the image is not empty and not above [`MAX_PIXELS`].
fn num_pixels(width: u32, height: u32) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(Error::EmptyImage);
    }

    let pixels = u64::from(width) * u64::from(height);
    if pixels > u64::from(MAX_PIXELS) {
        Err(Error::TooManyPixels)
    } else {
        #[allow(clippy::cast_possible_truncation)]
        Ok(pixels as usize)
    }
}

/// Ensures the channel count is supported.
fn check_channels(channels: u8) -> Result<()> {
    if (1..=4).contains(&channels) {
        Ok(())
    } else {
        Err(Error::UnsupportedChannels(channels))
    }
}

/// Converts a channel value in continuous space to a valid 8-bit value
/// by rounding to the nearest integer and clamping to `[0, 255]`.
///
/// `NaN` is mapped to `0`.
#[inline]
#[must_use]
pub(crate) fn quantize_channel(value: f64) -> u8 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        // float to int casts saturate and map NaN to 0
        value.round().clamp(0.0, 255.0) as u8
    }
}

/// Converts a color in continuous space to a valid 8-bit color.
#[inline]
#[must_use]
pub(crate) fn quantize_color<const N: usize>(color: [f64; N]) -> [u8; N] {
    color.map(quantize_channel)
}

impl PixelBuffer {
    /// Creates a new [`PixelBuffer`] from raw interleaved channel values.
    ///
    /// # Errors
    /// Returns [`Error::EmptyImage`] if `width` or `height` is `0`,
    /// [`Error::TooManyPixels`] if the image has more than [`MAX_PIXELS`] pixels,
    /// [`Error::UnsupportedChannels`] if `channels` is not in `1..=4`,
    /// or [`Error::ShapeMismatch`] if `data.len() != width * height * channels`.
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Result<Self> {
        let pixels = num_pixels(width, height)?;
        check_channels(channels)?;

        let expected = pixels * usize::from(channels);
        if data.len() == expected {
            Ok(Self { data, width, height, channels })
        } else {
            Err(Error::ShapeMismatch { expected, actual: data.len() })
        }
    }

    /// Creates a new [`PixelBuffer`] from a list of colors in continuous space,
    /// like the centroids computed by k-means.
    ///
    /// Each channel value is rounded to the nearest integer and clamped to `[0, 255]`.
    ///
    /// # Errors
    /// Returns [`Error::EmptyImage`] if `width` or `height` is `0`,
    /// or [`Error::ShapeMismatch`] if `colors.len() != width * height`.
    /// Also returns an error if `N` is not a supported channel count (see [`PixelBuffer::new`]).
    pub fn from_colors<const N: usize>(colors: &[[f64; N]], width: u32, height: u32) -> Result<Self> {
        let channels = Self::channels_for::<N>()?;
        let pixels = num_pixels(width, height)?;
        if colors.len() != pixels {
            return Err(Error::ShapeMismatch { expected: pixels, actual: colors.len() });
        }

        let data = colors.iter().flat_map(|&color| quantize_color(color)).collect();

        Ok(Self { data, width, height, channels })
    }

    /// Creates a new [`PixelBuffer`] by replacing each label with its color in `palette`.
    ///
    /// The palette colors are rounded and clamped like in [`PixelBuffer::from_colors`].
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] if `labels.len() != width * height`
    /// or if a label is not a valid index into `palette`.
    /// Also returns the errors described in [`PixelBuffer::from_colors`].
    pub fn from_palette<const N: usize>(
        palette: &[[f64; N]],
        labels: &[u32],
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let channels = Self::channels_for::<N>()?;
        let pixels = num_pixels(width, height)?;
        if labels.len() != pixels {
            return Err(Error::ShapeMismatch { expected: pixels, actual: labels.len() });
        }

        let palette = palette.iter().map(|&color| quantize_color(color)).collect::<Vec<_>>();
        let data = labels
            .iter()
            .map(|&label| {
                palette
                    .get(label as usize)
                    .copied()
                    .ok_or_else(|| Error::ShapeMismatch {
                        expected: palette.len(),
                        actual: label as usize + 1,
                    })
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect();

        Ok(Self { data, width, height, channels })
    }

    /// Returns the channel count for colors with `N` components.
    fn channels_for<const N: usize>() -> Result<u8> {
        let channels = u8::try_from(N).map_err(|_| Error::UnsupportedChannels(u8::MAX))?;
        check_channels(channels)?;
        Ok(channels)
    }

    /// Returns the width of the image.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the image.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Returns the `(width, height)` of the image.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns the number of channels per pixel.
    #[must_use]
    pub const fn channels(&self) -> u8 {
        self.channels
    }

    /// Returns the number of pixels in the image.
    #[must_use]
    pub fn num_pixels(&self) -> usize {
        self.data.len() / usize::from(self.channels)
    }

    /// Returns the raw interleaved channel values.
    #[must_use]
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the buffer and returns the raw interleaved channel values.
    #[must_use]
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Returns the pixels as a flat list of colors with `N` channels, in row-major order.
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] if `N` is not equal to the number of channels.
    pub fn colors<const N: usize>(&self) -> Result<Vec<[u8; N]>> {
        if N == usize::from(self.channels) {
            Ok(self
                .data
                .chunks_exact(N)
                .map(|pixel| array::from_fn(|c| pixel[c]))
                .collect())
        } else {
            Err(Error::ShapeMismatch {
                expected: usize::from(self.channels),
                actual: N,
            })
        }
    }

    /// Returns the number of distinct colors in the image.
    #[must_use]
    pub fn unique_colors(&self) -> usize {
        let mut pixels = self
            .data
            .chunks_exact(usize::from(self.channels))
            .collect::<Vec<_>>();
        pixels.sort_unstable();
        pixels.dedup();
        pixels.len()
    }
}

#[cfg(feature = "image")]
impl PixelBuffer {
    /// Decodes an image from its encoded bytes (e.g., the contents of a PNG file).
    ///
    /// # Errors
    /// Returns [`Error::Decode`] if the bytes could not be parsed as an image,
    /// or [`Error::EmptyImage`] if the image has no pixels.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes).map_err(Error::Decode)?;
        Self::try_from(image)
    }

    /// Opens and decodes the image at the given path.
    ///
    /// # Errors
    /// See [`PixelBuffer::decode`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let image = image::open(path).map_err(Error::Decode)?;
        Self::try_from(image)
    }

    /// Converts the buffer into a [`DynamicImage`] with the same dimensions and channel count.
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] if the buffer is inconsistent,
    /// which can not happen for buffers created through this crate.
    pub fn to_dynamic_image(&self) -> Result<DynamicImage> {
        let (width, height) = self.dimensions();
        let data = self.data.clone();
        let expected = self.num_pixels() * usize::from(self.channels);
        let actual = data.len();

        let image = match self.channels {
            1 => GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8),
            2 => GrayAlphaImage::from_raw(width, height, data).map(DynamicImage::ImageLumaA8),
            3 => RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8),
            4 => RgbaImage::from_raw(width, height, data).map(DynamicImage::ImageRgba8),
            channels => return Err(Error::UnsupportedChannels(channels)),
        };

        image.ok_or(Error::ShapeMismatch { expected, actual })
    }

    /// Encodes the image in the given format.
    ///
    /// # Errors
    /// Returns [`Error::Encode`] if the format does not support the channel count
    /// or the encoder fails.
    pub fn encode(&self, format: ImageFormat) -> Result<Vec<u8>> {
        let mut bytes = Cursor::new(Vec::new());
        self.to_dynamic_image()?
            .write_to(&mut bytes, format)
            .map_err(Error::Encode)?;
        Ok(bytes.into_inner())
    }

    /// Saves the image to the given path. The format is chosen based on the file extension.
    ///
    /// # Errors
    /// Returns [`Error::Encode`] if the image could not be encoded or written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.to_dynamic_image()?.save(path).map_err(Error::Encode)
    }
}

#[cfg(feature = "image")]
impl TryFrom<DynamicImage> for PixelBuffer {
    type Error = Error;

    /// Converts a [`DynamicImage`] to 8-bit channels, keeping its channel count.
    fn try_from(image: DynamicImage) -> Result<Self> {
        let (width, height) = (image.width(), image.height());
        let channels = image.color().channel_count();

        let data = match channels {
            1 => image.into_luma8().into_raw(),
            2 => image.into_luma_alpha8().into_raw(),
            3 => image.into_rgb8().into_raw(),
            _ => image.into_rgba8().into_raw(),
        };

        Self::new(data, width, height, channels.min(4))
    }
}
