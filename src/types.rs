//! Contains various types needed across the crate.

use crate::{ColorComponents, Error, MAX_PIXELS};
use palette::cast::AsArrays;
use std::ops::Deref;

/// A simple new type wrapper around `&'a [[Component; N]]`, the flat list of pixel colors,
/// with the invariant that its length is not greater than [`MAX_PIXELS`].
///
/// Pixels are in row-major order. The order only matters for reconstructing an image
/// from the labels returned by the clusterer.
///
/// # Examples
/// From raw component arrays:
/// ```
/// # use kmeans_compress::PixelSet;
/// # fn main() -> Result<(), kmeans_compress::Error> {
/// let colors = vec![[0u8, 0, 0], [255, 255, 255]];
/// let pixels = PixelSet::try_from(colors.as_slice())?;
/// assert_eq!(pixels.num_pixels(), 2);
/// # Ok(())
/// # }
/// ```
///
/// From a slice of `palette` colors:
/// ```
/// # use kmeans_compress::PixelSet;
/// # use palette::Srgb;
/// # fn main() -> Result<(), kmeans_compress::Error> {
/// let srgb = vec![Srgb::new(0u8, 0, 0)];
/// let pixels = PixelSet::from_colors(&srgb)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct PixelSet<'a, Component, const N: usize>(&'a [[Component; N]]);

impl<'a, Component, const N: usize> Clone for PixelSet<'a, Component, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, Component, const N: usize> Copy for PixelSet<'a, Component, N> {}

impl<'a, Component, const N: usize> PixelSet<'a, Component, N> {
    /// Creates a [`PixelSet`] from a slice of colors, like `Srgb<u8>`, by viewing each color
    /// as an array of its components.
    ///
    /// # Errors
    /// Returns [`Error::TooManyPixels`] if there are more than [`MAX_PIXELS`] colors.
    pub fn from_colors<Color>(colors: &'a [Color]) -> Result<Self, Error>
    where
        Color: ColorComponents<Component, N>,
    {
        Self::try_from(colors.as_arrays())
    }

    /// Returns the number of pixels as a `u32`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn num_pixels(&self) -> u32 {
        self.0.len() as u32
    }

    /// Returns the number of channels in each color.
    #[must_use]
    pub const fn channels(&self) -> usize {
        N
    }
}

impl<'a, Component, const N: usize> AsRef<[[Component; N]]> for PixelSet<'a, Component, N> {
    fn as_ref(&self) -> &[[Component; N]] {
        self
    }
}

impl<'a, Component, const N: usize> Deref for PixelSet<'a, Component, N> {
    type Target = [[Component; N]];

    fn deref(&self) -> &Self::Target {
        self.0
    }
}

impl<'a, Component, const N: usize> From<PixelSet<'a, Component, N>> for &'a [[Component; N]] {
    fn from(val: PixelSet<'a, Component, N>) -> Self {
        val.0
    }
}

impl<'a, Component, const N: usize> TryFrom<&'a [[Component; N]]> for PixelSet<'a, Component, N> {
    type Error = Error;

    fn try_from(slice: &'a [[Component; N]]) -> Result<Self, Self::Error> {
        if slice.len() <= MAX_PIXELS as usize {
            Ok(Self(slice))
        } else {
            Err(Error::TooManyPixels)
        }
    }
}

/// The tolerance used to decide whether the centroids have stopped moving.
///
/// Two values `old` and `new` are considered equal if
/// `|old - new| <= absolute + relative * |new|`.
/// The clusterer has converged once every channel of every centroid is equal
/// to its value from the previous iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// The relative tolerance, scaled by the magnitude of the new value.
    pub relative: f64,
    /// The absolute tolerance.
    pub absolute: f64,
}

impl Tolerance {
    /// The default tolerance: a relative tolerance of `1e-5` and an absolute tolerance of `1e-8`.
    pub const DEFAULT: Self = Self { relative: 1e-5, absolute: 1e-8 };

    /// Returns whether `old` and `new` are equal within this tolerance.
    #[must_use]
    pub fn is_close(&self, old: f64, new: f64) -> bool {
        (old - new).abs() <= self.absolute + self.relative * new.abs()
    }

    /// Returns whether every component of `old` and `new` are equal within this tolerance.
    #[must_use]
    pub fn all_close<const N: usize>(&self, old: &[f64; N], new: &[f64; N]) -> bool {
        old.iter().zip(new).all(|(&old, &new)| self.is_close(old, new))
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palette::Srgb;

    #[test]
    fn from_colors_views_components() {
        let srgb = vec![Srgb::new(1u8, 2, 3), Srgb::new(4, 5, 6)];
        let pixels = PixelSet::from_colors(&srgb).unwrap();
        assert_eq!(&*pixels, &[[1, 2, 3], [4, 5, 6]]);
        assert_eq!(pixels.num_pixels(), 2);
        assert_eq!(pixels.channels(), 3);
    }

    #[test]
    fn tolerance_matches_allclose() {
        let tolerance = Tolerance::DEFAULT;
        assert!(tolerance.is_close(100.0, 100.0005));
        assert!(!tolerance.is_close(100.0, 100.01));
        assert!(tolerance.is_close(0.0, 1e-9));
        assert!(!tolerance.is_close(0.0, 1e-7));
        assert!(tolerance.all_close(&[1.0, 2.0], &[1.0, 2.0]));
        assert!(!tolerance.all_close(&[1.0, 2.0], &[1.0, 2.1]));
    }
}
