//! Contains the [`CompressPipeline`] builder struct for the high level API.

use crate::{
    kmeans::{self, ClusteringResult, KmeansOptions},
    pixel_buffer::quantize_color,
    PixelBuffer, PixelSet, Result, Tolerance,
};
use std::{
    fmt::{self, Display},
    path::{Path, PathBuf},
};

/// A builder struct to specify options for compressing an image.
///
/// # Examples
/// ```
/// # use kmeans_compress::{CompressPipeline, PixelBuffer};
/// # fn main() -> Result<(), kmeans_compress::Error> {
/// let data = (0..64u8).flat_map(|i| [i * 4, 255 - i * 4, 128]).collect();
/// let image = PixelBuffer::new(data, 8, 8, 3)?;
///
/// let compressed = CompressPipeline::new(&image)
///     .k(4)
///     .max_iterations(50)
///     .seed(1)
///     .compress()?;
///
/// assert_eq!(compressed.image.dimensions(), (8, 8));
/// assert!(compressed.image.unique_colors() <= 4);
/// # Ok(())
/// # }
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct CompressPipeline<'a> {
    /// The input image.
    pub(crate) image: &'a PixelBuffer,
    /// The number of colors to reduce the image to.
    pub(crate) k: u32,
    /// The options for k-means.
    pub(crate) options: KmeansOptions,
}

/// The output of a [`CompressPipeline`].
#[derive(Debug, Clone, PartialEq)]
pub struct Compressed {
    /// The reconstructed image, where each pixel is replaced by the color of its cluster.
    pub image: PixelBuffer,
    /// The palette: the centroid of each cluster, rounded and clamped to 8-bit channels.
    pub palette: Vec<Vec<u8>>,
    /// The index into `palette` for each pixel.
    pub labels: Vec<u32>,
    /// Statistics about the compression.
    pub report: CompressionReport,
}

/// Statistics about a compressed image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionReport {
    /// The width of the image.
    pub width: u32,
    /// The height of the image.
    pub height: u32,
    /// The number of channels per pixel.
    pub channels: u8,
    /// The number of distinct colors in the original image.
    pub original_colors: usize,
    /// The number of clusters.
    pub k: u32,
    /// The number of distinct colors in the quantized palette.
    pub palette_colors: usize,
    /// The number of k-means iterations that were run.
    pub iterations: u32,
    /// Whether k-means converged before reaching the iteration limit.
    pub converged: bool,
    /// The storage cost per pixel of the original image: 8 bits for each channel.
    pub bits_per_pixel_before: f64,
    /// The storage cost per pixel of an indexed encoding of the compressed image:
    /// the bits needed for a palette index, plus the palette itself spread over all pixels.
    pub bits_per_pixel_after: f64,
}

impl CompressionReport {
    /// Returns `bits_per_pixel_before / bits_per_pixel_after`.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        self.bits_per_pixel_before / self.bits_per_pixel_after
    }
}

impl Display for CompressionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Image size: {}x{} ({} channels)", self.width, self.height, self.channels)?;
        writeln!(f, "Original colors: {}", self.original_colors)?;
        writeln!(f, "Compressed colors: {} (k = {})", self.palette_colors, self.k)?;
        if self.converged {
            writeln!(f, "Converged after {} iterations", self.iterations)?;
        } else {
            writeln!(f, "Stopped after {} iterations without converging", self.iterations)?;
        }
        write!(
            f,
            "Bits per pixel: {:.2} -> {:.2} ({:.1}x)",
            self.bits_per_pixel_before,
            self.bits_per_pixel_after,
            self.ratio()
        )
    }
}

/// Returns the number of bits needed to store an index into a palette of `k` colors.
fn index_bits(k: u32) -> u32 {
    if k <= 1 {
        0
    } else {
        u32::BITS - (k - 1).leading_zeros()
    }
}

/// Returns the path that a compressed image is saved to by default:
/// `<stem>_compressed.<extension>` next to the input.
///
/// # Examples
/// ```
/// # use kmeans_compress::compressed_path;
/// # use std::path::Path;
/// assert_eq!(
///     compressed_path(Path::new("photos/cat.png")),
///     Path::new("photos/cat_compressed.png"),
/// );
/// ```
#[must_use]
pub fn compressed_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let name = match input.extension() {
        Some(extension) => format!("{stem}_compressed.{}", extension.to_string_lossy()),
        None => format!("{stem}_compressed"),
    };
    input.with_file_name(name)
}

/// Runs the given generic method with the channel count of the input image.
macro_rules! dispatch_channels {
    ($self: ident, $method: ident) => {
        match $self.image.channels() {
            1 => $self.$method::<1>(),
            2 => $self.$method::<2>(),
            3 => $self.$method::<3>(),
            4 => $self.$method::<4>(),
            channels => Err(crate::Error::UnsupportedChannels(channels)),
        }
    };
}

impl<'a> CompressPipeline<'a> {
    /// The number of colors used if none is specified.
    pub const DEFAULT_K: u32 = 16;

    /// Creates a new [`CompressPipeline`] with default options.
    pub fn new(image: &'a PixelBuffer) -> Self {
        Self {
            image,
            k: Self::DEFAULT_K,
            options: KmeansOptions::new(),
        }
    }

    /// Sets the number of colors (clusters) in the compressed image.
    ///
    /// It must be at least `1` and at most the number of pixels in the image.
    ///
    /// The default is [`CompressPipeline::DEFAULT_K`].
    pub fn k(&mut self, k: u32) -> &mut Self {
        self.k = k;
        self
    }

    /// Sets the maximum number of k-means iterations.
    ///
    /// The default is [`DEFAULT_MAX_ITERATIONS`](crate::DEFAULT_MAX_ITERATIONS).
    pub fn max_iterations(&mut self, max_iterations: u32) -> &mut Self {
        self.options = self.options.max_iterations(max_iterations);
        self
    }

    /// Sets the seed value for the random number generator.
    ///
    /// The default seed is `0`.
    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.options = self.options.seed(seed);
        self
    }

    /// Sets the tolerance for the convergence check.
    ///
    /// The default is [`Tolerance::DEFAULT`].
    pub fn tolerance(&mut self, tolerance: Tolerance) -> &mut Self {
        self.options = self.options.tolerance(tolerance);
        self
    }

    /// Sets all k-means options at once.
    pub fn kmeans_options(&mut self, options: KmeansOptions) -> &mut Self {
        self.options = options;
        self
    }

    /// Runs the pipeline and returns the compressed image.
    ///
    /// # Errors
    /// Returns [`Error::InvalidK`](crate::Error::InvalidK),
    /// [`Error::InsufficientPixels`](crate::Error::InsufficientPixels),
    /// or [`Error::InvalidMaxIterations`](crate::Error::InvalidMaxIterations)
    /// if the options are not valid for the image.
    pub fn compress(&self) -> Result<Compressed> {
        dispatch_channels!(self, compress_channels)
    }

    /// Runs the pipeline for an image with `N` channels.
    fn compress_channels<const N: usize>(&self) -> Result<Compressed> {
        let colors = self.image.colors::<N>()?;
        let pixels = PixelSet::try_from(colors.as_slice())?;
        let result = kmeans::cluster(&pixels, self.k, &self.options)?;
        self.finish(result)
    }

    /// Reconstructs the image from the clustering result and computes the report.
    fn finish<const N: usize>(&self, result: ClusteringResult<N>) -> Result<Compressed> {
        let (width, height) = self.image.dimensions();
        let image = PixelBuffer::from_palette(&result.centroids, &result.labels, width, height)?;

        let palette = result
            .centroids
            .iter()
            .map(|&centroid| quantize_color(centroid).to_vec())
            .collect::<Vec<_>>();

        let palette_colors = {
            let mut distinct = palette.clone();
            distinct.sort_unstable();
            distinct.dedup();
            distinct.len()
        };

        let channels = self.image.channels();
        #[allow(clippy::cast_precision_loss)]
        let pixels = self.image.num_pixels() as f64;
        let palette_bits = f64::from(self.k) * f64::from(channels) * 8.0;

        let report = CompressionReport {
            width,
            height,
            channels,
            original_colors: self.image.unique_colors(),
            k: self.k,
            palette_colors,
            iterations: result.iterations,
            converged: result.converged,
            bits_per_pixel_before: f64::from(channels) * 8.0,
            bits_per_pixel_after: f64::from(index_bits(self.k)) + palette_bits / pixels,
        };

        log::info!(
            "compressed {width}x{height} image from {} to {palette_colors} colors",
            report.original_colors
        );

        Ok(Compressed {
            image,
            palette,
            labels: result.labels,
            report,
        })
    }
}

#[cfg(feature = "threads")]
impl<'a> CompressPipeline<'a> {
    /// Runs the pipeline in parallel and returns the compressed image.
    ///
    /// The output is identical to [`CompressPipeline::compress`].
    ///
    /// # Errors
    /// See [`CompressPipeline::compress`].
    pub fn compress_par(&self) -> Result<Compressed> {
        dispatch_channels!(self, compress_channels_par)
    }

    /// Runs the pipeline in parallel for an image with `N` channels.
    fn compress_channels_par<const N: usize>(&self) -> Result<Compressed> {
        let colors = self.image.colors::<N>()?;
        let pixels = PixelSet::try_from(colors.as_slice())?;
        let result = kmeans::cluster_par(&pixels, self.k, &self.options)?;
        self.finish(result)
    }
}
