//! The error type shared by every fallible operation in the crate.

use thiserror::Error;

/// The ways that decoding, clustering, or encoding can fail.
///
/// None of these are retried internally; a failed request produces no partial output.
#[derive(Debug, Error)]
pub enum Error {
    /// The image could not be read or parsed.
    #[cfg(feature = "image")]
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// The image has a width or height of zero.
    #[error("image has no pixels")]
    EmptyImage,

    /// A buffer or color list does not have the length implied by the image dimensions.
    #[error("shape mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch {
        /// The length implied by the dimensions and channel count.
        expected: usize,
        /// The length that was actually provided.
        actual: usize,
    },

    /// Only 1 to 4 channels are supported.
    #[error("unsupported channel count: {0}")]
    UnsupportedChannels(u8),

    /// The image has more than [`MAX_PIXELS`](crate::MAX_PIXELS) pixels.
    #[error("image has more than {} pixels", crate::MAX_PIXELS)]
    TooManyPixels,

    /// The number of clusters must be at least one.
    #[error("invalid number of clusters: {k}")]
    InvalidK {
        /// The requested number of clusters.
        k: usize,
    },

    /// There are fewer pixels than requested clusters.
    #[error("cannot form {k} clusters from {pixels} pixels")]
    InsufficientPixels {
        /// The requested number of clusters.
        k: usize,
        /// The number of pixels available.
        pixels: usize,
    },

    /// The iteration limit must be at least one.
    #[error("max iterations must be at least 1")]
    InvalidMaxIterations,

    /// The image could not be encoded or written.
    #[cfg(feature = "image")]
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),
}

/// A `Result` alias with [`Error`] as the default error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;
