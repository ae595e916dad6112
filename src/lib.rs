//! A library for lossy image compression through palette reduction with k-means clustering.
//!
//! Every pixel of an image is treated as a color vector. The pixels are partitioned into `k`
//! clusters by color similarity, and each pixel is then replaced with the mean color of its cluster.
//! The result is an image that uses at most `k` distinct colors.
//!
//! # Features
//! To reduce dependencies and compile times, `kmeans_compress` has several `cargo` features
//! that can be turned off or on:
//! - `pipelines`: exposes the [`CompressPipeline`] builder struct, the high-level API.
//! - `threads`: exposes parallel versions of the clustering functions via [`rayon`].
//! - `image`: enables integration with the [`image`] crate.
//!
//! # High-Level API
//! ```no_run
//! # use kmeans_compress::{CompressPipeline, PixelBuffer};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let image = PixelBuffer::open("some image.png")?;
//!
//! let compressed = CompressPipeline::new(&image)
//!     .k(16) // the number of colors in the output image
//!     .seed(42)
//!     .compress_par()?;
//!
//! println!("{}", compressed.report);
//! compressed.image.save("some image_compressed.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Low-Level API
//! The clusterer itself can be run on any slice of colors, see the [`kmeans`] module.
//! ```
//! # use kmeans_compress::{kmeans::{self, KmeansOptions}, PixelSet};
//! # fn main() -> Result<(), kmeans_compress::Error> {
//! let colors = [[0u8, 0, 0], [10, 10, 10], [250, 250, 250], [255, 255, 255]];
//! let pixels = PixelSet::try_from(colors.as_slice())?;
//!
//! let result = kmeans::cluster(&pixels, 2, &KmeansOptions::new().seed(7))?;
//! assert_eq!(result.labels[0], result.labels[1]);
//! assert_ne!(result.labels[1], result.labels[2]);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::expect_used,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::many_single_char_names,
    clippy::missing_panics_doc,
    clippy::unreadable_literal,
    clippy::wildcard_imports
)]

mod error;
mod pixel_buffer;
mod traits;
mod types;

#[cfg(feature = "pipelines")]
mod pipeline;

pub mod kmeans;

pub use error::*;
pub use pixel_buffer::PixelBuffer;
pub use traits::*;
pub use types::*;

#[cfg(feature = "pipelines")]
pub use pipeline::*;

/// The maximum supported image size in number of pixels is `u32::MAX`.
pub const MAX_PIXELS: u32 = u32::MAX;

/// The number of k-means iterations to run if none is specified.
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;
