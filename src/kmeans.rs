//! Lloyd's k-means clustering over pixel colors.
//!
//! Each run alternates between two steps until the centroids stop moving
//! (see [`Tolerance`]) or the iteration limit is reached:
//! 1. Assignment: every pixel is labeled with its nearest centroid by squared Euclidean distance.
//!    Ties go to the centroid with the lowest index.
//! 2. Update: every centroid becomes the mean of the pixels labeled with it.
//!    A centroid with no pixels keeps its previous value.
//!
//! The initial centroids are `k` distinct pixels sampled uniformly without replacement.
//! Sampling is driven by an explicit seed or random source, so runs are reproducible.
//! The parallel versions of the functions here return bit-identical results to the
//! sequential versions.

use crate::{Error, PixelSet, Result, SumPromotion, Tolerance, DEFAULT_MAX_ITERATIONS};

use std::array;

use bitvec::vec::BitVec;
use log::{debug, info, log_enabled, warn, Level};
use num_traits::{AsPrimitive, Zero};
use ordered_float::OrderedFloat;
use rand::{seq::index, Rng, SeedableRng};
use rand_xoshiro::Xoroshiro128PlusPlus;

#[cfg(feature = "threads")]
use rayon::prelude::*;

/// A builder struct to specify the parameters for k-means.
///
/// # Examples
/// ```
/// # use kmeans_compress::kmeans::KmeansOptions;
/// let options = KmeansOptions::new()
///     .max_iterations(50)
///     .seed(42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KmeansOptions {
    /// The maximum number of assignment/update iterations to run.
    pub(crate) max_iterations: u32,
    /// The seed value for the random number generator.
    pub(crate) seed: u64,
    /// The tolerance for the convergence check.
    pub(crate) tolerance: Tolerance,
}

impl Default for KmeansOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl KmeansOptions {
    /// Creates a new [`KmeansOptions`] with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            seed: 0,
            tolerance: Tolerance::DEFAULT,
        }
    }

    /// Sets the maximum number of iterations.
    ///
    /// Reaching the limit without converging is not an error; the last computed
    /// labels and centroids are returned.
    /// A limit of `0` is rejected by the clustering functions.
    ///
    /// The default is [`DEFAULT_MAX_ITERATIONS`].
    #[must_use]
    pub const fn max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the seed value for the random number generator used to pick the initial centroids.
    ///
    /// The default seed is `0`.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the tolerance for the convergence check.
    ///
    /// The default is [`Tolerance::DEFAULT`].
    #[must_use]
    pub const fn tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Returns the maximum number of iterations.
    #[must_use]
    pub const fn get_max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Returns the seed value.
    #[must_use]
    pub const fn get_seed(&self) -> u64 {
        self.seed
    }

    /// Returns the convergence tolerance.
    #[must_use]
    pub const fn get_tolerance(&self) -> Tolerance {
        self.tolerance
    }
}

/// The output struct returned by the clustering functions.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusteringResult<const N: usize> {
    /// The final centroids. There are always exactly `k` of them.
    ///
    /// The centroids are not quantized and are not guaranteed to be unique.
    pub centroids: Vec<[f64; N]>,
    /// The index of the assigned centroid for each pixel, in the same order as the input pixels.
    pub labels: Vec<u32>,
    /// The number of pixels assigned to each centroid.
    ///
    /// A count of zero means the centroid kept its initial (or last non-empty) value.
    pub counts: Vec<u32>,
    /// The number of iterations that were run.
    pub iterations: u32,
    /// Whether the centroids converged before the iteration limit was reached.
    pub converged: bool,
}

impl<const N: usize> ClusteringResult<N> {
    /// Returns the number of clusters, `k`.
    #[must_use]
    pub fn num_clusters(&self) -> usize {
        self.centroids.len()
    }

    /// Returns the number of clusters that have no pixels assigned to them.
    #[must_use]
    pub fn empty_clusters(&self) -> usize {
        self.counts.iter().filter(|&&count| count == 0).count()
    }
}

/// Returns the squared Euclidean distance between two colors.
#[inline]
#[must_use]
pub fn squared_euclidean_distance<const N: usize>(x: [f64; N], y: [f64; N]) -> f64 {
    let mut dist = 0.0;
    for c in 0..N {
        let diff = x[c] - y[c];
        dist += diff * diff;
    }
    dist
}

/// Returns the index of the centroid nearest to `color`,
/// or `None` if `centroids` is empty.
///
/// If multiple centroids are equally near, the one with the lowest index is returned.
#[must_use]
pub fn nearest_centroid<const N: usize>(centroids: &[[f64; N]], color: [f64; N]) -> Option<usize> {
    centroids
        .iter()
        .enumerate()
        // min_by_key returns the first of several equal minimums
        .min_by_key(|&(_, &centroid)| OrderedFloat(squared_euclidean_distance(centroid, color)))
        .map(|(i, _)| i)
}

/// Converts a color to `f64` components.
#[inline]
fn to_f64<Component: Into<f64> + Copy, const N: usize>(color: [Component; N]) -> [f64; N] {
    color.map(Into::into)
}

/// Returns the label of the centroid nearest to `color`.
#[inline]
fn assign<Component: Into<f64> + Copy, const N: usize>(
    centroids: &[[f64; N]],
    color: [Component; N],
) -> u32 {
    #[allow(clippy::cast_possible_truncation)]
    {
        // k <= num_pixels <= MAX_PIXELS, so every index fits in a u32
        nearest_centroid(centroids, to_f64(color)).map_or(0, |i| i as u32)
    }
}

/// Ensures the parameters for a run are valid before any work is done.
fn validate(num_pixels: usize, k: usize, options: &KmeansOptions) -> Result<()> {
    if k == 0 {
        Err(Error::InvalidK { k })
    } else if k > num_pixels {
        Err(Error::InsufficientPixels { k, pixels: num_pixels })
    } else if options.max_iterations == 0 {
        Err(Error::InvalidMaxIterations)
    } else {
        Ok(())
    }
}

/// Selects `k` distinct pixels uniformly at random, without replacement,
/// to be used as the initial centroids.
///
/// # Errors
/// Returns [`Error::InvalidK`] if `k` is `0`
/// or [`Error::InsufficientPixels`] if there are fewer than `k` pixels.
pub fn initial_centroids<Component, const N: usize>(
    pixels: &PixelSet<'_, Component, N>,
    k: u32,
    rng: &mut impl Rng,
) -> Result<Vec<[f64; N]>>
where
    Component: Into<f64> + Copy,
{
    let k = k as usize;
    validate(pixels.len(), k, &KmeansOptions::new())?;
    Ok(index::sample(rng, pixels.len(), k)
        .into_iter()
        .map(|i| to_f64(pixels[i]))
        .collect())
}

/// Returns the total distortion of a clustering result:
/// the sum of the squared distances between each pixel and its assigned centroid.
///
/// `pixels` should be the same pixels that were passed to the clusterer.
#[must_use]
pub fn distortion<Component, const N: usize>(
    pixels: &PixelSet<'_, Component, N>,
    result: &ClusteringResult<N>,
) -> f64
where
    Component: Into<f64> + Copy,
{
    pixels
        .iter()
        .zip(&result.labels)
        .map(|(&color, &label)| {
            squared_euclidean_distance(to_f64(color), result.centroids[label as usize])
        })
        .sum()
}

/// The mutable state for a single k-means run.
struct State<'a, Component: SumPromotion, const N: usize> {
    /// The input pixels.
    colors: &'a [[Component; N]],
    /// The current centroids.
    centroids: Vec<[f64; N]>,
    /// The current label of each pixel.
    labels: Vec<u32>,
    /// The number of pixels assigned to each centroid in the last assignment step.
    counts: Vec<u32>,
    /// The per-channel sums of the pixels assigned to each centroid.
    sums: Vec<[Component::Sum; N]>,
}

impl<'a, Component, const N: usize> State<'a, Component, N>
where
    Component: SumPromotion,
{
    /// Creates a new [`State`] with the given initial centroids.
    fn new(colors: &'a [[Component; N]], centroids: Vec<[f64; N]>) -> Self {
        let k = centroids.len();
        Self {
            colors,
            centroids,
            labels: vec![0; colors.len()],
            counts: vec![0; k],
            sums: vec![[Component::Sum::zero(); N]; k],
        }
    }

    /// Labels each pixel with its nearest centroid.
    fn assign(&mut self) {
        let Self { colors, centroids, labels, .. } = self;
        let centroids = centroids.as_slice();
        for (label, &color) in labels.iter_mut().zip(colors.iter()) {
            *label = assign(centroids, color);
        }
    }

    /// Sums the pixels assigned to each centroid.
    fn accumulate(&mut self) {
        let Self { colors, labels, counts, sums, .. } = self;

        counts.fill(0);
        sums.fill([Component::Sum::zero(); N]);

        for (&color, &label) in colors.iter().zip(labels.iter()) {
            let i = label as usize;
            counts[i] += 1;
            for (sum, c) in sums[i].iter_mut().zip(color) {
                *sum += Into::<Component::Sum>::into(c);
            }
        }
    }

    /// Moves each non-empty centroid to the mean of its pixels.
    ///
    /// Returns whether every centroid stayed within `tolerance` of its previous value.
    fn update(&mut self, tolerance: Tolerance) -> bool {
        let Self { centroids, counts, sums, .. } = self;

        let mut moved: BitVec = BitVec::repeat(false, centroids.len());
        for (i, ((centroid, &count), sum)) in centroids
            .iter_mut()
            .zip(&*counts)
            .zip(&*sums)
            .enumerate()
        {
            if count == 0 {
                continue;
            }

            let n = f64::from(count);
            let mean: [f64; N] = array::from_fn(|c| sum[c].as_() / n);
            moved.set(i, !tolerance.all_close(centroid, &mean));
            *centroid = mean;
        }

        moved.not_any()
    }

    /// Returns the sum of the squared distances between each pixel and its assigned centroid.
    fn distortion(&self) -> f64 {
        self.colors
            .iter()
            .zip(&self.labels)
            .map(|(&color, &label)| {
                squared_euclidean_distance(to_f64(color), self.centroids[label as usize])
            })
            .sum()
    }

    /// Runs iterations until convergence or until the iteration limit is reached.
    ///
    /// `step` must perform the assignment step followed by the accumulation of cluster sums.
    fn run(
        mut self,
        options: &KmeansOptions,
        mut step: impl FnMut(&mut Self),
    ) -> ClusteringResult<N> {
        let mut converged = false;
        let mut iterations = 0;

        while iterations < options.max_iterations && !converged {
            step(&mut self);
            iterations += 1;

            if log_enabled!(Level::Debug) {
                debug!("iteration {iterations}: distortion {}", self.distortion());
            }

            converged = self.update(options.tolerance);
        }

        if converged {
            info!("k-means converged after {iterations} iterations");
        } else {
            info!("k-means stopped at the iteration limit of {iterations} without converging");
        }

        self.into_result(iterations, converged)
    }

    /// Consumes the state and returns the final labels and centroids.
    fn into_result(self, iterations: u32, converged: bool) -> ClusteringResult<N> {
        let Self { centroids, labels, counts, .. } = self;

        let empty = counts.iter().filter(|&&count| count == 0).count();
        if empty > 0 {
            warn!("{empty} of {} clusters have no pixels assigned", centroids.len());
        }

        ClusteringResult { centroids, labels, counts, iterations, converged }
    }
}

/// Runs k-means on `pixels` to find `k` clusters,
/// selecting the initial centroids with a random number generator seeded from `options`.
///
/// # Errors
/// Returns [`Error::InvalidK`] if `k` is `0`,
/// [`Error::InsufficientPixels`] if there are fewer than `k` pixels,
/// or [`Error::InvalidMaxIterations`] if the iteration limit is `0`.
///
/// # Examples
/// ```
/// # use kmeans_compress::{kmeans::{self, KmeansOptions}, PixelSet};
/// # fn main() -> Result<(), kmeans_compress::Error> {
/// let colors = [[0u8, 0, 0], [0, 0, 2], [200, 200, 200], [200, 200, 204]];
/// let pixels = PixelSet::try_from(colors.as_slice())?;
///
/// let result = kmeans::cluster(&pixels, 2, &KmeansOptions::new())?;
/// assert_eq!(result.centroids.len(), 2);
/// assert_eq!(result.labels.len(), 4);
/// # Ok(())
/// # }
/// ```
pub fn cluster<Component, const N: usize>(
    pixels: &PixelSet<'_, Component, N>,
    k: u32,
    options: &KmeansOptions,
) -> Result<ClusteringResult<N>>
where
    Component: SumPromotion,
{
    let rng = &mut Xoroshiro128PlusPlus::seed_from_u64(options.seed);
    cluster_with_rng(pixels, k, options, rng)
}

/// Runs k-means on `pixels` to find `k` clusters,
/// selecting the initial centroids with the provided random number generator.
///
/// The seed in `options` is ignored.
///
/// # Errors
/// See [`cluster`].
pub fn cluster_with_rng<Component, const N: usize>(
    pixels: &PixelSet<'_, Component, N>,
    k: u32,
    options: &KmeansOptions,
    rng: &mut impl Rng,
) -> Result<ClusteringResult<N>>
where
    Component: SumPromotion,
{
    validate(pixels.len(), k as usize, options)?;
    let centroids = initial_centroids(pixels, k, rng)?;
    cluster_with_centroids(pixels, centroids, options)
}

/// Runs k-means on `pixels` starting from the provided centroids.
///
/// The number of clusters is the number of provided centroids.
///
/// # Errors
/// See [`cluster`].
pub fn cluster_with_centroids<Component, const N: usize>(
    pixels: &PixelSet<'_, Component, N>,
    initial_centroids: Vec<[f64; N]>,
    options: &KmeansOptions,
) -> Result<ClusteringResult<N>>
where
    Component: SumPromotion,
{
    validate(pixels.len(), initial_centroids.len(), options)?;
    debug!(
        "running k-means with k = {} on {} pixels",
        initial_centroids.len(),
        pixels.len()
    );

    let state = State::new(&**pixels, initial_centroids);
    Ok(state.run(options, |state| {
        state.assign();
        state.accumulate();
    }))
}

#[cfg(feature = "threads")]
impl<'a, Component, const N: usize> State<'a, Component, N>
where
    Component: SumPromotion + Send + Sync,
{
    /// Labels each pixel with its nearest centroid in parallel.
    fn assign_par(&mut self) {
        let Self { colors, centroids, labels, .. } = self;
        let colors = *colors;
        let centroids = centroids.as_slice();
        labels
            .par_iter_mut()
            .zip(colors.par_iter())
            .for_each(|(label, &color)| *label = assign(centroids, color));
    }

    /// Sums the pixels assigned to each centroid in parallel.
    ///
    /// The sums are integers, so the result does not depend on how the work is split.
    fn accumulate_par(&mut self) {
        let Self { colors, labels, counts, sums, .. } = self;
        let colors = *colors;
        let k = counts.len();

        let empty = || (vec![0u32; k], vec![[Component::Sum::zero(); N]; k]);

        let (new_counts, new_sums) = colors
            .par_iter()
            .zip(labels.par_iter())
            .fold(empty, |(mut counts, mut sums), (&color, &label)| {
                let i = label as usize;
                counts[i] += 1;
                for (sum, c) in sums[i].iter_mut().zip(color) {
                    *sum += Into::<Component::Sum>::into(c);
                }
                (counts, sums)
            })
            .reduce(empty, |(mut counts, mut sums), (other_counts, other_sums)| {
                for (count, other) in counts.iter_mut().zip(other_counts) {
                    *count += other;
                }
                for (sum, other) in sums.iter_mut().zip(other_sums) {
                    for (s, o) in sum.iter_mut().zip(other) {
                        *s += o;
                    }
                }
                (counts, sums)
            });

        *counts = new_counts;
        *sums = new_sums;
    }
}

/// Runs k-means in parallel on `pixels` to find `k` clusters,
/// selecting the initial centroids with a random number generator seeded from `options`.
///
/// The result is bit-identical to [`cluster`] with the same arguments.
///
/// # Errors
/// See [`cluster`].
#[cfg(feature = "threads")]
pub fn cluster_par<Component, const N: usize>(
    pixels: &PixelSet<'_, Component, N>,
    k: u32,
    options: &KmeansOptions,
) -> Result<ClusteringResult<N>>
where
    Component: SumPromotion + Send + Sync,
{
    let rng = &mut Xoroshiro128PlusPlus::seed_from_u64(options.seed);
    cluster_par_with_rng(pixels, k, options, rng)
}

/// Runs k-means in parallel on `pixels` to find `k` clusters,
/// selecting the initial centroids with the provided random number generator.
///
/// # Errors
/// See [`cluster`].
#[cfg(feature = "threads")]
pub fn cluster_par_with_rng<Component, const N: usize>(
    pixels: &PixelSet<'_, Component, N>,
    k: u32,
    options: &KmeansOptions,
    rng: &mut impl Rng,
) -> Result<ClusteringResult<N>>
where
    Component: SumPromotion + Send + Sync,
{
    validate(pixels.len(), k as usize, options)?;
    let centroids = initial_centroids(pixels, k, rng)?;
    cluster_par_with_centroids(pixels, centroids, options)
}

/// Runs k-means in parallel on `pixels` starting from the provided centroids.
///
/// # Errors
/// See [`cluster`].
#[cfg(feature = "threads")]
pub fn cluster_par_with_centroids<Component, const N: usize>(
    pixels: &PixelSet<'_, Component, N>,
    initial_centroids: Vec<[f64; N]>,
    options: &KmeansOptions,
) -> Result<ClusteringResult<N>>
where
    Component: SumPromotion + Send + Sync,
{
    validate(pixels.len(), initial_centroids.len(), options)?;
    debug!(
        "running parallel k-means with k = {} on {} pixels",
        initial_centroids.len(),
        pixels.len()
    );

    let state = State::new(&**pixels, initial_centroids);
    Ok(state.run(options, |state| {
        state.assign_par();
        state.accumulate_par();
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::tests::*;

    fn pixel_set<const N: usize>(colors: &[[u8; N]]) -> PixelSet<'_, u8, N> {
        PixelSet::try_from(colors).unwrap()
    }

    fn assert_shape<const N: usize>(result: &ClusteringResult<N>, k: usize, len: usize) {
        assert_eq!(result.centroids.len(), k);
        assert_eq!(result.counts.len(), k);
        assert_eq!(result.labels.len(), len);
        assert!(result.labels.iter().all(|&label| (label as usize) < k));
        assert_eq!(result.counts.iter().map(|&c| c as usize).sum::<usize>(), len);
    }

    #[test]
    fn output_shape() {
        let colors = test_data_256();
        let pixels = pixel_set(&colors);
        for k in [1, 2, 7, 64, 255, 256] {
            let result = cluster(&pixels, k, &KmeansOptions::new().max_iterations(10)).unwrap();
            assert_shape(&result, k as usize, colors.len());
        }
    }

    #[test]
    fn four_channels() {
        let colors = test_data::<4>(300, 9);
        let pixels = pixel_set(&colors);
        let result = cluster(&pixels, 5, &KmeansOptions::new()).unwrap();
        assert_shape(&result, 5, colors.len());
    }

    #[test]
    fn deterministic_for_seed() {
        let colors = test_data_1024();
        let pixels = pixel_set(&colors);
        let options = KmeansOptions::new().seed(123);

        let a = cluster(&pixels, 16, &options).unwrap();
        let b = cluster(&pixels, 16, &options).unwrap();
        assert_eq!(a, b);

        let rng = &mut Xoroshiro128PlusPlus::seed_from_u64(123);
        let c = cluster_with_rng(&pixels, 16, &options, rng).unwrap();
        assert_eq!(a, c);
    }

    #[test]
    fn initial_centroids_are_distinct_pixels() {
        let colors = (0..=255u8).map(|i| [i, 0, 0]).collect::<Vec<_>>();
        let pixels = pixel_set(&colors);
        let rng = &mut Xoroshiro128PlusPlus::seed_from_u64(5);

        let mut centroids = initial_centroids(&pixels, 100, rng).unwrap();
        assert_eq!(centroids.len(), 100);
        assert!(centroids.iter().all(|c| c[1] == 0.0 && c[2] == 0.0));

        centroids.sort_by_key(|c| OrderedFloat(c[0]));
        centroids.dedup();
        assert_eq!(centroids.len(), 100);
    }

    #[test]
    fn distortion_is_non_increasing() {
        let colors = test_data_1024();
        let rng = &mut Xoroshiro128PlusPlus::seed_from_u64(3);
        let pixels = pixel_set(&colors);
        let centroids = initial_centroids(&pixels, 8, rng).unwrap();

        let mut state = State::new(colors.as_slice(), centroids);
        let mut previous = f64::INFINITY;
        for _ in 0..10 {
            state.assign();
            state.accumulate();
            let distortion = state.distortion();
            assert!(distortion <= previous * (1.0 + 1e-12), "{distortion} > {previous}");
            previous = distortion;
            state.update(Tolerance::DEFAULT);
        }
    }

    #[test]
    fn exact_colors_converge_in_one_iteration() {
        let palette = [[10u8, 20, 30], [200, 100, 0], [0, 255, 128], [90, 90, 90]];
        let colors = palette
            .iter()
            .cycle()
            .take(palette.len() * 25)
            .copied()
            .collect::<Vec<_>>();
        let pixels = pixel_set(&colors);
        let initial = palette.iter().map(|&c| to_f64(c)).collect::<Vec<_>>();

        let result = cluster_with_centroids(&pixels, initial.clone(), &KmeansOptions::new()).unwrap();
        assert!(result.converged);
        assert_eq!(result.iterations, 1);
        assert_eq!(result.centroids, initial);
        assert_eq!(result.counts, vec![25; 4]);
        for (i, &label) in result.labels.iter().enumerate() {
            assert_eq!(label as usize, i % palette.len());
        }
    }

    #[test]
    fn single_cluster_is_mean() {
        let colors = test_data_256();
        let pixels = pixel_set(&colors);
        let result = cluster(&pixels, 1, &KmeansOptions::new()).unwrap();

        let mut sums = [0u64; 3];
        for color in &colors {
            for (sum, &c) in sums.iter_mut().zip(color) {
                *sum += u64::from(c);
            }
        }
        #[allow(clippy::cast_precision_loss)]
        let mean = sums.map(|s| s as f64 / colors.len() as f64);

        assert!(result.converged);
        assert_eq!(result.centroids, vec![mean]);
        assert!(result.labels.iter().all(|&label| label == 0));
    }

    #[test]
    fn k_equal_to_pixel_count_has_zero_distortion() {
        let colors = test_data::<3>(64, 11);
        let pixels = pixel_set(&colors);
        let result = cluster(&pixels, 64, &KmeansOptions::new().seed(2)).unwrap();

        assert!(result.converged);
        assert_eq!(distortion(&pixels, &result), 0.0);
        for (&color, &label) in colors.iter().zip(&result.labels) {
            assert_eq!(result.centroids[label as usize], to_f64(color));
        }
    }

    #[test]
    fn empty_cluster_keeps_its_centroid() {
        let colors = three_blobs();
        let pixels = pixel_set(&colors);
        let far = [-1000.0, -1000.0, -1000.0];
        let initial = vec![
            to_f64(colors[0]),
            far,
            to_f64(colors[1]),
            to_f64(colors[2]),
        ];

        let mut state = State::new(colors.as_slice(), initial);
        for _ in 0..5 {
            state.assign();
            state.accumulate();
            assert_eq!(state.counts[1], 0);
            state.update(Tolerance::DEFAULT);
            assert_eq!(state.centroids[1], far);
        }

        let initial = vec![to_f64(colors[0]), far, to_f64(colors[1])];
        let result = cluster_with_centroids(&pixels, initial, &KmeansOptions::new()).unwrap();
        assert_shape(&result, 3, colors.len());
        assert_eq!(result.centroids[1], far);
        assert_eq!(result.counts[1], 0);
        assert_eq!(result.empty_clusters(), 1);
    }

    #[test]
    fn separates_blobs() {
        let colors = three_blobs();
        let pixels = pixel_set(&colors);
        let initial = colors[..3].iter().map(|&c| to_f64(c)).collect();
        let result = cluster_with_centroids(&pixels, initial, &KmeansOptions::new()).unwrap();

        assert!(result.converged);
        for i in 0..3 {
            let label = result.labels[i];
            assert!(result
                .labels
                .iter()
                .skip(i)
                .step_by(3)
                .all(|&l| l == label));
        }
        assert_eq!(result.counts, vec![100; 3]);
    }

    #[test]
    fn ties_go_to_lowest_index() {
        let centroids = [[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [10.0, 0.0, 0.0], [-10.0, 0.0, 0.0]];
        assert_eq!(nearest_centroid(&centroids, [5.0, 0.0, 0.0]), Some(0));
        assert_eq!(nearest_centroid(&centroids, [9.0, 0.0, 0.0]), Some(1));
        assert_eq!(nearest_centroid(&centroids, [-5.0, 0.0, 0.0]), Some(0));
        assert_eq!(nearest_centroid::<3>(&[], [0.0; 3]), None);

        // duplicate pixels as initial centroids: only the first one gets pixels
        let colors = [[1u8, 1, 1], [1, 1, 1], [9, 9, 9]];
        let pixels = pixel_set(&colors);
        let initial = vec![[1.0; 3], [1.0; 3], [9.0; 3]];
        let result = cluster_with_centroids(&pixels, initial, &KmeansOptions::new()).unwrap();
        assert_eq!(result.labels, vec![0, 0, 2]);
        assert_eq!(result.counts, vec![2, 0, 1]);
    }

    #[test]
    fn naive_nearest_neighbor_oracle() {
        let centroids = test_data_256()[..37].iter().map(|&c| to_f64(c)).collect::<Vec<_>>();
        for color in test_data_1024() {
            let color = to_f64(color);
            let expected = centroids
                .iter()
                .map(|&centroid| OrderedFloat(squared_euclidean_distance(centroid, color)))
                .min()
                .unwrap()
                .0;
            let actual = squared_euclidean_distance(
                color,
                centroids[nearest_centroid(&centroids, color).unwrap()],
            );
            assert_eq!(expected, actual);
        }
    }

    #[test]
    fn iteration_limit_is_not_an_error() {
        let colors = test_data_1024();
        let pixels = pixel_set(&colors);
        let result = cluster(&pixels, 32, &KmeansOptions::new().max_iterations(1)).unwrap();
        assert_eq!(result.iterations, 1);
        assert!(!result.converged);
        assert_shape(&result, 32, colors.len());
    }

    #[test]
    fn invalid_parameters() {
        let colors = test_data::<3>(4, 0);
        let pixels = pixel_set(&colors);
        let options = KmeansOptions::new();

        assert!(matches!(cluster(&pixels, 0, &options), Err(Error::InvalidK { k: 0 })));
        assert!(matches!(
            cluster(&pixels, 5, &options),
            Err(Error::InsufficientPixels { k: 5, pixels: 4 })
        ));
        assert!(matches!(
            cluster(&pixels, 2, &options.max_iterations(0)),
            Err(Error::InvalidMaxIterations)
        ));
        assert!(matches!(
            cluster_with_centroids(&pixels, Vec::new(), &options),
            Err(Error::InvalidK { k: 0 })
        ));

        let empty = pixel_set::<3>(&[]);
        assert!(matches!(
            cluster(&empty, 1, &options),
            Err(Error::InsufficientPixels { k: 1, pixels: 0 })
        ));
    }

    #[test]
    fn input_is_not_mutated() {
        let colors = test_data_256();
        let copy = colors.clone();
        let pixels = pixel_set(&colors);
        let _ = cluster(&pixels, 8, &KmeansOptions::new()).unwrap();
        assert_eq!(colors, copy);
    }

    #[test]
    fn sixteen_bit_components() {
        let colors = (0..200u16).map(|i| [i * 300, 65535 - i * 300, 7]).collect::<Vec<_>>();
        let pixels = PixelSet::try_from(colors.as_slice()).unwrap();
        let result = cluster(&pixels, 4, &KmeansOptions::new()).unwrap();
        assert_shape(&result, 4, colors.len());
    }

    #[test]
    #[cfg(feature = "threads")]
    fn single_and_multi_threaded_match() {
        for (k, seed) in [(1, 0), (8, 1), (61, 2), (256, 3)] {
            let colors = test_data_1024();
            let pixels = pixel_set(&colors);
            let options = KmeansOptions::new().seed(seed);

            let single = cluster(&pixels, k, &options).unwrap();
            let par = cluster_par(&pixels, k, &options).unwrap();
            assert_eq!(single, par);
        }

        let colors = three_blobs();
        let pixels = pixel_set(&colors);
        let initial = vec![to_f64(colors[0]), [-1000.0; 3], to_f64(colors[1])];
        let single = cluster_with_centroids(&pixels, initial.clone(), &KmeansOptions::new()).unwrap();
        let par = cluster_par_with_centroids(&pixels, initial, &KmeansOptions::new()).unwrap();
        assert_eq!(single, par);
    }
}
