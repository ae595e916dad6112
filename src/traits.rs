use num_traits::{AsPrimitive, NumAssignOps, Zero};
use palette::cast::ArrayCast;

/// A color type that can be viewed as an array of `N` components,
/// for example `Srgb<u8>` as `[u8; 3]`.
pub trait ColorComponents<Component, const N: usize>:
    ArrayCast<Array = [Component; N]> + Copy + 'static
{
}

impl<Color, Component, const N: usize> ColorComponents<Component, N> for Color where
    Color: ArrayCast<Array = [Component; N]> + Copy + 'static
{
}

/// A color component type whose per-channel sums can be accumulated exactly
/// in a wider integer type.
///
/// Exact sums make the cluster means independent of the order in which pixels are added,
/// so the sequential and parallel clusterers produce bit-identical centroids.
pub trait SumPromotion: Copy + Into<f64> + Into<Self::Sum> + 'static {
    /// The integer type used to hold a sum of many components.
    type Sum: Zero + NumAssignOps + Copy + AsPrimitive<f64> + Send + Sync;
}

impl SumPromotion for u8 {
    type Sum = u64;
}

impl SumPromotion for u16 {
    type Sum = u64;
}
