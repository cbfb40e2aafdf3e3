use crate::units::{Real, Vector};

/// SPH smoothing kernel, sampled per interacting pair.
///
/// Only radially symmetric kernels are supported.
/// Both methods take the pair smoothing length `h = 0.5 * (h_i + h_j)` instead of
/// baking a fixed smoothing length in at construction, so particle sets with
/// per-particle smoothing lengths work unchanged.
/// Assume support only within the smoothing length, i.e. for r>h user should assume 0 as result.
pub trait Kernel {
    /// Evaluates the kernel function W for a pair at distance r.
    /// `r`:   Length of the pair displacement.
    /// `h`:   Pair smoothing length.
    fn evaluate(&self, r: Real, h: Real) -> Real;

    /// Evaluates the gradient of the kernel with respect to the destination particle's position.
    /// Must return a finite vector (zero) for coincident pairs, i.e. r == 0.
    /// `xij`: Displacement from source to destination, x_i - x_j. Not normalized!
    /// `r`:   Length of `xij`.
    /// `h`:   Pair smoothing length.
    fn gradient(&self, xij: Vector, r: Real, h: Real) -> Vector;
}
