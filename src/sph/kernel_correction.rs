use cgmath::prelude::*;
use rayon::prelude::*;

use super::gauss_solve::gauss_solve;
use super::neighbor_list::{NeighborLists, ParticleIndex};
use super::particles::Particles;
use super::smoothing_kernel::Kernel;
use crate::units::*;

// Pairs closer than this contribute nothing to the moment matrix (guards the 1/r in the accumulation).
const COINCIDENT_PAIR_THRESHOLD: Real = 1.0e-12;

/// Per-particle first moment of the neighbor gradient distribution.
///
/// Row-major 3x3 tensor covering both 2d and 3d runs; only the leading
/// dim×dim block is ever written, the remainder stays exactly zero.
/// Symmetric by construction since it is accumulated from outer products of
/// the pair displacement with itself.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct MomentMatrix([Real; 9]);

impl MomentMatrix {
    pub fn zero() -> MomentMatrix {
        MomentMatrix([0.0; 9])
    }

    pub fn as_flat(&self) -> &[Real; 9] {
        &self.0
    }
}

impl std::ops::Index<(usize, usize)> for MomentMatrix {
    type Output = Real;
    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &Real {
        &self.0[3 * row + col]
    }
}

impl std::ops::IndexMut<(usize, usize)> for MomentMatrix {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Real {
        &mut self.0[3 * row + col]
    }
}

fn assert_valid_dimension(dim: usize) {
    assert!(dim == 2 || dim == 3, "kernel correction is defined for dim 2 and 3, got {}", dim);
}

/// Zeroth-order kernel correction after Bonet & Lok 1999.
///
/// Accumulates cwij = Σ V_b W_ab per particle. Downstream field estimates
/// divide their kernel-interpolated sums by it so the weights sum to one over
/// the actual (possibly truncated) support.
pub struct KernelSumCorrection {
    kernel_sums: Vec<Real>,
}

#[allow(clippy::new_without_default)]
impl KernelSumCorrection {
    pub fn new() -> KernelSumCorrection {
        KernelSumCorrection { kernel_sums: Vec::new() }
    }

    /// cwij per particle. Valid after `compute`, until the next `compute`.
    pub fn kernel_sums(&self) -> &[Real] {
        &self.kernel_sums
    }

    pub fn compute(&mut self, particles: &Particles, neighbors: &NeighborLists, kernel: &(impl Kernel + std::marker::Sync)) {
        microprofile::scope!("KernelSumCorrection", "compute");
        assert_eq!(particles.num_particles(), neighbors.num_destinations());
        self.kernel_sums.resize(particles.num_particles(), 0.0);

        let positions = &particles.positions;
        let smoothing_lengths = &particles.smoothing_lengths;
        self.kernel_sums.par_iter_mut().enumerate().for_each(|(a, cwij)| {
            *cwij = 0.0;
            let ra = positions[a];
            let ha = smoothing_lengths[a];
            for &b in neighbors.neighbors(a) {
                let b = b as usize;
                let xij = ra - positions[b];
                let hij = (ha + smoothing_lengths[b]) * 0.5;
                *cwij += particles.volume(b) * kernel.evaluate(xij.magnitude(), hij);
            }
        });
    }
}

/// Assembles the first-moment correction matrix
/// `M_a = Σ_b V_b |∇W_ab| (xij ⊗ xij) / r` per particle.
///
/// The inverse of this matrix renormalizes kernel gradient sums so they
/// reproduce linear fields on irregular supports (Bonet & Lok 1999). Assembly
/// only; the pair-wise solve against it happens in `GradientCorrection`.
pub struct GradientCorrectionPreStep {
    dim: usize,
    moment_matrices: Vec<MomentMatrix>,
}

impl GradientCorrectionPreStep {
    pub fn new(dim: usize) -> GradientCorrectionPreStep {
        assert_valid_dimension(dim);
        GradientCorrectionPreStep {
            dim,
            moment_matrices: Vec::new(),
        }
    }

    /// One matrix per particle. Valid after `compute`, until the next `compute`.
    pub fn moment_matrices(&self) -> &[MomentMatrix] {
        &self.moment_matrices
    }

    pub fn compute(&mut self, particles: &Particles, neighbors: &NeighborLists, kernel: &(impl Kernel + std::marker::Sync)) {
        microprofile::scope!("GradientCorrectionPreStep", "compute");
        assert_eq!(particles.num_particles(), neighbors.num_destinations());
        self.moment_matrices.resize(particles.num_particles(), MomentMatrix::zero());

        let dim = self.dim;
        let positions = &particles.positions;
        let smoothing_lengths = &particles.smoothing_lengths;
        self.moment_matrices.par_iter_mut().enumerate().for_each(|(a, moment_matrix)| {
            *moment_matrix = MomentMatrix::zero();
            let ra = positions[a];
            let ha = smoothing_lengths[a];
            for &b in neighbors.neighbors(a) {
                let b = b as usize;
                let xij = ra - positions[b];
                let r = xij.magnitude();
                if r < COINCIDENT_PAIR_THRESHOLD {
                    continue;
                }
                let hij = (ha + smoothing_lengths[b]) * 0.5;
                let dwij = kernel.gradient(xij, r, hij);
                let dw = dwij.magnitude();
                let volume = particles.volume(b);
                for i in 0..dim {
                    for j in 0..dim {
                        moment_matrix[(i, j)] += dw * volume * xij[i] * xij[j] / r;
                    }
                }
            }
        });
    }
}

/// One interacting pair as seen by the gradient corrector: destination
/// particle, raw pair kernel gradient (overwritten in place on acceptance)
/// and pair smoothing length.
pub struct PairGradient {
    pub dest: ParticleIndex,
    pub gradient: Vector,
    pub smoothing_length: Real,
}

/// Pair-wise kernel gradient correction `∇W̃_ab = L_a ∇W_ab` where `L_a` is
/// the inverse of the assembled moment matrix.
///
/// Near free surfaces and other sparse supports the moment matrix can be
/// arbitrarily ill-conditioned. The solve itself is unguarded; instead the
/// corrected gradient is accepted only if its relative change against the raw
/// gradient stays within `tol`, otherwise the raw gradient is kept. Both
/// outcomes are silent. This soft fallback is the scheme's stability
/// safeguard and must stay in place even though a hard singularity check may
/// look cleaner.
pub struct GradientCorrection {
    dim: usize,
    tol: Real,
}

impl GradientCorrection {
    pub const DEFAULT_TOLERANCE: Real = 0.5;

    pub fn new(dim: usize) -> GradientCorrection {
        Self::with_tolerance(dim, Self::DEFAULT_TOLERANCE)
    }

    pub fn with_tolerance(dim: usize, tol: Real) -> GradientCorrection {
        assert_valid_dimension(dim);
        GradientCorrection { dim, tol }
    }

    /// Corrects one pair gradient in place against the destination particle's
    /// moment matrix. Returns whether the correction was accepted; on
    /// rejection `dwij` is left untouched.
    pub fn correct_gradient(&self, moment_matrix: &MomentMatrix, dwij: &mut Vector, hij: Real) -> bool {
        let n = self.dim;

        let mut matrix = [0.0 as Real; 9];
        for i in 0..n {
            for j in 0..n {
                matrix[n * i + j] = moment_matrix[(i, j)];
            }
        }
        let mut solution = [0.0 as Real; 3];
        for i in 0..n {
            solution[i] = dwij[i];
        }
        gauss_solve(&mut matrix[..n * n], &mut solution[..n], n);

        let eps = 1.0e-4 * hij;
        let mut change = 0.0;
        for i in 0..n {
            change += (dwij[i] - solution[i]).abs() / (dwij[i].abs() + eps);
        }
        // NaN/inf out of a singular solve fails this comparison and keeps the raw gradient.
        if change <= self.tol {
            for i in 0..n {
                dwij[i] = solution[i];
            }
            true
        } else {
            false
        }
    }

    /// Batched variant over an explicit pair list. Pairs are independent, so
    /// this runs them in parallel.
    pub fn correct_gradients(&self, moment_matrices: &[MomentMatrix], pairs: &mut [PairGradient]) {
        microprofile::scope!("GradientCorrection", "correct_gradients");
        pairs.par_iter_mut().for_each(|pair| {
            self.correct_gradient(&moment_matrices[pair.dest as usize], &mut pair.gradient, pair.smoothing_length);
        });
    }
}

/// Mixed kernel-and-gradient correction after Bonet & Lok 1999.
///
/// Two passes over each particle's (stable) neighbor list: the first
/// accumulates the kernel sum `den = Σ V_b W_ab` and the gradient bias
/// `γ = Σ V_b ∇W_ab / den`, the second assembles the moment matrix from the
/// debiased gradients `(∇W_ab - γ) / den`. The debiased gradient already
/// reproduces constants, so a `GradientCorrection` fed with this matrix
/// targets full linear consistency instead of stacking two independent
/// corrections.
pub struct MixedKernelCorrection {
    dim: usize,
    kernel_sums: Vec<Real>,
    moment_matrices: Vec<MomentMatrix>,
}

impl MixedKernelCorrection {
    pub fn new(dim: usize) -> MixedKernelCorrection {
        assert_valid_dimension(dim);
        MixedKernelCorrection {
            dim,
            kernel_sums: Vec::new(),
            moment_matrices: Vec::new(),
        }
    }

    /// cwij per particle, here the debiasing denominator Σ V_b W_ab.
    pub fn kernel_sums(&self) -> &[Real] {
        &self.kernel_sums
    }

    pub fn moment_matrices(&self) -> &[MomentMatrix] {
        &self.moment_matrices
    }

    pub fn compute(&mut self, particles: &Particles, neighbors: &NeighborLists, kernel: &(impl Kernel + std::marker::Sync)) {
        microprofile::scope!("MixedKernelCorrection", "compute");
        assert_eq!(particles.num_particles(), neighbors.num_destinations());
        self.kernel_sums.resize(particles.num_particles(), 0.0);
        self.moment_matrices.resize(particles.num_particles(), MomentMatrix::zero());

        let dim = self.dim;
        let positions = &particles.positions;
        let smoothing_lengths = &particles.smoothing_lengths;
        self.moment_matrices
            .par_iter_mut()
            .zip(self.kernel_sums.par_iter_mut())
            .enumerate()
            .for_each(|(a, (moment_matrix, cwij))| {
                *moment_matrix = MomentMatrix::zero();
                let ra = positions[a];
                let ha = smoothing_lengths[a];
                let neighbor_list = neighbors.neighbors(a);

                let mut den = 0.0;
                let mut numerator = Vector::zero();
                for &b in neighbor_list {
                    let b = b as usize;
                    let xij = ra - positions[b];
                    let r = xij.magnitude();
                    let hij = (ha + smoothing_lengths[b]) * 0.5;
                    let dwij = kernel.gradient(xij, r, hij);
                    let volume = particles.volume(b);
                    den += volume * kernel.evaluate(r, hij);
                    for i in 0..dim {
                        numerator[i] += volume * dwij[i];
                    }
                }
                *cwij = den;

                for &b in neighbor_list {
                    let b = b as usize;
                    let xij = ra - positions[b];
                    let r = xij.magnitude();
                    if r < COINCIDENT_PAIR_THRESHOLD {
                        continue;
                    }
                    let hij = (ha + smoothing_lengths[b]) * 0.5;
                    let dwij = kernel.gradient(xij, r, hij);
                    let mut dwij_debiased = Vector::zero();
                    for i in 0..dim {
                        dwij_debiased[i] = (dwij[i] - numerator[i] / den) / den;
                    }
                    let dw = dwij_debiased.magnitude();
                    let volume = particles.volume(b);
                    for i in 0..dim {
                        for j in 0..dim {
                            moment_matrix[(i, j)] += dw * volume * xij[i] * xij[j] / r;
                        }
                    }
                }
            });
    }
}
