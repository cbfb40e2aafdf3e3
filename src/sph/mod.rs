pub use self::gauss_solve::gauss_solve;
pub use self::kernel_correction::{
    GradientCorrection, GradientCorrectionPreStep, KernelSumCorrection, MixedKernelCorrection, MomentMatrix, PairGradient,
};
pub use self::neighbor_list::{NeighborLists, ParticleIndex};
pub use self::particles::Particles;
pub use self::smoothing_kernel::Kernel;

mod gauss_solve;
mod kernel_correction;
mod neighbor_list;
mod particles;
mod smoothing_kernel;
