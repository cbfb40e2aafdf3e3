/// Smoothing Kernels.
pub use self::kernel::Kernel;

mod kernel;
