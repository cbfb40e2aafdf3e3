use cgmath::prelude::*;
use criterion::{black_box, criterion_group, Criterion};

use sphcorr::{
    sph::{GradientCorrection, GradientCorrectionPreStep, Kernel, KernelSumCorrection, MixedKernelCorrection, NeighborLists, PairGradient, ParticleIndex, Particles},
    units::*,
};

// 2d cubic spline (Monaghan 1992).
struct CubicSpline2d;
impl Kernel for CubicSpline2d {
    fn evaluate(&self, r: Real, h: Real) -> Real {
        let normalizer = 40.0 / (7.0 * std::f64::consts::PI as Real * h * h);
        let q = r / h;
        if q <= 0.5 {
            normalizer * (1.0 + (q * q * q - q * q) * 6.0)
        } else if q <= 1.0 {
            normalizer * (1.0 - q).powi(3) * 2.0
        } else {
            0.0
        }
    }

    fn gradient(&self, xij: Vector, r: Real, h: Real) -> Vector {
        if r < 1.0e-10 {
            return Vector::zero();
        }
        let normalizer = 40.0 / (7.0 * std::f64::consts::PI as Real * h * h);
        let q = r / h;
        let dw_dq = if q <= 0.5 {
            normalizer * (q * q * 3.0 - q * 2.0) * 6.0
        } else if q <= 1.0 {
            -normalizer * (1.0 - q).powi(2) * 6.0
        } else {
            return Vector::zero();
        };
        xij * (dw_dq / (h * r))
    }
}

fn build_scene() -> (Particles, NeighborLists) {
    let spacing: Real = 0.01;
    let smoothing_length = 2.0 * spacing;
    let num_per_side = 50;

    let mut particles = Particles::new();
    particles.add_particle_block(
        Point::new(0.0, 0.0, 0.0),
        num_per_side,
        num_per_side,
        spacing,
        0.5, // jittered so supports are irregular like in a real simulation
        smoothing_length,
        1000.0 * spacing * spacing,
        1000.0,
    );

    // Brute force neighbor search; good enough for benchmark setup.
    let num = particles.num_particles();
    let mut lists = vec![Vec::new(); num];
    for a in 0..num {
        for b in 0..num {
            let r_sq = (particles.positions[a] - particles.positions[b]).magnitude2();
            if r_sq <= smoothing_length * smoothing_length {
                lists[a].push(b as ParticleIndex);
            }
        }
    }
    (particles, NeighborLists::from_lists(&lists))
}

fn bench_kernel_correction(c: &mut Criterion) {
    let (particles, neighbors) = build_scene();
    let kernel = black_box(CubicSpline2d);
    let num_neighbors: usize = (0..particles.num_particles()).map(|a| neighbors.num_neighbors(a)).sum();

    c.bench_function(
        &format!("bench_kernel_sum_correction - {} particles, {} pairs", particles.num_particles(), num_neighbors),
        |b| {
            let mut correction = KernelSumCorrection::new();
            b.iter(|| correction.compute(&particles, &neighbors, &kernel))
        },
    );

    c.bench_function(
        &format!("bench_gradient_correction_prestep - {} particles, {} pairs", particles.num_particles(), num_neighbors),
        |b| {
            let mut prestep = GradientCorrectionPreStep::new(2);
            b.iter(|| prestep.compute(&particles, &neighbors, &kernel))
        },
    );

    c.bench_function(
        &format!("bench_mixed_kernel_correction - {} particles, {} pairs", particles.num_particles(), num_neighbors),
        |b| {
            let mut mixed = MixedKernelCorrection::new(2);
            b.iter(|| mixed.compute(&particles, &neighbors, &kernel))
        },
    );

    let mut prestep = GradientCorrectionPreStep::new(2);
    prestep.compute(&particles, &neighbors, &kernel);
    let correction = GradientCorrection::new(2);
    let pairs_template: Vec<PairGradient> = (0..particles.num_particles())
        .flat_map(|a| {
            let particles = &particles;
            neighbors.neighbors(a).iter().filter_map(move |&b| {
                let xij = particles.positions[a] - particles.positions[b as usize];
                let r = xij.magnitude();
                if r < 1.0e-12 {
                    return None;
                }
                let hij = particles.pair_smoothing_length(a, b as usize);
                Some(PairGradient {
                    dest: a as ParticleIndex,
                    gradient: CubicSpline2d.gradient(xij, r, hij),
                    smoothing_length: hij,
                })
            })
        })
        .collect();

    c.bench_function(&format!("bench_correct_gradients - {} pairs", pairs_template.len()), |b| {
        b.iter(|| {
            let mut pairs: Vec<PairGradient> = pairs_template
                .iter()
                .map(|p| PairGradient {
                    dest: p.dest,
                    gradient: p.gradient,
                    smoothing_length: p.smoothing_length,
                })
                .collect();
            correction.correct_gradients(prestep.moment_matrices(), &mut pairs);
            pairs
        })
    });
}

criterion_group!(kernel_correction, bench_kernel_correction);
