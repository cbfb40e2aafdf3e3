use crate::units::*;

/// Per-particle fields read by the correction equations.
///
/// Structure-of-arrays view owned by the surrounding solver. The correction
/// passes only ever read these; particles are created and destroyed elsewhere.
pub struct Particles {
    pub positions: Vec<Point>,
    pub smoothing_lengths: Vec<Real>, // typically expressed as 'h'
    pub masses: Vec<Real>,
    pub densities: Vec<Real>, // Local densities ρ
}

#[allow(clippy::new_without_default)]
impl Particles {
    pub fn new() -> Particles {
        Particles {
            positions: Vec::new(),
            smoothing_lengths: Vec::new(),
            masses: Vec::new(),
            densities: Vec::new(),
        }
    }

    pub fn num_particles(&self) -> usize {
        self.positions.len()
    }

    pub fn push(&mut self, position: Point, smoothing_length: Real, mass: Real, density: Real) {
        self.positions.push(position);
        self.smoothing_lengths.push(smoothing_length);
        self.masses.push(mass);
        self.densities.push(density);
    }

    /// Discrete particle volume, used as the integration weight in kernel sums.
    #[inline]
    pub fn volume(&self, i: usize) -> Real {
        self.masses[i] / self.densities[i]
    }

    /// Pair smoothing length, the average of both particles' smoothing lengths.
    #[inline]
    pub fn pair_smoothing_length(&self, a: usize, b: usize) -> Real {
        (self.smoothing_lengths[a] + self.smoothing_lengths[b]) * 0.5
    }

    /// Seeds a jittered lattice block of equal particles in the xy plane.
    /// - `jitter_amount`: 0 for a perfect lattice. >1 and particles are no longer in a strict lattice.
    pub fn add_particle_block(
        &mut self,
        bottom_left: Point,
        num_particles_x: usize,
        num_particles_y: usize,
        step: Real,
        jitter_amount: Real,
        smoothing_length: Real,
        mass: Real,
        density: Real,
    ) {
        let num_particles = num_particles_x * num_particles_y;
        self.positions.reserve(num_particles);
        self.smoothing_lengths
            .resize(self.smoothing_lengths.len() + num_particles, smoothing_length);
        self.masses.resize(self.masses.len() + num_particles, mass);
        self.densities.resize(self.densities.len() + num_particles, density);

        let jitter_factor = step * jitter_amount;
        for y in 0..num_particles_y {
            for x in 0..num_particles_x {
                let mut jitter = (rand::random::<Vector>() - Vector::new(0.5, 0.5, 0.5)) * jitter_factor;
                jitter.z = 0.0;
                self.positions
                    .push(bottom_left + jitter + Vector::new(step * (x as Real), step * (y as Real), 0.0));
            }
        }
    }
}
