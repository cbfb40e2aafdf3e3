use crate::units::Real;

/// Solves the dense system `matrix * x = rhs` in place by Gauss-Jordan
/// elimination with partial pivoting. On return `rhs` holds the solution and
/// `matrix` is reduced scratch.
///
/// `matrix` is row-major with `n * n` entries, n at most 3.
/// Deterministic and infallible by contract: for singular or near-singular
/// input the elimination runs through anyway and the result is numerically
/// unstable, up to NaN/inf entries. Callers gate on the solution they get
/// back, not on a solver-side failure signal.
pub fn gauss_solve(matrix: &mut [Real], rhs: &mut [Real], n: usize) {
    debug_assert!(n >= 1 && n <= 3);
    debug_assert_eq!(matrix.len(), n * n);
    debug_assert_eq!(rhs.len(), n);

    for col in 0..n {
        let mut pivot_row = col;
        for row in (col + 1)..n {
            if matrix[row * n + col].abs() > matrix[pivot_row * n + col].abs() {
                pivot_row = row;
            }
        }
        if pivot_row != col {
            for k in 0..n {
                matrix.swap(col * n + k, pivot_row * n + k);
            }
            rhs.swap(col, pivot_row);
        }

        // inf for an exactly singular column; propagates into the solution
        let pivot_inv = 1.0 / matrix[col * n + col];
        for k in 0..n {
            matrix[col * n + k] *= pivot_inv;
        }
        rhs[col] *= pivot_inv;

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = matrix[row * n + col];
            if factor == 0.0 {
                continue;
            }
            for k in 0..n {
                matrix[row * n + k] -= factor * matrix[col * n + k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }
}
