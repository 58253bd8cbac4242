//! Dense helpers for the small symmetric systems the bandit solves.

use super::{BanditError, DesignMatrix, FEATURE_DIM, FeatureVector};

/// Relative tolerance used when checking symmetry of restored matrices.
const SYMMETRY_EPSILON: f64 = 1e-9;

pub(crate) fn identity() -> DesignMatrix {
    let mut matrix = [[0.0; FEATURE_DIM]; FEATURE_DIM];
    for (i, row) in matrix.iter_mut().enumerate() {
        row[i] = 1.0;
    }
    matrix
}

pub(crate) fn is_symmetric(matrix: &DesignMatrix) -> bool {
    for i in 0..FEATURE_DIM {
        for j in (i + 1)..FEATURE_DIM {
            let (a, b) = (matrix[i][j], matrix[j][i]);
            let scale = a.abs().max(b.abs()).max(1.0);
            if (a - b).abs() > SYMMETRY_EPSILON * scale {
                return false;
            }
        }
    }
    true
}

/// Lower-triangular `L` with `L·Lᵀ = matrix`. Reads the lower triangle only.
pub(crate) fn cholesky(matrix: &DesignMatrix) -> Result<DesignMatrix, BanditError> {
    let mut lower = [[0.0; FEATURE_DIM]; FEATURE_DIM];
    for i in 0..FEATURE_DIM {
        for j in 0..=i {
            let mut sum = matrix[i][j];
            for k in 0..j {
                sum -= lower[i][k] * lower[j][k];
            }
            if i == j {
                if !sum.is_finite() || sum <= 0.0 {
                    return Err(BanditError::NotPositiveDefinite { pivot: i });
                }
                lower[i][i] = sum.sqrt();
            } else {
                lower[i][j] = sum / lower[j][j];
            }
        }
    }
    Ok(lower)
}

/// Inverse of a symmetric positive-definite matrix.
pub(crate) fn invert_spd(matrix: &DesignMatrix) -> Result<DesignMatrix, BanditError> {
    let lower = cholesky(matrix)?;
    let mut inverse = [[0.0; FEATURE_DIM]; FEATURE_DIM];
    for column in 0..FEATURE_DIM {
        let mut unit = [0.0; FEATURE_DIM];
        unit[column] = 1.0;
        let solved = solve_with_factor(&lower, &unit);
        for row in 0..FEATURE_DIM {
            inverse[row][column] = solved[row];
        }
    }
    if inverse.iter().flatten().any(|value| !value.is_finite()) {
        return Err(BanditError::NonFinite { what: "inverse" });
    }
    Ok(inverse)
}

/// Solves `L·Lᵀ·x = rhs` by forward then backward substitution.
fn solve_with_factor(lower: &DesignMatrix, rhs: &FeatureVector) -> FeatureVector {
    let mut forward = [0.0; FEATURE_DIM];
    for i in 0..FEATURE_DIM {
        let mut sum = rhs[i];
        for k in 0..i {
            sum -= lower[i][k] * forward[k];
        }
        forward[i] = sum / lower[i][i];
    }

    let mut solution = [0.0; FEATURE_DIM];
    for i in (0..FEATURE_DIM).rev() {
        let mut sum = forward[i];
        for k in (i + 1)..FEATURE_DIM {
            sum -= lower[k][i] * solution[k];
        }
        solution[i] = sum / lower[i][i];
    }
    solution
}

pub(crate) fn mat_vec(matrix: &DesignMatrix, vector: &FeatureVector) -> FeatureVector {
    let mut out = [0.0; FEATURE_DIM];
    for (slot, row) in out.iter_mut().zip(matrix.iter()) {
        *slot = dot(row, vector);
    }
    out
}

pub(crate) fn dot(a: &FeatureVector, b: &FeatureVector) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
