// Density matrices, partial trace, and purity. Grounded on
// `toDensityMatrix` / `getPartialTraceFromStateVector` / `partialTraceIsPure`
// / `getSubStateVectorAmplitudes` in `ComplexMathematics.{hpp,cpp}`.
//
// Bit-index convention: qubit 0 is the least-significant bit of a basis-state
// index, matching `get-amplitude-bitstring`'s documented LSB-first layout.

use crate::AMPLITUDE_EPS;
use nalgebra::{DMatrix, SymmetricEigen};
use num_complex::Complex64;

pub type DensityMatrix = DMatrix<Complex64>;

#[derive(Debug, thiserror::Error)]
pub enum LinalgError {
    #[error("sub-state is not separable from the rest of the system")]
    NotSeparable,
    #[error("amplitude vector length {0} is not a power of two")]
    NotAPowerOfTwo(usize),
}

/// `ρ = |ψ⟩⟨ψ|` for a pure state vector.
#[must_use]
pub fn density_matrix_of_pure_state(amplitudes: &[Complex64]) -> DensityMatrix {
    let n = amplitudes.len();
    DMatrix::from_fn(n, n, |i, j| amplitudes[i] * amplitudes[j].conj())
}

/// Traces out every qubit not in `keep` (global qubit indices) from a
/// `num_qubits`-qubit density matrix, returning the reduced density matrix
/// over `keep`, in order of `keep`'s sorted-ascending bit positions.
#[must_use]
pub fn partial_trace(rho: &DensityMatrix, num_qubits: usize, keep: &[usize]) -> DensityMatrix {
    let mut keep = keep.to_vec();
    keep.sort_unstable();
    keep.dedup();
    let trace_out: Vec<usize> = (0..num_qubits).filter(|q| !keep.contains(q)).collect();

    let dim_keep = 1usize << keep.len();
    let dim_trace = 1usize << trace_out.len();

    DMatrix::from_fn(dim_keep, dim_keep, |a, b| {
        let mut sum = Complex64::new(0.0, 0.0);
        for e in 0..dim_trace {
            let i = compose_index(&keep, a, &trace_out, e);
            let j = compose_index(&keep, b, &trace_out, e);
            sum += rho[(i, j)];
        }
        sum
    })
}

fn compose_index(keep: &[usize], keep_val: usize, trace: &[usize], trace_val: usize) -> usize {
    let mut idx = 0usize;
    for (p, &q) in keep.iter().enumerate() {
        if (keep_val >> p) & 1 == 1 {
            idx |= 1 << q;
        }
    }
    for (p, &q) in trace.iter().enumerate() {
        if (trace_val >> p) & 1 == 1 {
            idx |= 1 << q;
        }
    }
    idx
}

/// `tr(ρ²) ≈ 1`, the legality condition for extracting a sub-state vector.
#[must_use]
pub fn is_pure(rho: &DensityMatrix) -> bool {
    let squared = rho * rho;
    let trace: f64 = (0..squared.nrows()).map(|i| squared[(i, i)].re).sum();
    (trace - 1.0).abs() <= 1e-6
}

/// Extracts the sub-state-vector amplitudes for `qubits` (global indices)
/// from a full statevector of `num_qubits` qubits, by tracing out the
/// complement and picking the eigenvector of eigenvalue 1. Fails if the
/// partial trace is not pure, i.e. the requested qubits are entangled with
/// qubits outside the set.
pub fn sub_state_vector_amplitudes(
    full_state: &[Complex64],
    num_qubits: usize,
    qubits: &[usize],
) -> Result<Vec<Complex64>, LinalgError> {
    if full_state.len() != 1usize << num_qubits {
        return Err(LinalgError::NotAPowerOfTwo(full_state.len()));
    }
    let rho = density_matrix_of_pure_state(full_state);
    let mut keep = qubits.to_vec();
    keep.sort_unstable();
    let reduced = partial_trace(&rho, num_qubits, &keep);
    if !is_pure(&reduced) {
        return Err(LinalgError::NotSeparable);
    }
    Ok(extract_pure_amplitudes(&reduced))
}

/// Picks the eigenvector belonging to the (unique, up to phase) eigenvalue 1
/// of a pure reduced density matrix, and fixes the global phase so the
/// largest-magnitude amplitude is real and non-negative.
#[must_use]
pub fn extract_pure_amplitudes(rho: &DensityMatrix) -> Vec<Complex64> {
    let eigen = SymmetricEigen::new(rho.clone());
    let (best, _) = eigen
        .eigenvalues
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).expect("eigenvalues are finite"))
        .expect("reduced density matrix has at least one eigenvalue");

    let column = eigen.eigenvectors.column(best);
    let (phase_idx, _) = column
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.norm().partial_cmp(&b.norm()).expect("norms are finite"))
        .expect("eigenvector is non-empty");
    let phase = column[phase_idx] / Complex64::new(column[phase_idx].norm().max(AMPLITUDE_EPS), 0.0);
    column.iter().map(|c| c / phase).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_1_SQRT_2;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    #[test]
    fn bell_state_is_not_separable() {
        let bell = vec![
            c(FRAC_1_SQRT_2, 0.0),
            c(0.0, 0.0),
            c(0.0, 0.0),
            c(FRAC_1_SQRT_2, 0.0),
        ];
        let result = sub_state_vector_amplitudes(&bell, 2, &[0]);
        assert!(matches!(result, Err(LinalgError::NotSeparable)));
    }

    #[test]
    fn product_state_sub_state_is_separable() {
        // |0>|+> : qubit 0 is |+>, qubit 1 is |0>.
        let h = FRAC_1_SQRT_2;
        let state = vec![c(h, 0.0), c(h, 0.0), c(0.0, 0.0), c(0.0, 0.0)];
        let sub = sub_state_vector_amplitudes(&state, 2, &[0]).expect("separable");
        assert!((sub[0].norm() - h).abs() < 1e-6);
        assert!((sub[1].norm() - h).abs() < 1e-6);
    }

    #[test]
    fn partial_trace_of_full_system_is_identity() {
        let h = FRAC_1_SQRT_2;
        let state = vec![c(h, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(h, 0.0)];
        let rho = density_matrix_of_pure_state(&state);
        let reduced = partial_trace(&rho, 2, &[0, 1]);
        for i in 0..4 {
            for j in 0..4 {
                assert!((reduced[(i, j)] - rho[(i, j)]).norm() < 1e-9);
            }
        }
    }
}
