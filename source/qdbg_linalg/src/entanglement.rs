// Von Neumann entropy, mutual information, and the operational entanglement
// test. Grounded on `areQubitsEntangled` in `ComplexMathematics.cpp`, which
// traces each qubit's reduced 4x4 density matrix and checks for positive
// mutual information.

use crate::density::{partial_trace, DensityMatrix};
use nalgebra::SymmetricEigen;

/// `S(ρ) = -Σ λ log2(λ)`, treating eigenvalues in `(-ε, 0)` as 0 (numerical
/// noise around a zero eigenvalue of a positive-semidefinite matrix).
#[must_use]
pub fn von_neumann_entropy(rho: &DensityMatrix) -> f64 {
    let eigen = SymmetricEigen::new(rho.clone());
    eigen
        .eigenvalues
        .iter()
        .map(|&lambda| {
            let lambda = if lambda < 0.0 && lambda > -1e-9 {
                0.0
            } else {
                lambda
            };
            if lambda <= 0.0 {
                0.0
            } else {
                -lambda * lambda.log2()
            }
        })
        .sum()
}

/// `S(ρ_A) + S(ρ_B) - S(ρ_AB)` for two qubits of a `num_qubits`-qubit state.
#[must_use]
pub fn mutual_information(full_rho: &DensityMatrix, num_qubits: usize, q1: usize, q2: usize) -> f64 {
    let rho_a = partial_trace(full_rho, num_qubits, &[q1]);
    let rho_b = partial_trace(full_rho, num_qubits, &[q2]);
    let rho_ab = partial_trace(full_rho, num_qubits, &[q1, q2]);
    von_neumann_entropy(&rho_a) + von_neumann_entropy(&rho_b) - von_neumann_entropy(&rho_ab)
}

/// Two qubits are entangled iff their mutual information is strictly
/// positive.
#[must_use]
pub fn are_qubits_entangled(full_rho: &DensityMatrix, num_qubits: usize, q1: usize, q2: usize) -> bool {
    mutual_information(full_rho, num_qubits, q1, q2) > 1e-9
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::density_matrix_of_pure_state;
    use num_complex::Complex64;
    use std::f64::consts::FRAC_1_SQRT_2;

    fn c(re: f64) -> Complex64 {
        Complex64::new(re, 0.0)
    }

    #[test]
    fn bell_pair_is_entangled() {
        let h = FRAC_1_SQRT_2;
        let state = vec![c(h), c(0.0), c(0.0), c(h)];
        let rho = density_matrix_of_pure_state(&state);
        assert!(are_qubits_entangled(&rho, 2, 0, 1));
    }

    #[test]
    fn product_state_is_not_entangled() {
        let h = FRAC_1_SQRT_2;
        // qubit0 = |+>, qubit1 = |0>
        let state = vec![c(h), c(h), c(0.0), c(0.0)];
        let rho = density_matrix_of_pure_state(&state);
        assert!(!are_qubits_entangled(&rho, 2, 0, 1));
    }
}
