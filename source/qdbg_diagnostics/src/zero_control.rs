// Dynamic zero-control detection: a controlled gate whose control qubit was
// in |0> before it fired is a silent no-op, almost always a sign the caller
// meant to entangle something that never happened. Grounded on the
// "control-qubit sanity check" pass described for the assertion checker's
// diagnostics collaborator.

use num_complex::Complex64;
use qdbg_linalg::density::{density_matrix_of_pure_state, partial_trace};
use qdbg_linalg::AMPLITUDE_EPS;

/// The control-qubit positions (indices into `qubits`) for the built-in
/// controlled gates. Gates outside this list have no controls.
#[must_use]
pub fn control_positions(gate: &str, qubits: &[usize]) -> Vec<usize> {
    match gate {
        "cx" | "cnot" | "cy" | "cz" => qubits.get(..1).map(<[usize]>::to_vec).unwrap_or_default(),
        "ccx" | "toffoli" => qubits.get(..2).map(<[usize]>::to_vec).unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Returns the subset of `gate`'s controls that were in `|0>` (probability of
/// `|1>` below [`AMPLITUDE_EPS`]) immediately before it executed.
#[must_use]
pub fn zero_controls(
    pre_state: &[Complex64],
    num_qubits: usize,
    gate: &str,
    qubits: &[usize],
) -> Vec<usize> {
    let controls = control_positions(gate, qubits);
    if controls.is_empty() {
        return Vec::new();
    }
    let rho = density_matrix_of_pure_state(pre_state);
    controls
        .into_iter()
        .filter(|&c| {
            let reduced = partial_trace(&rho, num_qubits, &[c]);
            reduced[(1, 1)].re <= AMPLITUDE_EPS
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_zero_control_on_cx() {
        let state = vec![Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0), Complex64::new(0.0, 0.0), Complex64::new(0.0, 0.0)];
        let controls = zero_controls(&state, 2, "cx", &[0, 1]);
        assert_eq!(controls, vec![0]);
    }

    #[test]
    fn no_zero_control_when_control_is_one() {
        let state = vec![Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0), Complex64::new(0.0, 0.0)];
        let controls = zero_controls(&state, 2, "cx", &[0, 1]);
        assert!(controls.is_empty());
    }
}
