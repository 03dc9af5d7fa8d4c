// The trait the execution engine drives its quantum state through: mutable
// gate methods keyed by qubit index, a measurement that both collapses and
// returns a bit, and a seedable RNG, collapsed to one dispatch-by-name
// method rather than one method per intrinsic, since this language's gate
// set is open-ended source text (`h`, `rx(0.5)`, a user-defined `gate`, ...)
// instead of a fixed compiler-known intrinsic list.

use num_complex::Complex64;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum StateError {
    #[error("unknown gate {0:?}")]
    UnknownGate(String),
    #[error("gate {name:?} expects {expected} qubit argument(s), got {actual}")]
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("qubit index {0} is out of range")]
    QubitOutOfRange(usize),
}

pub trait QuantumState {
    fn num_qubits(&self) -> usize;

    /// Applies a named gate. `params` holds the gate's angle arguments (if
    /// any); `qubits` holds its target qubits in source order (controls
    /// before targets, per this language's built-in gate set).
    fn apply_gate(
        &mut self,
        name: &str,
        params: &[f64],
        qubits: &[usize],
    ) -> Result<(), StateError>;

    /// Collapses `qubit` to a computational-basis outcome and returns it.
    fn measure(&mut self, qubit: usize) -> Result<bool, StateError>;

    /// Resets `qubit` to `|0⟩`, measuring and correcting if necessary.
    fn reset(&mut self, qubit: usize) -> Result<(), StateError>;

    /// The full state vector, basis index `i` having qubit 0 as its
    /// least-significant bit.
    fn amplitudes(&self) -> &[Complex64];

    fn set_seed(&mut self, seed: Option<u64>);
}
