// The seam between the checker and the engine: a small trait the engine
// implements, rather than the checker owning or borrowing engine state
// directly.

use num_complex::Complex64;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum CheckError {
    #[error("reference to undeclared qubit or register {0:?}")]
    UnknownTarget(String),
    #[error("equality circuit bodies may not contain nested assertions")]
    NestedAssertion,
    #[error("error executing equality circuit body: {0}")]
    CircuitExecution(String),
}

pub trait CheckContext {
    fn num_qubits(&self) -> usize;

    /// The engine's current amplitude vector.
    fn amplitudes(&self) -> &[Complex64];

    /// Resolves a textual target (`"q[0]"`, or a gate parameter name while
    /// inside a call) to a global qubit index, honoring the engine's current
    /// call-substitution chain.
    fn resolve_qubit(&self, target: &str) -> Result<usize, CheckError>;

    /// Runs `circuit_text` from `|0...0>` on a fresh `targets.len()`-qubit
    /// state, mapping each token in `circuit_text` that matches a name in
    /// `targets` to that target's position, and returns the resulting
    /// amplitudes, for an equality assertion's circuit body.
    fn simulate_circuit(&self, circuit_text: &str, targets: &[String]) -> Result<Vec<Complex64>, CheckError>;
}
