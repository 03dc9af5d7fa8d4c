// Copyright (c) Quantum Assertion Debugger Contributors.
// Licensed under the MIT License.

pub mod complex;
pub mod density;
pub mod entanglement;

pub use density::{DensityMatrix, LinalgError};

/// The single negligibility epsilon used throughout assertion evaluation and
/// diagnostics, rather than separate thresholds per assertion kind.
pub const AMPLITUDE_EPS: f64 = 1e-9;

/// `|a|² > AMPLITUDE_EPS`, i.e. "this basis amplitude is non-negligible".
#[must_use]
pub fn is_significant(amplitude: num_complex::Complex64) -> bool {
    amplitude.norm_sqr() > AMPLITUDE_EPS
}
