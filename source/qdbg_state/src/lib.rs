// Copyright (c) Quantum Assertion Debugger Contributors.
// Licensed under the MIT License.

pub mod backend;
pub mod statevector;

pub use backend::{QuantumState, StateError};
pub use statevector::StatevectorBackend;
