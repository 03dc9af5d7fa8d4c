// Copyright (c) Quantum Assertion Debugger Contributors.
// Licensed under the MIT License.

pub mod engine;
pub mod error;
pub mod frame;
pub mod history;

pub use engine::{Engine, RunAllOutcome, RunOutcome, StepOutcome};
pub use error::{EvalError, EvalResult};
pub use frame::Frame;
