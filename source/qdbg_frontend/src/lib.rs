// Copyright (c) Quantum Assertion Debugger Contributors.
// Licensed under the MIT License.

pub mod classify;
pub mod error;
pub mod gatecall;
pub mod preprocess;
pub mod program;
pub mod scan;

pub use error::{FrontendError, FrontendResult};
pub use preprocess::preprocess;
pub use program::Program;
