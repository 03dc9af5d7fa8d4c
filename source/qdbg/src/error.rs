// Copyright (c) Quantum Assertion Debugger Contributors.
// Licensed under the MIT License.

use miette::Diagnostic;
use qdbg_ast::InstrId;
use qdbg_data_structures::error::WithSource;
use qdbg_eval::EvalError;
use qdbg_frontend::FrontendError;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
pub enum DebuggerError {
    #[error("no program is loaded")]
    NotReady,
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] WithSource<FrontendError>),
    #[error(transparent)]
    Eval(#[from] EvalError),
    #[error("instruction {0:?} is out of range")]
    UnknownInstruction(InstrId),
    #[error("byte offset {0} does not fall inside any instruction")]
    NoInstructionAtOffset(u32),
    #[error("requested sub-state is not separable from the rest of the system")]
    NotSeparable,
}

pub type DebuggerResult<T> = Result<T, DebuggerError>;
