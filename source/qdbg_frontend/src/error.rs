use miette::Diagnostic;
use qdbg_ast::AssertionError;
use qdbg_data_structures::Span;
use thiserror::Error;

#[derive(Clone, Debug, Diagnostic, Error)]
pub enum FrontendError {
    #[error("gate {0:?} is declared without a body")]
    GateWithoutBody(String),
    #[error("classically-controlled gate must be a single statement, not a block")]
    ClassicControlledHasBlock,
    #[error("unbalanced braces starting at {0}")]
    UnbalancedBraces(Span),
    #[error("unknown statement: {0:?}")]
    UnknownStatement(String),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Assertion(#[from] AssertionError),
    #[error("call to {callee:?} passes {actual} argument(s), expected {expected}")]
    ArityMismatch {
        callee: String,
        expected: usize,
        actual: usize,
    },
    #[error("call to undeclared gate {0:?}")]
    UnknownCallee(String),
    #[error("qubit index {index} is out of range for register {register:?} of size {size}")]
    QubitOutOfRange {
        register: String,
        index: usize,
        size: usize,
    },
    #[error("reference to undeclared register {0:?}")]
    UnknownRegister(String),
}

impl FrontendError {
    /// The span to underline when presenting this error against the
    /// original source text. Only [`FrontendError::UnbalancedBraces`] is
    /// raised with a known location; every other variant is caught before a
    /// span would be meaningful, so it falls back to the start of the file.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            FrontendError::UnbalancedBraces(span) => *span,
            _ => Span::new(0, 0),
        }
    }
}

pub type FrontendResult<T> = Result<T, FrontendError>;
