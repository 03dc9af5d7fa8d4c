use qdbg_ast::InstrId;
use qdbg_check::CheckError;
use qdbg_frontend::FrontendError;
use qdbg_state::StateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error(transparent)]
    Frontend(#[from] FrontendError),
    #[error(transparent)]
    Check(#[from] CheckError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error("call to undeclared gate {0:?}")]
    UnknownCallee(String),
    #[error("reference to undeclared variable or register {0:?}")]
    UnknownTarget(String),
    #[error("attempted to return with an empty call stack")]
    StackUnderflow,
    #[error("no history to step backward into")]
    NoHistory,
    #[error("instruction {0:?} does not exist in the loaded program")]
    UnknownInstruction(InstrId),
    #[error("program successor graph is inconsistent at {0:?}")]
    CorruptSuccessor(InstrId),
}

pub type EvalResult<T> = Result<T, EvalError>;
