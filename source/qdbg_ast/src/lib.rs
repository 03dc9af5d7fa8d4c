// Copyright (c) Quantum Assertion Debugger Contributors.
// Licensed under the MIT License.

pub mod assertion;
pub mod ids;
pub mod instruction;
pub mod registers;

pub use assertion::{Assertion, AssertionError, EqualityBody};
pub use ids::InstrId;
pub use instruction::{Dependency, Instruction, InstructionKind, SimulateOp, Successor};
pub use registers::{
    ClassicalRegisterDefinition, QubitRegisterDefinition, Variable, VariableType, VariableValue,
};
