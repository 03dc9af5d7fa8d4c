// Instruction graph nodes: an index-addressed node carrying its own span,
// successor, and dependency metadata, rather than a pointer-chasing AST.

use crate::assertion::Assertion;
use crate::ids::InstrId;
use qdbg_data_structures::Span;
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq)]
pub enum InstructionKind {
    Nop,
    Simulate(SimulateOp),
    Assertion(Assertion),
    Call {
        callee: Rc<str>,
        /// Parameter name -> argument name, in declaration order.
        substitutions: Vec<(Rc<str>, Rc<str>)>,
    },
    Return,
}

/// A simulatable (non-assertion, non-control) statement: gate applications,
/// measurement, reset, barrier, and classically-controlled gates.
#[derive(Clone, Debug, PartialEq)]
pub enum SimulateOp {
    Gate {
        name: Rc<str>,
        params: Vec<f64>,
        targets: Vec<String>,
    },
    Measure {
        qubit: String,
        classical_bit: String,
    },
    Reset {
        qubit: String,
    },
    Barrier {
        targets: Vec<String>,
    },
    ClassicControlled {
        register: String,
        expected_value: u64,
        gate: Box<SimulateOp>,
    },
}

impl SimulateOp {
    /// The qubit/classical targets this operation reads or writes, in order.
    #[must_use]
    pub fn targets(&self) -> Vec<String> {
        match self {
            SimulateOp::Gate { targets, .. } | SimulateOp::Barrier { targets } => targets.clone(),
            SimulateOp::Measure {
                qubit,
                classical_bit,
            } => vec![qubit.clone(), classical_bit.clone()],
            SimulateOp::Reset { qubit } => vec![qubit.clone()],
            SimulateOp::ClassicControlled { gate, .. } => gate.targets(),
        }
    }
}

/// Where control resumes after this instruction executes, forward. A
/// RETURN's successor is the sentinel that tells the engine to pop
/// `call_return_stack` rather than a literal instruction index (there is no
/// magic "successor 0"); the last instruction in the program carries
/// `Halt` for the same reason.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Successor {
    Instruction(InstrId),
    PopCallStack,
    Halt,
}

/// `(producer instruction, producer argument position)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dependency {
    pub producer: InstrId,
    pub arg_position: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
    pub index: InstrId,
    pub kind: InstructionKind,
    /// Byte span into the raw (pre-strip) source.
    pub span: Span,
    pub successor: Successor,
    pub targets: Vec<String>,
    pub dependencies: Vec<Dependency>,
    /// Name of the gate definition whose body textually contains this
    /// instruction, if any. Used to scope data-dependency and interaction
    /// searches to "the same function scope".
    pub enclosing_function: Option<Rc<str>>,
    /// Present only on the NOP that heads a `gate ... { ... }` definition:
    /// the indices of every instruction making up its body, used to resolve
    /// breakpoints that land inside an opaque call.
    pub function_body: Option<Vec<InstrId>>,
}

impl Instruction {
    #[must_use]
    pub fn is_assertion(&self) -> bool {
        matches!(self.kind, InstructionKind::Assertion(_))
    }

    #[must_use]
    pub fn assertion(&self) -> Option<&Assertion> {
        match &self.kind {
            InstructionKind::Assertion(a) => Some(a),
            _ => None,
        }
    }

    #[must_use]
    pub fn assertion_mut(&mut self) -> Option<&mut Assertion> {
        match &mut self.kind {
            InstructionKind::Assertion(a) => Some(a),
            _ => None,
        }
    }
}
