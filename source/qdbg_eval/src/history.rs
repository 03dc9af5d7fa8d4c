// Backward stepping is implemented by recording a full snapshot before every
// forward step and restoring it on undo, rather than symbolically reversing
// gates - measurement and reset are not unitary, so there is no gate-level
// inverse to run in general. The engine clears this history whenever a
// measurement or reset executes, since no earlier snapshot can be restored
// across an irreversible step.

use crate::frame::CallStack;
use num_complex::Complex64;
use qdbg_ast::{InstrId, Variable};

#[derive(Clone)]
pub struct Snapshot {
    pub pc: Option<InstrId>,
    pub call_stack: CallStack,
    pub variables: Vec<Variable>,
    pub amplitudes: Vec<Complex64>,
}

#[derive(Default)]
pub struct History {
    snapshots: Vec<Snapshot>,
}

impl History {
    pub fn push(&mut self, snapshot: Snapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn pop(&mut self) -> Option<Snapshot> {
        self.snapshots.pop()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
