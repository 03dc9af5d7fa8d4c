// Copyright (c) Quantum Assertion Debugger Contributors.
// Licensed under the MIT License.

pub mod interaction;
pub mod movement;
pub mod synthesis;
pub mod zero_control;

pub use interaction::{data_dependencies, missing_interactions, static_interactions, witnessed_path};
pub use movement::{suggest_earlier_position, MovementSuggestion};
pub use synthesis::{synthesize_equality_split, synthesize_new_assertions, SynthesizedAssertion};
pub use zero_control::zero_controls;

use num_complex::Complex64;
use qdbg_ast::InstrId;
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// One zero-control event observed during execution: `gate` fired with
/// `control` in `|0>`, at `instr`.
#[derive(Clone, Debug, PartialEq)]
pub struct ZeroControlEvent {
    pub instr: InstrId,
    pub gate: Rc<str>,
    pub control: usize,
}

/// Accumulates the dynamic diagnostics the engine records as it steps, so a
/// caller can query "what looked suspicious" after the fact without having
/// to re-run the program. A control that fires non-zero on any visit
/// overrules an earlier zero visit at the same instruction, since loops
/// through a CALL can revisit the same gate with different arguments.
#[derive(Default)]
pub struct Diagnostics {
    events: Vec<ZeroControlEvent>,
    last_seen: FxHashMap<(InstrId, usize), bool>,
    /// Every gate firing's actually-resolved qubit tuple, in execution
    /// order - the runtime half of the interaction tree, as opposed to the
    /// static one built from declared/textual target sets. A function
    /// called more than once contributes one entry per call.
    witnessed: Vec<(InstrId, Vec<usize>)>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records any zero-control firings of `gate` at `instr`, given the state
    /// immediately before it executed.
    pub fn observe_gate(
        &mut self,
        instr: InstrId,
        gate: &str,
        qubits: &[usize],
        pre_state: &[Complex64],
        num_qubits: usize,
    ) {
        let zero = zero_controls(pre_state, num_qubits, gate, qubits);
        for &control in &control_positions_of(gate, qubits) {
            let is_zero = zero.contains(&control);
            self.last_seen.insert((instr, control), is_zero);
        }
        for control in zero {
            self.events.push(ZeroControlEvent {
                instr,
                gate: Rc::from(gate),
                control,
            });
        }
        if qubits.len() > 1 {
            self.witnessed.push((instr, qubits.to_vec()));
        }
    }

    /// The firings that were zero-control on every visit, i.e. never
    /// overruled by a later non-zero one.
    #[must_use]
    pub fn zero_control_events(&self) -> Vec<&ZeroControlEvent> {
        self.events
            .iter()
            .filter(|e| self.last_seen.get(&(e.instr, e.control)) == Some(&true))
            .collect()
    }

    /// Every multi-qubit gate firing observed, paired with the instruction
    /// that witnessed it - the edges of the runtime interaction tree.
    #[must_use]
    pub fn witnessed_interactions(&self) -> &[(InstrId, Vec<usize>)] {
        &self.witnessed
    }

    pub fn reset(&mut self) {
        self.events.clear();
        self.last_seen.clear();
        self.witnessed.clear();
    }
}

fn control_positions_of(gate: &str, qubits: &[usize]) -> Vec<usize> {
    zero_control::control_positions(gate, qubits)
}
