// Assertion-movement suggestions: walk backward from an assertion,
// instruction by instruction, applying a per-predecessor-kind commutation
// rule. The walk stops at the first instruction that genuinely blocks
// movement; everything it passed over on the way becomes the suggested
// position.

use qdbg_ast::{Assertion, InstrId, Instruction, InstructionKind, SimulateOp};
use qdbg_data_structures::text::variables_equal;
use qdbg_frontend::Program;

#[derive(Clone, Debug, PartialEq)]
pub struct MovementSuggestion {
    pub assertion: InstrId,
    pub suggested_position: InstrId,
}

const SUPERPOSITION_SAFE_GATES: [&str; 7] = ["x", "y", "z", "s", "t", "sdg", "tdg"];

#[must_use]
pub fn suggest_earlier_position(program: &Program, assertion: InstrId) -> Option<MovementSuggestion> {
    let instr = program.instruction(assertion);
    let scope = instr.enclosing_function.clone();
    let targets = instr.targets.clone();
    let Some(kind) = instr.assertion() else {
        return None;
    };

    let mut candidate = assertion;
    let mut idx = usize::from(assertion);
    while idx > 0 {
        idx -= 1;
        let prior_id = InstrId::from(idx);
        let prior = program.instruction(prior_id);

        if prior.enclosing_function != scope {
            // We've walked into a nested gate definition's body from
            // outside it. Definitions never execute inline, so jump past
            // the whole block rather than inspecting its instructions.
            match definition_start(program, prior) {
                Some(header) => {
                    candidate = header;
                    idx = usize::from(header);
                    continue;
                }
                None => break,
            }
        }

        if matches!(prior.kind, InstructionKind::Return) {
            // Same idea, approached from the tail: a RETURN marks the end
            // of a callee body encountered while walking backward through
            // the caller's own scope textually preceding it.
            if let Some(header) = definition_start(program, prior) {
                candidate = header;
                idx = usize::from(header);
                continue;
            }
            break;
        }

        if !commutes_with(kind, &targets, prior) {
            break;
        }
        candidate = prior_id;
    }

    if candidate == assertion {
        None
    } else {
        Some(MovementSuggestion {
            assertion,
            suggested_position: candidate,
        })
    }
}

/// The header instruction of the gate definition that `instr` sits inside,
/// if any.
fn definition_start(program: &Program, instr: &Instruction) -> Option<InstrId> {
    let name = instr.enclosing_function.as_ref()?;
    program.function_entries.get(name).copied()
}

fn commutes_with(assertion: &Assertion, assertion_targets: &[String], prior: &Instruction) -> bool {
    match &prior.kind {
        InstructionKind::Assertion(_) => false,
        InstructionKind::Call { .. } => false,
        InstructionKind::Return => unreachable!("handled by the caller before reaching here"),
        InstructionKind::Nop => {
            if prior.function_body.is_some() {
                // A definition's own header, reached directly (empty or
                // already-skipped body): inert, always passable.
                true
            } else {
                // Variable declaration.
                !prior.targets.iter().any(|t| assertion_targets.iter().any(|a| variables_equal(t, a)))
            }
        }
        InstructionKind::Simulate(op) => simulate_commutes(assertion, assertion_targets, op),
    }
}

fn simulate_commutes(assertion: &Assertion, assertion_targets: &[String], op: &SimulateOp) -> bool {
    match op {
        SimulateOp::Measure { .. } | SimulateOp::Reset { .. } => false,
        SimulateOp::Barrier { .. } => true,
        SimulateOp::ClassicControlled { gate, .. } => simulate_commutes(assertion, assertion_targets, gate),
        SimulateOp::Gate { name, targets, .. } => {
            let overlaps = targets.iter().any(|t| assertion_targets.iter().any(|a| variables_equal(t, a)));
            if !overlaps {
                return true;
            }
            match assertion {
                Assertion::Entanglement { .. } => targets.len() < 2,
                Assertion::Superposition { .. } => SUPERPOSITION_SAFE_GATES.contains(&name.as_ref()),
                Assertion::Equality { .. } => false,
            }
        }
    }
}
