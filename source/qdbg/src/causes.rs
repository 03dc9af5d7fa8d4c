// Root-cause analysis on a failed assertion: "error causes on a
// failed assertion"), composed from the static/dynamic building blocks in
// `qdbg_diagnostics` plus the live engine state.

use qdbg_ast::{Assertion, InstrId};
use qdbg_diagnostics::Diagnostics;
use qdbg_eval::Engine;
use qdbg_frontend::Program;

#[derive(Clone, Debug, PartialEq)]
pub enum ErrorCause {
    /// Two of an entanglement assertion's targets were never linked by any
    /// prior instruction touching both (directly or via a shared producer).
    MissingInteraction { assertion: InstrId, target_a: String, target_b: String },
    /// A data dependency of the assertion fired a control that was in `|0>`
    /// on every observed visit.
    ControlAlwaysZero { instr: InstrId, control: usize },
}

/// Up to `count` probable causes for why `assertion` failed (`count == 0`
/// means "return all").
#[must_use]
pub fn potential_error_causes(
    program: &Program,
    diagnostics: &Diagnostics,
    assertion: InstrId,
    count: usize,
) -> Vec<ErrorCause> {
    let mut causes = Vec::new();
    let instr = program.instruction(assertion);

    if matches!(instr.assertion(), Some(Assertion::Entanglement { .. })) {
        for (target_a, target_b) in qdbg_diagnostics::missing_interactions(program, diagnostics, assertion) {
            causes.push(ErrorCause::MissingInteraction {
                assertion,
                target_a,
                target_b,
            });
        }
    }

    let dependency_producers: Vec<InstrId> = instr.dependencies.iter().map(|d| d.producer).collect();
    for event in diagnostics.zero_control_events() {
        if dependency_producers.contains(&event.instr) {
            causes.push(ErrorCause::ControlAlwaysZero {
                instr: event.instr,
                control: event.control,
            });
        }
    }

    if count > 0 {
        causes.truncate(count);
    }
    causes
}

/// Every assertion in `program` paired with its earliest safe position, per
/// the commuting-instructions walk in [`qdbg_diagnostics::suggest_earlier_position`].
#[must_use]
pub fn suggest_assertion_movements(program: &Program) -> Vec<qdbg_diagnostics::MovementSuggestion> {
    program
        .instructions
        .iter()
        .filter(|(_, instr)| instr.is_assertion())
        .filter_map(|(id, _)| qdbg_diagnostics::suggest_earlier_position(program, id))
        .collect()
}

/// Proposes one or more replacement assertions from the engine's live state
/// for a failed one, so a caller can offer "pin down what actually
/// happened" without the user transcribing amplitudes by hand, each paired
/// with the instruction position it should be inserted at.
#[must_use]
pub fn suggest_new_assertions(
    engine: &Engine,
    diagnostics: &Diagnostics,
    assertion: InstrId,
) -> Vec<(InstrId, String)> {
    qdbg_diagnostics::synthesize_new_assertions(engine.program(), diagnostics, assertion, engine.get_amplitudes())
        .into_iter()
        .map(|s| (s.position, s.text))
        .collect()
}
