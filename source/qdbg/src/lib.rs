// Copyright (c) Quantum Assertion Debugger Contributors.
// Licensed under the MIT License.

//! Public facade over the quantum assertion debugger: wires the preprocessor,
//! checker, execution engine, and diagnostics collaborator from the other
//! crates in this workspace into the single handle a host application
//! drives.

pub mod breakpoints;
pub mod causes;
pub mod error;

pub use breakpoints::resolve_breakpoint;
pub use causes::{potential_error_causes, suggest_assertion_movements, suggest_new_assertions, ErrorCause};
pub use error::{DebuggerError, DebuggerResult};
pub use qdbg_ast::{Assertion, InstrId};
pub use qdbg_check::CheckFailure;
pub use qdbg_diagnostics::{MovementSuggestion, ZeroControlEvent};
pub use qdbg_eval::{Frame, RunAllOutcome, RunOutcome, StepOutcome};

use num_complex::Complex64;
use qdbg_data_structures::error::WithSource;
use qdbg_eval::{Engine, EvalError};

/// The single handle a host drives: load a program, step or run it, and
/// query its state and diagnostics. Not ready (most operations return
/// [`DebuggerError::NotReady`]) until [`Debugger::load`] succeeds.
#[derive(Default)]
pub struct Debugger {
    engine: Option<Engine>,
    breakpoint_hit: Option<InstrId>,
    assertion_failure: Option<(InstrId, CheckFailure)>,
}

impl Debugger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets all state and preprocesses `code`. Fails on a parse error,
    /// leaving the debugger not ready. Parse failures carry the original
    /// source text so a host can render a `miette` pretty-printed report
    /// pointing at the offending span.
    pub fn load(&mut self, code: &str) -> DebuggerResult<()> {
        let engine = Engine::load(code).map_err(|err| match err {
            EvalError::Frontend(fe) => {
                let span = fe.span();
                DebuggerError::Parse(WithSource::new(code, fe, span))
            }
            other => DebuggerError::Eval(other),
        })?;
        self.engine = Some(engine);
        self.breakpoint_hit = None;
        self.assertion_failure = None;
        Ok(())
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.engine.is_some()
    }

    fn engine(&self) -> DebuggerResult<&Engine> {
        self.engine.as_ref().ok_or(DebuggerError::NotReady)
    }

    fn engine_mut(&mut self) -> DebuggerResult<&mut Engine> {
        self.engine.as_mut().ok_or(DebuggerError::NotReady)
    }

    /// Returns to instruction 0 and `|0...0>`; clears all motion state but
    /// keeps the loaded program.
    pub fn reset(&mut self) -> DebuggerResult<()> {
        self.engine_mut()?.reset();
        self.breakpoint_hit = None;
        self.assertion_failure = None;
        Ok(())
    }

    // --- Motion ---------------------------------------------------------

    pub fn step_forward(&mut self) -> DebuggerResult<StepOutcome> {
        let outcome = self.engine_mut()?.step_forward()?;
        self.record(&outcome);
        Ok(outcome)
    }

    pub fn step_backward(&mut self) -> DebuggerResult<()> {
        self.engine_mut()?.step_backward()?;
        self.breakpoint_hit = None;
        self.assertion_failure = None;
        Ok(())
    }

    pub fn step_over_forward(&mut self) -> DebuggerResult<StepOutcome> {
        let outcome = self.engine_mut()?.step_over_forward()?;
        self.record(&outcome);
        Ok(outcome)
    }

    pub fn step_over_backward(&mut self) -> DebuggerResult<()> {
        self.engine_mut()?.step_over_backward()?;
        self.breakpoint_hit = None;
        self.assertion_failure = None;
        Ok(())
    }

    pub fn step_out_forward(&mut self) -> DebuggerResult<StepOutcome> {
        let outcome = self.engine_mut()?.step_out_forward()?;
        self.record(&outcome);
        Ok(outcome)
    }

    pub fn step_out_backward(&mut self) -> DebuggerResult<()> {
        self.engine_mut()?.step_out_backward()?;
        self.breakpoint_hit = None;
        self.assertion_failure = None;
        Ok(())
    }

    pub fn run(&mut self) -> DebuggerResult<RunOutcome> {
        let outcome = self.engine_mut()?.run()?;
        self.record_run(&outcome);
        Ok(outcome)
    }

    pub fn run_backward(&mut self) -> DebuggerResult<()> {
        self.engine_mut()?.run_backward()?;
        self.breakpoint_hit = None;
        self.assertion_failure = None;
        Ok(())
    }

    /// Like `run`, but a failed assertion does not stop the run: it is
    /// counted and execution continues to the next instruction.
    pub fn run_all(&mut self) -> DebuggerResult<RunAllOutcome> {
        if self.engine.is_none() {
            return Err(DebuggerError::NotReady);
        }
        let mut failed_count = 0usize;
        loop {
            match self.engine_mut()?.step_forward()? {
                StepOutcome::Halted => return Ok(RunAllOutcome { halted: true, failed_count }),
                StepOutcome::AssertionFailed { instr, failure } => {
                    failed_count += 1;
                    self.assertion_failure = Some((instr, failure));
                }
                StepOutcome::Continued => {}
            }
        }
    }

    pub fn pause(&mut self) -> DebuggerResult<()> {
        self.engine_mut()?.pause();
        Ok(())
    }

    fn record(&mut self, outcome: &StepOutcome) {
        if let StepOutcome::AssertionFailed { instr, failure } = outcome {
            self.assertion_failure = Some((*instr, failure.clone()));
        }
    }

    fn record_run(&mut self, outcome: &RunOutcome) {
        match outcome {
            RunOutcome::HitBreakpoint(instr) => self.breakpoint_hit = Some(*instr),
            RunOutcome::AssertionFailed { instr, failure } => {
                self.assertion_failure = Some((*instr, failure.clone()));
            }
            RunOutcome::Halted | RunOutcome::Paused => {}
        }
    }

    // --- Queries ----------------------------------------------------------

    pub fn can_step_forward(&self) -> bool {
        self.engine().is_ok_and(|e| e.program_counter().is_some())
    }

    pub fn can_step_backward(&self) -> bool {
        self.engine().is_ok_and(Engine::can_step_backward)
    }

    pub fn is_finished(&self) -> bool {
        self.engine().is_ok_and(|e| e.program_counter().is_none())
    }

    #[must_use]
    pub fn did_assertion_fail(&self) -> Option<(InstrId, &CheckFailure)> {
        self.assertion_failure.as_ref().map(|(id, f)| (*id, f))
    }

    #[must_use]
    pub fn was_breakpoint_hit(&self) -> Option<InstrId> {
        self.breakpoint_hit
    }

    // --- Introspection ------------------------------------------------

    pub fn get_current_instruction(&self) -> DebuggerResult<Option<InstrId>> {
        Ok(self.engine()?.program_counter())
    }

    pub fn get_instruction_count(&self) -> DebuggerResult<usize> {
        Ok(self.engine()?.program().instructions.len())
    }

    pub fn get_instruction_position(&self, instr: InstrId) -> DebuggerResult<(u32, u32)> {
        let span = self.engine()?.get_instruction_position(instr);
        Ok((span.lo, span.hi))
    }

    pub fn get_num_qubits(&self) -> DebuggerResult<usize> {
        Ok(self.engine()?.program().num_qubits)
    }

    pub fn get_num_classical_variables(&self) -> DebuggerResult<usize> {
        Ok(self.engine()?.program().variables.len())
    }

    /// `"UNKNOWN"` for an out-of-range index, matching the language-agnostic
    /// API's documented sentinel rather than an error.
    pub fn get_classical_variable_name(&self, index: usize) -> DebuggerResult<String> {
        Ok(self
            .engine()?
            .program()
            .variables
            .get(index)
            .map(|v| v.name.to_string())
            .unwrap_or_else(|| "UNKNOWN".to_string()))
    }

    pub fn get_quantum_variable_name(&self, index: usize) -> DebuggerResult<String> {
        let program = self.engine()?.program();
        let name = program
            .qubit_registers
            .iter()
            .find(|r| index >= r.base_index && index < r.base_index + r.size)
            .map(|r| format!("{}[{}]", r.name, index - r.base_index));
        Ok(name.unwrap_or_else(|| "UNKNOWN".to_string()))
    }

    pub fn get_amplitude_index(&self, index: usize) -> DebuggerResult<Option<Complex64>> {
        Ok(self.engine()?.get_amplitude(index))
    }

    /// `bits` is read LSB-first (`bits[0]` is qubit 0).
    pub fn get_amplitude_bitstring(&self, bits: &str) -> DebuggerResult<Option<Complex64>> {
        Ok(self.engine()?.get_amplitude_bitstring(bits))
    }

    pub fn get_classical_variable(&self, name: &str) -> DebuggerResult<Option<bool>> {
        Ok(self
            .engine()?
            .get_variables()
            .iter()
            .find(|v| &*v.name == name)
            .map(|v| v.value.as_bool()))
    }

    pub fn get_state_vector_full(&self) -> DebuggerResult<Vec<Complex64>> {
        Ok(self.engine()?.get_amplitudes().to_vec())
    }

    /// Fails if the requested qubits are entangled with the rest of the
    /// system, i.e. the sub-state is not separable.
    pub fn get_state_vector_sub(&self, targets: &[String]) -> DebuggerResult<Vec<Complex64>> {
        let engine = self.engine()?;
        let qubits: Vec<usize> = targets
            .iter()
            .map(|t| qdbg_check::CheckContext::resolve_qubit(engine, t))
            .collect::<Result<_, _>>()
            .map_err(qdbg_eval::EvalError::from)?;
        let amplitudes = qdbg_linalg::density::sub_state_vector_amplitudes(
            engine.get_amplitudes(),
            engine.program().num_qubits,
            &qubits,
        )
        .map_err(|_| DebuggerError::NotSeparable)?;
        Ok(amplitudes)
    }

    pub fn get_stack_depth(&self) -> DebuggerResult<usize> {
        Ok(self.engine()?.get_stack_depth())
    }

    pub fn get_stack_trace(&self, max: usize) -> DebuggerResult<Vec<Frame>> {
        let mut trace = self.engine()?.get_stack_trace();
        trace.reverse();
        if max > 0 {
            trace.truncate(max);
        }
        Ok(trace)
    }

    // --- Breakpoints --------------------------------------------------

    /// Maps a raw byte offset in the source to the enclosing instruction and
    /// arms a breakpoint there.
    pub fn set_breakpoint(&mut self, offset: u32) -> DebuggerResult<InstrId> {
        let program = self.engine()?.program();
        let target =
            resolve_breakpoint(program, offset).ok_or(DebuggerError::NoInstructionAtOffset(offset))?;
        self.engine_mut()?.set_breakpoint(target);
        Ok(target)
    }

    pub fn clear_breakpoints(&mut self) -> DebuggerResult<()> {
        self.engine_mut()?.clear_breakpoints();
        Ok(())
    }

    // --- Diagnostics ----------------------------------------------------

    pub fn potential_error_causes(&self, assertion: InstrId, count: usize) -> DebuggerResult<Vec<ErrorCause>> {
        let engine = self.engine()?;
        Ok(potential_error_causes(
            engine.program(),
            engine.diagnostics(),
            assertion,
            count,
        ))
    }

    pub fn suggest_assertion_movements(&self) -> DebuggerResult<Vec<MovementSuggestion>> {
        Ok(suggest_assertion_movements(self.engine()?.program()))
    }

    /// Up to `count` proposed replacement/supplementary assertions for a
    /// failed one (`count == 0` means "return all"), each as the instruction
    /// position to insert it at paired with its source text.
    pub fn suggest_new_assertions(
        &self,
        assertion: InstrId,
        count: usize,
    ) -> DebuggerResult<Vec<(InstrId, String)>> {
        let engine = self.engine()?;
        let mut suggestions = suggest_new_assertions(engine, engine.diagnostics(), assertion);
        if count > 0 {
            suggestions.truncate(count);
        }
        Ok(suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bell_state_entanglement_assertion_passes() {
        let mut dbg = Debugger::new();
        dbg.load("qreg q[2];\nh q[0];\ncx q[0], q[1];\nassert-ent q[0], q[1];\n")
            .unwrap();
        let outcome = dbg.run_all().unwrap();
        assert_eq!(outcome, RunAllOutcome { halted: true, failed_count: 0 });
        assert!(dbg.is_finished());
    }

    #[test]
    fn missing_interaction_is_flagged_as_an_error_cause() {
        let mut dbg = Debugger::new();
        dbg.load("qreg q[2];\nh q[0];\nassert-ent q[0], q[1];\n").unwrap();
        let outcome = dbg.run_all().unwrap();
        assert_eq!(outcome.failed_count, 1);
        let assertion = InstrId::from(2usize);
        let causes = dbg.potential_error_causes(assertion, 0).unwrap();
        assert_eq!(causes.len(), 1);
        assert!(matches!(causes[0], ErrorCause::MissingInteraction { .. }));
    }

    #[test]
    fn zero_control_is_detected_and_then_overruled() {
        let mut dbg = Debugger::new();
        dbg.load("qreg q[3];\nx q[0];\ncx q[1], q[0];\ncx q[0], q[1];\nassert-sup q[0];\n")
            .unwrap();
        let outcome = dbg.run_all().unwrap();
        assert_eq!(outcome, RunAllOutcome { halted: true, failed_count: 0 });
        let assertion = InstrId::from(4usize);
        let causes = dbg.potential_error_causes(assertion, 0).unwrap();
        assert!(causes.is_empty());
    }

    #[test]
    fn measurement_is_irreversible() {
        let mut dbg = Debugger::new();
        dbg.load("qreg q[1];\ncreg c[1];\nx q[0];\nmeasure q[0] -> c[0];\n")
            .unwrap();
        dbg.run_all().unwrap();
        assert!(matches!(dbg.step_backward(), Err(DebuggerError::Eval(_))));
        assert_eq!(dbg.get_classical_variable("c[0]").unwrap(), Some(true));
    }

    #[test]
    fn breakpoint_inside_a_gate_body_lands_on_the_inner_instruction() {
        let source = "gate my q {\n    x q;\n}\nqreg q[1];\nmy q[0];\n";
        let mut dbg = Debugger::new();
        dbg.load(source).unwrap();
        let offset = source.find("x q;").unwrap() as u32 + 1;
        let target = dbg.set_breakpoint(offset).unwrap();
        let outcome = dbg.run().unwrap();
        assert_eq!(outcome, RunOutcome::HitBreakpoint(target));
    }

    #[test]
    fn assertion_movement_suggestion_skips_the_unrelated_gate() {
        let mut dbg = Debugger::new();
        dbg.load(indoc::indoc! {"
            qreg q[3];
            h q[0];
            cx q[0], q[1];
            cx q[0], q[2];
            x q[2];
            assert-eq 0.9, q[0], q[1] { 1, 0, 0, 0 }
        "})
        .unwrap();
        let suggestions = dbg.suggest_assertion_movements().unwrap();
        assert_eq!(suggestions.len(), 1);
    }

    #[test]
    fn load_failure_carries_a_renderable_source_diagnostic() {
        let mut dbg = Debugger::new();
        let err = dbg.load("qreg q[1];\ngate broken q;\n").unwrap_err();
        let DebuggerError::Parse(with_source) = &err else {
            panic!("expected a Parse error, got {err:?}");
        };
        assert!(matches!(
            with_source.error(),
            qdbg_frontend::FrontendError::GateWithoutBody(_)
        ));
        // miette::Diagnostic::source_code is populated, so a host can render
        // a pretty-printed report against the original program text.
        assert!(miette::Diagnostic::source_code(&err).is_some());
    }
}
