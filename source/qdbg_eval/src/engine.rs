// The stepping execution engine. Owns the quantum state, the call stack,
// and the classical variable bank, and drives the assertion checker and
// diagnostics collaborator at every step, over a flat instruction graph
// with an explicit program counter rather than a tree-walking interpreter,
// since this language's control flow is just straight-line code plus calls
// (no loops or branches beyond a single classically-controlled gate).

use crate::error::{EvalError, EvalResult};
use crate::frame::{CallStack, Frame};
use crate::history::{History, Snapshot};
use num_complex::Complex64;
use qdbg_ast::{InstrId, Instruction, InstructionKind, SimulateOp, Successor, Variable, VariableValue};
use qdbg_check::{CheckContext, CheckError, CheckFailure, CheckOutcome};
use qdbg_data_structures::text::{variable_base_name, variable_index};
use qdbg_data_structures::Span;
use qdbg_diagnostics::Diagnostics;
use qdbg_frontend::Program;
use qdbg_state::{QuantumState, StatevectorBackend};
use rustc_hash::FxHashSet;
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq)]
pub enum StepOutcome {
    Continued,
    Halted,
    AssertionFailed { instr: InstrId, failure: CheckFailure },
}

#[derive(Clone, Debug, PartialEq)]
pub enum RunOutcome {
    Halted,
    HitBreakpoint(InstrId),
    AssertionFailed { instr: InstrId, failure: CheckFailure },
    Paused,
}

/// How a `run_all` pass ended, and how many assertions failed along the way.
#[derive(Clone, Debug, PartialEq)]
pub struct RunAllOutcome {
    pub halted: bool,
    pub failed_count: usize,
}

pub struct Engine {
    program: Rc<Program>,
    state: Box<dyn QuantumState>,
    pc: Option<InstrId>,
    call_stack: CallStack,
    variables: Vec<Variable>,
    breakpoints: FxHashSet<InstrId>,
    diagnostics: Diagnostics,
    history: History,
    paused: bool,
}

impl Engine {
    /// Preprocesses `source` and loads the resulting program, ready to run
    /// from its first instruction.
    pub fn load(source: &str) -> EvalResult<Self> {
        let program = qdbg_frontend::preprocess(source)?;
        let state = Box::new(StatevectorBackend::new(program.num_qubits));
        let variables = program.variables.clone();
        let pc = Some(program.entry);
        log::debug!(
            "loaded program: {} qubit(s), {} instruction(s)",
            program.num_qubits,
            program.instructions.len()
        );
        Ok(Self {
            program: Rc::new(program),
            state,
            pc,
            call_stack: CallStack::default(),
            variables,
            breakpoints: FxHashSet::default(),
            diagnostics: Diagnostics::new(),
            history: History::default(),
            paused: false,
        })
    }

    #[must_use]
    pub fn program(&self) -> &Program {
        &self.program
    }

    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn reset(&mut self) {
        self.state = Box::new(StatevectorBackend::new(self.program.num_qubits));
        self.pc = Some(self.program.entry);
        self.call_stack = CallStack::default();
        self.variables = self.program.variables.clone();
        self.diagnostics.reset();
        self.history.clear();
    }

    pub fn set_breakpoint(&mut self, instr: InstrId) {
        self.breakpoints.insert(instr);
    }

    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    #[must_use]
    pub fn get_stack_depth(&self) -> usize {
        self.call_stack.len()
    }

    #[must_use]
    pub fn get_stack_trace(&self) -> Vec<Frame> {
        self.call_stack.to_frames()
    }

    #[must_use]
    pub fn get_instruction_position(&self, instr: InstrId) -> Span {
        self.program.instruction(instr).span
    }

    #[must_use]
    pub fn get_amplitudes(&self) -> &[Complex64] {
        self.state.amplitudes()
    }

    #[must_use]
    pub fn get_amplitude(&self, index: usize) -> Option<Complex64> {
        self.state.amplitudes().get(index).copied()
    }

    /// `bits` is read LSB-first (`bits[0]` is qubit 0), matching
    /// `get-amplitude-bitstring`'s documented convention.
    #[must_use]
    pub fn get_amplitude_bitstring(&self, bits: &str) -> Option<Complex64> {
        let mut index = 0usize;
        for (qubit, ch) in bits.chars().enumerate() {
            if ch == '1' {
                index |= 1 << qubit;
            } else if ch != '0' {
                return None;
            }
        }
        self.get_amplitude(index)
    }

    #[must_use]
    pub fn get_variables(&self) -> &[Variable] {
        &self.variables
    }

    #[must_use]
    pub fn program_counter(&self) -> Option<InstrId> {
        self.pc
    }

    #[must_use]
    pub fn can_step_backward(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn step_forward(&mut self) -> EvalResult<StepOutcome> {
        let Some(pc) = self.pc else {
            return Ok(StepOutcome::Halted);
        };
        self.history.push(self.snapshot());

        let instr = self.program.instruction(pc).clone();
        log::trace!("step {:?}: {:?}", pc, instr.kind);
        let mut next = instr.successor;
        let mut outcome = StepOutcome::Continued;

        match &instr.kind {
            InstructionKind::Nop => {}
            InstructionKind::Return => {
                let frame = self.call_stack.pop_frame().ok_or(EvalError::StackUnderflow)?;
                next = frame.return_successor;
            }
            InstructionKind::Call { callee, substitutions } => {
                let entry = *self
                    .program
                    .function_entries
                    .get(callee)
                    .ok_or_else(|| EvalError::UnknownCallee(callee.to_string()))?;
                self.call_stack.push_frame(Frame {
                    callee: callee.clone(),
                    call_site: pc,
                    return_successor: instr.successor,
                    substitutions: substitutions.clone(),
                });
                next = Successor::Instruction(entry);
            }
            InstructionKind::Simulate(op) => {
                self.execute_simulate(pc, op)?;
                if matches!(op, SimulateOp::Measure { .. } | SimulateOp::Reset { .. }) {
                    // Measurement and reset are irreversible, so the snapshot
                    // just pushed (and everything before it) can no longer
                    // be stepped back into.
                    self.history.clear();
                }
            }
            InstructionKind::Assertion(assertion) => {
                let result = qdbg_check::evaluate(&*self, assertion)?;
                if let CheckOutcome::Failed(failure) = result {
                    log::warn!("assertion at {:?} failed: {:?}", pc, failure);
                    outcome = StepOutcome::AssertionFailed { instr: pc, failure };
                }
            }
        }

        self.pc = match next {
            Successor::Instruction(id) => Some(id),
            Successor::Halt => None,
            Successor::PopCallStack => return Err(EvalError::CorruptSuccessor(pc)),
        };

        Ok(outcome)
    }

    pub fn step_over_forward(&mut self) -> EvalResult<StepOutcome> {
        let starting_depth = self.call_stack.len();
        let is_call = self
            .pc
            .map(|pc| matches!(self.program.instruction(pc).kind, InstructionKind::Call { .. }))
            .unwrap_or(false);
        let mut outcome = self.step_forward()?;
        if is_call {
            while self.call_stack.len() > starting_depth {
                outcome = self.step_forward()?;
                if !matches!(outcome, StepOutcome::Continued) {
                    break;
                }
            }
        }
        Ok(outcome)
    }

    pub fn step_out_forward(&mut self) -> EvalResult<StepOutcome> {
        let starting_depth = self.call_stack.len();
        if starting_depth == 0 {
            return self.step_forward();
        }
        loop {
            let outcome = self.step_forward()?;
            if self.call_stack.len() < starting_depth || !matches!(outcome, StepOutcome::Continued) {
                return Ok(outcome);
            }
        }
    }

    pub fn step_backward(&mut self) -> EvalResult<()> {
        let snapshot = self.history.pop().ok_or(EvalError::NoHistory)?;
        self.restore(snapshot);
        Ok(())
    }

    pub fn step_over_backward(&mut self) -> EvalResult<()> {
        let starting_depth = self.call_stack.len();
        loop {
            self.step_backward()?;
            if self.call_stack.len() <= starting_depth {
                return Ok(());
            }
        }
    }

    pub fn step_out_backward(&mut self) -> EvalResult<()> {
        if self.call_stack.is_empty() {
            return self.step_backward();
        }
        let target_depth = self.call_stack.len() - 1;
        loop {
            self.step_backward()?;
            if self.call_stack.len() <= target_depth {
                return Ok(());
            }
        }
    }

    pub fn run(&mut self) -> EvalResult<RunOutcome> {
        self.paused = false;
        loop {
            if self.paused {
                return Ok(RunOutcome::Paused);
            }
            match self.step_forward()? {
                StepOutcome::Halted => return Ok(RunOutcome::Halted),
                StepOutcome::AssertionFailed { instr, failure } => {
                    return Ok(RunOutcome::AssertionFailed { instr, failure })
                }
                StepOutcome::Continued => {
                    if let Some(pc) = self.pc {
                        if self.breakpoints.contains(&pc) {
                            return Ok(RunOutcome::HitBreakpoint(pc));
                        }
                    }
                }
            }
        }
    }

    pub fn run_backward(&mut self) -> EvalResult<()> {
        while !self.history.is_empty() {
            self.step_backward()?;
            if let Some(pc) = self.pc {
                if self.breakpoints.contains(&pc) {
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// Like [`Engine::run`], but a failed assertion does not stop the run: it
    /// is counted and execution continues to the next instruction.
    pub fn run_all(&mut self) -> EvalResult<RunAllOutcome> {
        self.paused = false;
        let mut failed_count = 0usize;
        loop {
            match self.step_forward()? {
                StepOutcome::Halted => return Ok(RunAllOutcome { halted: true, failed_count }),
                StepOutcome::AssertionFailed { .. } => failed_count += 1,
                StepOutcome::Continued => {}
            }
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            pc: self.pc,
            call_stack: self.call_stack.clone(),
            variables: self.variables.clone(),
            amplitudes: self.state.amplitudes().to_vec(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.pc = snapshot.pc;
        self.call_stack = snapshot.call_stack;
        self.variables = snapshot.variables;
        self.state = Box::new(StatevectorBackend::from_amplitudes(snapshot.amplitudes));
    }

    fn execute_simulate(&mut self, instr: InstrId, op: &SimulateOp) -> EvalResult<()> {
        match op {
            SimulateOp::Gate { name, params, targets } => {
                let qubits = self.resolve_qubits(targets)?;
                let pre_state = self.state.amplitudes().to_vec();
                self.state.apply_gate(name, params, &qubits)?;
                self.diagnostics.observe_gate(
                    instr,
                    name,
                    &qubits,
                    &pre_state,
                    self.program.num_qubits,
                );
            }
            SimulateOp::Measure { qubit, classical_bit } => {
                let q = self.resolve_qubit_target(qubit)?;
                let outcome = self.state.measure(q)?;
                self.set_classical_bit(classical_bit, outcome)?;
            }
            SimulateOp::Reset { qubit } => {
                let q = self.resolve_qubit_target(qubit)?;
                self.state.reset(q)?;
            }
            SimulateOp::Barrier { .. } => {}
            SimulateOp::ClassicControlled {
                register,
                expected_value,
                gate,
            } => {
                if self.classical_register_value(register)? == *expected_value {
                    self.execute_simulate(instr, gate)?;
                }
            }
        }
        Ok(())
    }

    fn resolve_qubits(&self, targets: &[String]) -> EvalResult<Vec<usize>> {
        targets
            .iter()
            .map(|t| self.resolve_qubit_target(t))
            .collect()
    }

    fn resolve_qubit_target(&self, target: &str) -> EvalResult<usize> {
        Ok(CheckContext::resolve_qubit(self, target)?)
    }

    /// Walks the call-substitution chain from innermost to outermost,
    /// replacing a gate-body reference to one of its own parameters with
    /// whatever name was passed at the call site, until it bottoms out at a
    /// real register name.
    fn resolve_name(&self, name: &str) -> String {
        let mut current = name.to_string();
        for frame in self.call_stack.iter().rev() {
            let base = variable_base_name(&current);
            match frame.substitutions.iter().find(|(param, _)| &**param == base) {
                Some((_, arg)) => current = arg.to_string(),
                None => break,
            }
        }
        current
    }

    fn classical_bit_index(&self, target: &str) -> EvalResult<usize> {
        let resolved = self.resolve_name(target);
        self.variables
            .iter()
            .position(|v| *v.name == resolved)
            .ok_or_else(|| EvalError::UnknownTarget(resolved))
    }

    fn set_classical_bit(&mut self, target: &str, value: bool) -> EvalResult<()> {
        let idx = self.classical_bit_index(target)?;
        self.variables[idx].value = VariableValue::Bool(value);
        Ok(())
    }

    fn classical_register_value(&self, target: &str) -> EvalResult<u64> {
        let resolved = self.resolve_name(target);
        let base = variable_base_name(&resolved);
        match variable_index(&resolved) {
            Some(_) => {
                let idx = self.classical_bit_index(target)?;
                Ok(u64::from(self.variables[idx].value.as_bool()))
            }
            None => {
                let reg = self
                    .program
                    .classical_register(base)
                    .ok_or_else(|| EvalError::UnknownTarget(target.to_string()))?;
                let mut value = 0u64;
                for i in 0..reg.size {
                    let bit_name = format!("{base}[{i}]");
                    if self
                        .variables
                        .iter()
                        .any(|v| *v.name == bit_name && v.value.as_bool())
                    {
                        value |= 1 << i;
                    }
                }
                Ok(value)
            }
        }
    }
}

impl CheckContext for Engine {
    fn num_qubits(&self) -> usize {
        self.program.num_qubits
    }

    fn amplitudes(&self) -> &[Complex64] {
        self.state.amplitudes()
    }

    fn resolve_qubit(&self, target: &str) -> Result<usize, CheckError> {
        let resolved = self.resolve_name(target);
        let base = variable_base_name(&resolved);
        let index = variable_index(&resolved).unwrap_or(0);
        let register = self
            .program
            .qubit_register(base)
            .ok_or_else(|| CheckError::UnknownTarget(target.to_string()))?;
        Ok(register.base_index + index)
    }

    fn simulate_circuit(&self, circuit_text: &str, targets: &[String]) -> Result<Vec<Complex64>, CheckError> {
        let mut index_of = rustc_hash::FxHashMap::default();
        for (i, target) in targets.iter().enumerate() {
            index_of.insert(target.clone(), i);
        }
        let mut backend = StatevectorBackend::new(targets.len());
        for stmt in circuit_text.split(';') {
            let stmt = stmt.trim();
            if stmt.is_empty() {
                continue;
            }
            let call = qdbg_frontend::gatecall::parse_gate_call(stmt)
                .map_err(|e| CheckError::CircuitExecution(e.to_string()))?;
            let qubits = call
                .targets
                .iter()
                .map(|t| {
                    index_of
                        .get(t)
                        .copied()
                        .ok_or_else(|| CheckError::UnknownTarget(t.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            backend
                .apply_gate(&call.name, &call.params, &qubits)
                .map_err(|e| CheckError::CircuitExecution(e.to_string()))?;
        }
        Ok(backend.amplitudes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bell_pair_entanglement_assertion_passes() {
        let mut engine = Engine::load(indoc::indoc! {"
            qreg q[2];
            h q[0];
            cx q[0], q[1];
            assert-ent q[0], q[1];
        "})
        .unwrap();
        let outcome = engine.run_all().unwrap();
        assert_eq!(outcome, RunAllOutcome { halted: true, failed_count: 0 });
    }

    #[test]
    fn missing_entanglement_assertion_fails() {
        let mut engine = Engine::load(indoc::indoc! {"
            qreg q[2];
            h q[0];
            assert-ent q[0], q[1];
        "})
        .unwrap();
        let outcome = engine.run_all().unwrap();
        assert_eq!(outcome, RunAllOutcome { halted: true, failed_count: 1 });
    }

    #[test]
    fn step_backward_restores_prior_amplitudes() {
        let mut engine = Engine::load("qreg q[1];\nx q[0];\n").unwrap();
        engine.step_forward().unwrap();
        assert!(engine.get_amplitude(1).unwrap().norm() > 0.99);
        engine.step_backward().unwrap();
        assert!(engine.get_amplitude(0).unwrap().norm() > 0.99);
    }

    #[test]
    fn breakpoint_halts_run() {
        let source = "qreg q[1];\nh q[0];\nx q[0];\nz q[0];\n";
        let mut engine = Engine::load(source).unwrap();
        let target = InstrId::from(1usize);
        engine.set_breakpoint(target);
        let outcome = engine.run().unwrap();
        assert_eq!(outcome, RunOutcome::HitBreakpoint(target));
    }

    #[test]
    fn call_and_return_resume_at_the_right_instruction() {
        let source = indoc::indoc! {"
            qreg q[1];
            gate flip q {
                x q;
            }
            flip q[0];
            assert-eq q[0] { 0, 1 }
        "};
        let mut engine = Engine::load(source).unwrap();
        let outcome = engine.run_all().unwrap();
        assert_eq!(outcome, RunAllOutcome { halted: true, failed_count: 0 });
    }
}
