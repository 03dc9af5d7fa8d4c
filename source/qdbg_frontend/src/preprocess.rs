// Orchestrates the preprocessing pipeline: comment stripping,
// statement splitting, a pre-pass sweep for gate names (so forward calls
// classify correctly), recursive classification with gate bodies expanded
// in place, successor wiring, and backward data-dependency computation.

use crate::classify::{classify, Classified};
use crate::error::{FrontendError, FrontendResult};
use crate::scan::{classification_text, comment_spans, split_statements, RawStatement};
use qdbg_ast::{Dependency, Instruction, InstructionKind, InstrId, Successor, Variable};
use qdbg_data_structures::index_map::IndexMap;
use qdbg_data_structures::text::{variable_base_name, variable_index, variables_equal};
use rustc_hash::{FxHashMap, FxHashSet};
use std::rc::Rc;

use crate::program::Program;

/// Every statement starting with `gate ` contributes its name, independent
/// of statement splitting, so that a forward-referenced call still resolves
/// before its definition is reached.
fn sweep_gate_names(raw: &str, comments: &[qdbg_data_structures::Span]) -> FxHashSet<String> {
    let mut names = FxHashSet::default();
    let mut search_from = 0usize;
    while let Some(rel) = raw[search_from..].find("gate") {
        let idx = search_from + rel;
        let boundary_ok = idx == 0
            || raw.as_bytes()[idx - 1].is_ascii_whitespace()
            || raw.as_bytes()[idx - 1] == b';'
            || raw.as_bytes()[idx - 1] == b'}';
        let commented = comments.iter().any(|s| s.contains(idx as u32));
        if boundary_ok && !commented {
            let rest = raw[idx + 4..].trim_start();
            if let Some(name) = rest.split(|c: char| c.is_whitespace() || c == '(').next() {
                if !name.is_empty() {
                    names.insert(name.to_string());
                }
            }
        }
        search_from = idx + 4;
    }
    names
}

struct Builder<'a> {
    raw: &'a str,
    comments: Vec<qdbg_data_structures::Span>,
    known_gates: FxHashSet<String>,
    instructions: Vec<Instruction>,
    qubit_registers: Vec<qdbg_ast::QubitRegisterDefinition>,
    classical_registers: Vec<qdbg_ast::ClassicalRegisterDefinition>,
    variables: Vec<Variable>,
    num_qubits: usize,
    num_classical_bits: usize,
    function_entries: FxHashMap<Rc<str>, InstrId>,
    function_callers: FxHashMap<Rc<str>, Vec<InstrId>>,
    function_params: FxHashMap<Rc<str>, Vec<Rc<str>>>,
}

impl<'a> Builder<'a> {
    fn alloc(
        &mut self,
        kind: InstructionKind,
        span: qdbg_data_structures::Span,
        enclosing_function: Option<Rc<str>>,
    ) -> InstrId {
        let index = InstrId::from(self.instructions.len());
        let targets = match &kind {
            InstructionKind::Simulate(op) => op.targets(),
            InstructionKind::Assertion(a) => a.targets().to_vec(),
            // A call's targets are the caller's argument names, in
            // declaration order - this is what lets a CALL participate as a
            // dependency producer and as an interaction witness, the same
            // as any other multi-qubit instruction.
            InstructionKind::Call { substitutions, .. } => {
                substitutions.iter().map(|(_, arg)| arg.to_string()).collect()
            }
            _ => Vec::new(),
        };
        self.instructions.push(Instruction {
            index,
            kind,
            span,
            successor: Successor::Halt,
            targets,
            dependencies: Vec::new(),
            enclosing_function,
            function_body: None,
        });
        index
    }

    fn wire_sequential(&mut self, ids: &[InstrId], tail: Successor) {
        for pair in ids.windows(2) {
            self.instructions[usize::from(pair[0])].successor = Successor::Instruction(pair[1]);
        }
        if let Some(&last) = ids.last() {
            self.instructions[usize::from(last)].successor = tail;
        }
    }

    fn process_range(
        &mut self,
        range: std::ops::Range<usize>,
        enclosing_function: Option<Rc<str>>,
    ) -> FrontendResult<Vec<InstrId>> {
        let stmts = split_statements(self.raw, &self.comments, range)?;
        let mut ids = Vec::new();
        for stmt in stmts {
            let text = classification_text(self.raw, &self.comments, &stmt);
            let classified =
                classify(&text, self.num_qubits, self.num_classical_bits, &self.known_gates)?;
            match classified {
                Classified::Skip => {}
                Classified::QubitRegister(def) => {
                    let id = self.alloc(InstructionKind::Nop, stmt.span, enclosing_function.clone());
                    self.instructions[usize::from(id)].targets = vec![def.name.to_string()];
                    ids.push(id);
                    self.num_qubits += def.size;
                    self.qubit_registers.push(def);
                }
                Classified::ClassicalRegister(def) => {
                    let id = self.alloc(InstructionKind::Nop, stmt.span, enclosing_function.clone());
                    self.instructions[usize::from(id)].targets = vec![def.name.to_string()];
                    ids.push(id);
                    for i in 0..def.size {
                        self.variables
                            .push(Variable::new_bit(format!("{}[{}]", def.name, i)));
                    }
                    self.num_classical_bits += def.size;
                    self.classical_registers.push(def);
                }
                Classified::GateDef { name, params, qargs: _ } => {
                    let block = stmt
                        .block
                        .ok_or_else(|| FrontendError::GateWithoutBody(name.to_string()))?;
                    let header = self.alloc(InstructionKind::Nop, stmt.span, enclosing_function.clone());
                    self.function_params.insert(name.clone(), params);
                    ids.push(header);

                    let body_ids =
                        self.process_range(block.lo as usize..block.hi as usize, Some(name.clone()))?;
                    let return_id =
                        self.alloc(InstructionKind::Return, stmt.span, Some(name.clone()));
                    self.wire_sequential(&body_ids, Successor::Instruction(return_id));
                    self.instructions[usize::from(return_id)].successor = Successor::PopCallStack;

                    // A CALL jumps straight into the body (or the RETURN, if
                    // the body is empty) - the header NOP only serves to let
                    // top-level control flow step past the definition
                    // without entering it.
                    let entry = body_ids.first().copied().unwrap_or(return_id);
                    self.function_entries.insert(name.clone(), entry);

                    let mut full_body = body_ids;
                    full_body.push(return_id);
                    self.instructions[usize::from(header)].function_body = Some(full_body);
                }
                Classified::Assertion(assertion) => {
                    assertion.validate()?;
                    let id = self.alloc(
                        InstructionKind::Assertion(assertion),
                        stmt.span,
                        enclosing_function.clone(),
                    );
                    ids.push(id);
                }
                Classified::Call { callee, args } => {
                    let params = self
                        .function_params
                        .get(&callee)
                        .ok_or_else(|| FrontendError::UnknownCallee(callee.to_string()))?
                        .clone();
                    if params.len() != args.len() {
                        return Err(FrontendError::ArityMismatch {
                            callee: callee.to_string(),
                            expected: params.len(),
                            actual: args.len(),
                        });
                    }
                    let substitutions = params
                        .into_iter()
                        .zip(args.into_iter().map(Rc::from))
                        .collect::<Vec<(Rc<str>, Rc<str>)>>();
                    let id = self.alloc(
                        InstructionKind::Call {
                            callee: callee.clone(),
                            substitutions,
                        },
                        stmt.span,
                        enclosing_function.clone(),
                    );
                    self.function_callers.entry(callee).or_default().push(id);
                    ids.push(id);
                }
                Classified::Simulate(op) => {
                    let id = self.alloc(
                        InstructionKind::Simulate(op),
                        stmt.span,
                        enclosing_function.clone(),
                    );
                    ids.push(id);
                }
            }
        }
        Ok(ids)
    }

    /// For every instruction, walks backward over instructions in the same
    /// function scope to find, for each target it reads, the most recent
    /// prior instruction that wrote the same variable.
    fn compute_dependencies(&mut self) {
        for i in 0..self.instructions.len() {
            let scope = self.instructions[i].enclosing_function.clone();
            let targets = self.instructions[i].targets.clone();
            let mut deps = Vec::new();
            for target in &targets {
                for j in (0..i).rev() {
                    if self.instructions[j].enclosing_function != scope {
                        continue;
                    }
                    let arg_position = self.instructions[j].targets.iter().position(|t| {
                        variables_equal(t, target) || variable_base_name(t) == variable_base_name(target)
                    });
                    if let Some(arg_position) = arg_position {
                        // Declarations introduce a variable, they do not
                        // produce a value for it - the search for a real
                        // producer simply stops at the declaration with no
                        // dependency recorded, same as "nothing ever wrote
                        // this" would.
                        if !matches!(self.instructions[j].kind, InstructionKind::Nop) {
                            deps.push(Dependency {
                                producer: self.instructions[j].index,
                                arg_position,
                            });
                        }
                        break;
                    }
                }
            }
            self.instructions[i].dependencies = deps;
        }
    }
}

#[must_use]
pub fn preprocess(source: &str) -> FrontendResult<Program> {
    let comments = comment_spans(source);
    let known_gates = sweep_gate_names(source, &comments);

    let mut builder = Builder {
        raw: source,
        comments,
        known_gates,
        instructions: Vec::new(),
        qubit_registers: Vec::new(),
        classical_registers: Vec::new(),
        variables: Vec::new(),
        num_qubits: 0,
        num_classical_bits: 0,
        function_entries: FxHashMap::default(),
        function_callers: FxHashMap::default(),
        function_params: FxHashMap::default(),
    };

    let top_ids = builder.process_range(0..source.len(), None)?;
    builder.wire_sequential(&top_ids, Successor::Halt);
    builder.compute_dependencies();

    let entry = top_ids.first().copied().unwrap_or_else(|| InstrId::from(0usize));
    let mut instructions = IndexMap::new();
    for instr in builder.instructions {
        instructions.insert(instr.index, instr);
    }

    let program = Program {
        source: Rc::from(source),
        instructions,
        qubit_registers: builder.qubit_registers,
        classical_registers: builder.classical_registers,
        variables: builder.variables,
        num_qubits: builder.num_qubits,
        num_classical_bits: builder.num_classical_bits,
        entry,
        function_entries: builder.function_entries,
        function_callers: builder.function_callers,
    };
    validate_assertion_targets(&program)?;
    Ok(program)
}

/// Rejects an assertion naming a qubit index past the end of its declared
/// register - this must fail at load time rather than panic deep inside a
/// density-matrix index once the engine runs.
fn validate_assertion_targets(program: &Program) -> FrontendResult<()> {
    for instr in program.instructions.values() {
        let Some(assertion) = instr.assertion() else {
            continue;
        };
        for target in assertion.targets() {
            let Some(index) = variable_index(target) else {
                continue;
            };
            let register = variable_base_name(target);
            if let Some(def) = program.qubit_register(register) {
                if index >= def.size {
                    return Err(FrontendError::QubitOutOfRange {
                        register: register.to_string(),
                        index,
                        size: def.size,
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;
    use qdbg_ast::{InstructionKind, SimulateOp};

    /// One line per instruction: its kind and where it hands off control
    /// next, so a call-dispatch regression shows up as a diff in the
    /// successor column rather than requiring a step-by-step trace.
    fn successor_dump(program: &Program) -> String {
        let mut out = String::new();
        for instr in program.instructions.values() {
            let kind = match &instr.kind {
                InstructionKind::Nop => "nop".to_string(),
                InstructionKind::Return => "return".to_string(),
                InstructionKind::Call { callee, .. } => format!("call {callee}"),
                InstructionKind::Simulate(SimulateOp::Gate { name, .. }) => format!("gate {name}"),
                InstructionKind::Simulate(_) => "simulate".to_string(),
                InstructionKind::Assertion(_) => "assert".to_string(),
            };
            let successor = match instr.successor {
                Successor::Instruction(id) => format!("{}", usize::from(id)),
                Successor::PopCallStack => "pop".to_string(),
                Successor::Halt => "halt".to_string(),
            };
            out.push_str(&format!(
                "{}: {kind} -> {successor}\n",
                usize::from(instr.index)
            ));
        }
        out
    }

    #[test]
    fn preprocesses_bell_pair_program() {
        let source = indoc::indoc! {"
            qreg q[2];
            creg c[2];
            h q[0];
            cx q[0], q[1];
            assert-ent q[0], q[1];
        "};
        let program = preprocess(source).unwrap();
        assert_eq!(program.num_qubits, 2);
        assert_eq!(program.num_classical_bits, 2);
        // qreg + creg declarations each get their own NOP, plus h/cx/assert.
        assert_eq!(program.instructions.len(), 5);
    }

    #[test]
    fn wires_gate_definition_and_call() {
        let source = indoc::indoc! {"
            qreg q[1];
            gate flip q {
                x q;
            }
            flip q[0];
        "};
        let program = preprocess(source).unwrap();
        let header = program
            .instructions
            .values()
            .find(|i| i.function_body.is_some())
            .expect("gate definition header should carry its body");
        assert_eq!(header.function_body.as_ref().unwrap().len(), 2); // x q; + return

        // The call entry point is the first body instruction, not the
        // header Nop - the header's own successor is reserved for
        // top-level pass-through flow around the definition.
        let entry = *program.function_entries.get("flip").unwrap();
        let entry_instr = program.instruction(entry);
        assert!(matches!(
            &entry_instr.kind,
            InstructionKind::Simulate(SimulateOp::Gate { name, .. }) if &**name == "x"
        ));
        assert_ne!(entry, header.index);

        assert_eq!(program.function_callers.get("flip").unwrap().len(), 1);
    }

    #[test]
    fn data_dependency_links_consecutive_writers() {
        let source = "qreg q[1];\nh q[0];\nx q[0];\n";
        let program = preprocess(source).unwrap();
        let x_instr = program
            .instructions
            .values()
            .find(|i| matches!(&i.kind, InstructionKind::Simulate(SimulateOp::Gate { name, .. }) if &**name == "x"))
            .unwrap();
        assert_eq!(x_instr.dependencies.len(), 1);
    }

    #[test]
    fn rejects_undeclared_call() {
        let source = "qreg q[1];\nfoo q[0];\n";
        // `foo` is not swept as a gate name, so it classifies as a simulate
        // gate, not a call; this exercises that fallback rather than an error.
        let program = preprocess(source).unwrap();
        assert_eq!(program.instructions.len(), 2);
    }

    #[test]
    fn call_jumps_into_the_body_and_returns_past_the_header() {
        let source = indoc::indoc! {"
            qreg q[1];
            gate flip q {
                x q;
            }
            flip q[0];
            assert-sup q[0];
        "};
        let program = preprocess(source).unwrap();
        expect![[r#"
            0: nop -> 1
            1: nop -> 4
            2: gate x -> 3
            3: return -> pop
            4: call flip -> 5
            5: assert -> halt
        "#]]
        .assert_eq(&successor_dump(&program));
    }

    #[test]
    fn rejects_out_of_range_assertion_target() {
        let source = "qreg q[2];\nassert-ent q[0], q[5];\n";
        let err = preprocess(source).unwrap_err();
        assert!(matches!(
            err,
            FrontendError::QubitOutOfRange { index: 5, size: 2, .. }
        ));
    }

    #[test]
    fn unterminated_gate_body_reports_unbalanced_braces() {
        let source = "qreg q[1];\ngate flip q {\n    x q;\n";
        let err = preprocess(source).unwrap_err();
        assert!(matches!(err, FrontendError::UnbalancedBraces(_)));
    }
}
