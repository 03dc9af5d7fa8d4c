// Data-dependency and interaction analysis over the instruction graph the
// preprocessor already built. Two flavors of "who touched this qubit":
// static (declared/textual target sets, known before the program ever
// runs) and runtime (the actually-resolved qubit tuples the engine recorded
// while stepping, via [`crate::Diagnostics`]).

use crate::Diagnostics;
use qdbg_ast::{Instruction, InstrId, InstructionKind};
use qdbg_data_structures::text::{variable_base_name, variables_equal};
use qdbg_frontend::Program;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// A textual target's global qubit index, resolved against the program's
/// declared registers only (no call-frame substitution - this is a static,
/// whole-program view, not a live one).
#[must_use]
pub fn resolve_static_qubit(program: &Program, target: &str) -> Option<usize> {
    let base = variable_base_name(target);
    let index = qdbg_data_structures::text::variable_index(target).unwrap_or(0);
    program.qubit_register(base).map(|r| r.base_index + index)
}

fn static_target_qubits(program: &Program, instr: &Instruction) -> Vec<usize> {
    match &instr.kind {
        InstructionKind::Simulate(_) => instr
            .targets
            .iter()
            .filter_map(|t| resolve_static_qubit(program, t))
            .collect(),
        InstructionKind::Call { substitutions, .. } => substitutions
            .iter()
            .filter_map(|(_, arg)| resolve_static_qubit(program, arg))
            .collect(),
        _ => Vec::new(),
    }
}

/// Static interaction sweep: from `before` and `qubit`, repeatedly pull in
/// every qubit sharing a target set with one already reached, via the
/// declared target sets of every SIMULATE/CALL instruction in the same
/// function scope textually preceding `before`. Terminates when a sweep
/// adds nothing.
#[must_use]
pub fn static_interactions(program: &Program, before: InstrId, qubit: usize) -> FxHashSet<usize> {
    let scope = program.instruction(before).enclosing_function.clone();
    let mut reached = FxHashSet::default();
    reached.insert(qubit);
    loop {
        let mut grew = false;
        for instr in program.instructions.values() {
            if instr.index >= before || instr.enclosing_function != scope {
                continue;
            }
            let targets = static_target_qubits(program, instr);
            if targets.iter().any(|q| reached.contains(q)) {
                for q in targets {
                    if reached.insert(q) {
                        grew = true;
                    }
                }
            }
        }
        if !grew {
            break;
        }
    }
    reached
}

fn runtime_connected(diagnostics: &Diagnostics, from: usize, to: usize) -> bool {
    let mut reached = FxHashSet::default();
    reached.insert(from);
    loop {
        let mut grew = false;
        for (_, qubits) in diagnostics.witnessed_interactions() {
            if qubits.iter().any(|q| reached.contains(q)) {
                for &q in qubits {
                    if reached.insert(q) {
                        grew = true;
                    }
                }
            }
        }
        if !grew {
            break;
        }
    }
    reached.contains(&to)
}

/// For an entanglement (or any multi-target) assertion, every pair of
/// targets that the runtime interaction tree - built from the qubit tuples
/// the engine actually applied gates to, not the declared ones - never
/// connected. An empty result does not mean the assertion passes, only that
/// every target pair was at least linked by some instruction at some point.
#[must_use]
pub fn missing_interactions(
    program: &Program,
    diagnostics: &Diagnostics,
    assertion: InstrId,
) -> Vec<(String, String)> {
    let instr = program.instruction(assertion);
    let Some(targets) = instr.assertion().map(qdbg_ast::Assertion::targets) else {
        return Vec::new();
    };
    let mut missing = Vec::new();
    for (i, a) in targets.iter().enumerate() {
        for b in &targets[i + 1..] {
            let (Some(qa), Some(qb)) = (
                resolve_static_qubit(program, a),
                resolve_static_qubit(program, b),
            ) else {
                continue;
            };
            if !runtime_connected(diagnostics, qa, qb) {
                missing.push((a.clone(), b.clone()));
            }
        }
    }
    missing
}

/// The shortest path between two qubits in the runtime interaction tree, as
/// the ordered list of edges `(from, to, witnessing_instruction)`. `None` if
/// they were never linked, `Some(vec![])` if they are the same qubit.
#[must_use]
pub fn witnessed_path(
    diagnostics: &Diagnostics,
    from: usize,
    to: usize,
) -> Option<Vec<(usize, usize, InstrId)>> {
    if from == to {
        return Some(Vec::new());
    }
    let mut adjacency: FxHashMap<usize, Vec<(usize, InstrId)>> = FxHashMap::default();
    for (instr, qubits) in diagnostics.witnessed_interactions() {
        for &u in qubits {
            for &v in qubits {
                if u != v {
                    adjacency.entry(u).or_default().push((v, *instr));
                }
            }
        }
    }

    let mut visited = FxHashSet::default();
    visited.insert(from);
    let mut parent: FxHashMap<usize, (usize, InstrId)> = FxHashMap::default();
    let mut queue = VecDeque::from([from]);
    while let Some(u) = queue.pop_front() {
        if u == to {
            break;
        }
        for &(v, instr) in adjacency.get(&u).into_iter().flatten() {
            if visited.insert(v) {
                parent.insert(v, (u, instr));
                queue.push_back(v);
            }
        }
    }
    if !visited.contains(&to) {
        return None;
    }
    let mut path = Vec::new();
    let mut current = to;
    while current != from {
        let (prev, instr) = parent[&current];
        path.push((prev, current, instr));
        current = prev;
    }
    path.reverse();
    Some(path)
}

/// BFS backward through the recorded per-instruction dependency lists, the
/// way `get-data-dependencies` is specified: declarations contribute
/// nothing (they were never recorded as dependencies in the first place),
/// a CALL producer descends into its callee to find the most recent
/// instruction referencing the matching parameter (searching backward from
/// the callee's RETURN), and - when `include_callers` is set - a scope with
/// no local producer for the instruction being traced continues the search
/// at every one of the enclosing function's call sites.
#[must_use]
pub fn data_dependencies(program: &Program, start: InstrId, include_callers: bool) -> Vec<InstrId> {
    let mut seen = FxHashSet::default();
    let mut result = Vec::new();
    let mut queue = VecDeque::new();
    seen.insert(start);
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        let node = program.instruction(current);
        for dep in &node.dependencies {
            push_new(dep.producer, &mut seen, &mut result, &mut queue);

            if let InstructionKind::Call {
                callee,
                substitutions,
            } = &program.instruction(dep.producer).kind
            {
                if let Some((param, _)) = substitutions.get(dep.arg_position) {
                    if let Some(found) = last_reference_in_callee(program, callee, param) {
                        push_new(found, &mut seen, &mut result, &mut queue);
                    }
                }
            }
        }

        if include_callers && node.dependencies.is_empty() {
            if let Some(scope) = &node.enclosing_function {
                if let Some(callers) = program.function_callers.get(scope) {
                    for &caller in callers {
                        push_new(caller, &mut seen, &mut result, &mut queue);
                    }
                }
            }
        }
    }
    result
}

fn push_new(
    id: InstrId,
    seen: &mut FxHashSet<InstrId>,
    result: &mut Vec<InstrId>,
    queue: &mut VecDeque<InstrId>,
) {
    if seen.insert(id) {
        result.push(id);
        queue.push_back(id);
    }
}

/// The most recent instruction (by textual/index order) inside `callee`'s
/// body, before its RETURN, whose targets reference `param`.
fn last_reference_in_callee(program: &Program, callee: &str, param: &str) -> Option<InstrId> {
    let mut body: Vec<&Instruction> = program
        .instructions
        .values()
        .filter(|i| i.enclosing_function.as_deref() == Some(callee))
        .collect();
    body.sort_by_key(|i| i.index);
    let return_pos = body.iter().position(|i| matches!(i.kind, InstructionKind::Return))?;
    body[..return_pos]
        .iter()
        .rev()
        .find(|i| {
            i.targets
                .iter()
                .any(|t| variables_equal(t, param) || variable_base_name(t) == variable_base_name(param))
        })
        .map(|i| i.index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_target_with_no_runtime_interaction() {
        let source = "qreg q[2];\nh q[0];\nassert-ent q[0], q[1];\n";
        let program = qdbg_frontend::preprocess(source).unwrap();
        let assertion_id = program
            .instructions
            .iter()
            .find(|(_, instr)| instr.is_assertion())
            .map(|(id, _)| id)
            .unwrap();
        let diagnostics = Diagnostics::new();
        let missing = missing_interactions(&program, &diagnostics, assertion_id);
        assert_eq!(missing, vec![("q[0]".to_string(), "q[1]".to_string())]);
    }

    #[test]
    fn per_target_writers_do_not_satisfy_entanglement() {
        // Both qubits have their own producer, but never a shared one - the
        // assertion genuinely never connects them.
        let source = "qreg q[2];\nh q[0];\nh q[1];\nassert-ent q[0], q[1];\n";
        let program = qdbg_frontend::preprocess(source).unwrap();
        let assertion_id = program
            .instructions
            .iter()
            .find(|(_, instr)| instr.is_assertion())
            .map(|(id, _)| id)
            .unwrap();
        let mut diagnostics = Diagnostics::new();
        let pre = vec![num_complex::Complex64::new(1.0, 0.0), num_complex::Complex64::new(0.0, 0.0)];
        diagnostics.observe_gate(InstrId::from(1usize), "h", &[0], &pre, 1);
        diagnostics.observe_gate(InstrId::from(2usize), "h", &[1], &pre, 1);
        let missing = missing_interactions(&program, &diagnostics, assertion_id);
        assert_eq!(missing, vec![("q[0]".to_string(), "q[1]".to_string())]);
    }

    #[test]
    fn a_shared_two_qubit_gate_satisfies_entanglement() {
        let source = "qreg q[2];\ncx q[0], q[1];\nassert-ent q[0], q[1];\n";
        let program = qdbg_frontend::preprocess(source).unwrap();
        let assertion_id = program
            .instructions
            .iter()
            .find(|(_, instr)| instr.is_assertion())
            .map(|(id, _)| id)
            .unwrap();
        let mut diagnostics = Diagnostics::new();
        let pre = vec![num_complex::Complex64::new(1.0, 0.0); 4];
        diagnostics.observe_gate(InstrId::from(1usize), "cx", &[0, 1], &pre, 2);
        let missing = missing_interactions(&program, &diagnostics, assertion_id);
        assert!(missing.is_empty());
    }

    #[test]
    fn static_interactions_follow_a_chain_of_shared_targets() {
        let source = "qreg q[3];\ncx q[0], q[1];\ncx q[1], q[2];\nassert-ent q[0], q[2];\n";
        let program = qdbg_frontend::preprocess(source).unwrap();
        let assertion_id = program
            .instructions
            .iter()
            .find(|(_, instr)| instr.is_assertion())
            .map(|(id, _)| id)
            .unwrap();
        let reached = static_interactions(&program, assertion_id, 0);
        assert!(reached.contains(&1));
        assert!(reached.contains(&2));
    }

    #[test]
    fn data_dependencies_walk_backward_through_writers() {
        let source = "qreg q[1];\nh q[0];\nx q[0];\nassert-sup q[0];\n";
        let program = qdbg_frontend::preprocess(source).unwrap();
        let x_instr = program
            .instructions
            .iter()
            .find(|(_, i)| matches!(&i.kind, InstructionKind::Simulate(qdbg_ast::SimulateOp::Gate { name, .. }) if &**name == "x"))
            .map(|(id, _)| id)
            .unwrap();
        let deps = data_dependencies(&program, x_instr, false);
        assert_eq!(deps.len(), 1);
        let producer = program.instruction(deps[0]);
        assert!(matches!(&producer.kind, InstructionKind::Simulate(qdbg_ast::SimulateOp::Gate { name, .. }) if &**name == "h"));
    }

    #[test]
    fn data_dependencies_descend_through_a_call() {
        let source = indoc::indoc! {"
            qreg q[1];
            gate flip q {
                x q;
            }
            h q[0];
            flip q[0];
        "};
        let program = qdbg_frontend::preprocess(source).unwrap();
        let call_instr = program
            .instructions
            .iter()
            .find(|(_, i)| matches!(&i.kind, InstructionKind::Call { .. }))
            .map(|(id, _)| id)
            .unwrap();
        // the call's own dependency is the `h` before it; the x inside the
        // body has no local producer for its own parameter, so it is not
        // reachable without `include_callers`, but the call itself is.
        let deps = data_dependencies(&program, call_instr, false);
        assert!(deps
            .iter()
            .any(|&id| matches!(&program.instruction(id).kind, InstructionKind::Simulate(qdbg_ast::SimulateOp::Gate { name, .. }) if &**name == "h")));
    }

    #[test]
    fn include_callers_follows_call_sites_from_inside_a_function_body() {
        let source = indoc::indoc! {"
            qreg q[1];
            gate flip q {
                x q;
            }
            flip q[0];
        "};
        let program = qdbg_frontend::preprocess(source).unwrap();
        let x_instr = program
            .instructions
            .iter()
            .find(|(_, i)| matches!(&i.kind, InstructionKind::Simulate(qdbg_ast::SimulateOp::Gate { name, .. }) if &**name == "x"))
            .map(|(id, _)| id)
            .unwrap();
        let deps = data_dependencies(&program, x_instr, true);
        assert!(deps
            .iter()
            .any(|&id| matches!(&program.instruction(id).kind, InstructionKind::Call { .. })));
    }
}
