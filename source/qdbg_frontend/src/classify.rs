// Statement classification: given one statement's
// (comment-blanked) text, decide which of the known statement shapes it is.

use crate::error::{FrontendError, FrontendResult};
use crate::gatecall::{parse_classic_controlled, parse_gate_call, parse_gate_header, parse_measure};
use qdbg_ast::{
    Assertion, ClassicalRegisterDefinition, QubitRegisterDefinition, SimulateOp,
};
use std::rc::Rc;

pub enum Classified {
    QubitRegister(QubitRegisterDefinition),
    ClassicalRegister(ClassicalRegisterDefinition),
    GateDef {
        name: Rc<str>,
        params: Vec<Rc<str>>,
        qargs: Vec<Rc<str>>,
    },
    Assertion(Assertion),
    Call {
        callee: Rc<str>,
        args: Vec<String>,
    },
    Simulate(SimulateOp),
    /// `OPENQASM 2.0;`, `include "...";`, or a blank/comment-only line.
    Skip,
}

/// Parses `kind name[size]`, e.g. `qreg q[2]`.
fn parse_register_header(text: &str) -> Option<(&str, &str, usize)> {
    let open = text.find('[')?;
    let close = text.find(']')?;
    if close < open {
        return None;
    }
    let head = text[..open].trim();
    let (kind, name) = head.split_once(char::is_whitespace)?;
    let name = name.trim();
    let size: usize = text[open + 1..close].trim().parse().ok()?;
    Some((kind.trim(), name, size))
}

pub fn classify(
    text: &str,
    base_qubit: usize,
    base_classical: usize,
    known_gates: &std::collections::HashSet<String>,
) -> FrontendResult<Classified> {
    let trimmed = text.trim().trim_end_matches(';').trim();
    if trimmed.is_empty() {
        return Ok(Classified::Skip);
    }
    if trimmed.starts_with("OPENQASM") || trimmed.starts_with("include") {
        return Ok(Classified::Skip);
    }
    if let Some((kind, name, size)) = parse_register_header(trimmed) {
        if kind == "qreg" {
            return Ok(Classified::QubitRegister(QubitRegisterDefinition {
                name: Rc::from(name),
                base_index: base_qubit,
                size,
            }));
        }
        if kind == "creg" {
            return Ok(Classified::ClassicalRegister(ClassicalRegisterDefinition {
                name: Rc::from(name),
                base_index: base_classical,
                size,
            }));
        }
    }
    if let Some(rest) = trimmed.strip_prefix("gate") {
        let rest = rest.trim_start();
        let (name, params, qargs) = parse_gate_header(rest)?;
        return Ok(Classified::GateDef { name, params, qargs });
    }
    if trimmed.starts_with("assert-") {
        return Ok(Classified::Assertion(qdbg_ast::assertion::parse_assertion(
            trimmed,
        )?));
    }
    if trimmed.starts_with("if") {
        return Ok(Classified::Simulate(parse_classic_controlled(trimmed)?));
    }
    if trimmed.contains("->") {
        return Ok(Classified::Simulate(parse_measure(trimmed)?));
    }
    if let Some(rest) = trimmed.strip_prefix("reset") {
        let qubit = rest.trim().to_string();
        if qubit.is_empty() {
            return Err(FrontendError::UnknownStatement(trimmed.to_string()));
        }
        return Ok(Classified::Simulate(SimulateOp::Reset { qubit }));
    }
    if let Some(rest) = trimmed.strip_prefix("barrier") {
        let targets = rest
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        return Ok(Classified::Simulate(SimulateOp::Barrier { targets }));
    }

    let call = parse_gate_call(trimmed)?;
    if known_gates.contains(&*call.name) {
        return Ok(Classified::Call {
            callee: call.name,
            args: call.targets,
        });
    }
    Ok(Classified::Simulate(SimulateOp::Gate {
        name: call.name,
        params: call.params,
        targets: call.targets,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gates() -> std::collections::HashSet<String> {
        std::collections::HashSet::from(["my_gate".to_string()])
    }

    #[test]
    fn classifies_qubit_register() {
        match classify("qreg q[2];", 0, 0, &gates()).unwrap() {
            Classified::QubitRegister(def) => {
                assert_eq!(&*def.name, "q");
                assert_eq!(def.size, 2);
            }
            _ => panic!("expected qubit register"),
        }
    }

    #[test]
    fn classifies_assertion() {
        match classify("assert-ent q[0], q[1];", 0, 0, &gates()).unwrap() {
            Classified::Assertion(Assertion::Entanglement { targets }) => {
                assert_eq!(targets, vec!["q[0]".to_string(), "q[1]".to_string()]);
            }
            _ => panic!("expected entanglement assertion"),
        }
    }

    #[test]
    fn classifies_known_gate_as_call() {
        match classify("my_gate q[0];", 0, 0, &gates()).unwrap() {
            Classified::Call { callee, args } => {
                assert_eq!(&*callee, "my_gate");
                assert_eq!(args, vec!["q[0]".to_string()]);
            }
            _ => panic!("expected call"),
        }
    }

    #[test]
    fn classifies_unknown_name_as_simulate() {
        match classify("h q[0];", 0, 0, &gates()).unwrap() {
            Classified::Simulate(SimulateOp::Gate { name, .. }) => assert_eq!(&*name, "h"),
            _ => panic!("expected simulate gate"),
        }
    }

    #[test]
    fn classifies_measure() {
        match classify("q[0] -> c[0];", 0, 0, &gates()).unwrap() {
            Classified::Simulate(SimulateOp::Measure { qubit, classical_bit }) => {
                assert_eq!(qubit, "q[0]");
                assert_eq!(classical_bit, "c[0]");
            }
            _ => panic!("expected measure"),
        }
    }
}
