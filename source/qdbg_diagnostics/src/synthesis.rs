// New-assertion synthesis on failure: turns the state the program actually
// reached into one or more replacement assertions the user can drop in,
// rather than leaving them to transcribe amplitudes by hand. Dispatches on
// the failed assertion's own kind - the three behaviors don't share much
// beyond "look at the live state and the runtime interaction tree".

use crate::interaction::{resolve_static_qubit, witnessed_path};
use crate::Diagnostics;
use num_complex::Complex64;
use qdbg_ast::{Assertion, InstrId};
use qdbg_linalg::density::{density_matrix_of_pure_state, is_pure, partial_trace, sub_state_vector_amplitudes};
use qdbg_linalg::LinalgError;
use qdbg_frontend::Program;

/// One proposed assertion: where to insert it, and its ready-to-paste source
/// text.
#[derive(Clone, Debug, PartialEq)]
pub struct SynthesizedAssertion {
    pub position: InstrId,
    pub text: String,
}

/// Proposes replacement assertions for a failed one, per its kind. Returns
/// an empty list when the kind has nothing useful to propose (e.g. a
/// superposition failure, which the spec leaves unsynthesized).
#[must_use = "synthesizing a replacement assertion has no effect until reported to the user"]
pub fn synthesize_new_assertions(
    program: &Program,
    diagnostics: &Diagnostics,
    assertion: InstrId,
    amplitudes: &[Complex64],
) -> Vec<SynthesizedAssertion> {
    let instr = program.instruction(assertion);
    let Some(kind) = instr.assertion() else {
        return Vec::new();
    };
    match kind {
        Assertion::Entanglement { targets } if targets.len() > 2 => {
            pairwise_entanglement(assertion, targets)
        }
        Assertion::Entanglement { targets } if targets.len() == 2 => {
            path_entanglement(program, diagnostics, targets)
        }
        Assertion::Equality { targets, .. } => {
            let qubits: Vec<usize> = targets
                .iter()
                .filter_map(|t| resolve_static_qubit(program, t))
                .collect();
            if qubits.len() != targets.len() {
                return Vec::new();
            }
            synthesize_equality_split(targets, &qubits, amplitudes, program.num_qubits, assertion)
                .unwrap_or_default()
        }
        _ => Vec::new(),
    }
}

fn pairwise_entanglement(assertion: InstrId, targets: &[String]) -> Vec<SynthesizedAssertion> {
    let mut out = Vec::new();
    for (i, a) in targets.iter().enumerate() {
        for b in &targets[i + 1..] {
            out.push(SynthesizedAssertion {
                position: assertion,
                text: format!("assert-ent {a}, {b};"),
            });
        }
    }
    out
}

fn path_entanglement(
    program: &Program,
    diagnostics: &Diagnostics,
    targets: &[String],
) -> Vec<SynthesizedAssertion> {
    let (Some(qa), Some(qb)) = (
        resolve_static_qubit(program, &targets[0]),
        resolve_static_qubit(program, &targets[1]),
    ) else {
        return Vec::new();
    };
    let Some(path) = witnessed_path(diagnostics, qa, qb) else {
        return Vec::new();
    };
    path.into_iter()
        .map(|(u, v, witness)| SynthesizedAssertion {
            position: InstrId::from(usize::from(witness) + 1),
            text: format!(
                "assert-ent {}, {};",
                qubit_display_name(program, u),
                qubit_display_name(program, v)
            ),
        })
        .collect()
}

fn qubit_display_name(program: &Program, qubit: usize) -> String {
    program
        .qubit_registers
        .iter()
        .find(|r| qubit >= r.base_index && qubit < r.base_index + r.size)
        .map(|r| format!("{}[{}]", r.name, qubit - r.base_index))
        .unwrap_or_else(|| format!("q[{qubit}]"))
}

/// Splits a failed statevector-equality assertion into one per qubit whose
/// single-qubit reduced state is separable, plus one covering whatever
/// remains entangled together. Rounds amplitudes to 5 decimals for
/// readability, relaxing the threshold when that rounding is lossy. Returns
/// no proposals when every qubit is separable (nothing left to group) or
/// none is (there is no split to make).
#[must_use = "synthesizing a replacement assertion has no effect until reported to the user"]
pub fn synthesize_equality_split(
    target_names: &[String],
    qubits: &[usize],
    full_state: &[Complex64],
    num_qubits: usize,
    assertion: InstrId,
) -> Result<Vec<SynthesizedAssertion>, LinalgError> {
    let rho = density_matrix_of_pure_state(full_state);
    let mut separable = Vec::new();
    let mut remainder = Vec::new();
    for (&qubit, name) in qubits.iter().zip(target_names) {
        let reduced = partial_trace(&rho, num_qubits, &[qubit]);
        if is_pure(&reduced) {
            separable.push((qubit, name.clone()));
        } else {
            remainder.push((qubit, name.clone()));
        }
    }

    if separable.is_empty() || remainder.is_empty() {
        return Ok(Vec::new());
    }

    let mut out = Vec::new();
    for (qubit, name) in &separable {
        let amps = sub_state_vector_amplitudes(full_state, num_qubits, &[*qubit])?;
        out.push(equality_assertion(assertion, &[name.clone()], &amps));
    }
    let remainder_qubits: Vec<usize> = remainder.iter().map(|(q, _)| *q).collect();
    let remainder_names: Vec<String> = remainder.iter().map(|(_, n)| n.clone()).collect();
    let remainder_amps = sub_state_vector_amplitudes(full_state, num_qubits, &remainder_qubits)?;
    out.push(equality_assertion(assertion, &remainder_names, &remainder_amps));
    Ok(out)
}

fn equality_assertion(position: InstrId, names: &[String], amplitudes: &[Complex64]) -> SynthesizedAssertion {
    let rounded: Vec<Complex64> = amplitudes
        .iter()
        .map(|a| Complex64::new(round5(a.re), round5(a.im)))
        .collect();
    let lossy = amplitudes
        .iter()
        .zip(&rounded)
        .any(|(original, r)| (original - r).norm() > 1e-9);
    let threshold = if lossy { 0.99999 } else { 1.0 };

    let body = rounded.iter().map(|c| format_complex(*c)).collect::<Vec<_>>().join(", ");
    let text = if (threshold - 1.0).abs() < 1e-9 {
        format!("assert-eq {} {{ {} }};", names.join(", "), body)
    } else {
        format!("assert-eq {threshold:.5}, {} {{ {} }};", names.join(", "), body)
    };
    SynthesizedAssertion { position, text }
}

fn round5(x: f64) -> f64 {
    (x * 1e5).round() / 1e5
}

fn format_complex(c: Complex64) -> String {
    if c.im.abs() < 1e-9 {
        format!("{:.5}", c.re)
    } else if c.im >= 0.0 {
        format!("{:.5}+{:.5}i", c.re, c.im)
    } else {
        format!("{:.5}{:.5}i", c.re, c.im)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_1_SQRT_2;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    #[test]
    fn equality_split_separates_a_separable_qubit_from_an_entangled_pair() {
        // q[0] = |+>, and q[1],q[2] form a Bell pair: q[0] splits off, q[1]/q[2] stay together.
        let mut state = vec![Complex64::new(0.0, 0.0); 8];
        // index bit0=q0, bit1=q1, bit2=q2.
        state[0b000] = Complex64::new(0.5, 0.0);
        state[0b110] = Complex64::new(0.5, 0.0);
        state[0b001] = Complex64::new(0.5, 0.0);
        state[0b111] = Complex64::new(0.5, 0.0);
        let targets = vec!["q[0]".to_string(), "q[1]".to_string(), "q[2]".to_string()];
        let qubits = vec![0, 1, 2];
        let result = synthesize_equality_split(&targets, &qubits, &state, 3, InstrId::from(0usize)).unwrap();
        assert_eq!(result.len(), 2);
        assert!(result[0].text.contains("q[0]"));
        assert!(result[1].text.contains("q[1]"));
        assert!(result[1].text.contains("q[2]"));
    }

    #[test]
    fn equality_split_skips_when_fully_entangled() {
        let bell = vec![c(FRAC_1_SQRT_2, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(FRAC_1_SQRT_2, 0.0)];
        let targets = vec!["q[0]".to_string(), "q[1]".to_string()];
        let result = synthesize_equality_split(&targets, &[0, 1], &bell, 2, InstrId::from(0usize)).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn equality_split_skips_when_fully_separable() {
        let product = vec![c(FRAC_1_SQRT_2, 0.0), c(FRAC_1_SQRT_2, 0.0), c(0.0, 0.0), c(0.0, 0.0)];
        let targets = vec!["q[0]".to_string(), "q[1]".to_string()];
        let result = synthesize_equality_split(&targets, &[0, 1], &product, 2, InstrId::from(0usize)).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn pairwise_breakdown_covers_every_pair_for_more_than_two_targets() {
        let targets = vec!["q[0]".to_string(), "q[1]".to_string(), "q[2]".to_string()];
        let result = pairwise_entanglement(InstrId::from(5usize), &targets);
        assert_eq!(result.len(), 3);
        assert!(result.iter().all(|s| s.position == InstrId::from(5usize)));
    }
}
