// The assertion model: a tagged variant per assertion kind, parsed from the
// textual `assert-*` statement form, in the spirit of
// `include/common/parsing/AssertionParsing.hpp` / `AssertionTools.hpp`.

use miette::Diagnostic;
use num_complex::Complex64;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq)]
pub enum Assertion {
    Entanglement {
        targets: Vec<String>,
    },
    Superposition {
        targets: Vec<String>,
    },
    Equality {
        targets: Vec<String>,
        threshold: f64,
        body: EqualityBody,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum EqualityBody {
    Statevector(Vec<Complex64>),
    Circuit(String),
}

impl Assertion {
    #[must_use]
    pub fn targets(&self) -> &[String] {
        match self {
            Assertion::Entanglement { targets }
            | Assertion::Superposition { targets }
            | Assertion::Equality { targets, .. } => targets,
        }
    }

    pub fn set_targets(&mut self, new_targets: Vec<String>) {
        match self {
            Assertion::Entanglement { targets }
            | Assertion::Superposition { targets }
            | Assertion::Equality { targets, .. } => *targets = new_targets,
        }
    }

    /// Thresholds must lie in `[0, 1]`; for a state-vector equality,
    /// `2^|targets| = length(amplitudes)`.
    pub fn validate(&self) -> Result<(), AssertionError> {
        match self {
            Assertion::Entanglement { targets } | Assertion::Superposition { targets } => {
                if targets.is_empty() {
                    return Err(AssertionError::EmptyTargets);
                }
                Ok(())
            }
            Assertion::Equality {
                targets,
                threshold,
                body,
            } => {
                if !(0.0..=1.0).contains(threshold) {
                    return Err(AssertionError::ThresholdOutOfRange(*threshold));
                }
                if let EqualityBody::Statevector(amplitudes) = body {
                    let expected = 1usize << targets.len();
                    if amplitudes.len() != expected {
                        return Err(AssertionError::StatevectorLengthMismatch {
                            expected,
                            actual: amplitudes.len(),
                        });
                    }
                }
                Ok(())
            }
        }
    }
}

#[derive(Clone, Debug, Diagnostic, Error, PartialEq)]
pub enum AssertionError {
    #[error("unknown assertion keyword {0:?}")]
    UnknownKeyword(String),
    #[error("assertion has no targets")]
    EmptyTargets,
    #[error("assertion body {{...}} was not closed")]
    UnclosedBody,
    #[error("could not parse complex amplitude token {0:?}")]
    InvalidComplexToken(String),
    #[error("similarity threshold {0} is out of range [0, 1]")]
    ThresholdOutOfRange(f64),
    #[error("state vector has {actual} amplitudes, expected 2^targets = {expected}")]
    StatevectorLengthMismatch { expected: usize, actual: usize },
}

/// Parses a single `assert-*` statement (without its trailing `;`).
pub fn parse_assertion(text: &str) -> Result<Assertion, AssertionError> {
    let text = text.trim().trim_end_matches(';').trim();
    if let Some(rest) = text.strip_prefix("assert-ent") {
        return Ok(Assertion::Entanglement {
            targets: parse_target_list(rest),
        });
    }
    if let Some(rest) = text.strip_prefix("assert-sup") {
        return Ok(Assertion::Superposition {
            targets: parse_target_list(rest),
        });
    }
    if let Some(rest) = text.strip_prefix("assert-eq") {
        return parse_equality(rest);
    }
    Err(AssertionError::UnknownKeyword(
        text.split_whitespace().next().unwrap_or(text).to_string(),
    ))
}

fn parse_target_list(rest: &str) -> Vec<String> {
    rest.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_equality(rest: &str) -> Result<Assertion, AssertionError> {
    let rest = rest.trim();
    let brace_open = rest.find('{').ok_or(AssertionError::UnclosedBody)?;
    let header = &rest[..brace_open];
    let body_text = extract_braced_body(&rest[brace_open..])?;

    let header_tokens: Vec<&str> = header.split(',').map(str::trim).collect();
    let (threshold, target_tokens): (f64, &[&str]) = match header_tokens.first() {
        Some(first) if first.parse::<f64>().is_ok() => {
            (first.parse().expect("checked above"), &header_tokens[1..])
        }
        _ => (1.0, &header_tokens[..]),
    };
    let targets = target_tokens
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    let body = if body_text.contains(';') {
        EqualityBody::Circuit(body_text)
    } else {
        let amplitudes = body_text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(parse_complex)
            .collect::<Result<Vec<_>, _>>()?;
        EqualityBody::Statevector(amplitudes)
    };

    Ok(Assertion::Equality {
        targets,
        threshold,
        body,
    })
}

/// Extracts the contents of a balanced `{ ... }` span starting at `text[0] == '{'`.
fn extract_braced_body(text: &str) -> Result<String, AssertionError> {
    let mut depth = 0i32;
    let mut end = None;
    for (idx, ch) in text.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    end = Some(idx);
                    break;
                }
            }
            _ => {}
        }
    }
    let end = end.ok_or(AssertionError::UnclosedBody)?;
    Ok(text[1..end].trim().to_string())
}

/// Parses one complex-number token: `a`, `bi`, `bj`, `a+bi`, or `a-bi`.
/// Splits first on `-` (preserving the sign of the leading term), else on
/// `+`; tokens containing `i`/`j` contribute to the imaginary part.
pub fn parse_complex(token: &str) -> Result<Complex64, AssertionError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AssertionError::InvalidComplexToken(token.to_string()));
    }

    let split = find_split(token, '-').or_else(|| find_split(token, '+'));
    let mut re = 0.0;
    let mut im = 0.0;
    match split {
        Some((idx, sign_char)) => {
            assign_part(&token[..idx], 1.0, &mut re, &mut im, token)?;
            let sign = if sign_char == '-' { -1.0 } else { 1.0 };
            assign_part(&token[idx + 1..], sign, &mut re, &mut im, token)?;
        }
        None => assign_part(token, 1.0, &mut re, &mut im, token)?,
    }
    Ok(Complex64::new(re, im))
}

fn find_split(token: &str, needle: char) -> Option<(usize, char)> {
    token
        .char_indices()
        .skip(1)
        .find(|&(_, c)| c == needle)
        .map(|(i, c)| (i, c))
}

fn assign_part(
    part: &str,
    sign: f64,
    re: &mut f64,
    im: &mut f64,
    whole: &str,
) -> Result<(), AssertionError> {
    let part = part.trim();
    if part.is_empty() {
        return Ok(());
    }
    if let Some(stripped) = part
        .strip_suffix('i')
        .or_else(|| part.strip_suffix('j'))
    {
        let magnitude = match stripped {
            "" | "+" => 1.0,
            "-" => -1.0,
            other => other
                .parse::<f64>()
                .map_err(|_| AssertionError::InvalidComplexToken(whole.to_string()))?,
        };
        *im += sign * magnitude;
    } else {
        let value: f64 = part
            .parse()
            .map_err(|_| AssertionError::InvalidComplexToken(whole.to_string()))?;
        *re += sign * value;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entanglement() {
        let a = parse_assertion("assert-ent q[0], q[1];").unwrap();
        assert_eq!(
            a,
            Assertion::Entanglement {
                targets: vec!["q[0]".to_string(), "q[1]".to_string()]
            }
        );
    }

    #[test]
    fn parses_superposition() {
        let a = parse_assertion("assert-sup q[0]").unwrap();
        assert_eq!(
            a,
            Assertion::Superposition {
                targets: vec!["q[0]".to_string()]
            }
        );
    }

    #[test]
    fn parses_equality_with_default_threshold() {
        let a = parse_assertion("assert-eq q[0], q[1] { 1,0,0,0 }").unwrap();
        let Assertion::Equality {
            targets,
            threshold,
            body,
        } = a
        else {
            panic!("expected equality");
        };
        assert_eq!(targets, vec!["q[0]".to_string(), "q[1]".to_string()]);
        assert_eq!(threshold, 1.0);
        assert_eq!(
            body,
            EqualityBody::Statevector(vec![
                Complex64::new(1.0, 0.0),
                Complex64::new(0.0, 0.0),
                Complex64::new(0.0, 0.0),
                Complex64::new(0.0, 0.0),
            ])
        );
    }

    #[test]
    fn parses_equality_with_explicit_threshold() {
        let a = parse_assertion("assert-eq 0.9, q[0] { 1, 0 }").unwrap();
        let Assertion::Equality { threshold, .. } = a else {
            panic!("expected equality");
        };
        assert_eq!(threshold, 0.9);
    }

    #[test]
    fn parses_equality_with_circuit_body() {
        let a = parse_assertion("assert-eq q[0] { h q[0]; }").unwrap();
        let Assertion::Equality { body, .. } = a else {
            panic!("expected equality");
        };
        assert_eq!(body, EqualityBody::Circuit("h q[0];".to_string()));
    }

    #[test]
    fn rejects_threshold_out_of_range() {
        let a = parse_assertion("assert-eq 1.5, q[0] { 1, 0 }").unwrap();
        assert!(matches!(
            a.validate(),
            Err(AssertionError::ThresholdOutOfRange(_))
        ));
    }

    #[test]
    fn rejects_statevector_length_mismatch() {
        let a = parse_assertion("assert-eq q[0], q[1] { 1, 0 }").unwrap();
        assert!(matches!(
            a.validate(),
            Err(AssertionError::StatevectorLengthMismatch { .. })
        ));
    }

    #[test]
    fn complex_token_forms() {
        assert_eq!(parse_complex("1").unwrap(), Complex64::new(1.0, 0.0));
        assert_eq!(parse_complex("i").unwrap(), Complex64::new(0.0, 1.0));
        assert_eq!(parse_complex("-i").unwrap(), Complex64::new(0.0, -1.0));
        assert_eq!(parse_complex("2j").unwrap(), Complex64::new(0.0, 2.0));
        assert_eq!(parse_complex("1+2i").unwrap(), Complex64::new(1.0, 2.0));
        assert_eq!(parse_complex("1-2i").unwrap(), Complex64::new(1.0, -2.0));
        assert_eq!(parse_complex("-3-4i").unwrap(), Complex64::new(-3.0, -4.0));
    }
}
