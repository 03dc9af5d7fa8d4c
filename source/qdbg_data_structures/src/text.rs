// String utilities used by the preprocessor and assertion parser: trim /
// split / replace / remove-whitespace / variable-equality, plus the
// `startsWith` and `variableBaseName` helpers the statement classifier
// uses, in the spirit of `include/common/parsing/Utils.hpp`.

/// Trims leading and trailing ASCII whitespace.
#[must_use]
pub fn trim(text: &str) -> &str {
    text.trim()
}

#[must_use]
pub fn starts_with(text: &str, prefix: &str) -> bool {
    text.starts_with(prefix)
}

/// Splits on a single delimiter, optionally keeping empty tokens.
#[must_use]
pub fn split_string(text: &str, delimiter: char, include_empty: bool) -> Vec<String> {
    split_string_multi(text, &[delimiter], include_empty)
}

/// Splits whenever any of `delimiters` is encountered.
#[must_use]
pub fn split_string_multi(text: &str, delimiters: &[char], include_empty: bool) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if delimiters.contains(&c) {
            if include_empty || !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        } else {
            current.push(c);
        }
    }
    if include_empty || !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Replaces every non-overlapping occurrence of `from` with `to`.
#[must_use]
pub fn replace_string(text: &str, from: &str, to: &str) -> String {
    text.replace(from, to)
}

/// Strips all whitespace (spaces, tabs, newlines) from anywhere in the string.
#[must_use]
pub fn remove_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// The register name with any trailing `[index]` removed, e.g.
/// `"q[2]" -> "q"`, `"q" -> "q"`.
#[must_use]
pub fn variable_base_name(variable: &str) -> &str {
    match variable.find('[') {
        Some(idx) => &variable[..idx],
        None => variable,
    }
}

/// The index of a register reference, if one is present: `"q[2]" -> Some(2)`.
#[must_use]
pub fn variable_index(variable: &str) -> Option<usize> {
    let open = variable.find('[')?;
    let close = variable.find(']')?;
    variable.get(open + 1..close)?.trim().parse().ok()
}

/// Two variable references are equal if (a) both are indexed and textually
/// equal, or (b) one is an unindexed register name and the other is the same
/// base name regardless of index.
#[must_use]
pub fn variables_equal(v1: &str, v2: &str) -> bool {
    let (b1, i1) = (variable_base_name(v1), variable_index(v1));
    let (b2, i2) = (variable_base_name(v2), variable_index(v2));
    if b1 != b2 {
        return false;
    }
    match (i1, i2) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_on_multiple_delimiters_keeps_empty_tokens() {
        let tokens = split_string_multi("a,,b;c", &[',', ';'], true);
        assert_eq!(tokens, vec!["a", "", "b", "c"]);
    }

    #[test]
    fn split_can_drop_empty_tokens() {
        let tokens = split_string_multi("a,,b", &[','], false);
        assert_eq!(tokens, vec!["a", "b"]);
    }

    #[test]
    fn variables_equal_whole_register_aliases_any_index() {
        assert!(variables_equal("q", "q[2]"));
        assert!(variables_equal("q[2]", "q"));
        assert!(variables_equal("q[1]", "q[1]"));
        assert!(!variables_equal("q[1]", "q[2]"));
        assert!(!variables_equal("q", "r"));
    }

    #[test]
    fn variable_base_name_strips_index() {
        assert_eq!(variable_base_name("q[3]"), "q");
        assert_eq!(variable_base_name("q"), "q");
    }
}
