//! Variable expansion
//!
//! `$NAME` and `${NAME}` are replaced by the host environment's value if it
//! has one, otherwise by the script's own variable. Unknown names are left in
//! the text untouched. Substituted values are never re-scanned.

use super::state::VariableStore;
use crate::host::Environment;

/// Expand every variable reference in `text`.
pub(crate) fn expand(text: &str, env: &Environment, vars: &VariableStore) -> String {
    let lookup = |name: &str| {
        env.get(name)
            .map(String::as_str)
            .or_else(|| vars.get(name))
    };

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        match reference(after) {
            Some((name, consumed)) => {
                match lookup(name) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&rest[pos..pos + 1 + consumed]),
                }
                rest = &after[consumed..];
            }
            None => {
                out.push('$');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Parse the variable reference following a `$`.
///
/// Returns the name and how many bytes of `after` it spans.
fn reference(after: &str) -> Option<(&str, usize)> {
    let first = after.chars().next()?;

    if first == '{' {
        let close = after.find('}')?;
        let name = &after[1..close];
        return (!name.is_empty()).then_some((name, close + 1));
    }
    if first.is_ascii_digit() || matches!(first, '#' | '@' | '?') {
        return Some((&after[..1], 1));
    }
    if first.is_ascii_alphabetic() || first == '_' {
        let len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        return Some((&after[..len], len));
    }
    None
}
