//! Condition evaluation for `if` and `while`
//!
//! A condition wrapped in `[` `]` is a local three-token test. Anything else
//! is a command whose exit status decides the branch; running it is the
//! executor's job.

/// What an already-expanded condition asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Condition<'a> {
    /// Bracket test, evaluated locally
    Test(bool),
    /// Command line to run on the host; true iff it exits 0
    Command(&'a str),
}

impl<'a> Condition<'a> {
    pub fn parse(expanded: &'a str) -> Self {
        let trimmed = expanded.trim();
        match trimmed
            .strip_prefix('[')
            .and_then(|inner| inner.strip_suffix(']'))
        {
            Some(inner) => Self::Test(evaluate_test(inner)),
            None => Self::Command(trimmed),
        }
    }
}

/// Evaluate the inside of `[ left op right ]`.
///
/// Any other shape, an unknown operator, or a non-integer operand of a
/// numeric operator is simply false.
pub(crate) fn evaluate_test(expr: &str) -> bool {
    let tokens: Vec<&str> = expr.split_whitespace().collect();
    let [left, op, right] = tokens[..] else {
        return false;
    };

    match op {
        "=" | "==" => left == right,
        "!=" => left != right,
        "-eq" | "-ne" | "-lt" | "-le" | "-gt" | "-ge" => {
            let (Some(l), Some(r)) = (parse_int(left), parse_int(right)) else {
                return false;
            };
            match op {
                "-eq" => l == r,
                "-ne" => l != r,
                "-lt" => l < r,
                "-le" => l <= r,
                "-gt" => l > r,
                _ => l >= r,
            }
        }
        _ => false,
    }
}

fn parse_int(s: &str) -> Option<i64> {
    s.parse().ok()
}
