//! Line sequence and per-line classification
//!
//! Script text is split once into [`ScriptLine`]s, each tagged with a
//! [`LineKind`]. The block scanner and the executor both match on the tag, so
//! the prefix rules live only here.

/// One line of a script, tagged with what it does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScriptLine {
    /// 1-based position in the original script text
    pub number: usize,
    pub kind: LineKind,
}

/// Control keywords that only ever appear as whole lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keyword {
    Then,
    Else,
    Fi,
    Do,
    Done,
}

impl Keyword {
    fn parse(word: &str) -> Option<Self> {
        match word {
            "then" => Some(Self::Then),
            "else" => Some(Self::Else),
            "fi" => Some(Self::Fi),
            "do" => Some(Self::Do),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LineKind {
    /// Blank line or `#` comment
    Skip,
    /// `NAME = value`; `value` is untrimmed and unexpanded
    Assignment { name: String, value: String },
    /// `if <condition>`
    If { condition: String },
    /// `for <header>`; the header still needs `NAME in WORDS` parsing
    For { header: String },
    /// `while <condition>`
    While { condition: String },
    /// Bare `then`/`else`/`fi`/`do`/`done`
    Keyword(Keyword),
    /// Anything else, forwarded to the host after expansion
    Command(String),
}

impl LineKind {
    /// Classify one raw line. Checked in priority order: blank/comment,
    /// assignment, `if`, `for`, `while`, bare keyword, command.
    pub fn classify(raw: &str) -> Self {
        let line = raw.trim();

        if line.is_empty() || line.starts_with('#') {
            return Self::Skip;
        }
        if let Some((name, value)) = split_assignment(line) {
            return Self::Assignment {
                name: name.to_string(),
                value: value.to_string(),
            };
        }
        if let Some(rest) = line.strip_prefix("if ") {
            return Self::If {
                condition: strip_trailing_word(rest, "then").to_string(),
            };
        }
        if let Some(rest) = line.strip_prefix("for ") {
            return Self::For {
                header: strip_trailing_word(rest, "do").to_string(),
            };
        }
        if let Some(rest) = line.strip_prefix("while ") {
            return Self::While {
                condition: strip_trailing_word(rest, "do").to_string(),
            };
        }
        if let Some(keyword) = Keyword::parse(line) {
            return Self::Keyword(keyword);
        }
        Self::Command(line.to_string())
    }

    /// Short name for log events.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Assignment { .. } => "assignment",
            Self::If { .. } => "if",
            Self::For { .. } => "for",
            Self::While { .. } => "while",
            Self::Keyword(_) => "keyword",
            Self::Command(_) => "command",
        }
    }
}

/// Split script text into classified lines. Tolerates CRLF endings.
pub(crate) fn parse_lines(content: &str) -> Vec<ScriptLine> {
    content
        .split('\n')
        .enumerate()
        .map(|(index, raw)| {
            let raw = raw.strip_suffix('\r').unwrap_or(raw);
            let kind = LineKind::classify(raw);
            tracing::trace!(line = index + 1, kind = kind.name(), "classified line");
            ScriptLine {
                number: index + 1,
                kind,
            }
        })
        .collect()
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `NAME<ws>*=rest` at the start of a trimmed line.
fn split_assignment(line: &str) -> Option<(&str, &str)> {
    let name_len = line
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(line.len());
    let name = &line[..name_len];
    if !is_identifier(name) {
        return None;
    }
    let value = line[name_len..].trim_start().strip_prefix('=')?;
    Some((name, value))
}

/// Drop a trailing `then`/`do` word (with an optional `;` before it) from a
/// control header.
fn strip_trailing_word<'a>(header: &'a str, word: &str) -> &'a str {
    let header = header.trim_end();
    match header.strip_suffix(word) {
        Some(rest) if rest.ends_with(|c: char| c == ';' || c.is_whitespace()) => {
            rest.trim_end().trim_end_matches(';').trim_end()
        }
        _ => header,
    }
}

/// Argument of an `exit` command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ExitRequest {
    /// `exit` alone; keeps the current status
    Current,
    /// `exit N`, already reduced modulo 256
    Code(i32),
    /// `exit foo`
    Invalid(String),
}

impl ExitRequest {
    /// Recognise an expanded command line as `exit [code]`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let rest = line.strip_prefix("exit")?;
        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let arg = rest.trim();
        if arg.is_empty() {
            return Some(Self::Current);
        }
        Some(match arg.parse::<i64>() {
            Ok(code) => Self::Code(code.rem_euclid(256) as i32),
            Err(_) => Self::Invalid(arg.to_string()),
        })
    }
}
