//! Block scanning: find the `fi`/`done` that closes a control structure.

use super::lines::{Keyword, LineKind, ScriptLine};
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockKind {
    /// `if` ... [`else` ...] `fi`
    If,
    /// `for`/`while` ... `done`
    Loop,
}

impl BlockKind {
    fn opens(self, kind: &LineKind) -> bool {
        match self {
            Self::If => matches!(kind, LineKind::If { .. }),
            Self::Loop => matches!(kind, LineKind::For { .. } | LineKind::While { .. }),
        }
    }

    fn terminator(self) -> Keyword {
        match self {
            Self::If => Keyword::Fi,
            Self::Loop => Keyword::Done,
        }
    }

    /// Error for a block opened by `keyword` that never closes.
    pub fn unterminated(self, keyword: &'static str) -> Error {
        Error::Unterminated {
            keyword,
            terminator: match self {
                Self::If => "fi",
                Self::Loop => "done",
            },
        }
    }
}

/// Where a block's branches end, as indices into the scanned slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlockBounds {
    /// The `else` at the block's own nesting level, for `if` blocks
    pub else_index: Option<usize>,
    /// The matching terminator
    pub end: usize,
}

/// Scan forward from the opener at `start` for its matching terminator.
///
/// Only openers of the same family nest: an `if` inside a loop body does not
/// affect the search for `done`. Returns `None` when the lines run out first.
pub(crate) fn find_block_end(
    lines: &[ScriptLine],
    start: usize,
    kind: BlockKind,
) -> Option<BlockBounds> {
    let terminator = LineKind::Keyword(kind.terminator());
    let mut depth = 0usize;
    let mut else_index = None;

    for (index, line) in lines.iter().enumerate().skip(start + 1) {
        if kind.opens(&line.kind) {
            depth += 1;
        } else if line.kind == terminator {
            if depth == 0 {
                return Some(BlockBounds { else_index, end: index });
            }
            depth -= 1;
        } else if kind == BlockKind::If
            && depth == 0
            && else_index.is_none()
            && line.kind == LineKind::Keyword(Keyword::Else)
        {
            else_index = Some(index);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::lines::parse_lines;

    #[test]
    fn simple_if() {
        let lines = parse_lines("if true\necho a\nfi");
        assert_eq!(
            find_block_end(&lines, 0, BlockKind::If),
            Some(BlockBounds {
                else_index: None,
                end: 2
            })
        );
    }

    #[test]
    fn if_with_else() {
        let lines = parse_lines("if true\necho a\nelse\necho b\nfi\necho after");
        assert_eq!(
            find_block_end(&lines, 0, BlockKind::If),
            Some(BlockBounds {
                else_index: Some(2),
                end: 4
            })
        );
    }

    #[test]
    fn nested_if_matches_inner_fi_first() {
        let script = "if a\n if b\n  echo x\n else\n  echo y\n fi\n if c\n  echo z\n fi\nelse\n echo w\nfi";
        let lines = parse_lines(script);
        assert_eq!(
            find_block_end(&lines, 0, BlockKind::If),
            Some(BlockBounds {
                else_index: Some(9),
                end: 11
            })
        );
        assert_eq!(
            find_block_end(&lines, 1, BlockKind::If),
            Some(BlockBounds {
                else_index: Some(3),
                end: 5
            })
        );
    }

    #[test]
    fn loops_nest_across_for_and_while() {
        let lines = parse_lines("for i in a\nwhile false\ndone\necho $i\ndone");
        assert_eq!(
            find_block_end(&lines, 0, BlockKind::Loop),
            Some(BlockBounds {
                else_index: None,
                end: 4
            })
        );
    }

    #[test]
    fn other_families_do_not_nest() {
        let lines = parse_lines("for i in a\nif true\ndone\nfi");
        assert_eq!(
            find_block_end(&lines, 0, BlockKind::Loop).map(|b| b.end),
            Some(2)
        );
    }

    #[test]
    fn loops_ignore_else() {
        let lines = parse_lines("while true\nelse\ndone");
        assert_eq!(
            find_block_end(&lines, 0, BlockKind::Loop),
            Some(BlockBounds {
                else_index: None,
                end: 2
            })
        );
    }

    #[test]
    fn missing_terminator_is_none() {
        let lines = parse_lines("if true\n if false\n fi\necho dangling");
        assert_eq!(find_block_end(&lines, 0, BlockKind::If), None);
        assert_eq!(
            BlockKind::If.unterminated("if").to_string(),
            "if without matching fi"
        );
    }
}
