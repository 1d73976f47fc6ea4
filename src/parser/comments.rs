use super::types::SourceLine;
use crate::error::{BuildError, Result};

/// Comment state carried from one line to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommentState {
    pub in_block: bool,
}

impl CommentState {
    /// Strip comments from one line, returning the kept text and the state
    /// for the following line.
    pub fn strip(self, file: &str, line: usize, text: &str) -> Result<(String, CommentState)> {
        let bytes = text.as_bytes();
        let mut kept = String::new();
        let mut in_block = self.in_block;
        let mut start = 0usize;
        let mut i = 0usize;

        while i + 1 < bytes.len() {
            let pair = &bytes[i..i + 2];
            if in_block {
                if pair == b"*/" {
                    in_block = false;
                    i += 2;
                    start = i;
                    continue;
                }
            } else if pair == b"//" {
                kept.push_str(&text[start..i]);
                return Ok((kept, CommentState { in_block: false }));
            } else if pair == b"/*" {
                kept.push_str(&text[start..i]);
                in_block = true;
                i += 2;
                continue;
            } else if pair == b"*/" {
                return Err(BuildError::UnmatchedCommentEnd {
                    file: file.to_string(),
                    line,
                });
            }
            i += 1;
        }

        if !in_block {
            kept.push_str(&text[start..]);
        }
        Ok((kept, CommentState { in_block }))
    }
}

/// Remove `//` and `/* */` comments from lines in order. Block comments may
/// span lines; an unterminated one simply swallows the rest of the file.
pub fn strip_comments(lines: &mut [SourceLine]) -> Result<()> {
    let mut state = CommentState::default();
    for line in lines.iter_mut() {
        let (kept, next) = state.strip(&line.file, line.line, &line.text)?;
        line.text = kept;
        state = next;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(state: CommentState, text: &str) -> (String, CommentState) {
        state.strip("t.glsl", 1, text).expect("strip failed")
    }

    #[test]
    fn test_line_comment() {
        let (kept, state) = strip(CommentState::default(), "x = 1; // y /* z");
        assert_eq!(kept, "x = 1; ");
        assert!(!state.in_block, "line comment must not open a block");
    }

    #[test]
    fn test_block_comment_spans_lines() {
        let (kept, state) = strip(CommentState::default(), "a /* b");
        assert_eq!(kept, "a ");
        assert!(state.in_block);

        let (kept, state) = strip(state, "still comment // here");
        assert_eq!(kept, "");
        assert!(state.in_block);

        let (kept, state) = strip(state, "end */ c /* d */ e");
        assert_eq!(kept, " c  e");
        assert!(!state.in_block);
    }

    #[test]
    fn test_unmatched_end_is_error() {
        let err = CommentState::default().strip("t.glsl", 7, "x */").unwrap_err();
        assert!(matches!(err, BuildError::UnmatchedCommentEnd { line: 7, .. }));
    }
}
