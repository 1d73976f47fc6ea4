use std::sync::OnceLock;

use regex::Regex;

use super::types::{SourceLine, Token};

/// Characters that, next to `=`, form an operator that must stay intact
/// (`+=`, `==`, `<=`, `!=`, ...).
const OPERATOR_CHARS: &[char] = &['+', '-', '*', '/', '!', '<', '>', '=', '%', '&', '|', '^'];

fn const_int_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bconst[ \t]+int\b").expect("valid const int pattern"))
}

fn const_float_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bconst[ \t]+float\b").expect("valid const float pattern"))
}

/// Collapse `const int`/`const float` into single keywords and isolate
/// `;`, `(`, `)` and standalone `=` with spaces. Line breaks are untouched.
pub fn normalize_text(text: &str) -> String {
    let text = const_int_regex().replace_all(text, "const_int");
    let text = const_float_regex().replace_all(&text, "const_float");

    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    for (i, &ch) in chars.iter().enumerate() {
        match ch {
            ';' | '(' | ')' => {
                out.push(' ');
                out.push(ch);
                out.push(' ');
            }
            '=' => {
                let before = i.checked_sub(1).map(|j| chars[j]);
                let after = chars.get(i + 1).copied();
                let compound = before.map_or(false, |c| OPERATOR_CHARS.contains(&c))
                    || after.map_or(false, |c| c == '=');
                if compound {
                    out.push(ch);
                } else {
                    out.push_str(" = ");
                }
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Split on `\r\n`, lone `\r` or lone `\n`, numbering lines from 1.
pub fn split_lines(file: &str, text: &str) -> Vec<SourceLine> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                lines.push(std::mem::take(&mut current));
            }
            '\n' => lines.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines
        .into_iter()
        .enumerate()
        .map(|(i, text)| SourceLine {
            file: file.to_string(),
            line: i + 1,
            text,
        })
        .collect()
}

/// Normalize and split raw file text into numbered lines.
pub fn read_lines(file: &str, text: &str) -> Vec<SourceLine> {
    split_lines(file, &normalize_text(text))
}

/// Whitespace-split every line, tagging tokens with their origin.
pub fn tokenize(lines: &[SourceLine]) -> Vec<Token> {
    lines
        .iter()
        .flat_map(|line| {
            line.text.split_whitespace().map(move |text| Token {
                file: line.file.clone(),
                line: line.line,
                text: text.to_string(),
            })
        })
        .collect()
}
