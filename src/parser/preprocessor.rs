use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use super::types::SourceLine;
use crate::error::{BuildError, Result};

/// One of the four conditional-compilation directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `#const NAME true|false`
    Const { name: String, value: bool },
    /// `#if [!]NAME`
    If { name: String, negate: bool },
    Else,
    Endif,
}

struct DirectivePatterns {
    constant: Regex,
    cond: Regex,
    otherwise: Regex,
    endif: Regex,
}

fn patterns() -> &'static DirectivePatterns {
    static PATTERNS: OnceLock<DirectivePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| DirectivePatterns {
        constant: Regex::new(r"^\s*#const\s+(\S+)\s+(true|false)\s*$").expect("valid #const pattern"),
        cond: Regex::new(r"^\s*#if\s+(!?)(\S+)\s*$").expect("valid #if pattern"),
        otherwise: Regex::new(r"^\s*#else\s*$").expect("valid #else pattern"),
        endif: Regex::new(r"^\s*#endif\s*$").expect("valid #endif pattern"),
    })
}

/// Recognize a directive line. Anything else is ordinary code.
pub fn parse_directive(text: &str) -> Option<Directive> {
    let p = patterns();
    if let Some(caps) = p.constant.captures(text) {
        return Some(Directive::Const {
            name: caps[1].to_string(),
            value: &caps[2] == "true",
        });
    }
    if let Some(caps) = p.cond.captures(text) {
        return Some(Directive::If {
            name: caps[2].to_string(),
            negate: &caps[1] == "!",
        });
    }
    if p.otherwise.is_match(text) {
        return Some(Directive::Else);
    }
    if p.endif.is_match(text) {
        return Some(Directive::Endif);
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frame {
    enclosing: bool,
    branch: bool,
    opened_at: usize,
}

impl Frame {
    fn active(self) -> bool {
        self.enclosing && self.branch
    }
}

/// Nesting of `#if` blocks. A block is active only while every enclosing
/// block is, so neither `#if` nor `#else` can re-enable code inside an
/// inactive region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionState {
    frames: Vec<Frame>,
}

impl ConditionState {
    pub fn active(&self) -> bool {
        self.frames.last().map_or(true, |f| f.active())
    }

    #[cfg(test)]
    fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn enter(mut self, value: bool, line: usize) -> Self {
        let enclosing = self.active();
        self.frames.push(Frame {
            enclosing,
            branch: value,
            opened_at: line,
        });
        self
    }

    pub fn flip(mut self, file: &str, line: usize) -> Result<Self> {
        match self.frames.last_mut() {
            Some(frame) => {
                frame.branch = !frame.branch;
                Ok(self)
            }
            None => Err(BuildError::UnmatchedElse {
                file: file.to_string(),
                line,
            }),
        }
    }

    pub fn leave(mut self, file: &str, line: usize) -> Result<Self> {
        match self.frames.pop() {
            Some(_) => Ok(self),
            None => Err(BuildError::UnmatchedEndif {
                file: file.to_string(),
                line,
            }),
        }
    }

    /// Fails when a block is still open at end of file.
    pub fn finish(self, file: &str) -> Result<()> {
        match self.frames.last() {
            Some(frame) => Err(BuildError::UnclosedIf {
                file: file.to_string(),
                line: frame.opened_at,
            }),
            None => Ok(()),
        }
    }
}

/// Boolean constants visible to `#if`: overrides first, then `#const` defaults.
#[derive(Debug)]
pub struct BoolTable<'a> {
    overrides: &'a HashMap<String, bool>,
    declared: HashMap<String, bool>,
}

impl<'a> BoolTable<'a> {
    pub fn new(overrides: &'a HashMap<String, bool>) -> Self {
        Self {
            overrides,
            declared: HashMap::new(),
        }
    }

    /// Record a default. Has no effect when an override or an earlier
    /// declaration already names it.
    pub fn declare(&mut self, name: &str, value: bool) {
        if !self.overrides.contains_key(name) {
            self.declared.entry(name.to_string()).or_insert(value);
        }
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.overrides
            .get(name)
            .or_else(|| self.declared.get(name))
            .copied()
    }
}

/// Evaluate `#const`/`#if`/`#else`/`#endif` over comment-free lines. Directive
/// lines and lines inside inactive blocks are blanked in place.
pub fn preprocess(lines: &mut [SourceLine], overrides: &HashMap<String, bool>) -> Result<()> {
    let mut table = BoolTable::new(overrides);
    let mut state = ConditionState::default();
    let file = lines.first().map(|l| l.file.clone()).unwrap_or_default();

    for line in lines.iter_mut() {
        let active = state.active();

        match parse_directive(&line.text) {
            Some(Directive::Const { name, value }) => {
                if active {
                    table.declare(&name, value);
                }
            }
            Some(Directive::If { name, negate }) => {
                let value = table.get(&name).ok_or_else(|| BuildError::UndefinedCondition {
                    file: line.file.clone(),
                    line: line.line,
                    name: name.clone(),
                })?;
                state = state.enter(value != negate, line.line);
            }
            Some(Directive::Else) => state = state.flip(&line.file, line.line)?,
            Some(Directive::Endif) => state = state.leave(&line.file, line.line)?,
            None if active => continue,
            None => {}
        }
        line.text.clear();
    }

    state.finish(&file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_forms() {
        assert_eq!(
            parse_directive("  #const DEBUG false "),
            Some(Directive::Const {
                name: "DEBUG".into(),
                value: false
            })
        );
        assert_eq!(
            parse_directive("#if !DEBUG"),
            Some(Directive::If {
                name: "DEBUG".into(),
                negate: true
            })
        );
        assert_eq!(parse_directive("#else"), Some(Directive::Else));
        assert_eq!(parse_directive("\t#endif"), Some(Directive::Endif));
        assert_eq!(parse_directive("#ifdef X"), None);
        assert_eq!(parse_directive("#const X maybe"), None);
    }

    #[test]
    fn test_else_flips_top_level_block() {
        let state = ConditionState::default().enter(false, 1);
        assert!(!state.active());
        let state = state.flip("t", 2).expect("flip");
        assert!(state.active());
    }

    #[test]
    fn test_nested_else_stays_inactive() {
        let state = ConditionState::default().enter(false, 1).enter(true, 2);
        assert!(!state.active());
        let state = state.flip("t", 3).expect("flip");
        assert!(!state.active(), "#else inside an inactive block must stay inactive");
        let state = state.leave("t", 4).expect("leave");
        assert!(!state.active());
        let state = state.leave("t", 5).expect("leave");
        assert!(state.active());
        assert_eq!(state.depth(), 0);
    }

    #[test]
    fn test_override_beats_declaration() {
        let mut overrides = HashMap::new();
        overrides.insert("A".to_string(), true);
        let mut table = BoolTable::new(&overrides);
        table.declare("A", false);
        table.declare("B", false);
        assert_eq!(table.get("A"), Some(true));
        assert_eq!(table.get("B"), Some(false));
        assert_eq!(table.get("C"), None);
    }
}
