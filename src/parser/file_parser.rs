use std::collections::HashMap;

use tracing::debug;

use super::comments::strip_comments;
use super::constants::{ConstKind, ConstValue, Constant, ConstantTable, SETTINGS_ORIGIN};
use super::preprocessor::preprocess;
use super::tokenizer::{read_lines, tokenize};
use super::types::{Declared, ParsedFile, StageType, Token};
use crate::error::{BuildError, Result};
use crate::settings::{BuildSettings, NumericSetting};

/// Leading tokens the statement scanner treats as directives.
const DIRECTIVE_KEYWORDS: &[&str] = &[
    "const_int",
    "const_float",
    "precision",
    "#include",
    "#version",
    "#type",
];

/// Read position over an immutable token list. Advancing yields a new cursor.
#[derive(Debug, Clone, Copy)]
struct Cursor<'a> {
    file: &'a str,
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(file: &'a str, tokens: &'a [Token]) -> Self {
        Self {
            file,
            tokens,
            pos: 0,
        }
    }

    fn peek(self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    /// Consume one token, failing with the last consumed token for context.
    fn next(self) -> Result<(&'a Token, Cursor<'a>)> {
        match self.tokens.get(self.pos) {
            Some(token) => Ok((token, Cursor { pos: self.pos + 1, ..self })),
            None => {
                let (line, token) = match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
                    Some(last) => (last.line, last.text.clone()),
                    None => (0, String::new()),
                };
                Err(BuildError::Exhausted {
                    file: self.file.to_string(),
                    line,
                    token,
                })
            }
        }
    }
}

/// Extracts per-file metadata from one shader source.
struct FileParser<'s> {
    path: String,
    numbers: &'s HashMap<String, NumericSetting>,
    version: Option<Declared<String>>,
    stage: Option<Declared<StageType>>,
    precision: Option<Declared<String>>,
    includes: Vec<String>,
    constants: ConstantTable,
    body: Vec<Token>,
}

impl<'s> FileParser<'s> {
    fn new(path: &str, numbers: &'s HashMap<String, NumericSetting>) -> Self {
        Self {
            path: path.to_string(),
            numbers,
            version: None,
            stage: None,
            precision: None,
            includes: Vec::new(),
            constants: ConstantTable::new(),
            body: Vec::new(),
        }
    }

    fn run(&mut self, tokens: &[Token]) -> Result<()> {
        let path = self.path.clone();
        let mut cursor = Cursor::new(&path, tokens);
        while let Some(token) = cursor.peek() {
            cursor = match token.text.as_str() {
                "const_int" => self.constant(cursor, ConstKind::Int)?,
                "const_float" => self.constant(cursor, ConstKind::Float)?,
                "precision" => self.precision(cursor)?,
                "#include" => self.include(cursor)?,
                "#version" => self.version(cursor)?,
                "#type" => self.stage(cursor)?,
                _ => self.skip_statement(cursor),
            };
        }
        Ok(())
    }

    /// `const_int|const_float NAME = VALUE... ;`
    fn constant<'a>(&mut self, cursor: Cursor<'a>, kind: ConstKind) -> Result<Cursor<'a>> {
        let (keyword, cursor) = cursor.next()?;
        let (name, cursor) = cursor.next()?;
        let (_, cursor) = cursor.next()?;
        let (first, mut cursor) = cursor.next()?;

        let mut literal = first.text.clone();
        loop {
            let (token, rest) = cursor.next()?;
            cursor = rest;
            if token.text == ";" {
                break;
            }
            literal.push_str(&token.text);
        }

        let constant = match self.numbers.get(&name.text) {
            Some(setting) => {
                let value = setting.to_value();
                let value = value.clone().coerce(kind).ok_or_else(|| {
                    BuildError::InvalidSetting(format!(
                        "{} = {} does not fit const {} {}",
                        name.text,
                        value,
                        kind.glsl_name(),
                        name.text
                    ))
                })?;
                Constant {
                    name: name.text.clone(),
                    kind,
                    value,
                    origin: SETTINGS_ORIGIN.to_string(),
                    line: None,
                }
            }
            // A float literal in an int declaration is left for the compiler
            // to reject and never takes part in literal matching.
            None => Constant {
                name: name.text.clone(),
                kind,
                value: ConstValue::parse(&literal)
                    .coerce(kind)
                    .unwrap_or_else(|| ConstValue::Expr(literal.clone())),
                origin: self.path.clone(),
                line: Some(keyword.line),
            },
        };
        debug!(file = %self.path, constant = %constant, "extracted constant");
        self.constants.insert(constant);
        Ok(cursor)
    }

    /// `precision QUALIFIER float ;`. A precision statement for another type
    /// is ordinary code.
    fn precision<'a>(&mut self, cursor: Cursor<'a>) -> Result<Cursor<'a>> {
        let (keyword, cursor) = cursor.next()?;
        let (qualifier, cursor) = cursor.next()?;
        let (ty, cursor) = cursor.next()?;
        let (end, cursor) = cursor.next()?;
        if ty.text == "float" {
            self.precision = Some(Declared {
                value: qualifier.text.clone(),
                line: keyword.line,
            });
        } else {
            self.body
                .extend([keyword, qualifier, ty, end].into_iter().cloned());
        }
        Ok(cursor)
    }

    fn include<'a>(&mut self, cursor: Cursor<'a>) -> Result<Cursor<'a>> {
        let (_, cursor) = cursor.next()?;
        let (path, cursor) = cursor.next()?;
        self.includes.push(path.text.trim_matches('"').to_string());
        Ok(cursor)
    }

    /// `#version NUMBER [PROFILE]`; the profile must share the line.
    fn version<'a>(&mut self, cursor: Cursor<'a>) -> Result<Cursor<'a>> {
        let (keyword, cursor) = cursor.next()?;
        let (number, mut cursor) = cursor.next()?;
        if number.text.parse::<u32>().is_err() {
            return Err(BuildError::MalformedVersion {
                file: self.path.clone(),
                line: number.line,
                version: number.text.clone(),
            });
        }

        let mut version = number.text.clone();
        if let Some(profile) = cursor.peek().filter(|t| t.line == number.line) {
            version.push(' ');
            version.push_str(&profile.text);
            cursor = cursor.next()?.1;
        }
        self.version = Some(Declared {
            value: version,
            line: keyword.line,
        });
        Ok(cursor)
    }

    fn stage<'a>(&mut self, cursor: Cursor<'a>) -> Result<Cursor<'a>> {
        let (keyword, cursor) = cursor.next()?;
        let (value, cursor) = cursor.next()?;
        let stage = StageType::from_directive(&value.text).ok_or_else(|| BuildError::IllegalStage {
            file: self.path.clone(),
            line: value.line,
            value: value.text.clone(),
        })?;
        self.stage = Some(Declared {
            value: stage,
            line: keyword.line,
        });
        Ok(cursor)
    }

    /// Pass an unrecognized statement through to the body, up to and
    /// including its `;`. Stops early in front of a directive keyword.
    fn skip_statement<'a>(&mut self, mut cursor: Cursor<'a>) -> Cursor<'a> {
        while let Some(token) = cursor.peek() {
            self.body.push(token.clone());
            cursor.pos += 1;
            if token.text == ";" {
                break;
            }
            match cursor.peek() {
                Some(next) if DIRECTIVE_KEYWORDS.contains(&next.text.as_str()) => break,
                _ => {}
            }
        }
        cursor
    }

    fn check_main_file(&self) -> Result<()> {
        let missing = if self.version.is_none() {
            Some("version")
        } else if self.stage.is_none() {
            Some("type")
        } else if self.precision.is_none() {
            Some("default precision")
        } else {
            None
        };
        match missing {
            Some(what) => Err(BuildError::MissingMetadata {
                file: self.path.clone(),
                what,
            }),
            None => Ok(()),
        }
    }

    fn finish(self) -> ParsedFile {
        ParsedFile {
            path: self.path,
            version: self.version,
            stage: self.stage,
            precision: self.precision,
            includes: self.includes,
            constants: self.constants,
            body: self.body,
        }
    }
}

/// Run one file through comment stripping, preprocessing, tokenizing and
/// statement scanning. The main file must declare version, type and
/// default precision.
pub fn parse_file(path: &str, text: &str, settings: &BuildSettings, main_file: bool) -> Result<ParsedFile> {
    let mut lines = read_lines(path, text);
    strip_comments(&mut lines)?;
    preprocess(&mut lines, &settings.booleans)?;
    let tokens = tokenize(&lines);

    let mut parser = FileParser::new(path, &settings.numbers);
    parser.run(&tokens)?;
    if main_file {
        parser.check_main_file()?;
    }

    let parsed = parser.finish();
    debug!(
        file = %parsed.path,
        includes = parsed.includes.len(),
        constants = parsed.constants.len(),
        tokens = parsed.body.len(),
        "parsed shader file"
    );
    Ok(parsed)
}
