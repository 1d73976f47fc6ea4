use super::normalizer::ConstantNormalizer;
use super::output::LineRecord;
use crate::error::{BuildError, Result};
use crate::parser::{Constant, ConstantTable, Declared, ParsedFile, StageType};

/// Entry-file metadata that heads the output.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub path: String,
    pub stage: StageType,
    pub version: Declared<String>,
    pub precision: Declared<String>,
}

impl Header {
    pub fn from_main(file: &ParsedFile) -> Result<Self> {
        let missing = |what| BuildError::MissingMetadata {
            file: file.path.clone(),
            what,
        };
        Ok(Header {
            path: file.path.clone(),
            stage: file.stage.as_ref().ok_or_else(|| missing("type"))?.value,
            version: file.version.clone().ok_or_else(|| missing("version"))?,
            precision: file.precision.clone().ok_or_else(|| missing("default precision"))?,
        })
    }
}

/// One line of assembled output with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledLine {
    pub record: LineRecord,
    pub text: String,
}

/// Concatenate body tokens of dependency-ordered files. A new output line
/// starts whenever a token sits on a later source line than the previous
/// token of the same file; tokens sharing a line are joined by one space.
pub fn assemble_body(files: &[ParsedFile]) -> Vec<AssembledLine> {
    let mut lines: Vec<AssembledLine> = Vec::new();
    for file in files {
        let mut last_line = 0;
        for token in &file.body {
            match lines.last_mut() {
                Some(current) if token.line <= last_line => {
                    current.text.push(' ');
                    current.text.push_str(&token.text);
                }
                _ => {
                    last_line = token.line;
                    lines.push(AssembledLine {
                        record: LineRecord::source(&token.file, token.line),
                        text: token.text.clone(),
                    });
                }
            }
        }
    }
    lines
}

/// Merge per-file constants in dependency order. The same name declared in
/// two files is an error.
pub fn merge_constants(files: &[ParsedFile]) -> Result<Vec<Constant>> {
    let mut merged = ConstantTable::new();
    for file in files {
        for constant in file.constants.iter() {
            merged.insert_unique(constant.clone())?;
        }
    }
    Ok(merged.into_vec())
}

/// Run the normalizer over the flattened body. Literal substitution never
/// adds or removes line breaks, so provenance stays aligned.
pub fn normalize_body(constants: Vec<Constant>, body: Vec<AssembledLine>) -> (Vec<Constant>, Vec<AssembledLine>) {
    let mut normalizer = ConstantNormalizer::new(constants);
    if body.is_empty() {
        return (normalizer.into_constants(), body);
    }

    let flattened = body
        .iter()
        .map(|line| line.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let normalized = normalizer.normalize(&flattened);

    let body = body
        .into_iter()
        .zip(normalized.split('\n'))
        .map(|(line, text)| AssembledLine {
            record: line.record,
            text: text.to_string(),
        })
        .collect();
    (normalizer.into_constants(), body)
}

/// `#version`, default precision and one declaration per constant, followed
/// by the body, every line terminated by `\n`.
pub fn finalize(header: &Header, constants: &[Constant], body: Vec<AssembledLine>) -> (String, Vec<LineRecord>) {
    let mut lines = Vec::with_capacity(2 + constants.len() + body.len());
    lines.push(AssembledLine {
        record: LineRecord::source(&header.path, header.version.line),
        text: format!("#version {}", header.version.value),
    });
    lines.push(AssembledLine {
        record: LineRecord::source(&header.path, header.precision.line),
        text: format!("precision {} float;", header.precision.value),
    });
    for constant in constants {
        let record = match constant.line {
            Some(line) => LineRecord::source(&constant.origin, line),
            None => LineRecord::synthesized(&constant.origin),
        };
        lines.push(AssembledLine {
            record,
            text: constant.declaration(),
        });
    }
    lines.extend(body);

    let mut source = String::new();
    let mut table = Vec::with_capacity(lines.len());
    for line in lines {
        source.push_str(&line.text);
        source.push('\n');
        table.push(line.record);
    }
    (source, table)
}
