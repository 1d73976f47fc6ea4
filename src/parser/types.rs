use std::fmt;

use serde::Serialize;

use super::constants::ConstantTable;

/// One physical line of a loaded file. Text is rewritten in place by comment
/// stripping and preprocessing.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLine {
    pub file: String,
    /// 1-based.
    pub line: usize,
    pub text: String,
}

/// Whitespace-delimited fragment of a `SourceLine`.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub file: String,
    pub line: usize,
    pub text: String,
}

/// Pipeline stage a shader targets. Declared with `#type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageType {
    Vertex,
    Fragment,
    Geometry,
}

impl StageType {
    pub fn from_directive(value: &str) -> Option<Self> {
        match value {
            "VERTEX" => Some(StageType::Vertex),
            "FRAGMENT" => Some(StageType::Fragment),
            "GEOMETRY" => Some(StageType::Geometry),
            _ => None,
        }
    }
}

impl fmt::Display for StageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageType::Vertex => "VERTEX",
            StageType::Fragment => "FRAGMENT",
            StageType::Geometry => "GEOMETRY",
        };
        f.write_str(name)
    }
}

/// A directive value together with the line it was declared on.
#[derive(Debug, Clone, PartialEq)]
pub struct Declared<T> {
    pub value: T,
    pub line: usize,
}

/// Metadata and remaining code of one shader or include file.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub path: String,
    pub version: Option<Declared<String>>,
    pub stage: Option<Declared<StageType>>,
    pub precision: Option<Declared<String>>,
    pub includes: Vec<String>,
    pub constants: ConstantTable,
    /// Tokens not consumed by a directive, in source order.
    pub body: Vec<Token>,
}

impl ParsedFile {
    /// Leading integer of the declared version, e.g. 300 for `300 es`.
    pub fn version_number(&self) -> Option<u32> {
        self.version
            .as_ref()
            .and_then(|v| v.value.split_whitespace().next())
            .and_then(|n| n.parse().ok())
    }
}
