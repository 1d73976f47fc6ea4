use std::fmt;

use serde::Serialize;

use crate::error::{BuildError, Result};
use crate::parser::StageType;

/// Where one output line came from. `line` is `None` for lines that do not
/// correspond to a real source line (generated or settings constants).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineRecord {
    pub file: String,
    pub line: Option<usize>,
}

impl LineRecord {
    pub fn source(file: &str, line: usize) -> Self {
        Self {
            file: file.to_string(),
            line: Some(line),
        }
    }

    pub fn synthesized(file: &str) -> Self {
        Self {
            file: file.to_string(),
            line: None,
        }
    }
}

impl fmt::Display for LineRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}", self.file, line),
            None => f.write_str(&self.file),
        }
    }
}

/// Consumer of built shader source, typically a GPU driver binding.
pub trait ShaderCompiler {
    type Handle;

    fn compile(&mut self, stage: StageType, source: &str) -> std::result::Result<Self::Handle, String>;
}

/// Fully resolved shader source plus one `LineRecord` per output line.
#[derive(Debug, Clone, Serialize)]
pub struct BuildResult {
    pub path: String,
    pub stage: StageType,
    pub source: String,
    pub line_table: Vec<LineRecord>,
}

impl BuildResult {
    /// Origin of 1-based output line `line`.
    pub fn line_info(&self, line: usize) -> Option<&LineRecord> {
        line.checked_sub(1).and_then(|i| self.line_table.get(i))
    }

    /// The source with each line numbered and annotated with its origin.
    pub fn markup(&self) -> String {
        let mut out = String::new();
        for (i, (text, record)) in self.source.lines().zip(&self.line_table).enumerate() {
            out.push_str(&format!(
                "{:>6}{:<80}{:<20}\n",
                format!("{}: ", i + 1),
                text,
                format!("// ({})", record)
            ));
        }
        out
    }

    /// Hand the source to `compiler`, attaching the annotated listing to any
    /// failure.
    pub fn compile<C: ShaderCompiler>(&self, compiler: &mut C) -> Result<C::Handle> {
        compiler
            .compile(self.stage, &self.source)
            .map_err(|message| BuildError::Compile {
                path: self.path.clone(),
                message,
                markup: self.markup(),
            })
    }
}
