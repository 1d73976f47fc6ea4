use std::collections::HashMap;
use std::fmt;

use crate::error::{BuildError, Result};

/// Origin recorded for constants whose value came from build settings.
pub const SETTINGS_ORIGIN: &str = "<settings>";

/// Origin recorded for anonymous constants minted by the normalizer.
pub const GENERATED_ORIGIN: &str = "<generated>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstKind {
    Int,
    Float,
}

impl ConstKind {
    pub fn glsl_name(self) -> &'static str {
        match self {
            ConstKind::Int => "int",
            ConstKind::Float => "float",
        }
    }
}

/// Value of a numeric constant. `Expr` holds initializers that are not plain
/// literals (`sin(1.0)`); those are echoed back verbatim and never matched
/// against inline literals.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Int(i64),
    Float(f32),
    Expr(String),
}

/// Hashable identity of a literal value, used to share constants by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ValueKey {
    Int(i64),
    Float(u32),
}

impl ConstValue {
    /// Integer first, then float, otherwise the text is kept as an expression.
    pub fn parse(text: &str) -> Self {
        if let Ok(value) = text.parse::<i64>() {
            return ConstValue::Int(value);
        }
        match text.parse::<f32>() {
            Ok(value) if value.is_finite() => ConstValue::Float(value),
            _ => ConstValue::Expr(text.to_string()),
        }
    }

    /// A `float` constant initialized with `2` still has to print as `2.0`.
    /// `None` when a float value meets an `int` constant.
    pub fn coerce(self, kind: ConstKind) -> Option<Self> {
        match (kind, self) {
            (ConstKind::Float, ConstValue::Int(value)) => Some(ConstValue::Float(value as f32)),
            (ConstKind::Int, ConstValue::Float(_)) => None,
            (_, value) => Some(value),
        }
    }

    pub(crate) fn key(&self) -> Option<ValueKey> {
        match self {
            ConstValue::Int(value) => Some(ValueKey::Int(*value)),
            ConstValue::Float(value) => Some(ValueKey::Float(value.to_bits())),
            ConstValue::Expr(_) => None,
        }
    }
}

/// Float literal text that GLSL accepts: always carries a `.` or an exponent.
pub fn format_float(value: f32) -> String {
    format!("{:?}", value)
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Int(value) => write!(f, "{}", value),
            ConstValue::Float(value) => f.write_str(&format_float(*value)),
            ConstValue::Expr(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub name: String,
    pub kind: ConstKind,
    pub value: ConstValue,
    /// Declaring file, or one of the `<settings>` / `<generated>` markers.
    pub origin: String,
    /// Declaring line when the constant comes from a real source line.
    pub line: Option<usize>,
}

impl Constant {
    /// `const <type> <name> = <value>;`
    pub fn declaration(&self) -> String {
        format!(
            "const {} {} = {};",
            self.kind.glsl_name(),
            self.name,
            self.value
        )
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}:{} = {}", self.origin, line, self.name, self.value),
            None => write!(f, "{}:{} = {}", self.origin, self.name, self.value),
        }
    }
}

/// Constants keyed by name, iterated in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ConstantTable {
    entries: Vec<Constant>,
    by_name: HashMap<String, usize>,
}

impl ConstantTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by name. A replaced constant keeps its position.
    pub fn insert(&mut self, constant: Constant) {
        match self.by_name.get(&constant.name) {
            Some(&i) => self.entries[i] = constant,
            None => {
                self.by_name.insert(constant.name.clone(), self.entries.len());
                self.entries.push(constant);
            }
        }
    }

    /// Insert, failing when the name is already taken.
    pub fn insert_unique(&mut self, constant: Constant) -> Result<()> {
        if let Some(existing) = self.get(&constant.name) {
            return Err(BuildError::DuplicateConstant {
                first: existing.to_string(),
                second: constant.to_string(),
            });
        }
        self.insert(constant);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Constant> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constant> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<Constant> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_to_declared_kind() {
        assert_eq!(ConstValue::Int(2).coerce(ConstKind::Float), Some(ConstValue::Float(2.0)));
        assert_eq!(ConstValue::Int(2).coerce(ConstKind::Int), Some(ConstValue::Int(2)));
        assert_eq!(ConstValue::Float(2.5).coerce(ConstKind::Int), None, "an int constant cannot hold 2.5");
        assert_eq!(
            ConstValue::Expr("sin(1.0)".into()).coerce(ConstKind::Int),
            Some(ConstValue::Expr("sin(1.0)".into()))
        );
    }
}
