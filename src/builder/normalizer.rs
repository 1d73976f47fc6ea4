use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::parser::{format_float, ConstKind, ConstValue, Constant, ValueKey, GENERATED_ORIGIN};

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// A numeric literal at `start..end`. Floats carry a `.` or an exponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Literal {
    start: usize,
    end: usize,
    kind: ConstKind,
}

/// Literals not touching an identifier character or a `.` on either side.
/// `digits`, `digits.digits?`, `.digits`, each with an optional
/// `[eE][+-]?digits` exponent, are taken as one literal.
fn scan_literals(code: &str) -> Vec<Literal> {
    let bytes = code.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };
    let mut found = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let starts = bytes[i].is_ascii_digit()
            || (bytes[i] == b'.' && bytes.get(i + 1).map_or(false, u8::is_ascii_digit));
        let attached = i > 0 && (is_word_byte(bytes[i - 1]) || bytes[i - 1] == b'.');
        if !starts || attached {
            i += 1;
            continue;
        }

        let start = i;
        let mut kind = ConstKind::Int;
        let mut end = digits_from(i);
        if bytes.get(end) == Some(&b'.') {
            kind = ConstKind::Float;
            end = digits_from(end + 1);
        }
        if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
            let mut exp = end + 1;
            if matches!(bytes.get(exp), Some(b'+') | Some(b'-')) {
                exp += 1;
            }
            if bytes.get(exp).map_or(false, u8::is_ascii_digit) {
                kind = ConstKind::Float;
                end = digits_from(exp);
            }
        }
        i = end;

        let isolated_after = end == bytes.len() || !(is_word_byte(bytes[end]) || bytes[end] == b'.');
        if isolated_after {
            found.push(Literal { start, end, kind });
        }
    }
    found
}

/// Replaces inline int/float literals with references to constants of the
/// same value, minting anonymous constants where none exists.
///
/// Constants: `int x = 5;`
/// Code: `int a = 5 + 6; float b = 6.0;`
/// becomes `int a = x + I_6; float b = F_6_0;` with `I_6` and `F_6_0` appended.
#[derive(Debug)]
pub struct ConstantNormalizer {
    constants: Vec<Constant>,
    by_value: HashMap<ValueKey, usize>,
    names: HashSet<String>,
}

impl ConstantNormalizer {
    pub fn new(constants: Vec<Constant>) -> Self {
        let mut by_value = HashMap::new();
        for (i, constant) in constants.iter().enumerate() {
            if let Some(key) = constant.value.key() {
                by_value.entry(key).or_insert(i);
            }
        }
        let names = constants.iter().map(|c| c.name.clone()).collect();
        Self {
            constants,
            by_value,
            names,
        }
    }

    /// Integers first, then floats over the integer-substituted text.
    pub fn normalize(&mut self, code: &str) -> String {
        let code = self.replace_literals(code, ConstKind::Int);
        self.replace_literals(&code, ConstKind::Float)
    }

    /// Declared constants in order, then generated ones in first-use order.
    pub fn into_constants(self) -> Vec<Constant> {
        self.constants
    }

    fn int_reference(&mut self, value: i64) -> String {
        self.reference(ValueKey::Int(value), || Constant {
            name: format!("I_{}", value).replace('-', "neg"),
            kind: ConstKind::Int,
            value: ConstValue::Int(value),
            origin: GENERATED_ORIGIN.to_string(),
            line: None,
        })
    }

    fn float_reference(&mut self, value: f32) -> String {
        self.reference(ValueKey::Float(value.to_bits()), || Constant {
            name: format!("F_{}", format_float(value).replace('.', "_")).replace('-', "neg"),
            kind: ConstKind::Float,
            value: ConstValue::Float(value),
            origin: GENERATED_ORIGIN.to_string(),
            line: None,
        })
    }

    /// Name of the constant holding `key`, minting one if needed. A minted
    /// name already declared for another value gets a `_1`, `_2`... suffix.
    fn reference(&mut self, key: ValueKey, mint: impl FnOnce() -> Constant) -> String {
        if let Some(&i) = self.by_value.get(&key) {
            return self.constants[i].name.clone();
        }
        let mut constant = mint();
        let base = constant.name.clone();
        let mut suffix = 1;
        while self.names.contains(&constant.name) {
            constant.name = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        debug!(constant = %constant, "generated anonymous constant");

        let name = constant.name.clone();
        self.names.insert(name.clone());
        self.by_value.insert(key, self.constants.len());
        self.constants.push(constant);
        name
    }

    fn replace_literals(&mut self, code: &str, kind: ConstKind) -> String {
        let mut out = String::with_capacity(code.len());
        let mut last = 0;

        for literal in scan_literals(code).into_iter().filter(|l| l.kind == kind) {
            let text = &code[literal.start..literal.end];
            let name = match kind {
                ConstKind::Int => text.parse::<i64>().ok().map(|v| self.int_reference(v)),
                ConstKind::Float => text
                    .parse::<f32>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .map(|v| self.float_reference(v)),
            };
            if let Some(name) = name {
                out.push_str(&code[last..literal.start]);
                out.push_str(&name);
                last = literal.end;
            }
        }
        out.push_str(&code[last..]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declared(name: &str, kind: ConstKind, value: ConstValue) -> Constant {
        Constant {
            name: name.to_string(),
            kind,
            value,
            origin: "a.glsl".to_string(),
            line: Some(1),
        }
    }

    #[test]
    fn test_reuses_declared_constants() {
        let mut normalizer = ConstantNormalizer::new(vec![
            declared("x", ConstKind::Int, ConstValue::Int(5)),
            declared("y", ConstKind::Float, ConstValue::Float(6.0)),
        ]);
        let code = normalizer.normalize("int blah = 5 + 6 ;\nfloat var = 6.0 ;");
        assert_eq!(code, "int blah = x + I_6 ;\nfloat var = y ;");
        let names: Vec<String> = normalizer.into_constants().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["x", "y", "I_6"]);
    }

    #[test]
    fn test_identifiers_and_swizzles_untouched() {
        let mut normalizer = ConstantNormalizer::new(Vec::new());
        let code = normalizer.normalize("vec3 v2 = tex2D ( s , uv ) . xyz ;");
        assert_eq!(code, "vec3 v2 = tex2D ( s , uv ) . xyz ;");
        assert!(normalizer.into_constants().is_empty());
    }

    #[test]
    fn test_float_names() {
        let mut normalizer = ConstantNormalizer::new(Vec::new());
        let code = normalizer.normalize("a = .5 ; b = 0.50 ; c = 12.25 ;");
        assert_eq!(code, "a = F_0_5 ; b = F_0_5 ; c = F_12_25 ;");
        let constants = normalizer.into_constants();
        assert_eq!(constants.len(), 2);
        assert_eq!(constants[0].declaration(), "const float F_0_5 = 0.5;");
        assert_eq!(constants[0].origin, GENERATED_ORIGIN);
    }

    #[test]
    fn test_opaque_constants_never_match() {
        let mut normalizer = ConstantNormalizer::new(vec![declared(
            "s",
            ConstKind::Float,
            ConstValue::Expr("sin(1.0)".to_string()),
        )]);
        let code = normalizer.normalize("x = 1.0 ;");
        assert_eq!(code, "x = F_1_0 ;");
        assert_eq!(normalizer.into_constants().len(), 2);
    }

    #[test]
    fn test_exponent_is_part_of_the_literal() {
        let mut normalizer = ConstantNormalizer::new(Vec::new());
        let code = normalizer.normalize("a = 1.0e-3 ; b = 2e5 ; c = 3E+2 ; d = 1e ;");
        assert_eq!(code, "a = F_0_001 ; b = F_200000_0 ; c = F_300_0 ; d = 1e ;");
        let constants = normalizer.into_constants();
        assert!(
            constants.iter().all(|c| c.kind == ConstKind::Float),
            "exponent digits must not become int constants"
        );
        assert_eq!(constants[0].declaration(), "const float F_0_001 = 0.001;");
    }

    #[test]
    fn test_generated_name_avoids_declared_name() {
        let mut normalizer = ConstantNormalizer::new(vec![
            declared("I_6", ConstKind::Int, ConstValue::Int(7)),
            declared("I_6_1", ConstKind::Int, ConstValue::Int(8)),
        ]);
        let code = normalizer.normalize("int a = 6 + 7 ;");
        assert_eq!(code, "int a = I_6_2 + I_6 ;");
        let names: Vec<String> = normalizer.into_constants().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["I_6", "I_6_1", "I_6_2"]);
    }
}
