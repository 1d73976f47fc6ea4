mod comments;
mod constants;
mod file_parser;
mod preprocessor;
mod tokenizer;
mod types;

pub use comments::{strip_comments, CommentState};
pub use constants::{
    format_float, ConstKind, ConstValue, Constant, ConstantTable, GENERATED_ORIGIN, SETTINGS_ORIGIN,
};
pub(crate) use constants::ValueKey;
pub use file_parser::parse_file;
pub use preprocessor::{parse_directive, preprocess, BoolTable, ConditionState, Directive};
pub use tokenizer::{normalize_text, read_lines, split_lines, tokenize};
pub use types::{Declared, ParsedFile, SourceLine, StageType, Token};
