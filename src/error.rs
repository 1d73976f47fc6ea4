use std::io;
use std::path::PathBuf;

/// Everything that can stop a shader build. None of these are retried.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("could not read \"{}\": {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{file}: missing tokens, last token parsed on line {line}: \"{token}\"")]
    Exhausted {
        file: String,
        line: usize,
        token: String,
    },

    #[error("{file}:{line}: block comment end without matching beginning")]
    UnmatchedCommentEnd { file: String, line: usize },

    #[error("{file}:{line}: #else without matching #if")]
    UnmatchedElse { file: String, line: usize },

    #[error("{file}:{line}: #endif without matching #if")]
    UnmatchedEndif { file: String, line: usize },

    #[error("{file}:{line}: unclosed #if")]
    UnclosedIf { file: String, line: usize },

    #[error("{file}:{line}: undefined constant used in #if: {name}")]
    UndefinedCondition {
        file: String,
        line: usize,
        name: String,
    },

    #[error("{file}:{line}: illegal shader type: {value}")]
    IllegalStage {
        file: String,
        line: usize,
        value: String,
    },

    #[error("{file}:{line}: malformed #version \"{version}\"")]
    MalformedVersion {
        file: String,
        line: usize,
        version: String,
    },

    #[error(
        "included file \"{include}\" (version {include_version}) has a greater version than \"{includer}\" (version {includer_version})"
    )]
    VersionViolation {
        include: String,
        include_version: String,
        includer: String,
        includer_version: String,
    },

    #[error("include cycle: {}", chain.join(" -> "))]
    IncludeCycle { chain: Vec<String> },

    #[error("duplicate constant definition: {first} vs {second}")]
    DuplicateConstant { first: String, second: String },

    #[error("{what} unspecified for main file \"{file}\"")]
    MissingMetadata { file: String, what: &'static str },

    #[error("invalid setting \"{0}\"")]
    InvalidSetting(String),

    #[error("invalid settings file: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("could not compile shader \"{path}\":\n{message}\n{markup}")]
    Compile {
        path: String,
        message: String,
        markup: String,
    },
}

pub type Result<T> = std::result::Result<T, BuildError>;
