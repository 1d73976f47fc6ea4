//! Turns an entry shader and its includes into one compilable source.
//!
//! Supported on top of plain GLSL:
//!
//! - `#include path`: dependencies are emitted once, before the files that
//!   need them, so no include guards are required. An include may not declare
//!   a higher `#version` than any file that includes it.
//! - `#type VERTEX|FRAGMENT|GEOMETRY` selects the pipeline stage.
//! - `#const NAME true|false`, `#if [!]NAME`, `#else`, `#endif` form a small
//!   conditional-compilation layer over named booleans. Boolean settings
//!   override `#const` defaults.
//! - `const int|float` declarations are hoisted to the top of the output.
//!   Numeric settings replace their values.
//! - Inline literals are replaced by references to constants of equal value,
//!   generating anonymous ones (`I_3`, `F_0_5`) where needed.
//!
//! Every output line keeps a record of the file and line it came from.

mod assembler;
mod normalizer;
mod output;

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::assets::AssetLoader;
use crate::error::{BuildError, Result};
use crate::parser::{parse_file, ParsedFile};
use crate::settings::BuildSettings;

pub use assembler::{assemble_body, finalize, merge_constants, normalize_body, AssembledLine, Header};
pub use normalizer::ConstantNormalizer;
pub use output::{BuildResult, LineRecord, ShaderCompiler};

/// The lowest `#version` seen along the include chain leading to a file.
#[derive(Debug, Clone)]
struct VersionCeiling {
    number: u32,
    version: String,
    path: String,
}

impl VersionCeiling {
    fn tighten(ceiling: Option<VersionCeiling>, file: &ParsedFile) -> Option<VersionCeiling> {
        let own = match (file.version_number(), &file.version) {
            (Some(number), Some(version)) => Some(VersionCeiling {
                number,
                version: version.value.clone(),
                path: file.path.clone(),
            }),
            _ => None,
        };
        match (ceiling, own) {
            (Some(c), Some(o)) => Some(if o.number < c.number { o } else { c }),
            (c, o) => c.or(o),
        }
    }

    fn check(&self, include: &ParsedFile) -> Result<()> {
        match (include.version_number(), &include.version) {
            (Some(number), Some(version)) if number > self.number => Err(BuildError::VersionViolation {
                include: include.path.clone(),
                include_version: version.value.clone(),
                includer: self.path.clone(),
                includer_version: self.version.clone(),
            }),
            _ => Ok(()),
        }
    }
}

/// Per-build dependency state. Owned by one `build` call.
struct Resolution<'b, L: AssetLoader> {
    builder: &'b ShaderBuilder<L>,
    settings: &'b BuildSettings,
    resolved: HashMap<String, usize>,
    ordered: Vec<ParsedFile>,
    chain: Vec<String>,
}

impl<'b, L: AssetLoader> Resolution<'b, L> {
    /// Resolve `file`'s includes depth-first, then append `file` itself.
    fn resolve(&mut self, file: ParsedFile, ceiling: Option<VersionCeiling>) -> Result<()> {
        let ceiling = VersionCeiling::tighten(ceiling, &file);
        self.chain.push(file.path.clone());

        for include in &file.includes {
            if let Some(pos) = self.chain.iter().position(|p| p == include) {
                let mut chain = self.chain[pos..].to_vec();
                chain.push(include.clone());
                return Err(BuildError::IncludeCycle { chain });
            }

            if let Some(&index) = self.resolved.get(include) {
                debug!(file = %file.path, include = %include, "include already resolved");
                if let Some(ceiling) = &ceiling {
                    ceiling.check(&self.ordered[index])?;
                }
                continue;
            }

            let parsed = self.builder.load(include, self.settings, false)?;
            if parsed.stage.is_some() || parsed.precision.is_some() {
                warn!(file = %parsed.path, "#type and precision are ignored in include files");
            }
            if let Some(ceiling) = &ceiling {
                ceiling.check(&parsed)?;
            }
            debug!(file = %file.path, include = %include, "resolved include");
            self.resolve(parsed, ceiling.clone())?;
        }

        self.chain.pop();
        self.resolved.insert(file.path.clone(), self.ordered.len());
        self.ordered.push(file);
        Ok(())
    }
}

/// Builds shaders from files below a root directory.
pub struct ShaderBuilder<L: AssetLoader> {
    loader: L,
    root: PathBuf,
}

impl<L: AssetLoader> ShaderBuilder<L> {
    pub fn new(loader: L, root: impl Into<PathBuf>) -> Self {
        Self {
            loader,
            root: root.into(),
        }
    }

    fn load(&self, path: &str, settings: &BuildSettings, main_file: bool) -> Result<ParsedFile> {
        let full_path = self.root.join(path);
        let text = self
            .loader
            .load_text(&full_path)
            .map_err(|source| BuildError::Io {
                path: full_path.clone(),
                source,
            })?;
        parse_file(path, &text, settings, main_file)
    }

    /// Build `entry` and everything it includes.
    pub fn build(&self, entry: &str, settings: &BuildSettings) -> Result<BuildResult> {
        let main = self.load(entry, settings, true)?;
        let header = Header::from_main(&main)?;

        let mut resolution = Resolution {
            builder: self,
            settings,
            resolved: HashMap::new(),
            ordered: Vec::new(),
            chain: Vec::new(),
        };
        resolution.resolve(main, None)?;
        let files = resolution.ordered;

        let body = assemble_body(&files);
        let constants = merge_constants(&files)?;
        let (constants, body) = normalize_body(constants, body);
        let (source, line_table) = finalize(&header, &constants, body);

        info!(
            entry,
            stage = %header.stage,
            files = files.len(),
            constants = constants.len(),
            lines = line_table.len(),
            "built shader"
        );
        Ok(BuildResult {
            path: header.path,
            stage: header.stage,
            source,
            line_table,
        })
    }
}

/// Shortcut for a one-off build.
pub fn build<L: AssetLoader>(
    loader: L,
    root: impl Into<PathBuf>,
    entry: &str,
    settings: &BuildSettings,
) -> Result<BuildResult> {
    ShaderBuilder::new(loader, root).build(entry, settings)
}
