pub mod assets;
pub mod builder;
pub mod error;
pub mod parser;
pub mod settings;

pub use assets::{AssetLoader, FileAssetLoader, MemoryAssetLoader};
pub use builder::{build, BuildResult, LineRecord, ShaderBuilder, ShaderCompiler};
pub use error::{BuildError, Result};
pub use parser::StageType;
pub use settings::{BuildSettings, NumericSetting, SettingValue};
