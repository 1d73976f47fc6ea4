use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Supplies raw shader text for a resolved path.
pub trait AssetLoader {
    fn load_text(&self, path: &Path) -> io::Result<String>;
}

/// Reads shader files from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileAssetLoader;

impl AssetLoader for FileAssetLoader {
    fn load_text(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

/// Shader sources held in memory, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetLoader {
    files: HashMap<PathBuf, String>,
}

impl MemoryAssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into());
    }

    pub fn with(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }
}

impl AssetLoader for MemoryAssetLoader {
    fn load_text(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no shader source registered for {}", path.display()),
            )
        })
    }
}

impl<L: AssetLoader + ?Sized> AssetLoader for &L {
    fn load_text(&self, path: &Path) -> io::Result<String> {
        (**self).load_text(path)
    }
}
