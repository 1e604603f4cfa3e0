//! Preset discovery and loading
//!
//! Presets live as flat files in a single folder. Only regular files with
//! the configured extension are offered; nothing below the folder is
//! scanned.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::config::NodeConfig;
use crate::error::{PedalboardError, Result};

/// Raw preset text as read from disk
#[derive(Debug, Clone)]
pub struct Preset {
    pub name: String,
    pub path: PathBuf,
    pub text: String,
}

impl Preset {
    /// Hex SHA-256 of the preset text
    pub fn digest(&self) -> String {
        format!("{:x}", Sha256::digest(self.text.as_bytes()))
    }
}

/// Folder of preset files
#[derive(Debug, Clone)]
pub struct PresetLibrary {
    dir: PathBuf,
    extension: String,
}

impl PresetLibrary {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    pub fn from_config(config: &NodeConfig) -> Self {
        Self::new(config.preset_dir(), config.preset_extension.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Sorted file names of every preset in the folder
    ///
    /// A missing or unreadable folder yields an empty list.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext == self.extension)
            })
            .filter_map(|entry| entry.file_name().to_str().map(str::to_owned))
            .collect();
        names.sort();
        names
    }

    /// Path of the named preset, which must be an existing regular file
    ///
    /// # Errors
    /// `PresetNotFound` for missing files and for names that would leave the
    /// preset folder.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let not_found = || PedalboardError::PresetNotFound {
            name: name.to_string(),
        };

        let escapes =
            name.is_empty() || name == ".." || name.contains('/') || name.contains('\\');
        if escapes {
            return Err(not_found());
        }

        let path = self.dir.join(name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(not_found())
        }
    }

    /// Resolve and read the named preset
    pub fn load(&self, name: &str) -> Result<Preset> {
        let path = self.resolve(name)?;
        let text = std::fs::read_to_string(&path).map_err(|source| PedalboardError::PresetRead {
            path: path.clone(),
            source,
        })?;
        Ok(Preset {
            name: name.to_string(),
            path,
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn library_with(files: &[&str]) -> (tempfile::TempDir, PresetLibrary) {
        let dir = tempdir().unwrap();
        for file in files {
            fs::write(dir.path().join(file), "[Reverb()], \"out.wav\"").unwrap();
        }
        let library = PresetLibrary::new(dir.path(), "pdl");
        (dir, library)
    }

    #[test]
    fn test_list_filters_and_sorts() {
        let (dir, library) = library_with(&["b.pdl", "a.pdl", "notes.txt", "c.pdl.bak"]);
        fs::create_dir(dir.path().join("nested.pdl")).unwrap();
        fs::write(dir.path().join("nested.pdl").join("d.pdl"), "").unwrap();

        assert_eq!(library.list(), vec!["a.pdl".to_string(), "b.pdl".to_string()]);
    }

    #[test]
    fn test_missing_folder_lists_nothing() {
        let library = PresetLibrary::new("/definitely/not/here", "pdl");
        assert!(library.list().is_empty());
    }

    #[test]
    fn test_resolve_missing() {
        let (_dir, library) = library_with(&["a.pdl"]);
        let err = library.resolve("gone.pdl").unwrap_err();
        assert_eq!(err.error_code(), "PRESET_NOT_FOUND");
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let (_dir, library) = library_with(&["a.pdl"]);
        assert!(library.resolve("../a.pdl").is_err());
        assert!(library.resolve("..").is_err());
        assert!(library.resolve("sub/a.pdl").is_err());
        assert!(library.resolve("").is_err());
    }

    #[test]
    fn test_load_and_digest() {
        let (_dir, library) = library_with(&["a.pdl"]);
        let preset = library.load("a.pdl").unwrap();
        assert_eq!(preset.text, "[Reverb()], \"out.wav\"");
        assert_eq!(preset.digest().len(), 64);
        assert_eq!(preset.digest(), library.load("a.pdl").unwrap().digest());
    }
}
