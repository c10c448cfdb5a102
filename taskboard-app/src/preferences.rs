//! View-mode preference
//!
//! The active view is stored as a single string (`kanban`, `matrix` or
//! `table`) in a small file. It is read once at startup and written on every
//! switch. A missing file or an unknown value means the default, kanban.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Preference errors
#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("Failed to read preference file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write preference file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// How the board is presented
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Kanban,
    Matrix,
    Table,
}

impl ViewMode {
    pub const ALL: [ViewMode; 3] = [ViewMode::Kanban, ViewMode::Matrix, ViewMode::Table];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Kanban => "kanban",
            ViewMode::Matrix => "matrix",
            ViewMode::Table => "table",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "kanban" => Some(ViewMode::Kanban),
            "matrix" => Some(ViewMode::Matrix),
            "table" => Some(ViewMode::Table),
            _ => None,
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ViewMode::parse(s).ok_or_else(|| format!("unknown view mode: {}", s))
    }
}

/// File-backed view-mode preference
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PreferenceStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored view mode
    ///
    /// # Errors
    ///
    /// Returns [`PreferenceError::Read`] for I/O failures other than a
    /// missing file.
    pub async fn load(&self) -> Result<ViewMode, PreferenceError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No stored view mode");
                return Ok(ViewMode::default());
            }
            Err(source) => {
                return Err(PreferenceError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        Ok(ViewMode::parse(&raw).unwrap_or_else(|| {
            tracing::warn!(path = %self.path.display(), value = %raw.trim(), "Unknown view mode, using default");
            ViewMode::default()
        }))
    }

    /// Stores the view mode, creating the parent directory if needed
    pub async fn save(&self, mode: ViewMode) -> Result<(), PreferenceError> {
        let write_error = |source| PreferenceError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
        }
        tokio::fs::write(&self.path, mode.as_str())
            .await
            .map_err(write_error)?;
        tracing::debug!(path = %self.path.display(), mode = %mode, "View mode saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("taskboard-prefs-{}", Uuid::new_v4()))
            .join("view-mode")
    }

    #[test]
    fn test_parse_and_display() {
        for mode in ViewMode::ALL {
            assert_eq!(ViewMode::parse(mode.as_str()), Some(mode));
            assert_eq!(mode.to_string().parse::<ViewMode>(), Ok(mode));
        }
        assert_eq!(ViewMode::parse("3d"), None);
        assert_eq!(ViewMode::default(), ViewMode::Kanban);
    }

    #[tokio::test]
    async fn test_missing_file_is_default() {
        let store = PreferenceStore::new(scratch_path());
        assert_eq!(store.load().await.unwrap(), ViewMode::Kanban);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = PreferenceStore::new(scratch_path());
        store.save(ViewMode::Matrix).await.unwrap();
        assert_eq!(store.load().await.unwrap(), ViewMode::Matrix);

        store.save(ViewMode::Table).await.unwrap();
        assert_eq!(store.load().await.unwrap(), ViewMode::Table);
    }

    #[tokio::test]
    async fn test_unknown_value_is_default() {
        let path = scratch_path();
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, "spreadsheet").await.unwrap();

        assert_eq!(PreferenceStore::new(path).load().await.unwrap(), ViewMode::Kanban);
    }
}
