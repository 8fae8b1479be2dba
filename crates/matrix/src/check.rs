//! Data-file existence checks.
//!
//! The chat workflow may only start when every matrix file is present.
//! The diagram image is reported but never blocks.

use std::path::{Path, PathBuf};

use hclaudit_config::DataConfig;
use serde::Serialize;

/// Result of a plain existence check over a list of paths.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileCheck {
    pub ok: bool,
    pub present: Vec<PathBuf>,
    pub missing: Vec<PathBuf>,
}

/// Check which of `paths` exist. Input order is preserved in both lists.
pub fn verify(paths: &[PathBuf]) -> FileCheck {
    let (present, missing): (Vec<PathBuf>, Vec<PathBuf>) =
        paths.iter().cloned().partition(|p| p.exists());
    FileCheck {
        ok: missing.is_empty(),
        present,
        missing,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileRole {
    Matrix { label: String },
    Diagram,
}

/// Status of one expected data file.
#[derive(Debug, Clone, Serialize)]
pub struct FileStatus {
    pub name: String,
    pub path: PathBuf,
    #[serde(flatten)]
    pub role: FileRole,
    pub exists: bool,
    pub required: bool,
}

/// Per-file status of everything the dashboard expects on disk.
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentReport {
    pub files: Vec<FileStatus>,
}

impl EnvironmentReport {
    pub fn inspect(data: &DataConfig) -> Self {
        let mut files: Vec<FileStatus> = data
            .matrices
            .iter()
            .map(|m| {
                let path = data.dir.join(&m.file);
                FileStatus {
                    name: m.file.clone(),
                    exists: path.exists(),
                    path,
                    role: FileRole::Matrix {
                        label: m.label.clone(),
                    },
                    required: true,
                }
            })
            .collect();

        let diagram = data.diagram_path();
        files.push(FileStatus {
            name: data.diagram.clone(),
            exists: diagram.exists(),
            path: diagram,
            role: FileRole::Diagram,
            required: false,
        });

        Self { files }
    }

    /// Whether every required file is present.
    pub fn chat_ready(&self) -> bool {
        self.files.iter().all(|f| f.exists || !f.required)
    }

    pub fn missing_required(&self) -> Vec<PathBuf> {
        self.files
            .iter()
            .filter(|f| f.required && !f.exists)
            .map(|f| f.path.clone())
            .collect()
    }

    pub fn diagram(&self) -> Option<&Path> {
        self.files
            .iter()
            .find(|f| f.role == FileRole::Diagram && f.exists)
            .map(|f| f.path.as_path())
    }
}
