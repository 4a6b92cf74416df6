//! Subject-scoped directory layout.
//!
//! All filesystem state lives under a single data root:
//!
//! ```text
//! <root>/rawScans/<subject>/*.pdf          scanner drop folder
//! <root>/accepted/<subject>/*.pdf          classified, page count matches
//! <root>/rejected/<subject>/*.pdf          classified, page count mismatch
//! <root>/extractedPages/<subject>/<base>/  per-booklet page images
//! <root>/archive/<subject>/<base>/         hidden pages only
//! <root>/reports/<subject>/                classification reports
//! ```

use std::path::{Path, PathBuf};

/// Directory names under the data root.
pub const RAW_SCANS: &str = "rawScans";
pub const ACCEPTED: &str = "accepted";
pub const REJECTED: &str = "rejected";
pub const EXTRACTED_PAGES: &str = "extractedPages";
pub const ARCHIVE: &str = "archive";
pub const REPORTS: &str = "reports";

/// Path builder for one subject's directories.
#[derive(Debug, Clone)]
pub struct SubjectDirs {
    root: PathBuf,
    subject_code: String,
}

impl SubjectDirs {
    pub fn new(root: impl Into<PathBuf>, subject_code: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            subject_code: subject_code.into(),
        }
    }

    pub fn subject_code(&self) -> &str {
        &self.subject_code
    }

    /// The scanner drop folder for this subject.
    pub fn raw_scans(&self) -> PathBuf {
        self.root.join(RAW_SCANS).join(&self.subject_code)
    }

    /// Booklets whose page count matched the rubric.
    pub fn accepted(&self) -> PathBuf {
        self.root.join(ACCEPTED).join(&self.subject_code)
    }

    /// Booklets whose page count did not match.
    pub fn rejected(&self) -> PathBuf {
        self.root.join(REJECTED).join(&self.subject_code)
    }

    /// Extracted page images for one booklet, keyed by its base name.
    pub fn extracted_pages(&self, booklet_base: &str) -> PathBuf {
        self.root
            .join(EXTRACTED_PAGES)
            .join(&self.subject_code)
            .join(booklet_base)
    }

    /// Archived hidden-page images for one booklet.
    pub fn archive(&self, booklet_base: &str) -> PathBuf {
        self.root
            .join(ARCHIVE)
            .join(&self.subject_code)
            .join(booklet_base)
    }

    /// Classification report directory.
    pub fn reports(&self) -> PathBuf {
        self.root.join(REPORTS).join(&self.subject_code)
    }
}

/// The root of the raw-scan tree (parent of all subject drop folders).
pub fn raw_scans_root(root: &Path) -> PathBuf {
    root.join(RAW_SCANS)
}

/// Strip the `.pdf` extension to get a booklet's base name.
pub fn booklet_base(file_name: &str) -> &str {
    file_name
        .strip_suffix(".pdf")
        .or_else(|| file_name.strip_suffix(".PDF"))
        .unwrap_or(file_name)
}

/// List the `*.pdf` file names in a directory, sorted.
///
/// Returns an empty list when the directory does not exist; the caller
/// decides whether that is an error.
pub fn list_pdfs(dir: &Path) -> std::io::Result<Vec<String>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut names: Vec<String> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.to_ascii_lowercase().ends_with(".pdf"))
        .collect();
    names.sort();
    Ok(names)
}
