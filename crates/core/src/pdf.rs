//! PDF inspection and rasterization.
//!
//! Page counts are read in-process with `lopdf`. Rasterization shells out
//! to poppler's `pdftoppm`, which writes one PNG per page into the output
//! directory; [`rasterize`] then renames poppler's zero-padded output to
//! the canonical `page_<n>.png` sequence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::retry_fixed;

/// Error type for PDF operations.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("pdftoppm binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("pdftoppm execution failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("failed to parse PDF document: {0}")]
    ParseError(String),

    #[error("document file not found: {0}")]
    DocumentNotFound(String),

    #[error("page image rename failed after retries: {0}")]
    RenameExhausted(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Rename retry bounds for freshly written page images. Poppler may still
/// hold the file briefly on some platforms.
const RENAME_ATTEMPTS: u32 = 5;
const RENAME_DELAY: Duration = Duration::from_millis(200);

/// Count the pages of a PDF document.
pub fn page_count(path: &Path) -> Result<usize, PdfError> {
    if !path.exists() {
        return Err(PdfError::DocumentNotFound(
            path.to_string_lossy().to_string(),
        ));
    }
    let doc = lopdf::Document::load(path).map_err(|e| PdfError::ParseError(e.to_string()))?;
    Ok(doc.get_pages().len())
}

/// Rasterize every page of `pdf_path` into `out_dir` as PNG images named
/// `page_1.png`, `page_2.png`, ... in document order.
///
/// Returns the ordered list of produced file names. The output directory
/// is created if absent. Renaming a poppler output is retried on busy
/// failures before surfacing [`PdfError::RenameExhausted`].
pub async fn rasterize(pdf_path: &Path, out_dir: &Path) -> Result<Vec<String>, PdfError> {
    if !pdf_path.exists() {
        return Err(PdfError::DocumentNotFound(
            pdf_path.to_string_lossy().to_string(),
        ));
    }
    tokio::fs::create_dir_all(out_dir).await?;

    let prefix = out_dir.join("raster");
    let output = tokio::process::Command::new("pdftoppm")
        .arg("-png")
        .arg(pdf_path)
        .arg(&prefix)
        .output()
        .await
        .map_err(PdfError::NotFound)?;

    if !output.status.success() {
        return Err(PdfError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    let raw = collect_raster_outputs(out_dir)?;
    rename_sequentially(out_dir, &raw).await
}

/// Gather poppler's `raster-<n>.png` outputs sorted by their page number.
fn collect_raster_outputs(out_dir: &Path) -> Result<Vec<String>, PdfError> {
    let mut names: Vec<String> = std::fs::read_dir(out_dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with("raster") && name.ends_with(".png"))
        .collect();
    names.sort_by_key(|name| page_number_of(name));
    Ok(names)
}

/// Extract the numeric suffix poppler embeds in its output names.
pub(crate) fn page_number_of(name: &str) -> u32 {
    name.chars()
        .filter(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse()
        .unwrap_or(0)
}

/// Rename raw raster outputs to `page_<n>.png`, retrying busy renames.
async fn rename_sequentially(out_dir: &Path, raw: &[String]) -> Result<Vec<String>, PdfError> {
    let mut renamed = Vec::with_capacity(raw.len());
    for (index, name) in raw.iter().enumerate() {
        let old_path = out_dir.join(name);
        let new_name = format!("page_{}.png", index + 1);
        let new_path = out_dir.join(&new_name);

        retry_rename(&old_path, &new_path).await?;
        renamed.push(new_name);
    }
    Ok(renamed)
}

async fn retry_rename(old_path: &Path, new_path: &Path) -> Result<(), PdfError> {
    let old: PathBuf = old_path.to_path_buf();
    let new: PathBuf = new_path.to_path_buf();

    retry_fixed(RENAME_ATTEMPTS, RENAME_DELAY, is_busy, move || {
        let old = old.clone();
        let new = new.clone();
        async move { tokio::fs::rename(&old, &new).await }
    })
    .await
    .map_err(|e| PdfError::RenameExhausted(format!("{}: {e}", old_path.display())))
}

/// Classify an I/O error as a retryable busy-file condition.
fn is_busy(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        std::io::ErrorKind::ResourceBusy | std::io::ErrorKind::PermissionDenied
    )
}
