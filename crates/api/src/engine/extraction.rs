//! Lazy once-per-booklet page extraction.
//!
//! The page rows themselves are the memo: if any exist for a work item the
//! booklet has already been rasterized and the stored rows are returned.
//! Otherwise the booklet is rasterized into its extraction directory, one
//! row is inserted per image, and images at hidden rubric indices are
//! mirrored into the archive directory. Callers receive only the
//! non-hidden pages.

use examark_core::layout::{booklet_base, SubjectDirs};
use examark_core::pdf;
use examark_core::rubric::partition_hidden;
use examark_db::models::page::Page;
use examark_db::models::task::WorkItem;
use examark_db::repositories::PageRepo;
use examark_db::DbPool;

use crate::error::{AppError, AppResult};

/// Resolve the visible pages of a booklet, extracting on first access.
pub async fn visible_pages(
    pool: &DbPool,
    dirs: &SubjectDirs,
    work_item: &WorkItem,
    hidden_indices: &[i32],
) -> AppResult<Vec<Page>> {
    let existing = PageRepo::list_by_work_item(pool, work_item.id).await?;
    if !existing.is_empty() {
        let (visible, _) = partition_hidden(&existing, hidden_indices);
        return Ok(visible);
    }

    let pages = extract(pool, dirs, work_item, hidden_indices).await?;
    let (visible, _) = partition_hidden(&pages, hidden_indices);
    Ok(visible)
}

/// Rasterize the booklet, persist its page rows, and archive hidden images.
async fn extract(
    pool: &DbPool,
    dirs: &SubjectDirs,
    work_item: &WorkItem,
    hidden_indices: &[i32],
) -> AppResult<Vec<Page>> {
    let base = booklet_base(&work_item.file_name);
    let source = dirs.accepted().join(&work_item.file_name);
    let out_dir = dirs.extracted_pages(base);

    let image_names = pdf::rasterize(&source, &out_dir).await?;
    tracing::info!(
        work_item_id = work_item.id,
        booklet = %work_item.file_name,
        pages = image_names.len(),
        "Extracted booklet pages"
    );

    // Mirror hidden-index images into the archive before returning
    // anything to the evaluator.
    let (_, hidden_names) = partition_hidden(&image_names, hidden_indices);
    if !hidden_names.is_empty() {
        let archive_dir = dirs.archive(base);
        tokio::fs::create_dir_all(&archive_dir)
            .await
            .map_err(|e| AppError::InternalError(format!("archive dir: {e}")))?;
        for name in &hidden_names {
            tokio::fs::copy(out_dir.join(name), archive_dir.join(name))
                .await
                .map_err(|e| AppError::InternalError(format!("archive copy {name}: {e}")))?;
        }
    }

    // A concurrent extraction of the same booklet loses on the unique
    // (work_item_id, image_name) index; surface that as a conflict.
    let pages = PageRepo::insert_batch(pool, work_item.id, &image_names).await?;
    Ok(pages)
}
