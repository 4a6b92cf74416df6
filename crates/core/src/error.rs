use crate::types::DbId;

/// Domain error taxonomy shared across the workspace.
///
/// `TransientIo` marks failures that a bounded retry may recover from
/// (e.g. a page image still held open by the rasterizer); everything else
/// is terminal for the operation that produced it.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Not found: {0}")]
    Missing(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Transient I/O failure: {0}")]
    TransientIo(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// True when a bounded retry is worth attempting.
    pub fn is_transient(&self) -> bool {
        matches!(self, CoreError::TransientIo(_))
    }
}

/// Reject non-positive identifiers before any store access.
///
/// Path and query ids are already type-checked as integers by the
/// extractor; this catches the zero/negative garbage a client can still
/// send.
pub fn validate_id(entity: &'static str, id: DbId) -> Result<(), CoreError> {
    if id <= 0 {
        return Err(CoreError::Validation(format!(
            "{entity} id must be a positive integer, got {id}"
        )));
    }
    Ok(())
}

/// Validate a subject code: non-empty, alphanumeric plus `_`/`-`.
///
/// Subject codes become directory names, so path separators and dot
/// sequences must never pass through.
pub fn validate_subject_code(code: &str) -> Result<(), CoreError> {
    if code.is_empty() {
        return Err(CoreError::Validation("subject code is required".into()));
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(CoreError::Validation(format!(
            "subject code '{code}' contains invalid characters"
        )));
    }
    Ok(())
}

/// Validate a booklet file name: a bare `*.pdf` name with no path parts.
pub fn validate_booklet_name(name: &str) -> Result<(), CoreError> {
    if name.is_empty() {
        return Err(CoreError::Validation("booklet name is required".into()));
    }
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(CoreError::Validation(format!(
            "booklet name '{name}' must not contain path segments"
        )));
    }
    if !name.to_ascii_lowercase().ends_with(".pdf") {
        return Err(CoreError::Validation(format!(
            "booklet name '{name}' must be a .pdf file"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn positive_ids_pass() {
        assert!(validate_id("Task", 1).is_ok());
        assert!(validate_id("Task", i64::MAX).is_ok());
    }

    #[test]
    fn zero_and_negative_ids_are_rejected() {
        assert_matches!(validate_id("Task", 0), Err(CoreError::Validation(_)));
        assert_matches!(validate_id("Task", -7), Err(CoreError::Validation(_)));
    }

    #[test]
    fn subject_codes_reject_path_characters() {
        assert!(validate_subject_code("PHY101").is_ok());
        assert!(validate_subject_code("phy-101_b").is_ok());
        assert_matches!(validate_subject_code(""), Err(CoreError::Validation(_)));
        assert_matches!(
            validate_subject_code("../etc"),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            validate_subject_code("a/b"),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn booklet_names_must_be_bare_pdfs() {
        assert!(validate_booklet_name("A.pdf").is_ok());
        assert!(validate_booklet_name("roll_42.PDF").is_ok());
        assert_matches!(
            validate_booklet_name("sub/A.pdf"),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            validate_booklet_name("..\\A.pdf"),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            validate_booklet_name("A.txt"),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn only_transient_io_is_retryable() {
        assert!(CoreError::TransientIo("busy".into()).is_transient());
        assert!(!CoreError::Validation("x".into()).is_transient());
        assert!(!CoreError::Internal("x".into()).is_transient());
    }
}
