//! Common text validation and normalization utilities.

use validator::ValidationError;

/// Longest file name accepted for uploads, after sanitizing.
const MAX_FILE_NAME_LENGTH: usize = 100;

/// Trims surrounding whitespace.
pub fn normalize_text(value: &str) -> String {
    value.trim().to_string()
}

/// Trims an optional value, mapping blank input to `None`.
pub fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validates that a value has visible content.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Reduces an uploaded file name to `[A-Za-z0-9._-]`, keeping at most
/// `MAX_FILE_NAME_LENGTH` characters. Dot runs are collapsed and leading dots
/// stripped so the result can never name a hidden file or a parent directory.
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let mut cleaned = cleaned;
    while cleaned.contains("..") {
        cleaned = cleaned.replace("..", "_");
    }
    let cleaned = cleaned.trim_start_matches('.');
    let cleaned: String = cleaned.chars().take(MAX_FILE_NAME_LENGTH).collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_') {
        None
    } else {
        Some(cleaned)
    }
}

/// Validates a blob reference as produced by the blob store.
pub fn validate_blob_reference(reference: &str) -> Result<(), ValidationError> {
    let valid = !reference.is_empty()
        && !reference.starts_with('.')
        && !reference.contains("..")
        && reference
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("blob_reference");
        err.message = Some("Invalid blob reference".into());
        Err(err)
    }
}
