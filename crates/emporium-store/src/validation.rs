use tracing::{debug, trace};

use crate::{constants::KEYS_COLLECTION, Result, StoreError};

/// Windows reserved names that cannot be used as filenames.
pub const WINDOWS_RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8", "COM9", "LPT1", "LPT2",
    "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Longest accepted collection name or document id.
pub const MAX_NAME_LEN: usize = 128;

/// Collection names: alphanumerics, `_`, `-` and `.`.
pub fn is_valid_name_chars(name: &str) -> bool {
    name.chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'))
}

/// Document ids additionally disallow dots to avoid clashing with the file extension.
pub fn is_valid_document_id_chars(id: &str) -> bool {
    id.chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-'))
}

/// Checks if a name is a Windows reserved name (case-insensitive), including
/// the base name before any extension.
pub fn is_reserved_name(name: &str) -> bool {
    let name_upper = name.to_uppercase();
    let base_name = name_upper.split('.').next().unwrap_or(&name_upper);
    WINDOWS_RESERVED_NAMES.contains(&name_upper.as_str()) || WINDOWS_RESERVED_NAMES.contains(&base_name)
}

/// Validates a collection name.
///
/// Rules:
/// - not empty and at most [`MAX_NAME_LEN`] characters
/// - no leading dot, except for the internal `.keys` collection
/// - no trailing dot
/// - only alphanumerics, `_`, `-` and `.`
/// - not a Windows reserved name
pub fn validate_collection_name(name: &str) -> Result<()> {
    trace!("Validating collection name: {}", name);
    let invalid = name.is_empty() ||
        name.len() > MAX_NAME_LEN ||
        (name.starts_with('.') && name != KEYS_COLLECTION) ||
        name.ends_with('.') ||
        !is_valid_name_chars(name) ||
        is_reserved_name(name);

    if invalid {
        debug!("Rejected collection name: {:?}", name);
        return Err(StoreError::InvalidCollectionName {
            name: name.to_owned(),
        });
    }
    Ok(())
}

/// Validates a document id: not empty, at most [`MAX_NAME_LEN`] characters,
/// only alphanumerics, `_` and `-`, and not a Windows reserved name.
pub fn validate_document_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > MAX_NAME_LEN || !is_valid_document_id_chars(id) || is_reserved_name(id) {
        debug!("Rejected document id: {:?}", id);
        return Err(StoreError::InvalidDocumentId {
            id: id.to_owned(),
        });
    }
    Ok(())
}
