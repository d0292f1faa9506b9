//! Names of the special files and directories used by the store.

/// Directory holding all collections within a store.
pub const DATA_DIR: &str = "data";

/// File extension for document files.
pub const DOCUMENT_EXTENSION: &str = "json";

/// Directory for soft-deleted documents within a collection.
pub const DELETED_DIR: &str = ".deleted";

/// Store metadata file in the store root.
pub const STORE_METADATA_FILE: &str = ".store.json";

/// Collection reserved for key material.
pub const KEYS_COLLECTION: &str = ".keys";

/// Prefix of in-flight temporary files. Hidden so listings skip them.
pub const TEMP_FILE_PREFIX: &str = ".tmp-";
