#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Course serialization: the JSON course format with its converter chain, and
//! the YAML course configuration files.

/// Version-by-version JSON converters.
pub mod convert;
/// Reading and writing course JSON.
pub mod json;
/// Language-specific task and test directories.
pub mod task_roots;
/// YAML course configuration.
pub mod yaml;

/// Current version of the JSON course format.
pub const JSON_FORMAT_VERSION: u32 = 8;

/// Version assumed for documents without a `version` field.
pub const DEFAULT_FORMAT_VERSION: u32 = 1;

/// Name old courses gave to their additional materials.
pub const PYCHARM_ADDITIONAL: &str = "PyCharm additional materials";

/// Current name of the additional materials item and task.
pub const ADDITIONAL_MATERIALS: &str = "Edu additional materials";

/// Errors raised while reading, migrating or writing course documents.
#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    /// The document is not valid JSON or does not match the course schema.
    #[error("malformed course JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The document is not valid YAML or does not match the config schema.
    #[error("malformed course YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// A top-level item has a `type` nothing knows how to read.
    #[error("Unsupported lesson type: {0}")]
    UnsupportedItemType(String),
    /// The document was written by a newer format than this build reads.
    #[error("format version {found} is newer than the supported version {supported}")]
    UnsupportedVersion {
        /// Version found in the document.
        found:     u32,
        /// Newest version this build reads.
        supported: u32,
    },
    /// A converter could not upgrade the document.
    #[error("failed to convert from version {from}: {reason}")]
    Conversion {
        /// Version the converter upgrades from.
        from:   u32,
        /// What went wrong.
        reason: String,
    },
}
