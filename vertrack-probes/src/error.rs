use thiserror::Error;

/// A source existed but could not be read or understood.
///
/// "Component not present" is never a `ProbeError`; it is an absent `ProbeResult`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("io error reading {path}: {message}")]
    Io { path: String, message: String },

    #[error("xml parse error in {path}: {message}")]
    Xml { path: String, message: String },

    #[error("json parse error in {path}: {message}")]
    Json { path: String, message: String },

    #[error("invalid pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    #[error("host operation '{operation}' failed: {message}")]
    Host { operation: String, message: String },
}
