use std::path::PathBuf;

/// Failures while inspecting a workspace on disk.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid glob pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("{tool} executable not found at {path}")]
    MissingExecutable { tool: &'static str, path: PathBuf },
}
