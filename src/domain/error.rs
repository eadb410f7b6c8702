//! Domain error types.

/// Top-level error type for marketgraph.
#[derive(Debug, thiserror::Error)]
pub enum MarketGraphError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("snapshot read error ({source_name}): {reason}")]
    SnapshotRead { source_name: String, reason: String },

    #[error("failed to read history {path}: {reason}")]
    HistoryRead { path: String, reason: String },

    #[error("history {path} is corrupt: {reason}")]
    HistoryCorrupt { path: String, reason: String },

    #[error("failed to persist {path}: {reason}")]
    Persist { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&MarketGraphError> for std::process::ExitCode {
    fn from(err: &MarketGraphError) -> Self {
        let code: u8 = match err {
            MarketGraphError::Io(_) => 1,
            MarketGraphError::ConfigParse { .. }
            | MarketGraphError::ConfigMissing { .. }
            | MarketGraphError::ConfigInvalid { .. } => 2,
            MarketGraphError::HistoryRead { .. }
            | MarketGraphError::HistoryCorrupt { .. }
            | MarketGraphError::Persist { .. } => 3,
            MarketGraphError::SnapshotRead { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
