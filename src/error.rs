use thiserror::Error;

pub type GameResult<T> = Result<T, GameError>;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to load asset '{name}': {reason}")]
    AssetLoad { name: String, reason: String },
    #[error("missing asset '{0}'")]
    MissingAsset(String),
    #[error("maze layout has {found} tokens, expected {expected} ({cols}x{rows})")]
    LayoutSize {
        expected: usize,
        found: usize,
        cols: usize,
        rows: usize,
    },
    #[error("maze token #{index} is not a single character: {token:?}")]
    LayoutToken { index: usize, token: String },
    #[error("unknown ghost identifier '{0}'")]
    UnknownGhost(String),
}
