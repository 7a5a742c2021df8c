use thiserror::Error;

/// Errors raised by the network, normalizer and their boundary helpers.
#[derive(Error, Debug)]
pub enum NetError {
    #[error("shape mismatch in {context}: expected {expected}, got {got}")]
    Shape {
        context: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("invalid state: {0}")]
    State(&'static str),

    #[error("network has no layers")]
    EmptyNetwork,

    #[error("missing data: {0}")]
    MissingData(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("malformed model: {0}")]
    Format(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl NetError {
    pub(crate) fn shape(context: &'static str, expected: usize, got: usize) -> NetError {
        NetError::Shape { context, expected, got }
    }
}

pub type Result<T> = std::result::Result<T, NetError>;
