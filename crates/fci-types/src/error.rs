use thiserror::Error;

#[derive(Error, Debug)]
pub enum FciError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Field-line tracing failed from y = {y_start}: {message}")]
    Tracing { y_start: f64, message: String },

    #[error("Grid file error: {0}")]
    GridFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type FciResult<T> = Result<T, FciError>;
