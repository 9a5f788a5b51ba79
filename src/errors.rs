use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("CONNECTION_FAILED: {0}")]
    Connection(String),
    #[error("QUERY_FAILED: {0}")]
    Query(String),
    #[error("CONFIG_INVALID: {0}")]
    Config(String),
    #[error("RENDER_FAILED: {0}")]
    Render(String),
    #[error("IO_FAILURE: {0}")]
    Io(String),
    #[error("INTERNAL: {0}")]
    Internal(String),
}

impl AppError {
    pub fn halts_render(&self) -> bool {
        !matches!(self, Self::Query(_))
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
