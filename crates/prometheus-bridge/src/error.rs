use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("prometheus: {0}")]
    Prometheus(#[from] prometheus::Error),
    #[error("exposition is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type ExporterResult<T> = Result<T, ExporterError>;
