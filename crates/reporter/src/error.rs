use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write the report: {0}")]
    Io(#[from] std::io::Error),
}
