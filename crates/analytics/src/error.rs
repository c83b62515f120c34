use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum AnalyticsError {
    #[error("Return series is empty after removing missing values")]
    EmptyInput,
}
