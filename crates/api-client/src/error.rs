use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("The HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("The data provider returned an error: {code} - {description}")]
    Provider { code: String, description: String },

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from API: {0}")]
    InvalidData(String),

    #[error("No price data returned for {0}")]
    NoData(String),

    #[error("Invalid price series: {0}")]
    Core(#[from] core_types::CoreError),
}
