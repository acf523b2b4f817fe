use thiserror::Error;

#[derive(Error, Debug)]
pub enum StampError {
    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    #[error("PDF processing failed: {0}")]
    Processing(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),
}

impl From<lopdf::Error> for StampError {
    fn from(err: lopdf::Error) -> Self {
        StampError::Processing(err.to_string())
    }
}
