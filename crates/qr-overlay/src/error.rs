use thiserror::Error;

#[derive(Error, Debug)]
pub enum QrError {
    #[error("Failed to encode QR code: {0}")]
    Encode(String),

    #[error("Invalid color '{0}': expected #RRGGBB or #RGB")]
    InvalidColor(String),

    #[error("Failed to encode PNG: {0}")]
    Png(String),

    #[error("Invalid font: {0}")]
    Font(String),
}

/// Reasons a logo could not be turned into an overlay image
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Network(String),

    #[error("Unexpected status {0}")]
    Status(u16),

    #[error("URL does not point to an image (content-type: {0})")]
    NotAnImage(String),

    #[error("Logo body too large ({0} bytes)")]
    TooLarge(u64),

    #[error("Failed to decode image: {0}")]
    Decode(String),
}
