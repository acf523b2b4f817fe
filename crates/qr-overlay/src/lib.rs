//! QR code generation and logo compositing
//!
//! This crate provides the image side of qrstamp:
//! - `generator`: high error-correction QR codes at a fixed 32px module scale
//! - `compose`: logo overlay sized against the QR data area
//! - `label`: shrink-to-fit text labels drawn on the overlay
//! - `fetch`: logo download over HTTP

pub mod compose;
pub mod error;
pub mod fetch;
pub mod generator;
pub mod label;

pub use compose::{compose, overlay_geometry, OverlayGeometry};
pub use error::{FetchError, QrError};
pub use fetch::{decode_logo, LogoFetcher};
pub use generator::{encode_png, generate_qr, parse_hex_color, BORDER_MODULES, MODULE_SCALE};
pub use label::{
    fit_font_size, Label, LabelFit, LabelFont, TextBounds, TextMeasure, MAX_FONT_SIZE, MIN_FONT_SIZE,
};
