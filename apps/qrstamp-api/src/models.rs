//! Request and response types

use qr_overlay::LabelFit;
use serde::{Deserialize, Serialize};
use signature_pages::{SignatureEntry, SignatureLevels};

/// Overlay options shared by every QR endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverlayOptions {
    pub color: Option<String>,
    /// Empty string disables the logo
    pub logourl: Option<String>,
    #[serde(rename = "percentageOfQrCode")]
    pub percentage: Option<f64>,
    #[serde(rename = "textLabel")]
    pub text_label: Option<String>,
    #[serde(rename = "fontSize")]
    pub font_size: Option<f32>,
    #[serde(rename = "labelFit")]
    pub label_fit: Option<LabelFitParam>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelFitParam {
    Fixed,
    Shrink,
}

impl From<LabelFitParam> for LabelFit {
    fn from(param: LabelFitParam) -> Self {
        match param {
            LabelFitParam::Fixed => LabelFit::Fixed,
            LabelFitParam::Shrink => LabelFit::ShrinkToFit,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QrCodeQuery {
    pub data: String,
}

#[derive(Debug, Deserialize)]
pub struct LocationQuery {
    #[serde(rename = "deviceLat")]
    pub device_lat: f64,
    #[serde(rename = "deviceLon")]
    pub device_lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct PolygonQuery {
    pub xml_data: String,
}

/// Body of `POST /process-pdf/`
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessPdfRequest {
    /// Base64-encoded source PDF
    pub file_content: String,
    #[serde(default)]
    pub level1: Vec<SignatureEntry>,
    #[serde(default)]
    pub level2: Vec<SignatureEntry>,
    #[serde(default)]
    pub level3: Vec<SignatureEntry>,
    #[serde(default)]
    pub level4: Vec<SignatureEntry>,
    #[serde(default)]
    pub level5: Vec<SignatureEntry>,
    pub logo_url1: Option<String>,
    pub logo_url2: Option<String>,
    pub link: Option<String>,
}

impl ProcessPdfRequest {
    /// Split the body into the signature levels and everything else
    pub fn take_levels(&mut self) -> SignatureLevels {
        SignatureLevels::new([
            std::mem::take(&mut self.level1),
            std::mem::take(&mut self.level2),
            std::mem::take(&mut self.level3),
            std::mem::take(&mut self.level4),
            std::mem::take(&mut self.level5),
        ])
    }

    /// Non-blank logo URLs in page order (left, right)
    pub fn logo_urls(&self) -> Vec<&str> {
        [&self.logo_url1, &self.logo_url2]
            .into_iter()
            .flatten()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessPdfResponse {
    /// Lowercase hex MD5 of the returned PDF bytes
    pub md5_hash: String,
    /// Base64-encoded stamped PDF
    pub modified_pdf: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}
