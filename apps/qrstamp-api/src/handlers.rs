//! HTTP handlers for the qrstamp API

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::RgbaImage;
use map_render::{device_map, parse_polygon, polygon_map, StaticMap};
use qr_overlay::{
    compose, encode_png, generate_qr, parse_hex_color, Label, LabelFit, MAX_FONT_SIZE,
};
use signature_pages::stamp_signature_pages;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::models::*;
use crate::state::AppState;
use crate::vcard::Contact;

const DEMO_PAYLOAD: &str = "Hello World!";

fn png_response(bytes: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "image/png")], bytes).into_response()
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "qrstamp-api",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Demo QR code for "Hello World!"
pub async fn qr_demo(
    State(state): State<Arc<AppState>>,
    Query(options): Query<OverlayOptions>,
) -> Result<Response, ApiError> {
    render_qr(&state, DEMO_PAYLOAD.to_string(), &options).await
}

/// QR code for arbitrary data
pub async fn qr_code(
    State(state): State<Arc<AppState>>,
    Query(query): Query<QrCodeQuery>,
    Query(options): Query<OverlayOptions>,
) -> Result<Response, ApiError> {
    if query.data.is_empty() {
        return Err(ApiError::InvalidRequest("data must not be empty".into()));
    }
    render_qr(&state, query.data, &options).await
}

/// Contact QR code carrying a vCard 3.0 payload
pub async fn vcard(
    State(state): State<Arc<AppState>>,
    Query(contact): Query<Contact>,
    Query(options): Query<OverlayOptions>,
) -> Result<Response, ApiError> {
    if contact.is_empty() {
        return Err(ApiError::InvalidRequest(
            "A name or organisation is required".into(),
        ));
    }
    render_qr(&state, contact.to_vcard(), &options).await
}

fn overlay_percentage(state: &AppState, options: &OverlayOptions) -> Result<f64, ApiError> {
    let percentage = options.percentage.unwrap_or(state.config.overlay_percentage);
    if !percentage.is_finite() || percentage <= 0.0 || percentage > 1.0 {
        return Err(ApiError::InvalidRequest(format!(
            "percentageOfQrCode must be in (0, 1], got {}",
            percentage
        )));
    }
    Ok(percentage)
}

fn requested_label(state: &AppState, options: &OverlayOptions) -> Result<Option<Label>, ApiError> {
    let Some(text) = options.text_label.as_deref().filter(|t| !t.trim().is_empty()) else {
        return Ok(None);
    };
    let font_size = options.font_size.unwrap_or(state.config.label_font_size);
    if !font_size.is_finite() || font_size <= 0.0 || font_size > MAX_FONT_SIZE {
        return Err(ApiError::InvalidRequest(format!(
            "fontSize must be in (0, {}], got {}",
            MAX_FONT_SIZE, font_size
        )));
    }
    Ok(Some(Label {
        text: text.trim().to_string(),
        font_size,
        fit: options.label_fit.map(LabelFit::from).unwrap_or_default(),
    }))
}

async fn render_qr(state: &Arc<AppState>, payload: String, options: &OverlayOptions) -> Result<Response, ApiError> {
    let color = match options.color.as_deref() {
        Some(c) => parse_hex_color(c)?,
        None => state.default_color,
    };
    let percentage = overlay_percentage(state, options)?;
    let label = requested_label(state, options)?;

    // An explicit empty logourl disables the default logo
    let logo_url = options
        .logourl
        .as_deref()
        .or(state.config.default_logo_url.as_deref())
        .map(str::trim)
        .filter(|u| !u.is_empty());
    let logo = match logo_url {
        Some(url) => state.logos.fetch_optional(url).await,
        None => None,
    };

    info!(
        payload_len = payload.len(),
        logo = logo.is_some(),
        label = label.is_some(),
        percentage,
        "Generating QR code"
    );

    let state = Arc::clone(state);
    let png = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, ApiError> {
        let qr = generate_qr(&payload, color)?;
        let composed = compose(
            qr,
            logo.as_ref(),
            percentage,
            label.as_ref(),
            state.label_font.as_ref(),
            color,
        );
        Ok(encode_png(&composed)?)
    })
    .await??;

    Ok(png_response(png))
}

async fn render_map(state: &AppState, map: StaticMap) -> Result<Response, ApiError> {
    let image: RgbaImage = map.render(state.tiles.as_ref()).await?;
    let png = tokio::task::spawn_blocking(move || encode_png(&image)).await??;
    Ok(png_response(png))
}

/// 200x200 map centred on the device
pub async fn static_map(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LocationQuery>,
) -> Result<Response, ApiError> {
    info!(lat = query.device_lat, lon = query.device_lon, "Rendering device map");
    render_map(&state, device_map(query.device_lat, query.device_lon)).await
}

/// Formatted address for the device position
pub async fn get_address(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LocationQuery>,
) -> Result<Response, ApiError> {
    let (lat, lon) = (query.device_lat, query.device_lon);
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(ApiError::InvalidRequest(format!(
            "Coordinate out of range: {}, {}",
            lat, lon
        )));
    }

    let address = state.geocoder.address(lat, lon).await?;
    debug!(lat, lon, %address, "Resolved address");
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], address).into_response())
}

/// Map with a marker on every polygon vertex
pub async fn polygon(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PolygonQuery>,
) -> Result<Response, ApiError> {
    let polygon = parse_polygon(&query.xml_data, &state.polygon_limits)?;
    info!(vertices = polygon.vertices.len(), "Rendering polygon map");
    render_map(&state, polygon_map(&polygon)).await
}

/// Append signature pages to a PDF and encrypt it
pub async fn process_pdf(
    State(state): State<Arc<AppState>>,
    Json(mut req): Json<ProcessPdfRequest>,
) -> Result<Json<ProcessPdfResponse>, ApiError> {
    let pdf = BASE64
        .decode(req.file_content.trim())
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid file_content base64: {}", e)))?;
    if pdf.is_empty() {
        return Err(ApiError::InvalidRequest("file_content is empty".into()));
    }

    let levels = req.take_levels();
    let link = req.link.clone();

    let mut logos = Vec::new();
    for url in req.logo_urls() {
        if let Some(logo) = state.logos.fetch_optional(url).await {
            logos.push(logo);
        }
    }

    info!(
        input_bytes = pdf.len(),
        signatures = levels.total_entries(),
        logos = logos.len(),
        "Processing PDF"
    );

    let layout = state.layout.clone();
    let stamped = tokio::task::spawn_blocking(move || {
        stamp_signature_pages(&pdf, &levels, &logos, link.as_deref(), &layout)
    })
    .await??;

    info!(
        pages_added = stamped.pages_added,
        md5 = %stamped.md5_hex,
        "Stamped PDF"
    );

    let owner_password = if state.config.disclose_owner_password {
        stamped.owner_password
    } else {
        None
    };

    Ok(Json(ProcessPdfResponse {
        md5_hash: stamped.md5_hex,
        modified_pdf: BASE64.encode(&stamped.bytes),
        owner_password,
    }))
}
