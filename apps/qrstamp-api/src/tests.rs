//! Router tests
//!
//! Every request is served in-process through `oneshot`. Upstream services
//! point at a closed local port so nothing leaves the machine.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use clap::Parser;
use http_body_util::BodyExt;
use lopdf::{dictionary, Document, Object};
use map_render::BlankTileSource;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::{router, AppState, Config};

const UNREACHABLE: &str = "http://127.0.0.1:9";

fn test_config(extra: &[&str]) -> Config {
    let tile_url = format!("{}/{{z}}/{{x}}/{{y}}.png", UNREACHABLE);
    let mut args = vec![
        "qrstamp-api",
        "--geocoder-url",
        UNREACHABLE,
        "--tile-url",
        &tile_url,
        "--fetch-timeout-secs",
        "2",
    ];
    args.extend_from_slice(extra);
    Config::parse_from(args)
}

fn test_app_with(extra: &[&str]) -> Router {
    let state = AppState::new(test_config(extra))
        .unwrap()
        .with_tile_source(Arc::new(BlankTileSource::default()));
    router(Arc::new(state))
}

fn test_app() -> Router {
    test_app_with(&[])
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Option<String>, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, content_type, body)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(app: Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();
    let (status, _, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn decode_png(bytes: &[u8]) -> image::RgbaImage {
    image::load_from_memory(bytes).unwrap().to_rgba8()
}

fn create_test_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

// ============================================================
// Health
// ============================================================

#[tokio::test]
async fn test_health() {
    let (status, _, body) = get(test_app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "qrstamp-api");
}

// ============================================================
// QR codes
// ============================================================

#[tokio::test]
async fn test_qrcode_without_logo_is_plain_qr() {
    let (status, content_type, body) = get(test_app(), "/qrcode?data=hi&logourl=").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/png"));

    let expected = qr_overlay::encode_png(
        &qr_overlay::generate_qr("hi", qr_overlay::parse_hex_color("#7A663C").unwrap()).unwrap(),
    )
    .unwrap();
    assert_eq!(body, expected);
}

#[tokio::test]
async fn test_demo_qr_dimensions() {
    let (status, _, body) = get(test_app(), "/").await;
    assert_eq!(status, StatusCode::OK);
    let img = decode_png(&body);
    assert_eq!(img.width(), img.height());
    assert_eq!(img.width() % 32, 0);
}

#[tokio::test]
async fn test_qrcode_custom_color() {
    let (status, _, body) = get(test_app(), "/qrcode?data=hi&color=%23000000&logourl=").await;
    assert_eq!(status, StatusCode::OK);
    let img = decode_png(&body);
    // Top-left finder pattern starts one module in
    assert_eq!(*img.get_pixel(32, 32), image::Rgba([0, 0, 0, 255]));
    assert_eq!(*img.get_pixel(0, 0), image::Rgba([255, 255, 255, 255]));
}

#[tokio::test]
async fn test_unreachable_logo_falls_back_to_plain_qr() {
    let uri = format!("/qrcode?data=hi&logourl={}/logo.png", UNREACHABLE);
    let (status, _, body) = get(test_app(), &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decode_png(&body).width(), 23 * 32);
}

#[tokio::test]
async fn test_qrcode_invalid_color() {
    let (status, _, body) = get(test_app(), "/qrcode?data=hi&color=purple&logourl=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["code"], "INVALID_REQUEST");
    assert_eq!(json["status"], 400);
}

#[tokio::test]
async fn test_qrcode_percentage_out_of_range() {
    for p in ["0", "1.5", "-0.2"] {
        let uri = format!("/qrcode?data=hi&logourl=&percentageOfQrCode={}", p);
        let (status, _, _) = get(test_app(), &uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "percentage {}", p);
    }
}

#[tokio::test]
async fn test_qrcode_requires_data() {
    let (status, _, _) = get(test_app(), "/qrcode").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _, _) = get(test_app(), "/qrcode?data=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_label_without_font_is_skipped() {
    let (status, _, body) =
        get(test_app(), "/qrcode?data=hi&logourl=&textLabel=Scan%20me&fontSize=40").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decode_png(&body).width(), 23 * 32);
}

#[tokio::test]
async fn test_font_size_out_of_range_rejected() {
    for size in ["1e8", "1001", "0", "-3", "NaN", "inf"] {
        let uri = format!("/qrcode?data=hi&logourl=&textLabel=x&fontSize={}", size);
        let (status, _, _) = get(test_app(), &uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "fontSize {}", size);
    }

    let (status, _, _) = get(test_app(), "/qrcode?data=hi&logourl=&textLabel=x&fontSize=1000").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_vcard() {
    let (status, content_type, body) = get(
        test_app(),
        "/vcard?first_name=Ada&last_name=Lovelace&organisation=Engines&email=ada%40example.com&logourl=",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/png"));
    // A vCard needs a larger symbol than "hi"
    assert!(decode_png(&body).width() > 23 * 32);
}

#[tokio::test]
async fn test_vcard_requires_a_name() {
    let (status, _, _) = get(test_app(), "/vcard?email=a%40b.c&logourl=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================
// Maps
// ============================================================

#[tokio::test]
async fn test_static_map() {
    for path in ["/staticmap", "/generate_map"] {
        let uri = format!("{}?deviceLat=52.52&deviceLon=13.405", path);
        let (status, content_type, body) = get(test_app(), &uri).await;
        assert_eq!(status, StatusCode::OK, "{}", path);
        assert_eq!(content_type.as_deref(), Some("image/png"));

        let img = decode_png(&body);
        assert_eq!(img.dimensions(), (200, 200));
        assert_eq!(*img.get_pixel(100, 100), map_render::MARKER_RED);
    }
}

#[tokio::test]
async fn test_static_map_invalid_coordinates() {
    let (status, _, _) = get(test_app(), "/staticmap?deviceLat=95&deviceLon=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _, _) = get(test_app(), "/staticmap?deviceLat=abc&deviceLon=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_polygon_map() {
    // <coordinates>13.0,52.0 13.1,52.0 13.1,52.1 13.0,52.0</coordinates>
    let uri = "/polygon?xml_data=%3Ccoordinates%3E13.0%2C52.0%2013.1%2C52.0%2013.1%2C52.1%2013.0%2C52.0%3C%2Fcoordinates%3E";
    let (status, _, body) = get(test_app(), uri).await;
    assert_eq!(status, StatusCode::OK);
    let img = decode_png(&body);
    assert_eq!(img.dimensions(), (400, 400));
    assert!(img.pixels().any(|p| *p == map_render::MARKER_RED));
}

#[tokio::test]
async fn test_polygon_rejects_bad_markup() {
    let (status, _, body) = get(test_app(), "/polygon?xml_data=%3Cfoo%2F%3E").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_polygon_vertex_limit() {
    let app = test_app_with(&["--polygon-max-vertices", "2"]);
    let uri = "/polygon?xml_data=%3Ccoordinates%3E1%2C1%202%2C2%203%2C3%3C%2Fcoordinates%3E";
    let (status, _, _) = get(app, uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_address_upstream_failure() {
    let (status, _, body) = get(test_app(), "/get_address?deviceLat=52.52&deviceLon=13.405").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["code"], "UPSTREAM_ERROR");
}

#[tokio::test]
async fn test_get_address_out_of_range() {
    let (status, _, _) = get(test_app(), "/get_address?deviceLat=10&deviceLon=200").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================
// Signature pages
// ============================================================

fn entry(role: &str, name: &str) -> Value {
    json!({"role": role, "name": name, "adname": "", "timestamp": "2024-03-01 09:30"})
}

#[tokio::test]
async fn test_process_pdf_stamps_and_encrypts() {
    let body = json!({
        "file_content": BASE64.encode(create_test_pdf()),
        "level1": [entry("Author", "Ana"), entry("Reviewer", "Ben"), entry("QA", "Cy")],
        "level3": [entry("Approver", "Dee")],
        "link": "https://example.com/docs/7",
    });
    let (status, json) = post_json(test_app(), "/process-pdf/", &body).await;
    assert_eq!(status, StatusCode::OK);

    let pdf = BASE64.decode(json["modified_pdf"].as_str().unwrap()).unwrap();
    assert_eq!(json["md5_hash"], signature_pages::md5_hex(&pdf));

    let password = json["owner_password"].as_str().unwrap();
    assert_eq!(password.len(), 32);

    let doc = Document::load_mem(&pdf).unwrap();
    assert!(doc.is_encrypted());
    assert!(doc.authenticate_user_password("").is_ok());
    assert!(doc.authenticate_owner_password(password).is_ok());
    assert!(doc.authenticate_owner_password("wrong").is_err());
    assert_eq!(doc.get_pages().len(), 3);
}

#[tokio::test]
async fn test_process_pdf_without_levels_is_unencrypted() {
    let body = json!({ "file_content": BASE64.encode(create_test_pdf()) });
    let (status, json) = post_json(test_app(), "/process-pdf", &body).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json.get("owner_password").is_none());

    let pdf = BASE64.decode(json["modified_pdf"].as_str().unwrap()).unwrap();
    let doc = Document::load_mem(&pdf).unwrap();
    assert_eq!(doc.get_pages().len(), 1);
}

#[tokio::test]
async fn test_process_pdf_can_withhold_owner_password() {
    let app = test_app_with(&["--disclose-owner-password", "false"]);
    let body = json!({
        "file_content": BASE64.encode(create_test_pdf()),
        "level1": [entry("Author", "Ana")],
    });
    let (status, json) = post_json(app, "/process-pdf/", &body).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json.get("owner_password").is_none());
    assert_eq!(json["md5_hash"].as_str().unwrap().len(), 32);
}

#[tokio::test]
async fn test_process_pdf_unreachable_logos_are_skipped() {
    let body = json!({
        "file_content": BASE64.encode(create_test_pdf()),
        "level1": [entry("Author", "Ana")],
        "logo_url1": format!("{}/left.png", UNREACHABLE),
        "logo_url2": "",
    });
    let (status, _) = post_json(test_app(), "/process-pdf/", &body).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_process_pdf_invalid_base64() {
    let body = json!({ "file_content": "not base64!!", "level1": [entry("A", "B")] });
    let (status, json) = post_json(test_app(), "/process-pdf/", &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_process_pdf_not_a_pdf() {
    let body = json!({
        "file_content": BASE64.encode(b"plain text, not a document"),
        "level1": [entry("A", "B")],
    });
    let (status, _) = post_json(test_app(), "/process-pdf/", &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_process_pdf_body_limit() {
    let app = test_app_with(&["--body-limit", "64"]);
    let body = json!({ "file_content": BASE64.encode(create_test_pdf()) });
    let (status, _) = post_json(app, "/process-pdf/", &body).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}
