use base64::{engine::general_purpose::STANDARD, Engine as _};

use qrstyle::config::{EcLevel, GenerateRequest, Limits, RenderConfig, Style};
use qrstyle::engine::{Delivery, Generator};
use qrstyle::matrix::{QrSymbolEncoder, SymbolEncoder};
use qrstyle::output::ResponsePayload;
use qrstyle::raster::render_png;

fn decode_png(png: &[u8]) -> String {
    let luma = image::load_from_memory(png).unwrap().to_luma8();
    let (w, h) = luma.dimensions();
    let result = rxing::helpers::detect_in_luma(luma.into_raw(), w, h, Some(rxing::BarcodeFormat::QR_CODE))
        .unwrap_or_else(|e| panic!("no QR code found: {:?}", e));
    result.getText().to_string()
}

fn render(text: &str, config: &RenderConfig) -> Vec<u8> {
    let matrix = QrSymbolEncoder.encode(text, config.error_level).unwrap();
    render_png(&matrix, config).unwrap()
}

fn raw_body(generator: &Generator, body: serde_json::Value) -> Vec<u8> {
    let request: GenerateRequest = serde_json::from_value(body).unwrap();
    match generator.generate(request).unwrap().payload {
        ResponsePayload::Raw { body, .. } => body,
        other => panic!("raw delivery should stream bytes, got {:?}", other),
    }
}

fn long_text() -> String {
    let mut text = String::from("https://example.com/track?ref=");
    while text.len() < 200 {
        text.push_str("a1B2-c3D4_");
    }
    text.truncate(200);
    text
}

#[test]
fn default_config_scans_back() {
    for level in [EcLevel::M, EcLevel::H] {
        let config = RenderConfig { error_level: level, ..RenderConfig::default() };
        assert_eq!((config.pixel_size, config.margin, config.style), (400, 1, Style::Dotted));
        let png = render("HELLO", &config);
        assert_eq!(decode_png(&png), "HELLO", "level {:?}", level);
    }
}

#[test]
fn wide_quiet_zone_scans_back() {
    for style in [Style::Dotted, Style::Plain] {
        let config = RenderConfig { pixel_size: 600, margin: 4, style, ..RenderConfig::default() };
        let png = render("https://example.com/qr", &config);
        assert_eq!(decode_png(&png), "https://example.com/qr", "style {:?}", style);
    }
}

#[test]
fn long_payload_scans_back_with_default_margin() {
    let text = long_text();
    assert_eq!(text.len(), 200);

    let config = RenderConfig { error_level: EcLevel::M, ..RenderConfig::default() };
    let matrix = QrSymbolEncoder.encode(&text, config.error_level).unwrap();
    assert!(matrix.size() > 21, "payload should need a larger version");
    assert_eq!(decode_png(&render(&text, &config)), text);

    let config = RenderConfig { error_level: EcLevel::H, pixel_size: 600, ..RenderConfig::default() };
    assert_eq!(decode_png(&render(&text, &config)), text);
}

#[test]
fn bare_request_scans_back() {
    let generator = Generator::new(Limits::default(), Delivery::Raw);
    let body = raw_body(&generator, serde_json::json!({ "text": "HELLO" }));
    let img = image::load_from_memory(&body).unwrap();
    assert_eq!((img.width(), img.height()), (400, 400));
    assert_eq!(decode_png(&body), "HELLO");

    let body = raw_body(&generator, serde_json::json!({ "text": "HELLO", "errorLevel": "H" }));
    assert_eq!(decode_png(&body), "HELLO");
}

#[test]
fn data_uri_scans_back() {
    let generator = Generator::new(Limits::default(), Delivery::Json);
    let request: GenerateRequest = serde_json::from_value(serde_json::json!({ "text": "HELLO" })).unwrap();
    let ResponsePayload::DataUri(uri) = generator.generate(request).unwrap().payload else {
        panic!("json delivery should inline the png");
    };
    let png = STANDARD.decode(uri.strip_prefix("data:image/png;base64,").unwrap()).unwrap();
    assert_eq!(decode_png(&png), "HELLO");
}

#[test]
fn hello_scenario_through_pipeline() {
    let generator = Generator::new(Limits::default(), Delivery::Raw);
    let request: GenerateRequest = serde_json::from_value(serde_json::json!({
        "text": "HELLO",
        "color": "#000000",
        "bgColor": "#FFFFFF",
        "errorLevel": "M",
        "format": "png",
        "size": 400
    }))
    .unwrap();
    let generated = generator.generate(request).unwrap();
    let ResponsePayload::Raw { media_type, body, .. } = generated.payload else {
        panic!("raw delivery should stream bytes");
    };
    assert_eq!(media_type, "image/png");
    assert!(!body.is_empty());
    assert_eq!(decode_png(&body), "HELLO");
}

#[test]
fn vector_scenario_counts_primitives() {
    let generator = Generator::new(Limits::default(), Delivery::Raw);
    let body = raw_body(
        &generator,
        serde_json::json!({
            "text": "HELLO",
            "format": "vector",
            "size": 400
        }),
    );
    let markup = String::from_utf8(body).unwrap();
    let matrix = QrSymbolEncoder.encode("HELLO", EcLevel::M).unwrap();
    assert!(markup.contains("xmlns=\"http://www.w3.org/2000/svg\""));
    assert!(markup.contains("width=\"400\" height=\"400\""));
    assert_eq!(markup.matches("<rect x=").count(), matrix.dark_count());
}
