//! HTTP transport around the [`Generator`].
//!
//! Routing is a pure function of `(method, path, body)` ([`handle`]) so it can
//! be exercised without sockets; [`QrServer`] only moves bytes between
//! `tiny_http` and that function.

use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;

use anyhow::{anyhow, Context};
use log::{error, info, warn};
use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use crate::config::{GenerateRequest, OutputFormat};
use crate::engine::{Delivery, Generator};
use crate::error::Error;
use crate::matrix::SymbolEncoder;
use crate::output::ResponsePayload;

/// Body of `GET /`.
pub const HEALTH_MESSAGE: &str = "Custom QR API - Status: Online";
/// Largest accepted request body by default.
pub const DEFAULT_MAX_BODY: usize = 64 * 1024;

const PNG_INSTRUCTIONS: &str = "Use the data string directly in an <img src='...'> tag.";
const JSON: &str = "application/json";

/// Listener settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Threads pulling requests off the listener.
    pub workers: usize,
    pub max_body: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            workers: num_cpus::get(),
            max_body: DEFAULT_MAX_BODY,
        }
    }
}

/// A transport-neutral HTTP answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
    /// `Content-Disposition: attachment` filename, if any.
    pub attachment: Option<String>,
    /// Answer to a CORS preflight.
    pub preflight: bool,
}

impl Reply {
    fn new(status: u16, content_type: &str, body: Vec<u8>) -> Self {
        Reply {
            status,
            content_type: content_type.to_string(),
            body,
            attachment: None,
            preflight: false,
        }
    }

    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Reply::new(status, JSON, body),
            Err(e) => Reply::error(&Error::Encode(e.to_string())),
        }
    }

    /// The JSON error body `{success: false, error, details}`.
    pub fn error(err: &Error) -> Self {
        Reply::failure(err.status(), err.category(), err.to_string())
    }

    fn failure(status: u16, category: &str, details: String) -> Self {
        let body = ErrorBody { success: false, error: category, details };
        // Serializing plain strings cannot fail.
        Reply::new(status, JSON, serde_json::to_vec(&body).unwrap_or_default())
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: &'a str,
    details: String,
}

#[derive(Serialize)]
struct PngBody<'a> {
    success: bool,
    format: &'a str,
    size: String,
    data: String,
    instructions: &'a str,
}

#[derive(Serialize)]
struct SvgBody<'a> {
    success: bool,
    format: &'a str,
    size: u32,
    data: String,
}

/// Routes one request.
///
/// * `GET /` answers the health check.
/// * `POST /generate` renders the JSON body.
/// * `OPTIONS` on any path answers the CORS preflight.
pub fn handle<E: SymbolEncoder>(generator: &Generator<E>, method: &Method, path: &str, body: &[u8]) -> Reply {
    let path = path.split('?').next().unwrap_or(path);
    match (method, path) {
        (Method::Options, _) => Reply {
            preflight: true,
            ..Reply::new(204, "text/plain", Vec::new())
        },
        (Method::Get, "/") | (Method::Head, "/") => {
            Reply::new(200, "text/plain; charset=utf-8", HEALTH_MESSAGE.as_bytes().to_vec())
        }
        (Method::Post, "/generate") => generate(generator, body),
        (_, "/generate") | (_, "/") => Reply::failure(405, "method_not_allowed", format!("{} is not allowed on {}", method, path)),
        _ => Reply::failure(404, "not_found", format!("No route for {} {}", method, path)),
    }
}

fn generate<E: SymbolEncoder>(generator: &Generator<E>, body: &[u8]) -> Reply {
    let request: GenerateRequest = if body.iter().all(u8::is_ascii_whitespace) {
        GenerateRequest::default()
    } else {
        match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(e) => return Reply::error(&Error::Validation(format!("Invalid JSON body: {}", e))),
        }
    };

    let generated = match generator.generate(request) {
        Ok(generated) => generated,
        Err(err) => {
            if err.is_client_error() {
                warn!("rejected request: {}", err);
            } else {
                error!("QR generation failed: {}", err);
            }
            return Reply::error(&err);
        }
    };

    let size = generated.config.pixel_size;
    match (generated.config.format, generated.payload) {
        (OutputFormat::Png, ResponsePayload::DataUri(data)) => Reply::json(
            200,
            &PngBody {
                success: true,
                format: "png",
                size: format!("{}x{}", size, size),
                data,
                instructions: PNG_INSTRUCTIONS,
            },
        ),
        (OutputFormat::Svg, ResponsePayload::Raw { body, .. }) if generator.delivery() == Delivery::Json => {
            match String::from_utf8(body) {
                Ok(data) => Reply::json(200, &SvgBody { success: true, format: "svg", size, data }),
                Err(e) => Reply::error(&Error::Encode(e.to_string())),
            }
        }
        (_, ResponsePayload::Raw { media_type, body, filename }) => Reply {
            attachment: Some(filename),
            ..Reply::new(200, media_type, body)
        },
        (format, ResponsePayload::DataUri(_)) => Reply::error(&Error::Encode(format!(
            "no inline delivery for {}",
            format.name()
        ))),
    }
}

/// A bound listener plus its worker threads.
pub struct QrServer {
    server: Arc<Server>,
    config: ServerConfig,
}

impl QrServer {
    /// Binds `host:port`; port 0 picks a free port.
    pub fn bind(config: ServerConfig) -> anyhow::Result<Self> {
        let addr = format!("{}:{}", config.host, config.port);
        let server = Server::http(&addr).map_err(|e| anyhow!("cannot listen on {}: {}", addr, e))?;
        Ok(QrServer { server: Arc::new(server), config })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Serves requests on `config.workers` threads until the listener fails.
    pub fn run<E>(self, generator: Generator<E>) -> anyhow::Result<()>
    where
        E: SymbolEncoder + Send + Sync + 'static,
    {
        let generator = Arc::new(generator);
        let workers = self.config.workers.max(1);
        info!(
            "QR Code Generator API running on {:?} with {} workers",
            self.local_addr(),
            workers
        );

        let handles = (0..workers)
            .map(|i| {
                let server = Arc::clone(&self.server);
                let generator = Arc::clone(&generator);
                let max_body = self.config.max_body;
                thread::Builder::new()
                    .name(format!("qr-worker-{}", i))
                    .spawn(move || {
                        for request in server.incoming_requests() {
                            serve_one(&generator, request, max_body);
                        }
                    })
                    .context("cannot spawn worker thread")
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        for worker in handles {
            if worker.join().is_err() {
                error!("worker thread panicked");
            }
        }
        Ok(())
    }
}

fn serve_one<E: SymbolEncoder>(generator: &Generator<E>, mut request: Request, max_body: usize) {
    let method = request.method().clone();
    let path = request.url().to_string();

    let reply = match read_body(request.as_reader(), max_body) {
        Ok(body) => handle(generator, &method, &path, &body),
        Err(reply) => reply,
    };

    info!("{} {} -> {} ({} bytes)", method, path, reply.status, reply.body.len());
    if let Err(e) = request.respond(to_response(reply)) {
        warn!("failed to send response for {} {}: {}", method, path, e);
    }
}

// Reads at most `max_body` bytes; anything longer is answered with 413.
fn read_body<R: Read>(reader: R, max_body: usize) -> Result<Vec<u8>, Reply> {
    let mut body = Vec::new();
    match reader.take(max_body as u64 + 1).read_to_end(&mut body) {
        Err(e) => Err(Reply::failure(400, "validation_error", format!("Cannot read request body: {}", e))),
        Ok(_) if body.len() > max_body => Err(Reply::failure(
            413,
            "validation_error",
            format!("Request body exceeds {} bytes.", max_body),
        )),
        Ok(_) => Ok(body),
    }
}

fn to_response(reply: Reply) -> Response<std::io::Cursor<Vec<u8>>> {
    let mut headers = vec![
        header("Content-Type", &reply.content_type),
        header("Access-Control-Allow-Origin", "*"),
    ];
    if let Some(name) = &reply.attachment {
        headers.push(header("Content-Disposition", &format!("attachment; filename=\"{}\"", name)));
    }
    if reply.preflight {
        headers.push(header("Access-Control-Allow-Methods", "GET, POST, OPTIONS"));
        headers.push(header("Access-Control-Allow-Headers", "Content-Type"));
    }
    let mut response = Response::from_data(reply.body).with_status_code(StatusCode(reply.status));
    for h in headers.into_iter().flatten() {
        response.add_header(h);
    }
    response
}

fn header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Limits;
    use serde_json::Value;

    fn json_generator() -> Generator {
        Generator::new(Limits::default(), Delivery::Json)
    }

    fn body_json(reply: &Reply) -> Value {
        serde_json::from_slice(&reply.body).unwrap()
    }

    #[test]
    fn test_health() {
        let reply = handle(&json_generator(), &Method::Get, "/", b"");
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body, HEALTH_MESSAGE.as_bytes());
    }

    #[test]
    fn test_preflight() {
        let reply = handle(&json_generator(), &Method::Options, "/generate", b"");
        assert_eq!(reply.status, 204);
        assert!(reply.preflight);
    }

    #[test]
    fn test_png_json_shape() {
        let reply = handle(&json_generator(), &Method::Post, "/generate", br#"{"text":"HELLO"}"#);
        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type, JSON);
        let v = body_json(&reply);
        assert_eq!(v["success"], true);
        assert_eq!(v["format"], "png");
        assert_eq!(v["size"], "400x400");
        assert!(v["data"].as_str().unwrap().starts_with("data:image/png;base64,"));
        assert!(v["instructions"].is_string());
    }

    #[test]
    fn test_svg_json_shape() {
        let reply = handle(
            &json_generator(),
            &Method::Post,
            "/generate",
            br#"{"text":"HELLO","format":"svg","size":300}"#,
        );
        let v = body_json(&reply);
        assert_eq!(v["format"], "svg");
        assert_eq!(v["size"], 300);
        let markup = v["data"].as_str().unwrap();
        assert!(markup.contains("xmlns=\"http://www.w3.org/2000/svg\""));
    }

    #[test]
    fn test_raw_delivery() {
        let generator = Generator::new(Limits::default(), Delivery::Raw);
        let reply = handle(&generator, &Method::Post, "/generate", br#"{"text":"HELLO","format":"svg"}"#);
        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type, "image/svg+xml");
        assert_eq!(reply.attachment.as_deref(), Some("qrcode.svg"));
        assert!(reply.body.starts_with(b"<?xml"));

        let reply = handle(&generator, &Method::Post, "/generate", br#"{"text":"HELLO"}"#);
        assert_eq!(reply.content_type, "image/png");
        assert_eq!(reply.attachment.as_deref(), Some("qrcode.png"));
    }

    #[test]
    fn test_pdf_is_always_raw() {
        let reply = handle(&json_generator(), &Method::Post, "/generate", br#"{"text":"HELLO","format":"pdf"}"#);
        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type, "application/pdf");
        assert_eq!(reply.attachment.as_deref(), Some("qrcode.pdf"));
        assert!(reply.body.starts_with(b"%PDF"));
    }

    #[test]
    fn test_errors() {
        let generator = json_generator();
        let reply = handle(&generator, &Method::Post, "/generate", br##"{"color":"#fff"}"##);
        assert_eq!(reply.status, 400);
        let v = body_json(&reply);
        assert_eq!(v["success"], false);
        assert_eq!(v["error"], "validation_error");
        assert_eq!(v["details"], "Missing \"text\" parameter in request body.");

        assert_eq!(handle(&generator, &Method::Post, "/generate", b"{not json").status, 400);
        assert_eq!(handle(&generator, &Method::Post, "/generate", b"").status, 400);
        assert_eq!(handle(&generator, &Method::Get, "/generate", b"").status, 405);
        assert_eq!(handle(&generator, &Method::Get, "/nope", b"").status, 404);

        let long = format!(r#"{{"text":"{}","errorLevel":"H"}}"#, "x".repeat(5000));
        let reply = handle(&generator, &Method::Post, "/generate", long.as_bytes());
        assert_eq!(reply.status, 422);
        assert_eq!(body_json(&reply)["error"], "symbol_encoding_error");
    }

    #[test]
    fn test_body_limit() {
        assert_eq!(read_body(&b"12345"[..], 5).unwrap(), b"12345");
        let reply = read_body(&b"123456"[..], 5).unwrap_err();
        assert_eq!(reply.status, 413);
    }

    #[test]
    fn test_query_string_ignored() {
        let reply = handle(&json_generator(), &Method::Get, "/?probe=1", b"");
        assert_eq!(reply.status, 200);
    }
}
