//! # qrstyle
//!
//! Styled QR code rendering behind a small HTTP API.
//!
//! `qrstyle` turns text into a QR code image with cosmetic styling that keeps
//! the symbol scannable: finder patterns ("eyes") are drawn as softly rounded
//! squares, data modules as dots, with arbitrary foreground and background
//! colours and an exact output size. Symbol encoding itself (segments,
//! Reed-Solomon, masking) is delegated to the `qrcode` crate.
//!
//! ## Features
//!
//! - Render as anti-aliased PNG (`plain` squares or `dotted` style).
//! - Render as SVG markup with one square per dark module.
//! - Wrap the raster in a single-page PDF sized to the image.
//! - Deliver as a base64 data URI, raw bytes, or a PDF attachment.
//! - Bounded allocation: pixel size and matrix size are capped before drawing.
//!
//! ## Example
//!
//! Render a dotted PNG:
//!
//! ```rust
//! use qrstyle::config::{EcLevel, RenderConfig, Style};
//! use qrstyle::matrix::{QrSymbolEncoder, SymbolEncoder};
//! use qrstyle::raster::render_image;
//!
//! let matrix = QrSymbolEncoder.encode("https://example.com", EcLevel::H).unwrap();
//! let config = RenderConfig { pixel_size: 512, style: Style::Dotted, ..RenderConfig::default() };
//! let img = render_image(&matrix, &config).unwrap();
//! assert_eq!(img.dimensions(), (512, 512));
//! ```
//!
//! Run a whole request through the pipeline:
//!
//! ```rust
//! use qrstyle::config::{GenerateRequest, Limits};
//! use qrstyle::engine::{Delivery, Generator};
//!
//! let generator = Generator::new(Limits::default(), Delivery::Raw);
//! let request: GenerateRequest =
//!     serde_json::from_str(r#"{"text":"HELLO","format":"svg","size":300}"#).unwrap();
//! let generated = generator.generate(request).unwrap();
//! assert_eq!(generated.config.pixel_size, 300);
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Request fields, defaults and limits.
//! - [`matrix`]: Module grid and the symbol encoder boundary.
//! - [`eye`]: Finder pattern classification.
//! - [`geometry`]: Per-module primitive layout.
//! - [`raster`] / [`svg`]: PNG and SVG renderers.
//! - [`output`] / [`document`]: Data URI, raw and PDF encodings.
//! - [`engine`]: The end-to-end request pipeline.
//! - [`server`]: HTTP transport.

#![forbid(unsafe_code)]

pub mod canvas;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod eye;
pub mod geometry;
pub mod matrix;
pub mod output;
pub mod raster;
pub mod server;
pub mod svg;

pub use config::{Color, EcLevel, OutputFormat, RenderConfig, Style};
pub use engine::{Delivery, Generator};
pub use error::{Error, Result};
pub use matrix::{ModuleMatrix, QrSymbolEncoder, SymbolEncoder};
