//! The request pipeline: validate, encode the symbol, render, encode output.

use core::str::FromStr;

use log::debug;

use crate::config::{GenerateRequest, Limits, OutputFormat, RenderConfig};
use crate::error::{Error, Result};
use crate::matrix::{QrSymbolEncoder, SymbolEncoder};
use crate::output::{encode, RenderedImage, ResponsePayload, TransportMode};
use crate::raster::render_image;
use crate::svg::to_svg_string;

/// How PNG and SVG results are delivered; fixed per deployment.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Delivery {
    /// PNG as a data URI and SVG as a markup string inside a JSON object.
    #[default]
    Json,
    /// PNG and SVG as raw bodies with their content type.
    Raw,
}

impl FromStr for Delivery {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Delivery::Json),
            "raw" => Ok(Delivery::Raw),
            _ => Err(Error::Validation(format!("Invalid delivery \"{}\": expected json or raw.", s))),
        }
    }
}

/// A finished request: the effective configuration and the encoded payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Generated {
    pub config: RenderConfig,
    pub payload: ResponsePayload,
}

/// Runs requests end to end. Holds no per-request state, so one instance can
/// serve any number of threads at once.
#[derive(Clone, Debug, Default)]
pub struct Generator<E = QrSymbolEncoder> {
    encoder: E,
    limits: Limits,
    delivery: Delivery,
}

impl Generator<QrSymbolEncoder> {
    pub fn new(limits: Limits, delivery: Delivery) -> Self {
        Generator::with_encoder(QrSymbolEncoder, limits, delivery)
    }
}

impl<E: SymbolEncoder> Generator<E> {
    pub fn with_encoder(encoder: E, limits: Limits, delivery: Delivery) -> Self {
        Generator { encoder, limits, delivery }
    }

    pub fn delivery(&self) -> Delivery {
        self.delivery
    }

    /// Validates an inbound request and produces its payload.
    ///
    /// # Example
    ///
    /// ```rust
    /// use qrstyle::config::{GenerateRequest, Limits};
    /// use qrstyle::engine::{Delivery, Generator};
    /// use qrstyle::output::ResponsePayload;
    ///
    /// let generator = Generator::new(Limits::default(), Delivery::Json);
    /// let request = GenerateRequest { text: Some("HELLO".into()), ..Default::default() };
    /// let generated = generator.generate(request).unwrap();
    /// assert!(matches!(generated.payload, ResponsePayload::DataUri(_)));
    /// ```
    pub fn generate(&self, request: GenerateRequest) -> Result<Generated> {
        let (text, config) = request.into_parts(&self.limits)?;
        let payload = self.generate_with(&text, &config)?;
        Ok(Generated { config, payload })
    }

    /// Produces the payload for already-validated parts.
    pub fn generate_with(&self, text: &str, config: &RenderConfig) -> Result<ResponsePayload> {
        let image = self.render(text, config)?;
        let mode = self.transport_mode(config.format);
        debug!("encoding {}px {} as {:?}", image.size(), image.kind().media_type(), mode);
        encode(&image, mode)
    }

    /// Encodes `text` and renders it in the representation `config.format` needs.
    pub fn render(&self, text: &str, config: &RenderConfig) -> Result<RenderedImage> {
        if text.is_empty() {
            return Err(Error::Validation("Missing \"text\" parameter in request body.".into()));
        }
        config.validate(&self.limits)?;
        let matrix = self.encoder.encode(text, config.error_level)?;
        matrix.check(self.limits.max_matrix_size)?;
        debug!(
            "encoded {} bytes into a {}x{} matrix at level {:?}",
            text.len(),
            matrix.size(),
            matrix.size(),
            config.error_level
        );
        match config.format {
            OutputFormat::Png | OutputFormat::Pdf => Ok(RenderedImage::Raster(render_image(&matrix, config)?)),
            OutputFormat::Svg => Ok(RenderedImage::Vector {
                size: config.pixel_size,
                markup: to_svg_string(&matrix, config)?,
            }),
        }
    }

    /// The transport mode this deployment uses for `format`.
    pub fn transport_mode(&self, format: OutputFormat) -> TransportMode {
        match (format, self.delivery) {
            (OutputFormat::Pdf, _) => TransportMode::EmbeddedDocument,
            (OutputFormat::Png, Delivery::Json) => TransportMode::InlineDataUri,
            (OutputFormat::Png, Delivery::Raw) | (OutputFormat::Svg, _) => TransportMode::RawBytes,
        }
    }
}
