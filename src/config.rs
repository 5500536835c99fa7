//! Request-scoped render configuration.
//!
//! A [`RenderConfig`] is built fresh for every request from the inbound
//! [`GenerateRequest`] fields plus the named defaults below. Nothing here is
//! shared or mutated across requests.

use core::fmt;
use core::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Foreground used when the request has no `color`.
pub const DEFAULT_FOREGROUND: Color = Color::BLACK;
/// Background used when the request has no `bgColor`.
pub const DEFAULT_BACKGROUND: Color = Color::WHITE;
/// Output width and height in pixels when the request has no `size`.
pub const DEFAULT_PIXEL_SIZE: u32 = 400;
/// Quiet zone, in modules, drawn around the symbol.
pub const DEFAULT_MARGIN: u32 = 1;

/// Largest accepted `size`; the pixel surface grows with its square.
pub const MAX_PIXEL_SIZE: u32 = 4096;
/// Largest module grid a QR symbol can have (version 40).
pub const MAX_MATRIX_SIZE: usize = 177;
/// Largest accepted quiet zone.
pub const MAX_MARGIN: u32 = 16;

/// An RGBA colour parsed from `#RGB`, `#RRGGBB` or `#RRGGBBAA`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    /// Creates an opaque colour.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, a: 255 }
    }

    /// Parses a hex colour, with or without the leading `#`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for any other length or a non-hex digit.
    ///
    /// # Example
    ///
    /// ```rust
    /// use qrstyle::config::Color;
    ///
    /// assert_eq!(Color::parse_hex("#f80").unwrap(), Color::rgb(0xff, 0x88, 0x00));
    /// assert_eq!(Color::parse_hex("00000080").unwrap().a, 0x80);
    /// ```
    pub fn parse_hex(input: &str) -> Result<Self> {
        let hex = input.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let invalid = || Error::Validation(format!("Invalid color \"{}\": expected #RGB, #RRGGBB or #RRGGBBAA.", input));
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        match hex.len() {
            3 => {
                let digits: Vec<u8> = hex
                    .chars()
                    .filter_map(|c| c.to_digit(16))
                    .map(|d| (d as u8) * 17)
                    .collect();
                Ok(Color::rgb(digits[0], digits[1], digits[2]))
            }
            6 => Ok(Color::rgb(pair(0)?, pair(2)?, pair(4)?)),
            8 => Ok(Color { r: pair(0)?, g: pair(2)?, b: pair(4)?, a: pair(6)? }),
            _ => Err(invalid()),
        }
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Alpha as a fraction in `[0, 1]`.
    pub fn opacity(self) -> f32 {
        f32::from(self.a) / 255.0
    }

    pub fn is_opaque(self) -> bool {
        self.a == 255
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Color::parse_hex(s)
    }
}

/// Formats as `#rrggbb`; alpha is carried separately (see [`Color::opacity`]).
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// QR error correction level, forwarded untouched to the symbol encoder.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum EcLevel {
    /// ~7% of codewords recoverable.
    L,
    /// ~15% of codewords recoverable.
    #[default]
    M,
    /// ~25% of codewords recoverable.
    Q,
    /// ~30% of codewords recoverable.
    H,
}

impl FromStr for EcLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" => Ok(EcLevel::L),
            "M" => Ok(EcLevel::M),
            "Q" => Ok(EcLevel::Q),
            "H" => Ok(EcLevel::H),
            _ => Err(Error::Validation(format!(
                "Invalid errorLevel \"{}\": expected one of L, M, Q, H.",
                s
            ))),
        }
    }
}

/// Output encoding requested by the caller.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    /// PNG raster.
    #[default]
    Png,
    /// SVG markup.
    Svg,
    /// Single-page PDF embedding the PNG raster.
    Pdf,
}

impl OutputFormat {
    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
            OutputFormat::Pdf => "pdf",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" | "raster" => Ok(OutputFormat::Png),
            "svg" | "vector" => Ok(OutputFormat::Svg),
            "pdf" | "document" => Ok(OutputFormat::Pdf),
            _ => Err(Error::Validation(format!(
                "Invalid format \"{}\": expected one of png, svg, pdf.",
                s
            ))),
        }
    }
}

/// How dark modules are drawn in raster output.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Style {
    /// Every dark module is a square.
    Plain,
    /// Finder-pattern modules are rounded squares, data modules are dots.
    #[default]
    Dotted,
}

impl FromStr for Style {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" | "square" => Ok(Style::Plain),
            "dotted" | "dots" => Ok(Style::Dotted),
            _ => Err(Error::Validation(format!(
                "Invalid style \"{}\": expected plain or dotted.",
                s
            ))),
        }
    }
}

/// Upper bounds applied to untrusted input before any allocation happens.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Limits {
    pub max_pixel_size: u32,
    pub max_matrix_size: usize,
    pub max_margin: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_pixel_size: MAX_PIXEL_SIZE,
            max_matrix_size: MAX_MATRIX_SIZE,
            max_margin: MAX_MARGIN,
        }
    }
}

/// Validated parameters threaded through encoding, rendering and output.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RenderConfig {
    pub foreground: Color,
    pub background: Color,
    /// Output width and height in pixels (and PDF points).
    pub pixel_size: u32,
    pub error_level: EcLevel,
    pub format: OutputFormat,
    pub style: Style,
    /// Quiet zone in modules on every side of the symbol.
    pub margin: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            foreground: DEFAULT_FOREGROUND,
            background: DEFAULT_BACKGROUND,
            pixel_size: DEFAULT_PIXEL_SIZE,
            error_level: EcLevel::default(),
            format: OutputFormat::default(),
            style: Style::default(),
            margin: DEFAULT_MARGIN,
        }
    }
}

impl RenderConfig {
    /// Checks the size and margin against `limits`.
    pub fn validate(&self, limits: &Limits) -> Result<()> {
        if self.pixel_size == 0 {
            return Err(Error::Validation("Invalid size: must be a positive integer.".into()));
        }
        if self.pixel_size > limits.max_pixel_size {
            return Err(Error::Validation(format!(
                "Invalid size {}: must not exceed {}.",
                self.pixel_size, limits.max_pixel_size
            )));
        }
        if self.margin > limits.max_margin {
            return Err(Error::Validation(format!(
                "Invalid margin {}: must not exceed {}.",
                self.margin, limits.max_margin
            )));
        }
        Ok(())
    }
}

/// The inbound `/generate` body as it arrives on the wire.
///
/// Every field is optional here so that a missing `text` is reported as a
/// validation failure rather than a JSON parse failure.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct GenerateRequest {
    pub text: Option<String>,
    pub color: Option<String>,
    #[serde(rename = "bgColor")]
    pub bg_color: Option<String>,
    #[serde(rename = "errorLevel")]
    pub error_level: Option<String>,
    pub format: Option<String>,
    pub style: Option<String>,
    /// A number or a numeric string.
    pub size: Option<Value>,
    pub margin: Option<Value>,
}

impl GenerateRequest {
    /// Validates the request and splits it into the text to encode and the
    /// render configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when `text` is missing or empty, an enum
    /// value is unknown, a colour is malformed, or `size`/`margin` is out of
    /// range.
    pub fn into_parts(self, limits: &Limits) -> Result<(String, RenderConfig)> {
        let text = match self.text {
            Some(text) if !text.is_empty() => text,
            _ => return Err(Error::Validation("Missing \"text\" parameter in request body.".into())),
        };

        let mut config = RenderConfig::default();
        if let Some(color) = self.color.as_deref() {
            config.foreground = color.parse()?;
        }
        if let Some(color) = self.bg_color.as_deref() {
            config.background = color.parse()?;
        }
        if let Some(level) = self.error_level.as_deref() {
            config.error_level = level.parse()?;
        }
        if let Some(format) = self.format.as_deref() {
            config.format = format.parse()?;
        }
        if let Some(style) = self.style.as_deref() {
            config.style = style.parse()?;
        }
        if let Some(size) = self.size.as_ref() {
            config.pixel_size = parse_dimension("size", size)?;
        }
        if let Some(margin) = self.margin.as_ref() {
            config.margin = parse_dimension("margin", margin)?;
        }
        config.validate(limits)?;
        Ok((text, config))
    }
}

// Accepts 400, 400.0 and "400"; negative or non-numeric values are rejected.
fn parse_dimension(field: &str, value: &Value) -> Result<u32> {
    let invalid = || Error::Validation(format!("Invalid {}: must be a non-negative integer.", field));
    let number: i64 = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64).ok_or_else(invalid)?,
        },
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| invalid())?,
        _ => return Err(invalid()),
    };
    u32::try_from(number).map_err(|_| invalid())
}
