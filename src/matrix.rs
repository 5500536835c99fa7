//! The module grid and the symbol encoder that produces it.
//!
//! Turning text into modules (segment selection, Reed-Solomon codewords, mask
//! choice) is delegated to the `qrcode` crate behind the [`SymbolEncoder`]
//! trait; everything downstream only sees a [`ModuleMatrix`].

use crate::config::EcLevel;
use crate::error::{Error, Result};

/// A square grid of dark (`true`) and light (`false`) modules.
///
/// Immutable once built. A zero-sized matrix can be constructed so that a
/// degenerate encoder result reaches the renderers, which reject it with
/// [`Error::InvalidMatrix`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleMatrix {
    size: usize,
    modules: Vec<bool>,
}

impl ModuleMatrix {
    /// Builds a matrix from row-major modules.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMatrix`] if `modules.len() != size * size`.
    pub fn new(size: usize, modules: Vec<bool>) -> Result<Self> {
        let expected = size.checked_mul(size).ok_or_else(|| {
            Error::InvalidMatrix(format!("size {} overflows", size))
        })?;
        if modules.len() != expected {
            return Err(Error::InvalidMatrix(format!(
                "expected {} modules for a {}x{} grid, got {}",
                expected,
                size,
                size,
                modules.len()
            )));
        }
        Ok(ModuleMatrix { size, modules })
    }

    /// Builds a matrix from rows of `#` (dark) and anything else (light).
    pub fn from_rows(rows: &[&str]) -> Result<Self> {
        let size = rows.len();
        let mut modules = Vec::with_capacity(size * size);
        for row in rows {
            if row.chars().count() != size {
                return Err(Error::InvalidMatrix(format!("row \"{}\" is not {} modules wide", row, size)));
            }
            modules.extend(row.chars().map(|c| c == '#'));
        }
        ModuleMatrix::new(size, modules)
    }

    /// Modules per side.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the module at `(row, col)`; out-of-range coordinates are light.
    pub fn get(&self, row: usize, col: usize) -> bool {
        row < self.size && col < self.size && self.modules[row * self.size + col]
    }

    /// Number of dark modules.
    pub fn dark_count(&self) -> usize {
        self.modules.iter().filter(|&&m| m).count()
    }

    /// Iterates over `(row, col)` of every dark module in row-major order.
    pub fn dark_modules(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let size = self.size;
        self.modules
            .iter()
            .enumerate()
            .filter(|(_, dark)| **dark)
            .map(move |(i, _)| (i / size, i % size))
    }

    /// Fails with [`Error::InvalidMatrix`] for an empty grid and with
    /// [`Error::Validation`] for one larger than `max_size`.
    pub fn check(&self, max_size: usize) -> Result<()> {
        if self.size == 0 {
            return Err(Error::InvalidMatrix("matrix has no modules".into()));
        }
        if self.size > max_size {
            return Err(Error::Validation(format!(
                "QR matrix of {} modules exceeds the limit of {}.",
                self.size, max_size
            )));
        }
        Ok(())
    }
}

/// Turns text into a module matrix at a given error correction level.
pub trait SymbolEncoder {
    fn encode(&self, text: &str, level: EcLevel) -> Result<ModuleMatrix>;
}

/// [`SymbolEncoder`] backed by the `qrcode` crate (QR Code Model 2, versions 1-40).
#[derive(Copy, Clone, Debug, Default)]
pub struct QrSymbolEncoder;

impl SymbolEncoder for QrSymbolEncoder {
    fn encode(&self, text: &str, level: EcLevel) -> Result<ModuleMatrix> {
        let code = qrcode::QrCode::with_error_correction_level(text.as_bytes(), level.into())
            .map_err(|e| Error::Symbol(e.to_string()))?;
        let modules = code
            .to_colors()
            .into_iter()
            .map(|color| color == qrcode::Color::Dark)
            .collect();
        ModuleMatrix::new(code.width(), modules)
    }
}

impl From<EcLevel> for qrcode::EcLevel {
    fn from(level: EcLevel) -> Self {
        match level {
            EcLevel::L => qrcode::EcLevel::L,
            EcLevel::M => qrcode::EcLevel::M,
            EcLevel::Q => qrcode::EcLevel::Q,
            EcLevel::H => qrcode::EcLevel::H,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_length() {
        assert!(matches!(ModuleMatrix::new(3, vec![true; 8]), Err(Error::InvalidMatrix(_))));
        assert!(ModuleMatrix::new(3, vec![true; 9]).is_ok());
    }

    #[test]
    fn test_get_and_bounds() {
        let m = ModuleMatrix::from_rows(&["#.", ".#"]).unwrap();
        assert!(m.get(0, 0));
        assert!(!m.get(0, 1));
        assert!(m.get(1, 1));
        assert!(!m.get(2, 0));
        assert_eq!(m.dark_count(), 2);
        assert_eq!(m.dark_modules().collect::<Vec<_>>(), vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn test_check() {
        let empty = ModuleMatrix::new(0, Vec::new()).unwrap();
        assert!(matches!(empty.check(177), Err(Error::InvalidMatrix(_))));
        let m = ModuleMatrix::new(4, vec![false; 16]).unwrap();
        assert!(m.check(4).is_ok());
        assert!(matches!(m.check(3), Err(Error::Validation(_))));
    }

    #[test]
    fn test_encode_hello() {
        let m = QrSymbolEncoder.encode("HELLO", EcLevel::M).unwrap();
        // Version 1 symbol.
        assert_eq!(m.size(), 21);
        // Finder pattern corners are dark, the module inside the separator is light.
        assert!(m.get(0, 0));
        assert!(m.get(0, 20));
        assert!(m.get(20, 0));
        assert!(!m.get(7, 7));
    }

    #[test]
    fn test_encode_grows_with_text() {
        let small = QrSymbolEncoder.encode("hi", EcLevel::L).unwrap();
        let large = QrSymbolEncoder.encode(&"x".repeat(500), EcLevel::L).unwrap();
        assert!(large.size() > small.size());
        assert_eq!((large.size() - 17) % 4, 0);
    }

    #[test]
    fn test_encode_too_long() {
        let result = QrSymbolEncoder.encode(&"x".repeat(8000), EcLevel::H);
        assert!(matches!(result, Err(Error::Symbol(_))));
    }
}
