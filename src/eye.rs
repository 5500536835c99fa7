//! Finder pattern ("eye") classification.

/// Side length of a finder pattern in modules.
pub const EYE_SIZE: usize = 7;

/// Returns whether `(row, col)` lies in one of the three 7x7 finder blocks.
///
/// Only the top-left, top-right and bottom-left corners carry finder
/// patterns; the bottom-right corner is never an eye. For grids smaller than
/// 14 modules the blocks overlap, which is fine since this is a disjunction.
///
/// # Example
///
/// ```rust
/// use qrstyle::eye::is_eye_cell;
///
/// assert!(is_eye_cell(0, 0, 21));
/// assert!(is_eye_cell(0, 20, 21));
/// assert!(is_eye_cell(20, 0, 21));
/// assert!(!is_eye_cell(20, 20, 21));
/// ```
pub fn is_eye_cell(row: usize, col: usize, size: usize) -> bool {
    let far = size.saturating_sub(EYE_SIZE);
    let top = row < EYE_SIZE;
    let left = col < EYE_SIZE;
    (top && left) || (top && col >= far) || (row >= far && left)
}
