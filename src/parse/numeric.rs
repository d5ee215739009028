//! Locale-aware numeric cell parsing.
//!
//! ARSO writes decimals with a comma (`"12,3"`) and leaves missing values
//! as blank or `&nbsp;` cells. Nothing here ever fails: unusable text is
//! simply `None`.

/// Parses a table cell into a number.
///
/// Returns `None` for missing, blank or non-numeric text. Only the first
/// comma is treated as a decimal separator; thousands separators are not
/// handled.
pub fn parse_numeric(text: Option<&str>) -> Option<f64> {
    let trimmed = text?.trim_matches(|c: char| c.is_whitespace() || c == '\u{a0}');
    if trimmed.is_empty() {
        return None;
    }

    let cleaned = trimmed.replacen(',', ".", 1);
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
