//! Cell and identifier normalization.
//!
//! Archive entry names and document `name` fields depend on the exact
//! transform order in [`safe_name`]: trim, collapse whitespace, strip, default.

use once_cell::sync::Lazy;
use pogkit_io::CellValue;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid pattern"));
static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9A-Za-z_\-\x{0400}-\x{04FF}]").expect("valid pattern"));

/// Trimmed text of a cell; empty cells and the token "nan" (any case) become "".
pub fn normalize_text(cell: &CellValue) -> String {
    normalize_str(&cell.to_string())
}

/// Same as [`normalize_text`], used for identifier columns.
pub fn normalize_id(cell: &CellValue) -> String {
    normalize_text(cell)
}

/// String form of [`normalize_text`].
pub fn normalize_str(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.eq_ignore_ascii_case("nan") {
        String::new()
    } else {
        trimmed.to_string()
    }
}

/// Filesystem/identifier-safe token. Returns `"file"` when nothing survives.
pub fn safe_name(s: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(s.trim(), "_");
    let stripped = DISALLOWED.replace_all(&collapsed, "");
    if stripped.is_empty() {
        "file".to_string()
    } else {
        stripped.into_owned()
    }
}
