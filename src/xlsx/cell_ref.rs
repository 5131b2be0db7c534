//! Cell and range reference decoding.
//!
//! Columns are written as bijective base-26 letters (`A`..`Z`, `AA`..`ZZ`,
//! `AAA`..`XFD`) and rows as decimal numbers. Both are 1-indexed here, and 0
//! means "absent".

use std::fmt;

/// Number of columns a worksheet can hold (`XFD`).
pub const MAX_COLUMNS: u32 = 16_384;

/// Number of rows a worksheet can hold.
pub const MAX_ROWS: u32 = 1_048_576;

/// A decoded `(column, row)` coordinate, both 1-indexed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    /// Column number, `A` = 1; 0 if the reference had no letters
    pub col: u32,
    /// Row number; 0 if the reference had no digits
    pub row: u32,
}

impl CellRef {
    /// Create a reference from 1-indexed column and row numbers.
    pub const fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_name(self.col), self.row)
    }
}

/// Decode a cell reference such as `"C3"` or `"AB67"`.
///
/// Leading letters (either case) form the column; the digits that follow form
/// the row. Anything after the digits is ignored. A reference with no leading
/// letters has column 0, one with no digits has row 0.
pub fn decode_cell_ref(s: &str) -> CellRef {
    let bytes = s.as_bytes();
    let mut pos = 0;

    let mut col: u32 = 0;
    while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
        let digit = u32::from(bytes[pos].to_ascii_uppercase() - b'A') + 1;
        col = col.saturating_mul(26).saturating_add(digit);
        pos += 1;
    }

    let mut row: u32 = 0;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        row = row
            .saturating_mul(10)
            .saturating_add(u32::from(bytes[pos] - b'0'));
        pos += 1;
    }

    CellRef { col, row }
}

/// Decode the far corner of a range such as `"A1:C3"`.
///
/// Only the part after the colon matters: it is the extent of the used area.
/// A single-cell range (`"B2"`) decodes as that cell.
pub fn decode_range_ref(s: &str) -> CellRef {
    match s.split_once(':') {
        Some((_, end)) => decode_cell_ref(end),
        None => decode_cell_ref(s),
    }
}

/// Column letters for a 1-indexed column number (`1` → `"A"`, `28` → `"AB"`).
///
/// Column 0 has no name and yields an empty string.
pub fn column_name(mut col: u32) -> String {
    let mut letters = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        letters.push(b'A' + rem as u8);
        col = (col - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}
