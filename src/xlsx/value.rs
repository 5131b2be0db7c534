//! Cell value resolution.

use crate::error::{Error, Result};

use super::cell_ref::CellRef;
use super::shared_strings::SharedStrings;

/// How a cell's `t` attribute says its value is stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CellKind {
    /// `t="s"`: the value is an index into the shared string table
    SharedString,
    /// `t="inlineStr"`: the text is stored in the cell's `is` element
    InlineString,
    /// Numbers, booleans, errors, dates and formula strings: stored as-is
    #[default]
    Raw,
}

impl CellKind {
    /// Classify the value of a cell's `t` attribute.
    pub fn from_type_attr(t: Option<&str>) -> Self {
        match t {
            Some("s") => CellKind::SharedString,
            Some("inlineStr") => CellKind::InlineString,
            _ => CellKind::Raw,
        }
    }
}

/// Turn captured cell text into the text that goes into the CSV field.
///
/// Shared-string cells are looked up in `table`; every other kind is returned
/// verbatim. Dates stay serial numbers and booleans stay `0`/`1`.
pub fn resolve_value<'v>(
    raw: &'v str,
    kind: CellKind,
    table: Option<&'v SharedStrings>,
    cell: CellRef,
) -> Result<&'v str> {
    if kind != CellKind::SharedString {
        return Ok(raw);
    }

    let table = table.ok_or_else(|| Error::MissingSharedStrings {
        cell: cell.to_string(),
    })?;

    let index: usize = raw
        .trim_matches(|c: char| c.is_ascii_whitespace())
        .parse()
        .map_err(|_| {
            Error::InvalidData(format!(
                "cell {} has shared string index {:?}, expected a non-negative integer",
                cell, raw
            ))
        })?;

    table.get(index).ok_or(Error::SharedStringIndexOutOfRange {
        index,
        len: table.len(),
    })
}
