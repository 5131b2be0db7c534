//! Streaming worksheet-to-CSV interpreter.
//!
//! A worksheet stores only the cells that hold something, each tagged with
//! its reference:
//!
//! ```xml
//! <worksheet>                     <!-- depth 0 -->
//!   <dimension ref="A1:C3"/>      <!-- depth 1 -->
//!   <sheetData>                   <!-- depth 1 -->
//!     <row r="2">                 <!-- depth 2 -->
//!       <c r="A2" t="s">          <!-- depth 3 -->
//!         <v>3</v>                <!-- depth 4 -->
//!       </c>
//!       <c r="C2" t="s"><v>3</v></c>
//!     </row>
//!   </sheetData>
//! </worksheet>
//! ```
//!
//! No tree is built. The dispatcher keeps a nesting depth and acts on
//! `(depth, name)` pairs, so memory stays at one cell's worth of state no
//! matter how large the sheet is. Missing cells inside a row are written as
//! empty fields and every row is padded to the width of the `dimension`.
//! Rows that are absent from the sheet are not reconstructed.

use std::io::Write;

use crate::csv::CsvWriter;
use crate::error::{Error, Result};
use crate::xml::{Attributes, EventSource, XmlEvent};

use super::cell_ref::{decode_cell_ref, decode_range_ref, CellRef, MAX_COLUMNS, MAX_ROWS};
use super::shared_strings::SharedStrings;
use super::text::CellText;
use super::value::{resolve_value, CellKind};

/// Declared extent of a worksheet's used area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dimension {
    /// Last used column (1-indexed); every CSV row has this many fields
    pub max_col: u32,
    /// Last used row (1-indexed)
    pub max_row: u32,
}

/// What a worksheet pass produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorksheetSummary {
    /// Declared dimension, if the sheet had one
    pub dimension: Option<Dimension>,
    /// Rows written
    pub rows: usize,
    /// Cells dropped because they were out of order or outside the dimension
    pub skipped_cells: usize,
}

/// Mutable state of one worksheet pass.
#[derive(Debug, Default)]
struct ParseState {
    depth: usize,
    dimension: Option<Dimension>,
    row: u32,
    cell: CellRef,
    expected_col: u32,
    kind: CellKind,
    cell_active: bool,
    value_written: bool,
    capturing: bool,
    in_inline: bool,
    in_inline_run: bool,
    text: CellText,
    warned_missing_dimension: bool,
    skipped_cells: usize,
}

/// Drives a [`CsvWriter`] from the events of one worksheet.
pub struct WorksheetDispatcher<'t, W: Write> {
    state: ParseState,
    table: Option<&'t SharedStrings>,
    csv: CsvWriter<W>,
    part: String,
}

impl<'t, W: Write> WorksheetDispatcher<'t, W> {
    /// Create a dispatcher writing to `csv`, resolving shared strings from
    /// `table` (which is `None` when the package has no table).
    pub fn new(part: impl Into<String>, table: Option<&'t SharedStrings>, csv: CsvWriter<W>) -> Self {
        Self {
            state: ParseState {
                expected_col: 1,
                ..ParseState::default()
            },
            table,
            csv,
            part: part.into(),
        }
    }

    /// Feed one event.
    pub fn dispatch(&mut self, event: XmlEvent<'_>) -> Result<()> {
        match event {
            XmlEvent::Open { name, attributes } => {
                let depth = self.state.depth;
                self.state.depth += 1;
                self.open(depth, name, attributes)
            }
            XmlEvent::Close { name } => {
                self.state.depth = self.state.depth.saturating_sub(1);
                self.close(self.state.depth, name)
            }
            XmlEvent::Text(fragment) => {
                if self.state.capturing && self.state.text.push(fragment).is_err() {
                    return Err(Error::CellTooLong {
                        part: self.part.clone(),
                        limit: self.state.text.limit(),
                    });
                }
                Ok(())
            }
            XmlEvent::Eof => Ok(()),
        }
    }

    fn open(&mut self, depth: usize, name: &str, attributes: Attributes<'_>) -> Result<()> {
        match (depth, name) {
            (1, "dimension") => {
                if let Some(range) = attributes.get("ref") {
                    self.set_dimension(range);
                }
            }
            (2, "row") => {
                self.state.row = attributes
                    .get("r")
                    .and_then(|r| r.trim().parse().ok())
                    .unwrap_or(self.state.row.saturating_add(1));
                self.state.expected_col = 1;
                self.state.cell_active = false;
            }
            (3, "c") => self.open_cell(attributes)?,
            (4, "v") if self.state.cell_active => {
                self.state.text.clear();
                self.state.capturing = true;
            }
            (4, "is") if self.state.cell_active => {
                self.state.text.clear();
                self.state.in_inline = true;
            }
            (5, "t") if self.state.in_inline => self.state.capturing = true,
            (5, "r") if self.state.in_inline => self.state.in_inline_run = true,
            (6, "t") if self.state.in_inline_run => self.state.capturing = true,
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, depth: usize, name: &str) -> Result<()> {
        match (depth, name) {
            (4, "v") if self.state.capturing => {
                self.state.capturing = false;
                if !self.state.value_written {
                    let value = resolve_value(
                        self.state.text.as_str(),
                        self.state.kind,
                        self.table,
                        self.state.cell,
                    )?;
                    self.csv.write_value(value)?;
                    self.state.value_written = true;
                }
            }
            (5, "t") | (6, "t") => self.state.capturing = false,
            (5, "r") => self.state.in_inline_run = false,
            (4, "is") if self.state.in_inline => {
                self.state.in_inline = false;
                self.state.capturing = false;
                if !self.state.value_written {
                    self.csv.write_value(self.state.text.as_str())?;
                    self.state.value_written = true;
                }
            }
            (3, "c") => {
                if self.state.cell_active && !self.state.value_written {
                    self.csv.write_empty(1)?;
                }
                self.state.cell_active = false;
                self.state.capturing = false;
                self.state.in_inline = false;
            }
            (2, "row") => self.end_row()?,
            _ => {}
        }
        Ok(())
    }

    fn set_dimension(&mut self, range: &str) {
        let end = decode_range_ref(range);
        let mut max_col = end.col;
        let mut max_row = end.row;
        if max_col > MAX_COLUMNS {
            log::warn!(
                "{}: dimension {} has more than the maximum number of columns ({} > {}), clamping",
                self.part,
                range,
                max_col,
                MAX_COLUMNS
            );
            max_col = MAX_COLUMNS;
        }
        if max_row > MAX_ROWS {
            log::warn!(
                "{}: dimension {} has more than the maximum number of rows ({} > {}), clamping",
                self.part,
                range,
                max_row,
                MAX_ROWS
            );
            max_row = MAX_ROWS;
        }
        log::debug!("{}: dimension {} -> {} columns", self.part, range, max_col);
        self.state.dimension = Some(Dimension { max_col, max_row });
    }

    fn open_cell(&mut self, attributes: Attributes<'_>) -> Result<()> {
        let state = &mut self.state;
        state.kind = CellKind::from_type_attr(attributes.get("t"));
        state.value_written = false;
        state.capturing = false;
        state.in_inline = false;
        state.in_inline_run = false;

        let reference = attributes.get("r");
        let cell = match reference {
            Some(r) => decode_cell_ref(r),
            None => CellRef::new(state.expected_col, state.row),
        };

        let max_col = state.dimension.map(|d| d.max_col);
        let in_order = cell.col != 0 && cell.col >= state.expected_col;
        let in_grid = max_col.is_none_or(|max| cell.col <= max);

        if in_order {
            // Fill the gap since the previous cell, but never past the grid.
            let gap_end = match max_col {
                Some(max) => cell.col.min(max.saturating_add(1)),
                None => cell.col,
            };
            if gap_end > state.expected_col {
                self.csv.write_empty(gap_end - state.expected_col)?;
            }
            state.expected_col = cell.col.saturating_add(1);
        }

        if in_order && in_grid {
            state.cell = cell;
            state.cell_active = true;
        } else {
            state.cell_active = false;
            state.skipped_cells += 1;
            log::warn!(
                "{}: skipping cell {} in row {} ({})",
                self.part,
                reference.unwrap_or("<no reference>"),
                state.row,
                if in_order {
                    "outside the declared dimension"
                } else {
                    "column out of order"
                }
            );
        }
        Ok(())
    }

    fn end_row(&mut self) -> Result<()> {
        let width = match self.state.dimension {
            Some(d) => d.max_col,
            None => {
                if !self.state.warned_missing_dimension {
                    log::warn!(
                        "{}: no dimension declared, rows are not padded to a common width",
                        self.part
                    );
                    self.state.warned_missing_dimension = true;
                }
                0
            }
        };
        self.csv.end_row(width)?;
        self.state.cell_active = false;
        Ok(())
    }

    /// Finish the pass, flushing output.
    pub fn finish(mut self) -> Result<(W, WorksheetSummary)> {
        self.csv.flush()?;
        let summary = WorksheetSummary {
            dimension: self.state.dimension,
            rows: self.csv.rows_written(),
            skipped_cells: self.state.skipped_cells,
        };
        Ok((self.csv.into_inner(), summary))
    }
}

/// Convert one worksheet event stream into CSV rows.
pub fn convert_worksheet<S, W>(
    source: &mut S,
    table: Option<&SharedStrings>,
    csv: CsvWriter<W>,
) -> Result<(W, WorksheetSummary)>
where
    S: EventSource + ?Sized,
    W: Write,
{
    let mut dispatcher = WorksheetDispatcher::new(source.part().to_string(), table, csv);
    loop {
        let event = source.next_event()?;
        if matches!(event, XmlEvent::Eof) {
            break;
        }
        dispatcher.dispatch(event)?;
    }
    let (out, summary) = dispatcher.finish()?;
    log::debug!(
        "{}: wrote {} rows, skipped {} cells",
        source.part(),
        summary.rows,
        summary.skipped_cells
    );
    Ok((out, summary))
}
