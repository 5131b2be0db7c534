//! XLSX worksheet conversion.
//!
//! The pieces, bottom-up:
//!
//! - [`cell_ref`]: `A1`-style references to 1-indexed coordinates
//! - [`shared_strings`]: the workbook's string dictionary (pass 1)
//! - [`text`], [`value`]: bounded cell text and value resolution
//! - [`worksheet`]: the streaming worksheet interpreter (pass 2)
//! - [`workbook`]: the sheet catalogue and sheet selection
//! - [`XlsxConverter`]: ties the passes together
//!
//! # Example
//!
//! ```no_run
//! use xlcsv::xlsx::{SheetSelector, XlsxConverter};
//!
//! let converter = XlsxConverter::open("book.xlsx")?;
//! for sheet in converter.sheets()? {
//!     println!("{}: {}", sheet.position, sheet.name);
//! }
//!
//! let stdout = std::io::stdout();
//! converter.convert(&SheetSelector::Name("Summary".into()), stdout.lock())?;
//! # Ok::<(), xlcsv::Error>(())
//! ```

pub mod cell_ref;
mod converter;
pub mod shared_strings;
pub mod text;
pub mod value;
pub mod workbook;
pub mod worksheet;

pub use cell_ref::{column_name, decode_cell_ref, decode_range_ref, CellRef};
pub use converter::{ConvertSummary, XlsxConverter};
pub use shared_strings::SharedStrings;
pub use text::MAX_CELL_CHARS;
pub use workbook::{SheetInfo, SheetSelector};
pub use worksheet::{convert_worksheet, Dimension, WorksheetDispatcher, WorksheetSummary};
