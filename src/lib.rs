//! # xlcsv
//!
//! Streaming conversion of Excel (.xlsx) worksheets to CSV.
//!
//! A worksheet is read as a stream of XML events and written out row by row,
//! so memory use does not grow with the size of the sheet. Missing cells are
//! filled with empty fields and every row has the width declared by the
//! sheet's dimension.
//!
//! ## Quick Start
//!
//! ```no_run
//! use xlcsv::SheetSelector;
//!
//! // First worksheet to a string
//! let csv = xlcsv::to_csv_string("book.xlsx")?;
//! print!("{}", csv);
//!
//! // A named sheet straight into a file
//! let out = std::io::BufWriter::new(std::fs::File::create("q3.csv")?);
//! let summary = xlcsv::convert_file("book.xlsx", &SheetSelector::Name("Q3".into()), out)?;
//! println!("{} rows", summary.rows);
//! # Ok::<(), xlcsv::Error>(())
//! ```
//!
//! ## Options
//!
//! ```no_run
//! use xlcsv::csv::{CsvOptions, LineTerminator, QuoteStyle};
//! use xlcsv::xlsx::{SheetSelector, XlsxConverter};
//!
//! let options = CsvOptions::new()
//!     .with_delimiter(b'\t')
//!     .with_quote_style(QuoteStyle::Always)
//!     .with_line_terminator(LineTerminator::Lf);
//! let converter = XlsxConverter::open("book.xlsx")?.with_options(options);
//! let tsv = converter.convert_to_string(&SheetSelector::Number(2))?;
//! # Ok::<(), xlcsv::Error>(())
//! ```

pub mod container;
pub mod csv;
pub mod detect;
pub mod error;
pub mod xlsx;
pub mod xml;

// Re-exports
pub use container::{OoxmlContainer, Relationship, Relationships};
pub use csv::{CsvOptions, LineTerminator, QuoteStyle};
pub use detect::{detect_format_from_bytes, FormatType};
pub use error::{Error, Result};
pub use xlsx::{ConvertSummary, SheetInfo, SheetSelector, XlsxConverter};

use std::io::Write;
use std::path::Path;

/// Convert one worksheet of a workbook file with default CSV options.
///
/// # Example
///
/// ```no_run
/// use xlcsv::{convert_file, SheetSelector};
///
/// let stdout = std::io::stdout();
/// convert_file("book.xlsx", &SheetSelector::default(), stdout.lock())?;
/// # Ok::<(), xlcsv::Error>(())
/// ```
pub fn convert_file<W: Write>(
    path: impl AsRef<Path>,
    selector: &SheetSelector,
    out: W,
) -> Result<ConvertSummary> {
    XlsxConverter::open(path)?.convert(selector, out)
}

/// Convert one worksheet of an in-memory workbook with default CSV options.
pub fn convert_bytes<W: Write>(
    data: &[u8],
    selector: &SheetSelector,
    out: W,
) -> Result<ConvertSummary> {
    XlsxConverter::from_bytes(data.to_vec())?.convert(selector, out)
}

/// Convert the first worksheet of a workbook file to a CSV string.
pub fn to_csv_string(path: impl AsRef<Path>) -> Result<String> {
    XlsxConverter::open(path)?.convert_to_string(&SheetSelector::default())
}

/// List the sheets of a workbook file.
///
/// # Example
///
/// ```no_run
/// for sheet in xlcsv::list_sheets("book.xlsx")? {
///     println!("{}\t{}", sheet.position, sheet.name);
/// }
/// # Ok::<(), xlcsv::Error>(())
/// ```
pub fn list_sheets(path: impl AsRef<Path>) -> Result<Vec<SheetInfo>> {
    XlsxConverter::open(path)?.sheets()
}
