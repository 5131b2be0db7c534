//! Error types for the xlcsv library.

use std::io;
use thiserror::Error;

/// Result type alias for xlcsv operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting a worksheet.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while reading the package or writing CSV output.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not a ZIP-based Office package.
    #[error("Unknown file format")]
    UnknownFormat,

    /// The package is an Office document, but not a spreadsheet.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Error reading ZIP archive.
    #[error("ZIP archive error: {0}")]
    ZipArchive(String),

    /// A package part is not well-formed XML.
    #[error("Malformed document {part} at line {line}, column {column}: {message}")]
    MalformedDocument {
        /// Entry name inside the package
        part: String,
        /// 1-based line of the error
        line: usize,
        /// 1-based byte column of the error
        column: usize,
        /// Tokenizer message
        message: String,
    },

    /// A required package entry is missing.
    #[error("Missing component: {0}")]
    MissingComponent(String),

    /// No sheet with the requested name exists in the workbook.
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// A cell refers to a shared string past the end of the table.
    #[error("Shared string index {index} out of range (table has {len} entries)")]
    SharedStringIndexOutOfRange {
        /// Index found in the cell
        index: usize,
        /// Number of entries in the table
        len: usize,
    },

    /// A cell refers to the shared string table, but the package has none.
    #[error("Cell {cell} refers to a shared string, but the package has no shared string table")]
    MissingSharedStrings {
        /// Reference of the offending cell (e.g. "B7")
        cell: String,
    },

    /// Cell text is longer than a spreadsheet cell can hold.
    #[error("Cell text in {part} exceeds {limit} characters")]
    CellTooLong {
        /// Entry name inside the package
        part: String,
        /// Maximum number of characters
        limit: usize,
    },

    /// Invalid or malformed data in the document.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Conversion options are inconsistent.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipArchive(err.to_string())
    }
}
