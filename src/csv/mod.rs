//! CSV output.
//!
//! # Example
//!
//! ```
//! use xlcsv::csv::{CsvOptions, CsvWriter};
//!
//! let mut writer = CsvWriter::new(Vec::new(), CsvOptions::default());
//! writer.write_value("He said \"hi\"")?;
//! writer.end_row(3)?;
//! assert_eq!(writer.into_inner(), b"\"He said \"\"hi\"\"\",,\r\n");
//! # Ok::<(), std::io::Error>(())
//! ```

mod options;
mod writer;

pub use options::{parse_delimiter, CsvOptions, LineTerminator, QuoteStyle};
pub use writer::{needs_quotes, write_field, CsvWriter};
