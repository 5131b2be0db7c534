//! Row-oriented CSV emitter.

use std::io::{self, Write};

use super::options::{CsvOptions, QuoteStyle};

/// Whether a field has to be enclosed in double quotes.
///
/// True if it contains an ASCII control character (including CR, LF and
/// DEL), a double quote, or the delimiter.
pub fn needs_quotes(field: &str, delimiter: u8) -> bool {
    field
        .bytes()
        .any(|b| b < 0x20 || b == 0x7F || b == b'"' || b == delimiter)
}

/// Write `field` to `out`, quoting it if required.
pub fn write_field<W: Write + ?Sized>(
    out: &mut W,
    field: &str,
    delimiter: u8,
    quote_style: QuoteStyle,
) -> io::Result<()> {
    let quote = quote_style == QuoteStyle::Always || needs_quotes(field, delimiter);
    if !quote {
        return out.write_all(field.as_bytes());
    }

    out.write_all(b"\"")?;
    let mut pieces = field.split('"');
    if let Some(first) = pieces.next() {
        out.write_all(first.as_bytes())?;
    }
    for piece in pieces {
        out.write_all(b"\"\"")?;
        out.write_all(piece.as_bytes())?;
    }
    out.write_all(b"\"")
}

/// Writes rows of fields, inserting delimiters between them.
///
/// The writer counts the fields of the current row, so a row can be padded
/// to a fixed width when it ends.
pub struct CsvWriter<W: Write> {
    out: W,
    options: CsvOptions,
    fields_in_row: u32,
    rows: usize,
}

impl<W: Write> CsvWriter<W> {
    /// Create a writer with the given options.
    pub fn new(out: W, options: CsvOptions) -> Self {
        Self {
            out,
            options,
            fields_in_row: 0,
            rows: 0,
        }
    }

    fn separate(&mut self) -> io::Result<()> {
        if self.fields_in_row > 0 {
            self.out.write_all(&[self.options.delimiter])?;
        }
        self.fields_in_row += 1;
        Ok(())
    }

    /// Append a cell value to the current row.
    pub fn write_value(&mut self, value: &str) -> io::Result<()> {
        self.separate()?;
        write_field(
            &mut self.out,
            value,
            self.options.delimiter,
            self.options.quote_style,
        )
    }

    /// Append `count` empty fields to the current row.
    pub fn write_empty(&mut self, count: u32) -> io::Result<()> {
        for _ in 0..count {
            self.separate()?;
        }
        Ok(())
    }

    /// Pad the current row with empty fields up to `width` and terminate it.
    pub fn end_row(&mut self, width: u32) -> io::Result<()> {
        if self.fields_in_row < width {
            self.write_empty(width - self.fields_in_row)?;
        }
        self.out.write_all(self.options.line_terminator.as_bytes())?;
        self.fields_in_row = 0;
        self.rows += 1;
        Ok(())
    }

    /// Fields written to the current row so far.
    pub fn fields_in_row(&self) -> u32 {
        self.fields_in_row
    }

    /// Rows terminated so far.
    pub fn rows_written(&self) -> usize {
        self.rows
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}
