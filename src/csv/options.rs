//! CSV output options.

use crate::error::{Error, Result};

/// When cell values are enclosed in double quotes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QuoteStyle {
    /// Quote only values containing a control character, a double quote or
    /// the delimiter
    #[default]
    Necessary,
    /// Quote every cell value (padding fields stay empty)
    Always,
}

/// Line terminator written after every row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineTerminator {
    /// `\r\n`
    #[default]
    CrLf,
    /// `\n`
    Lf,
}

impl LineTerminator {
    /// The terminator bytes.
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            LineTerminator::CrLf => b"\r\n",
            LineTerminator::Lf => b"\n",
        }
    }
}

/// Options for writing CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvOptions {
    /// Field delimiter
    pub delimiter: u8,

    /// Quoting policy
    pub quote_style: QuoteStyle,

    /// Row terminator
    pub line_terminator: LineTerminator,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote_style: QuoteStyle::Necessary,
            line_terminator: LineTerminator::CrLf,
        }
    }
}

impl CsvOptions {
    /// Create default options (comma, minimal quoting, CRLF).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the field delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the quoting policy.
    pub fn with_quote_style(mut self, style: QuoteStyle) -> Self {
        self.quote_style = style;
        self
    }

    /// Set the row terminator.
    pub fn with_line_terminator(mut self, terminator: LineTerminator) -> Self {
        self.line_terminator = terminator;
        self
    }

    /// Check that the options describe parseable CSV.
    pub fn validate(&self) -> Result<()> {
        match self.delimiter {
            b'"' => Err(Error::InvalidOptions(
                "the delimiter cannot be a double quote".to_string(),
            )),
            b'\r' | b'\n' => Err(Error::InvalidOptions(
                "the delimiter cannot be a line break".to_string(),
            )),
            d if !d.is_ascii() => Err(Error::InvalidOptions(format!(
                "the delimiter must be an ASCII character, got byte 0x{:02X}",
                d
            ))),
            _ => Ok(()),
        }
    }
}

/// Parse a delimiter given on a command line or in configuration.
///
/// Accepts a single ASCII character, or `\t` / `tab` for a tab.
pub fn parse_delimiter(s: &str) -> Result<u8> {
    match s {
        "\\t" | "tab" | "TAB" => Ok(b'\t'),
        _ => {
            let bytes = s.as_bytes();
            if bytes.len() == 1 && bytes[0].is_ascii() {
                Ok(bytes[0])
            } else {
                Err(Error::InvalidOptions(format!(
                    "delimiter must be a single ASCII character, got {:?}",
                    s
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = CsvOptions::default();
        assert_eq!(options.delimiter, b',');
        assert_eq!(options.quote_style, QuoteStyle::Necessary);
        assert_eq!(options.line_terminator.as_bytes(), b"\r\n");
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let options = CsvOptions::new()
            .with_delimiter(b';')
            .with_quote_style(QuoteStyle::Always)
            .with_line_terminator(LineTerminator::Lf);
        assert_eq!(options.delimiter, b';');
        assert_eq!(options.quote_style, QuoteStyle::Always);
        assert_eq!(options.line_terminator, LineTerminator::Lf);
    }

    #[test]
    fn test_invalid_delimiters() {
        for d in [b'"', b'\r', b'\n', 0xE9] {
            let options = CsvOptions::new().with_delimiter(d);
            assert!(matches!(options.validate(), Err(Error::InvalidOptions(_))));
        }
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter(",").unwrap(), b',');
        assert_eq!(parse_delimiter(";").unwrap(), b';');
        assert_eq!(parse_delimiter("\\t").unwrap(), b'\t');
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter(";;").is_err());
        assert!(parse_delimiter("é").is_err());
    }
}
