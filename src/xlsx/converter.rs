//! Two-pass worksheet to CSV conversion.

use std::io::Write;
use std::path::Path;

use crate::container::OoxmlContainer;
use crate::csv::{CsvOptions, CsvWriter};
use crate::detect::{detect_format, is_zip_file, FormatType};
use crate::error::{Error, Result};
use crate::xml::QuickXmlSource;

use super::shared_strings::{SharedStrings, SHARED_STRINGS_PART};
use super::workbook::{read_sheets, SheetInfo, SheetSelector};
use super::worksheet::convert_worksheet;

/// Outcome of converting one worksheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertSummary {
    /// CSV rows written
    pub rows: usize,
    /// Fields per row, from the sheet dimension (0 if the sheet had none)
    pub columns: u32,
    /// Entries in the shared string table (0 if the package has none)
    pub shared_strings: usize,
    /// Cells dropped because they were out of order or outside the dimension
    pub skipped_cells: usize,
}

/// Converts worksheets of an XLSX package to CSV.
///
/// Each conversion runs two passes over the package: the shared string
/// table is loaded first, then the worksheet is streamed row by row into
/// the output.
///
/// # Example
///
/// ```no_run
/// use xlcsv::csv::CsvOptions;
/// use xlcsv::xlsx::{SheetSelector, XlsxConverter};
///
/// let converter = XlsxConverter::open("book.xlsx")?
///     .with_options(CsvOptions::new().with_delimiter(b';'));
/// let mut out = Vec::new();
/// let summary = converter.convert(&SheetSelector::Number(1), &mut out)?;
/// println!("{} rows x {} columns", summary.rows, summary.columns);
/// # Ok::<(), xlcsv::Error>(())
/// ```
#[derive(Debug)]
pub struct XlsxConverter {
    container: OoxmlContainer,
    options: CsvOptions,
}

impl XlsxConverter {
    /// Open a workbook from a file path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(data)
    }

    /// Open a workbook from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        if !is_zip_file(&data) {
            return Err(Error::UnknownFormat);
        }
        Self::from_container(OoxmlContainer::from_bytes(data)?)
    }

    fn from_container(container: OoxmlContainer) -> Result<Self> {
        match detect_format(&container)? {
            FormatType::Xlsx => Ok(Self {
                container,
                options: CsvOptions::default(),
            }),
            other => Err(Error::UnsupportedFormat(other.name().to_string())),
        }
    }

    /// Use the given CSV options for subsequent conversions.
    pub fn with_options(mut self, options: CsvOptions) -> Self {
        self.options = options;
        self
    }

    /// Sheets listed in the workbook, in tab order.
    pub fn sheets(&self) -> Result<Vec<SheetInfo>> {
        read_sheets(&self.container)
    }

    /// Load the shared string table, or `None` if the package has none.
    pub fn shared_strings(&self) -> Result<Option<SharedStrings>> {
        match self.container.try_read_xml(SHARED_STRINGS_PART)? {
            Some(xml) => {
                let table = SharedStrings::parse(&xml)?;
                log::debug!("{}: {} entries", SHARED_STRINGS_PART, table.len());
                Ok(Some(table))
            }
            None => {
                log::debug!("{} not present", SHARED_STRINGS_PART);
                Ok(None)
            }
        }
    }

    /// Entry name of the worksheet a selector refers to.
    ///
    /// The workbook catalogue is only read for name selectors.
    pub fn worksheet_part(&self, selector: &SheetSelector) -> Result<String> {
        match selector {
            SheetSelector::Number(_) => selector.resolve(&[]),
            SheetSelector::Name(_) => selector.resolve(&self.sheets()?),
        }
    }

    /// Convert one worksheet, writing CSV to `out`.
    ///
    /// Output written before an error is left in place.
    pub fn convert<W: Write>(&self, selector: &SheetSelector, out: W) -> Result<ConvertSummary> {
        self.options.validate()?;
        let part = self.worksheet_part(selector)?;

        let table = self.shared_strings()?;

        let xml = self.container.read_xml(&part)?;
        log::debug!("converting {} ({} bytes)", part, xml.len());
        let mut source = QuickXmlSource::new(part, &xml);
        let csv = CsvWriter::new(out, self.options.clone());
        let (_, summary) = convert_worksheet(&mut source, table.as_ref(), csv)?;

        Ok(ConvertSummary {
            rows: summary.rows,
            columns: summary.dimension.map_or(0, |d| d.max_col),
            shared_strings: table.as_ref().map_or(0, SharedStrings::len),
            skipped_cells: summary.skipped_cells,
        })
    }

    /// Convert one worksheet into a string.
    pub fn convert_to_string(&self, selector: &SheetSelector) -> Result<String> {
        let mut buffer = Vec::new();
        self.convert(selector, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| Error::InvalidData(e.to_string()))
    }
}
