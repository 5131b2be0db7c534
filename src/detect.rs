//! Package classification.
//!
//! Only spreadsheet packages can be converted. Other Office Open XML
//! packages are recognised so they can be rejected with a useful message.

use crate::container::OoxmlContainer;
use crate::error::{Error, Result};
use crate::xml::{EventSource, QuickXmlSource, XmlEvent};

/// ZIP file magic bytes: PK\x03\x04
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Content types of a workbook part (plain, macro-enabled, template).
const WORKBOOK_CONTENT_TYPES: [&str; 4] = [
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.template.main+xml",
    "application/vnd.ms-excel.sheet.macroEnabled.main+xml",
    "application/vnd.ms-excel.template.macroEnabled.main+xml",
];

const DOCUMENT_CONTENT_TYPE_PREFIX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.";

const PRESENTATION_CONTENT_TYPE_PREFIX: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.";

/// Kind of Office Open XML package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatType {
    /// Excel workbook (.xlsx, .xlsm)
    Xlsx,
    /// Word document (.docx)
    Docx,
    /// PowerPoint presentation (.pptx)
    Pptx,
}

impl FormatType {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            FormatType::Xlsx => "xlsx",
            FormatType::Docx => "docx",
            FormatType::Pptx => "pptx",
        }
    }

    /// Returns a human-readable name for this format.
    pub fn name(&self) -> &'static str {
        match self {
            FormatType::Xlsx => "Excel Workbook",
            FormatType::Docx => "Word Document",
            FormatType::Pptx => "PowerPoint Presentation",
        }
    }
}

impl std::fmt::Display for FormatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Check if data starts with ZIP magic bytes.
pub fn is_zip_file(data: &[u8]) -> bool {
    data.len() >= 4 && data[..4] == ZIP_MAGIC
}

/// Classify an opened package.
///
/// `[Content_Types].xml` decides when present; otherwise the top-level
/// folder names do.
pub fn detect_format(container: &OoxmlContainer) -> Result<FormatType> {
    if let Some(xml) = container.try_read_xml(CONTENT_TYPES_PART)? {
        let mut source = QuickXmlSource::new(CONTENT_TYPES_PART, &xml);
        if let Some(format) = format_from_content_types(&mut source)? {
            return Ok(format);
        }
    }
    detect_by_folder_structure(&container.list_files())
}

/// Classify raw bytes, opening them as a package first.
///
/// # Example
///
/// ```no_run
/// use xlcsv::detect::{detect_format_from_bytes, FormatType};
///
/// let data = std::fs::read("book.xlsx")?;
/// assert_eq!(detect_format_from_bytes(&data)?, FormatType::Xlsx);
/// # Ok::<(), xlcsv::Error>(())
/// ```
pub fn detect_format_from_bytes(data: &[u8]) -> Result<FormatType> {
    if !is_zip_file(data) {
        return Err(Error::UnknownFormat);
    }
    let container = OoxmlContainer::from_bytes(data.to_vec())?;
    detect_format(&container)
}

fn format_from_content_types<S: EventSource + ?Sized>(
    source: &mut S,
) -> Result<Option<FormatType>> {
    let mut found = None;
    loop {
        match source.next_event()? {
            XmlEvent::Open { name, attributes } if name == "Override" => {
                let Some(content_type) = attributes.get("ContentType") else {
                    continue;
                };
                if WORKBOOK_CONTENT_TYPES.iter().any(|t| *t == content_type) {
                    return Ok(Some(FormatType::Xlsx));
                }
                if found.is_none() {
                    if content_type.starts_with(DOCUMENT_CONTENT_TYPE_PREFIX) {
                        found = Some(FormatType::Docx);
                    } else if content_type.starts_with(PRESENTATION_CONTENT_TYPE_PREFIX) {
                        found = Some(FormatType::Pptx);
                    }
                }
            }
            XmlEvent::Eof => return Ok(found),
            _ => {}
        }
    }
}

fn detect_by_folder_structure(names: &[String]) -> Result<FormatType> {
    let has_xl = names.iter().any(|n| n.starts_with("xl/"));
    let has_word = names.iter().any(|n| n.starts_with("word/"));
    let has_ppt = names.iter().any(|n| n.starts_with("ppt/"));

    match (has_xl, has_word, has_ppt) {
        (true, false, false) => Ok(FormatType::Xlsx),
        (false, true, false) => Ok(FormatType::Docx),
        (false, false, true) => Ok(FormatType::Pptx),
        _ => Err(Error::UnknownFormat),
    }
}
