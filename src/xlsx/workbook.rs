//! Workbook sheet catalogue and sheet selection.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::container::{OoxmlContainer, Relationships};
use crate::error::{Error, Result};
use crate::xml::{EventSource, QuickXmlSource, XmlEvent};

/// Entry name of the workbook part.
pub const WORKBOOK_PART: &str = "xl/workbook.xml";

/// Entry name of the worksheet with the given 1-based number.
pub fn worksheet_part(number: u32) -> String {
    format!("xl/worksheets/sheet{}.xml", number)
}

/// One sheet listed in the workbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetInfo {
    /// 1-based position in workbook order
    pub position: usize,
    /// Sheet name as shown on its tab
    pub name: String,
    /// `sheetId` attribute
    pub sheet_id: String,
    /// Relationship ID linking to the worksheet part
    pub rel_id: String,
    /// Worksheet entry inside the package, if the relationship resolves
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Which worksheet to convert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    /// `xl/worksheets/sheet{n}.xml`, 1-based
    Number(u32),
    /// Sheet with this name in the workbook catalogue
    Name(String),
}

impl Default for SheetSelector {
    fn default() -> Self {
        SheetSelector::Number(1)
    }
}

impl fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetSelector::Number(n) => write!(f, "#{}", n),
            SheetSelector::Name(name) => write!(f, "{}", name),
        }
    }
}

impl FromStr for SheetSelector {
    type Err = Error;

    /// All digits selects by number, anything else by name.
    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::InvalidData("empty sheet selector".to_string()));
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(SheetSelector::Name(s.to_string()));
        }
        match s.parse::<u32>() {
            Ok(0) => Err(Error::InvalidData(
                "sheet numbers start at 1".to_string(),
            )),
            Ok(n) => Ok(SheetSelector::Number(n)),
            Err(_) => Err(Error::InvalidData(format!("sheet number {} is too large", s))),
        }
    }
}

impl SheetSelector {
    /// Resolve to a worksheet entry name.
    ///
    /// Numbers map straight to an entry name without consulting the
    /// workbook; whether the entry exists is checked when it is read.
    pub fn resolve(&self, sheets: &[SheetInfo]) -> Result<String> {
        match self {
            SheetSelector::Number(n) => Ok(worksheet_part(*n)),
            SheetSelector::Name(name) => {
                let sheet = sheets
                    .iter()
                    .find(|s| s.name == *name)
                    .or_else(|| sheets.iter().find(|s| s.name.to_lowercase() == name.to_lowercase()))
                    .ok_or_else(|| Error::SheetNotFound(name.clone()))?;
                sheet.path.clone().ok_or_else(|| {
                    Error::MissingComponent(format!(
                        "worksheet for sheet '{}' ({})",
                        sheet.name, sheet.rel_id
                    ))
                })
            }
        }
    }
}

/// `<sheet>` attributes in workbook order: (name, sheetId, r:id).
fn parse_sheet_entries<S: EventSource + ?Sized>(
    source: &mut S,
) -> Result<Vec<(String, String, String)>> {
    let mut entries = Vec::new();
    let mut depth = 0usize;
    loop {
        match source.next_event()? {
            XmlEvent::Open { name, attributes } => {
                if depth == 2 && name == "sheet" {
                    entries.push((
                        attributes.get("name").unwrap_or_default().to_string(),
                        attributes.get("sheetId").unwrap_or_default().to_string(),
                        attributes.get("id").unwrap_or_default().to_string(),
                    ));
                }
                depth += 1;
            }
            XmlEvent::Close { .. } => depth = depth.saturating_sub(1),
            XmlEvent::Text(_) => {}
            XmlEvent::Eof => break,
        }
    }
    Ok(entries)
}

/// Build the catalogue from workbook XML and its relationships.
pub fn parse_workbook(xml: &str, rels: &Relationships) -> Result<Vec<SheetInfo>> {
    let mut source = QuickXmlSource::new(WORKBOOK_PART, xml);
    let entries = parse_sheet_entries(&mut source)?;

    let sheets = entries
        .into_iter()
        .enumerate()
        .map(|(idx, (name, sheet_id, rel_id))| {
            let path = rels
                .get(&rel_id)
                .filter(|rel| !rel.external)
                .map(|rel| OoxmlContainer::resolve_path(WORKBOOK_PART, &rel.target));
            SheetInfo {
                position: idx + 1,
                name,
                sheet_id,
                rel_id,
                path,
            }
        })
        .collect();
    Ok(sheets)
}

/// Read the sheet catalogue of a package.
pub fn read_sheets(container: &OoxmlContainer) -> Result<Vec<SheetInfo>> {
    let xml = container.read_xml(WORKBOOK_PART)?;
    let rels = container.read_relationships(WORKBOOK_PART)?;
    let sheets = parse_workbook(&xml, &rels)?;
    log::debug!("{}: {} sheets", WORKBOOK_PART, sheets.len());
    Ok(sheets)
}
