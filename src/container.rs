//! ZIP container abstraction for spreadsheet packages.

use crate::error::{Error, Result};
use crate::xml::{line_column, EventSource, QuickXmlSource, XmlEvent};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

/// A relationship entry from a .rels file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1")
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target path (relative or absolute)
    pub target: String,
    /// Whether the target is external
    pub external: bool,
}

/// Relationships of one part, keyed by ID.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    by_id: HashMap<String, Relationship>,
}

impl Relationships {
    /// Create a new empty relationships collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a relationship by ID.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id.get(id)
    }

    /// Add a relationship, replacing any with the same ID.
    pub fn add(&mut self, rel: Relationship) {
        self.by_id.insert(rel.id.clone(), rel);
    }

    /// Number of relationships.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether there are no relationships.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Rewrite a UTF-16 encoding declaration after the text has become UTF-8.
fn fix_xml_encoding_declaration(content: String) -> String {
    if !content.starts_with("<?xml") {
        return content;
    }
    let Some(end_decl) = content.find("?>") else {
        return content;
    };

    let decl = &content[..end_decl + 2];
    let lower = decl.to_ascii_lowercase();
    let Some(at) = lower.find("utf-16") else {
        return content;
    };

    let mut fixed = String::with_capacity(content.len());
    fixed.push_str(&content[..at]);
    fixed.push_str("UTF-8");
    fixed.push_str(&content[at + "utf-16".len()..]);
    fixed
}

fn malformed_encoding(part: &str, decoded: &[u8], offset: usize, message: String) -> Error {
    let (line, column) = line_column(decoded, offset);
    Error::MalformedDocument {
        part: part.to_string(),
        line,
        column,
        message,
    }
}

fn invalid_utf8(part: &str, bytes: &[u8], e: std::str::Utf8Error) -> Error {
    malformed_encoding(part, bytes, e.valid_up_to(), format!("invalid UTF-8: {}", e))
}

/// Decode UTF-16 code units (little or big endian) to a String.
///
/// An unpaired surrogate is reported at its position in the decoded text.
fn decode_utf16(part: &str, bytes: &[u8], little_endian: bool) -> Result<String> {
    let units = bytes.chunks_exact(2).map(|pair| {
        if little_endian {
            u16::from_le_bytes([pair[0], pair[1]])
        } else {
            u16::from_be_bytes([pair[0], pair[1]])
        }
    });

    let mut text = String::with_capacity(bytes.len() / 2);
    for unit in char::decode_utf16(units) {
        match unit {
            Ok(ch) => text.push(ch),
            Err(e) => {
                return Err(malformed_encoding(
                    part,
                    text.as_bytes(),
                    text.len(),
                    format!("invalid UTF-16: {}", e),
                ))
            }
        }
    }
    Ok(fix_xml_encoding_declaration(text))
}

/// Decode the bytes of XML entry `part` to UTF-8 text.
///
/// Parts are normally UTF-8, but some producers write UTF-16. A byte order
/// mark is honoured; without one, UTF-8 is tried first and UTF-16 is
/// recognised by the NUL bytes around ASCII markup. Bytes that are valid in
/// neither encoding are a [`Error::MalformedDocument`].
pub fn decode_xml_bytes(part: &str, bytes: &[u8]) -> Result<String> {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return std::str::from_utf8(rest)
            .map(str::to_owned)
            .map_err(|e| invalid_utf8(part, rest, e));
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return decode_utf16(part, rest, true);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return decode_utf16(part, rest, false);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => Ok(s.to_owned()),
        Err(_) if bytes.len() >= 4 && bytes[1] == 0 && bytes[3] == 0 => {
            decode_utf16(part, bytes, true)
        }
        Err(_) if bytes.len() >= 4 && bytes[0] == 0 && bytes[2] == 0 => {
            decode_utf16(part, bytes, false)
        }
        Err(e) => Err(invalid_utf8(part, bytes, e)),
    }
}

/// Spreadsheet package over a ZIP archive.
///
/// Entry lookups are case-sensitive.
pub struct OoxmlContainer {
    archive: RefCell<zip::ZipArchive<Cursor<Vec<u8>>>>,
}

impl OoxmlContainer {
    /// Open a package from a file path.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use xlcsv::container::OoxmlContainer;
    ///
    /// let container = OoxmlContainer::open("book.xlsx")?;
    /// assert!(container.exists("xl/workbook.xml"));
    /// # Ok::<(), xlcsv::Error>(())
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Create a container from a byte vector.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let archive = zip::ZipArchive::new(Cursor::new(data))?;
        Ok(Self {
            archive: RefCell::new(archive),
        })
    }

    /// Decompressed bytes of an entry, or `None` if the package has no such
    /// entry.
    pub fn read_part(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let mut archive = self.archive.borrow_mut();
        let mut file = match archive.by_name(name) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)?;
        Ok(Some(data))
    }

    /// An XML entry as UTF-8 text, or `None` if it is absent.
    pub fn try_read_xml(&self, name: &str) -> Result<Option<String>> {
        match self.read_part(name)? {
            Some(bytes) => decode_xml_bytes(name, &bytes).map(Some),
            None => Ok(None),
        }
    }

    /// An XML entry that must exist, as UTF-8 text.
    pub fn read_xml(&self, name: &str) -> Result<String> {
        self.try_read_xml(name)?
            .ok_or_else(|| Error::MissingComponent(name.to_string()))
    }

    /// Check if an entry exists in the archive.
    pub fn exists(&self, name: &str) -> bool {
        let archive = self.archive.borrow();
        let found = archive.file_names().any(|n| n == name);
        found
    }

    /// List all entries in the archive.
    pub fn list_files(&self) -> Vec<String> {
        let archive = self.archive.borrow();
        archive.file_names().map(String::from).collect()
    }

    /// Read the relationships of a part (`xl/workbook.xml` →
    /// `xl/_rels/workbook.xml.rels`). A part without a .rels file has no
    /// relationships.
    pub fn read_relationships(&self, part_path: &str) -> Result<Relationships> {
        let rels_path = match part_path.rsplit_once('/') {
            Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
            None if part_path.is_empty() => "_rels/.rels".to_string(),
            None => format!("_rels/{}.rels", part_path),
        };

        match self.try_read_xml(&rels_path)? {
            Some(xml) if !xml.trim().is_empty() => {
                let mut source = QuickXmlSource::new(rels_path, &xml);
                parse_relationships(&mut source)
            }
            _ => Ok(Relationships::new()),
        }
    }

    /// Resolve a relationship target against the part that declares it.
    pub fn resolve_path(base: &str, relative: &str) -> String {
        if let Some(stripped) = relative.strip_prefix('/') {
            return stripped.to_string();
        }

        let mut parts: Vec<&str> = match base.rsplit_once('/') {
            Some((dir, _)) => dir.split('/').filter(|s| !s.is_empty()).collect(),
            None => Vec::new(),
        };
        for component in relative.split('/') {
            match component {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                other => parts.push(other),
            }
        }
        parts.join("/")
    }
}

/// Build a [`Relationships`] collection from the events of a .rels part.
pub fn parse_relationships<S: EventSource + ?Sized>(source: &mut S) -> Result<Relationships> {
    let mut rels = Relationships::new();
    loop {
        match source.next_event()? {
            XmlEvent::Open { name, attributes } if name == "Relationship" => {
                let id = attributes.get("Id").unwrap_or_default();
                if id.is_empty() {
                    continue;
                }
                rels.add(Relationship {
                    id: id.to_string(),
                    rel_type: attributes.get("Type").unwrap_or_default().to_string(),
                    target: attributes.get("Target").unwrap_or_default().to_string(),
                    external: attributes
                        .get("TargetMode")
                        .is_some_and(|mode| mode.eq_ignore_ascii_case("external")),
                });
            }
            XmlEvent::Eof => break,
            _ => {}
        }
    }
    Ok(rels)
}

impl std::fmt::Debug for OoxmlContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OoxmlContainer")
            .field("files", &self.list_files().len())
            .finish()
    }
}
