//! XLSX shared strings parsing.

use crate::error::{Error, Result};
use crate::xml::{EventSource, QuickXmlSource, XmlEvent};

use super::text::CellText;

/// Entry name of the shared string table inside a package.
pub const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// Upper bound on the capacity reserved from the `uniqueCount` hint.
const MAX_CAPACITY_HINT: usize = 65_536;

/// Shared strings table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedStrings {
    /// All strings in order
    strings: Vec<String>,
}

impl SharedStrings {
    /// Parse shared strings from XML content.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut source = QuickXmlSource::new(SHARED_STRINGS_PART, xml);
        Self::load(&mut source)
    }

    /// Build the table from an event stream.
    ///
    /// Each `si` entry becomes one string: the text of its `t` children and
    /// of the `t` inside its rich-text runs, concatenated in document order.
    /// Phonetic runs (`rPh`) are not part of the displayed text and are
    /// skipped.
    pub fn load<S: EventSource + ?Sized>(source: &mut S) -> Result<Self> {
        let mut strings = Vec::new();
        let mut text = CellText::new();
        let mut depth = 0usize;
        let mut in_si = false;
        let mut in_run = false;
        let mut in_t = false;

        loop {
            match source.next_event()? {
                XmlEvent::Open { name, attributes } => {
                    match (depth, name) {
                        (0, "sst") => {
                            let hint = attributes
                                .get("uniqueCount")
                                .or_else(|| attributes.get("count"))
                                .and_then(|v| v.trim().parse::<usize>().ok())
                                .unwrap_or(0);
                            strings.reserve(hint.min(MAX_CAPACITY_HINT));
                        }
                        (1, "si") => {
                            in_si = true;
                            text.clear();
                        }
                        (2, "r") if in_si => in_run = true,
                        (2, "t") if in_si => in_t = true,
                        (3, "t") if in_run => in_t = true,
                        _ => {}
                    }
                    depth += 1;
                }
                XmlEvent::Close { name } => {
                    depth = depth.saturating_sub(1);
                    match (depth, name) {
                        (1, "si") => {
                            strings.push(text.as_str().to_owned());
                            in_si = false;
                        }
                        (2, "r") => in_run = false,
                        (2, "t") | (3, "t") => in_t = false,
                        _ => {}
                    }
                }
                XmlEvent::Text(fragment) => {
                    if in_t && text.push(fragment).is_err() {
                        return Err(Error::CellTooLong {
                            part: source.part().to_string(),
                            limit: text.limit(),
                        });
                    }
                }
                XmlEvent::Eof => break,
            }
        }

        log::debug!("loaded {} shared strings", strings.len());
        Ok(Self { strings })
    }

    /// Get a string by index.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.strings.get(index).map(|s| s.as_str())
    }

    /// Get the count of shared strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Iterate over the strings in table order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(|s| s.as_str())
    }
}

impl From<Vec<String>> for SharedStrings {
    fn from(strings: Vec<String>) -> Self {
        Self { strings }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shared_strings() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="5" uniqueCount="3">
    <si><t>Hello</t></si>
    <si><t>World</t></si>
    <si><t>Test</t></si>
</sst>"#;

        let ss = SharedStrings::parse(xml).unwrap();
        assert_eq!(ss.len(), 3);
        assert_eq!(ss.get(0), Some("Hello"));
        assert_eq!(ss.get(1), Some("World"));
        assert_eq!(ss.get(2), Some("Test"));
        assert_eq!(ss.get(3), None);
    }

    #[test]
    fn test_rich_text() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
    <si>
        <r><t>Hello</t></r>
        <r><rPr><b/></rPr><t xml:space="preserve"> World</t></r>
    </si>
</sst>"#;

        let ss = SharedStrings::parse(xml).unwrap();
        assert_eq!(ss.len(), 1);
        assert_eq!(ss.get(0), Some("Hello World"));
    }

    #[test]
    fn test_missing_count_is_not_an_error() {
        let xml = "<sst><si><t>a</t></si><si><t>b</t></si></sst>";
        let ss = SharedStrings::parse(xml).unwrap();
        assert_eq!(ss.iter().collect::<Vec<_>>(), vec!["a", "b"]);

        let xml = r#"<sst uniqueCount="0"><si><t>a</t></si></sst>"#;
        assert_eq!(SharedStrings::parse(xml).unwrap().len(), 1);

        let xml = r#"<sst uniqueCount="lots"><si><t>a</t></si></sst>"#;
        assert_eq!(SharedStrings::parse(xml).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_entries_keep_their_index() {
        let xml = "<sst><si><t/></si><si></si><si><t>x</t></si></sst>";
        let ss = SharedStrings::parse(xml).unwrap();
        assert_eq!(ss.len(), 3);
        assert_eq!(ss.get(0), Some(""));
        assert_eq!(ss.get(1), Some(""));
        assert_eq!(ss.get(2), Some("x"));
    }

    #[test]
    fn test_phonetic_runs_are_skipped() {
        let xml = r#"<sst><si><t>漢字</t><rPh sb="0" eb="2"><t>カンジ</t></rPh><phoneticPr fontId="1"/></si></sst>"#;
        let ss = SharedStrings::parse(xml).unwrap();
        assert_eq!(ss.get(0), Some("漢字"));
    }

    #[test]
    fn test_whitespace_and_entities_preserved() {
        let xml = "<sst><si><t xml:space=\"preserve\">  a &amp; b\n</t></si></sst>";
        let ss = SharedStrings::parse(xml).unwrap();
        assert_eq!(ss.get(0), Some("  a & b\n"));
    }

    #[test]
    fn test_prefixed_elements() {
        let xml = r#"<x:sst xmlns:x="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><x:si><x:t>p</x:t></x:si></x:sst>"#;
        let ss = SharedStrings::parse(xml).unwrap();
        assert_eq!(ss.get(0), Some("p"));
    }

    #[test]
    fn test_overlong_entry_is_rejected() {
        let long = "y".repeat(super::super::text::MAX_CELL_CHARS);
        let xml = format!("<sst><si><r><t>{}</t></r><r><t>z</t></r></si></sst>", long);
        let err = SharedStrings::parse(&xml).unwrap_err();
        assert!(matches!(err, Error::CellTooLong { .. }));
    }

    #[test]
    fn test_malformed_table() {
        let err = SharedStrings::parse("<sst><si><t>a</si></sst>").unwrap_err();
        assert!(matches!(err, Error::MalformedDocument { .. }));
    }
}
