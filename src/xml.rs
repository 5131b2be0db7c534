//! Structural XML events for package parts.
//!
//! Every part this crate reads (the shared string table, the workbook, its
//! relationships and the worksheets) is consumed as an ordered stream of
//! open/close/text events. [`EventSource`] is the only thing the interpreters
//! depend on; [`QuickXmlSource`] is the `quick-xml` backed implementation.
//!
//! Names are reported by local name: `x:row` and `row` are the same element.

use crate::error::{Error, Result};
use quick_xml::events::Event;
use std::ops::Range;

/// Attributes of an opening tag, in document order.
#[derive(Debug, Clone, Copy)]
pub struct Attributes<'s> {
    text: &'s str,
    spans: &'s [(Range<usize>, Range<usize>)],
}

impl<'s> Attributes<'s> {
    /// Value of the first attribute with the given local name.
    pub fn get(&self, name: &str) -> Option<&'s str> {
        self.iter().find(|(key, _)| *key == name).map(|(_, v)| v)
    }

    /// Iterate over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'s str, &'s str)> + 's {
        let text = self.text;
        let spans = self.spans;
        spans
            .iter()
            .map(move |(key, value)| (&text[key.clone()], &text[value.clone()]))
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Whether the tag carries no attributes.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// One structural event.
///
/// Events borrow from the source that produced them and stay valid until the
/// next call to [`EventSource::next_event`].
#[derive(Debug, Clone, Copy)]
pub enum XmlEvent<'s> {
    /// An element was opened.
    Open {
        /// Local element name
        name: &'s str,
        /// Attributes with unescaped values
        attributes: Attributes<'s>,
    },
    /// An element was closed.
    Close {
        /// Local element name
        name: &'s str,
    },
    /// Character data (unescaped). One logical text node may arrive in
    /// several fragments.
    Text(&'s str),
    /// End of the document.
    Eof,
}

/// A producer of [`XmlEvent`]s for one package part.
pub trait EventSource {
    /// Entry name of the part being read, used in error messages.
    fn part(&self) -> &str;

    /// Produce the next event. After [`XmlEvent::Eof`] the source keeps
    /// returning `Eof`.
    fn next_event(&mut self) -> Result<XmlEvent<'_>>;
}

/// [`EventSource`] over an in-memory XML document, tokenized by `quick-xml`.
pub struct QuickXmlSource<'a> {
    reader: quick_xml::Reader<&'a [u8]>,
    input: &'a [u8],
    part: String,
    depth: usize,
    finished: bool,
    name: String,
    attr_text: String,
    attr_spans: Vec<(Range<usize>, Range<usize>)>,
    text: String,
}

impl<'a> QuickXmlSource<'a> {
    /// Create a source over `xml`, reporting errors against `part`.
    pub fn new(part: impl Into<String>, xml: &'a str) -> Self {
        let input = xml.as_bytes();
        let mut reader = quick_xml::Reader::from_reader(input);
        let config = reader.config_mut();
        config.expand_empty_elements = true;
        config.trim_text(false);

        Self {
            reader,
            input,
            part: part.into(),
            depth: 0,
            finished: false,
            name: String::new(),
            attr_text: String::new(),
            attr_spans: Vec::new(),
            text: String::new(),
        }
    }

    fn malformed(&self, offset: usize, message: impl Into<String>) -> Error {
        let (line, column) = line_column(self.input, offset);
        Error::MalformedDocument {
            part: self.part.clone(),
            line,
            column,
            message: message.into(),
        }
    }

    fn utf8<'b>(&self, bytes: &'b [u8]) -> Result<&'b str> {
        std::str::from_utf8(bytes).map_err(|e| {
            self.malformed(self.reader.buffer_position() as usize, e.to_string())
        })
    }
}

impl EventSource for QuickXmlSource<'_> {
    fn part(&self) -> &str {
        &self.part
    }

    fn next_event(&mut self) -> Result<XmlEvent<'_>> {
        if self.finished {
            return Ok(XmlEvent::Eof);
        }

        loop {
            let event = match self.reader.read_event() {
                Ok(event) => event,
                Err(e) => {
                    return Err(self.malformed(self.reader.error_position() as usize, e.to_string()))
                }
            };

            match event {
                Event::Start(e) => {
                    let local = e.local_name();
                    let name = self.utf8(local.into_inner())?;
                    self.name.clear();
                    self.name.push_str(name);
                    self.attr_text.clear();
                    self.attr_spans.clear();

                    for attr in e.attributes() {
                        let attr = attr.map_err(|err| {
                            self.malformed(self.reader.buffer_position() as usize, err.to_string())
                        })?;
                        let qname = attr.key.as_ref();
                        if qname == b"xmlns" || qname.starts_with(b"xmlns:") {
                            continue;
                        }
                        let local = attr.key.local_name();
                        let key = self.utf8(local.into_inner())?;
                        let value = attr.unescape_value().map_err(|err| {
                            self.malformed(self.reader.buffer_position() as usize, err.to_string())
                        })?;

                        let key_start = self.attr_text.len();
                        self.attr_text.push_str(key);
                        let key_end = self.attr_text.len();
                        self.attr_text.push_str(&value);
                        self.attr_spans
                            .push((key_start..key_end, key_end..self.attr_text.len()));
                    }

                    self.depth += 1;
                    return Ok(XmlEvent::Open {
                        name: &self.name,
                        attributes: Attributes {
                            text: &self.attr_text,
                            spans: &self.attr_spans,
                        },
                    });
                }
                Event::End(e) => {
                    let local = e.local_name();
                    let name = self.utf8(local.into_inner())?;
                    self.name.clear();
                    self.name.push_str(name);
                    self.depth = self.depth.saturating_sub(1);
                    return Ok(XmlEvent::Close { name: &self.name });
                }
                Event::Text(e) => {
                    let text = e.unescape().map_err(|err| {
                        self.malformed(self.reader.buffer_position() as usize, err.to_string())
                    })?;
                    if text.is_empty() {
                        continue;
                    }
                    self.text.clear();
                    self.text.push_str(&text);
                    return Ok(XmlEvent::Text(&self.text));
                }
                Event::CData(e) => {
                    let text = self.utf8(&e)?;
                    if text.is_empty() {
                        continue;
                    }
                    self.text.clear();
                    self.text.push_str(text);
                    return Ok(XmlEvent::Text(&self.text));
                }
                Event::Eof => {
                    if self.depth != 0 {
                        return Err(self.malformed(
                            self.input.len(),
                            format!("unexpected end of document, {} element(s) still open", self.depth),
                        ));
                    }
                    self.finished = true;
                    return Ok(XmlEvent::Eof);
                }
                // Declarations, comments, processing instructions, doctypes.
                // Empty tags never reach here: they are expanded.
                _ => {}
            }
        }
    }
}

/// Convert a byte offset into a 1-based `(line, column)` pair.
pub fn line_column(input: &[u8], offset: usize) -> (usize, usize) {
    let offset = offset.min(input.len());
    let before = &input[..offset];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|p| p + 1)
        .unwrap_or(0);
    (line, offset - line_start + 1)
}
