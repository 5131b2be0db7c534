//! Bounded text accumulator for cell and shared-string content.

/// Maximum number of characters a spreadsheet cell can contain.
pub const MAX_CELL_CHARS: usize = 32_767;

/// Returned by [`CellText::push`] when the limit would be exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overflow;

/// Growable text buffer with a character limit.
///
/// One buffer is allocated per pass and cleared between cells, so its
/// capacity is reused.
#[derive(Debug, Clone)]
pub struct CellText {
    buf: String,
    chars: usize,
    limit: usize,
}

impl CellText {
    /// Empty buffer with the spreadsheet cell limit.
    pub fn new() -> Self {
        Self::with_limit(MAX_CELL_CHARS)
    }

    /// Empty buffer with a custom limit.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            buf: String::new(),
            chars: 0,
            limit,
        }
    }

    /// Append a fragment. On overflow nothing is appended.
    pub fn push(&mut self, fragment: &str) -> Result<(), Overflow> {
        let added = fragment.chars().count();
        if self.chars + added > self.limit {
            return Err(Overflow);
        }
        self.buf.push_str(fragment);
        self.chars += added;
        Ok(())
    }

    /// Drop the content, keeping the allocation.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.chars = 0;
    }

    /// Current content.
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Number of characters held.
    pub fn len(&self) -> usize {
        self.chars
    }

    /// Whether nothing has been pushed since the last clear.
    pub fn is_empty(&self) -> bool {
        self.chars == 0
    }

    /// The configured character limit.
    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for CellText {
    fn default() -> Self {
        Self::new()
    }
}
