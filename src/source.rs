// WHY: Interface to the text-extraction collaborator (PDF/OCR output lives outside this crate)
// The parser needs only the full text; page access serves callers that show context

use anyhow::Result;

/// Page separator emitted by common PDF text extractors
pub const PAGE_BREAK: char = '\x0c';

/// Extracted document text, whole or page by page
pub trait TextSource {
    /// Full document text
    fn full_text(&self) -> Result<String>;

    /// Text of 0-based page `page`, `None` past the last page
    fn page_text(&self, page: usize) -> Result<Option<String>>;

    fn page_count(&self) -> usize;
}

/// Text already in memory, paged on form feeds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlainTextSource {
    text: String,
    page_starts: Vec<usize>,
}

impl PlainTextSource {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let page_starts = if text.is_empty() {
            Vec::new()
        } else {
            std::iter::once(0)
                .chain(text.match_indices(PAGE_BREAK).map(|(index, _)| index + PAGE_BREAK.len_utf8()))
                .collect()
        };
        Self { text, page_starts }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl TextSource for PlainTextSource {
    fn full_text(&self) -> Result<String> {
        Ok(self.text.clone())
    }

    fn page_text(&self, page: usize) -> Result<Option<String>> {
        let Some(&start) = self.page_starts.get(page) else {
            return Ok(None);
        };
        let end = self
            .page_starts
            .get(page + 1)
            .map(|next| next - PAGE_BREAK.len_utf8())
            .unwrap_or(self.text.len());
        Ok(Some(self.text[start..end].to_string()))
    }

    fn page_count(&self) -> usize {
        self.page_starts.len()
    }
}
