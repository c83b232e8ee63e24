//! Byte offset to line/column mapping.

use archweave_core::SourceLocation;

/// Line start offsets of one source text.
pub(crate) struct LineIndex<'src> {
    file: &'src str,
    text: &'src str,
    starts: Vec<usize>,
}

impl<'src> LineIndex<'src> {
    pub(crate) fn new(file: &'src str, text: &'src str) -> Self {
        let starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { file, text, starts }
    }

    /// 1-based location of a byte offset; the column counts characters.
    pub(crate) fn location(&self, offset: usize) -> SourceLocation {
        let offset = offset.min(self.text.len());
        let line = match self.starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let line_start = self.starts[line];
        let column = self
            .text
            .get(line_start..offset)
            .map_or(offset - line_start, |s| s.chars().count());
        SourceLocation::new(self.file, line as u32 + 1, column as u32 + 1)
    }

    pub(crate) fn end(&self) -> SourceLocation {
        self.location(self.text.len())
    }
}
