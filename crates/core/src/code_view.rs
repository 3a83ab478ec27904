//! Mapping between absolute source line numbers and the rows of the
//! currently displayed function body.
//!
//! The code pane renders a function starting at row 0, while search hits and
//! stack frames report absolute file lines. [`CodeLineMapper`] translates
//! between the two using the `start_line` of the loaded function as anchor.

use codedash_api::models::{FunctionDocument, FunctionId, HighlightRange};
use serde::Serialize;

/// A row-addressable view that can mark and reveal rows.
pub trait RowSurface {
    fn row_count(&self) -> usize;
    fn clear_highlights(&mut self);
    fn mark_highlighted(&mut self, index: usize);
    fn scroll_into_view(&mut self, index: usize);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodeLineMapper {
    anchor: Option<u32>,
}

impl CodeLineMapper {
    pub fn anchor(&self) -> Option<u32> {
        self.anchor
    }

    pub fn set_anchor(&mut self, anchor: u32) {
        self.anchor = Some(anchor);
    }

    pub fn reset(&mut self) {
        self.anchor = None;
    }

    /// Row index of absolute `line` within `row_count` rows.
    pub fn row_for_line(&self, line: u32, row_count: usize) -> Option<usize> {
        let anchor = self.anchor?;
        let offset = line.checked_sub(anchor)? as usize;
        (offset < row_count).then_some(offset)
    }

    pub fn line_for_row(&self, index: usize) -> Option<u32> {
        let anchor = self.anchor?;
        u32::try_from(index).ok()?.checked_add(anchor)
    }

    /// Clears existing highlights, then marks every row whose absolute line
    /// falls in `start..=end`. Returns the number of rows marked. Does nothing
    /// before an anchor is known.
    pub fn highlight<S: RowSurface + ?Sized>(&self, surface: &mut S, start: u32, end: u32) -> usize {
        let Some(anchor) = self.anchor else {
            return 0;
        };
        surface.clear_highlights();

        let rows = surface.row_count() as u64;
        let (anchor, start, end) = (anchor as u64, start as u64, end as u64);
        if start > end || end < anchor || rows == 0 {
            return 0;
        }
        let first = start.max(anchor) - anchor;
        let last = (end - anchor).min(rows - 1);
        if first > last {
            return 0;
        }
        for index in first..=last {
            surface.mark_highlighted(index as usize);
        }
        (last - first + 1) as usize
    }

    /// Reveals the row of absolute `line`. Out-of-range lines are ignored.
    pub fn scroll_to<S: RowSurface + ?Sized>(&self, surface: &mut S, line: u32) -> Option<usize> {
        let index = self.row_for_line(line, surface.row_count())?;
        surface.scroll_into_view(index);
        Some(index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeRow {
    /// Absolute source line of the row.
    pub line: u32,
    pub text: String,
    pub highlighted: bool,
}

/// The rendered body of one function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodePane {
    pub function_id: Option<FunctionId>,
    pub signature: String,
    rows: Vec<CodeRow>,
    scroll_target: Option<usize>,
}

impl CodePane {
    pub fn from_document(doc: &FunctionDocument) -> Self {
        let anchor = doc.anchor();
        let rows = doc
            .display_text()
            .lines()
            .enumerate()
            .map(|(i, text)| CodeRow {
                line: anchor.saturating_add(i as u32),
                text: text.to_string(),
                highlighted: false,
            })
            .collect();
        Self {
            function_id: doc.function_id.clone(),
            signature: doc.signature(),
            rows,
            scroll_target: None,
        }
    }

    pub fn rows(&self) -> &[CodeRow] {
        &self.rows
    }

    pub fn highlighted_rows(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.highlighted)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn scroll_target(&self) -> Option<usize> {
        self.scroll_target
    }

    /// Rows around the scroll target (or the top), `radius` rows on each side.
    pub fn window(&self, radius: usize) -> &[CodeRow] {
        let center = self.scroll_target.unwrap_or(0);
        let start = center.saturating_sub(radius);
        let end = (center + radius + 1).min(self.rows.len());
        &self.rows[start.min(end)..end]
    }
}

impl RowSurface for CodePane {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn clear_highlights(&mut self) {
        for row in &mut self.rows {
            row.highlighted = false;
        }
    }

    fn mark_highlighted(&mut self, index: usize) {
        if let Some(row) = self.rows.get_mut(index) {
            row.highlighted = true;
        }
    }

    fn scroll_into_view(&mut self, index: usize) {
        self.scroll_target = Some(index);
    }
}

/// Result of focusing a line range in the code pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Focus {
    pub marked: usize,
    pub scrolled_to: Option<usize>,
}

/// The code pane together with the mapper anchored to it.
#[derive(Debug, Clone, Default)]
pub struct CodeNavigator {
    mapper: CodeLineMapper,
    pane: Option<CodePane>,
}

impl CodeNavigator {
    /// Replaces the displayed function and re-anchors the mapper.
    pub fn display(&mut self, doc: &FunctionDocument) {
        self.mapper.set_anchor(doc.anchor());
        self.pane = Some(CodePane::from_document(doc));
    }

    pub fn clear(&mut self) {
        self.mapper.reset();
        self.pane = None;
    }

    pub fn anchor(&self) -> Option<u32> {
        self.mapper.anchor()
    }

    pub fn pane(&self) -> Option<&CodePane> {
        self.pane.as_ref()
    }

    pub fn highlight(&mut self, range: HighlightRange) -> usize {
        match self.pane.as_mut() {
            Some(pane) => self.mapper.highlight(pane, range.start_line, range.end_line),
            None => 0,
        }
    }

    pub fn scroll_to(&mut self, line: u32) -> Option<usize> {
        let pane = self.pane.as_mut()?;
        self.mapper.scroll_to(pane, line)
    }

    /// Highlights `range` and scrolls its first line into view.
    pub fn focus(&mut self, range: HighlightRange) -> Focus {
        let marked = self.highlight(range);
        let scrolled_to = self.scroll_to(range.start_line);
        Focus {
            marked,
            scrolled_to,
        }
    }
}
