//! Paginated plain-text document output.

use crate::config::ExportConfig;
use crate::error::SinkError;
use crate::grouping::HeaderGroups;
use crate::model::{Row, TableModel};
use crate::value::CellValue;
use crate::writer::Column;

use super::{Media, TableSink};

const PAGE_BREAK: char = '\u{c}';

/// Fixed-width text pages.
///
/// Every page starts with the header; pages are separated by a form feed. The
/// caption goes on the first page, the footer after the last row and the
/// page count at the very end.
pub struct DocumentSink {
    page_lines: usize,
    column_width: usize,
    out: String,
    header_lines: Vec<String>,
    line: Option<Vec<String>>,
    lines_on_page: usize,
    pages: usize,
}

impl DocumentSink {
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            page_lines: config.document_page_lines,
            column_width: config.document_column_width.max(1),
            out: String::new(),
            header_lines: Vec::new(),
            line: None,
            lines_on_page: 0,
            pages: 1,
        }
    }

    fn push_line(&mut self, line: &str) {
        self.out.push_str(line.trim_end());
        self.out.push('\n');
        self.lines_on_page += 1;
    }

    fn push_header(&mut self) {
        for line in self.header_lines.clone() {
            self.push_line(&line);
        }
    }

    fn new_page(&mut self) {
        self.out.push(PAGE_BREAK);
        self.out.push('\n');
        self.pages += 1;
        self.lines_on_page = 0;
        self.push_header();
    }

    /// Write a body line, breaking the page first when it is full.
    fn push_body_line(&mut self, line: &str) {
        let capacity = self.page_lines.max(self.header_lines.len() + 1);
        if self.lines_on_page >= capacity {
            self.new_page();
        }
        self.push_line(line);
    }

    fn flush_row(&mut self) {
        if let Some(cells) = self.line.take() {
            let line = cells.join(" ");
            self.push_body_line(&line);
        }
    }

    fn fit(&self, text: &str, right_align: bool) -> String {
        let text: String = text
            .chars()
            .map(|c| if c == '\n' { ' ' } else { c })
            .take(self.column_width)
            .collect();
        let width = self.column_width;
        if right_align {
            format!("{:>width$}", text)
        } else {
            format!("{:<width$}", text)
        }
    }
}

impl TableSink for DocumentSink {
    fn media(&self) -> Media {
        Media::Document
    }

    fn open(&mut self, _model: &TableModel) -> Result<(), SinkError> {
        Ok(())
    }

    fn caption(&mut self, caption: &str) -> Result<(), SinkError> {
        self.push_line(caption);
        self.push_line("");
        Ok(())
    }

    fn header(&mut self, layout: &HeaderGroups, include: bool) -> Result<(), SinkError> {
        if !include {
            return Ok(());
        }
        let mut lines = Vec::new();
        if let Some(group_row) = &layout.group_row {
            let cells: Vec<String> = group_row
                .iter()
                .map(|h| {
                    let span = h.colspan.max(1);
                    let title = if h.is_group_header {
                        h.display_title()
                    } else {
                        String::new()
                    };
                    let chars: String = title
                        .chars()
                        .take(span * (self.column_width + 1) - 1)
                        .collect();
                    format!("{:<width$}", chars, width = span * (self.column_width + 1) - 1)
                })
                .collect();
            lines.push(cells.join(" "));
        }
        let titles: Vec<String> = layout
            .leaf_row
            .iter()
            .map(|h| self.fit(&h.display_title(), false))
            .collect();
        lines.push(titles.join(" "));
        let rule = "-".repeat(self.column_width);
        lines.push(vec![rule; layout.leaf_row.len()].join(" "));

        self.header_lines = lines;
        self.push_header();
        Ok(())
    }

    fn row_open(&mut self, _row: &Row, _row_number: usize) -> Result<(), SinkError> {
        self.flush_row();
        self.line = Some(Vec::new());
        Ok(())
    }

    fn column_value(&mut self, value: &CellValue, _column: &Column<'_>) -> Result<(), SinkError> {
        let right_align = matches!(value, CellValue::Numeric(_) | CellValue::Percentage(_));
        let cell = self.fit(&value.display_text(), right_align);
        self.line
            .as_mut()
            .ok_or_else(|| SinkError::message("column value outside of a row"))?
            .push(cell);
        Ok(())
    }

    fn footer(&mut self, footer: &str) -> Result<(), SinkError> {
        self.flush_row();
        self.push_body_line("");
        self.push_body_line(footer);
        Ok(())
    }

    fn bottom_banner(&mut self, _model: &TableModel) -> Result<(), SinkError> {
        self.flush_row();
        let banner = format!("Page count: {}", self.pages);
        self.push_line("");
        self.push_line(&banner);
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.flush_row();
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Vec<u8>, SinkError> {
        Ok(self.out.into_bytes())
    }
}
