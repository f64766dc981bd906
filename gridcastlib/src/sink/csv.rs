//! Delimited text output.

use ::csv::{QuoteStyle, Terminator, Writer, WriterBuilder};

use crate::config::ExportConfig;
use crate::error::SinkError;
use crate::grouping::HeaderGroups;
use crate::model::{Row, TableModel};
use crate::value::CellValue;
use crate::writer::Column;

use super::{Media, TableSink};

/// CSV sink: every field quoted, embedded quotes doubled, `\n` line ends.
///
/// Caption and footer are written as single-field records; a grouped header
/// becomes an extra record with each group title repeated over its span.
pub struct CsvSink {
    writer: Writer<Vec<u8>>,
    record: Option<Vec<String>>,
}

impl CsvSink {
    pub fn new(config: &ExportConfig) -> Self {
        let writer = WriterBuilder::new()
            .delimiter(config.csv_delimiter)
            .quote_style(QuoteStyle::Always)
            .terminator(Terminator::Any(b'\n'))
            .flexible(true)
            .from_writer(Vec::new());
        Self {
            writer,
            record: None,
        }
    }

    fn flush_record(&mut self) -> Result<(), SinkError> {
        if let Some(record) = self.record.take() {
            self.writer.write_record(&record)?;
        }
        Ok(())
    }
}

impl TableSink for CsvSink {
    fn media(&self) -> Media {
        Media::Csv
    }

    fn open(&mut self, _model: &TableModel) -> Result<(), SinkError> {
        Ok(())
    }

    fn caption(&mut self, caption: &str) -> Result<(), SinkError> {
        self.writer.write_record([caption])?;
        Ok(())
    }

    fn header(&mut self, layout: &HeaderGroups, include: bool) -> Result<(), SinkError> {
        if !include {
            return Ok(());
        }
        if let Some(group_row) = &layout.group_row {
            let mut record = Vec::with_capacity(layout.leaf_row.len());
            for header in group_row {
                let title = if header.is_group_header {
                    header.display_title()
                } else {
                    String::new()
                };
                record.extend(std::iter::repeat(title).take(header.colspan.max(1)));
            }
            self.writer.write_record(&record)?;
        }
        self.writer
            .write_record(layout.leaf_row.iter().map(|h| h.display_title()))?;
        Ok(())
    }

    fn row_open(&mut self, _row: &Row, _row_number: usize) -> Result<(), SinkError> {
        self.flush_record()?;
        self.record = Some(Vec::new());
        Ok(())
    }

    fn column_value(&mut self, value: &CellValue, _column: &Column<'_>) -> Result<(), SinkError> {
        let record = self
            .record
            .as_mut()
            .ok_or_else(|| SinkError::message("column value outside of a row"))?;
        record.push(value.display_text());
        Ok(())
    }

    fn footer(&mut self, footer: &str) -> Result<(), SinkError> {
        self.flush_record()?;
        self.writer.write_record([footer])?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.flush_record()?;
        self.writer.flush()?;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Vec<u8>, SinkError> {
        Ok(self.writer.into_inner()?)
    }
}
