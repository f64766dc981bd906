//! Spreadsheet output.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook, Worksheet};

use crate::config::ExportConfig;
use crate::decorator::TableDecorator;
use crate::error::SinkError;
use crate::grouping::HeaderGroups;
use crate::model::{Row, TableModel};
use crate::value::CellValue;
use crate::writer::Column;

use super::{Media, TableSink};

const MAX_SHEET_NAME: usize = 31;

/// XLSX sink writing one worksheet named after the table.
pub struct XlsxSink {
    sheet: Worksheet,
    formats: Formats,
    width: usize,
    /// Next free row
    next_row: u32,
    /// Row being written
    current_row: u32,
    sheet_hook_disabled: bool,
}

struct Formats {
    caption: Format,
    header: Format,
    percent: Format,
    date: Format,
    datetime: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            caption: Format::new()
                .set_bold()
                .set_font_size(14)
                .set_align(FormatAlign::Center),
            header: Format::new()
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(0x666699)),
            percent: Format::new().set_num_format("0.00%"),
            date: Format::new().set_num_format("yyyy-mm-dd"),
            datetime: Format::new().set_num_format("yyyy-mm-dd hh:mm:ss"),
        }
    }
}

impl XlsxSink {
    pub fn new(_config: &ExportConfig) -> Self {
        Self {
            sheet: Worksheet::new(),
            formats: Formats::new(),
            width: 0,
            next_row: 0,
            current_row: 0,
            sheet_hook_disabled: false,
        }
    }

    fn take_row(&mut self) -> u32 {
        let row = self.next_row;
        self.next_row += 1;
        row
    }

    /// Text over `span` columns starting at `first`, merged when wider than
    /// one column.
    fn write_span(
        &mut self,
        row: u32,
        first: usize,
        span: usize,
        text: &str,
        header: bool,
    ) -> Result<(), SinkError> {
        let format = if header {
            &self.formats.header
        } else {
            &self.formats.caption
        };
        let first_col = column_number(first)?;
        if span > 1 {
            let last_col = column_number(first + span - 1)?;
            self.sheet
                .merge_range(row, first_col, row, last_col, text, format)?;
        } else {
            self.sheet
                .write_string_with_format(row, first_col, text, format)?;
        }
        Ok(())
    }
}

fn column_number(index: usize) -> Result<u16, SinkError> {
    u16::try_from(index).map_err(|_| SinkError::message(format!("column {} out of range", index)))
}

/// Worksheet names: at most 31 characters, none of `[]:*?/\`.
fn sheet_name(id: &str) -> String {
    let name: String = id
        .trim()
        .chars()
        .map(|c| if "[]:*?/\\".contains(c) { '_' } else { c })
        .take(MAX_SHEET_NAME)
        .collect();
    if name.is_empty() {
        "-".to_string()
    } else {
        name
    }
}

/// Days since the 1899-12-30 spreadsheet epoch, time as the fraction.
fn excel_serial(dt: &NaiveDateTime) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default();
    let days = (dt.date() - epoch).num_days() as f64;
    days + dt.num_seconds_from_midnight() as f64 / 86_400.0
}

impl TableSink for XlsxSink {
    fn media(&self) -> Media {
        Media::Xlsx
    }

    fn open(&mut self, model: &TableModel) -> Result<(), SinkError> {
        self.sheet.set_name(sheet_name(&model.id))?;
        self.width = model.column_count();
        Ok(())
    }

    fn caption(&mut self, caption: &str) -> Result<(), SinkError> {
        let row = self.take_row();
        self.write_span(row, 0, self.width.max(1), caption, false)
    }

    fn header(&mut self, layout: &HeaderGroups, include: bool) -> Result<(), SinkError> {
        if !include {
            return Ok(());
        }
        if let Some(group_row) = &layout.group_row {
            let row = self.take_row();
            let mut col = 0;
            for header in group_row {
                let span = header.colspan.max(1);
                let title = if header.is_group_header {
                    header.display_title()
                } else {
                    String::new()
                };
                self.write_span(row, col, span, &title, true)?;
                col += span;
            }
        }
        let row = self.take_row();
        for (col, header) in layout.leaf_row.iter().enumerate() {
            self.write_span(row, col, 1, &header.display_title(), true)?;
        }
        Ok(())
    }

    fn row_open(&mut self, _row: &Row, _row_number: usize) -> Result<(), SinkError> {
        self.current_row = self.take_row();
        Ok(())
    }

    fn column_value(&mut self, value: &CellValue, column: &Column<'_>) -> Result<(), SinkError> {
        let row = self.current_row;
        let col = column_number(column.column_index)?;
        match value {
            CellValue::Empty => {}
            CellValue::Numeric(n) => {
                self.sheet.write_number(row, col, *n)?;
            }
            CellValue::Percentage(fraction) => {
                self.sheet
                    .write_number_with_format(row, col, *fraction, &self.formats.percent)?;
            }
            CellValue::Date(dt) => {
                let format = if dt.num_seconds_from_midnight() == 0 {
                    &self.formats.date
                } else {
                    &self.formats.datetime
                };
                self.sheet
                    .write_number_with_format(row, col, excel_serial(dt), format)?;
            }
            CellValue::Text(text) => {
                self.sheet.write_string(row, col, text)?;
            }
        }
        Ok(())
    }

    fn decorator_finish(
        &mut self,
        decorator: &mut dyn TableDecorator,
        row: &Row,
    ) -> Result<(), SinkError> {
        if !self.sheet_hook_disabled {
            match decorator.as_sheet_aware() {
                Ok(Some(aware)) => {
                    self.next_row = aware.write_to_sheet(&mut self.sheet, self.next_row)?;
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "sheet decorator unavailable, skipping for this export"
                    );
                    self.sheet_hook_disabled = true;
                }
            }
        }
        decorator.finish_row(row);
        Ok(())
    }

    fn footer(&mut self, footer: &str) -> Result<(), SinkError> {
        let row = self.take_row();
        self.write_span(row, 0, self.width.max(1), footer, true)
    }

    fn bottom_banner(&mut self, _model: &TableModel) -> Result<(), SinkError> {
        self.sheet.autofit();
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Vec<u8>, SinkError> {
        let mut workbook = Workbook::new();
        workbook.push_worksheet(self.sheet);
        Ok(workbook.save_to_buffer()?)
    }
}
