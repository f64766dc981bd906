//! Capability traits consumed by the writer and the column decorators.

use std::fmt;

use rust_xlsxwriter::{Worksheet, XlsxError};

use crate::error::CapabilityError;
use crate::escape::{escape_markup, is_custom_grid_fragment, strip_tags};
use crate::model::Row;
use crate::sink::Media;
use crate::value::Value;

/// Row-level access control exposed by a row source.
pub trait SecurityCheckable {
    /// `Ok(true)` when the current viewer may not see the row's values.
    fn is_secured_for_user(&self) -> Result<bool, CapabilityError>;
}

/// Per-render lifecycle hooks attached to a table model.
pub trait TableDecorator: Send {
    /// Called before a row is opened.
    fn start_row(&mut self, _row: &Row) {}

    /// Called after a row's last column.
    fn finish_row(&mut self, _row: &Row) {}

    /// Called once after the last row (and the footer).
    fn finish(&mut self) {}

    /// Decorators that write directly into a spreadsheet return themselves.
    fn as_sheet_aware(&mut self) -> Result<Option<&mut dyn SheetAware>, CapabilityError> {
        Ok(None)
    }
}

/// A decorator that needs the worksheet being written.
pub trait SheetAware {
    /// Write into the sheet at `next_row` and return the next free row.
    fn write_to_sheet(&mut self, sheet: &mut Worksheet, next_row: u32) -> Result<u32, XlsxError>;
}

/// Transforms a column's values before classification.
pub trait ColumnDecorator: fmt::Debug + Send + Sync {
    fn decorate(&self, value: Value, media: Media) -> Value;

    /// Whether text this decorator returns for markup media is already
    /// entity-escaped. Markup sinks write such text as is.
    fn escapes_markup(&self) -> bool {
        false
    }
}

/// Markup escaping for injected columns.
///
/// Custom-grid fragments stay as markup for HTML and are flattened to their
/// comma-joined text everywhere else. Flattened and plain text is
/// entity-escaped for HTML and XML only.
#[derive(Debug, Clone, Copy, Default)]
pub struct EscapeXmlDecorator;

impl ColumnDecorator for EscapeXmlDecorator {
    fn decorate(&self, value: Value, media: Media) -> Value {
        let Value::Text(text) = value else {
            return value;
        };
        let text = if is_custom_grid_fragment(&text) {
            if media == Media::Html {
                return Value::Text(text);
            }
            strip_tags(&text)
        } else {
            text
        };
        if media.is_markup() {
            Value::Text(escape_markup(&text).into_owned())
        } else {
            Value::Text(text)
        }
    }

    fn escapes_markup(&self) -> bool {
        true
    }
}
