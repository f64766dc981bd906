//! Output sinks: format-specific consumers of the traversal events.
//!
//! A sink receives the events of [`crate::writer::write_table`] in a fixed
//! order and produces the bytes of one output format:
//!
//! - **CSV** ([`CsvSink`]): every field quoted
//! - **XLSX** ([`XlsxSink`]): one worksheet with typed cells
//! - **HTML / XML** ([`MarkupSink`]): a `<table>` document with entity escaping
//! - **Document** ([`DocumentSink`]): paginated fixed-width plain text
//!
//! Sinks are looked up by [`Media`] in a [`SinkRegistry`], built once and
//! shared.
//!
//! ## Example
//!
//! ```rust
//! use gridcastlib::{ExportConfig, Media, SinkRegistry};
//!
//! let registry = SinkRegistry::with_defaults();
//! let sink = registry.create(Media::Csv, &ExportConfig::default()).unwrap();
//! assert_eq!(sink.mime_type(), "text/csv");
//! ```

pub mod csv;
pub mod document;
pub mod markup;
pub mod xlsx;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ExportConfig;
use crate::decorator::TableDecorator;
use crate::error::{GridcastError, SinkError};
use crate::grouping::HeaderGroups;
use crate::model::{Row, TableModel};
use crate::value::CellValue;
use crate::writer::Column;

pub use self::csv::CsvSink;
pub use self::document::DocumentSink;
pub use self::markup::MarkupSink;
pub use self::xlsx::XlsxSink;

/// Output medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Media {
    #[default]
    Html,
    Xml,
    Csv,
    Xlsx,
    Document,
}

impl Media {
    pub const ALL: [Media; 5] = [
        Media::Html,
        Media::Xml,
        Media::Csv,
        Media::Xlsx,
        Media::Document,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Media::Html => "html",
            Media::Xml => "xml",
            Media::Csv => "csv",
            Media::Xlsx => "xlsx",
            Media::Document => "document",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Media::Html => "text/html",
            Media::Xml => "text/xml",
            Media::Csv => "text/csv",
            Media::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Media::Document => "text/plain",
        }
    }

    /// File extension for exported files.
    pub fn extension(&self) -> &'static str {
        match self {
            Media::Html => "html",
            Media::Xml => "xml",
            Media::Csv => "csv",
            Media::Xlsx => "xlsx",
            Media::Document => "txt",
        }
    }

    /// Media whose output is structurally markup and gets entity escaping.
    pub fn is_markup(&self) -> bool {
        matches!(self, Media::Html | Media::Xml)
    }
}

impl fmt::Display for Media {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Media {
    type Err = GridcastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" | "htm" => Ok(Media::Html),
            "xml" => Ok(Media::Xml),
            "csv" => Ok(Media::Csv),
            "xlsx" | "excel" => Ok(Media::Xlsx),
            "document" | "doc" | "txt" | "text" => Ok(Media::Document),
            _ => Err(GridcastError::UnknownMedia(s.to_string())),
        }
    }
}

/// Receiver of the traversal events for one output format.
///
/// Events arrive in this order: `open`, `caption` (if any), `header`, per row
/// `decorator_start`, `row_open`, per column `column_open` and `column_value`,
/// then `decorator_finish`; after the rows `footer` (if any),
/// `decorator_table_finish`, `bottom_banner` and `close`. Decorator events
/// only occur when the model carries a decorator.
pub trait TableSink {
    fn media(&self) -> Media;

    fn mime_type(&self) -> &'static str {
        self.media().mime_type()
    }

    fn open(&mut self, model: &TableModel) -> Result<(), SinkError>;

    fn caption(&mut self, _caption: &str) -> Result<(), SinkError> {
        Ok(())
    }

    /// Header rows. `include` is false when the export omits headers.
    fn header(&mut self, layout: &HeaderGroups, include: bool) -> Result<(), SinkError>;

    /// `row_number` is the 1-based physical row being written.
    fn row_open(&mut self, row: &Row, row_number: usize) -> Result<(), SinkError>;

    fn column_open(&mut self, _column: &Column<'_>) -> Result<(), SinkError> {
        Ok(())
    }

    fn column_value(&mut self, value: &CellValue, column: &Column<'_>) -> Result<(), SinkError>;

    fn decorator_start(
        &mut self,
        decorator: &mut dyn TableDecorator,
        row: &Row,
    ) -> Result<(), SinkError> {
        decorator.start_row(row);
        Ok(())
    }

    fn decorator_finish(
        &mut self,
        decorator: &mut dyn TableDecorator,
        row: &Row,
    ) -> Result<(), SinkError> {
        decorator.finish_row(row);
        Ok(())
    }

    fn decorator_table_finish(
        &mut self,
        decorator: &mut dyn TableDecorator,
    ) -> Result<(), SinkError> {
        decorator.finish();
        Ok(())
    }

    fn footer(&mut self, _footer: &str) -> Result<(), SinkError> {
        Ok(())
    }

    fn bottom_banner(&mut self, _model: &TableModel) -> Result<(), SinkError> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError>;

    /// Take the produced bytes.
    fn finish(self: Box<Self>) -> Result<Vec<u8>, SinkError>;
}

/// Builds a sink for one render.
pub type SinkFactory = fn(&ExportConfig) -> Box<dyn TableSink>;

/// Sink factories by media.
///
/// Built once and shared (e.g. behind an `Arc`); lookups never lock.
#[derive(Clone, Default)]
pub struct SinkRegistry {
    factories: HashMap<Media, SinkFactory>,
}

impl SinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in sinks for every media.
    pub fn with_defaults() -> Self {
        Self::new()
            .register(Media::Csv, |config| Box::new(CsvSink::new(config)))
            .register(Media::Xlsx, |config| Box::new(XlsxSink::new(config)))
            .register(Media::Html, |config| {
                Box::new(MarkupSink::new(Media::Html, config))
            })
            .register(Media::Xml, |config| Box::new(MarkupSink::new(Media::Xml, config)))
            .register(Media::Document, |config| Box::new(DocumentSink::new(config)))
    }

    pub fn register(mut self, media: Media, factory: SinkFactory) -> Self {
        self.factories.insert(media, factory);
        self
    }

    pub fn supports(&self, media: Media) -> bool {
        self.factories.contains_key(&media)
    }

    /// Registered media in a stable order.
    pub fn media(&self) -> Vec<Media> {
        Media::ALL
            .into_iter()
            .filter(|m| self.supports(*m))
            .collect()
    }

    pub fn create(
        &self,
        media: Media,
        config: &ExportConfig,
    ) -> Result<Box<dyn TableSink>, GridcastError> {
        let factory = self
            .factories
            .get(&media)
            .ok_or(GridcastError::UnsupportedMedia(media))?;
        Ok(factory(config))
    }
}

impl fmt::Debug for SinkRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkRegistry")
            .field("media", &self.media())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_media_parses_case_insensitively() {
        assert_eq!("CSV".parse::<Media>().unwrap(), Media::Csv);
        assert_eq!("excel".parse::<Media>().unwrap(), Media::Xlsx);
        assert_eq!(" txt ".parse::<Media>().unwrap(), Media::Document);
        assert!(matches!(
            "pdf".parse::<Media>(),
            Err(GridcastError::UnknownMedia(s)) if s == "pdf"
        ));
    }

    #[test]
    fn test_media_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Media::Xlsx).unwrap(), "\"xlsx\"");
        let media: Media = serde_json::from_str("\"document\"").unwrap();
        assert_eq!(media, Media::Document);
        assert_eq!(Media::Html.to_string(), "html");
    }

    #[test]
    fn test_only_html_and_xml_are_markup() {
        let markup: Vec<_> = Media::ALL.into_iter().filter(Media::is_markup).collect();
        assert_eq!(markup, vec![Media::Html, Media::Xml]);
    }

    #[test]
    fn test_registry_creates_sinks_for_every_media() {
        let registry = Arc::new(SinkRegistry::with_defaults());
        let config = ExportConfig::default();
        for media in Media::ALL {
            let sink = registry.create(media, &config).unwrap();
            assert_eq!(sink.media(), media);
            assert_eq!(sink.mime_type(), media.mime_type());
        }
    }

    #[test]
    fn test_registry_reports_unsupported_media() {
        let registry = SinkRegistry::new().register(Media::Csv, |c| Box::new(CsvSink::new(c)));
        assert_eq!(registry.media(), vec![Media::Csv]);
        assert!(matches!(
            registry.create(Media::Xlsx, &ExportConfig::default()),
            Err(GridcastError::UnsupportedMedia(Media::Xlsx))
        ));
    }

    #[test]
    fn test_registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SinkRegistry>();
    }
}
