//! Export configuration.
//!
//! All fields have defaults, so a configuration file only needs the keys it
//! changes:
//!
//! ```json
//! { "media": "xlsx", "export_full_list": false, "secured_mask": "***" }
//! ```

use serde::{Deserialize, Serialize};

use crate::sink::Media;
use crate::writer::WriteOptions;
use crate::Result;

/// Options for one export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Output medium
    pub media: Media,
    /// Export every row rather than only the displayed page
    pub export_full_list: bool,
    /// Write the header rows
    pub include_header: bool,
    /// Default sort property for externally sorted tables
    pub default_sort_property: Option<String>,
    /// Field delimiter of the CSV sink
    pub csv_delimiter: u8,
    /// Lines per page of the document sink, header included
    pub document_page_lines: usize,
    /// Column width of the document sink, in characters
    pub document_column_width: usize,
    /// Text written for values of secured rows
    pub secured_mask: String,
    /// Emit the column edit controls in HTML headers
    pub customization_mode: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            media: Media::default(),
            export_full_list: true,
            include_header: true,
            default_sort_property: None,
            csv_delimiter: b',',
            document_page_lines: 60,
            document_column_width: 16,
            secured_mask: String::new(),
            customization_mode: false,
        }
    }
}

impl ExportConfig {
    pub fn new(media: Media) -> Self {
        Self {
            media,
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn export_full_list(mut self, full: bool) -> Self {
        self.export_full_list = full;
        self
    }

    pub fn include_header(mut self, include: bool) -> Self {
        self.include_header = include;
        self
    }

    pub fn default_sort_property(mut self, property: impl Into<String>) -> Self {
        self.default_sort_property = Some(property.into());
        self
    }

    pub fn csv_delimiter(mut self, delimiter: u8) -> Self {
        self.csv_delimiter = delimiter;
        self
    }

    pub fn document_page_lines(mut self, lines: usize) -> Self {
        self.document_page_lines = lines;
        self
    }

    pub fn document_column_width(mut self, width: usize) -> Self {
        self.document_column_width = width;
        self
    }

    pub fn secured_mask(mut self, mask: impl Into<String>) -> Self {
        self.secured_mask = mask.into();
        self
    }

    pub fn customization_mode(mut self, enabled: bool) -> Self {
        self.customization_mode = enabled;
        self
    }

    /// Traversal options derived from this configuration.
    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            full_list: self.export_full_list,
            include_header: self.include_header,
            group_headers: true,
            secured_mask: self.secured_mask.clone(),
        }
    }
}
