//! # gridcastlib
//!
//! Render one in-memory table into several output formats, after per-viewer
//! column customization and in-memory sorting.
//!
//! ## Overview
//!
//! A [`TableModel`] holds header definitions, rows of cells and caption/footer
//! text. An export runs four stages on it:
//!
//! - **Customize**: reconcile the headers with the viewer's [`OverrideSet`]
//!   (reorder, hide, rename, inject synthetic columns) and re-project rows
//! - **Group**: collapse runs of same-group columns into spanning headers
//! - **Sort**: stable sort on the sorted column, full list or page only
//! - **Write**: walk the model once and drive a [`TableSink`]
//!
//! ## Features
//!
//! - **Typed cell values**: numbers, percentages (exported as fractions), dates
//!   and normalized text, classified once for every sink
//! - **Sinks**: CSV, XLSX, HTML, XML and paginated plain text
//! - **Capabilities as traits**: row-level access control through
//!   [`SecurityCheckable`], spreadsheet decorators through [`SheetAware`]
//! - **Pluggable lookup**: property values and localized sort properties come
//!   from a [`PropertyResolver`]
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use gridcastlib::{
//!     export, BeanResolver, ExportConfig, HeaderDefinition, Media, Record, Row,
//!     SinkRegistry, TableModel,
//! };
//!
//! let mut model = TableModel::new("people");
//! model.add_header(HeaderDefinition::new("Name").property("name"));
//! model.add_header(HeaderDefinition::new("Age").property("age").sortable(true));
//! for (name, age) in [("Bo", 41.0), ("Al", 36.0)] {
//!     let record = Record::new().with("name", name).with("age", age);
//!     let row = Row::from_source(Arc::new(record), &model.headers);
//!     model.add_row(row);
//! }
//! model.sort.column = 1;
//!
//! let registry = SinkRegistry::with_defaults();
//! let config = ExportConfig::new(Media::Csv);
//! let output = export(&mut model, &config, &registry, &BeanResolver).unwrap();
//! assert_eq!(
//!     String::from_utf8(output.bytes).unwrap(),
//!     "\"Name\",\"Age\"\n\"Al\",\"36\"\n\"Bo\",\"41\"\n"
//! );
//! ```

pub mod config;
pub mod customize;
pub mod decorator;
pub mod error;
pub mod escape;
pub mod grouping;
pub mod model;
pub mod pipeline;
pub mod resolve;
pub mod sink;
pub mod sort;
pub mod value;
pub mod writer;

pub use config::ExportConfig;
pub use customize::{
    apply_customizations, find_table_customization, OverrideColumn, OverrideSet,
};
pub use decorator::{
    ColumnDecorator, EscapeXmlDecorator, SecurityCheckable, SheetAware, TableDecorator,
};
pub use error::{CapabilityError, ExportError, GridcastError, ResolveError, SinkError};
pub use grouping::{group_headers, HeaderGroups};
pub use model::{
    default_comparator, Cell, Comparator, HeaderDefinition, Record, Row, RowSource, SortState,
    TableModel,
};
pub use pipeline::{export, ExportOutput};
pub use resolve::{
    BeanResolver, DictionaryTranslator, PropertyResolver, TranslatingResolver, Translator,
};
pub use sink::{Media, SinkRegistry, TableSink};
pub use sort::sort_rows;
pub use value::{classify, CellValue, Number, Value};
pub use writer::{write_table, Column, WriteOptions};

/// Result type for gridcastlib operations
pub type Result<T> = std::result::Result<T, GridcastError>;
