//! Table model: headers, rows, cells and the model that owns them.

pub mod header;
pub mod row;
pub mod table;

pub use header::{default_comparator, Comparator, HeaderDefinition};
pub use row::{Cell, Record, Row, RowSource};
pub use table::{SortState, TableModel};
