//! JSON table documents read by the CLI.
//!
//! ```json
//! {
//!   "id": "people",
//!   "caption": "People",
//!   "columns": [
//!     {"title": "Name", "property": "name", "sortable": true},
//!     {"title": "Street", "property": "street", "group": "Address"}
//!   ],
//!   "rows": [{"name": "Ada", "street": "Main St"}]
//! }
//! ```

use std::sync::Arc;

use gridcastlib::{HeaderDefinition, Record, Row, SortState, TableModel};
use serde::Deserialize;

/// A column as declared in a table document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DocumentColumn {
    pub title: Option<String>,
    pub property: Option<String>,
    pub sortable: bool,
    pub sort_property: Option<String>,
    pub max_length: usize,
    pub group: Option<String>,
    pub non_configurable: bool,
}

impl DocumentColumn {
    fn to_header(&self) -> HeaderDefinition {
        HeaderDefinition {
            title: self.title.clone(),
            property: self.property.clone(),
            sortable: self.sortable,
            sort_property: self.sort_property.clone(),
            max_length: self.max_length,
            group_title: self.group.clone(),
            non_configurable: self.non_configurable,
            colspan: 1,
            ..HeaderDefinition::default()
        }
    }
}

/// A whole table document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TableDocument {
    pub id: String,
    pub caption: Option<String>,
    pub footer: Option<String>,
    pub columns: Vec<DocumentColumn>,
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
}

impl TableDocument {
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Build the model; cells are materialized from each column's property.
    /// The sort state is set first so the sorted header is marked.
    pub fn into_model(self, sort: SortState) -> TableModel {
        let mut model = TableModel::new(self.id);
        model.caption = self.caption;
        model.footer = self.footer;
        model.sort = sort;
        for column in &self.columns {
            model.add_header(column.to_header());
        }
        for object in &self.rows {
            let source = Arc::new(Record::from_json(object));
            let row = Row::from_source(source, &model.headers);
            model.add_row(row);
        }
        model
    }
}
