//! Marker fragments for external column-edit UIs.
//!
//! Each column renders a `<div class='coldata' data-...>` element that client
//! code reads to build its edit dialog. Hidden columns have no header, so their
//! markers are emitted separately.

use crate::escape::escape_markup;
use crate::model::HeaderDefinition;

use super::overrides::{OverrideColumn, OverrideSet};

const SELECT_BOX: &str = "<div>Select</div>";

/// Selection-box columns never get edit controls.
pub fn is_select_box(title: &str) -> bool {
    title.contains(SELECT_BOX)
}

struct ControlData<'a> {
    id: String,
    title: &'a str,
    property: Option<&'a str>,
    hidden: bool,
    sortable: bool,
    sort_property: Option<&'a str>,
    max_length: String,
    is_added: bool,
}

impl ControlData<'_> {
    fn render(&self) -> String {
        format!(
            "<div class='coldata' data-colrecnum='{}' data-title='{}' data-property='{}' \
             data-hidden='{}' data-sortable='{}' data-sortproperty='{}' data-maxlength='{}' \
             data-iscustomcolumn='{}'></div>",
            self.id,
            escape_markup(self.title),
            self.property.unwrap_or("null"),
            self.hidden,
            self.sortable,
            self.sort_property.unwrap_or("null"),
            self.max_length,
            self.is_added,
        )
    }
}

fn override_control(column: &OverrideColumn, hidden: bool) -> Option<String> {
    let title = column.title()?;
    Some(
        ControlData {
            id: column.id.to_string(),
            title,
            property: column.property.as_deref(),
            hidden,
            sortable: column.sortable,
            sort_property: column.sort_property.as_deref(),
            max_length: column.max_length.to_string(),
            is_added: column.is_added,
        }
        .render(),
    )
}

/// Edit-control marker for a rendered header. Empty for untitled and
/// selection-box columns.
pub fn edit_control(header: &HeaderDefinition) -> String {
    let Some(title) = header.title.as_deref() else {
        return String::new();
    };
    if is_select_box(title) {
        return String::new();
    }
    if let Some(column) = &header.override_column {
        return override_control(column, column.hidden).unwrap_or_default();
    }
    ControlData {
        id: String::new(),
        title,
        property: header.property.as_deref(),
        hidden: false,
        sortable: header.sortable,
        sort_property: header.effective_sort_property(),
        max_length: match header.max_length {
            0 => "null".to_string(),
            n => n.to_string(),
        },
        is_added: false,
    }
    .render()
}

/// Concatenated markers for every hidden column of the set.
pub fn hidden_edit_controls(overrides: Option<&OverrideSet>) -> String {
    let Some(overrides) = overrides else {
        return String::new();
    };
    overrides
        .hidden()
        .iter()
        .filter_map(|c| override_control(c, true))
        .collect()
}

/// Hidden input carrying a column's title in display order.
pub fn display_order_input(header: &HeaderDefinition) -> String {
    let title = header.title.as_deref().unwrap_or_default();
    if is_select_box(title) {
        return String::new();
    }
    format!(
        "<input type='hidden' class='columnOrder' name='columnOrder' value='{}'/>",
        escape_markup(title)
    )
}
