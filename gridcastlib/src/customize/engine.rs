//! Reconcile a model's headers with a viewer's override set.

use std::collections::HashMap;
use std::sync::Arc;

use crate::decorator::EscapeXmlDecorator;
use crate::model::{Cell, Comparator, HeaderDefinition, TableModel};

use super::overrides::OverrideColumn;

/// Where an output column comes from.
enum Origin {
    /// Index of the matched header in the pre-customization list
    Canonical(usize),
    Added,
}

/// Rewrite the model's headers and rows according to its override set.
///
/// Visible overrides are applied in display order: canonical columns are
/// matched by title and may be renamed, added columns are synthesized with
/// `tie_break` as comparator. Overrides whose title matches no header are
/// dropped. Every row is then re-projected onto the new column list.
///
/// Overrides are applied once; later calls leave the model alone.
pub fn apply_customizations(model: &mut TableModel, tie_break: Option<Comparator>) {
    if model.customization_disabled || model.customized {
        return;
    }
    let Some(overrides) = model.overrides.take() else {
        return;
    };

    // Duplicate titles alias: the last header with a title wins
    let mut by_title: HashMap<&str, usize> = HashMap::new();
    for (i, header) in model.headers.iter().enumerate() {
        if let Some(title) = header.title.as_deref() {
            by_title.insert(title, i);
        }
    }

    let mut headers = Vec::with_capacity(overrides.visible().len());
    let mut origins = Vec::with_capacity(overrides.visible().len());
    for column in overrides.visible() {
        if column.is_added {
            headers.push(added_header(column, tie_break.clone()));
            origins.push(Origin::Added);
            continue;
        }
        let Some(&index) = column
            .canonical_title
            .as_ref()
            .and_then(|title| by_title.get(title.as_str()))
        else {
            tracing::debug!(
                table = %model.id,
                title = column.canonical_title.as_deref().unwrap_or_default(),
                "dropping override without matching column"
            );
            continue;
        };
        let mut header = model.headers[index].clone();
        if let Some(custom) = column.custom_title.as_deref() {
            if !custom.trim().is_empty() && Some(custom) != header.title.as_deref() {
                header.title = Some(custom.to_string());
            }
        }
        header.override_column = Some(column.clone());
        headers.push(header);
        origins.push(Origin::Canonical(index));
    }

    let sorted = sorted_position(model, &headers);
    for (i, header) in headers.iter_mut().enumerate() {
        header.column_index = i;
        header.already_sorted = sorted == Some(i);
    }

    for row in model.rows_full_mut().iter_mut() {
        let cells = origins
            .iter()
            .map(|origin| match origin {
                Origin::Canonical(index) => row.cells.get(*index).cloned().unwrap_or_default(),
                Origin::Added => Cell::placeholder(),
            })
            .collect();
        row.cells = cells;
    }

    tracing::debug!(
        table = %model.id,
        before = model.headers.len(),
        after = headers.len(),
        "applied customizations"
    );
    model.headers = headers;
    model.overrides = Some(overrides);
    model.customized = true;
}

fn added_header(column: &OverrideColumn, tie_break: Option<Comparator>) -> HeaderDefinition {
    HeaderDefinition {
        property: column.property.clone(),
        title: column.title().map(str::to_string),
        sortable: column.sortable,
        sort_property: column.sort_property.clone(),
        max_length: usize::try_from(column.max_length).unwrap_or(0),
        non_configurable: column.non_configurable,
        override_column: Some(column.clone()),
        comparator: tie_break,
        decorators: vec![Arc::new(EscapeXmlDecorator)],
        colspan: 1,
        ..HeaderDefinition::default()
    }
}

/// Output position of the column to mark as sorted.
///
/// Local sort marks the sorted column index. External sort, and local sort
/// with no column picked yet, mark the first column whose sort property
/// matches the reported (or default) property.
fn sorted_position(model: &TableModel, headers: &[HeaderDefinition]) -> Option<usize> {
    match usize::try_from(model.sort.column) {
        Ok(index) if model.sort.local => (index < headers.len()).then_some(index),
        _ => headers.iter().position(|h| model.is_default_sort_column(h)),
    }
}
