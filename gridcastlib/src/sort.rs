//! Stable in-memory row sorting.

use std::cmp::Ordering;

use crate::model::{Comparator, Row};
use crate::resolve::PropertyResolver;
use crate::value::Value;

/// Sort rows on one column.
///
/// Keys come from `sort_property` through the resolver when set, else from
/// the cell at `column_index`. A key that cannot be resolved compares equal
/// to everything, so the affected rows keep their relative order. The
/// comparator, when given, replaces natural value ordering; descending order
/// negates its result.
pub fn sort_rows(
    rows: &mut [Row],
    column_index: i32,
    sort_property: Option<&str>,
    ascending: bool,
    comparator: Option<&Comparator>,
    resolver: &dyn PropertyResolver,
) {
    let Ok(column) = usize::try_from(column_index) else {
        return;
    };
    if rows.len() < 2 {
        return;
    }

    let keys: Vec<Option<Value>> = rows
        .iter()
        .map(|row| sort_key(row, column, sort_property, resolver))
        .collect();

    let compare = |a: &Option<Value>, b: &Option<Value>| -> Ordering {
        let (Some(a), Some(b)) = (a, b) else {
            return Ordering::Equal;
        };
        let ord = match comparator {
            Some(c) => c.compare(a, b),
            None => a.natural_cmp(b),
        };
        if ascending {
            ord
        } else {
            ord.reverse()
        }
    };

    let mut order: Vec<usize> = (0..rows.len()).collect();
    merge_sort(&mut order, &|x: &usize, y: &usize| compare(&keys[*x], &keys[*y]));

    let sorted: Vec<Row> = order.iter().map(|&i| rows[i].clone()).collect();
    for (slot, row) in rows.iter_mut().zip(sorted) {
        *slot = row;
    }
}

fn sort_key(
    row: &Row,
    column: usize,
    sort_property: Option<&str>,
    resolver: &dyn PropertyResolver,
) -> Option<Value> {
    match sort_property {
        Some(property) => match resolver.resolve(row.source.as_ref(), property) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::trace!(row = row.number, error = %e, "sort key unresolved");
                None
            }
        },
        None => row.cell(column).and_then(|c| c.value.clone()),
    }
}

/// Top-down merge sort. Only `Greater` moves an element ahead, so equal
/// elements keep their input order even when `cmp` is not a total order.
fn merge_sort<T: Copy>(items: &mut [T], cmp: &dyn Fn(&T, &T) -> Ordering) {
    let len = items.len();
    if len < 2 {
        return;
    }
    let mid = len / 2;
    merge_sort(&mut items[..mid], cmp);
    merge_sort(&mut items[mid..], cmp);

    let mut merged = Vec::with_capacity(len);
    let (mut i, mut j) = (0, mid);
    while i < mid && j < len {
        if cmp(&items[i], &items[j]) == Ordering::Greater {
            merged.push(items[j]);
            j += 1;
        } else {
            merged.push(items[i]);
            i += 1;
        }
    }
    merged.extend_from_slice(&items[i..mid]);
    merged.extend_from_slice(&items[j..len]);
    items.copy_from_slice(&merged);
}
