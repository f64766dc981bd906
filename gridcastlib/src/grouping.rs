//! Two-tier headers: spanning group headers over runs of same-group columns.

use crate::model::HeaderDefinition;

/// Header layout handed to sinks.
#[derive(Debug, Clone, Default)]
pub struct HeaderGroups {
    pub is_grouped: bool,
    /// Spanning headers interleaved with ungrouped headers, `None` when no
    /// column has a group title
    pub group_row: Option<Vec<HeaderDefinition>>,
    /// The input headers, unchanged
    pub leaf_row: Vec<HeaderDefinition>,
}

impl HeaderGroups {
    /// Layout without a group row.
    pub fn flat(headers: &[HeaderDefinition]) -> Self {
        HeaderGroups {
            is_grouped: false,
            group_row: None,
            leaf_row: headers.to_vec(),
        }
    }
}

/// Collapse runs of consecutive headers sharing a non-blank group title into
/// one spanning header each.
pub fn group_headers(headers: &[HeaderDefinition]) -> HeaderGroups {
    let mut group_row = Vec::new();
    let mut is_grouped = false;
    let mut run: Option<(&str, usize)> = None;

    for header in headers {
        match (run, header.group_key()) {
            (Some((title, len)), Some(group)) if title == group => {
                run = Some((title, len + 1));
                continue;
            }
            (Some((title, len)), _) => group_row.push(spanning_header(title, len)),
            (None, _) => {}
        }
        match header.group_key() {
            Some(group) => {
                is_grouped = true;
                run = Some((group, 1));
            }
            None => {
                run = None;
                group_row.push(header.clone());
            }
        }
    }
    if let Some((title, len)) = run {
        group_row.push(spanning_header(title, len));
    }

    HeaderGroups {
        is_grouped,
        group_row: is_grouped.then_some(group_row),
        leaf_row: headers.to_vec(),
    }
}

fn spanning_header(title: &str, colspan: usize) -> HeaderDefinition {
    let mut header = HeaderDefinition::new(title);
    header.colspan = colspan;
    header.sortable = false;
    header.is_group_header = true;
    header.add_class("groupedHead");
    header
}
