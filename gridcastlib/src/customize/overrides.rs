//! Per-viewer column customization records.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use crate::error::GridcastError;
use crate::Result;

/// One column's customization, as delivered by the customization payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideColumn {
    /// Stable record id
    pub id: i64,
    /// Canonical title, the matching key against header titles
    pub canonical_title: Option<String>,
    pub custom_title: Option<String>,
    pub display_order: i64,
    pub hidden: bool,
    pub property: Option<String>,
    pub sortable: bool,
    pub sort_property: Option<String>,
    pub max_length: i64,
    /// Synthetic column with no canonical counterpart
    pub is_added: bool,
    pub non_configurable: bool,
    pub sort_direction: Option<String>,
}

impl OverrideColumn {
    /// The non-blank custom title, else the canonical title.
    pub fn title(&self) -> Option<&str> {
        self.custom_title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or(self.canonical_title.as_deref())
    }

    /// Parse one entry of `columnConfigurations`. Missing or mistyped fields
    /// take their defaults.
    pub fn from_json(config: &Json) -> Self {
        OverrideColumn {
            id: int_field(config, "colrecnum"),
            canonical_title: str_field(config, "cotsTitle"),
            custom_title: str_field(config, "customTitle"),
            display_order: int_field(config, "displayOrder"),
            hidden: bool_field(config, "hidden"),
            property: str_field(config, "propertyName"),
            sortable: bool_field(config, "sortable"),
            sort_property: str_field(config, "sortProperty"),
            max_length: int_field(config, "maxLength"),
            is_added: bool_field(config, "isAdded"),
            non_configurable: bool_field(config, "nonConfigurable"),
            sort_direction: str_field(config, "sortDirection"),
        }
    }
}

fn str_field(config: &Json, name: &str) -> Option<String> {
    match config.get(name)? {
        Json::String(s) => Some(s.clone()),
        Json::Null => None,
        other => Some(other.to_string()),
    }
}

fn int_field(config: &Json, name: &str) -> i64 {
    match config.get(name) {
        Some(Json::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Json::String(s)) => parse_long(s),
        _ => 0,
    }
}

fn bool_field(config: &Json, name: &str) -> bool {
    match config.get(name) {
        Some(Json::Bool(b)) => *b,
        Some(Json::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Lenient integer parse: anything that is not a number is 0.
fn parse_long(s: &str) -> i64 {
    s.trim().parse().unwrap_or(0)
}

/// A viewer's customization of one table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideSet {
    pub record_id: i64,
    visible: Vec<OverrideColumn>,
    hidden: Vec<OverrideColumn>,
    added: Vec<OverrideColumn>,
    by_canonical_title: HashMap<String, OverrideColumn>,
    default_sort_property: Option<String>,
}

impl OverrideSet {
    /// Partition columns and order the visible ones by display order.
    pub fn new(
        record_id: i64,
        columns: Vec<OverrideColumn>,
        default_sort_property: Option<String>,
    ) -> Self {
        let mut set = OverrideSet {
            record_id,
            default_sort_property,
            ..OverrideSet::default()
        };
        for column in columns {
            if !column.is_added {
                if let Some(title) = &column.canonical_title {
                    set.by_canonical_title.insert(title.clone(), column.clone());
                }
            }
            if column.is_added {
                set.added.push(column.clone());
            }
            if column.hidden {
                set.hidden.push(column);
            } else {
                set.visible.push(column);
            }
        }
        // Vec::sort_by_key is stable: equal display orders keep input order
        set.visible.sort_by_key(|c| c.display_order);
        set
    }

    /// Parse a table payload:
    /// `{"columnConfigurations": [...], "defaultTableSortProperty": ...}`.
    pub fn from_payload(record_id: i64, payload: &Json) -> Result<Self> {
        let configs = payload
            .get("columnConfigurations")
            .and_then(Json::as_array)
            .ok_or_else(|| {
                GridcastError::Payload("missing columnConfigurations array".to_string())
            })?;
        let columns = configs.iter().map(OverrideColumn::from_json).collect();
        let default_sort_property = str_field(payload, "defaultTableSortProperty");
        Ok(Self::new(record_id, columns, default_sort_property))
    }

    pub fn visible(&self) -> &[OverrideColumn] {
        &self.visible
    }

    pub fn hidden(&self) -> &[OverrideColumn] {
        &self.hidden
    }

    pub fn added(&self) -> &[OverrideColumn] {
        &self.added
    }

    /// Non-added column with this canonical title (case-sensitive).
    pub fn by_canonical_title(&self, title: &str) -> Option<&OverrideColumn> {
        self.by_canonical_title.get(title)
    }

    pub fn default_sort_property(&self) -> Option<&str> {
        self.default_sort_property.as_deref()
    }
}

/// Pick the customization for a table out of a request payload.
///
/// Keys have the form `<tableId>-<recordId>`. The first key with exactly two
/// parts, a matching table id and a record id other than -1 wins.
pub fn find_table_customization(
    table_id: &str,
    payloads: &Map<String, Json>,
) -> Result<Option<OverrideSet>> {
    for (key, payload) in payloads {
        let parts: Vec<&str> = key.split('-').collect();
        if parts.len() != 2 || parts[0] != table_id {
            continue;
        }
        let record_id = parse_long(parts[1]);
        if record_id == -1 || payload.is_null() {
            continue;
        }
        tracing::debug!(table = table_id, record_id, "found table customization");
        return OverrideSet::from_payload(record_id, payload).map(Some);
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn column(title: &str, order: i64) -> OverrideColumn {
        OverrideColumn {
            canonical_title: Some(title.to_string()),
            display_order: order,
            ..OverrideColumn::default()
        }
    }

    #[test]
    fn test_title_prefers_non_blank_custom_title() {
        let mut c = column("Name", 0);
        assert_eq!(c.title(), Some("Name"));
        c.custom_title = Some("   ".to_string());
        assert_eq!(c.title(), Some("Name"));
        c.custom_title = Some("Full name".to_string());
        assert_eq!(c.title(), Some("Full name"));
    }

    #[test]
    fn test_visible_order_is_stable_by_display_order() {
        let set = OverrideSet::new(
            1,
            vec![column("A", 2), column("B", 1), column("C", 2), column("D", 0)],
            None,
        );
        let titles: Vec<_> = set.visible().iter().filter_map(|c| c.title()).collect();
        assert_eq!(titles, vec!["D", "B", "A", "C"]);
    }

    #[test]
    fn test_partitions() {
        let mut hidden = column("H", 0);
        hidden.hidden = true;
        let mut added = column("X", 1);
        added.is_added = true;
        let set = OverrideSet::new(1, vec![column("A", 0), hidden, added], None);
        assert_eq!(set.visible().len(), 2);
        assert_eq!(set.hidden().len(), 1);
        assert_eq!(set.added().len(), 1);
        assert!(set.by_canonical_title("X").is_none());
        assert!(set.by_canonical_title("H").is_some());
    }

    #[test]
    fn test_payload_defaults() {
        let payload = json!({
            "columnConfigurations": [
                {"cotsTitle": "Name", "displayOrder": "x", "hidden": "yes"},
                {"colrecnum": 7, "cotsTitle": "Age", "sortable": true, "maxLength": 20}
            ],
            "defaultTableSortProperty": null
        });
        let set = OverrideSet::from_payload(3, &payload).unwrap();
        let name = set.by_canonical_title("Name").unwrap();
        assert_eq!(name.id, 0);
        assert_eq!(name.display_order, 0);
        assert!(!name.hidden);
        assert_eq!(name.custom_title, None);
        let age = set.by_canonical_title("Age").unwrap();
        assert_eq!(age.id, 7);
        assert!(age.sortable);
        assert_eq!(age.max_length, 20);
        assert_eq!(set.default_sort_property(), None);
    }

    #[test]
    fn test_missing_configurations_is_an_error() {
        assert!(OverrideSet::from_payload(1, &json!({})).is_err());
    }

    #[test]
    fn test_find_table_customization() {
        let payloads = json!({
            "other-5": {"columnConfigurations": []},
            "orders-x-1": {"columnConfigurations": []},
            "orders--1": {"columnConfigurations": []},
            "orders-12": {"columnConfigurations": [{"cotsTitle": "A"}]}
        });
        let set = find_table_customization("orders", payloads.as_object().unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(set.record_id, 12);
        assert_eq!(set.visible().len(), 1);
    }

    #[test]
    fn test_find_table_customization_invalid_number_is_zero() {
        let payloads = json!({"orders-abc": {"columnConfigurations": []}});
        let set = find_table_customization("orders", payloads.as_object().unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(set.record_id, 0);
    }

    #[test]
    fn test_find_table_customization_none() {
        let payloads = json!({"other-1": {"columnConfigurations": []}});
        assert!(find_table_customization("orders", payloads.as_object().unwrap())
            .unwrap()
            .is_none());
    }
}
