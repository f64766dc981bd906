//! Rows, cells and the source objects rows are built from.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::decorator::SecurityCheckable;
use crate::error::CapabilityError;
use crate::value::Value;

/// The object a row was derived from.
///
/// Capabilities are explicit: a source that supports row-level access
/// control returns itself from [`RowSource::as_security_checkable`].
pub trait RowSource: fmt::Debug + Send + Sync {
    /// Read a named property.
    fn property(&self, name: &str) -> Option<Value>;

    fn as_security_checkable(&self) -> Option<&dyn SecurityCheckable> {
        None
    }
}

/// A map-backed row source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub values: BTreeMap<String, Value>,
    /// `Some(true)` when the viewer may not see this row's values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secured_for_user: Option<bool>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn secured(mut self, secured: bool) -> Self {
        self.secured_for_user = Some(secured);
        self
    }

    /// Build a record from a JSON object, converting each member with
    /// [`Value::from_json`]. The `securedForUser` member feeds the access
    /// check instead of becoming a property.
    pub fn from_json(object: &serde_json::Map<String, serde_json::Value>) -> Self {
        let mut record = Record::new();
        for (name, value) in object {
            if name == "securedForUser" {
                record.secured_for_user = value.as_bool();
            } else {
                record.values.insert(name.clone(), Value::from_json(value));
            }
        }
        record
    }
}

impl RowSource for Record {
    fn property(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    fn as_security_checkable(&self) -> Option<&dyn SecurityCheckable> {
        self.secured_for_user.map(|_| self as &dyn SecurityCheckable)
    }
}

impl SecurityCheckable for Record {
    fn is_secured_for_user(&self) -> Result<bool, CapabilityError> {
        Ok(self.secured_for_user.unwrap_or(false))
    }
}

/// A value slot in a row plus its presentation attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    /// `None` is the empty placeholder, resolved lazily at write time
    pub value: Option<Value>,
    pub attributes: BTreeMap<String, String>,
}

impl Cell {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: Some(value.into()),
            attributes: BTreeMap::new(),
        }
    }

    /// Placeholder for a column whose value is resolved by property lookup.
    pub fn placeholder() -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert("class".to_string(), "result".to_string());
        Self {
            value: None,
            attributes,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.value.is_none()
    }
}

/// One row of the table.
#[derive(Debug, Clone)]
pub struct Row {
    pub cells: Vec<Cell>,
    pub source: Arc<dyn RowSource>,
    /// 1-based position in the full list, assigned when added to a model
    pub number: usize,
}

impl Row {
    pub fn new(source: Arc<dyn RowSource>, cells: Vec<Cell>) -> Self {
        Self {
            cells,
            source,
            number: 0,
        }
    }

    /// Build a row by materializing one cell per header from the source's
    /// bound properties. Headers without a property get a placeholder.
    pub fn from_source(source: Arc<dyn RowSource>, headers: &[super::HeaderDefinition]) -> Self {
        let cells = headers
            .iter()
            .map(|h| match h.property.as_deref() {
                Some(property) => Cell {
                    value: Some(source.property(property).unwrap_or_default()),
                    attributes: BTreeMap::new(),
                },
                None => Cell::placeholder(),
            })
            .collect();
        Self::new(source, cells)
    }

    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }
}
