//! Column header definitions.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::customize::overrides::OverrideColumn;
use crate::decorator::ColumnDecorator;
use crate::escape::capitalize;
use crate::value::Value;

/// A value comparator attached to a column.
#[derive(Clone)]
pub struct Comparator(Arc<dyn Fn(&Value, &Value) -> Ordering + Send + Sync>);

impl Comparator {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &Value) -> Ordering + Send + Sync + 'static,
    {
        Comparator(Arc::new(f))
    }

    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        (self.0)(a, b)
    }
}

impl fmt::Debug for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Comparator(..)")
    }
}

/// Comparator used for synthetic columns: case-insensitive for text, natural
/// ordering for everything else.
pub fn default_comparator() -> Comparator {
    Comparator::new(|a, b| match (a, b) {
        (Value::Text(x), Value::Text(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        _ => a.natural_cmp(b),
    })
}

/// Metadata for one column.
#[derive(Debug, Clone, Default)]
pub struct HeaderDefinition {
    /// Bound property on the row source
    pub property: Option<String>,
    /// Display title
    pub title: Option<String>,
    pub sortable: bool,
    /// Property used for sorting, when it differs from `property`
    pub sort_property: Option<String>,
    /// Truncation hint for markup output (0 = none)
    pub max_length: usize,
    /// Group title shared by adjacent columns
    pub group_title: Option<String>,
    /// Excluded from viewer customization
    pub non_configurable: bool,
    /// Dense zero-based position in the model
    pub column_index: usize,
    /// Customization record this header was produced from
    pub override_column: Option<OverrideColumn>,
    pub comparator: Option<Comparator>,
    pub decorators: Vec<Arc<dyn ColumnDecorator>>,
    /// Marks the column the table is currently sorted on
    pub already_sorted: bool,
    /// Columns spanned (1 except for group headers)
    pub colspan: usize,
    pub is_group_header: bool,
    /// Presentation attributes, e.g. `class`
    pub attributes: BTreeMap<String, String>,
}

impl HeaderDefinition {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            colspan: 1,
            ..Self::default()
        }
    }

    pub fn property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn sort_property(mut self, property: impl Into<String>) -> Self {
        self.sort_property = Some(property.into());
        self
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn group(mut self, group_title: impl Into<String>) -> Self {
        self.group_title = Some(group_title.into());
        self
    }

    pub fn non_configurable(mut self, non_configurable: bool) -> Self {
        self.non_configurable = non_configurable;
        self
    }

    pub fn comparator(mut self, comparator: Comparator) -> Self {
        self.comparator = Some(comparator);
        self
    }

    pub fn decorator(mut self, decorator: Arc<dyn ColumnDecorator>) -> Self {
        self.decorators.push(decorator);
        self
    }

    /// Title shown in output: the title, else the capitalized property.
    pub fn display_title(&self) -> String {
        match (&self.title, &self.property) {
            (Some(title), _) => title.clone(),
            (None, Some(property)) => capitalize(property),
            (None, None) => String::new(),
        }
    }

    /// Property to sort on: the sort property, else the bound property.
    pub fn effective_sort_property(&self) -> Option<&str> {
        self.sort_property
            .as_deref()
            .or(self.property.as_deref())
    }

    /// Whether this column was injected by a customization ("added" column).
    pub fn is_added(&self) -> bool {
        self.override_column.as_ref().is_some_and(|c| c.is_added)
    }

    /// Group title, if present and not blank.
    pub fn group_key(&self) -> Option<&str> {
        self.group_title
            .as_deref()
            .filter(|g| !g.trim().is_empty())
    }

    /// Append a class to the `class` attribute.
    pub fn add_class(&mut self, class: &str) {
        let entry = self.attributes.entry("class".to_string()).or_default();
        if !entry.is_empty() {
            entry.push(' ');
        }
        entry.push_str(class);
    }
}
