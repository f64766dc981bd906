//! Property lookup on row sources, with optional localization.

use crate::error::ResolveError;
use crate::model::RowSource;
use crate::value::Value;

/// Reads named properties from row sources.
pub trait PropertyResolver {
    fn resolve(&self, source: &dyn RowSource, property: &str) -> Result<Value, ResolveError>;

    /// Property an external sort should use for a column bound to `property`,
    /// when it differs from the property itself.
    fn sort_property(&self, _source: &dyn RowSource, _property: &str) -> Option<String> {
        None
    }
}

/// Reads the property directly from the source. Missing properties are an
/// error so that sorting can treat them as ties.
#[derive(Debug, Clone, Copy, Default)]
pub struct BeanResolver;

impl PropertyResolver for BeanResolver {
    fn resolve(&self, source: &dyn RowSource, property: &str) -> Result<Value, ResolveError> {
        source
            .property(property)
            .ok_or_else(|| ResolveError::new(property, "no such property"))
    }
}

/// Localization lookup.
pub trait Translator {
    /// Translated value of `property` for this source, `Ok(None)` when the
    /// property is not translated.
    fn translate_name(
        &self,
        source: &dyn RowSource,
        property: &str,
    ) -> Result<Option<Value>, ResolveError>;

    /// Property an external sort should use for a column bound to `property`.
    fn translate_sort_property(&self, source: &dyn RowSource, property: &str) -> Option<String>;
}

/// Tries the translator first and falls back to the plain property.
#[derive(Debug, Clone, Default)]
pub struct TranslatingResolver<T> {
    translator: T,
}

impl<T: Translator> TranslatingResolver<T> {
    pub fn new(translator: T) -> Self {
        Self { translator }
    }

    pub fn translator(&self) -> &T {
        &self.translator
    }
}

impl<T: Translator> PropertyResolver for TranslatingResolver<T> {
    fn resolve(&self, source: &dyn RowSource, property: &str) -> Result<Value, ResolveError> {
        match self.translator.translate_name(source, property) {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(property, error = %e, "translation failed");
            }
        }
        BeanResolver.resolve(source, property)
    }

    fn sort_property(&self, source: &dyn RowSource, property: &str) -> Option<String> {
        self.translator.translate_sort_property(source, property)
    }
}

/// A translator backed by a static dictionary: text values found as keys
/// are replaced by their translation.
#[derive(Debug, Clone, Default)]
pub struct DictionaryTranslator {
    entries: std::collections::HashMap<String, String>,
    sort_suffix: Option<String>,
}

impl DictionaryTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, key: impl Into<String>, translation: impl Into<String>) -> Self {
        self.entries.insert(key.into(), translation.into());
        self
    }

    /// Suffix appended to a property to name its localized sort column,
    /// e.g. `name` + `_l10n`.
    pub fn sort_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.sort_suffix = Some(suffix.into());
        self
    }
}

impl Translator for DictionaryTranslator {
    fn translate_name(
        &self,
        source: &dyn RowSource,
        property: &str,
    ) -> Result<Option<Value>, ResolveError> {
        match source.property(property) {
            Some(Value::Text(key)) => Ok(self.entries.get(&key).cloned().map(Value::Text)),
            _ => Ok(None),
        }
    }

    fn translate_sort_property(&self, _source: &dyn RowSource, property: &str) -> Option<String> {
        self.sort_suffix
            .as_ref()
            .map(|suffix| format!("{}{}", property, suffix))
    }
}
