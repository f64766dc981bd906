//! One export: customize, sort and write a model through a registered sink.

use crate::config::ExportConfig;
use crate::customize::apply_customizations;
use crate::error::ExportError;
use crate::model::{default_comparator, TableModel};
use crate::resolve::PropertyResolver;
use crate::sink::{Media, SinkRegistry};
use crate::writer::write_table;
use crate::Result;

/// Bytes produced by an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutput {
    pub media: Media,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Run the export pipeline on a populated model.
///
/// 1. the default sort property falls back to the customization's, then the
///    configured one
/// 2. customizations are applied
/// 3. externally sorted tables get their sort properties from the resolver,
///    added columns included
/// 4. rows are sorted in memory when sorting is local
/// 5. the model is written (headers grouped) through the sink for
///    `config.media`
pub fn export(
    model: &mut TableModel,
    config: &ExportConfig,
    registry: &SinkRegistry,
    resolver: &dyn PropertyResolver,
) -> Result<ExportOutput> {
    let media = config.media;
    model.media = media;
    tracing::debug!(table = %model.id, %media, rows = model.rows_full().len(), "exporting table");

    if model.default_sort_property.is_none() {
        model.default_sort_property = model
            .overrides
            .as_ref()
            .and_then(|o| o.default_sort_property())
            .map(str::to_string)
            .or_else(|| config.default_sort_property.clone());
    }

    apply_customizations(model, Some(default_comparator()));

    if !model.sort.local {
        fill_external_sort_properties(model, resolver);
    }

    if model.sort.local {
        if model.sort.full_list {
            model.sort_full_list(resolver);
        } else {
            model.sort_page_list(resolver);
        }
    }

    let mut sink = registry.create(media, config)?;
    write_table(model, sink.as_mut(), resolver, &config.write_options())?;
    let mime_type = sink.mime_type();
    let bytes = sink
        .finish()
        .map_err(|source| ExportError::Generation { media, source })?;

    tracing::debug!(table = %model.id, bytes = bytes.len(), "export finished");
    Ok(ExportOutput {
        media,
        mime_type,
        bytes,
    })
}

/// Columns without an explicit sort property take the one the resolver maps
/// their property to, judged on the first row. The column matching the
/// reported sort property is then marked as sorted.
fn fill_external_sort_properties(model: &mut TableModel, resolver: &dyn PropertyResolver) {
    let Some(source) = model.rows_full().first().map(|r| r.source.clone()) else {
        return;
    };
    for header in model.headers.iter_mut() {
        if header.sort_property.is_some() {
            continue;
        }
        if let Some(property) = header.property.as_deref() {
            header.sort_property = resolver.sort_property(source.as_ref(), property);
        }
    }
    let marks: Vec<bool> = model
        .headers
        .iter()
        .map(|h| model.is_default_sort_column(h))
        .collect();
    for (header, sorted) in model.headers.iter_mut().zip(marks) {
        header.already_sorted = sorted;
    }
}
