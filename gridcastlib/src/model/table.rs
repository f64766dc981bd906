//! The table model: everything one render needs.

use std::fmt;
use std::ops::Range;

use crate::customize::overrides::OverrideSet;
use crate::decorator::TableDecorator;
use crate::resolve::PropertyResolver;
use crate::sink::Media;
use crate::sort::sort_rows;

use super::header::HeaderDefinition;
use super::row::Row;

/// Sort state of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    /// Index of the sorted column, -1 when unsorted
    pub column: i32,
    pub ascending: bool,
    /// Sort the full list rather than only the displayed page
    pub full_list: bool,
    /// Sort in memory; when false rows arrive sorted from elsewhere
    pub local: bool,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            column: -1,
            ascending: true,
            full_list: true,
            local: true,
        }
    }
}

/// Headers, rows and decorations of one table render.
///
/// Built once per render, then customized, grouped, sorted and written in
/// place.
pub struct TableModel {
    /// Table id (used for sheet names and logging)
    pub id: String,
    pub headers: Vec<HeaderDefinition>,
    rows: Vec<Row>,
    /// Displayed page, as a range into the full row list
    pub page: Option<Range<usize>>,
    pub caption: Option<String>,
    pub footer: Option<String>,
    pub sort: SortState,
    /// Configured default sort property, used until a column is picked
    pub default_sort_property: Option<String>,
    /// Sort property reported by an externally sorted (paginated) list
    pub paginated_sort_property: Option<String>,
    pub media: Media,
    pub overrides: Option<OverrideSet>,
    pub customization_disabled: bool,
    /// Set once the overrides have been applied
    pub(crate) customized: bool,
    pub decorator: Option<Box<dyn TableDecorator>>,
}

impl TableModel {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            headers: Vec::new(),
            rows: Vec::new(),
            page: None,
            caption: None,
            footer: None,
            sort: SortState::default(),
            default_sort_property: None,
            paginated_sort_property: None,
            media: Media::default(),
            overrides: None,
            customization_disabled: false,
            customized: false,
            decorator: None,
        }
    }

    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn media(mut self, media: Media) -> Self {
        self.media = media;
        self
    }

    pub fn overrides(mut self, overrides: OverrideSet) -> Self {
        self.overrides = Some(overrides);
        self
    }

    pub fn decorator(mut self, decorator: Box<dyn TableDecorator>) -> Self {
        self.decorator = Some(decorator);
        self
    }

    /// Append a header, assigning the next column index. The header is marked
    /// as sorted when its index is the sorted column.
    pub fn add_header(&mut self, mut header: HeaderDefinition) {
        let index = self.headers.len();
        header.column_index = index;
        header.already_sorted = self.sort.column == index as i32;
        if header.colspan == 0 {
            header.colspan = 1;
        }
        self.headers.push(header);
    }

    /// Append a row, numbering it from 1.
    pub fn add_row(&mut self, mut row: Row) {
        row.number = self.rows.len() + 1;
        tracing::trace!(table = %self.id, row = row.number, "adding row");
        self.rows.push(row);
    }

    pub fn rows_full(&self) -> &[Row] {
        &self.rows
    }

    pub(crate) fn rows_full_mut(&mut self) -> &mut Vec<Row> {
        &mut self.rows
    }

    /// Displayed rows: the page when set, else the full list.
    pub fn rows_page(&self) -> &[Row] {
        match &self.page {
            Some(range) => {
                let end = range.end.min(self.rows.len());
                let start = range.start.min(end);
                &self.rows[start..end]
            }
            None => &self.rows,
        }
    }

    /// Rows to traverse: the full list or the displayed page.
    pub fn rows(&self, full: bool) -> &[Row] {
        if full {
            self.rows_full()
        } else {
            self.rows_page()
        }
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn is_customized(&self) -> bool {
        self.customized
    }

    pub fn is_sorted(&self) -> bool {
        self.sort.column != -1
    }

    /// Whether a header matches the externally reported or configured default
    /// sort property (case-insensitive, against the sort property or else the
    /// bound property).
    pub fn is_default_sort_column(&self, header: &HeaderDefinition) -> bool {
        let wanted = self
            .paginated_sort_property
            .as_deref()
            .or(self.default_sort_property.as_deref());
        match (wanted, header.effective_sort_property()) {
            (Some(wanted), Some(property)) => property.eq_ignore_ascii_case(wanted),
            _ => false,
        }
    }

    /// Header of the sorted column.
    ///
    /// With local sorting and no column picked yet, the column matching the
    /// default sort property becomes the sorted column. Externally sorted
    /// tables have no locally sorted header.
    pub fn sorted_header(&mut self) -> Option<&HeaderDefinition> {
        if !self.sort.local {
            return None;
        }
        if self.sort.column == -1 && self.default_sort_property.is_some() {
            let index = self
                .headers
                .iter()
                .position(|h| self.is_default_sort_column(h))?;
            self.sort.column = index as i32;
            for (i, header) in self.headers.iter_mut().enumerate() {
                header.already_sorted = i == index;
            }
            if let Some(direction) = self.headers[index]
                .override_column
                .as_ref()
                .and_then(|c| c.sort_direction.as_deref())
            {
                self.sort.ascending = !direction.to_ascii_lowercase().starts_with("desc");
            }
        }
        usize::try_from(self.sort.column)
            .ok()
            .and_then(|index| self.headers.get(index))
    }

    /// Sort the full row list on the sorted column.
    pub fn sort_full_list(&mut self, resolver: &dyn PropertyResolver) {
        tracing::debug!(table = %self.id, "sorting full data");
        self.sort_range(None, resolver);
    }

    /// Sort only the displayed page.
    pub fn sort_page_list(&mut self, resolver: &dyn PropertyResolver) {
        tracing::debug!(table = %self.id, "sorting page list");
        let range = self.page.clone();
        self.sort_range(range, resolver);
    }

    fn sort_range(&mut self, range: Option<Range<usize>>, resolver: &dyn PropertyResolver) {
        let Some(header) = self.sorted_header() else {
            return;
        };
        let property = header.effective_sort_property().map(str::to_string);
        let comparator = header.comparator.clone();
        let column = self.sort.column;
        let ascending = self.sort.ascending;

        let rows = match range {
            Some(r) => {
                let end = r.end.min(self.rows.len());
                let start = r.start.min(end);
                &mut self.rows[start..end]
            }
            None => &mut self.rows[..],
        };
        sort_rows(
            rows,
            column,
            property.as_deref(),
            ascending,
            comparator.as_ref(),
            resolver,
        );
    }
}

impl fmt::Debug for TableModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableModel")
            .field("id", &self.id)
            .field("headers", &self.headers)
            .field("rows", &self.rows.len())
            .field("page", &self.page)
            .field("caption", &self.caption)
            .field("footer", &self.footer)
            .field("sort", &self.sort)
            .field("media", &self.media)
            .field("customized", &self.customized)
            .field("decorated", &self.decorator.is_some())
            .finish()
    }
}
