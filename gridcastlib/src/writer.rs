//! Model traversal: walk a finished model once and drive a sink.

use crate::decorator::TableDecorator;
use crate::error::{ExportError, SinkError};
use crate::grouping::{group_headers, HeaderGroups};
use crate::model::{HeaderDefinition, Row, TableModel};
use crate::resolve::PropertyResolver;
use crate::sink::TableSink;
use crate::value::{classify, CellValue, Value};

/// Cursor handed to `column_open`/`column_value`.
#[derive(Debug, Clone, Copy)]
pub struct Column<'a> {
    /// 0-based index of the row in the traversed list
    pub row_index: usize,
    pub column_index: usize,
    pub header: &'a HeaderDefinition,
}

/// Traversal options.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Traverse every row rather than only the displayed page
    pub full_list: bool,
    pub include_header: bool,
    /// Group headers into a two-tier header
    pub group_headers: bool,
    /// Text written in place of values of secured rows (empty = blank cell)
    pub secured_mask: String,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            full_list: true,
            include_header: true,
            group_headers: true,
            secured_mask: String::new(),
        }
    }
}

/// Write the model into the sink.
///
/// The first sink failure aborts the traversal; it is returned wrapped in
/// [`ExportError::Generation`] with the sink's media.
pub fn write_table<S>(
    model: &mut TableModel,
    sink: &mut S,
    resolver: &dyn PropertyResolver,
    options: &WriteOptions,
) -> Result<(), ExportError>
where
    S: TableSink + ?Sized,
{
    let media = sink.media();
    // The decorator is detached for the traversal so rows can be borrowed
    // alongside it.
    let mut decorator = model.decorator.take();
    let result = traverse(model, sink, decorator.as_deref_mut(), resolver, options);
    model.decorator = decorator;
    result.map_err(|source| ExportError::Generation { media, source })
}

fn traverse<S>(
    model: &TableModel,
    sink: &mut S,
    mut decorator: Option<&mut (dyn TableDecorator + 'static)>,
    resolver: &dyn PropertyResolver,
    options: &WriteOptions,
) -> Result<(), SinkError>
where
    S: TableSink + ?Sized,
{
    tracing::debug!(table = %model.id, media = %sink.media(), "writing table");
    sink.open(model)?;

    if let Some(caption) = model.caption.as_deref() {
        sink.caption(caption)?;
    }

    let layout = if options.group_headers {
        group_headers(&model.headers)
    } else {
        HeaderGroups::flat(&model.headers)
    };
    sink.header(&layout, options.include_header)?;

    let rows = model.rows(options.full_list);
    for (row_index, row) in rows.iter().enumerate() {
        if let Some(d) = decorator.as_deref_mut() {
            sink.decorator_start(d, row)?;
        }
        sink.row_open(row, row_index + 1)?;

        let denied = is_secured(row);
        for (column_index, header) in model.headers.iter().enumerate() {
            let column = Column {
                row_index,
                column_index,
                header,
            };
            sink.column_open(&column)?;
            let value = if denied {
                masked(options)
            } else {
                resolve_value(model, row, header, column_index, resolver)
            };
            sink.column_value(&value, &column)?;
        }

        if let Some(d) = decorator.as_deref_mut() {
            sink.decorator_finish(d, row)?;
        }
    }

    if let Some(footer) = model.footer.as_deref() {
        sink.footer(footer)?;
    }
    if let Some(d) = decorator.as_deref_mut() {
        sink.decorator_table_finish(d)?;
    }
    sink.bottom_banner(model)?;
    sink.close()
}

/// Rows whose source reports secured, or whose check fails, are denied.
fn is_secured(row: &Row) -> bool {
    let Some(check) = row.source.as_security_checkable() else {
        return false;
    };
    match check.is_secured_for_user() {
        Ok(secured) => secured,
        Err(e) => {
            tracing::warn!(row = row.number, error = %e, "access check failed, denying row");
            true
        }
    }
}

fn masked(options: &WriteOptions) -> CellValue {
    if options.secured_mask.is_empty() {
        CellValue::Empty
    } else {
        CellValue::Text(options.secured_mask.clone())
    }
}

/// Cell value, or the header's property looked up on the row source for
/// placeholder cells; then column decorators and classification.
fn resolve_value(
    model: &TableModel,
    row: &Row,
    header: &HeaderDefinition,
    column_index: usize,
    resolver: &dyn PropertyResolver,
) -> CellValue {
    let value = match row.cell(column_index).and_then(|c| c.value.clone()) {
        Some(value) => value,
        None => match header.property.as_deref() {
            Some(property) => resolver
                .resolve(row.source.as_ref(), property)
                .unwrap_or_else(|e| {
                    tracing::trace!(row = row.number, error = %e, "no value for placeholder cell");
                    Value::Null
                }),
            None => Value::Null,
        },
    };
    let value = header
        .decorators
        .iter()
        .fold(value, |v, d| d.decorate(v, model.media));
    classify(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorator::SecurityCheckable;
    use crate::error::CapabilityError;
    use crate::model::{Cell, Record, RowSource};
    use crate::resolve::BeanResolver;
    use crate::sink::Media;
    use crate::value::Number;
    use std::sync::{Arc, Mutex};

    /// Records every event as a line.
    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        fail_on_row: Option<usize>,
    }

    impl TableSink for Recorder {
        fn media(&self) -> Media {
            Media::Csv
        }

        fn open(&mut self, _model: &TableModel) -> Result<(), SinkError> {
            self.events.push("open".to_string());
            Ok(())
        }

        fn caption(&mut self, caption: &str) -> Result<(), SinkError> {
            self.events.push(format!("caption {}", caption));
            Ok(())
        }

        fn header(&mut self, layout: &HeaderGroups, include: bool) -> Result<(), SinkError> {
            self.events.push(format!(
                "header {} grouped={} include={}",
                layout.leaf_row.len(),
                layout.is_grouped,
                include
            ));
            Ok(())
        }

        fn row_open(&mut self, _row: &Row, row_number: usize) -> Result<(), SinkError> {
            if self.fail_on_row == Some(row_number) {
                return Err(SinkError::message("row rejected"));
            }
            self.events.push(format!("row {}", row_number));
            Ok(())
        }

        fn column_open(&mut self, column: &Column<'_>) -> Result<(), SinkError> {
            self.events
                .push(format!("col {}:{}", column.row_index, column.column_index));
            Ok(())
        }

        fn column_value(
            &mut self,
            value: &CellValue,
            _column: &Column<'_>,
        ) -> Result<(), SinkError> {
            self.events.push(format!("value {:?}", value));
            Ok(())
        }

        fn decorator_start(
            &mut self,
            decorator: &mut dyn TableDecorator,
            row: &Row,
        ) -> Result<(), SinkError> {
            self.events.push("decorator start".to_string());
            decorator.start_row(row);
            Ok(())
        }

        fn decorator_finish(
            &mut self,
            decorator: &mut dyn TableDecorator,
            row: &Row,
        ) -> Result<(), SinkError> {
            self.events.push("decorator finish".to_string());
            decorator.finish_row(row);
            Ok(())
        }

        fn decorator_table_finish(
            &mut self,
            decorator: &mut dyn TableDecorator,
        ) -> Result<(), SinkError> {
            self.events.push("decorator table finish".to_string());
            decorator.finish();
            Ok(())
        }

        fn footer(&mut self, footer: &str) -> Result<(), SinkError> {
            self.events.push(format!("footer {}", footer));
            Ok(())
        }

        fn bottom_banner(&mut self, _model: &TableModel) -> Result<(), SinkError> {
            self.events.push("banner".to_string());
            Ok(())
        }

        fn close(&mut self) -> Result<(), SinkError> {
            self.events.push("close".to_string());
            Ok(())
        }

        fn finish(self: Box<Self>) -> Result<Vec<u8>, SinkError> {
            Ok(self.events.join("\n").into_bytes())
        }
    }

    #[derive(Clone, Default)]
    struct CountingDecorator {
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl TableDecorator for CountingDecorator {
        fn start_row(&mut self, row: &Row) {
            self.calls.lock().unwrap().push(format!("start {}", row.number));
        }

        fn finish_row(&mut self, row: &Row) {
            self.calls.lock().unwrap().push(format!("finish {}", row.number));
        }

        fn finish(&mut self) {
            self.calls.lock().unwrap().push("table".to_string());
        }
    }

    fn one_column_model(values: &[Value]) -> TableModel {
        let mut model = TableModel::new("t");
        model.add_header(HeaderDefinition::new("V").property("v"));
        for v in values {
            let record = Record::new().with("v", v.clone());
            model.add_row(Row::new(Arc::new(record), vec![Cell::new(v.clone())]));
        }
        model
    }

    #[test]
    fn test_event_order_without_decorator() {
        let mut model = one_column_model(&[Value::number(1.0), Value::number(2.0)])
            .caption("Cap")
            .footer("Foot");
        let mut sink = Recorder::default();
        write_table(&mut model, &mut sink, &BeanResolver, &WriteOptions::default()).unwrap();
        assert_eq!(
            sink.events,
            vec![
                "open",
                "caption Cap",
                "header 1 grouped=false include=true",
                "row 1",
                "col 0:0",
                "value Numeric(1.0)",
                "row 2",
                "col 1:0",
                "value Numeric(2.0)",
                "footer Foot",
                "banner",
                "close",
            ]
        );
    }

    #[test]
    fn test_decorator_hook_order() {
        let decorator = CountingDecorator::default();
        let calls = decorator.calls.clone();
        let mut model = one_column_model(&[Value::number(1.0), Value::number(2.0)])
            .footer("Foot")
            .decorator(Box::new(decorator));
        let mut sink = Recorder::default();
        write_table(&mut model, &mut sink, &BeanResolver, &WriteOptions::default()).unwrap();

        let events: Vec<&str> = sink.events.iter().map(String::as_str).collect();
        assert_eq!(
            events,
            vec![
                "open",
                "header 1 grouped=false include=true",
                "decorator start",
                "row 1",
                "col 0:0",
                "value Numeric(1.0)",
                "decorator finish",
                "decorator start",
                "row 2",
                "col 1:0",
                "value Numeric(2.0)",
                "decorator finish",
                "footer Foot",
                "decorator table finish",
                "banner",
                "close",
            ]
        );
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["start 1", "finish 1", "start 2", "finish 2", "table"]
        );
        assert!(model.decorator.is_some());
    }

    #[test]
    fn test_percentages_reach_sink_as_fractions() {
        let mut model = one_column_model(&[Value::Number(Number::percent(45.0))]);
        let mut sink = Recorder::default();
        write_table(&mut model, &mut sink, &BeanResolver, &WriteOptions::default()).unwrap();
        assert!(sink.events.contains(&"value Percentage(0.45)".to_string()));
    }

    #[test]
    fn test_placeholder_resolved_through_property() {
        let mut model = TableModel::new("t");
        model.add_header(HeaderDefinition::new("Name").property("name"));
        model.add_header(HeaderDefinition::new("Nothing"));
        let record = Record::new().with("name", "Ada");
        model.add_row(Row::new(
            Arc::new(record),
            vec![Cell::placeholder(), Cell::placeholder()],
        ));
        let mut sink = Recorder::default();
        write_table(&mut model, &mut sink, &BeanResolver, &WriteOptions::default()).unwrap();
        assert!(sink.events.contains(&"value Text(\"Ada\")".to_string()));
        assert!(sink.events.contains(&"value Empty".to_string()));
    }

    #[test]
    fn test_secured_rows_are_masked() {
        let mut model = TableModel::new("t");
        model.add_header(HeaderDefinition::new("V").property("v"));
        let secured = Record::new().with("v", "secret").secured(true);
        let open = Record::new().with("v", "public").secured(false);
        model.add_row(Row::from_source(Arc::new(secured), &model.headers.clone()));
        model.add_row(Row::from_source(Arc::new(open), &model.headers.clone()));

        let mut sink = Recorder::default();
        write_table(&mut model, &mut sink, &BeanResolver, &WriteOptions::default()).unwrap();
        let values: Vec<_> = sink.events.iter().filter(|e| e.starts_with("value")).collect();
        assert_eq!(values, vec!["value Empty", "value Text(\"public\")"]);

        let options = WriteOptions {
            secured_mask: "***".to_string(),
            ..WriteOptions::default()
        };
        let mut sink = Recorder::default();
        write_table(&mut model, &mut sink, &BeanResolver, &options).unwrap();
        assert!(sink.events.contains(&"value Text(\"***\")".to_string()));
    }

    /// A source whose access check cannot be answered.
    #[derive(Debug)]
    struct Unverifiable;

    impl RowSource for Unverifiable {
        fn property(&self, _name: &str) -> Option<Value> {
            Some(Value::text("secret"))
        }

        fn as_security_checkable(&self) -> Option<&dyn SecurityCheckable> {
            Some(self as &dyn SecurityCheckable)
        }
    }

    impl SecurityCheckable for Unverifiable {
        fn is_secured_for_user(&self) -> Result<bool, CapabilityError> {
            Err(CapabilityError("directory unavailable".to_string()))
        }
    }

    #[test]
    fn test_failed_access_check_denies_row() {
        let mut model = TableModel::new("t");
        model.add_header(HeaderDefinition::new("V").property("v"));
        model.add_row(Row::new(Arc::new(Unverifiable), vec![Cell::placeholder()]));

        let options = WriteOptions {
            secured_mask: "***".to_string(),
            ..WriteOptions::default()
        };
        let mut sink = Recorder::default();
        write_table(&mut model, &mut sink, &BeanResolver, &options).unwrap();
        let values: Vec<_> = sink.events.iter().filter(|e| e.starts_with("value")).collect();
        assert_eq!(values, vec!["value Text(\"***\")"]);
    }

    #[test]
    fn test_page_only_export() {
        let mut model =
            one_column_model(&[Value::number(1.0), Value::number(2.0), Value::number(3.0)]);
        model.page = Some(1..2);
        let options = WriteOptions {
            full_list: false,
            ..WriteOptions::default()
        };
        let mut sink = Recorder::default();
        write_table(&mut model, &mut sink, &BeanResolver, &options).unwrap();
        let values: Vec<_> = sink.events.iter().filter(|e| e.starts_with("value")).collect();
        assert_eq!(values, vec!["value Numeric(2.0)"]);
    }

    #[test]
    fn test_sink_failure_aborts_and_wraps() {
        let mut model = one_column_model(&[Value::number(1.0), Value::number(2.0)]);
        let mut sink = Recorder {
            fail_on_row: Some(2),
            ..Recorder::default()
        };
        let err = write_table(&mut model, &mut sink, &BeanResolver, &WriteOptions::default())
            .unwrap_err();
        assert_eq!(err.media(), Media::Csv);
        assert!(err.to_string().contains("row rejected"));
        assert!(!sink.events.contains(&"close".to_string()));
    }

    #[test]
    fn test_header_excluded_still_emits_event() {
        let mut model = one_column_model(&[]);
        let options = WriteOptions {
            include_header: false,
            ..WriteOptions::default()
        };
        let mut sink = Recorder::default();
        write_table(&mut model, &mut sink, &BeanResolver, &options).unwrap();
        assert!(sink
            .events
            .contains(&"header 1 grouped=false include=false".to_string()));
    }
}
