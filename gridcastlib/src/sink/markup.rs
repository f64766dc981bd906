//! HTML and XML table output.

use std::collections::BTreeMap;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::config::ExportConfig;
use crate::customize::controls::{display_order_input, edit_control, hidden_edit_controls};
use crate::error::SinkError;
use crate::grouping::HeaderGroups;
use crate::model::{HeaderDefinition, Row, TableModel};
use crate::value::CellValue;
use crate::writer::Column;

use super::{Media, TableSink};

type Attributes = BTreeMap<String, String>;

/// Markup sink for [`Media::Html`] and [`Media::Xml`].
///
/// Text is entity-escaped unless a column decorator already escaped it. HTML
/// cells honour the column's max length. In customization mode HTML headers
/// carry the column edit controls.
pub struct MarkupSink {
    media: Media,
    writer: Writer<Vec<u8>>,
    /// Attributes of the cells of the row being written
    cell_attributes: Vec<Attributes>,
    row_open: bool,
    body_open: bool,
    width: usize,
    customization_mode: bool,
    hidden_controls: String,
}

impl MarkupSink {
    pub fn new(media: Media, config: &ExportConfig) -> Self {
        Self {
            media,
            writer: Writer::new(Vec::new()),
            cell_attributes: Vec::new(),
            row_open: false,
            body_open: false,
            width: 0,
            customization_mode: config.customization_mode && media == Media::Html,
            hidden_controls: String::new(),
        }
    }

    fn is_html(&self) -> bool {
        self.media == Media::Html
    }

    fn start(&mut self, tag: &str, attributes: &Attributes) -> Result<(), SinkError> {
        let mut start = BytesStart::new(tag);
        for (key, value) in attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        self.writer.write_event(Event::Start(start))?;
        Ok(())
    }

    fn open_tag(&mut self, tag: &str) -> Result<(), SinkError> {
        self.start(tag, &Attributes::new())
    }

    fn end(&mut self, tag: &str) -> Result<(), SinkError> {
        self.writer.write_event(Event::End(BytesEnd::new(tag)))?;
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), SinkError> {
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        Ok(())
    }

    /// Markup that is already escaped.
    fn raw(&mut self, markup: &str) -> Result<(), SinkError> {
        self.writer
            .write_event(Event::Text(BytesText::from_escaped(markup)))?;
        Ok(())
    }

    fn newline(&mut self) -> Result<(), SinkError> {
        self.raw("\n")
    }

    fn close_row(&mut self) -> Result<(), SinkError> {
        if self.row_open {
            self.end(if self.is_html() { "tr" } else { "row" })?;
            self.newline()?;
            self.row_open = false;
        }
        Ok(())
    }

    fn close_body(&mut self) -> Result<(), SinkError> {
        self.close_row()?;
        if self.body_open {
            self.end(if self.is_html() { "tbody" } else { "rows" })?;
            self.newline()?;
            self.body_open = false;
        }
        Ok(())
    }

    fn open_body(&mut self) -> Result<(), SinkError> {
        if !self.body_open {
            self.open_tag(if self.is_html() { "tbody" } else { "rows" })?;
            self.newline()?;
            self.body_open = true;
        }
        Ok(())
    }

    /// Header cell. Leaf cells get the edit controls in customization mode.
    fn header_cell(
        &mut self,
        header: &HeaderDefinition,
        rowspan: usize,
        leaf: bool,
    ) -> Result<(), SinkError> {
        let mut attributes = header.attributes.clone();
        if header.sortable {
            push_class(&mut attributes, "sortable");
        }
        if header.already_sorted {
            push_class(&mut attributes, "sorted");
        }
        if header.colspan > 1 {
            attributes.insert("colspan".to_string(), header.colspan.to_string());
        }
        if rowspan > 1 {
            attributes.insert("rowspan".to_string(), rowspan.to_string());
        }
        let tag = if self.is_html() { "th" } else { "column" };
        self.start(tag, &attributes)?;
        self.text(&header.display_title())?;
        if leaf && self.customization_mode {
            self.raw(&edit_control(header))?;
            self.raw(&display_order_input(header))?;
        }
        self.end(tag)
    }

    fn text_cell(&mut self, text: &str, column: &Column<'_>) -> Result<(), SinkError> {
        let header = column.header;
        if header.decorators.iter().any(|d| d.escapes_markup()) {
            return self.raw(text);
        }
        if self.is_html() && header.max_length > 0 && text.chars().count() > header.max_length {
            let short: String = text.chars().take(header.max_length).collect();
            return self.text(&format!("{}...", short));
        }
        self.text(text)
    }
}

fn push_class(attributes: &mut Attributes, class: &str) {
    let entry = attributes.entry("class".to_string()).or_default();
    if !entry.is_empty() {
        entry.push(' ');
    }
    entry.push_str(class);
}

impl TableSink for MarkupSink {
    fn media(&self) -> Media {
        self.media
    }

    fn open(&mut self, model: &TableModel) -> Result<(), SinkError> {
        self.width = model.column_count();
        if self.customization_mode {
            self.hidden_controls = hidden_edit_controls(model.overrides.as_ref());
        }
        if !self.is_html() {
            self.writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
            self.newline()?;
        }
        let mut attributes = Attributes::new();
        if !model.id.trim().is_empty() {
            attributes.insert("id".to_string(), model.id.clone());
        }
        self.start("table", &attributes)?;
        self.newline()
    }

    fn caption(&mut self, caption: &str) -> Result<(), SinkError> {
        self.open_tag("caption")?;
        self.text(caption)?;
        self.end("caption")?;
        self.newline()
    }

    fn header(&mut self, layout: &HeaderGroups, include: bool) -> Result<(), SinkError> {
        if !include {
            return Ok(());
        }
        let (section, row) = if self.is_html() {
            ("thead", "tr")
        } else {
            ("header", "columns")
        };
        self.open_tag(section)?;
        self.newline()?;
        match &layout.group_row {
            Some(group_row) => {
                self.open_tag(row)?;
                for header in group_row {
                    if header.is_group_header {
                        self.header_cell(header, 1, false)?;
                    } else {
                        self.header_cell(header, 2, true)?;
                    }
                }
                self.end(row)?;
                self.newline()?;
                self.open_tag(row)?;
                for header in layout.leaf_row.iter().filter(|h| h.group_key().is_some()) {
                    self.header_cell(header, 1, true)?;
                }
                self.end(row)?;
                self.newline()?;
            }
            None => {
                self.open_tag(row)?;
                for header in &layout.leaf_row {
                    self.header_cell(header, 1, true)?;
                }
                self.end(row)?;
                self.newline()?;
            }
        }
        if !self.hidden_controls.is_empty() {
            let controls = std::mem::take(&mut self.hidden_controls);
            let mut row_attributes = Attributes::new();
            row_attributes.insert("class".to_string(), "hiddenColumns".to_string());
            let mut cell_attributes = Attributes::new();
            cell_attributes.insert("colspan".to_string(), self.width.max(1).to_string());
            self.start("tr", &row_attributes)?;
            self.start("th", &cell_attributes)?;
            self.raw(&controls)?;
            self.end("th")?;
            self.end("tr")?;
            self.newline()?;
        }
        self.end(section)?;
        self.newline()
    }

    fn row_open(&mut self, row: &Row, row_number: usize) -> Result<(), SinkError> {
        self.open_body()?;
        self.close_row()?;
        self.cell_attributes = row.cells.iter().map(|c| c.attributes.clone()).collect();
        let mut attributes = Attributes::new();
        if self.is_html() {
            let class = if row_number % 2 == 1 { "odd" } else { "even" };
            attributes.insert("class".to_string(), class.to_string());
            self.start("tr", &attributes)?;
        } else {
            attributes.insert("number".to_string(), row_number.to_string());
            self.start("row", &attributes)?;
        }
        self.row_open = true;
        Ok(())
    }

    fn column_value(&mut self, value: &CellValue, column: &Column<'_>) -> Result<(), SinkError> {
        if !self.row_open {
            return Err(SinkError::message("column value outside of a row"));
        }
        let attributes = self
            .cell_attributes
            .get(column.column_index)
            .cloned()
            .unwrap_or_default();
        let tag = if self.is_html() { "td" } else { "cell" };
        self.start(tag, &attributes)?;
        match value {
            CellValue::Text(text) => self.text_cell(text, column)?,
            other => self.text(&other.display_text())?,
        }
        self.end(tag)
    }

    fn footer(&mut self, footer: &str) -> Result<(), SinkError> {
        self.close_body()?;
        if self.is_html() {
            let mut attributes = Attributes::new();
            attributes.insert("colspan".to_string(), self.width.max(1).to_string());
            self.open_tag("tfoot")?;
            self.newline()?;
            self.open_tag("tr")?;
            self.start("td", &attributes)?;
            self.text(footer)?;
            self.end("td")?;
            self.end("tr")?;
            self.newline()?;
            self.end("tfoot")?;
        } else {
            self.open_tag("footer")?;
            self.text(footer)?;
            self.end("footer")?;
        }
        self.newline()
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.close_body()?;
        self.end("table")?;
        self.newline()
    }

    fn finish(self: Box<Self>) -> Result<Vec<u8>, SinkError> {
        Ok(self.writer.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customize::{OverrideColumn, OverrideSet};
    use crate::decorator::EscapeXmlDecorator;
    use crate::escape::custom_grid_list;
    use crate::model::{Cell, Record};
    use crate::resolve::BeanResolver;
    use crate::value::Value;
    use crate::writer::write_table;
    use quick_xml::Reader;
    use std::sync::Arc;

    fn render_with(model: &mut TableModel, config: &ExportConfig) -> String {
        let mut sink = Box::new(MarkupSink::new(config.media, config));
        model.media = config.media;
        write_table(model, sink.as_mut(), &BeanResolver, &config.write_options()).unwrap();
        String::from_utf8(sink.finish().unwrap()).unwrap()
    }

    fn render(model: &mut TableModel, media: Media) -> String {
        render_with(model, &ExportConfig::new(media))
    }

    fn model(value: &str) -> TableModel {
        let mut model = TableModel::new("t");
        model.add_header(HeaderDefinition::new("Name").property("name"));
        let record = Record::new().with("name", value);
        let row = Row::from_source(Arc::new(record), &model.headers);
        model.add_row(row);
        model
    }

    fn assert_well_formed(xml: &str) {
        let mut reader = Reader::from_str(xml);
        loop {
            match reader.read_event() {
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => panic!("malformed XML at {}: {}", reader.buffer_position(), e),
            }
        }
    }

    #[test]
    fn test_html_table() {
        let out = render(&mut model("Tom & Jerry").caption("<Cap>"), Media::Html);
        assert_eq!(
            out,
            "<table id=\"t\">\n<caption>&lt;Cap&gt;</caption>\n<thead>\n<tr><th>Name</th></tr>\n\
             </thead>\n<tbody>\n<tr class=\"odd\"><td>Tom &amp; Jerry</td></tr>\n</tbody>\n</table>\n"
        );
    }

    #[test]
    fn test_xml_escapes_values() {
        let out = render(&mut model("a<b").footer("x & y"), Media::Xml);
        assert!(out.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
        assert!(out.contains("<row number=\"1\"><cell>a&lt;b</cell></row>"));
        assert!(out.contains("<footer>x &amp; y</footer>"));
        assert_well_formed(&out);
    }

    #[test]
    fn test_decorated_columns_are_not_escaped_twice() {
        let mut model = TableModel::new("t");
        model.add_header(
            HeaderDefinition::new("Name")
                .property("name")
                .decorator(Arc::new(EscapeXmlDecorator)),
        );
        let record = Record::new().with("name", "a&b");
        model.add_row(Row::new(Arc::new(record), vec![Cell::placeholder()]));
        let out = render(&mut model, Media::Html);
        assert!(out.contains("<td class=\"result\">a&amp;b</td>"));
    }

    #[test]
    fn test_custom_grid_column_is_well_formed_xml() {
        let mut model = TableModel::new("t");
        model.add_header(
            HeaderDefinition::new("Tags")
                .property("tags")
                .decorator(Arc::new(EscapeXmlDecorator)),
        );
        let record = Record::new().with("tags", custom_grid_list(["R&D"]));
        model.add_row(Row::new(Arc::new(record), vec![Cell::placeholder()]));

        let xml = render(&mut model, Media::Xml);
        assert!(xml.contains("<cell class=\"result\">R&amp;D</cell>"));
        assert_well_formed(&xml);

        let html = render(&mut model, Media::Html);
        assert!(html.contains("<td class=\"result\"><div class='custom_grid'>R&D</div></td>"));
    }

    #[test]
    fn test_max_length_truncation() {
        let mut model = TableModel::new("t");
        model.add_header(HeaderDefinition::new("D").property("d").max_length(4));
        let record = Record::new().with("d", Value::text("abcdefgh"));
        let row = Row::from_source(Arc::new(record), &model.headers);
        model.add_row(row);
        let out = render(&mut model, Media::Html);
        assert!(out.contains("<td>abcd...</td>"));
    }

    #[test]
    fn test_grouped_header() {
        let mut model = TableModel::new("t");
        model.add_header(HeaderDefinition::new("A").group("G"));
        model.add_header(HeaderDefinition::new("B").group("G"));
        model.add_header(HeaderDefinition::new("C").sortable(true));
        let out = render(&mut model, Media::Html);
        assert!(out.contains(
            "<tr><th class=\"groupedHead\" colspan=\"2\">G</th>\
             <th class=\"sortable\" rowspan=\"2\">C</th></tr>\n<tr><th>A</th><th>B</th></tr>"
        ));
    }

    #[test]
    fn test_footer() {
        let out = render(&mut model("x").footer("end"), Media::Html);
        assert!(out.contains(
            "</tbody>\n<tfoot>\n<tr><td colspan=\"1\">end</td></tr>\n</tfoot>\n</table>"
        ));
    }

    #[test]
    fn test_customization_mode_emits_edit_controls() {
        let mut model = model("x");
        model.overrides = Some(OverrideSet::new(
            3,
            vec![OverrideColumn {
                id: 9,
                canonical_title: Some("Secret".to_string()),
                hidden: true,
                ..OverrideColumn::default()
            }],
            None,
        ));
        let config = ExportConfig::new(Media::Html).customization_mode(true);
        let out = render_with(&mut model, &config);
        assert!(out.contains(
            "<th>Name<div class='coldata' data-colrecnum='' data-title='Name' \
             data-property='name' data-hidden='false' data-sortable='false' \
             data-sortproperty='name' data-maxlength='null' data-iscustomcolumn='false'></div>\
             <input type='hidden' class='columnOrder' name='columnOrder' value='Name'/></th>"
        ));
        assert!(out.contains(
            "<tr class=\"hiddenColumns\"><th colspan=\"1\"><div class='coldata' \
             data-colrecnum='9' data-title='Secret'"
        ));
    }

    #[test]
    fn test_edit_controls_only_in_customization_mode() {
        let html = render(&mut model("x"), Media::Html);
        assert!(!html.contains("coldata"));

        let config = ExportConfig::new(Media::Xml).customization_mode(true);
        let xml = render_with(&mut model("x"), &config);
        assert!(!xml.contains("coldata"));
    }
}
