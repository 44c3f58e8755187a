// Copyright 2017 Dmitry Tantsur <divius.inside@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Table output.

use std::io::Write;

use prettytable::{format, Cell, Row, Table};
use serde_json::{Map, Value};

use crate::common::Resource;
use crate::Result;

/// Custom conversion of a resource into a cell.
pub(crate) type Formatter = fn(&Resource) -> String;

/// Key of a column: the title in lower case with spaces turned into `_`.
pub(crate) fn field_key(title: &str) -> String {
    title.to_lowercase().replace(' ', "_")
}

/// Text of a single cell, `-` for missing and null values.
pub(crate) fn format_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::from("-"),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn print_table(out: &mut dyn Write, titles: &[&str], rows: Vec<Vec<String>>) -> Result<()> {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(Row::new(titles.iter().map(|t| Cell::new(t)).collect()));
    for row in rows {
        let _ = table.add_row(Row::new(row.iter().map(|c| Cell::new(c)).collect()));
    }
    let _ = table.print(out)?;
    Ok(())
}

/// Print resources as a table.
///
/// Rows are sorted by the column at `sortby_index`, `None` keeps the order.
pub(crate) fn print_list(
    out: &mut dyn Write,
    items: &[Resource],
    fields: &[&str],
    formatters: &[(&str, Formatter)],
    sortby_index: Option<usize>,
) -> Result<()> {
    let mut rows: Vec<Vec<String>> = items
        .iter()
        .map(|item| {
            fields
                .iter()
                .map(|field| {
                    match formatters.iter().find(|(name, _)| name == field) {
                        Some((_, formatter)) => formatter(item),
                        None => format_value(item.get(&field_key(field))),
                    }
                })
                .collect()
        })
        .collect();

    if let Some(index) = sortby_index {
        rows.sort_by(|a, b| a.get(index).cmp(&b.get(index)));
    }

    print_table(out, fields, rows)
}

/// Print a mapping as a `Property | Value` table.
pub(crate) fn print_dict(out: &mut dyn Write, info: &Map<String, Value>) -> Result<()> {
    let mut rows: Vec<Vec<String>> = info
        .iter()
        .map(|(key, value)| vec![key.clone(), format_value(Some(value))])
        .collect();
    rows.sort();
    print_table(out, &["Property", "Value"], rows)
}

/// Print a resource without its links.
pub(crate) fn print_resource(out: &mut dyn Write, resource: &Resource) -> Result<()> {
    let mut info = resource.info().clone();
    let _ = info.remove("links");
    print_dict(out, &info)
}

#[cfg(test)]
pub mod test {
    use serde_json::{json, Map, Value};

    use super::{field_key, format_value, print_dict, print_list, Formatter};
    use crate::common::Resource;

    fn resource(value: Value) -> Resource {
        Resource::from_value(value).unwrap()
    }

    fn upper_name(item: &Resource) -> String {
        item.get_str("name").unwrap_or_default().to_uppercase()
    }

    #[test]
    fn test_field_key() {
        assert_eq!(field_key("Volume Type"), "volume_type");
        assert_eq!(field_key("ID"), "id");
        assert_eq!(field_key("Attached to"), "attached_to");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(None), "-");
        assert_eq!(format_value(Some(&Value::Null)), "-");
        assert_eq!(format_value(Some(&json!("x"))), "x");
        assert_eq!(format_value(Some(&json!(42))), "42");
        assert_eq!(format_value(Some(&json!({"a": 1}))), "{\"a\":1}");
    }

    #[test]
    fn test_print_list_sorted() {
        let items = vec![
            resource(json!({"id": "2", "name": "b", "volume_type": null})),
            resource(json!({"id": "1", "name": "a"})),
        ];
        let mut out = Vec::new();
        print_list(&mut out, &items, &["ID", "Name", "Volume Type"], &[], Some(0)).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[1].contains("ID"));
        assert!(lines[1].contains("Volume Type"));
        assert!(lines[3].contains("| 1 "));
        assert!(lines[4].contains("| 2 "));
        assert!(lines[4].contains("| -"));
    }

    #[test]
    fn test_print_list_formatter_and_order() {
        let items = vec![
            resource(json!({"id": "2", "name": "b"})),
            resource(json!({"id": "1", "name": "a"})),
        ];
        let formatters: &[(&str, Formatter)] = &[("Name", upper_name)];
        let mut out = Vec::new();
        print_list(&mut out, &items, &["ID", "Name"], formatters, None).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[3].contains("| 2 "));
        assert!(lines[3].contains("B"));
    }

    #[test]
    fn test_print_dict() {
        let mut info = Map::new();
        let _ = info.insert("size".into(), json!(1));
        let _ = info.insert("id".into(), json!("abcd"));
        let mut out = Vec::new();
        print_dict(&mut out, &info).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[1].contains("Property"));
        assert!(lines[3].contains("id"));
        assert!(lines[4].contains("size"));
    }
}
