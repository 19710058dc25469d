pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// A result split into scalar fields (dotted paths for nested objects) and
/// arrays of objects, which render as their own tables.
pub(crate) struct Flattened<'a> {
    pub fields: Vec<(String, &'a Value)>,
    pub tables: Vec<(String, &'a [Value])>,
}

pub(crate) fn flatten(map: &Map<String, Value>) -> Flattened<'_> {
    let mut flat = Flattened {
        fields: Vec::new(),
        tables: Vec::new(),
    };
    collect("", map, &mut flat);
    flat
}

fn collect<'a>(prefix: &str, map: &'a Map<String, Value>, flat: &mut Flattened<'a>) {
    for (key, val) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => collect(&path, inner, flat),
            Value::Array(arr) if arr.first().is_some_and(Value::is_object) => {
                flat.tables.push((path, arr.as_slice()))
            }
            _ => flat.fields.push((path, val)),
        }
    }
}

/// Render a scalar (or small array) for a table cell or CSV field.
pub(crate) fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Column headers for an array of objects: union of keys in first-seen order,
/// since optional fields may be missing from early rows.
pub(crate) fn headers(arr: &[Value]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for item in arr {
        if let Value::Object(map) = item {
            for key in map.keys() {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
        }
    }
    headers
}
