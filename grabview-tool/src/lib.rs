//! Support code for the `grab` command: configuration, schema files, and the
//! extraction entry points the subcommands call.

pub mod config;
mod error;
pub mod schema_file;

use grabview_core::{Cursor, ObjectView, Record, Value};
use grabview_html::Document;
use serde::Serialize;

pub use error::ToolError;
pub use schema_file::SchemaFile;

/// Applies the schema file to an HTML document.
pub fn extract_html(schema: &SchemaFile, html: &str) -> Result<Record, ToolError> {
    let schema = schema.page_schema()?;
    let doc = Document::parse(html);
    let page = doc.page(&schema);
    Ok(page.as_dict()?.clone())
}

/// Applies the schema file to a JSON document.
pub fn extract_json(schema: &SchemaFile, json: &str) -> Result<Record, ToolError> {
    let schema = schema.view_schema()?;
    let data = parse_json(json)?;
    let view = ObjectView::new(&schema, data);
    Ok(view.as_dict()?.clone())
}

/// Reads one dotted path out of a JSON document; misses are `Value::Absent`.
pub fn extract_path(path: &str, json: &str) -> Result<Value, ToolError> {
    let mut cursor = Cursor::new(parse_json(json)?);
    Ok(cursor.scan(path).into_value())
}

pub fn render<T: Serialize>(value: &T, pretty: bool) -> Result<String, ToolError> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(rendered)
}

fn parse_json(json: &str) -> Result<Value, ToolError> {
    let parsed: serde_json::Value = serde_json::from_str(json)?;
    Ok(Value::from(parsed))
}
