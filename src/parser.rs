//! Schema text → [`Document`].
//!
//! Parsing happens in two steps: the text is read into a
//! [`serde_json::Value`] (any failure here is a syntax error), then the value
//! is checked and the text deserialized into a [`Schema`] tree (any failure
//! here is a shape error, reported with the JSON path and, where serde_json
//! knows it, the position of the offending value).

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::schema::{Document, Schema};

/// Parse one schema document.
pub fn parse_document(name: &str, text: &str) -> Result<Document> {
    let value: Value = serde_json::from_str(text).map_err(|e| syntax_error(name, text, &e))?;

    check_schema_object(name, &value, "")?;

    let mut deserializer = serde_json::Deserializer::from_str(text);
    let schema: Schema = serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
        let path = err.path().to_string();
        shape_error(name, text, path, &err.into_inner())
    })?;

    debug!(
        document = name,
        properties = schema.properties.len(),
        definitions = schema.definitions.len() + schema.defs.len(),
        "parsed schema document"
    );

    Ok(Document {
        name: name.to_string(),
        schema,
    })
}

/// Parse a batch of `(name, text)` sources in order.
///
/// The first document that fails aborts the whole batch.
pub fn parse_batch<N, T>(sources: &[(N, T)]) -> Result<Vec<Document>>
where
    N: AsRef<str>,
    T: AsRef<str>,
{
    sources
        .iter()
        .map(|(name, text)| parse_document(name.as_ref(), text.as_ref()))
        .collect()
}

fn syntax_error(document: &str, text: &str, err: &serde_json::Error) -> Error {
    Error::SchemaSyntax {
        document: document.to_string(),
        offset: byte_offset(text, err.line(), err.column()),
        message: without_location(err),
    }
}

fn shape_error(document: &str, text: &str, path: String, err: &serde_json::Error) -> Error {
    Error::SchemaShape {
        document: document.to_string(),
        path,
        offset: (err.line() > 0).then(|| byte_offset(text, err.line(), err.column())),
        message: without_location(err),
    }
}

/// serde_json's message without its trailing " at line L column C".
fn without_location(err: &serde_json::Error) -> String {
    let message = err.to_string();
    let location = format!(" at line {} column {}", err.line(), err.column());
    message
        .strip_suffix(&location)
        .unwrap_or(&message)
        .to_string()
}

/// Translate serde_json's 1-based line/column (column counted in bytes) back
/// into a byte offset.
fn byte_offset(text: &str, line: usize, column: usize) -> usize {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(text.len())
}

/// Every position that holds a schema must hold a JSON object.
///
/// serde would happily build a struct out of a JSON array, so this is checked
/// on the raw value before deserializing.
fn check_schema_object(document: &str, value: &Value, path: &str) -> Result<()> {
    let Some(object) = value.as_object() else {
        return Err(Error::shape(
            document,
            display_path(path),
            format!("expected a schema object, found {}", json_kind(value)),
        ));
    };

    for keyword in ["properties", "definitions", "$defs"] {
        let Some(children) = object.get(keyword) else {
            continue;
        };
        let keyword_path = join_path(path, keyword);
        let Some(children) = children.as_object() else {
            return Err(Error::shape(
                document,
                keyword_path,
                format!("expected an object of schemas, found {}", json_kind(children)),
            ));
        };
        for (key, child) in children {
            check_schema_object(document, child, &join_path(&keyword_path, key))?;
        }
    }

    if let Some(items) = object.get("items") {
        check_schema_object(document, items, &join_path(path, "items"))?;
    }

    if let Some(additional) = object.get("additionalProperties") {
        if !additional.is_boolean() {
            check_schema_object(document, additional, &join_path(path, "additionalProperties"))?;
        }
    }

    Ok(())
}

fn join_path(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{path}.{segment}")
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        ".".to_string()
    } else {
        path.to_string()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
