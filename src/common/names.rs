use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9]+").expect("valid word pattern"));

/// Convert a schema key or title into an exported Go identifier.
///
/// Every run of ASCII letters and digits becomes one word whose first letter
/// is upper-cased; the rest of the word is kept as written, so `firstName`,
/// `first_name` and `first-name` all become `FirstName` while `URL` stays
/// `URL`. Identifiers that would start with a digit are prefixed with `X`.
pub fn go_name(input: &str) -> String {
    let mut name = words(input);
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, 'X');
    }
    name
}

fn words(input: &str) -> String {
    WORD.find_iter(input).map(|m| capitalize(m.as_str())).collect()
}

/// Identifier suffix for a literal enum value. It is always appended to the
/// enum type name, so it may start with a digit.
pub fn go_value_name(value: &serde_json::Value) -> String {
    use serde_json::Value;
    match value {
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => {
            let text = n.to_string().replace('-', "Minus ").replace('.', " Dot ");
            words(&text)
        }
        Value::String(s) => {
            let name = words(s);
            if name.is_empty() { "Empty".to_string() } else { name }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// Type name derived from a document source name: `schemas/user-profile.json`
/// becomes `UserProfile`.
pub fn document_type_name(source: &str) -> String {
    let stem = Path::new(source)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(source);
    go_name(stem)
}

/// Capitalize first letter
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn go_names() {
        assert_eq!(go_name("name"), "Name");
        assert_eq!(go_name("first_name"), "FirstName");
        assert_eq!(go_name("first-name"), "FirstName");
        assert_eq!(go_name("firstName"), "FirstName");
        assert_eq!(go_name("URL"), "URL");
        assert_eq!(go_name("shipping address"), "ShippingAddress");
        assert_eq!(go_name("3d-model"), "X3dModel");
        assert_eq!(go_name("$"), "");
    }

    #[test]
    fn value_names() {
        assert_eq!(go_value_name(&json!("in-progress")), "InProgress");
        assert_eq!(go_value_name(&json!("")), "Empty");
        assert_eq!(go_value_name(&json!(2)), "2");
        assert_eq!(go_value_name(&json!(-1)), "Minus1");
        assert_eq!(go_value_name(&json!(1.5)), "1Dot5");
        assert_eq!(go_value_name(&json!(true)), "True");
        assert_eq!(go_value_name(&json!(null)), "");
    }

    #[test]
    fn document_names() {
        assert_eq!(document_type_name("schemas/user-profile.json"), "UserProfile");
        assert_eq!(document_type_name("order.schema.json"), "OrderSchema");
    }
}
