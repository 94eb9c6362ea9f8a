use serde_json::Value;

use crate::model::Primitive;
use crate::resolver::Node;
use crate::schema::{Kind, TypeSet};

/// What a schema node turns into, before naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    /// Record when it has properties, map otherwise.
    Object,
    Array,
    Primitive(Primitive),
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Classified {
    pub shape: Shape,
    /// The type set admits `null`.
    pub nullable: bool,
}

/// Decide the shape of a node from its `type`, `format` and content.
///
/// - `null` is dropped from the type set and only marks the node nullable.
/// - `integer` together with `number` is a number.
/// - With no declared type, the kind is inferred from `properties` or
///   `additionalProperties` (object), `items` (array) or the `enum`
///   literals.
/// - Two or more remaining kinds cannot be unified and give
///   [`Shape::Fallback`].
pub(crate) fn classify(node: &Node) -> Classified {
    let nullable = node.types.contains(Kind::Null);
    let mut kinds = TypeSet::new(node.types.iter().filter(|k| *k != Kind::Null));
    if kinds.contains(Kind::Integer) && kinds.contains(Kind::Number) {
        kinds = TypeSet::new(kinds.iter().filter(|k| *k != Kind::Integer));
    }

    let kind = match kinds.len() {
        0 => infer_kind(node),
        1 => kinds.iter().next(),
        _ => None,
    };

    let shape = match kind {
        Some(Kind::Object) => Shape::Object,
        Some(Kind::Array) => Shape::Array,
        Some(kind) => primitive_for(kind, node.format.as_deref())
            .map(Shape::Primitive)
            .unwrap_or(Shape::Fallback),
        None => Shape::Fallback,
    };

    Classified { shape, nullable }
}

fn infer_kind(node: &Node) -> Option<Kind> {
    if !node.properties.is_empty() || node.additional.is_some() {
        Some(Kind::Object)
    } else if node.items.is_some() {
        Some(Kind::Array)
    } else {
        node.enumeration
            .as_deref()
            .and_then(infer_enum_kind)
    }
}

/// Kind shared by every non-null literal of an `enum`.
pub(crate) fn infer_enum_kind(values: &[Value]) -> Option<Kind> {
    let mut kinds = values.iter().filter(|v| !v.is_null()).map(|value| match value {
        Value::String(_) => Some(Kind::String),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(Kind::Integer),
        Value::Number(_) => Some(Kind::Number),
        Value::Bool(_) => Some(Kind::Boolean),
        _ => None,
    });
    let first = kinds.next()??;
    kinds.try_fold(first, |acc, kind| match (acc, kind?) {
        (a, b) if a == b => Some(a),
        (Kind::Integer, Kind::Number) | (Kind::Number, Kind::Integer) => Some(Kind::Number),
        _ => None,
    })
}

/// Map a scalar kind and its `format` to a primitive.
///
/// Unknown formats keep the default mapping. `null` on its own has no
/// primitive.
pub(crate) fn primitive_for(kind: Kind, format: Option<&str>) -> Option<Primitive> {
    Some(match (kind, format) {
        (Kind::String, Some("date-time")) => Primitive::DateTime,
        (Kind::String, Some("date")) => Primitive::Date,
        (Kind::String, Some("byte")) => Primitive::Bytes,
        (Kind::String, _) => Primitive::String,
        (Kind::Integer, Some("int32")) => Primitive::Int32,
        (Kind::Integer, Some("int64")) => Primitive::Int64,
        (Kind::Integer, _) => Primitive::Integer,
        (Kind::Number, Some("float")) => Primitive::Float32,
        (Kind::Number, _) => Primitive::Number,
        (Kind::Boolean, _) => Primitive::Boolean,
        (Kind::Object | Kind::Array | Kind::Null, _) => return None,
    })
}

/// Whether an enum literal can be written as a constant of the primitive.
pub(crate) fn literal_fits(primitive: Primitive, value: &Value) -> bool {
    match (primitive, value) {
        (Primitive::String, Value::String(_)) => true,
        (Primitive::Integer | Primitive::Int32 | Primitive::Int64, Value::Number(n)) => {
            n.is_i64() || n.is_u64()
        }
        (Primitive::Float32 | Primitive::Number, Value::Number(_)) => true,
        (Primitive::Boolean, Value::Bool(_)) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;
    use crate::resolver::resolve;
    use serde_json::json;

    fn classify_schema(text: &str) -> Classified {
        let graph = resolve(&[parse_document("t.json", text).unwrap()]).unwrap();
        classify(graph.node(graph.documents()[0].root))
    }

    #[test]
    fn nullable_types_keep_their_shape() {
        let c = classify_schema(r#"{ "type": ["string", "null"] }"#);
        assert_eq!(c.shape, Shape::Primitive(Primitive::String));
        assert!(c.nullable);
    }

    #[test]
    fn incompatible_kinds_fall_back() {
        let c = classify_schema(r#"{ "type": ["object", "array", "integer"] }"#);
        assert_eq!(c.shape, Shape::Fallback);
        assert!(!c.nullable);
        assert_eq!(
            classify_schema(r#"{ "type": ["integer", "number"] }"#).shape,
            Shape::Primitive(Primitive::Number)
        );
        assert_eq!(classify_schema(r#"{ "type": "null" }"#).shape, Shape::Fallback);
    }

    #[test]
    fn formats_specialise_primitives() {
        for (text, primitive) in [
            (r#"{ "type": "string", "format": "date" }"#, Primitive::Date),
            (r#"{ "type": "string", "format": "date-time" }"#, Primitive::DateTime),
            (r#"{ "type": "string", "format": "byte" }"#, Primitive::Bytes),
            (r#"{ "type": "string", "format": "email" }"#, Primitive::String),
            (r#"{ "type": "integer", "format": "int64" }"#, Primitive::Int64),
            (r#"{ "type": "number", "format": "float" }"#, Primitive::Float32),
        ] {
            assert_eq!(classify_schema(text).shape, Shape::Primitive(primitive), "{text}");
        }
    }

    #[test]
    fn missing_types_are_inferred() {
        assert_eq!(classify_schema(r#"{ "properties": { "a": {} } }"#).shape, Shape::Object);
        assert_eq!(classify_schema(r#"{ "items": {} }"#).shape, Shape::Array);
        assert_eq!(
            classify_schema(r#"{ "enum": ["a", "b"] }"#).shape,
            Shape::Primitive(Primitive::String)
        );
        assert_eq!(classify_schema("{}").shape, Shape::Fallback);
    }

    #[test]
    fn enum_kinds() {
        assert_eq!(infer_enum_kind(&[json!(1), json!(2)]), Some(Kind::Integer));
        assert_eq!(infer_enum_kind(&[json!(1), json!(2.5)]), Some(Kind::Number));
        assert_eq!(infer_enum_kind(&[json!("a"), json!(null)]), Some(Kind::String));
        assert_eq!(infer_enum_kind(&[json!("a"), json!(1)]), None);
        assert_eq!(infer_enum_kind(&[]), None);
    }
}
