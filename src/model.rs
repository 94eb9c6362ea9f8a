//! The resolved type model produced by the builder and read by the emitter.

use serde::Serialize;
use serde_json::Value;

/// A built-in scalar, possibly specialised by a `format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    String,
    /// `format: byte`, base64 content.
    Bytes,
    /// `format: date-time`.
    DateTime,
    /// `format: date`.
    Date,
    Integer,
    Int32,
    Int64,
    Float32,
    Number,
    Boolean,
}

/// What a [`NamedRef`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedKind {
    Record,
    /// `indirect` is true when the aliased type is itself a collection or
    /// the fallback type.
    Alias { indirect: bool },
}

/// A by-name reference to a declared [`Record`] or [`Alias`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedRef {
    pub name: String,
    pub kind: NamedKind,
    /// The reference closes a cycle and must be emitted through an
    /// indirection.
    pub recursive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum ResolvedType {
    Primitive(Primitive),
    Named(NamedRef),
    Sequence(Box<ResolvedType>),
    /// String-keyed map, from `additionalProperties`.
    Map(Box<ResolvedType>),
    /// No single concrete type fits; rendered as an untyped placeholder.
    Fallback,
}

impl ResolvedType {
    /// Whether the type can already represent absence without a pointer.
    pub fn is_indirect(&self) -> bool {
        match self {
            ResolvedType::Sequence(_) | ResolvedType::Map(_) | ResolvedType::Fallback => true,
            ResolvedType::Primitive(p) => *p == Primitive::Bytes,
            ResolvedType::Named(named) => matches!(named.kind, NamedKind::Alias { indirect: true }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    /// Identifier in the generated record.
    pub name: String,
    /// Original property key from the schema.
    pub key: String,
    #[serde(rename = "type")]
    pub ty: ResolvedType,
    pub required: bool,
    /// The property schema allows `null`.
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Field {
    /// Whether the Go field must be able to hold "no value".
    ///
    /// A required property whose schema allows `null` still counts: the key
    /// is always present (no `omitempty`) but its value may be `null`.
    pub fn is_optional(&self) -> bool {
        !self.required || self.nullable
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<Field>,
}

/// A typed constant belonging to an enum alias.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constant {
    pub name: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alias {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub ty: ResolvedType,
    /// Literal values of an `enum` schema, in declaration order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub constants: Vec<Constant>,
}

/// Output of one build: every declaration, each list sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TypeModel {
    pub records: Vec<Record>,
    pub aliases: Vec<Alias>,
}

impl TypeModel {
    pub fn record(&self, name: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn alias(&self, name: &str) -> Option<&Alias> {
        self.aliases.iter().find(|a| a.name == name)
    }
}

impl Record {
    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == key)
    }
}
