use indexmap::IndexMap;
use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A primitive or structural kind named by the `type` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Object,
    Array,
    String,
    Integer,
    Number,
    Boolean,
    Null,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Object => "object",
            Kind::Array => "array",
            Kind::String => "string",
            Kind::Integer => "integer",
            Kind::Number => "number",
            Kind::Boolean => "boolean",
            Kind::Null => "null",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "object" => Kind::Object,
            "array" => Kind::Array,
            "string" => Kind::String,
            "integer" => Kind::Integer,
            "number" => Kind::Number,
            "boolean" => Kind::Boolean,
            "null" => Kind::Null,
            _ => return None,
        })
    }
}

const KIND_NAMES: &[&str] = &["object", "array", "string", "integer", "number", "boolean", "null"];

/// The declared kinds of a schema, in declaration order without repeats.
///
/// Deserializes from either `"type": "string"` or `"type": ["string", "null"]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeSet(Vec<Kind>);

impl TypeSet {
    pub fn new(kinds: impl IntoIterator<Item = Kind>) -> Self {
        let mut set = TypeSet::default();
        for kind in kinds {
            set.insert(kind);
        }
        set
    }

    pub fn insert(&mut self, kind: Kind) {
        if !self.0.contains(&kind) {
            self.0.push(kind);
        }
    }

    pub fn contains(&self, kind: Kind) -> bool {
        self.0.contains(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Kind> + '_ {
        self.0.iter().copied()
    }
}

impl<'de> Deserialize<'de> for TypeSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TypeSetVisitor;

        fn kind<E: de::Error>(name: &str) -> Result<Kind, E> {
            Kind::parse(name).ok_or_else(|| E::unknown_variant(name, KIND_NAMES))
        }

        impl<'de> Visitor<'de> for TypeSetVisitor {
            type Value = TypeSet;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a type name or a list of type names")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<TypeSet, E> {
                Ok(TypeSet::new([kind::<E>(v)?]))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<TypeSet, A::Error> {
                let mut set = TypeSet::default();
                while let Some(name) = seq.next_element::<String>()? {
                    set.insert(kind::<A::Error>(&name)?);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_any(TypeSetVisitor)
    }
}

/// The `additionalProperties` keyword.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<Schema>),
}

/// One parsed schema fragment of the supported draft-04 profile.
///
/// Keywords outside the profile are ignored, except the composition
/// keywords which are kept so the builder can report that it fell back.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Schema {
    #[serde(rename = "$id", alias = "id")]
    pub id: Option<String>,
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub types: TypeSet,
    pub properties: IndexMap<String, Schema>,
    pub items: Option<Box<Schema>>,
    pub required: Vec<String>,
    pub format: Option<String>,
    #[serde(rename = "enum")]
    pub enumeration: Option<Vec<Value>>,
    #[serde(rename = "additionalProperties")]
    pub additional_properties: Option<AdditionalProperties>,
    pub definitions: IndexMap<String, Schema>,
    #[serde(rename = "$defs")]
    pub defs: IndexMap<String, Schema>,
    #[serde(rename = "allOf")]
    pub all_of: Option<Value>,
    #[serde(rename = "anyOf")]
    pub any_of: Option<Value>,
    #[serde(rename = "oneOf")]
    pub one_of: Option<Value>,
}

impl Schema {
    /// Named sub-schemas from `definitions` and `$defs`, with the pointer
    /// segment each one lives under.
    pub fn named_definitions(&self) -> impl Iterator<Item = (&'static str, &str, &Schema)> {
        self.definitions
            .iter()
            .map(|(k, v)| ("definitions", k.as_str(), v))
            .chain(self.defs.iter().map(|(k, v)| ("$defs", k.as_str(), v)))
    }

    /// First composition keyword present on this schema, if any.
    pub fn composition_keyword(&self) -> Option<&'static str> {
        if self.all_of.is_some() {
            Some("allOf")
        } else if self.any_of.is_some() {
            Some("anyOf")
        } else if self.one_of.is_some() {
            Some("oneOf")
        } else {
            None
        }
    }
}

/// A parsed schema document and the name it was loaded under.
#[derive(Debug, Clone)]
pub struct Document {
    /// Source identifier, usually the path the text was read from.
    pub name: String,
    pub schema: Schema,
}
