use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

use crate::common::{NodeHash, get_shape_hash};
use crate::model::{Field, NamedRef, ResolvedType};

/// Stands in for a recursive declaration's own name while fingerprinting.
/// Generated identifiers are never empty.
const SELF_NAME: &str = "";

/// Canonical structure of a declaration, hashed for deduplication.
///
/// Names of the declarations themselves and descriptions are left out.
#[derive(Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
enum DeclarationShape<'a> {
    Record { fields: Vec<FieldShape<'a>> },
    Alias { ty: &'a ResolvedType, values: &'a [Value] },
}

#[derive(Serialize)]
struct FieldShape<'a> {
    name: &'a str,
    key: &'a str,
    ty: &'a ResolvedType,
    required: bool,
    nullable: bool,
}

/// Fingerprint of a record with the given fields.
pub(crate) fn record_fingerprint(fields: &[Field]) -> NodeHash {
    let fields = fields
        .iter()
        .map(|f| FieldShape {
            name: &f.name,
            key: &f.key,
            ty: &f.ty,
            required: f.required,
            nullable: f.nullable,
        })
        .collect();
    get_shape_hash(&DeclarationShape::Record { fields })
}

/// Fingerprint of an alias for `ty` restricted to `values`.
pub(crate) fn alias_fingerprint(ty: &ResolvedType, values: &[Value]) -> NodeHash {
    get_shape_hash(&DeclarationShape::Alias { ty, values })
}

/// Fingerprint of a recursive record, independent of its own name.
pub(crate) fn cyclic_record_fingerprint(name: &str, fields: &[Field]) -> NodeHash {
    let fields: Vec<Field> = fields
        .iter()
        .map(|f| Field {
            ty: rename_type(&f.ty, name, SELF_NAME),
            ..f.clone()
        })
        .collect();
    record_fingerprint(&fields)
}

/// Fingerprint of a recursive collection alias, independent of its own name.
pub(crate) fn cyclic_alias_fingerprint(name: &str, ty: &ResolvedType) -> NodeHash {
    alias_fingerprint(&rename_type(ty, name, SELF_NAME), &[])
}

/// Copy of `ty` with references to `from` pointing at `to`.
pub(crate) fn rename_type(ty: &ResolvedType, from: &str, to: &str) -> ResolvedType {
    match ty {
        ResolvedType::Named(named) if named.name == from => ResolvedType::Named(NamedRef {
            name: to.to_string(),
            ..named.clone()
        }),
        ResolvedType::Sequence(item) => ResolvedType::Sequence(Box::new(rename_type(item, from, to))),
        ResolvedType::Map(value) => ResolvedType::Map(Box::new(rename_type(value, from, to))),
        other => other.clone(),
    }
}

pub(crate) fn mentions(ty: &ResolvedType, name: &str) -> bool {
    match ty {
        ResolvedType::Named(named) => named.name == name,
        ResolvedType::Sequence(inner) | ResolvedType::Map(inner) => mentions(inner, name),
        ResolvedType::Primitive(_) | ResolvedType::Fallback => false,
    }
}

/// Whether every back-reference inside `ty` points at `name`.
pub(crate) fn closes_on(ty: &ResolvedType, name: &str) -> bool {
    match ty {
        ResolvedType::Named(named) => !named.recursive || named.name == name,
        ResolvedType::Sequence(inner) | ResolvedType::Map(inner) => closes_on(inner, name),
        ResolvedType::Primitive(_) | ResolvedType::Fallback => true,
    }
}

/// Field identifier not yet used in the record.
pub(crate) fn unique_member_name(taken: &mut HashSet<String>, base: &str) -> String {
    let base = if base.is_empty() { "Field" } else { base };
    let name = if taken.contains(base) {
        (2..)
            .map(|n| format!("{base}{n}"))
            .find(|candidate| !taken.contains(candidate))
            .unwrap_or_else(|| base.to_string())
    } else {
        base.to_string()
    };
    taken.insert(name.clone());
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NamedKind, Primitive};
    use serde_json::json;

    fn field(key: &str, required: bool) -> Field {
        Field {
            name: key.to_uppercase(),
            key: key.to_string(),
            ty: ResolvedType::Primitive(Primitive::String),
            required,
            nullable: false,
            description: None,
        }
    }

    #[test]
    fn descriptions_do_not_change_fingerprints() {
        let mut described = field("a", true);
        described.description = Some("the a".into());
        assert_eq!(record_fingerprint(&[field("a", true)]), record_fingerprint(&[described]));
        assert_ne!(record_fingerprint(&[field("a", true)]), record_fingerprint(&[field("a", false)]));
    }

    #[test]
    fn aliases_and_records_never_collide() {
        let string = ResolvedType::Primitive(Primitive::String);
        assert_ne!(alias_fingerprint(&string, &[]), record_fingerprint(&[]));
        assert_ne!(
            alias_fingerprint(&string, &[json!("a")]),
            alias_fingerprint(&string, &[json!("b")])
        );
    }

    fn back_reference(name: &str) -> ResolvedType {
        ResolvedType::Named(NamedRef {
            name: name.to_string(),
            kind: NamedKind::Record,
            recursive: true,
        })
    }

    #[test]
    fn recursive_fingerprints_ignore_the_own_name() {
        let children = |name: &str| Field {
            ty: ResolvedType::Sequence(Box::new(back_reference(name))),
            ..field("children", false)
        };
        assert_eq!(
            cyclic_record_fingerprint("Tree", &[children("Tree")]),
            cyclic_record_fingerprint("Tree2", &[children("Tree2")])
        );
        assert_ne!(
            cyclic_record_fingerprint("Tree", &[children("Tree")]),
            record_fingerprint(&[children("Tree")])
        );
        assert_ne!(
            cyclic_record_fingerprint("Tree", &[children("Tree")]),
            cyclic_record_fingerprint("Tree2", &[children("Tree")])
        );
    }

    #[test]
    fn cycles_close_only_on_their_own_name() {
        let list = ResolvedType::Map(Box::new(back_reference("List")));
        assert!(closes_on(&list, "List"));
        assert!(!closes_on(&list, "Other"));
        assert!(mentions(&list, "List"));
        assert!(!mentions(&ResolvedType::Fallback, "List"));
        assert_eq!(
            rename_type(&list, "List", "Tree"),
            ResolvedType::Map(Box::new(back_reference("Tree")))
        );
    }

    #[test]
    fn member_names_are_unique() {
        let mut taken = HashSet::new();
        assert_eq!(unique_member_name(&mut taken, "FirstName"), "FirstName");
        assert_eq!(unique_member_name(&mut taken, "FirstName"), "FirstName2");
        assert_eq!(unique_member_name(&mut taken, ""), "Field");
    }
}
