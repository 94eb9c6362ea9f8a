use serde::Serialize;
use serde_json::Value;
use xxhash_rust::xxh64::xxh64;

/// Structural fingerprint of a generated type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHash {
    pub hash_value: u64,
    /// Length of the canonical text that was hashed.
    pub count: usize,
}

/// Hash a JSON value using xxh64 over its compact serialization.
///
/// Object keys keep their insertion order, so two values hash equal only when
/// they were built with the same key order.
pub fn get_tree_hash(json_obj: &Value) -> NodeHash {
    let json_str = json_obj.to_string();
    NodeHash {
        hash_value: xxh64(json_str.as_bytes(), 0),
        count: json_str.len(),
    }
}

/// Hash any serializable shape description.
///
/// # Panics
///
/// When `shape` has no JSON representation (for example a map with
/// non-string keys). Declaration shapes are plain structs of strings, flags
/// and JSON literals.
pub fn get_shape_hash<T: Serialize>(shape: &T) -> NodeHash {
    let value = serde_json::to_value(shape).expect("declaration shapes serialize to JSON");
    get_tree_hash(&value)
}
