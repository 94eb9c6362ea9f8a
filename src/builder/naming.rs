use crate::common::{document_type_name, go_name};
use crate::resolver::{NodeId, SchemaGraph, Slot};

use super::Options;

/// Positional base name of the type declared for `id`.
///
/// A `title` always wins. Otherwise the name follows the node's position:
/// the document name for a root, the key for a definition, the parent name
/// plus the key for a property, and the parent name plus `Item` or `Value`
/// for array items and map values.
pub(crate) fn base_name(graph: &SchemaGraph, id: NodeId, options: &Options) -> String {
    let node = graph.node(id);
    if let Some(title) = node.title.as_deref().map(go_name).filter(|t| !t.is_empty()) {
        return title;
    }

    let name = match (&node.slot, node.parent) {
        (Slot::Root, _) => root_name(graph, node.document, options),
        (Slot::Definition(key), _) => go_name(key),
        (Slot::Property(key), Some(parent)) => base_name(graph, parent, options) + &go_name(key),
        (Slot::Items, Some(parent)) => base_name(graph, parent, options) + "Item",
        (Slot::AdditionalProperties, Some(parent)) => base_name(graph, parent, options) + "Value",
        (_, None) => String::new(),
    };

    if name.is_empty() { "Type".to_string() } else { name }
}

fn root_name(graph: &SchemaGraph, document: usize, options: &Options) -> String {
    match (&options.root_name, document) {
        (Some(name), 0) => go_name(name),
        _ => {
            let name = document_type_name(&graph.documents()[document].name);
            if name.is_empty() { "Root".to_string() } else { name }
        }
    }
}
