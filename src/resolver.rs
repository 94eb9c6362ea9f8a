//! Reference resolution over a batch of parsed documents.
//!
//! Every schema fragment of every document is copied into one arena
//! ([`SchemaGraph`]). `$ref` pointers are then resolved against the base URL
//! of their document:
//! - fragment-only pointers (`#/definitions/address`, `#`) stay inside the
//!   document,
//! - `other.json#/definitions/x` and absolute `$id` URLs select another
//!   document of the batch,
//! - sloppy `#definitions/x` fragments are read as `#/definitions/x`.
//!
//! Chains of references are followed to the first node that is not itself a
//! reference. Cycles are not errors: they are recorded so the builder can
//! name the types involved before it descends into them.

mod cycles;
mod graph;

pub use graph::{Additional, Definition, DocumentInfo, Node, NodeId, SchemaGraph, Slot};

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::schema::{AdditionalProperties, Document, Schema};

static FILE_ROOT: LazyLock<Url> =
    LazyLock::new(|| Url::parse("file:///").expect("valid file root url"));

/// Resolve every `$ref` of the batch into a closed [`SchemaGraph`].
pub fn resolve(documents: &[Document]) -> Result<SchemaGraph> {
    let mut flattener = Flattener::default();
    for (index, document) in documents.iter().enumerate() {
        flattener.add_document(index, document);
    }
    flattener.link()
}

#[derive(Default)]
struct Flattener {
    nodes: Vec<Node>,
    documents: Vec<DocumentInfo>,
    /// Raw `$ref` strings, in document order.
    references: Vec<(NodeId, String)>,
    /// Absolute URL without fragment → node it identifies.
    bases: HashMap<String, NodeId>,
}

impl Flattener {
    fn add_document(&mut self, index: usize, document: &Document) {
        let file_url = FILE_ROOT
            .join(&document.name)
            .unwrap_or_else(|_| FILE_ROOT.clone());
        let mut base = match &document.schema.id {
            Some(id) => file_url.join(id).unwrap_or_else(|_| file_url.clone()),
            None => file_url.clone(),
        };
        base.set_fragment(None);

        let root = self.insert(index, &document.schema, String::new(), None, Slot::Root, &base);

        for url in [&file_url, &base] {
            if let Some(previous) = self.bases.insert(url.to_string(), root) {
                if previous != root {
                    warn!(url = %url, document = %document.name, "document identifier is used twice; the later document wins");
                }
            }
        }

        self.documents.push(DocumentInfo {
            name: document.name.clone(),
            base,
            root,
        });
    }

    fn insert(
        &mut self,
        document: usize,
        schema: &Schema,
        pointer: String,
        parent: Option<NodeId>,
        slot: Slot,
        base: &Url,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            document,
            pointer: pointer.clone(),
            parent,
            slot,
            title: schema.title.clone(),
            description: schema.description.clone(),
            types: schema.types.clone(),
            format: schema.format.clone(),
            enumeration: schema.enumeration.clone(),
            properties: Default::default(),
            required: schema.required.clone(),
            items: None,
            additional: None,
            definitions: Vec::new(),
            composition: schema.composition_keyword(),
            reference: schema.reference.clone(),
            target: None,
        });

        if let Some(reference) = &schema.reference {
            self.references.push((id, reference.clone()));
        }

        if let (Some(sub_id), Some(_)) = (&schema.id, parent) {
            if let Ok(mut url) = base.join(sub_id) {
                url.set_fragment(None);
                if &url != base {
                    self.bases.entry(url.to_string()).or_insert(id);
                }
            }
        }

        for (keyword, key, child) in schema.named_definitions() {
            let child_pointer = format!("{pointer}/{keyword}/{}", escape(key));
            let node = self.insert(
                document,
                child,
                child_pointer,
                Some(id),
                Slot::Definition(key.to_string()),
                base,
            );
            self.nodes[id.0].definitions.push(Definition {
                keyword,
                key: key.to_string(),
                node,
            });
        }

        for (key, child) in &schema.properties {
            let child_pointer = format!("{pointer}/properties/{}", escape(key));
            let node = self.insert(
                document,
                child,
                child_pointer,
                Some(id),
                Slot::Property(key.clone()),
                base,
            );
            self.nodes[id.0].properties.insert(key.clone(), node);
        }

        if let Some(items) = &schema.items {
            let node = self.insert(document, items, format!("{pointer}/items"), Some(id), Slot::Items, base);
            self.nodes[id.0].items = Some(node);
        }

        match &schema.additional_properties {
            Some(AdditionalProperties::Allowed(allowed)) => {
                self.nodes[id.0].additional = Some(Additional::Allowed(*allowed));
            }
            Some(AdditionalProperties::Schema(values)) => {
                let node = self.insert(
                    document,
                    values,
                    format!("{pointer}/additionalProperties"),
                    Some(id),
                    Slot::AdditionalProperties,
                    base,
                );
                self.nodes[id.0].additional = Some(Additional::Schema(node));
            }
            None => {}
        }

        id
    }

    fn link(mut self) -> Result<SchemaGraph> {
        let mut direct: HashMap<NodeId, NodeId> = HashMap::new();
        for (id, reference) in &self.references {
            let target = self.lookup(*id, reference)?;
            direct.insert(*id, target);
        }

        for (id, reference) in &self.references {
            match follow(&direct, *id) {
                Some(target) => self.nodes[id.0].target = Some(target),
                None => warn!(
                    document = %self.documents[self.nodes[id.0].document].name,
                    reference = %reference,
                    "reference loop without content; treating the schema as untyped"
                ),
            }
        }

        let mut ref_targets = vec![false; self.nodes.len()];
        for node in &self.nodes {
            if let Some(target) = node.target {
                ref_targets[target.0] = true;
            }
        }

        let edges: Vec<Vec<usize>> = self
            .nodes
            .iter()
            .map(|node| match node.target {
                Some(target) => vec![target.0],
                None => node.structural_children().map(NodeId::index).collect(),
            })
            .collect();
        let cyclic = cycles::cyclic_nodes(&edges);

        debug!(
            nodes = self.nodes.len(),
            references = self.references.len(),
            cyclic = cyclic.iter().filter(|c| **c).count(),
            "resolved schema graph"
        );

        Ok(SchemaGraph {
            nodes: self.nodes,
            documents: self.documents,
            cyclic,
            ref_targets,
        })
    }

    /// Find the node a `$ref` designates.
    fn lookup(&self, from: NodeId, reference: &str) -> Result<NodeId> {
        let node = &self.nodes[from.0];
        let document = &self.documents[node.document];
        let unresolved = || Error::UnresolvedReference {
            document: document.name.clone(),
            reference: reference.to_string(),
            location: format!("#{}", node.pointer),
        };

        let (resource, fragment) = reference.split_once('#').unwrap_or((reference, ""));
        let start = if resource.is_empty() {
            document.root
        } else {
            let mut url = document.base.join(resource).map_err(|_| unresolved())?;
            url.set_fragment(None);
            *self.bases.get(url.as_str()).ok_or_else(unresolved)?
        };

        let pointer = if fragment.is_empty() || fragment.starts_with('/') {
            fragment.to_string()
        } else {
            format!("/{fragment}")
        };

        self.walk(start, &pointer).ok_or_else(unresolved)
    }

    /// Follow a JSON pointer through the node tree.
    fn walk(&self, start: NodeId, pointer: &str) -> Option<NodeId> {
        let mut current = start;
        let mut segments = pointer.split('/').skip(1).map(unescape);
        while let Some(segment) = segments.next() {
            let node = &self.nodes[current.0];
            current = match segment.as_str() {
                "properties" => {
                    let key = segments.next()?;
                    *node.properties.get(&key)?
                }
                "definitions" | "$defs" => {
                    let key = segments.next()?;
                    node.definitions
                        .iter()
                        .find(|d| d.keyword == segment && d.key == key)?
                        .node
                }
                "items" => node.items?,
                "additionalProperties" => match node.additional {
                    Some(Additional::Schema(id)) => id,
                    _ => return None,
                },
                _ => return None,
            };
        }
        Some(current)
    }
}

/// Follow a chain of references to the first non-reference node.
///
/// Returns `None` when the chain loops back onto itself.
fn follow(direct: &HashMap<NodeId, NodeId>, start: NodeId) -> Option<NodeId> {
    let mut visited = HashSet::from([start]);
    let mut current = *direct.get(&start)?;
    while let Some(&next) = direct.get(&current) {
        if !visited.insert(current) {
            return None;
        }
        current = next;
    }
    Some(current)
}

fn escape(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_batch;

    fn graph(sources: &[(&str, &str)]) -> Result<SchemaGraph> {
        resolve(&parse_batch(sources)?)
    }

    #[test]
    fn local_references_resolve_to_definitions() {
        let graph = graph(&[(
            "person.json",
            r##"{
                "type": "object",
                "properties": { "home": { "$ref": "#/definitions/address" } },
                "definitions": { "address": { "type": "object", "properties": { "city": { "type": "string" } } } }
            }"##,
        )])
        .unwrap();

        let home = graph.find(0, "/properties/home").unwrap();
        let address = graph.find(0, "/definitions/address").unwrap();
        assert_eq!(graph.canonical(home), address);
        assert!(graph.is_ref_target(address));
        assert!(!graph.is_cyclic(address));
    }

    #[test]
    fn sloppy_fragments_and_escapes() {
        let graph = graph(&[(
            "a.json",
            r##"{
                "properties": {
                    "x": { "$ref": "#definitions/a~1b" },
                    "y": { "$ref": "#/definitions/t~0" }
                },
                "definitions": { "a/b": { "type": "string" }, "t~": { "type": "integer" } }
            }"##,
        )])
        .unwrap();
        let x = graph.find(0, "/properties/x").unwrap();
        let y = graph.find(0, "/properties/y").unwrap();
        assert_eq!(graph.canonical(x), graph.find(0, "/definitions/a~1b").unwrap());
        assert_eq!(graph.canonical(y), graph.find(0, "/definitions/t~0").unwrap());
    }

    #[test]
    fn cross_document_references_by_name_and_id() {
        let graph = graph(&[
            (
                "order.json",
                r#"{
                    "properties": {
                        "customer": { "$ref": "customer.json" },
                        "item": { "$ref": "http://example.com/item.json#/definitions/sku" }
                    }
                }"#,
            ),
            ("customer.json", r#"{ "type": "object", "properties": { "id": { "type": "string" } } }"#),
            (
                "item.json",
                r#"{ "$id": "http://example.com/item.json", "definitions": { "sku": { "type": "string" } } }"#,
            ),
        ])
        .unwrap();

        let customer = graph.find(0, "/properties/customer").unwrap();
        assert_eq!(graph.canonical(customer), graph.documents()[1].root);
        let item = graph.find(0, "/properties/item").unwrap();
        assert_eq!(graph.canonical(item), graph.find(2, "/definitions/sku").unwrap());
    }

    #[test]
    fn reference_chains_resolve_transitively() {
        let graph = graph(&[(
            "a.json",
            r##"{
                "properties": { "p": { "$ref": "#/definitions/one" } },
                "definitions": {
                    "one": { "$ref": "#/definitions/two" },
                    "two": { "$ref": "#/definitions/three" },
                    "three": { "type": "boolean" }
                }
            }"##,
        )])
        .unwrap();
        let p = graph.find(0, "/properties/p").unwrap();
        assert_eq!(graph.canonical(p), graph.find(0, "/definitions/three").unwrap());
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let graph = graph(&[(
            "node.json",
            r##"{
                "type": "object",
                "properties": {
                    "value": { "type": "integer" },
                    "next": { "$ref": "#" }
                }
            }"##,
        )])
        .unwrap();
        let root = graph.documents()[0].root;
        let next = graph.find(0, "/properties/next").unwrap();
        assert_eq!(graph.canonical(next), root);
        assert!(graph.is_cyclic(root));
        assert!(graph.is_cyclic(next));
        assert!(!graph.is_cyclic(graph.find(0, "/properties/value").unwrap()));
    }

    #[test]
    fn pure_reference_loop_degrades() {
        let graph = graph(&[(
            "a.json",
            r##"{
                "properties": { "p": { "$ref": "#/definitions/a" } },
                "definitions": {
                    "a": { "$ref": "#/definitions/b" },
                    "b": { "$ref": "#/definitions/a" }
                }
            }"##,
        )])
        .unwrap();
        let p = graph.find(0, "/properties/p").unwrap();
        assert!(graph.node(p).target.is_none());
    }

    #[test]
    fn missing_target_is_reported() {
        let err = graph(&[(
            "a.json",
            r##"{ "properties": { "p": { "$ref": "#/definitions/missing" } } }"##,
        )])
        .unwrap_err();
        match err {
            Error::UnresolvedReference { document, reference, location } => {
                assert_eq!(document, "a.json");
                assert_eq!(reference, "#/definitions/missing");
                assert_eq!(location, "#/properties/p");
            }
            other => panic!("unexpected error {other:?}"),
        }

        let err = graph(&[("a.json", r#"{ "properties": { "p": { "$ref": "b.json" } } }"#)]).unwrap_err();
        assert!(matches!(err, Error::UnresolvedReference { .. }));
    }
}
