//! Resolved schema graph → [`TypeModel`].
//!
//! The builder decides, per canonical node, whether it becomes a record, an
//! alias, a primitive, a sequence, a map or the fallback type, and gives
//! every declaration a unique name through a [`NameRegistry`] that lives
//! for exactly one call to [`build`].

mod naming;
pub mod registry;
mod state;
mod structs;
mod types;

pub use registry::{Claim, NameRegistry};
pub use state::Options;

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::debug;

use crate::common::{NodeHash, go_name, go_value_name};
use crate::error::{Error, Result};
use crate::model::{Alias, Constant, Field, NamedKind, NamedRef, Record, ResolvedType, TypeModel};
use crate::resolver::{Additional, NodeId, SchemaGraph, Slot};

use naming::base_name;
use structs::{
    alias_fingerprint, closes_on, cyclic_alias_fingerprint, cyclic_record_fingerprint, mentions,
    record_fingerprint, rename_type, unique_member_name,
};
use types::{Shape, classify, literal_fits};

/// Build the type model of a resolved batch.
///
/// Documents are visited in batch order, each one's definitions before its
/// root, so every definition is declared even when nothing refers to it.
pub fn build(graph: &SchemaGraph, options: &Options) -> Result<TypeModel> {
    let mut builder = ModelBuilder::new(graph, options);
    for document in graph.documents() {
        builder.build_definitions(document.root)?;
        builder.resolve(document.root)?;
    }
    Ok(builder.finish())
}

struct ModelBuilder<'g> {
    graph: &'g SchemaGraph,
    options: &'g Options,
    registry: NameRegistry,
    /// Finished types by canonical node.
    resolved: HashMap<NodeId, ResolvedType>,
    /// Keys of `resolved` in insertion order.
    resolved_order: Vec<NodeId>,
    /// Cyclic declarations whose name is reserved but whose body is still
    /// being built.
    pending: HashMap<NodeId, NamedRef>,
    records: Vec<Record>,
    aliases: Vec<Alias>,
}

enum Collection {
    Sequence,
    Map,
}

/// How far the build had got when a recursive declaration started.
struct Mark {
    records: usize,
    aliases: usize,
    resolved: usize,
}

impl<'g> ModelBuilder<'g> {
    fn new(graph: &'g SchemaGraph, options: &'g Options) -> Self {
        Self {
            graph,
            options,
            registry: NameRegistry::new(),
            resolved: HashMap::new(),
            resolved_order: Vec::new(),
            pending: HashMap::new(),
            records: Vec::new(),
            aliases: Vec::new(),
        }
    }

    fn build_definitions(&mut self, id: NodeId) -> Result<()> {
        let graph = self.graph;
        for definition in &graph.node(id).definitions {
            self.build_definitions(definition.node)?;
            self.resolve(definition.node)?;
        }
        Ok(())
    }

    /// Type of the schema at `id`, following its reference if it has one.
    fn resolve(&mut self, id: NodeId) -> Result<ResolvedType> {
        let graph = self.graph;
        let node = graph.node(id);
        if node.reference.is_some() && node.target.is_none() {
            return Ok(ResolvedType::Fallback);
        }

        let id = graph.canonical(id);
        if let Some(ty) = self.resolved.get(&id) {
            return Ok(ty.clone());
        }
        if let Some(named) = self.pending.get(&id) {
            return Ok(ResolvedType::Named(NamedRef {
                recursive: true,
                ..named.clone()
            }));
        }

        let ty = self.build_type(id)?;
        self.resolved.insert(id, ty.clone());
        self.resolved_order.push(id);
        Ok(ty)
    }

    fn build_type(&mut self, id: NodeId) -> Result<ResolvedType> {
        let ty = self.build_shape(id)?;
        if self.graph.node(id).slot == Slot::Root {
            return Ok(self.declare_root(id, ty));
        }
        Ok(ty)
    }

    fn build_shape(&mut self, id: NodeId) -> Result<ResolvedType> {
        let graph = self.graph;
        let options = self.options;
        let node = graph.node(id);
        if let Some(keyword) = node.composition {
            debug!(
                document = %graph.documents()[node.document].name,
                pointer = %node.pointer,
                keyword,
                "composition is not supported; using the fallback type"
            );
            return Ok(ResolvedType::Fallback);
        }
        if let Some(missing) = node.required.iter().find(|key| !node.properties.contains_key(*key)) {
            return Err(Error::conflict(
                base_name(graph, id, options),
                format!("required property \"{missing}\" is not declared in properties"),
            ));
        }

        let classified = classify(node);
        if let Some(values) = node.enumeration.as_deref().filter(|v| !v.is_empty()) {
            return Ok(self.build_enum(id, classified.shape, values));
        }

        match classified.shape {
            Shape::Primitive(primitive) => Ok(ResolvedType::Primitive(primitive)),
            Shape::Object if !node.properties.is_empty() => self.build_record(id),
            Shape::Object => self.build_collection(id, Collection::Map),
            Shape::Array => self.build_collection(id, Collection::Sequence),
            Shape::Fallback => {
                if node.types.len() > 1 {
                    debug!(
                        pointer = %node.pointer,
                        types = ?node.types.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
                        "types cannot be unified; using the fallback type"
                    );
                }
                Ok(ResolvedType::Fallback)
            }
        }
    }

    /// Name a document root that is not a declaration already, so that
    /// references to the document resolve to that name.
    fn declare_root(&mut self, root: NodeId, ty: ResolvedType) -> ResolvedType {
        let graph = self.graph;
        let options = self.options;
        let node = graph.node(root);

        if matches!(ty, ResolvedType::Named(_)) {
            return ty;
        }
        if ty == ResolvedType::Fallback
            && node.types.is_empty()
            && node.enumeration.is_none()
            && node.composition.is_none()
        {
            debug!(
                document = %graph.documents()[node.document].name,
                "root schema declares no type of its own"
            );
            return ty;
        }

        let indirect = ty.is_indirect();
        let base = base_name(graph, root, options);
        match self.registry.claim(&base, alias_fingerprint(&ty, &[])) {
            Claim::Existing(name) => {
                debug!(alias = %base, existing = %name, "deduplicated root alias");
                ResolvedType::Named(alias_ref(&name, indirect))
            }
            Claim::New(name) => {
                self.aliases.push(Alias {
                    name: name.clone(),
                    description: node.description.clone(),
                    ty,
                    values: Vec::new(),
                    constants: Vec::new(),
                });
                ResolvedType::Named(alias_ref(&name, indirect))
            }
        }
    }

    /// Record for an object with properties.
    fn build_record(&mut self, id: NodeId) -> Result<ResolvedType> {
        let graph = self.graph;
        let options = self.options;
        let node = graph.node(id);
        let base = base_name(graph, id, options);

        if let Some(Additional::Schema(_)) = node.additional {
            debug!(record = %base, "additionalProperties ignored on an object with properties");
        }

        let reserved = graph.is_cyclic(id).then(|| {
            let name = self.registry.reserve(&base);
            debug!(record = %name, "recursive record");
            self.pending.insert(id, record_ref(&name));
            name
        });
        let mark = self.mark();

        let mut fields = Vec::with_capacity(node.properties.len());
        let mut member_names = HashSet::new();
        for (key, &child) in &node.properties {
            let ty = self.resolve(child)?;
            let nullable = classify(graph.node(graph.canonical(child))).nullable;
            fields.push(Field {
                name: unique_member_name(&mut member_names, &go_name(key)),
                key: key.clone(),
                ty,
                required: node.required.contains(key),
                nullable,
                description: graph.node(child).description.clone(),
            });
        }

        let name = match reserved {
            Some(name) => {
                self.pending.remove(&id);
                let types: Vec<&ResolvedType> = fields.iter().map(|f| &f.ty).collect();
                let fingerprint = cyclic_record_fingerprint(&name, &fields);
                if let Some(existing) = self.merge_cycle(&name, &types, &mark, fingerprint) {
                    debug!(record = %name, existing = %existing, "deduplicated recursive record");
                    return Ok(ResolvedType::Named(record_ref(&existing)));
                }
                name
            }
            None => match self.registry.claim(&base, record_fingerprint(&fields)) {
                Claim::Existing(name) => {
                    debug!(record = %base, existing = %name, "deduplicated record");
                    return Ok(ResolvedType::Named(record_ref(&name)));
                }
                Claim::New(name) => name,
            },
        };

        self.records.push(Record {
            name: name.clone(),
            description: node.description.clone(),
            fields,
        });
        Ok(ResolvedType::Named(record_ref(&name)))
    }

    /// Sequence or map. Only a cyclic one that is the target of a `$ref`
    /// is declared, so the cycle closes on a name.
    fn build_collection(&mut self, id: NodeId, collection: Collection) -> Result<ResolvedType> {
        let graph = self.graph;
        let options = self.options;
        let node = graph.node(id);
        let reserved = (graph.is_cyclic(id) && graph.is_ref_target(id)).then(|| {
            let name = self.registry.reserve(&base_name(graph, id, options));
            debug!(alias = %name, "recursive collection");
            self.pending.insert(id, alias_ref(&name, true));
            name
        });
        let mark = self.mark();

        let ty = match collection {
            Collection::Sequence => {
                let items = match node.items {
                    Some(items) => self.resolve(items)?,
                    None => ResolvedType::Fallback,
                };
                ResolvedType::Sequence(Box::new(items))
            }
            Collection::Map => {
                let values = match node.additional {
                    Some(Additional::Schema(values)) => self.resolve(values)?,
                    _ => ResolvedType::Fallback,
                };
                ResolvedType::Map(Box::new(values))
            }
        };

        let Some(name) = reserved else {
            return Ok(ty);
        };
        self.pending.remove(&id);
        let fingerprint = cyclic_alias_fingerprint(&name, &ty);
        if let Some(existing) = self.merge_cycle(&name, &[&ty], &mark, fingerprint) {
            debug!(alias = %name, existing = %existing, "deduplicated recursive collection");
            return Ok(ResolvedType::Named(alias_ref(&existing, true)));
        }
        self.aliases.push(Alias {
            name: name.clone(),
            description: node.description.clone(),
            ty,
            values: Vec::new(),
            constants: Vec::new(),
        });
        Ok(ResolvedType::Named(alias_ref(&name, true)))
    }

    /// Named alias restricted to the literal values, with one typed
    /// constant per literal the underlying primitive can hold.
    fn build_enum(&mut self, id: NodeId, shape: Shape, values: &[Value]) -> ResolvedType {
        let graph = self.graph;
        let options = self.options;
        let node = graph.node(id);
        let ty = match shape {
            Shape::Primitive(primitive) => ResolvedType::Primitive(primitive),
            _ => ResolvedType::Fallback,
        };
        let indirect = ty.is_indirect();
        let base = base_name(graph, id, options);

        let name = match self.registry.claim(&base, alias_fingerprint(&ty, values)) {
            Claim::Existing(name) => {
                debug!(alias = %base, existing = %name, "deduplicated enum");
                return ResolvedType::Named(alias_ref(&name, indirect));
            }
            Claim::New(name) => name,
        };

        let mut constants = Vec::new();
        if let ResolvedType::Primitive(primitive) = ty {
            for value in values.iter().filter(|v| literal_fits(primitive, v)) {
                let suffix = go_value_name(value);
                constants.push(Constant {
                    name: self.registry.reserve(&format!("{name}{suffix}")),
                    value: value.clone(),
                });
            }
        }

        self.aliases.push(Alias {
            name: name.clone(),
            description: node.description.clone(),
            ty,
            values: values.to_vec(),
            constants,
        });
        ResolvedType::Named(alias_ref(&name, indirect))
    }

    fn mark(&self) -> Mark {
        Mark {
            records: self.records.len(),
            aliases: self.aliases.len(),
            resolved: self.resolved_order.len(),
        }
    }

    /// Fold a finished recursive declaration into an identical earlier one.
    ///
    /// Only a cycle that closes on `name` alone qualifies: its back-references
    /// all point at itself and nothing declared since `mark` refers to it.
    /// Types memoized since `mark` are repointed at the surviving name.
    fn merge_cycle(
        &mut self,
        name: &str,
        types: &[&ResolvedType],
        mark: &Mark,
        fingerprint: NodeHash,
    ) -> Option<String> {
        let closed = types.iter().all(|ty| closes_on(ty, name))
            && !self.records[mark.records..]
                .iter()
                .flat_map(|record| &record.fields)
                .any(|field| mentions(&field.ty, name))
            && !self.aliases[mark.aliases..].iter().any(|alias| mentions(&alias.ty, name));
        if !closed {
            return None;
        }

        let Claim::Existing(existing) = self.registry.settle(name, fingerprint) else {
            return None;
        };
        self.registry.release(name);
        for id in &self.resolved_order[mark.resolved..] {
            if let Some(ty) = self.resolved.get_mut(id) {
                *ty = rename_type(ty, name, &existing);
            }
        }
        Some(existing)
    }

    fn finish(mut self) -> TypeModel {
        self.records.sort_by(|a, b| a.name.cmp(&b.name));
        self.aliases.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(
            records = self.records.len(),
            aliases = self.aliases.len(),
            "built type model"
        );
        TypeModel {
            records: self.records,
            aliases: self.aliases,
        }
    }
}

fn record_ref(name: &str) -> NamedRef {
    NamedRef {
        name: name.to_string(),
        kind: NamedKind::Record,
        recursive: false,
    }
}

fn alias_ref(name: &str, indirect: bool) -> NamedRef {
    NamedRef {
        name: name.to_string(),
        kind: NamedKind::Alias { indirect },
        recursive: false,
    }
}
