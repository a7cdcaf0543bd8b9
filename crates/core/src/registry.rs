//! Named schema registry.
//!
//! Every schema that ends up as a top-level declaration is registered here first: component
//! schemas reached through `$ref`, inline enums and allOf compositions under a derived name,
//! and the per-operation parameter, request and response schemas. Entries keep their
//! discovery order, and dependencies are stored before the schemas that use them.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use indexmap::map::Entry as MapEntry;
use serde_json::Value;
use tracing::{debug, warn};

use crate::schema::{Items, Schema, SchemaNode, merge_schemas};
use crate::utils::{decode_ref_tokens, enum_child_name, identifier, is_internal_ref, ref_name};

/// Read-only view of the whole document, used to resolve internal references.
#[derive(Debug, Clone, Copy)]
pub struct SchemaContext<'a> {
    document: &'a Value,
}

impl<'a> SchemaContext<'a> {
    pub fn new(document: &'a Value) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &'a Value {
        self.document
    }

    /// Follows an internal reference through the document.
    pub fn resolve_value(&self, reference: &str) -> Option<&'a Value> {
        if !is_internal_ref(reference) {
            return None;
        }
        let mut current = self.document;
        for token in decode_ref_tokens(reference) {
            current = match current {
                Value::Object(map) => map.get(&token)?,
                Value::Array(items) => items.get(token.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn resolve_schema(&self, reference: &str) -> Option<SchemaNode> {
        self.resolve_value(reference).map(SchemaNode::from_value)
    }
}

/// A registered schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub schema: SchemaNode,
    /// Emitted as a nominal class rather than a structural alias.
    pub is_class: bool,
    /// An enum or const: references to this name emit the name instead of the literals.
    pub is_enum: bool,
}

#[derive(Debug, Default)]
pub struct Registry {
    entries: IndexMap<String, Entry>,
    visited_refs: HashSet<String>,
    resolved_refs: HashMap<String, Schema>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    pub fn is_enum(&self, name: &str) -> bool {
        self.entries.get(name).is_some_and(|entry| entry.is_enum)
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Target of an already-registered reference.
    pub fn resolved_ref(&self, reference: &str) -> Option<&Schema> {
        self.resolved_refs.get(reference)
    }

    /// Registers `root` under `name` and returns the name to refer to it by.
    ///
    /// A root that is a bare `$ref` registers the target instead and returns its name.
    /// `as_struct` roots are emitted as plain structs rather than classes.
    pub fn add_schema(
        &mut self,
        name: &str,
        root: SchemaNode,
        ctx: &SchemaContext<'_>,
        as_struct: bool,
    ) -> String {
        let root = root.cleanup();
        if let Some(reference) = root.as_schema().and_then(|s| s.ref_path.clone()) {
            self.register_ref(&reference, false, ctx);
            return ref_name(&reference);
        }
        if self.entries.contains_key(name) {
            return name.to_string();
        }
        let root = flatten_all_of(root, ctx);
        self.add_refs(&root, Some(name), ctx);
        let is_enum = root.is_enum_like();
        self.insert_if_absent(
            name,
            Entry {
                schema: root,
                is_class: !as_struct,
                is_enum,
            },
        );
        name.to_string()
    }

    fn insert_if_absent(&mut self, name: &str, entry: Entry) {
        if let MapEntry::Vacant(slot) = self.entries.entry(name.to_string()) {
            debug!(name, is_class = entry.is_class, is_enum = entry.is_enum, "Registered schema.");
            slot.insert(entry);
        }
    }

    /// Walks `node` and registers everything it depends on.
    ///
    /// `child_name` is the name this position would get; inline enums and allOf
    /// compositions are registered under it. Array items have no name.
    fn add_refs(&mut self, node: &SchemaNode, child_name: Option<&str>, ctx: &SchemaContext<'_>) {
        let Some(schema) = node.to_schema() else {
            return;
        };

        if let Some(properties) = &schema.properties {
            for (key, property) in properties {
                let child = child_name.map(|parent| format!("{parent}{}", identifier(key)));
                self.add_refs(property, child.as_deref(), ctx);
            }
            return;
        }

        if schema.type_name() == Some("object") {
            if let Some(values) = &schema.additional_properties {
                self.add_refs(values, None, ctx);
            }
            return;
        }

        if schema.is_enum_like() {
            if let Some(name) = child_name {
                self.insert_if_absent(
                    name,
                    Entry {
                        schema: SchemaNode::from(schema),
                        is_class: false,
                        is_enum: true,
                    },
                );
            }
            return;
        }

        if let Some(reference) = &schema.ref_path {
            self.register_ref(reference, true, ctx);
            return;
        }

        if schema.all_of.is_some() {
            let merged = resolve_all_of(&schema, ctx);
            match child_name {
                Some(parent) => {
                    let name = enum_child_name(parent);
                    if self.entries.contains_key(&name) {
                        return;
                    }
                    let merged = SchemaNode::from(merged);
                    self.add_refs(&merged, Some(&name), ctx);
                    self.insert_if_absent(
                        &name,
                        Entry {
                            is_enum: merged.is_enum_like(),
                            schema: merged,
                            is_class: true,
                        },
                    );
                }
                None => self.add_refs(&SchemaNode::from(merged), None, ctx),
            }
            return;
        }

        if let Some(members) = schema.union_members() {
            let child = child_name.map(enum_child_name);
            for member in members {
                self.add_refs(member, child.as_deref(), ctx);
            }
            return;
        }

        match &schema.items {
            Some(Items::Single(item)) => self.add_refs(item, None, ctx),
            Some(Items::Tuple(items)) => {
                for item in items {
                    self.add_refs(item, None, ctx);
                }
            }
            None => {}
        }
    }

    fn register_ref(&mut self, reference: &str, as_struct: bool, ctx: &SchemaContext<'_>) {
        if !is_internal_ref(reference) {
            debug!(reference, "Skipping external reference.");
            return;
        }
        let name = ref_name(reference);
        if self.entries.contains_key(&name) || !self.visited_refs.insert(reference.to_string()) {
            return;
        }
        let Some(target) = ctx.resolve_schema(reference) else {
            warn!(reference, "Unresolvable reference, skipping.");
            return;
        };
        let target = flatten_all_of(target.cleanup(), ctx);
        if let Some(schema) = target.as_schema() {
            self.resolved_refs.insert(reference.to_string(), schema.clone());
        }
        self.add_refs(&target, Some(&name), ctx);
        let is_enum = target.is_enum_like();
        self.insert_if_absent(
            &name,
            Entry {
                schema: target,
                is_class: !as_struct,
                is_enum,
            },
        );
    }
}

fn flatten_all_of(node: SchemaNode, ctx: &SchemaContext<'_>) -> SchemaNode {
    match node {
        SchemaNode::Schema(schema) if schema.all_of.is_some() => {
            SchemaNode::from(resolve_all_of(&schema, ctx))
        }
        node => node,
    }
}

/// Flattens an allOf composition into a single schema with no composition keys left.
///
/// Members are merged left to right, each one resolved first (its own `$ref` and nested
/// allOf). The wrapper's own keywords are merged last. References already being resolved
/// are skipped, so cyclic compositions terminate.
pub fn resolve_all_of(schema: &Schema, ctx: &SchemaContext<'_>) -> Schema {
    let mut resolving = Vec::new();
    resolve_all_of_with(schema, ctx, &mut resolving)
}

fn resolve_all_of_with(
    schema: &Schema,
    ctx: &SchemaContext<'_>,
    resolving: &mut Vec<String>,
) -> Schema {
    let mut wrapper = schema.clone();
    let Some(members) = wrapper.all_of.take() else {
        return wrapper;
    };
    let merged = members
        .iter()
        .filter_map(|member| resolve_member(member, ctx, resolving))
        .fold(Schema::default(), merge_schemas);
    merge_schemas(merged, wrapper)
}

fn resolve_member(
    member: &SchemaNode,
    ctx: &SchemaContext<'_>,
    resolving: &mut Vec<String>,
) -> Option<Schema> {
    let SchemaNode::Schema(schema) = member else {
        return None;
    };
    let mut schema = schema.as_ref().clone().cleanup();
    let Some(reference) = schema.ref_path.take() else {
        return Some(resolve_all_of_with(&schema, ctx, resolving));
    };
    if resolving.contains(&reference) {
        return None;
    }
    let Some(SchemaNode::Schema(target)) = ctx.resolve_schema(&reference) else {
        warn!(reference, "Unresolvable allOf member, skipping.");
        return None;
    };
    resolving.push(reference);
    let target = resolve_member(&SchemaNode::Schema(target), ctx, resolving);
    resolving.pop();
    let siblings = resolve_all_of_with(&schema, ctx, resolving);
    Some(match target {
        Some(target) => merge_schemas(siblings, target),
        None => siblings,
    })
}
