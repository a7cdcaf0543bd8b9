//! Turns registered schemas into source fragments through a [`SchemaBackend`].
//!
//! Naming mirrors the registry walk exactly: a property's position is named
//! `parent + Identifier(key)`, union branches and allOf compositions use the enum child
//! name, and array items have no name. A fragment that cannot be rendered is `None` and
//! is omitted by its parent.

use serde_json::{Number, Value};
use tracing::{debug, warn};

use crate::backend::{
    ArrayFacets, Bound, NumberFacets, Property, SchemaBackend, StringFacets, TopLevel,
};
use crate::registry::{Entry, Registry, SchemaContext, resolve_all_of};
use crate::schema::{Exclusive, Items, Schema, SchemaNode, SchemaType};
use crate::utils::{enum_child_name, identifier, is_internal_ref, json_literal, ref_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Nested,
    TopLevel,
    /// Top-level class: objects render without their struct wrapper.
    TopLevelClass,
}

pub struct SchemaEmitter<'r, 'c> {
    registry: &'r Registry,
    context: &'r SchemaContext<'c>,
    backend: &'r dyn SchemaBackend,
}

impl std::fmt::Debug for SchemaEmitter<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaEmitter")
            .field("entries", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl<'r, 'c> SchemaEmitter<'r, 'c> {
    pub fn new(
        registry: &'r Registry,
        context: &'r SchemaContext<'c>,
        backend: &'r dyn SchemaBackend,
    ) -> Self {
        Self {
            registry,
            context,
            backend,
        }
    }

    /// Every registered schema as a declaration, in registry order.
    pub fn emit_all(&self) -> Vec<String> {
        self.registry
            .entries()
            .filter_map(|(name, entry)| self.top_level_source(name, entry))
            .collect()
    }

    pub fn top_level_source(&self, name: &str, entry: &Entry) -> Option<String> {
        let schema = entry.schema.as_schema();
        let is_object = schema.is_some_and(|s| s.properties.is_some());
        let position = if is_object && entry.is_class {
            Position::TopLevelClass
        } else {
            Position::TopLevel
        };
        let Some(source) = self.node_source(&entry.schema, Some(name), position) else {
            debug!(name, "Schema has no representation, skipping declaration.");
            return None;
        };
        let description = schema.and_then(|s| s.description.as_deref().or(s.title.as_deref()));
        Some(self.backend.on_top_level(TopLevel {
            name,
            source,
            description,
            is_class: entry.is_class,
            is_enum: entry.is_enum,
            is_object,
        }))
    }

    /// Renders a schema position. `current` is the name of the position, if it has one.
    pub fn to_source(
        &self,
        node: &SchemaNode,
        current: Option<&str>,
        top_level: bool,
    ) -> Option<String> {
        let position = if top_level {
            Position::TopLevel
        } else {
            Position::Nested
        };
        self.node_source(node, current, position)
    }

    fn node_source(
        &self,
        node: &SchemaNode,
        current: Option<&str>,
        position: Position,
    ) -> Option<String> {
        match node {
            SchemaNode::Bool(true) => Some(self.backend.on_unknown()),
            SchemaNode::Bool(false) => None,
            SchemaNode::Schema(schema) => {
                let schema = schema.as_ref().clone().cleanup();
                self.schema_source(&schema, current, position)
            }
        }
    }

    fn schema_source(
        &self,
        schema: &Schema,
        current: Option<&str>,
        position: Position,
    ) -> Option<String> {
        let nested = position == Position::Nested;

        if let Some(properties) = &schema.properties {
            return self.object_source(schema, properties, current, position);
        }
        match schema.type_name() {
            Some("null") => return Some(self.backend.on_null()),
            Some("object") => return self.record_source(schema),
            _ => {}
        }
        if let Some(value) = &schema.const_value {
            return Some(self.backend.on_enum(&[json_literal(value)]));
        }
        if let Some(values) = &schema.enum_values {
            if nested && let Some(name) = current.filter(|name| self.registry.is_enum(name)) {
                return Some(self.backend.on_ref(name));
            }
            if values.is_empty() {
                return Some(self.backend.on_never());
            }
            let literals: Vec<String> = values.iter().map(json_literal).collect();
            return Some(self.backend.on_enum(&literals));
        }
        if let Some(reference) = &schema.ref_path {
            return self.ref_source(reference);
        }
        if let Some(members) = &schema.all_of {
            if members.is_empty() {
                return None;
            }
            let name = current.map(enum_child_name);
            if nested && let Some(name) = name.as_deref().filter(|n| self.registry.contains(n)) {
                return Some(self.backend.on_ref(name));
            }
            let merged = resolve_all_of(schema, self.context);
            return self.schema_source(&merged, name.as_deref(), position);
        }
        if let Some(members) = schema.union_members() {
            return self.union_source(members, current);
        }
        match &schema.schema_type {
            Some(SchemaType::Single(type_name)) => self.typed_source(type_name, schema),
            Some(SchemaType::Multiple(types)) if !types.is_empty() => {
                let sources: Vec<String> = types
                    .iter()
                    .filter_map(|type_name| self.typed_source(type_name, schema))
                    .collect();
                self.join_union(sources)
            }
            _ => Some(self.backend.on_unknown()),
        }
    }

    fn typed_source(&self, type_name: &str, schema: &Schema) -> Option<String> {
        match type_name {
            "string" => Some(self.backend.on_string(&StringFacets {
                min_length: schema.min_length,
                max_length: schema.max_length,
                pattern: schema.pattern.as_deref(),
                binary: schema.format.as_deref() == Some("binary")
                    || schema.content_encoding.as_deref() == Some("binary"),
            })),
            "integer" | "number" => Some(self.backend.on_number(&number_facets(
                schema,
                type_name == "integer",
            ))),
            "boolean" => Some(self.backend.on_boolean()),
            "null" => Some(self.backend.on_null()),
            "object" => self.record_source(schema),
            "array" => self.array_source(schema),
            other => {
                debug!(type_name = other, "Unknown schema type, emitting unknown.");
                Some(self.backend.on_unknown())
            }
        }
    }

    fn record_source(&self, schema: &Schema) -> Option<String> {
        let values = match &schema.additional_properties {
            None | Some(SchemaNode::Bool(true)) => None,
            Some(SchemaNode::Bool(false)) => Some(self.backend.on_never()),
            Some(node) => Some(self.node_source(node, None, Position::Nested)?),
        };
        Some(self.backend.on_record(values))
    }

    fn array_source(&self, schema: &Schema) -> Option<String> {
        let item = match &schema.items {
            None => self.backend.on_unknown(),
            Some(Items::Single(SchemaNode::Bool(false))) => self.backend.on_never(),
            Some(Items::Single(item)) => self.node_source(item, None, Position::Nested)?,
            Some(Items::Tuple(items)) => self.union_source(items, None)?,
        };
        Some(self.backend.on_array(ArrayFacets {
            item,
            non_empty: schema.min_items.is_some_and(|min| min >= 1),
            max_items: schema.max_items,
        }))
    }

    fn ref_source(&self, reference: &str) -> Option<String> {
        if !is_internal_ref(reference) {
            return None;
        }
        let name = ref_name(reference);
        if self.registry.contains(&name) {
            Some(self.backend.on_ref(&name))
        } else {
            warn!(reference, "Reference was never registered, omitting it.");
            None
        }
    }

    fn union_source(&self, members: &[SchemaNode], current: Option<&str>) -> Option<String> {
        let name = current.map(enum_child_name);
        let sources: Vec<String> = literal_branches(members)
            .into_iter()
            .filter_map(|member| self.node_source(member, name.as_deref(), Position::Nested))
            .collect();
        self.join_union(sources)
    }

    fn join_union(&self, sources: Vec<String>) -> Option<String> {
        let mut unique: Vec<String> = Vec::with_capacity(sources.len());
        for source in sources {
            if !unique.contains(&source) {
                unique.push(source);
            }
        }
        match unique.len() {
            0 => None,
            1 => unique.pop(),
            _ => Some(self.backend.on_union(&unique)),
        }
    }

    fn object_source(
        &self,
        schema: &Schema,
        properties: &indexmap::IndexMap<String, SchemaNode>,
        current: Option<&str>,
        position: Position,
    ) -> Option<String> {
        let required = schema.required.as_deref().unwrap_or_default();
        let rendered: Vec<String> = properties
            .iter()
            .filter_map(|(key, property)| {
                let child = current.map(|parent| format!("{parent}{}", identifier(key)));
                self.property_source(key, property, child.as_deref(), required.contains(key))
            })
            .collect();
        if rendered.is_empty() && !properties.is_empty() {
            return None;
        }
        Some(
            self.backend
                .on_properties(&rendered, position == Position::TopLevelClass),
        )
    }

    fn property_source(
        &self,
        key: &str,
        node: &SchemaNode,
        child: Option<&str>,
        is_required: bool,
    ) -> Option<String> {
        let own = node.to_schema();
        // For references the annotations come from the target.
        let full = match own.as_ref().and_then(|s| s.ref_path.as_deref()) {
            Some(reference) => self
                .registry
                .resolved_ref(reference)
                .cloned()
                .or_else(|| self.context.resolve_schema(reference)?.to_schema())
                .or_else(|| own.clone()),
            None => own.clone(),
        };

        let inline = own.as_ref().is_some_and(|s| s.ref_path.is_none());
        let (source, nullable_union) = match full.as_ref().and_then(filter_nullable) {
            Some(inner) if inline => {
                let name = child.map(enum_child_name);
                (self.node_source(&inner, name.as_deref(), Position::Nested), true)
            }
            Some(inner) => (self.node_source(&inner, None, Position::Nested), true),
            None => (self.node_source(node, child, Position::Nested), false),
        };
        let source = source?;

        // Keywords next to a `$ref` apply on top of the target's.
        let default = own
            .as_ref()
            .and_then(|s| s.default.as_ref())
            .or_else(|| full.as_ref().and_then(|s| s.default.as_ref()));
        let is_nullable = nullable_union
            || matches!(default, Some(Value::Null))
            || [own.as_ref(), full.as_ref()]
                .into_iter()
                .flatten()
                .any(|s| s.nullable == Some(true));
        let description = own
            .as_ref()
            .and_then(|s| s.description.as_deref().or(s.title.as_deref()))
            .or_else(|| {
                full.as_ref()
                    .and_then(|s| s.description.as_deref().or(s.title.as_deref()))
            });

        Some(self.backend.property_source(Property {
            key,
            source,
            description,
            is_optional: !is_required,
            is_nullable,
            default,
        }))
    }
}

/// For a two-member union with exactly one null member, the other member.
pub fn filter_nullable(schema: &Schema) -> Option<SchemaNode> {
    let members = schema.union_members()?;
    if members.len() != 2 {
        return None;
    }
    let is_null = |member: &SchemaNode| member.to_schema().is_some_and(|s| s.is_null());
    match (is_null(&members[0]), is_null(&members[1])) {
        (true, false) => Some(members[1].clone()),
        (false, true) => Some(members[0].clone()),
        _ => None,
    }
}

/// Const branches next to at most one plain primitive branch: keep only the consts.
///
/// `anyOf: [{const: "a"}, {const: "b"}, {type: string}]` is a closed literal set in
/// practice, the open string branch only documents the literal type.
fn literal_branches(members: &[SchemaNode]) -> Vec<&SchemaNode> {
    let (consts, others): (Vec<&SchemaNode>, Vec<&SchemaNode>) = members
        .iter()
        .partition(|m| m.as_schema().is_some_and(|s| s.const_value.is_some()));
    let plain_primitive = |member: &&SchemaNode| {
        member.to_schema().is_some_and(|s| {
            matches!(s.type_name(), Some("string" | "number" | "integer" | "boolean"))
                && !s.is_enum_like()
                && s.ref_path.is_none()
                && s.properties.is_none()
        })
    };
    if !consts.is_empty() && others.len() <= 1 && others.iter().all(plain_primitive) {
        consts
    } else {
        members.iter().collect()
    }
}

fn number_facets(schema: &Schema, integer: bool) -> NumberFacets {
    let bound = |value: &Option<Number>, exclusive: &Option<Exclusive>| match exclusive {
        Some(Exclusive::Bound(limit)) => Some(Bound {
            value: limit.clone(),
            exclusive: true,
        }),
        Some(Exclusive::Flag(flag)) => value.clone().map(|value| Bound {
            value,
            exclusive: *flag,
        }),
        None => value.clone().map(|value| Bound {
            value,
            exclusive: false,
        }),
    };
    NumberFacets {
        integer,
        minimum: bound(&schema.minimum, &schema.exclusive_minimum),
        maximum: bound(&schema.maximum, &schema.exclusive_maximum),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::backend::{EffectSchemaBackend, TypeOnlyBackend};
    use serde_json::json;

    fn registry_for(doc: &Value, roots: &[(&str, Value, bool)]) -> Registry {
        let ctx = SchemaContext::new(doc);
        let mut registry = Registry::new();
        for (name, schema, as_struct) in roots {
            registry.add_schema(name, SchemaNode::from_value(schema), &ctx, *as_struct);
        }
        registry
    }

    fn emit(doc: &Value, schema: Value) -> Option<String> {
        let ctx = SchemaContext::new(doc);
        let registry = Registry::new();
        let emitter = SchemaEmitter::new(&registry, &ctx, &EffectSchemaBackend);
        emitter.to_source(&SchemaNode::from_value(&schema), None, false)
    }

    #[test]
    fn test_filter_nullable() {
        let s: Schema =
            serde_json::from_value(json!({ "anyOf": [{ "type": "string" }, { "type": "null" }] }))
                .unwrap();
        let inner = filter_nullable(&s).unwrap();
        assert_eq!(inner.as_schema().unwrap().type_name(), Some("string"));

        let s: Schema = serde_json::from_value(
            json!({ "oneOf": [{ "type": "string" }, { "type": "null" }, { "type": "number" }] }),
        )
        .unwrap();
        assert!(filter_nullable(&s).is_none());

        let s: Schema = serde_json::from_value(json!({ "anyOf": [{ "const": null }, { "type": "integer" }] }))
            .unwrap();
        assert!(filter_nullable(&s).is_some());
    }

    #[test]
    fn test_primitives() {
        let doc = json!({});
        assert_eq!(emit(&doc, json!({ "type": "string" })).unwrap(), "S.String");
        assert_eq!(emit(&doc, json!({ "type": "boolean" })).unwrap(), "S.Boolean");
        assert_eq!(emit(&doc, json!({ "type": "null" })).unwrap(), "S.Null");
        assert_eq!(emit(&doc, json!({})).unwrap(), "S.Unknown");
        assert_eq!(emit(&doc, json!(true)).unwrap(), "S.Unknown");
        assert_eq!(emit(&doc, json!(false)), None);
        assert_eq!(
            emit(&doc, json!({ "type": "string", "format": "binary" })).unwrap(),
            "S.instanceOf(globalThis.Blob)"
        );
    }

    #[test]
    fn test_number_facets() {
        let doc = json!({});
        assert_eq!(
            emit(&doc, json!({ "type": "integer", "minimum": 1, "exclusiveMaximum": 10 })).unwrap(),
            "S.Int.pipe(S.greaterThanOrEqualTo(1), S.lessThan(10))"
        );
        assert_eq!(
            emit(&doc, json!({ "type": "number", "minimum": 0, "exclusiveMinimum": true })).unwrap(),
            "S.Number.pipe(S.greaterThan(0))"
        );
        assert_eq!(emit(&doc, json!({ "type": "number" })).unwrap(), "S.Number");
    }

    #[test]
    fn test_arrays() {
        let doc = json!({});
        assert_eq!(
            emit(&doc, json!({ "type": "array", "items": { "type": "string" }, "minItems": 1 }))
                .unwrap(),
            "S.NonEmptyArray(S.String)"
        );
        assert_eq!(
            emit(&doc, json!({ "type": "array", "items": { "type": "string" }, "maxItems": 3 }))
                .unwrap(),
            "S.Array(S.String).pipe(S.maxItems(3))"
        );
        assert_eq!(
            emit(&doc, json!({ "type": "array" })).unwrap(),
            "S.Array(S.Unknown)"
        );
        assert_eq!(
            emit(&doc, json!({ "type": "array", "items": false })).unwrap(),
            "S.Array(S.Never)"
        );
        assert_eq!(
            emit(&doc, json!({ "type": "array", "items": [{ "type": "string" }, { "type": "number" }] }))
                .unwrap(),
            "S.Array(S.Union(S.String, S.Number))"
        );
    }

    #[test]
    fn test_unions() {
        let doc = json!({});
        assert_eq!(
            emit(&doc, json!({ "type": ["string", "integer"] })).unwrap(),
            "S.Union(S.String, S.Int)"
        );
        assert_eq!(emit(&doc, json!({ "anyOf": [] })), None);
        assert_eq!(
            emit(&doc, json!({ "anyOf": [{ "type": "string" }, { "type": "string" }] })).unwrap(),
            "S.String"
        );
        assert_eq!(
            emit(&doc, json!({ "anyOf": [{ "const": "a" }, { "const": "b" }, { "type": "string" }] }))
                .unwrap(),
            "S.Union(S.Literal(\"a\"), S.Literal(\"b\"))"
        );
        assert_eq!(
            emit(&doc, json!({ "anyOf": [{ "const": "a" }, { "type": "string" }, { "type": "number" }] }))
                .unwrap(),
            "S.Union(S.Literal(\"a\"), S.String, S.Number)"
        );
    }

    #[test]
    fn test_record() {
        let doc = json!({});
        assert_eq!(
            emit(&doc, json!({ "type": "object" })).unwrap(),
            "S.Record({ key: S.String, value: S.Unknown })"
        );
        assert_eq!(
            emit(&doc, json!({ "type": "object", "additionalProperties": { "type": "number" } }))
                .unwrap(),
            "S.Record({ key: S.String, value: S.Number })"
        );
        assert_eq!(
            emit(&doc, json!({ "type": "object", "additionalProperties": false })).unwrap(),
            "S.Record({ key: S.String, value: S.Never })"
        );
    }

    #[test]
    fn test_object_with_only_omitted_properties_is_omitted() {
        let doc = json!({});
        assert_eq!(
            emit(&doc, json!({ "properties": { "a": false } })),
            None
        );
        assert_eq!(emit(&doc, json!({ "properties": {} })).unwrap(), "S.Struct({})");
    }

    #[test]
    fn test_enum_reference_reuses_registered_name() {
        let doc = json!({});
        let pet = json!({
            "type": "object",
            "required": ["status"],
            "properties": { "status": { "type": "string", "enum": ["available", "sold"] } }
        });
        let registry = registry_for(&doc, &[("Pet", pet, false)]);
        let ctx = SchemaContext::new(&doc);
        let emitter = SchemaEmitter::new(&registry, &ctx, &EffectSchemaBackend);
        let out = emitter.emit_all();
        assert_eq!(
            out[0],
            "export class PetStatus extends S.Literal(\"available\", \"sold\") {}"
        );
        assert!(out[1].contains("\"status\": PetStatus"));
    }

    #[test]
    fn test_keywords_beside_ref_apply_to_property() {
        let doc = json!({
            "components": { "schemas": {
                "User": { "type": "object", "properties": { "id": { "type": "string" } } },
                "Role": { "type": "string", "enum": ["admin", "user"] }
            } }
        });
        let account = json!({
            "type": "object",
            "required": ["owner"],
            "properties": {
                "owner": { "allOf": [{ "$ref": "#/components/schemas/User" }], "nullable": true },
                "role": { "$ref": "#/components/schemas/Role", "default": "user" }
            }
        });
        let registry = registry_for(&doc, &[("Account", account, false)]);
        let ctx = SchemaContext::new(&doc);
        let emitter = SchemaEmitter::new(&registry, &ctx, &EffectSchemaBackend);
        let out = emitter.emit_all().join("\n");
        assert!(out.contains("\"owner\": S.NullOr(User)"));
        assert!(out.contains(
            "\"role\": S.optionalWith(Role, { nullable: true, default: () => \"user\" as const })"
        ));
    }

    #[test]
    fn test_nullable_property_unwraps_union() {
        let doc = json!({});
        let thing = json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": { "anyOf": [{ "type": "string" }, { "type": "null" }] },
                "count": { "type": "integer", "default": 1 }
            }
        });
        let registry = registry_for(&doc, &[("Thing", thing, false)]);
        let ctx = SchemaContext::new(&doc);
        let emitter = SchemaEmitter::new(&registry, &ctx, &TypeOnlyBackend);
        let out = emitter.emit_all();
        assert_eq!(
            out[0],
            "export interface Thing {\n  readonly \"name\": string | null\n  readonly \"count\"?: number | undefined\n}"
        );
    }

    #[test]
    fn test_unregistered_ref_is_omitted() {
        let doc = json!({ "components": { "schemas": { "Pet": { "type": "string" } } } });
        assert_eq!(emit(&doc, json!({ "$ref": "#/components/schemas/Pet" })), None);
    }
}
