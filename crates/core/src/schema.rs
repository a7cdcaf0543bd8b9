//! JSON Schema model as it appears inside OpenAPI documents.
//!
//! Deserialization is permissive: every keyword is optional, unknown keywords are ignored
//! and a keyword with the wrong shape is dropped on its own. `const` and `default` keep an
//! explicit JSON `null` apart from an absent key.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};
use tracing::warn;

/// Upper bound on cleanup passes; each pass only ever shrinks the schema.
const MAX_CLEANUP_PASSES: usize = 32;

/// A schema position: either a boolean schema or a schema object.
///
/// Any other JSON value degrades to the `true` schema, so one malformed node never takes
/// its siblings down with it.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Bool(bool),
    Schema(Box<Schema>),
}

impl<'de> Deserialize<'de> for SchemaNode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let node = match Value::deserialize(deserializer)? {
            Value::Bool(flag) => SchemaNode::Bool(flag),
            value @ Value::Object(_) => match Schema::deserialize(value) {
                Ok(schema) => SchemaNode::from(schema),
                Err(err) => {
                    warn!(error = %err, "Malformed schema, treating it as unknown.");
                    SchemaNode::Bool(true)
                }
            },
            other => {
                warn!(value = %other, "Malformed schema, treating it as unknown.");
                SchemaNode::Bool(true)
            }
        };
        Ok(node)
    }
}

/// The `type` keyword: a single name or a list of names.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    Single(String),
    Multiple(Vec<String>),
}

/// The `items` keyword: a single schema or a tuple of positional schemas.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Items {
    Tuple(Vec<SchemaNode>),
    Single(SchemaNode),
}

/// `exclusiveMinimum`/`exclusiveMaximum`: a flag (OpenAPI 3.0) or a bound (3.1).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Exclusive {
    Flag(bool),
    Bound(Number),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub schema_type: Option<SchemaType>,
    #[serde(rename = "$ref", default, deserialize_with = "lenient")]
    pub ref_path: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub properties: Option<IndexMap<String, SchemaNode>>,
    #[serde(default, deserialize_with = "lenient")]
    pub required: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub additional_properties: Option<SchemaNode>,
    #[serde(default, deserialize_with = "lenient")]
    pub items: Option<Items>,
    #[serde(rename = "enum", default, deserialize_with = "lenient")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(rename = "const", default, deserialize_with = "deserialize_present")]
    pub const_value: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub all_of: Option<Vec<SchemaNode>>,
    #[serde(default, deserialize_with = "lenient")]
    pub any_of: Option<Vec<SchemaNode>>,
    #[serde(default, deserialize_with = "lenient")]
    pub one_of: Option<Vec<SchemaNode>>,
    #[serde(default, deserialize_with = "lenient")]
    pub nullable: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub default: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub format: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub content_encoding: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub pattern: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub min_length: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub max_length: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub min_items: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub max_items: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub minimum: Option<Number>,
    #[serde(default, deserialize_with = "lenient")]
    pub maximum: Option<Number>,
    #[serde(default, deserialize_with = "lenient")]
    pub exclusive_minimum: Option<Exclusive>,
    #[serde(default, deserialize_with = "lenient")]
    pub exclusive_maximum: Option<Exclusive>,
}

/// Drops a keyword whose value has the wrong shape instead of failing the whole schema.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(err) => {
            warn!(error = %err, "Ignoring malformed schema keyword.");
            Ok(None)
        }
    }
}

/// Maps a present key to `Some`, including an explicit `null`.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl From<Schema> for SchemaNode {
    fn from(schema: Schema) -> Self {
        SchemaNode::Schema(Box::new(schema))
    }
}

impl SchemaNode {
    /// Reads a schema position out of raw JSON. Malformed schemas degrade to "unknown".
    pub fn from_value(value: &Value) -> SchemaNode {
        SchemaNode::deserialize(value).unwrap_or(SchemaNode::Bool(true))
    }

    pub fn as_schema(&self) -> Option<&Schema> {
        match self {
            SchemaNode::Schema(schema) => Some(schema),
            SchemaNode::Bool(_) => None,
        }
    }

    /// Cleaned schema object; `true` becomes the empty schema, `false` stays absent.
    pub fn to_schema(&self) -> Option<Schema> {
        match self {
            SchemaNode::Bool(true) => Some(Schema::default()),
            SchemaNode::Bool(false) => None,
            SchemaNode::Schema(schema) => Some(schema.as_ref().clone().cleanup()),
        }
    }

    pub fn cleanup(self) -> SchemaNode {
        match self {
            SchemaNode::Schema(schema) => SchemaNode::from(schema.cleanup()),
            node @ SchemaNode::Bool(_) => node,
        }
    }

    pub fn is_enum_like(&self) -> bool {
        self.as_schema().is_some_and(Schema::is_enum_like)
    }
}

impl Schema {
    pub fn type_name(&self) -> Option<&str> {
        match &self.schema_type {
            Some(SchemaType::Single(name)) => Some(name),
            _ => None,
        }
    }

    pub fn is_enum_like(&self) -> bool {
        self.enum_values.is_some() || self.const_value.is_some()
    }

    /// True for a `null` type or a `null` constant.
    pub fn is_null(&self) -> bool {
        self.type_name() == Some("null") || matches!(self.const_value, Some(Value::Null))
    }

    pub fn union_members(&self) -> Option<&Vec<SchemaNode>> {
        self.any_of.as_ref().or(self.one_of.as_ref())
    }

    /// Normalizes the schema until it stops changing.
    ///
    /// - A type list containing `null` drops it and sets `nullable` instead; only `null` left
    ///   becomes the `null` type.
    /// - An empty `oneOf` is removed.
    /// - A single-member `allOf`/`anyOf`/`oneOf` is merged into its parent.
    pub fn cleanup(self) -> Schema {
        let mut current = self;
        for _ in 0..MAX_CLEANUP_PASSES {
            let next = current.clone().cleanup_once();
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    fn cleanup_once(mut self) -> Schema {
        if let Some(SchemaType::Multiple(types)) = &self.schema_type {
            let had_null = types.iter().any(|t| t == "null");
            let mut rest: Vec<String> = types.iter().filter(|t| *t != "null").cloned().collect();
            self.schema_type = match rest.len() {
                0 if had_null => Some(SchemaType::Single("null".to_string())),
                0 => None,
                1 => rest.pop().map(SchemaType::Single),
                _ => Some(SchemaType::Multiple(rest)),
            };
            if had_null && self.type_name() != Some("null") {
                self.nullable = Some(true);
            }
        }
        if self.one_of.as_ref().is_some_and(Vec::is_empty) {
            self.one_of = None;
        }
        self = collapse_single_member(self, |s| &mut s.all_of);
        self = collapse_single_member(self, |s| &mut s.any_of);
        collapse_single_member(self, |s| &mut s.one_of)
    }

    /// Fills every absent keyword of `self` from `other`.
    fn overlay(self, other: Schema) -> Schema {
        Schema {
            schema_type: self.schema_type.or(other.schema_type),
            ref_path: self.ref_path.or(other.ref_path),
            properties: self.properties.or(other.properties),
            required: self.required.or(other.required),
            additional_properties: self.additional_properties.or(other.additional_properties),
            items: self.items.or(other.items),
            enum_values: self.enum_values.or(other.enum_values),
            const_value: self.const_value.or(other.const_value),
            all_of: self.all_of.or(other.all_of),
            any_of: self.any_of.or(other.any_of),
            one_of: self.one_of.or(other.one_of),
            nullable: self.nullable.or(other.nullable),
            default: self.default.or(other.default),
            description: self.description.or(other.description),
            title: self.title.or(other.title),
            format: self.format.or(other.format),
            content_encoding: self.content_encoding.or(other.content_encoding),
            pattern: self.pattern.or(other.pattern),
            min_length: self.min_length.or(other.min_length),
            max_length: self.max_length.or(other.max_length),
            min_items: self.min_items.or(other.min_items),
            max_items: self.max_items.or(other.max_items),
            minimum: self.minimum.or(other.minimum),
            maximum: self.maximum.or(other.maximum),
            exclusive_minimum: self.exclusive_minimum.or(other.exclusive_minimum),
            exclusive_maximum: self.exclusive_maximum.or(other.exclusive_maximum),
        }
    }
}

fn collapse_single_member(
    mut schema: Schema,
    slot: fn(&mut Schema) -> &mut Option<Vec<SchemaNode>>,
) -> Schema {
    let members = slot(&mut schema);
    if members.as_ref().is_none_or(|m| m.len() != 1) {
        return schema;
    }
    match members.take().and_then(|mut m| m.pop()) {
        Some(SchemaNode::Schema(member)) => merge_schemas(member.cleanup(), schema),
        // `true` adds no constraint.
        Some(SchemaNode::Bool(true)) | None => schema,
        Some(SchemaNode::Bool(false)) => {
            *slot(&mut schema) = Some(vec![SchemaNode::Bool(false)]);
            schema
        }
    }
}

/// Merges two schemas, `primary` winning every conflict.
///
/// When either side declares properties the property maps are unioned (primary keys first)
/// and the `required` lists are concatenated. Otherwise two `anyOf` lists are concatenated.
/// Every remaining keyword is taken from `primary` when present, else from `secondary`.
pub fn merge_schemas(primary: Schema, mut secondary: Schema) -> Schema {
    if primary.properties.is_some() || secondary.properties.is_some() {
        let mut properties = primary.properties.clone().unwrap_or_default();
        for (key, value) in secondary.properties.take().unwrap_or_default() {
            properties.entry(key).or_insert(value);
        }
        let has_required = primary.required.is_some() || secondary.required.is_some();
        let mut required = primary.required.clone().unwrap_or_default();
        required.extend(secondary.required.take().unwrap_or_default());

        let mut merged = primary.overlay(secondary);
        merged.properties = Some(properties);
        merged.required = has_required.then_some(required);
        return merged;
    }
    if let (Some(left), Some(right)) = (&primary.any_of, &secondary.any_of) {
        let mut any_of = left.clone();
        any_of.extend(right.iter().cloned());
        let mut merged = primary.overlay(secondary);
        merged.any_of = Some(any_of);
        return merged;
    }
    primary.overlay(secondary)
}
