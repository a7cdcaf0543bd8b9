//! Pluggable output flavors.
//!
//! The schema emitter and the operation emitter only decide *what* a schema or operation
//! means. A back-end decides how that meaning is spelled in TypeScript: as runtime
//! Effect schemas, or as plain type declarations.

mod effect;
mod types;

pub use effect::EffectSchemaBackend;
pub use types::TypeOnlyBackend;

use serde_json::{Number, Value};

use crate::operation::ParsedOperation;

/// Which back-end renders the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Flavor {
    /// Runtime schemas that decode and validate responses.
    #[default]
    Schema,
    /// Type declarations only; responses are trusted.
    TypeOnly,
}

/// A named top-level declaration ready to be wrapped.
#[derive(Debug, Clone)]
pub struct TopLevel<'a> {
    pub name: &'a str,
    pub source: String,
    pub description: Option<&'a str>,
    pub is_class: bool,
    pub is_enum: bool,
    /// The schema declares properties.
    pub is_object: bool,
}

/// One property of an object, with the annotations that decide its wrapper.
#[derive(Debug, Clone)]
pub struct Property<'a> {
    pub key: &'a str,
    pub source: String,
    pub description: Option<&'a str>,
    pub is_optional: bool,
    pub is_nullable: bool,
    pub default: Option<&'a Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringFacets<'a> {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<&'a str>,
    /// `format: binary` or `contentEncoding: binary`.
    pub binary: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    pub value: Number,
    pub exclusive: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberFacets {
    pub integer: bool,
    pub minimum: Option<Bound>,
    pub maximum: Option<Bound>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayFacets {
    pub item: String,
    /// `minItems >= 1`.
    pub non_empty: bool,
    pub max_items: Option<u64>,
}

/// Spells schema fragments.
pub trait SchemaBackend {
    /// Wraps a fragment as an exported declaration.
    fn on_top_level(&self, decl: TopLevel<'_>) -> String;

    /// One `key: value` line inside an object.
    fn property_source(&self, property: Property<'_>) -> String;

    /// An object from its rendered properties. `bare` drops the struct wrapper, for
    /// class declarations that supply their own.
    fn on_properties(&self, properties: &[String], bare: bool) -> String;

    /// A string-keyed map; `None` means unconstrained values.
    fn on_record(&self, values: Option<String>) -> String;

    /// A literal union; `literals` are already valid TypeScript literals.
    fn on_enum(&self, literals: &[String]) -> String;

    fn on_ref(&self, name: &str) -> String;

    fn on_union(&self, members: &[String]) -> String;

    fn on_string(&self, facets: &StringFacets<'_>) -> String;

    fn on_number(&self, facets: &NumberFacets) -> String;

    fn on_boolean(&self) -> String;

    fn on_array(&self, array: ArrayFacets) -> String;

    fn on_null(&self) -> String;

    fn on_unknown(&self) -> String;

    fn on_never(&self) -> String;
}

/// Spells the client: module imports, the `make` implementation and the interface.
pub trait ClientBackend {
    fn imports(&self) -> String;

    fn to_implementation(&self, name: &str, operations: &[ParsedOperation]) -> String;

    fn to_types(&self, name: &str, operations: &[ParsedOperation]) -> String;
}
