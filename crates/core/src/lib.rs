//! OpenAPI 3.x to TypeScript client generator.
//!
//! The pipeline is: extract operations from `paths` (registering every schema they use),
//! emit each registered schema as a declaration, then render the client implementation and
//! interface. Output is best-effort: malformed or unsupported constructs are skipped with a
//! warning instead of failing the run.
//!
//! ```no_run
//! use openapi_gen_core::{Flavor, GenerateOptions, generate};
//!
//! let document = serde_json::json!({ "openapi": "3.0.3", "paths": {} });
//! let source = generate(&document, &GenerateOptions {
//!     name: "PetStore".to_string(),
//!     flavor: Flavor::TypeOnly,
//! });
//! assert!(source.contains("export interface PetStore"));
//! ```

pub mod backend;
mod client;
pub mod document;
pub mod emitter;
pub mod extractor;
pub mod operation;
pub mod registry;
pub mod schema;
pub mod ts;
pub mod utils;

use serde_json::Value;
use tracing::debug;

pub use backend::{ClientBackend, EffectSchemaBackend, Flavor, SchemaBackend, TypeOnlyBackend};
pub use emitter::SchemaEmitter;
pub use extractor::extract_operations;
pub use operation::{HttpMethod, ParsedOperation, Payload, UrlPart};
pub use registry::{Registry, SchemaContext};
pub use schema::{Schema, SchemaNode};

/// Default name of the generated client.
pub const DEFAULT_CLIENT_NAME: &str = "Client";

/// Options for a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Name of the client interface; also prefixes the error shape (`<Name>Error`).
    pub name: String,
    pub flavor: Flavor,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            name: DEFAULT_CLIENT_NAME.to_string(),
            flavor: Flavor::default(),
        }
    }
}

/// Generates the TypeScript client module for an OpenAPI 3.x document.
pub fn generate(document: &Value, options: &GenerateOptions) -> String {
    match options.flavor {
        Flavor::Schema => generate_with(document, &options.name, &EffectSchemaBackend),
        Flavor::TypeOnly => generate_with(document, &options.name, &TypeOnlyBackend),
    }
}

fn generate_with<B>(document: &Value, name: &str, backend: &B) -> String
where
    B: SchemaBackend + ClientBackend,
{
    let context = SchemaContext::new(document);
    let mut registry = Registry::new();
    let operations = extract_operations(&context, &mut registry);

    let emitter = SchemaEmitter::new(&registry, &context, backend);
    let schemas = emitter.emit_all();
    debug!(
        operations = operations.len(),
        registered = registry.len(),
        declarations = schemas.len(),
        "Generated client."
    );

    let mut sections = vec![backend.imports()];
    if !schemas.is_empty() {
        sections.push(schemas.join("\n\n"));
    }
    sections.push(backend.to_implementation(name, &operations));
    sections.push(backend.to_types(name, &operations));
    let mut output = sections.join("\n\n");
    output.push('\n');
    output
}
