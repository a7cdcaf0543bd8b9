//! Operation extractor: walks `paths` and builds one [`ParsedOperation`] per operation.
//!
//! Parameter, request and response schemas are registered in the [`Registry`] under names
//! derived from the operation, so the operation itself only carries those names.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use crate::document::{MaybeRef, Operation, Parameter, PathItem, json_schema};
use crate::operation::{
    HttpMethod, ParsedOperation, PathTemplate, Payload, UrlPart, is_success_status,
    status_class,
};
use crate::registry::{Registry, SchemaContext};
use crate::schema::{Schema, SchemaNode, SchemaType};
use crate::utils::{camelize, identifier, non_empty_string};

const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Extracts every operation of the document, in path then method order.
pub fn extract_operations(ctx: &SchemaContext<'_>, registry: &mut Registry) -> Vec<ParsedOperation> {
    let Some(paths) = ctx.document().get("paths").and_then(Value::as_object) else {
        debug!("Document has no paths.");
        return Vec::new();
    };

    let mut extractor = Extractor {
        ctx,
        registry,
        ids: HashSet::new(),
    };
    let mut operations = Vec::new();
    for (path, item) in paths {
        let item: PathItem = match serde_json::from_value(item.clone()) {
            Ok(item) => item,
            Err(err) => {
                warn!(%path, error = %err, "Skipping malformed path item.");
                continue;
            }
        };
        for (method, operation) in item.operations() {
            operations.push(extractor.extract(path, method, operation, &item.parameters));
        }
    }
    debug!(count = operations.len(), "Extracted operations.");
    operations
}

struct Extractor<'a, 'c> {
    ctx: &'a SchemaContext<'c>,
    registry: &'a mut Registry,
    ids: HashSet<String>,
}

/// The non-path parameters folded into one object schema.
#[derive(Debug, Default)]
struct ParamsShape {
    properties: IndexMap<String, SchemaNode>,
    required: Vec<String>,
    url_params: Vec<String>,
    headers: Vec<String>,
    cookies: Vec<String>,
}

impl Extractor<'_, '_> {
    fn extract(
        &mut self,
        path: &str,
        method: HttpMethod,
        operation: &Operation,
        path_parameters: &[MaybeRef<Parameter>],
    ) -> ParsedOperation {
        let operation_id = non_empty_string(operation.operation_id.as_deref());
        let (id, schema_id) = match operation_id {
            Some(operation_id) => (camelize(&operation_id), identifier(&operation_id)),
            None => (
                format!("{}{path}", method.as_str()),
                identifier(&format!("{}{path}", method.key())),
            ),
        };
        let (id, schema_id) = self.unique_ids(id, schema_id);
        let (path_ids, path_template) = process_path(path);

        let shape = self.params_shape(path_parameters, &operation.parameters);
        let params_optional = shape.required.is_empty();
        let params = if shape.properties.is_empty() {
            None
        } else {
            let schema = Schema {
                schema_type: Some(SchemaType::Single("object".to_string())),
                properties: Some(shape.properties),
                required: Some(shape.required),
                ..Schema::default()
            };
            Some(self.registry.add_schema(
                &format!("{schema_id}Params"),
                schema.into(),
                self.ctx,
                true,
            ))
        };

        let payload = self.payload(operation, &schema_id);

        let mut parsed = ParsedOperation {
            id,
            method,
            description: non_empty_string(operation.description.as_deref())
                .or_else(|| non_empty_string(operation.summary.as_deref())),
            path_ids,
            path_template,
            params,
            params_optional,
            url_params: shape.url_params,
            headers: shape.headers,
            cookies: shape.cookies,
            payload,
            success_schemas: IndexMap::new(),
            error_schemas: IndexMap::new(),
            void_statuses: Vec::new(),
        };
        self.responses(operation, &schema_id, &mut parsed);
        parsed
    }

    /// Renames a repeated operation id with a numeric suffix. The schema id gets the same
    /// suffix so the renamed operation's shapes are registered under their own names.
    fn unique_ids(&mut self, id: String, schema_id: String) -> (String, String) {
        if self.ids.insert(id.clone()) {
            return (id, schema_id);
        }
        let mut suffix = 2;
        loop {
            let candidate = format!("{id}{suffix}");
            if self.ids.insert(candidate.clone()) {
                warn!(%id, renamed = %candidate, "Duplicate operation id, renaming.");
                return (candidate, format!("{schema_id}{suffix}"));
            }
            suffix += 1;
        }
    }

    /// Path-level parameters first; an operation-level one with the same name and location
    /// replaces it.
    fn merged_parameters(
        &self,
        path_parameters: &[MaybeRef<Parameter>],
        operation_parameters: &[MaybeRef<Parameter>],
    ) -> Vec<Parameter> {
        let mut merged: Vec<Parameter> = Vec::new();
        for parameter in path_parameters.iter().chain(operation_parameters) {
            let Some(parameter) = parameter.resolve(self.ctx) else {
                continue;
            };
            match merged
                .iter_mut()
                .find(|p| p.name == parameter.name && p.location == parameter.location)
            {
                Some(existing) => *existing = parameter,
                None => merged.push(parameter),
            }
        }
        merged
    }

    fn params_shape(
        &self,
        path_parameters: &[MaybeRef<Parameter>],
        operation_parameters: &[MaybeRef<Parameter>],
    ) -> ParamsShape {
        let mut shape = ParamsShape::default();
        for parameter in self.merged_parameters(path_parameters, operation_parameters) {
            if parameter.location == "path" {
                continue;
            }
            let node = parameter.schema.as_ref().map_or_else(
                || {
                    SchemaNode::from(Schema {
                        schema_type: Some(SchemaType::Single("string".to_string())),
                        ..Schema::default()
                    })
                },
                SchemaNode::from_value,
            );

            let mut fields = Vec::new();
            match self.deep_object(&node) {
                // `name[sub]` fields, one per property of an object parameter.
                Some(object) => {
                    let required = object.required.unwrap_or_default();
                    for (sub, sub_schema) in object.properties.unwrap_or_default() {
                        let field = format!("{}[{sub}]", parameter.name);
                        if required.contains(&sub) {
                            shape.required.push(field.clone());
                        }
                        shape.properties.insert(field.clone(), sub_schema);
                        fields.push(field);
                    }
                }
                None => {
                    if parameter.required {
                        shape.required.push(parameter.name.clone());
                    }
                    shape.properties.insert(parameter.name.clone(), node);
                    fields.push(parameter.name.clone());
                }
            }

            match parameter.location.as_str() {
                "query" => shape.url_params.extend(fields),
                "header" => shape.headers.extend(fields),
                "cookie" => shape.cookies.extend(fields),
                other => {
                    warn!(name = %parameter.name, location = other, "Unknown parameter location, skipping.");
                    for field in fields {
                        shape.properties.shift_remove(&field);
                        shape.required.retain(|r| *r != field);
                    }
                }
            }
        }
        shape
    }

    /// The object schema behind a parameter, following a reference.
    fn deep_object(&self, node: &SchemaNode) -> Option<Schema> {
        let schema = node.to_schema()?;
        let schema = match &schema.ref_path {
            Some(reference) => self.ctx.resolve_schema(reference)?.to_schema()?,
            None => schema,
        };
        schema.properties.is_some().then_some(schema)
    }

    fn payload(&mut self, operation: &Operation, schema_id: &str) -> Option<Payload> {
        let body = operation.request_body.as_ref()?.resolve(self.ctx)?;
        if let Some(schema) = json_schema(&body.content) {
            let name = self.registry.add_schema(
                &format!("{schema_id}Request"),
                SchemaNode::from_value(schema),
                self.ctx,
                false,
            );
            return Some(Payload::Json(name));
        }
        if let Some(media) = body.content.get(MULTIPART_FORM_DATA) {
            let name = media.schema.as_ref().map(|schema| {
                self.registry.add_schema(
                    &format!("{schema_id}RequestFormData"),
                    SchemaNode::from_value(schema),
                    self.ctx,
                    true,
                )
            });
            return Some(Payload::FormData(name));
        }
        debug!(
            schema_id,
            media_types = ?body.content.keys().collect::<Vec<_>>(),
            "No supported request body media type."
        );
        None
    }

    fn responses(&mut self, operation: &Operation, schema_id: &str, parsed: &mut ParsedOperation) {
        let mut default_schema = None;
        let mut default_void = false;
        for (status, response) in &operation.responses {
            let Some(response) = response.resolve(self.ctx) else {
                continue;
            };
            let status_key = status.to_ascii_lowercase();
            let Some(content) = &response.content else {
                if status_key == "default" {
                    default_void = true;
                } else if status_class(&status_key).is_some() {
                    parsed.void_statuses.push(status_key);
                }
                continue;
            };
            let Some(schema) = json_schema(content) else {
                continue;
            };
            let name = self.registry.add_schema(
                &format!("{schema_id}{}", status_suffix(status)),
                SchemaNode::from_value(schema),
                self.ctx,
                true,
            );
            if status_key == "default" {
                default_schema = Some(name);
            } else if is_success_status(&status_key) {
                parsed.success_schemas.insert(status_key, name);
            } else if status_class(&status_key).is_some() {
                parsed.error_schemas.insert(status_key, name);
            }
        }
        let has_success =
            !parsed.success_schemas.is_empty() || parsed.success_voids().next().is_some();
        if has_success {
            return;
        }
        if let Some(name) = default_schema {
            parsed.success_schemas.insert("2xx".to_string(), name);
        } else if default_void {
            parsed.void_statuses.push("2xx".to_string());
        }
    }
}

/// Numeric statuses are used verbatim (`200`, `4XX`); anything else becomes an identifier.
fn status_suffix(status: &str) -> String {
    if status.starts_with(|c: char| c.is_ascii_digit()) {
        status.to_string()
    } else {
        identifier(status)
    }
}

/// Splits a path into its template and the camelized path parameter names.
pub fn process_path(path: &str) -> (Vec<String>, PathTemplate) {
    let mut ids = Vec::new();
    let mut parts = Vec::new();
    let mut rest = path;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}').map(|i| open + i) else {
            break;
        };
        if open > 0 {
            parts.push(UrlPart::Static(rest[..open].to_string()));
        }
        let mut id = camelize(&rest[open + 1..close]);
        if id.is_empty() {
            id = format!("param{}", ids.len());
        }
        parts.push(UrlPart::Param(id.clone()));
        ids.push(id);
        rest = &rest[close + 1..];
    }
    if !rest.is_empty() {
        parts.push(UrlPart::Static(rest.to_string()));
    }
    (ids, PathTemplate(parts))
}
