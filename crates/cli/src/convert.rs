//! Swagger 2.0 to OpenAPI 3.0.3 conversion.
//!
//! Only the parts the generator reads are converted: definitions, parameters, request
//! bodies, responses and servers. Security definitions and examples are dropped.

use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, info};

const METHODS: [&str; 7] = ["get", "put", "post", "delete", "options", "head", "patch"];
const JSON: &str = "application/json";
const MULTIPART: &str = "multipart/form-data";
const URLENCODED: &str = "application/x-www-form-urlencoded";

/// Parameter keywords that move into the parameter's `schema`.
const SCHEMA_FACETS: [&str; 16] = [
    "type",
    "format",
    "items",
    "enum",
    "default",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "minLength",
    "maxLength",
    "pattern",
    "minItems",
    "maxItems",
    "uniqueItems",
    "multipleOf",
];

const REF_PREFIXES: [(&str, &str); 3] = [
    ("#/definitions/", "#/components/schemas/"),
    ("#/parameters/", "#/components/parameters/"),
    ("#/responses/", "#/components/responses/"),
];

/// Structural problems that make a Swagger 2.0 document unconvertible.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConvertError {
    #[error("document is not an object")]
    DocumentNotObject,
    #[error("`paths` is not an object")]
    PathsNotObject,
    #[error("path item {path} is not an object")]
    PathItemNotObject { path: String },
    #[error("operation {method} {path} is not an object")]
    OperationNotObject { path: String, method: String },
    #[error("body parameter of {method} {path} has no schema")]
    BodyWithoutSchema { path: String, method: String },
    #[error("unresolvable parameter reference {reference}")]
    UnresolvedParameter { reference: String },
}

/// `swagger: "2.x"` documents.
pub fn is_v2(document: &Value) -> bool {
    document
        .get("swagger")
        .and_then(Value::as_str)
        .is_some_and(|version| version.starts_with("2."))
}

/// Converts Swagger 2.0 documents; anything else is returned unchanged.
pub fn convert_if_v2(document: Value) -> Result<Value, ConvertError> {
    if !is_v2(&document) {
        return Ok(document);
    }
    info!("Converting Swagger 2.0 document to OpenAPI 3.0.3.");
    convert(document)
}

pub fn convert(document: Value) -> Result<Value, ConvertError> {
    let Value::Object(mut root) = document else {
        return Err(ConvertError::DocumentNotObject);
    };

    let global_parameters = match root.remove("parameters") {
        Some(Value::Object(parameters)) => parameters,
        _ => Map::new(),
    };
    let converter = Converter {
        parameters: &global_parameters,
        consumes: media_types(root.get("consumes")).unwrap_or_else(|| vec![JSON.to_string()]),
        produces: media_types(root.get("produces")).unwrap_or_else(|| vec![JSON.to_string()]),
    };

    let mut out = Map::new();
    out.insert("openapi".into(), json!("3.0.3"));
    out.insert(
        "info".into(),
        root.remove("info")
            .unwrap_or_else(|| json!({ "title": "", "version": "" })),
    );
    if let Some(servers) = servers(&root) {
        out.insert("servers".into(), servers);
    }
    for key in ["tags", "externalDocs"] {
        if let Some(value) = root.remove(key) {
            out.insert(key.into(), value);
        }
    }
    for (key, value) in &root {
        if key.starts_with("x-") {
            out.insert(key.clone(), value.clone());
        }
    }

    let paths = match root.remove("paths") {
        None => Map::new(),
        Some(Value::Object(paths)) => paths,
        Some(_) => return Err(ConvertError::PathsNotObject),
    };
    let mut converted_paths = Map::new();
    for (path, item) in paths {
        let Value::Object(item) = item else {
            return Err(ConvertError::PathItemNotObject { path });
        };
        let item = converter.path_item(&path, item)?;
        converted_paths.insert(path, item);
    }
    out.insert("paths".into(), Value::Object(converted_paths));

    let mut components = Map::new();
    if let Some(definitions) = root.remove("definitions") {
        components.insert("schemas".into(), definitions);
    }
    let parameters: Map<String, Value> = global_parameters
        .iter()
        .filter(|(_, parameter)| !is_body_like(parameter))
        .map(|(name, parameter)| (name.clone(), convert_parameter(parameter.clone())))
        .collect();
    if !parameters.is_empty() {
        components.insert("parameters".into(), Value::Object(parameters));
    }
    if let Some(Value::Object(responses)) = root.remove("responses") {
        let responses = responses
            .into_iter()
            .map(|(name, response)| (name, convert_response(response, &converter.produces)))
            .collect();
        components.insert("responses".into(), Value::Object(responses));
    }
    if !components.is_empty() {
        out.insert("components".into(), Value::Object(components));
    }

    let mut out = Value::Object(out);
    upgrade_schemas(&mut out);
    debug!(
        paths = out["paths"].as_object().map_or(0, Map::len),
        "Converted Swagger 2.0 document."
    );
    Ok(out)
}

struct Converter<'a> {
    /// The document's global `parameters`, before conversion.
    parameters: &'a Map<String, Value>,
    consumes: Vec<String>,
    produces: Vec<String>,
}

impl Converter<'_> {
    fn path_item(&self, path: &str, mut item: Map<String, Value>) -> Result<Value, ConvertError> {
        let shared = match item.remove("parameters") {
            Some(Value::Array(parameters)) => parameters,
            _ => Vec::new(),
        };
        let mut out = Map::new();
        for (key, value) in item {
            if !METHODS.contains(&key.as_str()) {
                out.insert(key, value);
                continue;
            }
            let Value::Object(operation) = value else {
                return Err(ConvertError::OperationNotObject {
                    path: path.to_string(),
                    method: key,
                });
            };
            let operation = self.operation(path, &key, operation, &shared)?;
            out.insert(key, operation);
        }
        Ok(Value::Object(out))
    }

    fn operation(
        &self,
        path: &str,
        method: &str,
        mut operation: Map<String, Value>,
        shared: &[Value],
    ) -> Result<Value, ConvertError> {
        let consumes =
            media_types(operation.remove("consumes").as_ref()).unwrap_or_else(|| self.consumes.clone());
        let produces =
            media_types(operation.remove("produces").as_ref()).unwrap_or_else(|| self.produces.clone());
        operation.remove("schemes");
        let own = match operation.remove("parameters") {
            Some(Value::Array(parameters)) => parameters,
            _ => Vec::new(),
        };

        // Path-level first; an operation-level parameter with the same name and location wins.
        let mut merged: Vec<(Value, Option<String>)> = Vec::new();
        for parameter in shared.iter().chain(&own) {
            let (resolved, reference) = self.resolve(parameter)?;
            let key = parameter_key(&resolved);
            match merged.iter_mut().find(|(p, _)| parameter_key(p) == key) {
                Some(slot) => *slot = (resolved, reference),
                None => merged.push((resolved, reference)),
            }
        }

        let mut parameters = Vec::new();
        let mut body = None;
        let mut form_fields = Vec::new();
        for (parameter, reference) in merged {
            match parameter.get("in").and_then(Value::as_str) {
                Some("body") => body = Some(parameter),
                Some("formData") => form_fields.push(parameter),
                _ => parameters.push(match reference {
                    Some(reference) => json!({ "$ref": reference }),
                    None => convert_parameter(parameter),
                }),
            }
        }
        if !parameters.is_empty() {
            operation.insert("parameters".into(), Value::Array(parameters));
        }
        if let Some(body) = body {
            let Some(request) = body_request(&body, &consumes) else {
                return Err(ConvertError::BodyWithoutSchema {
                    path: path.to_string(),
                    method: method.to_string(),
                });
            };
            operation.insert("requestBody".into(), request);
        } else if !form_fields.is_empty() {
            operation.insert("requestBody".into(), form_request(form_fields, &consumes));
        }

        let responses = match operation.remove("responses") {
            Some(Value::Object(responses)) => responses,
            _ => Map::new(),
        };
        let responses = responses
            .into_iter()
            .map(|(status, response)| (status, convert_response(response, &produces)))
            .collect();
        operation.insert("responses".into(), Value::Object(responses));
        Ok(Value::Object(operation))
    }

    /// The parameter object and, for `#/parameters/` references, the reference.
    fn resolve(&self, parameter: &Value) -> Result<(Value, Option<String>), ConvertError> {
        let Some(reference) = parameter.get("$ref").and_then(Value::as_str) else {
            return Ok((parameter.clone(), None));
        };
        reference
            .strip_prefix("#/parameters/")
            .map(|name| name.replace("~1", "/").replace("~0", "~"))
            .and_then(|name| self.parameters.get(&name))
            .map(|target| (target.clone(), Some(reference.to_string())))
            .ok_or_else(|| ConvertError::UnresolvedParameter {
                reference: reference.to_string(),
            })
    }
}

fn parameter_key(parameter: &Value) -> (Option<&str>, Option<&str>) {
    (
        parameter.get("name").and_then(Value::as_str),
        parameter.get("in").and_then(Value::as_str),
    )
}

fn is_body_like(parameter: &Value) -> bool {
    matches!(
        parameter.get("in").and_then(Value::as_str),
        Some("body" | "formData")
    )
}

/// A non-empty list of media types.
fn media_types(value: Option<&Value>) -> Option<Vec<String>> {
    let types: Vec<String> = value?
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();
    (!types.is_empty()).then_some(types)
}

fn servers(root: &Map<String, Value>) -> Option<Value> {
    let base_path = root.get("basePath").and_then(Value::as_str).unwrap_or("");
    let url = match root.get("host").and_then(Value::as_str) {
        Some(host) => {
            let scheme = root
                .get("schemes")
                .and_then(Value::as_array)
                .and_then(|schemes| schemes.first())
                .and_then(Value::as_str)
                .unwrap_or("https");
            format!("{scheme}://{host}{base_path}")
        }
        None if !base_path.is_empty() => base_path.to_string(),
        None => return None,
    };
    Some(json!([{ "url": url }]))
}

fn take_schema(object: &mut Map<String, Value>) -> Map<String, Value> {
    SCHEMA_FACETS
        .iter()
        .filter_map(|key| object.remove(*key).map(|value| ((*key).to_string(), value)))
        .collect()
}

fn convert_parameter(parameter: Value) -> Value {
    let Value::Object(mut parameter) = parameter else {
        return parameter;
    };
    let schema = take_schema(&mut parameter);
    if !schema.is_empty() {
        parameter.insert("schema".into(), Value::Object(schema));
    }
    if let Some(Value::String(format)) = parameter.remove("collectionFormat") {
        let location = parameter.get("in").and_then(Value::as_str).unwrap_or("query");
        if let Some((style, explode)) = collection_style(&format, location) {
            parameter.insert("style".into(), json!(style));
            parameter.insert("explode".into(), json!(explode));
        }
    }
    Value::Object(parameter)
}

fn collection_style(format: &str, location: &str) -> Option<(&'static str, bool)> {
    match format {
        "multi" => Some(("form", true)),
        "csv" if matches!(location, "query" | "cookie") => Some(("form", false)),
        "csv" => Some(("simple", false)),
        "ssv" => Some(("spaceDelimited", false)),
        "pipes" => Some(("pipeDelimited", false)),
        _ => None,
    }
}

fn body_request(body: &Value, consumes: &[String]) -> Option<Value> {
    let schema = body.get("schema")?;
    let content: Map<String, Value> = consumes
        .iter()
        .map(|media_type| (media_type.clone(), json!({ "schema": schema })))
        .collect();
    let mut request = Map::new();
    if let Some(description) = body.get("description") {
        request.insert("description".into(), description.clone());
    }
    if body.get("required").and_then(Value::as_bool) == Some(true) {
        request.insert("required".into(), json!(true));
    }
    request.insert("content".into(), Value::Object(content));
    Some(Value::Object(request))
}

/// `formData` parameters folded into one object schema.
fn form_request(fields: Vec<Value>, consumes: &[String]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    let mut has_file = false;
    for field in fields {
        let Value::Object(mut field) = field else {
            continue;
        };
        let Some(name) = field.get("name").and_then(Value::as_str).map(str::to_string) else {
            continue;
        };
        if field.get("required").and_then(Value::as_bool) == Some(true) {
            required.push(Value::String(name.clone()));
        }
        let mut schema = take_schema(&mut field);
        has_file |= schema.get("type").and_then(Value::as_str) == Some("file");
        if let Some(description) = field.remove("description") {
            schema.insert("description".into(), description);
        }
        properties.insert(name, Value::Object(schema));
    }

    let accepts = |media_type: &str| consumes.iter().any(|c| c == media_type);
    let media_type = if has_file || accepts(MULTIPART) || !accepts(URLENCODED) {
        MULTIPART
    } else {
        URLENCODED
    };
    let mut schema = json!({ "type": "object", "properties": properties });
    if !required.is_empty() {
        schema["required"] = Value::Array(required);
    }
    json!({ "content": { media_type: { "schema": schema } } })
}

fn convert_response(response: Value, produces: &[String]) -> Value {
    let Value::Object(mut response) = response else {
        return response;
    };
    if response.contains_key("$ref") {
        return Value::Object(response);
    }
    let schema = response.remove("schema");
    response.remove("examples");
    response
        .entry("description")
        .or_insert_with(|| Value::String(String::new()));
    if let Some(Value::Object(headers)) = response.get_mut("headers") {
        for header in headers.values_mut() {
            if let Value::Object(header) = header {
                let schema = take_schema(header);
                if !schema.is_empty() {
                    header.insert("schema".into(), Value::Object(schema));
                }
            }
        }
    }
    if let Some(schema) = schema {
        let content: Map<String, Value> = produces
            .iter()
            .map(|media_type| (media_type.clone(), json!({ "schema": schema })))
            .collect();
        response.insert("content".into(), Value::Object(content));
    }
    Value::Object(response)
}

fn rewrite_ref(reference: &str) -> String {
    for (from, to) in REF_PREFIXES {
        if let Some(rest) = reference.strip_prefix(from) {
            return format!("{to}{rest}");
        }
    }
    reference.to_string()
}

/// Rewrites references and the 2.0-only schema keywords (`x-nullable`, `type: file`).
fn upgrade_schemas(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get_mut("$ref") {
                *reference = rewrite_ref(reference);
            }
            if let Some(nullable @ Value::Bool(_)) = map.get("x-nullable").cloned() {
                map.remove("x-nullable");
                map.insert("nullable".into(), nullable);
            }
            if map.get("type").and_then(Value::as_str) == Some("file") {
                map.insert("type".into(), json!("string"));
                map.insert("format".into(), json!("binary"));
            }
            for child in map.values_mut() {
                upgrade_schemas(child);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(upgrade_schemas),
        _ => {}
    }
}
