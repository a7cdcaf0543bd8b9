//! Effect Schema back-end: every schema is a runtime value that decodes and validates.

use serde_json::Value;

use super::{
    ArrayFacets, Bound, ClientBackend, NumberFacets, Property, SchemaBackend, StringFacets,
    TopLevel,
};
use crate::client::{OperationSpelling, error_shape, render_implementation, render_interface};
use crate::operation::{ParsedOperation, Payload};
use crate::ts::{Emit, TsImport, indent};
use crate::utils::{json_literal, quote_key, to_comment};

#[derive(Debug, Clone, Copy, Default)]
pub struct EffectSchemaBackend;

/// Wraps a property per its optional/nullable/default annotations.
///
/// Optional properties always accept `null` when decoding.
fn annotate(source: String, is_optional: bool, is_nullable: bool, default: Option<&Value>) -> String {
    let default_literal = default.filter(|value| !value.is_null()).map(json_literal);
    if is_nullable && matches!(default, Some(Value::Null)) {
        return format!("S.optionalWith(S.NullOr({source}), {{ default: () => null }})");
    }
    if is_optional {
        return match default_literal {
            Some(literal) => format!(
                "S.optionalWith({source}, {{ nullable: true, default: () => {literal} as const }})"
            ),
            None => format!("S.optionalWith({source}, {{ nullable: true }})"),
        };
    }
    if is_nullable {
        return format!("S.NullOr({source})");
    }
    match default_literal {
        Some(literal) => format!(
            "{source}.pipe(S.propertySignature, S.withConstructorDefault(() => {literal} as const))"
        ),
        None => source,
    }
}

fn with_pipes(base: &str, pipes: &[String]) -> String {
    if pipes.is_empty() {
        base.to_string()
    } else {
        format!("{base}.pipe({})", pipes.join(", "))
    }
}

impl SchemaBackend for EffectSchemaBackend {
    fn on_top_level(&self, decl: TopLevel<'_>) -> String {
        let comment = to_comment(decl.description);
        let name = decl.name;
        if decl.is_object && decl.is_class {
            format!(
                "{comment}export class {name} extends S.Class<{name}>(\"{name}\")({}) {{}}",
                decl.source
            )
        } else {
            format!("{comment}export class {name} extends {} {{}}", decl.source)
        }
    }

    fn property_source(&self, property: Property<'_>) -> String {
        format!(
            "{}{}: {}",
            to_comment(property.description),
            quote_key(property.key),
            annotate(
                property.source,
                property.is_optional,
                property.is_nullable,
                property.default
            )
        )
    }

    fn on_properties(&self, properties: &[String], bare: bool) -> String {
        let body = if properties.is_empty() {
            "{}".to_string()
        } else {
            format!("{{\n{}\n}}", indent(&properties.join(",\n"), 2))
        };
        if bare {
            body
        } else {
            format!("S.Struct({body})")
        }
    }

    fn on_record(&self, values: Option<String>) -> String {
        format!(
            "S.Record({{ key: S.String, value: {} }})",
            values.unwrap_or_else(|| self.on_unknown())
        )
    }

    fn on_enum(&self, literals: &[String]) -> String {
        format!("S.Literal({})", literals.join(", "))
    }

    fn on_ref(&self, name: &str) -> String {
        name.to_string()
    }

    fn on_union(&self, members: &[String]) -> String {
        format!("S.Union({})", members.join(", "))
    }

    fn on_string(&self, facets: &StringFacets<'_>) -> String {
        if facets.binary {
            return "S.instanceOf(globalThis.Blob)".to_string();
        }
        let mut pipes = Vec::new();
        if let Some(min) = facets.min_length {
            pipes.push(format!("S.minLength({min})"));
        }
        if let Some(max) = facets.max_length {
            pipes.push(format!("S.maxLength({max})"));
        }
        if let Some(pattern) = facets.pattern {
            pipes.push(format!(
                "S.pattern(new RegExp({}))",
                json_literal(&Value::String(pattern.to_string()))
            ));
        }
        with_pipes("S.String", &pipes)
    }

    fn on_number(&self, facets: &NumberFacets) -> String {
        let base = if facets.integer { "S.Int" } else { "S.Number" };
        let mut pipes = Vec::new();
        if let Some(Bound { value, exclusive }) = &facets.minimum {
            let check = if *exclusive {
                "greaterThan"
            } else {
                "greaterThanOrEqualTo"
            };
            pipes.push(format!("S.{check}({value})"));
        }
        if let Some(Bound { value, exclusive }) = &facets.maximum {
            let check = if *exclusive {
                "lessThan"
            } else {
                "lessThanOrEqualTo"
            };
            pipes.push(format!("S.{check}({value})"));
        }
        with_pipes(base, &pipes)
    }

    fn on_boolean(&self) -> String {
        "S.Boolean".to_string()
    }

    fn on_array(&self, array: ArrayFacets) -> String {
        let base = if array.non_empty {
            format!("S.NonEmptyArray({})", array.item)
        } else {
            format!("S.Array({})", array.item)
        };
        let pipes: Vec<String> = array
            .max_items
            .map(|max| format!("S.maxItems({max})"))
            .into_iter()
            .collect();
        with_pipes(&base, &pipes)
    }

    fn on_null(&self) -> String {
        "S.Null".to_string()
    }

    fn on_unknown(&self) -> String {
        "S.Unknown".to_string()
    }

    fn on_never(&self) -> String {
        "S.Never".to_string()
    }
}

impl OperationSpelling for EffectSchemaBackend {
    fn params_type(&self, name: &str) -> String {
        format!("typeof {name}.Encoded")
    }

    fn payload_type(&self, payload: &Payload) -> String {
        match payload {
            Payload::Json(name) | Payload::FormData(Some(name)) => format!("typeof {name}.Encoded"),
            Payload::FormData(None) => "globalThis.FormData".to_string(),
        }
    }

    fn response_type(&self, name: &str) -> String {
        format!("typeof {name}.Type")
    }

    fn transport_errors(&self) -> &'static str {
        "HttpClientError.HttpClientError | ParseError"
    }

    fn success_decoder(&self, name: &str) -> String {
        format!("decodeSuccess({name})")
    }

    fn error_decoder(&self, name: &str) -> String {
        format!("decodeError(\"{name}\", {name})")
    }

    fn decoder_helpers(&self, client: &str) -> String {
        format!(
            r#"const decodeSuccess =
  <A, I, R>(schema: S.Schema<A, I, R>) =>
  (response: HttpClientResponse.HttpClientResponse) =>
    HttpClientResponse.schemaBodyJson(schema)(response)
const decodeError =
  <const Tag extends string, A, I, R>(tag: Tag, schema: S.Schema<A, I, R>) =>
  (response: HttpClientResponse.HttpClientResponse) =>
    Effect.flatMap(HttpClientResponse.schemaBodyJson(schema)(response), (cause) =>
      Effect.fail({client}Error(tag, cause, response)),
    )"#
        )
    }
}

impl ClientBackend for EffectSchemaBackend {
    fn imports(&self) -> String {
        let imports = vec![
            TsImport::namespace("HttpClient", "@effect/platform/HttpClient").type_only(),
            TsImport::namespace("HttpClientError", "@effect/platform/HttpClientError"),
            TsImport::namespace("HttpClientRequest", "@effect/platform/HttpClientRequest"),
            TsImport::namespace("HttpClientResponse", "@effect/platform/HttpClientResponse"),
            TsImport::namespace("Data", "effect/Data"),
            TsImport::namespace("Effect", "effect/Effect"),
            TsImport::named(&["ParseError"], "effect/ParseResult").type_only(),
            TsImport::namespace("S", "effect/Schema"),
        ];
        imports.as_slice().emit()
    }

    fn to_implementation(&self, name: &str, operations: &[ParsedOperation]) -> String {
        render_implementation(self, name, operations)
    }

    fn to_types(&self, name: &str, operations: &[ParsedOperation]) -> String {
        format!(
            "{}\n\n{}",
            render_interface(self, name, operations),
            error_shape(name)
        )
    }
}
