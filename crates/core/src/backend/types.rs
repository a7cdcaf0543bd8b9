//! Type-only back-end: plain TypeScript declarations, responses are not validated.

use super::{
    ArrayFacets, ClientBackend, NumberFacets, Property, SchemaBackend, StringFacets, TopLevel,
};
use crate::client::{OperationSpelling, error_shape, render_implementation, render_interface};
use crate::operation::{ParsedOperation, Payload};
use crate::ts::{Emit, TsImport, indent};
use crate::utils::{quote_key, to_comment};

#[derive(Debug, Clone, Copy, Default)]
pub struct TypeOnlyBackend;

impl SchemaBackend for TypeOnlyBackend {
    fn on_top_level(&self, decl: TopLevel<'_>) -> String {
        let comment = to_comment(decl.description);
        if decl.is_object {
            format!("{comment}export interface {} {}", decl.name, decl.source)
        } else {
            format!("{comment}export type {} = {}", decl.name, decl.source)
        }
    }

    fn property_source(&self, property: Property<'_>) -> String {
        let mut type_source = property.source;
        if property.is_nullable {
            type_source.push_str(" | null");
        }
        if property.is_optional {
            type_source.push_str(" | undefined");
        }
        format!(
            "{}readonly {}{}: {type_source}",
            to_comment(property.description),
            quote_key(property.key),
            if property.is_optional { "?" } else { "" },
        )
    }

    fn on_properties(&self, properties: &[String], _bare: bool) -> String {
        if properties.is_empty() {
            return "{}".to_string();
        }
        format!("{{\n{}\n}}", indent(&properties.join("\n"), 2))
    }

    fn on_record(&self, values: Option<String>) -> String {
        format!(
            "Record<string, {}>",
            values.unwrap_or_else(|| self.on_unknown())
        )
    }

    fn on_enum(&self, literals: &[String]) -> String {
        literals.join(" | ")
    }

    fn on_ref(&self, name: &str) -> String {
        name.to_string()
    }

    fn on_union(&self, members: &[String]) -> String {
        members.join(" | ")
    }

    fn on_string(&self, facets: &StringFacets<'_>) -> String {
        if facets.binary {
            "Blob".to_string()
        } else {
            "string".to_string()
        }
    }

    fn on_number(&self, _facets: &NumberFacets) -> String {
        "number".to_string()
    }

    fn on_boolean(&self) -> String {
        "boolean".to_string()
    }

    // Type arguments and tuple elements already delimit the item, unions included.
    fn on_array(&self, array: ArrayFacets) -> String {
        let item = array.item;
        if array.non_empty {
            format!("readonly [{item}, ...Array<{item}>]")
        } else {
            format!("ReadonlyArray<{item}>")
        }
    }

    fn on_null(&self) -> String {
        "null".to_string()
    }

    fn on_unknown(&self) -> String {
        "unknown".to_string()
    }

    fn on_never(&self) -> String {
        "never".to_string()
    }
}

impl OperationSpelling for TypeOnlyBackend {
    fn params_type(&self, name: &str) -> String {
        name.to_string()
    }

    fn payload_type(&self, payload: &Payload) -> String {
        match payload {
            Payload::Json(name) | Payload::FormData(Some(name)) => name.clone(),
            Payload::FormData(None) => "globalThis.FormData".to_string(),
        }
    }

    fn response_type(&self, name: &str) -> String {
        name.to_string()
    }

    fn transport_errors(&self) -> &'static str {
        "HttpClientError.HttpClientError"
    }

    fn success_decoder(&self, _name: &str) -> String {
        "decodeSuccess".to_string()
    }

    fn error_decoder(&self, name: &str) -> String {
        format!("decodeError(\"{name}\")")
    }

    fn decoder_helpers(&self, client: &str) -> String {
        format!(
            r#"const decodeSuccess = (response: HttpClientResponse.HttpClientResponse) =>
  response.json as Effect.Effect<any, HttpClientError.ResponseError>
const decodeError =
  <const Tag extends string>(tag: Tag) =>
  (response: HttpClientResponse.HttpClientResponse) =>
    Effect.flatMap(response.json, (cause) => Effect.fail({client}Error(tag, cause, response)))"#
        )
    }
}

impl ClientBackend for TypeOnlyBackend {
    fn imports(&self) -> String {
        let imports = vec![
            TsImport::namespace("HttpClient", "@effect/platform/HttpClient").type_only(),
            TsImport::namespace("HttpClientError", "@effect/platform/HttpClientError"),
            TsImport::namespace("HttpClientRequest", "@effect/platform/HttpClientRequest"),
            TsImport::namespace("HttpClientResponse", "@effect/platform/HttpClientResponse"),
            TsImport::namespace("Data", "effect/Data"),
            TsImport::namespace("Effect", "effect/Effect"),
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

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_property_annotations() {
        let backend = TypeOnlyBackend;
        let property = |is_optional, is_nullable| {
            backend.property_source(Property {
                key: "name",
                source: "string".into(),
                description: None,
                is_optional,
                is_nullable,
                default: None,
            })
        };
        assert_eq!(property(false, false), "readonly \"name\": string");
        assert_eq!(property(false, true), "readonly \"name\": string | null");
        assert_eq!(property(true, false), "readonly \"name\"?: string | undefined");
        assert_eq!(
            property(true, true),
            "readonly \"name\"?: string | null | undefined"
        );
    }

    #[test]
    fn test_arrays() {
        let backend = TypeOnlyBackend;
        let array = |item: &str, non_empty| {
            backend.on_array(ArrayFacets {
                item: item.into(),
                non_empty,
                max_items: None,
            })
        };
        assert_eq!(array("string", false), "ReadonlyArray<string>");
        assert_eq!(array("string", true), "readonly [string, ...Array<string>]");
        assert_eq!(array("\"a\" | \"b\"", false), "ReadonlyArray<\"a\" | \"b\">");
        assert_eq!(
            array("string | null", true),
            "readonly [string | null, ...Array<string | null>]"
        );
        assert_eq!(
            array("Record<string, unknown>", false),
            "ReadonlyArray<Record<string, unknown>>"
        );
    }

    #[test]
    fn test_top_level() {
        let backend = TypeOnlyBackend;
        let interface = backend.on_top_level(TopLevel {
            name: "Pet",
            source: backend.on_properties(&["readonly \"id\": string".into()], true),
            description: None,
            is_class: true,
            is_enum: false,
            is_object: true,
        });
        assert_eq!(interface, "export interface Pet {\n  readonly \"id\": string\n}");
        let alias = backend.on_top_level(TopLevel {
            name: "Status",
            source: backend.on_enum(&["\"a\"".into(), "\"b\"".into()]),
            description: Some("Status"),
            is_class: false,
            is_enum: true,
            is_object: false,
        });
        assert_eq!(alias, "/**\n* Status\n*/\nexport type Status = \"a\" | \"b\"");
    }

    #[test]
    fn test_imports_skip_schema_module() {
        let imports = TypeOnlyBackend.imports();
        assert!(!imports.contains("effect/Schema"));
        assert!(imports.contains("import * as Effect from \"effect/Effect\""));
    }
}
