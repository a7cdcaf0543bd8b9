//! Operation emitter: the `make` implementation, the client interface and the error shape.
//!
//! Both back-ends share the layout here and only differ in how they spell types and
//! response decoders ([`OperationSpelling`]).

use crate::operation::{ParsedOperation, Payload};
use crate::ts::{Emit, indent};
use crate::utils::{escape_js_string, quote_key, to_comment};

/// Flavor-specific pieces of the client.
pub(crate) trait OperationSpelling {
    /// Type of the `options` argument when it carries parameters.
    fn params_type(&self, name: &str) -> String;

    /// Type of the request payload.
    fn payload_type(&self, payload: &Payload) -> String;

    /// Decoded type of a response schema.
    fn response_type(&self, name: &str) -> String;

    /// Failures every call can produce besides the declared error responses.
    fn transport_errors(&self) -> &'static str;

    /// `matchStatus` case for a success response.
    fn success_decoder(&self, name: &str) -> String;

    /// `matchStatus` case for an error response tagged `name`.
    fn error_decoder(&self, name: &str) -> String;

    /// Definitions of `decodeSuccess`/`decodeError` inside `make`, failing with
    /// `<client>Error`.
    fn decoder_helpers(&self, client: &str) -> String;
}

const MAKE_PREAMBLE: &str = r#"const unexpectedStatus = (response: HttpClientResponse.HttpClientResponse) =>
  Effect.flatMap(
    Effect.orElseSucceed(response.text, () => "Unexpected status code"),
    (description) =>
      Effect.fail(
        new HttpClientError.ResponseError({
          request: response.request,
          response,
          reason: "StatusCode",
          description,
        }),
      ),
  )
const withResponse =
  <A, E>(f: (response: HttpClientResponse.HttpClientResponse) => Effect.Effect<A, E>) =>
  (request: HttpClientRequest.HttpClientRequest): Effect.Effect<any, any> => {
    const client = options.transformClient
      ? options.transformClient(httpClient)
      : Effect.succeed(httpClient)
    return Effect.flatMap(
      Effect.flatMap(client, (client) => client.execute(request)),
      f,
    )
  }
const setCookies =
  (cookies: Record<string, unknown>) =>
  (request: HttpClientRequest.HttpClientRequest) => {
    const header = Object.entries(cookies)
      .filter(([, value]) => value !== undefined && value !== null)
      .map(([key, value]) => `${key}=${encodeURIComponent(String(value))}`)
      .join("; ")
    return header === "" ? request : HttpClientRequest.setHeader(request, "Cookie", header)
  }
const decodeVoid = (_response: HttpClientResponse.HttpClientResponse) => Effect.void"#;

/// The `export const make = ...` block.
pub(crate) fn render_implementation(
    spelling: &impl OperationSpelling,
    name: &str,
    operations: &[ParsedOperation],
) -> String {
    let mut body = vec![MAKE_PREAMBLE.to_string(), spelling.decoder_helpers(name)];

    let mut members = vec!["httpClient,".to_string()];
    members.extend(
        operations
            .iter()
            .map(|operation| operation_implementation(spelling, operation)),
    );
    body.push(format!("return {{\n{}\n}}", indent(&members.join("\n"), 2)));

    format!(
        "export const make = (\n  httpClient: HttpClient.HttpClient,\n  options: {{\n    readonly transformClient?: ((client: HttpClient.HttpClient) => Effect.Effect<HttpClient.HttpClient>) | undefined\n  }} = {{}},\n): {name} => {{\n{}\n}}",
        indent(&body.join("\n"), 2)
    )
}

fn operation_implementation(spelling: &impl OperationSpelling, operation: &ParsedOperation) -> String {
    let mut args: Vec<String> = operation.path_ids.clone();
    if operation.has_options() {
        args.push("options".to_string());
    }

    let mut steps = request_steps(operation);
    steps.push(format!(
        "withResponse(HttpClientResponse.matchStatus({{\n{}\n}})),",
        indent(&status_cases(spelling, operation).join("\n"), 2)
    ));

    format!(
        "{}: ({}) =>\n  HttpClientRequest.make(\"{}\")({}).pipe(\n{}\n  ),",
        quote_key(&operation.id),
        args.join(", "),
        operation.method.as_str(),
        operation.path_template.emit(),
        indent(&steps.join("\n"), 4)
    )
}

/// Property access on the parameters part of `options`.
fn param_access(operation: &ParsedOperation, field: &str) -> String {
    let key = escape_js_string(field);
    match (&operation.payload, operation.params_optional) {
        (Some(_), true) => format!("options.params?.[\"{key}\"]"),
        (Some(_), false) => format!("options.params[\"{key}\"]"),
        (None, true) => format!("options?.[\"{key}\"]"),
        (None, false) => format!("options[\"{key}\"]"),
    }
}

fn field_record(operation: &ParsedOperation, fields: &[String], suffix: &str) -> String {
    let entries: Vec<String> = fields
        .iter()
        .map(|field| {
            format!(
                "{}: {}{suffix}",
                quote_key(field),
                param_access(operation, field)
            )
        })
        .collect();
    format!("{{ {} }}", entries.join(", "))
}

/// Request pipeline steps before the status match.
pub(crate) fn request_steps(operation: &ParsedOperation) -> Vec<String> {
    let mut steps = Vec::new();
    if !operation.url_params.is_empty() {
        steps.push(format!(
            "HttpClientRequest.setUrlParams({}),",
            field_record(operation, &operation.url_params, " as any")
        ));
    }
    if !operation.headers.is_empty() {
        steps.push(format!(
            "HttpClientRequest.setHeaders({}),",
            field_record(operation, &operation.headers, " ?? undefined")
        ));
    }
    if !operation.cookies.is_empty() {
        steps.push(format!(
            "setCookies({}),",
            field_record(operation, &operation.cookies, "")
        ));
    }
    if let Some(payload) = &operation.payload {
        let value = if operation.params.is_some() {
            "options.payload"
        } else {
            "options"
        };
        steps.push(match payload {
            Payload::Json(_) => format!("HttpClientRequest.bodyUnsafeJson({value}),"),
            Payload::FormData(Some(_)) => {
                format!("HttpClientRequest.bodyFormDataRecord({value} as any),")
            }
            Payload::FormData(None) => format!("HttpClientRequest.bodyFormData({value}),"),
        });
    }
    steps
}

fn status_cases(spelling: &impl OperationSpelling, operation: &ParsedOperation) -> Vec<String> {
    let mut cases = Vec::new();
    for (status, schema) in &operation.success_schemas {
        cases.push(format!("\"{status}\": {},", spelling.success_decoder(schema)));
    }
    for (status, schema) in &operation.error_schemas {
        cases.push(format!("\"{status}\": {},", spelling.error_decoder(schema)));
    }
    // Error statuses without a body fall through to `unexpectedStatus`.
    for status in operation.success_voids() {
        cases.push(format!("\"{status}\": decodeVoid,"));
    }
    if operation.success_schemas.is_empty() && operation.success_voids().next().is_none() {
        cases.push("\"2xx\": decodeVoid,".to_string());
    }
    cases.push("orElse: unexpectedStatus,".to_string());
    cases
}

/// The `export interface <Name>` block.
pub(crate) fn render_interface(
    spelling: &impl OperationSpelling,
    name: &str,
    operations: &[ParsedOperation],
) -> String {
    let mut members = vec!["readonly httpClient: HttpClient.HttpClient".to_string()];
    members.extend(
        operations
            .iter()
            .map(|operation| operation_signature(spelling, name, operation)),
    );
    format!(
        "export interface {name} {{\n{}\n}}",
        indent(&members.join("\n"), 2)
    )
}

pub(crate) fn operation_signature(
    spelling: &impl OperationSpelling,
    client: &str,
    operation: &ParsedOperation,
) -> String {
    let mut args: Vec<String> = operation
        .path_ids
        .iter()
        .map(|id| format!("{id}: string"))
        .collect();
    let options_type = match (&operation.params, &operation.payload) {
        (Some(params), None) => Some(spelling.params_type(params)),
        (None, Some(payload)) => Some(spelling.payload_type(payload)),
        (Some(params), Some(payload)) => Some(format!(
            "{{ readonly params{}: {}; readonly payload: {} }}",
            if operation.params_optional { "?" } else { "" },
            spelling.params_type(params),
            spelling.payload_type(payload)
        )),
        (None, None) => None,
    };
    if let Some(options_type) = options_type {
        if operation.options_optional() {
            args.push(format!("options?: {options_type} | undefined"));
        } else {
            args.push(format!("options: {options_type}"));
        }
    }

    let mut success: Vec<String> = operation
        .success_schemas
        .values()
        .map(|schema| spelling.response_type(schema))
        .collect();
    if success.is_empty() || operation.success_voids().next().is_some() {
        success.push("void".to_string());
    }
    success.dedup();

    let mut errors = vec![spelling.transport_errors().to_string()];
    errors.extend(operation.error_schemas.values().map(|schema| {
        format!(
            "{client}Error<\"{schema}\", {}>",
            spelling.response_type(schema)
        )
    }));

    format!(
        "{}readonly {}: ({}) => Effect.Effect<{}, {}>",
        to_comment(operation.description.as_deref()),
        quote_key(&operation.id),
        args.join(", "),
        success.join(" | "),
        errors.join(" | ")
    )
}

/// `<Name>Error`: the tagged failure carrying a decoded error response.
pub(crate) fn error_shape(name: &str) -> String {
    format!(
        r#"export interface {name}Error<Tag extends string, E> {{
  readonly _tag: Tag
  readonly request: HttpClientRequest.HttpClientRequest
  readonly response: HttpClientResponse.HttpClientResponse
  readonly cause: E
}}

class {name}ErrorImpl extends Data.Error<{{
  _tag: string
  cause: any
  request: HttpClientRequest.HttpClientRequest
  response: HttpClientResponse.HttpClientResponse
}}> {{}}

export const {name}Error = <Tag extends string, E>(
  tag: Tag,
  cause: E,
  response: HttpClientResponse.HttpClientResponse,
): {name}Error<Tag, E> =>
  new {name}ErrorImpl({{
    _tag: tag,
    cause,
    response,
    request: response.request,
  }}) as any"#
    )
}
