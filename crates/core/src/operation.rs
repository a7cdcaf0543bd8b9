//! Intermediate representation of one API operation.
//!
//! The extractor builds these from `paths`; the client back-ends render them. Every schema
//! an operation mentions is referred to by its registered name.

use indexmap::IndexMap;

use crate::ts::Emit;

/// HTTP methods, in the order path items are walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Patch,
        HttpMethod::Trace,
    ];

    /// Upper-case method name as sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Lower-case key used in a path item.
    pub fn key(self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
            HttpMethod::Trace => "trace",
        }
    }
}

/// URL path segment: static text or a parameter placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlPart {
    Static(String),
    /// Camelized parameter name, also used as the argument name.
    Param(String),
}

/// A path as a template literal, e.g. `` `/pets/${petId}` ``.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate(pub Vec<UrlPart>);

impl Emit for PathTemplate {
    fn emit(&self) -> String {
        let mut out = String::from("`");
        for part in &self.0 {
            match part {
                UrlPart::Static(text) => {
                    out.push_str(&text.replace('\\', "\\\\").replace('`', "\\`").replace("${", "\\${"));
                }
                UrlPart::Param(name) => {
                    out.push_str("${");
                    out.push_str(name);
                    out.push('}');
                }
            }
        }
        out.push('`');
        out
    }
}

/// Request body of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// JSON body described by a registered schema.
    Json(String),
    /// Multipart body; named when the form fields are described by a schema.
    FormData(Option<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOperation {
    /// Method name on the generated client.
    pub id: String,
    pub method: HttpMethod,
    pub description: Option<String>,
    /// Path parameters, in template order.
    pub path_ids: Vec<String>,
    pub path_template: PathTemplate,
    /// Registered name of the non-path parameters shape.
    pub params: Option<String>,
    /// No parameter in the shape is required.
    pub params_optional: bool,
    pub url_params: Vec<String>,
    pub headers: Vec<String>,
    pub cookies: Vec<String>,
    pub payload: Option<Payload>,
    /// Status (lower-cased) to registered response schema name.
    pub success_schemas: IndexMap<String, String>,
    pub error_schemas: IndexMap<String, String>,
    /// Statuses whose response has no content.
    pub void_statuses: Vec<String>,
}

impl ParsedOperation {
    /// The callable takes an `options` argument.
    pub fn has_options(&self) -> bool {
        self.params.is_some() || self.payload.is_some()
    }

    /// `options` may be left out entirely.
    pub fn options_optional(&self) -> bool {
        self.payload.is_none() && self.params_optional
    }

    /// Void statuses that count as success.
    pub fn success_voids(&self) -> impl Iterator<Item = &str> {
        self.void_statuses
            .iter()
            .map(String::as_str)
            .filter(|status| is_success_status(status))
    }
}

/// Status class from the first character: `2xx` is 2, `404` is 4.
pub fn status_class(status: &str) -> Option<u32> {
    status.chars().next().and_then(|c| c.to_digit(10))
}

/// Statuses below 400 are success; anything else is an error.
pub fn is_success_status(status: &str) -> bool {
    status_class(status).is_some_and(|class| class < 4)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(is_success_status("200"));
        assert!(is_success_status("2xx"));
        assert!(is_success_status("304"));
        assert!(!is_success_status("404"));
        assert!(!is_success_status("5XX"));
        assert!(!is_success_status("default"));
        assert_eq!(status_class("default"), None);
    }

    #[test]
    fn test_path_template_emit() {
        let template = PathTemplate(vec![
            UrlPart::Static("/pets/".into()),
            UrlPart::Param("petId".into()),
            UrlPart::Static("/photos".into()),
        ]);
        assert_eq!(template.emit(), "`/pets/${petId}/photos`");
        assert_eq!(PathTemplate(vec![]).emit(), "``");
    }

    #[test]
    fn test_method_order_and_names() {
        let keys: Vec<_> = HttpMethod::ALL.iter().map(|m| m.key()).collect();
        assert_eq!(
            keys,
            vec!["get", "put", "post", "delete", "options", "head", "patch", "trace"]
        );
        assert_eq!(HttpMethod::Patch.as_str(), "PATCH");
    }
}
