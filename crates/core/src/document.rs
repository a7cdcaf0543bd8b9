//! OpenAPI document structs for serde deserialization.
//!
//! Only the parts the extractor reads are modelled. Schemas stay raw JSON here and are
//! parsed into [`SchemaNode`](crate::schema::SchemaNode) one at a time, so a single malformed
//! schema cannot take the whole path item down with it.

use indexmap::IndexMap;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::operation::HttpMethod;
use crate::registry::SchemaContext;

/// Longest `$ref` chain followed before giving up.
const MAX_REF_HOPS: usize = 16;

/// Either an inline object or a reference to one.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MaybeRef<T> {
    Ref {
        #[serde(rename = "$ref")]
        reference: String,
    },
    Item(T),
}

impl<T: DeserializeOwned + Clone> MaybeRef<T> {
    /// The inline object, following references through the document.
    pub fn resolve(&self, ctx: &SchemaContext<'_>) -> Option<T> {
        let mut reference = match self {
            MaybeRef::Item(item) => return Some(item.clone()),
            MaybeRef::Ref { reference } => reference.clone(),
        };
        for _ in 0..MAX_REF_HOPS {
            let Some(value) = ctx.resolve_value(&reference) else {
                warn!(%reference, "Unresolvable reference, skipping.");
                return None;
            };
            match serde_json::from_value::<MaybeRef<T>>(value.clone()) {
                Ok(MaybeRef::Item(item)) => return Some(item),
                Ok(MaybeRef::Ref { reference: next }) => reference = next,
                Err(err) => {
                    warn!(%reference, error = %err, "Malformed referenced object, skipping.");
                    return None;
                }
            }
        }
        warn!(%reference, "Reference chain too long, skipping.");
        None
    }
}

/// A path item containing operations for different HTTP methods.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PathItem {
    pub get: Option<Operation>,
    pub put: Option<Operation>,
    pub post: Option<Operation>,
    pub delete: Option<Operation>,
    pub options: Option<Operation>,
    pub head: Option<Operation>,
    pub patch: Option<Operation>,
    pub trace: Option<Operation>,
    /// Path-level parameters shared by all operations.
    pub parameters: Vec<MaybeRef<Parameter>>,
}

impl PathItem {
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Trace => self.trace.as_ref(),
        }
    }

    /// Operations in method order.
    pub fn operations(&self) -> impl Iterator<Item = (HttpMethod, &Operation)> {
        HttpMethod::ALL
            .into_iter()
            .filter_map(|method| self.operation(method).map(|op| (method, op)))
    }
}

/// An API operation (endpoint).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Operation {
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub parameters: Vec<MaybeRef<Parameter>>,
    pub request_body: Option<MaybeRef<RequestBody>>,
    pub responses: IndexMap<String, MaybeRef<Response>>,
}

/// A parameter (query, header, path or cookie).
#[derive(Debug, Clone, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    #[serde(default)]
    pub required: bool,
    pub schema: Option<Value>,
}

/// A request body definition.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RequestBody {
    pub content: IndexMap<String, MediaType>,
}

/// A response definition. `content` is absent for responses without a body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Response {
    pub description: Option<String>,
    pub content: Option<IndexMap<String, MediaType>>,
}

/// Media type content (e.g., application/json).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MediaType {
    pub schema: Option<Value>,
}

/// `application/json` or any `+json` structured syntax suffix.
pub fn is_json_media_type(media_type: &str) -> bool {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

/// The first JSON media type that carries a schema.
pub fn json_schema(content: &IndexMap<String, MediaType>) -> Option<&Value> {
    content
        .iter()
        .filter(|(media_type, _)| is_json_media_type(media_type))
        .find_map(|(_, media)| media.schema.as_ref())
}
