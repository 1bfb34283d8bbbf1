//! JSON:API envelope codec
//!
//! Request models are written in-process with underscored field names; the
//! API speaks hyphenated attribute names inside a `{"data": {...}}` document.
//! This module owns both directions of that translation and the parsing and
//! classification of response bodies.

use std::collections::BTreeMap;

use serde::de::{DeserializeOwned, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ClientError;

/// Media type sent in `Content-Type` and `Accept`.
pub const JSON_API_MEDIA_TYPE: &str = "application/vnd.api+json";

/// Identifies a resource by type and opaque id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    /// Opaque id assigned by the API
    pub id: String,
    /// Resource type (`projects`, `workspaces`, `runs`, ...)
    #[serde(rename = "type")]
    pub kind: String,
}

impl ResourceRef {
    /// Create a new resource reference.
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
        }
    }
}

/// Navigation links attached to a document, resource or relationship.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Links {
    /// Link to the object itself
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    /// Link to the related resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related: Option<String>,
    /// First page of a collection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
    /// Previous page of a collection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    /// Next page of a collection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    /// Last page of a collection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
}

/// Linkage carried by a relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelationshipData {
    /// To-one relationship
    One(ResourceRef),
    /// To-many relationship
    Many(Vec<ResourceRef>),
}

/// A named reference from one resource to others.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Linkage; `None` when the relationship is empty or not included
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<RelationshipData>,
    /// Relationship links
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

/// A single addressable entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Opaque id assigned by the API
    pub id: String,
    /// Resource type
    #[serde(rename = "type")]
    pub kind: String,
    /// Server-defined attributes, hyphenated keys
    #[serde(default)]
    pub attributes: Map<String, Value>,
    /// Named relationships
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<BTreeMap<String, Relationship>>,
    /// Resource links
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

impl Resource {
    /// Raw attribute value.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// String attribute, `None` when missing or not a string.
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// Boolean attribute, `None` when missing or not a boolean.
    pub fn attribute_bool(&self, key: &str) -> Option<bool> {
        self.attributes.get(key).and_then(Value::as_bool)
    }

    /// The to-one target of a relationship.
    pub fn related(&self, name: &str) -> Option<&ResourceRef> {
        match self.relationships.as_ref()?.get(name)?.data.as_ref()? {
            RelationshipData::One(target) => Some(target),
            RelationshipData::Many(_) => None,
        }
    }

    /// Reference to this resource.
    pub fn to_ref(&self) -> ResourceRef {
        ResourceRef::new(self.kind.clone(), self.id.clone())
    }
}

/// Primary data of an envelope, decided once at parse time.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ResourceData {
    /// No `data` member, or `data: null`
    #[default]
    Absent,
    /// A single resource (get, create, update)
    Single(Box<Resource>),
    /// A collection (list)
    Many(Vec<Resource>),
}

impl ResourceData {
    /// Returns true when there is no primary data.
    pub fn is_absent(&self) -> bool {
        matches!(self, ResourceData::Absent)
    }
}

impl<'de> Deserialize<'de> for ResourceData {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shape {
            Many(Vec<Resource>),
            Single(Box<Resource>),
        }

        Ok(match Option::<Shape>::deserialize(deserializer)? {
            None => ResourceData::Absent,
            Some(Shape::Many(items)) => ResourceData::Many(items),
            Some(Shape::Single(resource)) => ResourceData::Single(resource),
        })
    }
}

impl Serialize for ResourceData {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ResourceData::Absent => serializer.serialize_none(),
            ResourceData::Single(resource) => resource.serialize(serializer),
            ResourceData::Many(items) => items.serialize(serializer),
        }
    }
}

/// Pagination block inside `meta`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Pagination {
    /// Current page number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u64>,
    /// Previous page number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_page: Option<u64>,
    /// Next page number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page: Option<u64>,
    /// Total number of pages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u64>,
    /// Total number of items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

/// Non-standard meta information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    /// Pagination cursors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    /// Everything else the server put in `meta`
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A JSON:API error object. Every member is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Occurrence id
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// HTTP status, as sent (string or number)
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Application-specific code
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short summary
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Occurrence-specific explanation
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Pointer to the offending request member
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
}

/// Top-level response document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Primary data
    #[serde(default, skip_serializing_if = "ResourceData::is_absent")]
    pub data: ResourceData,
    /// Related resources included by request
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<Resource>,
    /// Error entries
    #[serde(default, deserialize_with = "lenient_errors", skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ApiError>,
    /// Document links
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    /// Meta information
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl Envelope {
    /// The primary resource of a single-resource response.
    pub fn single(&self) -> Option<&Resource> {
        match &self.data {
            ResourceData::Single(resource) => Some(&**resource),
            _ => None,
        }
    }

    /// Primary resources as a slice; a single resource yields one element.
    pub fn resources(&self) -> &[Resource] {
        match &self.data {
            ResourceData::Absent => &[],
            ResourceData::Single(resource) => std::slice::from_ref(&**resource),
            ResourceData::Many(items) => items,
        }
    }
}

/// Accept strings, numbers and booleans as text; anything else reads as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Keep only the entries of `errors` that look like error objects.
fn lenient_errors<'de, D>(deserializer: D) -> Result<Vec<ApiError>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(entries)) => entries,
        _ => return Ok(Vec::new()),
    };
    Ok(entries
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect())
}

/// Parse and classify a response.
///
/// An empty body reads as an empty envelope (action endpoints answer `202`
/// with no content). Any other body that is not an envelope is
/// [`ClientError::InvalidResponse`]. A parsed body with status >= 400 is
/// always [`ClientError::Api`], whatever its `errors` member holds.
pub fn parse_response(status: u16, body: &str) -> Result<Envelope, ClientError> {
    let envelope = if body.trim().is_empty() {
        Envelope::default()
    } else {
        serde_json::from_str::<Envelope>(body).map_err(|e| ClientError::InvalidResponse {
            status: Some(status),
            message: e.to_string(),
        })?
    };

    if status >= 400 {
        return Err(ClientError::api(status, envelope.errors));
    }
    Ok(envelope)
}

/// Serialize a request model into hyphenated wire attributes.
///
/// Unset fields are expected to be skipped by the model's serializer.
pub fn to_wire_attributes<T: Serialize>(model: &T) -> Result<Map<String, Value>, ClientError> {
    match serde_json::to_value(model)? {
        Value::Object(fields) => Ok(fields
            .into_iter()
            .map(|(key, value)| (key.replace('_', "-"), value))
            .collect()),
        other => Err(ClientError::validation(format!(
            "request model must serialize to an object, got {}",
            other
        ))),
    }
}

/// Deserialize hyphenated wire attributes back into an in-process model.
pub fn from_wire_attributes<T: DeserializeOwned>(
    attributes: Map<String, Value>,
) -> Result<T, ClientError> {
    let fields: Map<String, Value> = attributes
        .into_iter()
        .map(|(key, value)| (key.replace('-', "_"), value))
        .collect();
    Ok(serde_json::from_value(Value::Object(fields))?)
}

/// Builder for a single-resource request document.
#[derive(Debug, Clone)]
pub struct ResourceDocument {
    kind: String,
    attributes: Map<String, Value>,
    relationships: BTreeMap<String, ResourceRef>,
}

impl ResourceDocument {
    /// Start a document of the given resource type from a request model.
    pub fn new<T: Serialize>(kind: impl Into<String>, model: &T) -> Result<Self, ClientError> {
        Ok(Self {
            kind: kind.into(),
            attributes: to_wire_attributes(model)?,
            relationships: BTreeMap::new(),
        })
    }

    /// Move an id attribute into a relationship.
    ///
    /// When `attribute` holds a string id it is removed from the attributes
    /// and emitted as `relationships.<relation>.data = {type, id}`. A missing
    /// attribute leaves the document unchanged.
    pub fn relate_attribute(mut self, attribute: &str, relation: &str, kind: &str) -> Self {
        if let Some(Value::String(id)) = self.attributes.remove(attribute) {
            self.relationships
                .insert(relation.to_string(), ResourceRef::new(kind, id));
        }
        self
    }

    /// The attributes that will be sent.
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Render the `{"data": {...}}` document.
    pub fn into_json(self) -> Value {
        let mut data = Map::new();
        data.insert("type".into(), Value::String(self.kind));
        data.insert("attributes".into(), Value::Object(self.attributes));
        if !self.relationships.is_empty() {
            let relationships = self
                .relationships
                .into_iter()
                .map(|(name, target)| (name, serde_json::json!({ "data": target })))
                .collect();
            data.insert("relationships".into(), Value::Object(relationships));
        }
        serde_json::json!({ "data": Value::Object(data) })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        auto_apply: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        project_id: Option<String>,
    }

    #[test]
    fn test_parse_single_resource() {
        let body = r#"{"data": {"id": "prj-1", "type": "projects", "attributes": {"name": "infra"}}}"#;
        let envelope = parse_response(200, body).unwrap();

        let resource = envelope.single().unwrap();
        assert_eq!(resource.id, "prj-1");
        assert_eq!(resource.kind, "projects");
        assert_eq!(resource.attribute_str("name"), Some("infra"));
        assert_eq!(envelope.resources().len(), 1);
    }

    #[test]
    fn test_parse_collection_with_meta() {
        let body = json!({
            "data": [
                {"id": "ws-1", "type": "workspaces", "attributes": {"name": "a", "locked": true}},
                {"id": "ws-2", "type": "workspaces", "attributes": {"name": "b"}}
            ],
            "meta": {"pagination": {"current-page": 1, "total-count": 2}, "status-counts": {}}
        })
        .to_string();
        let envelope = parse_response(200, &body).unwrap();

        assert!(matches!(envelope.data, ResourceData::Many(ref items) if items.len() == 2));
        assert!(envelope.single().is_none());
        assert_eq!(envelope.resources()[0].attribute_bool("locked"), Some(true));
        let meta = envelope.meta.unwrap();
        assert_eq!(meta.pagination.unwrap().total_count, Some(2));
        assert!(meta.extra.contains_key("status-counts"));
    }

    #[test]
    fn test_parse_relationships() {
        let body = json!({
            "data": {
                "id": "run-1",
                "type": "runs",
                "attributes": {"status": "planned"},
                "relationships": {
                    "workspace": {"data": {"id": "ws-1", "type": "workspaces"}},
                    "configuration-version": {"data": null},
                    "tags": {"data": [{"id": "t-1", "type": "tags"}]}
                }
            }
        })
        .to_string();
        let envelope = parse_response(201, &body).unwrap();
        let run = envelope.single().unwrap();

        assert_eq!(run.related("workspace"), Some(&ResourceRef::new("workspaces", "ws-1")));
        assert_eq!(run.related("configuration-version"), None);
        assert_eq!(run.related("tags"), None);
    }

    #[test]
    fn test_empty_body_is_empty_envelope() {
        let envelope = parse_response(202, "").unwrap();
        assert!(envelope.data.is_absent());
        assert!(envelope.resources().is_empty());
    }

    #[test]
    fn test_unparsable_success_body_is_invalid_response() {
        let err = parse_response(200, "<html>oops</html>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
        assert_eq!(err.status(), Some(200));
    }

    #[test]
    fn test_non_envelope_json_is_invalid_response() {
        let err = parse_response(200, r#"{"data": 42}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);

        let err = parse_response(200, "[1, 2, 3]").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
    }

    #[test]
    fn test_error_status_with_entries() {
        let body = r#"{"errors":[{"title":"Bad Request","detail":"Invalid parameter"}]}"#;
        let err = parse_response(400, body).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().contains("Bad Request: Invalid parameter"));
    }

    #[test]
    fn test_error_status_with_malformed_errors_member() {
        let err = parse_response(404, r#"{"errors": "not found"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Api);
        assert!(err.errors().is_empty());

        let err = parse_response(422, r#"{"errors": ["text", {"status": 422, "title": "Invalid"}]}"#)
            .unwrap_err();
        assert_eq!(err.errors().len(), 1);
        assert_eq!(err.errors()[0].status.as_deref(), Some("422"));
        assert_eq!(err.to_string(), "API request failed with status 422");
    }

    #[test]
    fn test_error_status_without_body() {
        let err = parse_response(401, "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn test_wire_attribute_translation() {
        let model = Sample {
            name: "w1".into(),
            auto_apply: Some(false),
            project_id: None,
        };
        let attributes = to_wire_attributes(&model).unwrap();

        assert_eq!(attributes.get("name"), Some(&json!("w1")));
        assert_eq!(attributes.get("auto-apply"), Some(&json!(false)));
        assert!(!attributes.contains_key("project-id"));

        let back: Sample = from_wire_attributes(attributes).unwrap();
        assert_eq!(back, model);
    }

    #[test]
    fn test_document_moves_id_into_relationship() {
        let model = Sample {
            name: "w1".into(),
            auto_apply: None,
            project_id: Some("prj-9".into()),
        };
        let doc = ResourceDocument::new("workspaces", &model)
            .unwrap()
            .relate_attribute("project-id", "project", "projects")
            .into_json();

        assert_eq!(doc["data"]["type"], "workspaces");
        assert_eq!(doc["data"]["attributes"], json!({"name": "w1"}));
        assert_eq!(
            doc["data"]["relationships"]["project"]["data"],
            json!({"type": "projects", "id": "prj-9"})
        );
    }

    #[test]
    fn test_document_without_relationship() {
        let model = Sample {
            name: "w1".into(),
            auto_apply: Some(true),
            project_id: None,
        };
        let doc = ResourceDocument::new("workspaces", &model)
            .unwrap()
            .relate_attribute("project-id", "project", "projects")
            .into_json();

        assert!(doc["data"].get("relationships").is_none());
        assert_eq!(doc["data"]["attributes"]["auto-apply"], true);
    }

    #[test]
    fn test_envelope_serializes_without_empty_members() {
        let envelope = parse_response(200, r#"{"data": {"id": "x", "type": "runs"}}"#).unwrap();
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value, json!({"data": {"id": "x", "type": "runs", "attributes": {}}}));
    }
}
