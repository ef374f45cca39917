//! Swagger 2.0 document model.
//!
//! Every map is ordered so that two runs over the same declarations
//! serialize byte-for-byte identically.

use crate::directive::HttpMethod;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Specification version written to the `swagger` field
pub const SWAGGER_VERSION: &str = "2.0";

/// Prefix of every schema reference
pub const REF_PREFIX: &str = "#/definitions/";

/// Complete Swagger document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub swagger: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<Info>,
    #[serde(default)]
    pub definitions: BTreeMap<String, Schema>,
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub version: String,
}

/// A schema definition or an inline property schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,
    /// Element schema of an array
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Value schema of a map
    #[serde(rename = "additionalProperties", skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<Schema>>,
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Schema {
    /// An object schema; without properties it accepts any object.
    pub fn object() -> Self {
        Self {
            schema_type: Some("object".to_string()),
            ..Self::default()
        }
    }

    pub fn primitive(schema_type: &str, format: Option<&str>) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            format: format.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn array(items: Schema) -> Self {
        Self {
            schema_type: Some("array".to_string()),
            items: Some(Box::new(items)),
            ..Self::default()
        }
    }

    pub fn map(values: Schema) -> Self {
        Self {
            schema_type: Some("object".to_string()),
            additional_properties: Some(Box::new(values)),
            ..Self::default()
        }
    }

    pub fn reference(id: &str) -> Self {
        Self {
            reference: Some(format!("{}{}", REF_PREFIX, id)),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// True for plain objects whose properties can be spliced into a parent.
    pub fn is_object(&self) -> bool {
        self.schema_type.as_deref() == Some("object")
            && self.additional_properties.is_none()
            && self.reference.is_none()
    }

    /// Component id this schema points at, if it is a reference node.
    pub fn reference_target(&self) -> Option<&str> {
        self.reference.as_deref()?.strip_prefix(REF_PREFIX)
    }
}

/// Operations bound to one path, at most one per method
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
}

impl PathItem {
    fn slot(&mut self, method: HttpMethod) -> &mut Option<Operation> {
        match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Head => &mut self.head,
            HttpMethod::Patch => &mut self.patch,
        }
    }

    /// Binds `operation` to `method`, returning whatever occupied the slot.
    pub fn set(&mut self, method: HttpMethod, operation: Operation) -> Option<Operation> {
        self.slot(method).replace(operation)
    }

    pub fn get_operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
        }
    }

    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        HttpMethod::ALL
            .into_iter()
            .filter_map(move |method| self.get_operation(method))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(rename = "operationId")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub produces: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub responses: BTreeMap<ResponseKey, Response>,
}

impl Operation {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            description: None,
            tags: Vec::new(),
            consumes: Vec::new(),
            produces: Vec::new(),
            parameters: Vec::new(),
            responses: BTreeMap::new(),
        }
    }

    /// Adds `param`, replacing an existing parameter with the same name and location.
    pub fn set_parameter(&mut self, param: Parameter) {
        match self
            .parameters
            .iter_mut()
            .find(|p| p.name == param.name && p.location == param.location)
        {
            Some(existing) => *existing = param,
            None => self.parameters.push(param),
        }
    }

    pub fn add_consumes(&mut self, media_type: &str) {
        if !self.consumes.iter().any(|m| m == media_type) {
            self.consumes.push(media_type.to_string());
        }
    }

    pub fn add_produces(&mut self, media_type: &str) {
        if !self.produces.iter().any(|m| m == media_type) {
            self.produces.push(media_type.to_string());
        }
    }

    /// The response bucket for `key`, created empty on first use.
    pub fn response_mut(&mut self, key: ResponseKey) -> &mut Response {
        self.responses.entry(key).or_default()
    }

    pub fn body_parameter(&self) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|p| p.location == ParameterLocation::Body)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Body,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Only set on body parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

impl Parameter {
    /// A path or query parameter of a primitive type. Path parameters are
    /// always required.
    pub fn typed(
        name: &str,
        location: ParameterLocation,
        param_type: &str,
        format: Option<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            name: name.to_string(),
            location,
            description,
            required: location == ParameterLocation::Path,
            param_type: Some(param_type.to_string()),
            format,
            schema: None,
        }
    }

    /// The request body parameter, always named `body`.
    pub fn body(schema_id: &str, required: bool, description: Option<String>) -> Self {
        Self {
            name: "body".to_string(),
            location: ParameterLocation::Body,
            description,
            required,
            param_type: None,
            format: None,
            schema: Some(Schema::reference(schema_id)),
        }
    }
}

/// Key of a response bucket: `default` or an exact status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResponseKey {
    Default,
    Status(u16),
}

impl ResponseKey {
    pub fn parse(raw: &str) -> Option<Self> {
        if raw == "default" {
            return Some(ResponseKey::Default);
        }
        match raw.parse::<u16>() {
            Ok(code) if (100..=599).contains(&code) => Some(ResponseKey::Status(code)),
            _ => None,
        }
    }
}

impl fmt::Display for ResponseKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResponseKey::Default => f.write_str("default"),
            ResponseKey::Status(code) => write!(f, "{}", code),
        }
    }
}

impl Serialize for ResponseKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResponseKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ResponseKey::parse(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid response key: {}", raw)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Header>,
    /// Example payloads keyed by media type
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub examples: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    #[serde(rename = "type")]
    pub header_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
