use crate::common::CommonType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Model is a fixture for rendering models
///
/// openapi:component schema Model
#[derive(Debug, Serialize, Deserialize)]
pub struct Model {
    #[serde(flatten)]
    pub common: CommonType,
    #[serde(flatten)]
    embedded: EmbeddedPrivate,

    /// Field1 description
    /// schema:example mystring
    /// schema:default def
    #[serde(rename = "field1")]
    pub field1: String,

    /// openapi:format uri
    #[serde(rename = "field2")]
    pub field2: i32,
    #[serde(rename = "timestamp")]
    pub field4: DateTime<Utc>,
    #[serde(rename = "field5")]
    pub field5: Option<Box<RefPrivate>>,
    #[serde(rename = "field6")]
    pub field6: RefExported,
    #[serde(rename = "field7")]
    pub field7: Vec<String>,
    #[serde(rename = "field8")]
    pub field8: HashMap<String, String>,
}

/// EmbeddedPrivate is a struct which will be embedded but not exported
#[derive(Debug, Serialize, Deserialize)]
struct EmbeddedPrivate {
    #[serde(rename = "eField")]
    pub embedded_field: String,
    private_field: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RefPrivate {
    #[serde(rename = "refField")]
    pub ref_field: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefExported {
    pub re: String,
}

/// Problem describes an error response
///
/// openapi:component schema Problem
#[derive(Debug, Serialize, Deserialize)]
pub struct Problem {
    /// URI identifying the problem type
    /// openapi:format uri
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(skip)]
    pub source: Option<String>,
}
