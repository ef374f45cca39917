//! Package api exposes the entity service
//!
//! Entities are stored documents addressed by id.
//!
//! openapi:info 1.0.0

use crate::model::Model;

/// ListOperation lists the entities
///
/// openapi:operation /entities GET
/// openapi:tag tag1
/// openapi:tag tag2
pub async fn list_operation() -> Vec<Model> {
    Vec::new()
}

/// GetOperation gets a specific entity
///
/// openapi:operation /entities/{id} GET
/// openapi:parameter id path string "the id of the entity"
/// openapi:response default "this is a description"
/// openapi:responseContent default application/json Model
/// openapi:responseHeader default My-Custom-Header string "this header will tell you..."
/// openapi:responseHeader default My-Other-Custom-Header string/date-time "this header will tell you..."
/// openapi:responseExample default application/ld+json examples/get_operation_default.json
/// openapi:response 400 "client did something wrong"
/// openapi:responseContent 400 application/problem+json Problem
/// openapi:responseExample 400 application/problem+json examples/get_operation_error.json
/// openapi:response 404 "something was not found"
/// openapi:responseContent 404 application/problem+json Problem
pub async fn get_operation(id: String) -> Option<Model> {
    let _ = id;
    None
}

/// ReplaceOperation will replace (or create) a specific entity
///
/// openapi:operation /entities/{id} PUT
/// openapi:parameter id path string "the id of the entity"
/// openapi:requestBody application/json Model "The data to replace the current entity - if any"
pub async fn replace_operation(id: String, model: Model) {
    let _ = (id, model);
}

/// NotApiOperation this is not an operation to be documented
pub fn not_api_operation() {}

pub fn not_documented() {}
