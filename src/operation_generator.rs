use crate::declaration::{DeclarationGraph, FunctionDecl, SourceFile};
use crate::directive::{parse_operation_binding, parse_operation_directive, OperationDirective};
use crate::document::{Header, Operation, Parameter, PathItem, Schema};
use log::{debug, warn};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Builds operations from `openapi:operation` functions
///
/// Each `openapi:operation <path> <method>` line on a function binds one
/// operation. The remaining directives of the same doc block are applied
/// to it in the order they are written.
#[derive(Debug, Default)]
pub struct OperationGenerator {
    paths: BTreeMap<String, PathItem>,
}

impl OperationGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate_all(&mut self, graph: &DeclarationGraph) {
        for file in &graph.files {
            for function in &file.functions {
                self.generate(file, function);
            }
        }
        debug!(
            "Generated {} operations on {} paths",
            self.operation_count(),
            self.paths.len()
        );
    }

    /// Binds every operation declared on `function`, returning how many were bound.
    pub fn generate(&mut self, file: &SourceFile, function: &FunctionDecl) -> usize {
        let mut bound = 0;
        for line in function.docs.lines() {
            let Some(binding) = parse_operation_binding(line) else {
                continue;
            };

            let operation = build_operation(file, function);
            debug!("Binding {} to {} {}", operation.id, binding.method, binding.path);

            let item = self.paths.entry(binding.path.clone()).or_default();
            if let Some(previous) = item.set(binding.method, operation) {
                debug!(
                    "Operation {} replaced {} at {} {}",
                    function.name, previous.id, binding.method, binding.path
                );
            }
            bound += 1;
        }
        bound
    }

    pub fn operation_count(&self) -> usize {
        self.paths.values().map(|item| item.operations().count()).sum()
    }

    pub fn paths(&self) -> &BTreeMap<String, PathItem> {
        &self.paths
    }

    pub fn into_paths(self) -> BTreeMap<String, PathItem> {
        self.paths
    }
}

fn build_operation(file: &SourceFile, function: &FunctionDecl) -> Operation {
    let mut operation = Operation::new(&function.name);
    let description = function.docs.text();
    if !description.is_empty() {
        operation.description = Some(description);
    }

    for directive in function
        .docs
        .lines()
        .iter()
        .filter_map(|line| parse_operation_directive(line))
    {
        apply_directive(&mut operation, &file.path, directive);
    }
    operation
}

fn apply_directive(operation: &mut Operation, source: &Path, directive: OperationDirective) {
    match directive {
        OperationDirective::Parameter {
            name,
            location,
            typed,
            description,
        } => operation.parameters.push(Parameter::typed(
            &name,
            location,
            &typed.type_name,
            typed.format,
            description,
        )),
        OperationDirective::Tag(tag) => operation.tags.push(tag),
        OperationDirective::RequestBody {
            media_type,
            schema_id,
            required,
            description,
        } => {
            operation.set_parameter(Parameter::body(&schema_id, required, description));
            operation.add_consumes(&media_type);
        }
        OperationDirective::Response { key, description } => {
            let response = operation.response_mut(key);
            if let Some(description) = description {
                response.description = description;
            }
        }
        OperationDirective::ResponseContent {
            key,
            media_type,
            schema_id,
        } => {
            operation.add_produces(&media_type);
            operation.response_mut(key).schema = Some(Schema::reference(&schema_id));
        }
        OperationDirective::ResponseHeader {
            key,
            name,
            typed,
            description,
        } => {
            operation.response_mut(key).headers.insert(
                name,
                Header {
                    header_type: typed.type_name,
                    format: typed.format,
                    description,
                },
            );
        }
        OperationDirective::ResponseExample {
            key,
            media_type,
            file,
        } => {
            if let Some(example) = load_example(source, &file) {
                operation.response_mut(key).examples.insert(media_type, example);
            }
        }
    }
}

/// Reads an example payload relative to the directory of `source`.
///
/// JSON content is returned parsed; anything else is returned as text.
fn load_example(source: &Path, relative: &str) -> Option<Value> {
    let path = source.parent().unwrap_or_else(|| Path::new("")).join(relative);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Unable to load example file {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Example {} is not JSON ({}), using raw text", path.display(), e);
            Some(Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::HttpMethod;
    use crate::document::{ParameterLocation, ResponseKey};
    use crate::source::SourceLoader;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    /// Writes `api.rs` plus example files into a temp dir and generates from it
    fn generate(code: &str, examples: &[(&str, &str)]) -> (TempDir, OperationGenerator) {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("api.rs"), code).unwrap();
        for (name, content) in examples {
            let path = temp_dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }

        let sources = SourceLoader::new(temp_dir.path().to_path_buf()).load().unwrap();
        let graph = DeclarationGraph::from_sources(&sources);
        let mut generator = OperationGenerator::new();
        generator.generate_all(&graph);
        (temp_dir, generator)
    }

    fn operation<'a>(generator: &'a OperationGenerator, path: &str, method: HttpMethod) -> &'a Operation {
        generator.paths()[path]
            .get_operation(method)
            .unwrap_or_else(|| panic!("no {} operation at {}", method, path))
    }

    const GET_OPERATION: &str = r#"
        /// GetOperation gets a specific entity
        ///
        /// openapi:operation /entities/{id} GET
        /// openapi:parameter id path string "the id of the entity"
        /// openapi:response default "this is a description"
        /// openapi:responseContent default application/json Model
        /// openapi:responseHeader default My-Custom-Header string "this header will tell you..."
        /// openapi:responseHeader default My-Other-Custom-Header string/date-time "timestamp header"
        /// openapi:responseExample default application/ld+json examples/get_operation_default.json
        /// openapi:response 400 "client did something wrong"
        /// openapi:responseContent 400 application/problem+json Problem
        /// openapi:responseExample 400 application/problem+json examples/get_operation_error.txt
        pub fn get_operation() {}
    "#;

    #[test]
    fn test_response_directives_merge_into_one_bucket() {
        let (_dir, generator) = generate(
            GET_OPERATION,
            &[
                ("examples/get_operation_default.json", r#"[{"id": "a"}, {"id": "b"}]"#),
                ("examples/get_operation_error.txt", "title: not json"),
            ],
        );

        let op = operation(&generator, "/entities/{id}", HttpMethod::Get);
        assert_eq!(op.id, "get_operation");
        assert_eq!(op.description.as_deref(), Some("GetOperation gets a specific entity"));
        assert_eq!(op.produces, vec!["application/json", "application/problem+json"]);
        assert_eq!(op.responses.len(), 2);

        let default = &op.responses[&ResponseKey::Default];
        assert_eq!(default.description, "this is a description");
        assert_eq!(default.schema, Some(Schema::reference("Model")));
        assert_eq!(default.headers.len(), 2);
        assert_eq!(
            default.headers["My-Other-Custom-Header"],
            Header {
                header_type: "string".to_string(),
                format: Some("date-time".to_string()),
                description: Some("timestamp header".to_string()),
            }
        );

        let example = &default.examples["application/ld+json"];
        assert_eq!(example.as_array().map(Vec::len), Some(2));
        assert_eq!(example, &json!([{"id": "a"}, {"id": "b"}]));

        let client_error = &op.responses[&ResponseKey::Status(400)];
        assert_eq!(client_error.description, "client did something wrong");
        assert_eq!(
            client_error.examples["application/problem+json"],
            Value::String("title: not json".to_string())
        );
    }

    #[test]
    fn test_missing_example_file_is_skipped() {
        let (_dir, generator) = generate(GET_OPERATION, &[]);

        let op = operation(&generator, "/entities/{id}", HttpMethod::Get);
        let default = &op.responses[&ResponseKey::Default];
        assert!(default.examples.is_empty());
        assert_eq!(default.headers.len(), 2);
    }

    #[test]
    fn test_parameters_without_request_body() {
        let (_dir, generator) = generate(
            r#"
            /// openapi:operation /entities/{id} PUT
            /// openapi:parameter id path string "the id of the entity"
            /// openapi:parameter dryRun query boolean
            pub fn replace_operation() {}
            "#,
            &[],
        );

        let op = operation(&generator, "/entities/{id}", HttpMethod::Put);
        assert_eq!(op.parameters.len(), 2);
        assert!(op.body_parameter().is_none());
        assert!(op.consumes.is_empty());
        assert!(op.parameters[0].required);
        assert_eq!(op.parameters[1].location, ParameterLocation::Query);
        assert!(!op.parameters[1].required);
    }

    #[test]
    fn test_request_body() {
        let (_dir, generator) = generate(
            r#"
            /// ReplaceOperation will replace (or create) a specific entity
            ///
            /// openapi:operation /entities/{id} PUT
            /// openapi:parameter id path string "the id of the entity"
            /// openapi:requestBody application/json Model "The data to replace the current entity"
            pub fn replace_operation() {}
            "#,
            &[],
        );

        let op = operation(&generator, "/entities/{id}", HttpMethod::Put);
        assert_eq!(op.parameters.len(), 2);
        assert_eq!(op.consumes, vec!["application/json"]);

        let body = op.body_parameter().unwrap();
        assert_eq!(body.name, "body");
        assert!(body.required);
        assert_eq!(body.schema, Some(Schema::reference("Model")));
        assert_eq!(body.description.as_deref(), Some("The data to replace the current entity"));
    }

    #[test]
    fn test_operations_share_paths() {
        let (_dir, generator) = generate(
            r#"
            /// ListOperation lists the entities
            ///
            /// openapi:operation /entities GET
            /// openapi:tag tag1
            /// openapi:tag tag2
            pub fn list_operation() {}

            /// openapi:operation /entities POST
            pub fn create_operation() {}

            /// NotApiOperation is left out of the API document
            pub fn not_api_operation() {}

            pub fn not_documented() {}
            "#,
            &[],
        );

        assert_eq!(generator.paths().len(), 1);
        assert_eq!(generator.operation_count(), 2);

        let list = operation(&generator, "/entities", HttpMethod::Get);
        assert_eq!(list.tags, vec!["tag1", "tag2"]);
        assert!(list.responses.is_empty());
        assert_eq!(operation(&generator, "/entities", HttpMethod::Post).id, "create_operation");
    }

    #[test]
    fn test_unsupported_method_is_dropped() {
        let (_dir, generator) = generate(
            r#"
            /// openapi:operation /debug TRACE
            pub fn trace_operation() {}
            "#,
            &[],
        );

        assert!(generator.paths().is_empty());
        assert_eq!(generator.operation_count(), 0);
    }

    #[test]
    fn test_duplicate_binding_last_wins() {
        let (_dir, generator) = generate(
            r#"
            /// openapi:operation /entities get
            pub fn first() {}

            /// openapi:operation /entities GET
            pub fn second() {}
            "#,
            &[],
        );

        assert_eq!(generator.operation_count(), 1);
        assert_eq!(operation(&generator, "/entities", HttpMethod::Get).id, "second");
    }

    #[test]
    fn test_one_function_several_bindings() {
        let (_dir, generator) = generate(
            r#"
            /// openapi:operation /entities/{id} PUT
            /// openapi:operation /entities/{id} PATCH
            /// openapi:response 204 "updated"
            pub fn update() {}
            "#,
            &[],
        );

        assert_eq!(generator.operation_count(), 2);
        let patch = operation(&generator, "/entities/{id}", HttpMethod::Patch);
        assert_eq!(patch.responses[&ResponseKey::Status(204)].description, "updated");
    }

    #[test]
    fn test_response_without_description_keeps_existing() {
        let (_dir, generator) = generate(
            r#"
            /// openapi:operation /entities DELETE
            /// openapi:response 404 "missing"
            /// openapi:response 404
            /// openapi:responseHeader 404 Retry-After integer
            pub fn delete() {}
            "#,
            &[],
        );

        let op = operation(&generator, "/entities", HttpMethod::Delete);
        let not_found = &op.responses[&ResponseKey::Status(404)];
        assert_eq!(not_found.description, "missing");
        assert_eq!(not_found.headers["Retry-After"].header_type, "integer");
    }
}
