//! OpenAPI from docs - Swagger 2.0 documents from directives in Rust doc comments.
//!
//! Types and functions opt into the document through single-line directives
//! in their documentation:
//!
//! ```text
//! /// Model is a stored entity
//! ///
//! /// openapi:component schema Model
//! pub struct Model { ... }
//!
//! /// GetOperation gets a specific entity
//! ///
//! /// openapi:operation /entities/{id} GET
//! /// openapi:parameter id path string "the id of the entity"
//! /// openapi:responseContent 200 application/json Model
//! pub fn get_operation() {}
//! ```
//!
//! # Architecture
//!
//! 1. [`source`] - Loads and parses Rust source files
//! 2. [`declaration`] - Lowers syntax trees into a type-resolved declaration graph
//! 3. [`directive`] - Directive grammars and their parsers
//! 4. [`schema_generator`] - Turns component types into schema definitions
//! 5. [`operation_generator`] - Turns documented functions into path operations
//! 6. [`spec_builder`] - Assembles info, definitions and paths into a [`document::Document`]
//! 7. [`serializer`] - Serializes the document to JSON or YAML
//!
//! # Example Usage
//!
//! ```no_run
//! use openapi_from_docs::{
//!     declaration::DeclarationGraph,
//!     serializer::serialize_json,
//!     source::SourceLoader,
//!     spec_builder::{GeneratorOptions, SpecBuilder},
//! };
//! use std::path::PathBuf;
//!
//! let sources = SourceLoader::new(PathBuf::from("./my-service/src")).load().unwrap();
//! let graph = DeclarationGraph::from_sources(&sources);
//! let document = SpecBuilder::new(GeneratorOptions::default()).build(&graph);
//! println!("{}", serialize_json(&document).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod cli;
pub mod declaration;
pub mod directive;
pub mod document;
pub mod error;
pub mod operation_generator;
pub mod schema_generator;
pub mod serializer;
pub mod source;
pub mod spec_builder;
