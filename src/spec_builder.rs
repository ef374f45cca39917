use crate::declaration::{DeclarationGraph, Documentation};
use crate::directive::{parse_spec_directive, SpecDirective};
use crate::document::{Document, Info, SWAGGER_VERSION};
use crate::operation_generator::OperationGenerator;
use crate::schema_generator::{RegistrationPolicy, SchemaGenerator};
use log::{debug, info};
use regex::Regex;
use std::sync::LazyLock;

/// Leading `Package <name> ` marker of conventional package docs
static PACKAGE_PREFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Package \S+ ").unwrap());

/// Title used when an `info` directive exists but no title text does
const MISSING_TITLE: &str = "not found";

/// Options for one generation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub registration: RegistrationPolicy,
}

/// Assembles the full document from a declaration graph.
pub struct SpecBuilder {
    options: GeneratorOptions,
}

impl SpecBuilder {
    pub fn new(options: GeneratorOptions) -> Self {
        Self { options }
    }

    pub fn build(&self, graph: &DeclarationGraph) -> Document {
        let mut info = None;
        for file in &graph.files {
            if let Some(derived) = derive_info(&file.docs) {
                debug!("API info version {} from {}", derived.version, file.path.display());
                info = Some(derived);
            }
        }
        if info.is_none() {
            info!("No openapi:info directive found, document has no info block");
        }

        let definitions = SchemaGenerator::new(graph, self.options.registration)
            .generate_all()
            .into_definitions();

        let mut operations = OperationGenerator::new();
        operations.generate_all(graph);

        Document {
            swagger: SWAGGER_VERSION.to_string(),
            info,
            definitions,
            paths: operations.into_paths(),
        }
    }
}

/// Generates a document with default options.
pub fn generate_spec(graph: &DeclarationGraph) -> Document {
    SpecBuilder::new(GeneratorOptions::default()).build(graph)
}

/// Derives the info block from file-level documentation.
///
/// Returns `None` unless the documentation carries `openapi:info <version>`.
/// The first line of free text, minus a leading `Package <name> ` marker,
/// is the title; the remaining text is the description.
pub fn derive_info(docs: &Documentation) -> Option<Info> {
    let version = docs
        .lines()
        .iter()
        .filter_map(|line| match parse_spec_directive(line) {
            Some(SpecDirective::Info { version }) => Some(version),
            None => None,
        })
        .last()?;

    let text = docs.text();
    let text = PACKAGE_PREFIX_REGEX.replace(&text, "");
    let (title, rest) = text.split_once('\n').unwrap_or((text.as_ref(), ""));

    let title = title.trim();
    let description = rest.trim();

    Some(Info {
        title: if title.is_empty() {
            MISSING_TITLE.to_string()
        } else {
            title.to_string()
        },
        description: if description.is_empty() {
            None
        } else {
            Some(description.to_string())
        },
        version,
    })
}
