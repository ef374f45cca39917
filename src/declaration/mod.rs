//! Type-resolved declaration graph consumed by the generators.
//!
//! The graph is built once from parsed sources (see [`lower`]) and is
//! read-only afterwards. Each struct field carries everything the schema
//! generator needs in one place: name, visibility, embedding, serialization
//! key, resolved type and documentation.

pub mod lower;

use crate::directive::is_directive_line;
use crate::source::ParsedSource;
use log::debug;
use std::path::{Path, PathBuf};

/// All declarations found in a set of source files.
#[derive(Debug, Clone, Default)]
pub struct DeclarationGraph {
    pub files: Vec<SourceFile>,
}

/// Declarations of one source file plus its file-level documentation.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Inner (`//!`) documentation of the file
    pub docs: Documentation,
    pub types: Vec<TypeDecl>,
    pub functions: Vec<FunctionDecl>,
}

/// The doc-comment lines attached to a declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Documentation {
    lines: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: String,
    pub docs: Documentation,
    pub shape: TypeShape,
}

/// Underlying shape of a type declaration.
#[derive(Debug, Clone)]
pub enum TypeShape {
    /// Struct with named fields, in declaration order
    Struct(Vec<FieldDecl>),
    /// `type X = T;` or a newtype `struct X(T);`
    Alias(TypeRef),
    /// Enum whose variants are all unit variants (serialized names)
    Enum(Vec<String>),
    /// A declaration that cannot be mapped, with the reason
    Opaque(String),
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub exported: bool,
    pub embedded: bool,
    pub serialization_key: Option<String>,
    pub ty: TypeRef,
    pub docs: Documentation,
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: String,
    pub docs: Documentation,
}

/// Resolved type of a field or alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Primitive(PrimitiveKind),
    Named(NamedType),
    Sequence(Box<TypeRef>),
    /// Keyed map; only the value type is kept
    Map(Box<TypeRef>),
    /// `Option`, `Box`, references and other single-level wrappers
    Indirect(Box<TypeRef>),
    /// `serde_json::Value`, trait objects
    Any,
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedType {
    pub name: String,
    /// Leading path segments, e.g. `["chrono"]` for `chrono::DateTime`
    pub qualifier: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
    Char,
    String,
}

impl DeclarationGraph {
    /// Lowers every parsed source into the graph, keeping source order.
    pub fn from_sources(sources: &[ParsedSource]) -> Self {
        let files: Vec<SourceFile> = sources.iter().map(lower::lower_file).collect();
        debug!(
            "Declaration graph: {} files, {} types, {} functions",
            files.len(),
            files.iter().map(|f| f.types.len()).sum::<usize>(),
            files.iter().map(|f| f.functions.len()).sum::<usize>()
        );
        Self { files }
    }

    /// Finds the declaration backing a named type.
    ///
    /// A declaration in `from` (the file where the name is used) wins over
    /// one elsewhere; otherwise the first match in file order is returned.
    pub fn find_type(&self, name: &str, from: &Path) -> Option<(&SourceFile, &TypeDecl)> {
        let local = self
            .files
            .iter()
            .filter(|f| f.path == from)
            .find_map(|f| f.type_named(name).map(|t| (f, t)));

        local.or_else(|| {
            self.files
                .iter()
                .find_map(|f| f.type_named(name).map(|t| (f, t)))
        })
    }
}

impl SourceFile {
    fn type_named(&self, name: &str) -> Option<&TypeDecl> {
        self.types.iter().find(|t| t.name == name)
    }
}

impl Documentation {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Free text of the documentation with directive lines removed.
    ///
    /// Leading and trailing blank lines are dropped and runs of blank lines
    /// collapse into one, so paragraphs survive but layout noise does not.
    pub fn text(&self) -> String {
        let mut out: Vec<&str> = Vec::new();
        let mut pending_blank = false;

        for line in self.lines.iter().filter(|l| !is_directive_line(l)) {
            let line = line.trim_end();
            if line.trim().is_empty() {
                pending_blank = !out.is_empty();
                continue;
            }
            if pending_blank {
                out.push("");
                pending_blank = false;
            }
            out.push(line);
        }

        out.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(lines: &[&str]) -> Documentation {
        Documentation::new(lines.iter().map(|l| l.to_string()).collect())
    }

    #[test]
    fn test_text_drops_directive_lines() {
        let doc = docs(&[
            "GetOperation gets a specific entity",
            "",
            "openapi:operation /entities/{id} GET",
            "openapi:tag entities",
        ]);
        assert_eq!(doc.text(), "GetOperation gets a specific entity");
    }

    #[test]
    fn test_text_keeps_paragraphs() {
        let doc = docs(&["", "First line.", "", "", "Second paragraph.", ""]);
        assert_eq!(doc.text(), "First line.\n\nSecond paragraph.");
    }

    #[test]
    fn test_text_keeps_prose_with_colons() {
        let doc = docs(&["Note: see http://example.com for details"]);
        assert_eq!(doc.text(), "Note: see http://example.com for details");
    }

    #[test]
    fn test_text_of_directives_only_is_empty() {
        let doc = docs(&["openapi:component schema Model"]);
        assert!(doc.text().is_empty());
        assert!(!doc.is_empty());
    }

    #[test]
    fn test_find_type_prefers_same_file() {
        let source = |path: &str, desc: &str| SourceFile {
            path: PathBuf::from(path),
            docs: Documentation::default(),
            types: vec![TypeDecl {
                name: "Item".to_string(),
                docs: docs(&[desc]),
                shape: TypeShape::Struct(vec![]),
            }],
            functions: vec![],
        };
        let graph = DeclarationGraph {
            files: vec![source("a.rs", "from a"), source("b.rs", "from b")],
        };

        let (file, decl) = graph.find_type("Item", Path::new("b.rs")).unwrap();
        assert_eq!(file.path, PathBuf::from("b.rs"));
        assert_eq!(decl.docs.text(), "from b");

        let (file, _) = graph.find_type("Item", Path::new("c.rs")).unwrap();
        assert_eq!(file.path, PathBuf::from("a.rs"));

        assert!(graph.find_type("Missing", Path::new("a.rs")).is_none());
    }
}
