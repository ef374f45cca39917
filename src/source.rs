use crate::error::{Error, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Loads and parses the Rust sources that make up a declaration graph.
///
/// The loader accepts either a single `.rs` file or a directory. Directories
/// are walked recursively, skipping `target` and hidden directories. Files
/// are returned in path order so repeated runs see the same declaration order.
///
/// # Example
///
/// ```no_run
/// use openapi_from_docs::source::SourceLoader;
/// use std::path::PathBuf;
///
/// let sources = SourceLoader::new(PathBuf::from("./my-service/src")).load().unwrap();
/// println!("Loaded {} files", sources.len());
/// ```
pub struct SourceLoader {
    root: PathBuf,
}

/// A source file together with its syntax tree.
#[derive(Debug)]
pub struct ParsedSource {
    /// Path the file was read from; example files are resolved relative to it
    pub path: PathBuf,
    /// The parsed syntax tree
    pub syntax_tree: syn::File,
}

impl SourceLoader {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Reads and parses every source file under the root.
    ///
    /// Unreadable or unparsable files are logged and skipped. The call only
    /// fails when the root is missing or nothing at all could be parsed.
    pub fn load(&self) -> Result<Vec<ParsedSource>> {
        if !self.root.exists() {
            return Err(Error::InvalidArgument(format!(
                "source path does not exist: {}",
                self.root.display()
            )));
        }

        let files = self.collect_files();
        debug!("Found {} Rust files under {}", files.len(), self.root.display());

        let mut sources = Vec::with_capacity(files.len());
        for path in &files {
            match Self::read_source(path) {
                Ok(parsed) => sources.push(parsed),
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }

        if sources.is_empty() {
            return Err(Error::NoSources(self.root.clone()));
        }

        debug!("Parsed {} of {} files", sources.len(), files.len());
        Ok(sources)
    }

    /// Parses source text that is already in memory.
    pub fn parse_source(path: &Path, text: &str) -> Result<ParsedSource> {
        let syntax_tree = syn::parse_file(text).map_err(|e| Error::ParseError {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Ok(ParsedSource {
            path: path.to_path_buf(),
            syntax_tree,
        })
    }

    fn read_source(path: &Path) -> Result<ParsedSource> {
        debug!("Parsing file: {}", path.display());
        let text = fs::read_to_string(path)?;
        Self::parse_source(path, &text)
    }

    fn collect_files(&self) -> Vec<PathBuf> {
        if self.root.is_file() {
            return vec![self.root.clone()];
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root).into_iter().filter_entry(|e| {
            if e.path() == self.root {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            !name.starts_with('.') && name != "target"
        });

        for entry in walker {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("rs") {
                        files.push(path.to_path_buf());
                    }
                }
                Err(e) => warn!("Failed to access path: {}", e),
            }
        }

        files.sort();
        files
    }
}
