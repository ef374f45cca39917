use crate::declaration::DeclarationGraph;
use crate::schema_generator::RegistrationPolicy;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use crate::source::SourceLoader;
use crate::spec_builder::{GeneratorOptions, SpecBuilder};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Generate a Swagger 2.0 document from `openapi:` directives in Rust doc comments
#[derive(Parser, Debug)]
#[command(name = "openapi-from-docs")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Rust source file or directory to scan
    #[arg(value_name = "SOURCE_PATH")]
    pub source_path: PathBuf,

    /// Output format (json or yaml)
    #[arg(short = 'f', long = "format", value_enum, default_value = "json")]
    pub output_format: OutputFormat,

    /// Output file path (stdout if not specified or "-")
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Keep the first schema registered under an identifier instead of the last
    #[arg(long = "keep-first-definition")]
    pub keep_first_definition: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

impl CliArgs {
    pub fn generator_options(&self) -> GeneratorOptions {
        GeneratorOptions {
            registration: if self.keep_first_definition {
                RegistrationPolicy::FirstWins
            } else {
                RegistrationPolicy::Overwrite
            },
        }
    }

    /// Output file, or `None` when writing to stdout
    pub fn output_file(&self) -> Option<&Path> {
        self.output_path
            .as_deref()
            .filter(|path| *path != Path::new("-"))
    }
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.source_path.exists() {
        anyhow::bail!("Source path does not exist: {}", args.source_path.display());
    }

    info!("Source path: {}", args.source_path.display());
    info!("Output format: {:?}", args.output_format);
    match args.output_file() {
        Some(output) => info!("Output file: {}", output.display()),
        None => info!("Output: stdout"),
    }
    if args.keep_first_definition {
        info!("Duplicate definitions: first registration wins");
    }

    Ok(args)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Loading sources from {}", args.source_path.display());
    let sources = SourceLoader::new(args.source_path.clone())
        .load()
        .with_context(|| format!("Failed to load sources from {}", args.source_path.display()))?;

    let graph = DeclarationGraph::from_sources(&sources);
    let document = SpecBuilder::new(args.generator_options()).build(&graph);

    let content = match args.output_format {
        OutputFormat::Json => serialize_json(&document)?,
        OutputFormat::Yaml => serialize_yaml(&document)?,
    };

    match args.output_file() {
        Some(output_path) => {
            write_to_file(&content, output_path)?;
            info!("Wrote document to {}", output_path.display());
        }
        None => println!("{}", content),
    }

    let operations: usize = document
        .paths
        .values()
        .map(|item| item.operations().count())
        .sum();
    info!("Summary:");
    info!("  - Files parsed: {}", sources.len());
    info!("  - Definitions: {}", document.definitions.len());
    info!("  - Paths: {}", document.paths.len());
    info!("  - Operations: {}", operations);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use std::fs;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("openapi-from-docs").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["./src"]);
        assert_eq!(args.source_path, PathBuf::from("./src"));
        assert_eq!(args.output_format, OutputFormat::Json);
        assert!(args.output_file().is_none());
        assert_eq!(args.generator_options().registration, RegistrationPolicy::Overwrite);
        assert!(!args.verbose);
    }

    #[test]
    fn test_all_options() {
        let args = parse(&["-f", "yaml", "-o", "out/swagger.yaml", "--keep-first-definition", "-v", "api"]);
        assert_eq!(args.output_format, OutputFormat::Yaml);
        assert_eq!(args.output_file(), Some(Path::new("out/swagger.yaml")));
        assert_eq!(args.generator_options().registration, RegistrationPolicy::FirstWins);
        assert!(args.verbose);
    }

    #[test]
    fn test_dash_means_stdout() {
        assert!(parse(&["-o", "-", "api"]).output_file().is_none());
    }

    #[test]
    fn test_rejects_unknown_format() {
        let result = CliArgs::try_parse_from(["openapi-from-docs", "-f", "toml", "api"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_missing_path() {
        let args = parse(&["/nonexistent/source/tree"]);
        assert!(parse_args_from_parsed(args).is_err());
    }

    #[test]
    fn test_run_writes_document() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        fs::create_dir(&src).unwrap();
        fs::write(
            src.join("lib.rs"),
            r#"
            //! Inventory API
            //!
            //! openapi:info 3.0.1

            /// openapi:component schema Item
            pub struct Item { pub sku: String }

            /// openapi:operation /items GET
            /// openapi:responseContent 200 application/json Item
            pub fn list_items() {}
            "#,
        )
        .unwrap();
        let output = temp_dir.path().join("out").join("swagger.json");

        let args = parse(&["-o", output.to_str().unwrap(), src.to_str().unwrap()]);
        run(parse_args_from_parsed(args).unwrap()).unwrap();

        let document: Document =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(document.info.unwrap().version, "3.0.1");
        assert!(document.definitions.contains_key("Item"));
        assert!(document.paths.contains_key("/items"));
    }

    #[test]
    fn test_run_fails_without_sources() {
        let temp_dir = TempDir::new().unwrap();
        let args = parse(&[temp_dir.path().to_str().unwrap()]);
        assert!(run(args).is_err());
    }
}
