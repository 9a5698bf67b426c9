use crate::error::Error;
use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use std::env;
use std::path::{Component, Path, PathBuf};

/// Postman collection generator - Build a Postman collection from axios calls in JavaScript tools
#[derive(Parser, Debug)]
#[command(name = "postman-from-source")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Directory whose numbered subdirectories (1_*, 2-*, ...) are scanned
    #[arg(long = "root", value_name = "DIR", default_value = "./tools")]
    pub root: PathBuf,

    /// Collection display name
    #[arg(long = "name", default_value = crate::collection_builder::DEFAULT_COLLECTION_NAME)]
    pub name: String,

    /// Directory the collection and environment template are written to
    #[arg(long = "out-dir", value_name = "DIR", default_value = "./generate_postman_schema")]
    pub out_dir: PathBuf,

    /// Directory that source paths in request names are relative to (defaults to the current directory)
    #[arg(long = "base-dir", value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Identifier of the HTTP client whose calls are extracted
    #[arg(long = "client", value_name = "IDENT", default_value = crate::extractor::axios::DEFAULT_CLIENT)]
    pub client: String,

    /// File name suffix of source files (repeatable)
    #[arg(long = "ext", value_name = "SUFFIX", default_value = ".js")]
    pub extensions: Vec<String>,

    /// Environment template display name
    #[arg(long = "env-name", default_value = crate::collection_builder::DEFAULT_ENVIRONMENT_NAME)]
    pub env_name: String,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Validated generator settings, with every path absolute and normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub root: PathBuf,
    pub name: String,
    pub out_dir: PathBuf,
    pub base_dir: PathBuf,
    pub client: String,
    pub extensions: Vec<String>,
    pub env_name: String,
}

impl GeneratorConfig {
    /// File the collection is written to
    pub fn collection_path(&self) -> PathBuf {
        self.out_dir.join("postman_collection.json")
    }

    /// File the environment template is written to
    pub fn environment_path(&self) -> PathBuf {
        self.out_dir.join("postman_environment.template.json")
    }

    /// Builds a configuration from parsed arguments, resolving relative paths against `cwd`.
    pub fn from_args(args: CliArgs, cwd: &Path) -> crate::error::Result<Self> {
        if !is_identifier(&args.client) {
            return Err(Error::InvalidArgument(format!(
                "client must be a JavaScript identifier, got {:?}",
                args.client
            )));
        }

        let mut extensions = Vec::new();
        for ext in args.extensions {
            if ext.is_empty() || ext == "." {
                return Err(Error::InvalidArgument(
                    "source file suffix must not be empty".to_string(),
                ));
            }
            extensions.push(if ext.starts_with('.') {
                ext
            } else {
                format!(".{}", ext)
            });
        }

        let base_dir = args.base_dir.unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            root: resolve(cwd, &args.root),
            name: args.name,
            out_dir: resolve(cwd, &args.out_dir),
            base_dir: resolve(cwd, &base_dir),
            client: args.client,
            extensions,
            env_name: args.env_name,
        })
    }
}

/// Counts and locations reported at the end of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSummary {
    pub root: PathBuf,
    pub files_found: usize,
    pub files_parsed: usize,
    pub requests: usize,
    pub collection_path: PathBuf,
    pub environment_path: PathBuf,
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<GeneratorConfig> {
    debug!("Parsed arguments: {:?}", args);

    let cwd = env::current_dir().context("Failed to determine the current directory")?;
    let config = GeneratorConfig::from_args(args, &cwd)?;

    info!("Tools root: {}", config.root.display());
    info!("Collection name: {}", config.name);
    info!("Output directory: {}", config.out_dir.display());
    debug!("Base directory: {}", config.base_dir.display());
    debug!("Client: {}, suffixes: {:?}", config.client, config.extensions);

    Ok(config)
}

/// Run the main workflow
pub fn run(config: &GeneratorConfig) -> Result<GenerationSummary> {
    use crate::collection_builder::CollectionBuilder;
    use crate::extractor::axios::AxiosExtractor;
    use crate::extractor::CallSiteExtractor;
    use crate::parser::{AstParser, ParsedFile};
    use crate::scanner::FileScanner;
    use crate::serializer::{to_canonical_json, write_to_file};

    info!("Starting Postman collection generation...");

    // Step 1: Make sure the output directory exists before doing any work
    std::fs::create_dir_all(&config.out_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            config.out_dir.display()
        )
    })?;

    // Step 2: Select numbered tool directories and collect sources
    info!("Scanning numbered tool directories...");
    let scanner =
        FileScanner::new(config.root.clone()).with_extensions(config.extensions.clone());
    let scan_result = scanner.scan()?;

    for dir in &scan_result.selected_dirs {
        debug!("Selected [{}] {}", dir.index, dir.path.display());
    }
    for warning in &scan_result.warnings {
        warn!("{}", warning);
    }
    if scan_result.source_files.is_empty() {
        warn!("No source files found under {}", config.root.display());
    }

    // Step 3: Parse files; files that fail to parse contribute nothing
    let parsed_files: Vec<ParsedFile> = AstParser::parse_files(&scan_result.source_files)
        .into_iter()
        .filter_map(|parsed| parsed.ok())
        .collect();
    debug!(
        "Parsed {} of {} files",
        parsed_files.len(),
        scan_result.source_files.len()
    );

    // Step 4: Extract call sites
    let extractor = AxiosExtractor::new(config.client.clone());
    let records = extractor.extract_calls(&parsed_files);
    let request_count = records.len();

    // Step 5: Build both documents
    let mut builder = CollectionBuilder::new()
        .with_name(config.name.clone())
        .with_environment_name(config.env_name.clone())
        .with_base_dir(config.base_dir.clone());
    builder.add_records(records);
    let (collection, environment) = builder.build(chrono::Utc::now())?;

    // Step 6: Write output
    let collection_path = config.collection_path();
    let environment_path = config.environment_path();
    write_to_file(&to_canonical_json(&collection)?, &collection_path)?;
    write_to_file(&to_canonical_json(&environment)?, &environment_path)?;

    info!("Scanned numbered tool dirs in {}", config.root.display());
    info!("JS files found: {}", scan_result.source_files.len());
    info!("Axios requests extracted: {}", request_count);
    info!("Generated: {}", collection_path.display());
    info!("Generated: {}", environment_path.display());

    Ok(GenerationSummary {
        root: config.root.clone(),
        files_found: scan_result.source_files.len(),
        files_parsed: parsed_files.len(),
        requests: request_count,
        collection_path,
        environment_path,
    })
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Joins `path` onto `cwd` when relative and removes `.` and `..` components lexically.
fn resolve(cwd: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
