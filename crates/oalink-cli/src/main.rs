use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use oalink_core::config::{self, CONFIG_FILE_NAME, OalinkConfig};
use oalink_core::model::{ElementKind, HttpMethod};
use oalink_core::symbols::SymbolSource;
use oalink_core::{
    ApiOperation, CandidateSymbol, DocumentPath, InMemorySymbols, Navigator, Resolution,
    SpecElement, SpecIndex, SpecNode,
};

#[derive(Parser)]
#[command(name = "oalink", about = "Navigate between OpenAPI specs and the code implementing them", version)]
struct Cli {
    /// Project root; spec files are indexed below it and `.oalink.yaml` is read from it
    #[arg(short, long, global = true, default_value = ".")]
    root: PathBuf,

    /// Output format
    #[arg(long, global = true, default_value = "json")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index the project's spec documents and print a summary
    Index {
        /// Ignore the configured snapshot and rebuild from scratch
        #[arg(long)]
        force: bool,
    },

    /// Look up index records by kind and identifier
    Lookup {
        /// operation, component or tags
        kind: ElementKind,
        identifier: String,
    },

    /// Find the code implementing an operation
    Impl {
        /// Symbols manifest (YAML or JSON) describing the project's classes
        #[arg(short, long)]
        symbols: PathBuf,

        #[arg(long)]
        operation_id: Option<String>,

        #[arg(long)]
        path: Option<String>,

        #[arg(long)]
        method: Option<HttpMethod>,

        /// Spec file holding the operation, relative to the project root; used with --pointer
        #[arg(long, requires = "pointer", conflicts_with = "operation_id")]
        file: Option<PathBuf>,

        /// JSON pointer to an HTTP-method key or an operationId leaf
        #[arg(long, requires = "file")]
        pointer: Option<String>,
    },

    /// Find the spec nodes a class or one of its methods corresponds to
    Spec {
        /// Symbols manifest (YAML or JSON) describing the project's classes
        #[arg(short, long)]
        symbols: PathBuf,

        /// Qualified class name
        #[arg(long)]
        class: String,

        /// Method of the class; the class itself when omitted
        #[arg(long)]
        method: Option<String>,
    },

    /// Print the operation declared at a location in a spec file
    Identity {
        #[arg(long)]
        file: PathBuf,

        /// JSON pointer to an HTTP-method key or an operationId leaf
        #[arg(long)]
        pointer: String,
    },

    /// Initialize a new oalink configuration
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let root = cli.root;
    let format = cli.format;

    match cli.command {
        Commands::Index { force } => cmd_index(&root, format, force),

        Commands::Lookup { kind, identifier } => cmd_lookup(&root, format, kind, &identifier),

        Commands::Impl {
            symbols,
            operation_id,
            path,
            method,
            file,
            pointer,
        } => {
            let target = match (file, pointer) {
                (Some(file), Some(pointer)) => ImplTarget::Location { file, pointer },
                _ => ImplTarget::Operation {
                    operation_id: operation_id
                        .context("either --operation-id or --file with --pointer is required")?,
                    path,
                    method,
                },
            };
            cmd_impl(&root, format, &symbols, target)
        }

        Commands::Spec {
            symbols,
            class,
            method,
        } => cmd_spec(&root, format, &symbols, &class, method.as_deref()),

        Commands::Identity { file, pointer } => cmd_identity(&root, format, &file, &pointer),

        Commands::Init { force } => cmd_init(&root, force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "oalink", &mut std::io::stdout());
            Ok(())
        }
    }
}

enum ImplTarget {
    Operation {
        operation_id: String,
        path: Option<String>,
        method: Option<HttpMethod>,
    },
    Location {
        file: PathBuf,
        pointer: String,
    },
}

/// Load `.oalink.yaml` from the project root, falling back to defaults.
fn load_project_config(root: &Path) -> Result<OalinkConfig> {
    let config_path = root.join(CONFIG_FILE_NAME);
    let cfg = config::load_config(&config_path).map_err(|e| anyhow::anyhow!(e))?;
    Ok(cfg.unwrap_or_default())
}

/// Build the index, starting from the configured snapshot unless `force` is set.
fn open_index(root: &Path, cfg: &OalinkConfig, force: bool) -> Result<SpecIndex> {
    let root = root
        .canonicalize()
        .with_context(|| format!("failed to resolve project root {}", root.display()))?;
    let index = SpecIndex::new(&root, &cfg.index);
    let snapshot = cfg.index.snapshot.as_ref().map(|p| root.join(p));

    if let Some(snapshot) = snapshot.as_deref().filter(|p| !force && p.exists()) {
        match index.load_snapshot(snapshot) {
            Ok(records) => log::info!("loaded {records} records from {}", snapshot.display()),
            Err(e) => log::warn!("ignoring snapshot {}: {e}", snapshot.display()),
        }
    }

    index.reindex_project();

    if let Some(snapshot) = snapshot {
        index
            .save_snapshot(&snapshot)
            .with_context(|| format!("failed to save snapshot {}", snapshot.display()))?;
    }
    Ok(index)
}

fn load_symbols(path: &Path, cfg: &OalinkConfig) -> Result<InMemorySymbols> {
    let symbols = InMemorySymbols::load_manifest(path)
        .with_context(|| format!("failed to load symbols from {}", path.display()))?
        .with_conventions(
            cfg.matcher.escape_prefix.clone(),
            cfg.naming.raw_function_suffix.clone(),
        );
    log::debug!("loaded {} classes from {}", symbols.len(), path.display());
    Ok(symbols)
}

fn print_output<T: serde::Serialize>(format: OutputFormat, value: &T) -> Result<()> {
    match format {
        OutputFormat::Yaml => {
            let yaml = serde_yaml_ng::to_string(value)?;
            print!("{}", yaml);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{}", json);
        }
    }
    Ok(())
}

fn ready_items<T>(resolution: Resolution<T>) -> Result<Vec<T>> {
    match resolution {
        Resolution::NotReady => anyhow::bail!("the index is still being built, try again"),
        Resolution::Found(items) => Ok(items),
    }
}

fn node_summary(node: &SpecNode) -> Result<serde_json::Value> {
    Ok(serde_json::json!({
        "file": node.file.display().to_string(),
        "pointer": node.path.to_string(),
        "value": serde_json::to_value(&node.value)?,
    }))
}

fn cmd_index(root: &Path, format: OutputFormat, force: bool) -> Result<()> {
    let cfg = load_project_config(root)?;
    let index = open_index(root, &cfg, force)?;

    eprintln!(
        "Indexed {} records from {} files.",
        index.record_count(),
        index.files().len()
    );
    print_output(
        format,
        &serde_json::json!({
            "root": index.root().display().to_string(),
            "files": index.files(),
            "keys": index.keys(),
        }),
    )
}

fn cmd_lookup(root: &Path, format: OutputFormat, kind: ElementKind, identifier: &str) -> Result<()> {
    let cfg = load_project_config(root)?;
    let index = open_index(root, &cfg, false)?;
    let records = index.lookup(kind, identifier);
    if records.is_empty() {
        eprintln!("No {kind} named {identifier}.");
    }
    print_output(format, &records)
}

fn cmd_impl(root: &Path, format: OutputFormat, symbols: &Path, target: ImplTarget) -> Result<()> {
    let cfg = load_project_config(root)?;
    let index = open_index(root, &cfg, false)?;
    let symbols = load_symbols(symbols, &cfg)?;
    let navigator = Navigator::new(&index, &symbols, &cfg)?;

    let found = match target {
        ImplTarget::Location { file, pointer } => ready_items(
            navigator.resolve_implementation_at(&file, &DocumentPath::from_pointer(&pointer)),
        )?,
        ImplTarget::Operation {
            operation_id,
            path,
            method,
        } => {
            let operations = operations_for(&index, &operation_id, path, method)?;
            let mut found = Vec::new();
            for operation in &operations {
                found.extend(ready_items(navigator.resolve_implementation(operation))?);
            }
            found
        }
    };

    if found.is_empty() {
        eprintln!("No implementation found.");
    } else if found.len() > 1 {
        eprintln!("{} candidates found.", found.len());
    }
    print_output(format, &found)
}

/// The operation to resolve: given outright, or looked up by id in the index.
fn operations_for(
    index: &SpecIndex,
    operation_id: &str,
    path: Option<String>,
    method: Option<HttpMethod>,
) -> Result<Vec<ApiOperation>> {
    if let (Some(path), Some(method)) = (path.as_ref(), method) {
        return Ok(vec![ApiOperation::new(path.as_str(), method, operation_id)]);
    }

    let operations: Vec<ApiOperation> = index
        .lookup(ElementKind::Operation, operation_id)
        .into_iter()
        .filter_map(|record| match record.element {
            SpecElement::Operation(op) => Some(op),
            _ => None,
        })
        .filter(|op| path.as_ref().is_none_or(|p| &op.path == p))
        .filter(|op| method.is_none_or(|m| op.method == m))
        .collect();

    if operations.is_empty() {
        anyhow::bail!("operation {operation_id} is not declared in any indexed spec");
    }
    Ok(operations)
}

fn cmd_spec(
    root: &Path,
    format: OutputFormat,
    symbols: &Path,
    class: &str,
    method: Option<&str>,
) -> Result<()> {
    let cfg = load_project_config(root)?;
    let index = open_index(root, &cfg, false)?;
    let symbols = load_symbols(symbols, &cfg)?;
    let navigator = Navigator::new(&index, &symbols, &cfg)?;

    let class = symbols
        .find_class(class)
        .with_context(|| format!("class {class} is not in the symbols manifest"))?;
    let symbol: CandidateSymbol = match method {
        Some(name) => class
            .methods_named(name)
            .next()
            .cloned()
            .with_context(|| format!("{} has no method {name}", class.qualified_name))?,
        None => class.symbol.clone(),
    };

    let nodes = ready_items(navigator.resolve_spec_element(&symbol))?;
    if nodes.is_empty() {
        eprintln!("No spec element found for {}.", symbol.simple_name);
    }
    let summaries = nodes.iter().map(node_summary).collect::<Result<Vec<_>>>()?;
    print_output(format, &summaries)
}

fn cmd_identity(root: &Path, format: OutputFormat, file: &Path, pointer: &str) -> Result<()> {
    let cfg = load_project_config(root)?;
    let index = open_index(root, &cfg, false)?;
    let symbols = InMemorySymbols::new();
    let navigator = Navigator::new(&index, &symbols, &cfg)?;

    let operations = ready_items(
        navigator.extract_operation_identity(file, &DocumentPath::from_pointer(pointer)),
    )?;
    match operations.first() {
        Some(operation) => print_output(format, operation),
        None => anyhow::bail!("no operation with an operationId at {pointer} in {}", file.display()),
    }
}

fn cmd_init(root: &Path, force: bool) -> Result<()> {
    let config_path = root.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())
        .with_context(|| format!("failed to write {}", config_path.display()))?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}
