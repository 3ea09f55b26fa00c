//! Schema Command Line Interface
//!
//! Tokenize, parse, check and navigate SpatialOS schema files.
//!
//! # Usage
//!
//! ```bash
//! # Token stream of a file
//! schema_cli tokens --file schema/app.schema
//!
//! # Syntax tree dump (reads stdin if no file is given)
//! echo 'type A { int32 x = 1; }' | schema_cli parse
//!
//! # Check files or whole directories against the search roots
//! schema_cli --root schema check schema/
//!
//! # Go to definition
//! schema_cli definition schema/app.schema --line 4 --col 12
//!
//! # Show the search roots that would be used
//! schema_cli roots
//! ```

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde_json::json;
use spatial_schema::schema_core::{tokenize, NodeId, SyntaxTree};
use spatial_schema::{discover, ConfigLoader, FileReport, RustStyleFormatter, Workspace};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema_cli")]
#[command(version = "0.1.0")]
#[command(about = "Tokenize, parse and check SpatialOS schema files")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format: json, text, or pretty (default)
    #[arg(long, short = 'o', global = true, default_value = "pretty", value_enum)]
    format: OutputFormat,

    /// Schema search root (repeatable; overrides configured roots)
    #[arg(long = "root", short = 'r', global = true)]
    roots: Vec<PathBuf>,

    /// Project directory used to find configuration
    #[arg(long, global = true, env = "SCHEMA_PROJECT_DIR")]
    project: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the token stream
    Tokens {
        /// Input file (reads stdin if not provided)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Print the syntax tree (no resolution)
    Parse {
        /// Input file (reads stdin if not provided)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Parse, resolve and type check
    Check {
        /// Files or directories (reads stdin if none given)
        paths: Vec<PathBuf>,
    },

    /// Resolve the reference at a position
    Definition {
        file: PathBuf,

        /// Byte offset
        #[arg(long, conflicts_with_all = ["line", "col"])]
        offset: Option<usize>,

        /// 1-based line
        #[arg(long, requires = "col")]
        line: Option<usize>,

        /// 1-based column
        #[arg(long, requires = "line")]
        col: Option<usize>,
    },

    /// Show the search roots in effect
    Roots,
}

// =============================================================================
// MAIN
// =============================================================================

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Tokens { file } => cmd_tokens(file.as_deref(), cli.format),
        Commands::Parse { file } => cmd_parse(file.as_deref(), cli.format),
        Commands::Check { paths } => cmd_check(&cli, paths),
        Commands::Definition {
            file,
            offset,
            line,
            col,
        } => cmd_definition(&cli, file, *offset, (*line).zip(*col)),
        Commands::Roots => cmd_roots(&cli),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            if cli.format == OutputFormat::Json {
                println!("{}", json!({ "error": format!("{:#}", e) }));
            } else {
                eprintln!("{}: {:#}", "error".red().bold(), e);
            }
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

fn cmd_tokens(file: Option<&Path>, format: OutputFormat) -> Result<bool> {
    let source = read_input(file)?;
    let tokens = tokenize(&source);

    match format {
        OutputFormat::Json => {
            let output: Vec<_> = tokens
                .iter()
                .map(|t| {
                    json!({
                        "kind": t.kind.debug_name(),
                        "start": t.start,
                        "end": t.end,
                        "text": t.text(&source),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text | OutputFormat::Pretty => {
            for t in &tokens {
                let kind = if format == OutputFormat::Pretty && !t.kind.is_trivia() {
                    t.kind.debug_name().cyan().to_string()
                } else {
                    t.kind.debug_name().to_string()
                };
                println!("{}@{}..{} {:?}", kind, t.start, t.end, t.text(&source));
            }
        }
    }

    Ok(true)
}

fn cmd_parse(file: Option<&Path>, format: OutputFormat) -> Result<bool> {
    let source = read_input(file)?;
    let tree = spatial_schema::schema_core::parse(&source);

    match format {
        OutputFormat::Json => {
            let output = json!({
                "valid": tree.errors().is_empty(),
                "errors": tree.errors().iter().map(|e| {
                    json!({
                        "message": e.message,
                        "start": e.span.start,
                        "end": e.span.end,
                    })
                }).collect::<Vec<_>>(),
                "tree": node_json(&tree, tree.root()),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => print!("{}", tree.debug_dump()),
        OutputFormat::Pretty => {
            print!("{}", tree.debug_dump());
            if tree.errors().is_empty() {
                println!("{} Parsed {} node(s)", "OK".green(), tree.node_count());
            } else {
                println!(
                    "{} {} syntax error(s)",
                    "FAILED".red().bold(),
                    tree.errors().len()
                );
            }
        }
    }

    Ok(tree.errors().is_empty())
}

fn cmd_check(cli: &Cli, paths: &[PathBuf]) -> Result<bool> {
    let workspace = load_workspace(cli)?;

    let reports = if paths.is_empty() {
        let source = read_input(None)?;
        vec![workspace.check_source(Path::new("<stdin>"), &source)]
    } else {
        let mut files = Vec::new();
        for path in paths {
            if path.is_dir() {
                files.extend(discover(path)?);
            } else {
                files.push(path.clone());
            }
        }
        workspace.check_all(&files)?
    };

    let clean = reports.iter().all(|r| !r.has_errors());
    match cli.format {
        OutputFormat::Json => {
            let output = reports
                .iter()
                .map(FileReport::to_json)
                .collect::<Result<Vec<_>, _>>()?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            for report in &reports {
                let compact = RustStyleFormatter::format_compact(&report.path, &report.diagnostics);
                if !compact.is_empty() {
                    println!("{}", compact);
                }
            }
        }
        OutputFormat::Pretty => print_pretty(&reports),
    }

    Ok(clean)
}

fn print_pretty(reports: &[FileReport]) {
    for report in reports {
        if report.diagnostics.is_empty() {
            println!("{} {}", "OK".green().bold(), report.path.display());
            continue;
        }
        let formatted =
            RustStyleFormatter::format(report.tree.source(), &report.path, &report.diagnostics);
        for line in formatted.lines() {
            if line.starts_with("error") {
                println!("{}", line.red().bold());
            } else if line.starts_with("warning") {
                println!("{}", line.yellow().bold());
            } else {
                println!("{}", line);
            }
        }
    }
}

fn cmd_definition(
    cli: &Cli,
    file: &Path,
    offset: Option<usize>,
    position: Option<(usize, usize)>,
) -> Result<bool> {
    let workspace = load_workspace(cli)?;
    let offset = match (offset, position) {
        (Some(offset), _) => offset,
        (None, Some((line, col))) => {
            let tree = workspace.load(file)?;
            line_col_to_offset(tree.source(), line, col)
                .with_context(|| format!("{}:{}:{} is outside the file", file.display(), line, col))?
        }
        (None, None) => bail!("Give either --offset or --line and --col"),
    };

    let Some(definition) = workspace.definition_at(file, offset)? else {
        if cli.format == OutputFormat::Json {
            println!("{}", json!({ "found": false }));
        } else {
            println!("{} no definition at offset {}", "NONE".yellow(), offset);
        }
        return Ok(false);
    };

    let range = definition.tree().range(definition.node());
    let path = definition
        .path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| file.display().to_string());
    match cli.format {
        OutputFormat::Json => {
            let output = json!({
                "found": true,
                "kind": definition.kind().debug_name(),
                "name": definition.name(),
                "path": path,
                "start": range.start,
                "end": range.end,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text | OutputFormat::Pretty => {
            println!(
                "{} {} {}@{}..{}",
                definition.kind(),
                definition.name().unwrap_or("<anonymous>").green(),
                path,
                range.start,
                range.end
            );
        }
    }
    Ok(true)
}

fn cmd_roots(cli: &Cli) -> Result<bool> {
    let workspace = load_workspace(cli)?;
    let roots = workspace.roots();
    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(roots)?),
        OutputFormat::Text | OutputFormat::Pretty => {
            if roots.is_empty() {
                println!("{}", "No search roots configured".yellow());
            }
            for root in roots.iter() {
                println!("{}", root.display());
            }
        }
    }
    Ok(true)
}

// =============================================================================
// HELPERS
// =============================================================================

fn load_workspace(cli: &Cli) -> Result<Workspace> {
    let loader = match &cli.project {
        Some(dir) => ConfigLoader::new(dir),
        None => ConfigLoader::from_env()?,
    };
    let roots = loader.load(&cli.roots)?;
    Ok(Workspace::new(roots))
}

fn node_json(tree: &SyntaxTree, node: NodeId) -> serde_json::Value {
    let range = tree.range(node);
    json!({
        "kind": tree.kind(node).debug_name(),
        "start": range.start,
        "end": range.end,
        "incomplete": tree.is_incomplete(node),
        "children": tree.children(node).iter().map(|&c| node_json(tree, c)).collect::<Vec<_>>(),
    })
}

/// Byte offset of a 1-based line and column (columns count chars)
fn line_col_to_offset(source: &str, line: usize, col: usize) -> Option<usize> {
    let mut start = 0;
    for (index, text) in source.split_inclusive('\n').enumerate() {
        if index + 1 == line {
            let within = text
                .char_indices()
                .map(|(i, _)| i)
                .chain(std::iter::once(text.len()))
                .nth(col.checked_sub(1)?)?;
            return Some(start + within);
        }
        start += text.len();
    }
    None
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path.display())),
        None => {
            if atty::is(atty::Stream::Stdin) {
                bail!("No input provided. Use --file or pipe input via stdin.");
            }
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            Ok(buffer)
        }
    }
}
