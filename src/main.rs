// Command-line entry point for callscope.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use callscope::api::dto::GraphDto;
use callscope::api::server;
use callscope::application::{extract_callee_names, list_functions, AnalyzeUsecase, TreeRequest};
use callscope::domain::callgraph::MAIN_SCOPE;
use callscope::infrastructure::TreeSitterCallGraphBuilder;
use callscope::ports::tree_exporter::OutputFormat;
use callscope::{AnalysisConfig, AnalysisError};

#[derive(Parser, Debug)]
#[command(author, version, about = "Static call graphs and call trees for Python projects", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also record calls nested inside other calls' arguments
    #[arg(long, global = true)]
    descend_into_arguments: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the project-wide call graph
    Graph {
        /// Project root directory
        root: PathBuf,

        /// Dump the full graph with segments and module map instead of nodes/edges
        #[arg(long)]
        full: bool,

        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build the call tree rooted at one function
    Tree {
        /// Project root directory
        root: PathBuf,

        /// File holding the entry function, absolute or relative to the root
        entry_file: PathBuf,

        /// Entry function name
        #[arg(short, long, default_value = MAIN_SCOPE)]
        function: String,

        /// Maximum tree depth (configuration value when omitted)
        #[arg(short = 'd', long = "depth")]
        max_depth: Option<usize>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the names called in a Python snippet
    Calls {
        /// Snippet file; reads stdin when omitted or `-`
        file: Option<PathBuf>,
    },

    /// List the functions and script entry of a file
    Functions {
        file: PathBuf,

        /// Project root used to qualify names
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Run the JSON-line TCP API server
    Serve {
        #[arg(short, long, default_value_t = 4599)]
        port: u16,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "callscope=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };
    if cli.descend_into_arguments {
        config.descend_into_call_arguments = true;
    }

    match cli.command {
        Command::Graph { root, full, output } => {
            let builder = TreeSitterCallGraphBuilder::new(config);
            let project = AnalyzeUsecase::new(&builder).build_call_graph(&root, None)?;
            let rendered = if full {
                serde_json::to_string_pretty(&project)?
            } else {
                serde_json::to_string_pretty(&GraphDto::from(&project))?
            };
            write_output(output.as_deref(), &rendered)?;
        }
        Command::Tree {
            root,
            entry_file,
            function,
            max_depth,
            format,
            output,
        } => {
            let request = TreeRequest::new(root, entry_file)
                .function(function)
                .max_depth(max_depth.unwrap_or(config.max_depth));
            let builder = TreeSitterCallGraphBuilder::new(config);
            let tree = match AnalyzeUsecase::new(&builder).build_call_tree(&request, None) {
                Ok(tree) => tree,
                Err(AnalysisError::EntryNotFound { entry, available }) => {
                    eprintln!("Entry point '{}' not found. Available entries:", entry);
                    for name in &available {
                        eprintln!("  {}", name);
                    }
                    anyhow::bail!("entry point not found: {}", entry);
                }
                Err(e) => return Err(e.into()),
            };
            let exporter = format.exporter();
            match output {
                Some(path) => {
                    exporter
                        .export(&tree, &path)
                        .with_context(|| format!("Cannot write {}", path.display()))?;
                    tracing::info!(output = %path.display(), "call tree written");
                }
                None => println!("{}", exporter.render(&tree)),
            }
        }
        Command::Calls { file } => {
            let source = match file.as_deref() {
                Some(path) if path != Path::new("-") => fs::read_to_string(path)
                    .with_context(|| format!("Cannot read {}", path.display()))?,
                _ => {
                    let mut buffer = String::new();
                    std::io::stdin().read_to_string(&mut buffer)?;
                    buffer
                }
            };
            for name in extract_callee_names(&source)? {
                println!("{}", name);
            }
        }
        Command::Functions { file, root } => {
            let entries = list_functions(root.as_deref(), &file)?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        Command::Serve { port } => server::start_server(port, config)?,
    }
    Ok(())
}

fn write_output(output: Option<&Path>, rendered: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Cannot write {}", path.display()))?;
            tracing::info!(output = %path.display(), "output written");
        }
        None => println!("{}", rendered),
    }
    Ok(())
}
