use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use grabview_tool::config::load_config;
use grabview_tool::{SchemaFile, ToolError, extract_html, extract_json, extract_path, render};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "grab")]
#[command(about = "Extract records from HTML and JSON documents", long_about = None)]
struct Cli {
    /// Pretty-print the JSON output
    #[arg(long, global = true, conflicts_with = "compact")]
    pretty: bool,

    /// Print the JSON output on one line
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply a page schema to an HTML document
    Html {
        /// Schema file (TOML)
        #[arg(short, long)]
        schema: PathBuf,

        /// Input document; stdin when omitted
        input: Option<PathBuf>,
    },
    /// Apply a view schema to a JSON document
    Json {
        /// Schema file (TOML)
        #[arg(short, long)]
        schema: PathBuf,

        /// Input document; stdin when omitted
        input: Option<PathBuf>,
    },
    /// Read a dotted path, e.g. `items.0.name`, from a JSON document
    Path {
        path: String,

        /// Input document; stdin when omitted
        input: Option<PathBuf>,
    },
}

fn read_input(input: Option<&Path>) -> Result<String, ToolError> {
    match input {
        Some(path) => std::fs::read_to_string(path).map_err(|source| ToolError::Read {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_filter()))
        .with_writer(std::io::stderr)
        .init();

    let pretty = (config.pretty || cli.pretty) && !cli.compact;

    let output = match cli.command {
        Command::Html { schema, input } => {
            let schema = SchemaFile::load(&schema)?;
            let record = extract_html(&schema, &read_input(input.as_deref())?)?;
            debug!(fields = record.len(), "html record extracted");
            render(&record, pretty)?
        }
        Command::Json { schema, input } => {
            let schema = SchemaFile::load(&schema)?;
            let record = extract_json(&schema, &read_input(input.as_deref())?)?;
            debug!(fields = record.len(), "json record extracted");
            render(&record, pretty)?
        }
        Command::Path { path, input } => {
            let value = extract_path(&path, &read_input(input.as_deref())?)?;
            render(&value, pretty)?
        }
    };

    println!("{output}");
    Ok(())
}
