//! csvload CLI - Load CSV files into validated records
//!
//! # Commands
//!
//! ```bash
//! csvload load input.csv --schema schema.json            # Fail-fast load
//! csvload load input.csv --schema schema.json --aggregate
//! csvload load input.csv --schema schema.json --by-header --rename "Organization Id=organization_id"
//! csvload parse input.csv                                 # Raw rows as JSON
//! csvload schema-example                                  # Example schema file
//! ```
//!
//! Logs go to stderr (`RUST_LOG`, default `info`); JSON output goes to stdout
//! or `--output`.

use clap::{Parser, Subcommand};
use csvload::parser::read_file;
use csvload::{
    example_schema, ByHeader, CsvLoader, HeaderRemapField, LoaderOptions, MappingStrategy,
    RowSchema,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "csvload")]
#[command(about = "Load CSV rows into validated, typed records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a CSV file against a schema and output records as JSON
    Load {
        /// Input CSV file
        input: PathBuf,

        /// Schema JSON file (see `schema-example`)
        #[arg(short, long)]
        schema: PathBuf,

        /// Treat row 0 as data, not as a header
        #[arg(long)]
        no_header: bool,

        /// Collect row errors instead of stopping at the first one
        #[arg(short, long)]
        aggregate: bool,

        /// Map cells by header label instead of field order
        #[arg(long)]
        by_header: bool,

        /// Rename a header label to a field name ("Header Label=field_name")
        #[arg(short, long, requires = "by_header")]
        rename: Vec<HeaderRemapField>,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse a CSV file and output its raw rows, encoding and delimiter as JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show an example schema file
    SchemaExample,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Load {
            input,
            schema,
            no_header,
            aggregate,
            by_header,
            rename,
            delimiter,
            output,
        } => {
            let options = LoaderOptions {
                has_header: !no_header,
                aggregate_errors: aggregate,
            };
            let strategy = by_header.then(|| ByHeader::with_remap(rename));
            cmd_load(&input, &schema, options, strategy, delimiter, output.as_deref())
        }

        Commands::Parse {
            input,
            delimiter,
            output,
        } => cmd_parse(&input, delimiter, output.as_deref()),

        Commands::SchemaExample => cmd_schema_example(),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when the load finished with row errors.
fn cmd_load(
    input: &Path,
    schema_path: &Path,
    options: LoaderOptions,
    strategy: Option<ByHeader>,
    delimiter: Option<char>,
    output: Option<&Path>,
) -> Result<bool, Box<dyn std::error::Error>> {
    eprintln!("Loading CSV: {}", input.display());

    let schema = RowSchema::from_json(&fs::read_to_string(schema_path)?)?;
    eprintln!("   Schema: {} fields", schema.len());

    let source = read_file(input, delimiter)?;
    eprintln!("   Encoding: {}", source.encoding);
    eprintln!(
        "   Delimiter: '{}'{}",
        format_delimiter(source.delimiter),
        if delimiter.is_none() { " (auto-detected)" } else { "" }
    );

    let loader = match strategy {
        Some(strategy) => {
            let strategy: Box<dyn MappingStrategy> = Box::new(strategy);
            CsvLoader::with_mapping_strategy(source.rows, schema, options, strategy)?
        }
        None => CsvLoader::new(source.rows, schema, options)?,
    };
    let result = loader.load()?;

    eprintln!("{}", result.summary());
    for error in &result.errors {
        eprintln!("   - {}", error);
    }

    let json = serde_json::to_string_pretty(&result.to_json())?;
    write_output(&json, output)?;

    Ok(!result.has_errors())
}

fn cmd_parse(
    input: &Path,
    delimiter: Option<char>,
    output: Option<&Path>,
) -> Result<bool, Box<dyn std::error::Error>> {
    eprintln!("Parsing CSV: {}", input.display());

    let source = read_file(input, delimiter)?;
    eprintln!("   Encoding: {}", source.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(source.delimiter));
    eprintln!("Parsed {} rows", source.rows.len());

    let json = serde_json::to_string_pretty(&source)?;
    write_output(&json, output)?;

    Ok(true)
}

fn cmd_schema_example() -> Result<bool, Box<dyn std::error::Error>> {
    println!("{}", example_schema().to_json()?);
    Ok(true)
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
