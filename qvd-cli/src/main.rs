//! # QVD CLI
//!
//! Inspect and dump QVD files.
//!
//! Run with: `cargo run --bin qvd -- dump data/orders.qvd --limit 20`

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use qvd_core::{Config, LogFormat, LogLevel, Table, Value};
use qvd_decoder::{Decoder, FileDescriptor, QvdFile};

#[derive(Parser)]
#[command(name = "qvd")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect and decode QVD files")]
struct Cli {
    /// JSON config file with `decode` and `logging` sections
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Reject symbols that do not match their field's declared kind
    #[arg(long, global = true)]
    strict_kinds: bool,

    /// Decode negative symbol indices as empty cells
    #[arg(long, global = true)]
    negative_index_is_empty: bool,

    /// Decode on the current thread only
    #[arg(long, global = true)]
    no_parallel: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the table-level header summary
    Header {
        /// QVD file
        file: PathBuf,
    },
    /// Print one line per field: name, kind, bit layout and symbol count
    Schema {
        /// QVD file
        file: PathBuf,
    },
    /// Decode the file and print its rows
    Dump {
        /// QVD file
        file: PathBuf,

        /// Print at most this many rows
        #[arg(short, long, value_name = "N")]
        limit: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(&config, cli.verbose);
    debug!(?config, "Resolved configuration");

    let decoder = Decoder::new(config.decode);
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match &cli.command {
        Commands::Header { file } => {
            let header = open(file)?.read_header()?;
            print_header(&mut out, &header)?;
        }
        Commands::Schema { file } => {
            let header = open(file)?.read_header()?;
            print_schema(&mut out, &header)?;
        }
        Commands::Dump {
            file,
            limit,
            format,
        } => {
            let (table, stats) = decoder
                .decode_with_stats(open(file)?.bytes())
                .with_context(|| format!("failed to decode {}", file.display()))?;
            info!(
                records_per_sec = stats.records_per_sec() as u64,
                "Decoded {}",
                file.display()
            );
            let limit = limit.unwrap_or(table.num_rows());
            match format {
                OutputFormat::Text => print_rows_text(&mut out, &table, limit)?,
                OutputFormat::Json => print_rows_json(&mut out, &table, limit)?,
            }
        }
    }

    out.flush()?;
    Ok(())
}

/// Config file first, then command-line flags on top
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };
    if cli.strict_kinds {
        config.decode.strict_kinds = true;
    }
    if cli.negative_index_is_empty {
        config.decode.negative_index_is_empty = true;
    }
    if cli.no_parallel {
        config.decode.parallel = false;
    }
    match cli.verbose {
        0 => {}
        1 => config.logging.level = config.logging.level.min(LogLevel::Debug),
        _ => config.logging.level = LogLevel::Trace,
    }
    Ok(config)
}

/// Logs go to stderr so that stdout carries only data. `RUST_LOG` wins
/// over the configured level unless `-v` was given.
fn init_logging(config: &Config, verbose: u8) {
    let level = config.logging.level.as_str();
    let filter = if verbose > 0 {
        EnvFilter::new(level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    match config.logging.format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn open(path: &Path) -> Result<QvdFile> {
    QvdFile::open(path).with_context(|| format!("failed to open {}", path.display()))
}

fn print_header(out: &mut impl Write, header: &FileDescriptor) -> Result<()> {
    let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    writeln!(out, "Table:            {}", or_dash(&header.table_name))?;
    writeln!(out, "Creator document: {}", or_dash(&header.creator_doc))?;
    writeln!(out, "Build:            {}", or_dash(&header.build_no))?;
    writeln!(out, "Created (UTC):    {}", or_dash(&header.create_utc_time))?;
    writeln!(out, "Records:          {}", header.record_count)?;
    writeln!(out, "Record size:      {} bytes", header.record_byte_size)?;
    writeln!(out, "Header size:      {} bytes", header.header_len)?;
    writeln!(out, "Symbol region:    {} bytes", header.symbol_region.len)?;
    writeln!(out, "Row region:       {} bytes", header.row_region.len)?;
    writeln!(out, "Fields:           {}", header.fields.len())?;
    for field in &header.fields {
        writeln!(out, "  {}", field.name)?;
    }
    Ok(())
}

fn print_schema(out: &mut impl Write, header: &FileDescriptor) -> Result<()> {
    let name_width = header
        .fields
        .iter()
        .map(|f| f.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("FIELD".len());

    writeln!(
        out,
        "{:<name_width$}  {:<7}  {:>6}  {:>5}  {:>5}  {:>8}",
        "FIELD", "KIND", "OFFSET", "WIDTH", "BIAS", "SYMBOLS"
    )?;
    for field in &header.fields {
        let symbols = field
            .declared_symbols
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            out,
            "{:<name_width$}  {:<7}  {:>6}  {:>5}  {:>5}  {:>8}",
            field.name,
            field.kind.as_str(),
            field.bit_offset,
            field.bit_width,
            field.bias,
            symbols
        )?;
    }
    Ok(())
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Empty => "NULL".to_string(),
        Value::Symbol(symbol) => symbol.to_string(),
    }
}

fn print_rows_text(out: &mut impl Write, table: &Table, limit: usize) -> Result<()> {
    writeln!(out, "{}", table.column_names().collect::<Vec<_>>().join("\t"))?;
    for row in table.rows().take(limit) {
        let cells: Vec<String> = row.into_iter().map(cell_text).collect();
        writeln!(out, "{}", cells.join("\t"))?;
    }
    Ok(())
}

/// One JSON object per row, keyed by column name
fn print_rows_json(out: &mut impl Write, table: &Table, limit: usize) -> Result<()> {
    let names: Vec<&str> = table.column_names().collect();
    let mut rows = Vec::with_capacity(limit.min(table.num_rows()));
    for row in table.rows().take(limit) {
        let mut object = serde_json::Map::with_capacity(names.len());
        for (name, value) in names.iter().zip(row) {
            object.insert(name.to_string(), serde_json::to_value(value)?);
        }
        rows.push(serde_json::Value::Object(object));
    }
    serde_json::to_writer_pretty(&mut *out, &rows)?;
    writeln!(out)?;
    Ok(())
}
