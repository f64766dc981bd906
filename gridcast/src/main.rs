//! # gridcast
//!
//! Export a JSON table to CSV, XLSX, HTML, XML or paginated text.
//!
//! ## Overview
//!
//! gridcast is built on top of gridcastlib. It reads a table document, applies
//! an optional per-viewer customization payload, sorts the rows and writes the
//! table through the sink for the chosen format.
//!
//! ## Usage
//!
//! ```bash
//! # HTML to stdout
//! gridcast people.json
//!
//! # Spreadsheet, sorted descending on the third column
//! gridcast people.json --format xlsx --sort-column 2 --descending --output people.xlsx
//!
//! # Apply the customization stored under "people-<recordId>"
//! gridcast people.json --format csv --customization request.json
//!
//! # Export options from a file, debug logging
//! gridcast people.json --config export.json -v
//! ```

mod table;

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Arg, ArgAction, ArgMatches, Command};
use console::Style;
use gridcastlib::{
    export, find_table_customization, BeanResolver, ExportConfig, Media, OverrideSet,
    SinkRegistry, SortState,
};
use tracing_subscriber::EnvFilter;

use table::TableDocument;

/// Build the clap Command structure
fn build_command() -> Command {
    Command::new("gridcast")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Export tables with per-viewer column customization")
        .arg(
            Arg::new("table")
                .required(true)
                .help("Table document (JSON)"),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_parser(["csv", "xlsx", "html", "xml", "document"])
                .help("Output format (defaults to the configured media, else html)"),
        )
        .arg(
            Arg::new("customization")
                .long("customization")
                .help("Customization payload (JSON), keyed by <tableId>-<recordId>"),
        )
        .arg(
            Arg::new("customization-mode")
                .long("customization-mode")
                .action(ArgAction::SetTrue)
                .help("Emit column edit controls in HTML headers"),
        )
        .arg(
            Arg::new("table-id")
                .long("table-id")
                .help("Table id used to find the customization (defaults to the document id)"),
        )
        .arg(
            Arg::new("sort-column")
                .long("sort-column")
                .value_parser(clap::value_parser!(i32))
                .conflicts_with("sort-property")
                .help("Zero-based index of the column to sort on"),
        )
        .arg(
            Arg::new("sort-property")
                .long("sort-property")
                .help("Sort on the column bound to this property"),
        )
        .arg(
            Arg::new("descending")
                .long("descending")
                .action(ArgAction::SetTrue)
                .help("Sort in descending order"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Export configuration (JSON)"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Write to this file instead of stdout"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Increase logging (-v debug, -vv trace)"),
        )
}

fn init_logging(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = if verbosity > 0 {
        EnvFilter::new(default)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_file(path: &str) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("cannot read {}", path))
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<ExportConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => ExportConfig::from_json_str(&read_file(path)?)
            .with_context(|| format!("invalid configuration in {}", path))?,
        None => ExportConfig::default(),
    };
    if let Some(format) = matches.get_one::<String>("format") {
        config.media = format.parse::<Media>()?;
    }
    if matches.get_flag("customization-mode") {
        config.customization_mode = true;
    }
    Ok(config)
}

/// A payload file holds either the request map (`{"<tableId>-<recordId>":
/// {...}}`) or a single table payload with `columnConfigurations`.
fn load_customization(path: &str, table_id: &str) -> anyhow::Result<Option<OverrideSet>> {
    let json: serde_json::Value = serde_json::from_str(&read_file(path)?)
        .with_context(|| format!("invalid customization payload in {}", path))?;
    if json.get("columnConfigurations").is_some() {
        return Ok(Some(OverrideSet::from_payload(0, &json)?));
    }
    let Some(map) = json.as_object() else {
        bail!("customization payload in {} is not an object", path);
    };
    let overrides = find_table_customization(table_id, map)?;
    if overrides.is_none() {
        tracing::warn!(table = table_id, "no customization found for table");
    }
    Ok(overrides)
}

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let table_path = matches
        .get_one::<String>("table")
        .context("missing table document")?;
    let config = load_config(matches)?;

    let document = TableDocument::from_json_str(&read_file(table_path)?)
        .with_context(|| format!("invalid table document in {}", table_path))?;

    let sort = SortState {
        column: matches.get_one::<i32>("sort-column").copied().unwrap_or(-1),
        ascending: !matches.get_flag("descending"),
        ..SortState::default()
    };
    let lookup_id = matches
        .get_one::<String>("table-id")
        .cloned()
        .unwrap_or_else(|| document.id.clone());

    let mut model = document.into_model(sort);
    model.default_sort_property = matches.get_one::<String>("sort-property").cloned();
    if let Some(path) = matches.get_one::<String>("customization") {
        model.overrides = load_customization(path, &lookup_id)?;
    }

    let registry = SinkRegistry::with_defaults();
    let output = export(&mut model, &config, &registry, &BeanResolver)?;

    match matches.get_one::<String>("output") {
        Some(path) => {
            fs::write(Path::new(path), &output.bytes)
                .with_context(|| format!("cannot write {}", path))?;
            tracing::debug!(path = %path, mime = output.mime_type, "wrote export");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&output.bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let matches = build_command().get_matches();
    init_logging(matches.get_count("verbose"));

    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let red = Style::new().red().bold();
            eprintln!("{} {:#}", red.apply_to("Error:"), err);
            ExitCode::FAILURE
        }
    }
}
