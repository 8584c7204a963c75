//! Command-line front end: run one statement and print the shaped result.

use clap::Parser;
use serde_json::json;
use std::path::PathBuf;

use crate::config::Config;
use crate::core::db::{Database, DbResult, Flag, Flags, KeySelector, ReturnMode, RowShape};
use crate::core::{DbError, Result};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Database file to open (overrides the configuration)
    #[arg(short, long)]
    pub database: Option<String>,

    /// Shape of the result: connection, quoted, raw, row, rows, assoc,
    /// assocs, value, row-count, new-id, error
    #[arg(short, long, default_value = "assocs", value_parser = parse_mode)]
    pub mode: ReturnMode,

    /// Column (name or position) to key "rows"/"assocs" results by
    #[arg(short, long, value_parser = parse_key)]
    pub key: Option<KeySelector>,

    /// Flags such as missing-table-ok or dup-key-ok, comma separated
    #[arg(short, long = "allow", value_delimiter = ',', value_parser = parse_flag)]
    pub allow: Vec<Flag>,

    /// Text encoding applied after connecting
    #[arg(long)]
    pub charset: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    pub log_level: Option<String>,

    /// The statement to run, or the value to quote
    pub statement: Option<String>,
}

fn parse_mode(s: &str) -> std::result::Result<ReturnMode, String> {
    s.parse().map_err(|e: DbError| e.to_string())
}

fn parse_key(s: &str) -> std::result::Result<KeySelector, String> {
    s.parse().map_err(|e: std::convert::Infallible| match e {})
}

fn parse_flag(s: &str) -> std::result::Result<Flag, String> {
    s.parse().map_err(|e: DbError| e.to_string())
}

impl Args {
    /// Applies the command-line overrides on top of a resolved configuration.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(database) = &self.database {
            config.database.name = database.clone();
        }
        if let Some(charset) = &self.charset {
            config.database.charset = Some(charset.clone());
        }
    }

    pub fn flags(&self) -> Flags {
        self.allow.iter().copied().collect()
    }
}

/// Runs the statement described by `args` and renders the result as JSON.
pub fn run(db: &Database, args: &Args) -> Result<serde_json::Value> {
    let result = db.interact(
        args.mode,
        args.statement.as_deref(),
        args.key.as_ref(),
        args.flags(),
    )?;
    render(result)
}

/// Renders a result for printing. Raw outcomes are streamed row by row.
pub fn render(result: DbResult) -> Result<serde_json::Value> {
    let value = match result {
        DbResult::Connection(_) => json!({ "connected": true }),
        DbResult::NoConnection => json!({ "connected": false }),
        DbResult::Quoted(quoted) => json!(quoted),
        DbResult::Raw(None) => serde_json::Value::Null,
        DbResult::Raw(Some(mut outcome)) => {
            let mut rows = Vec::with_capacity(outcome.num_rows());
            while let Some(row) = outcome.next_row(RowShape::Assoc) {
                rows.push(serde_json::to_value(row)?);
            }
            serde_json::Value::Array(rows)
        }
        DbResult::Row(row) => serde_json::to_value(row)?,
        DbResult::Rows(rows) => serde_json::to_value(rows)?,
        DbResult::KeyedRows(rows) => serde_json::to_value(rows)?,
        DbResult::Assoc(row) => serde_json::to_value(row)?,
        DbResult::Assocs(rows) => serde_json::to_value(rows)?,
        DbResult::KeyedAssocs(rows) => serde_json::to_value(rows)?,
        DbResult::Value(value) => serde_json::to_value(value)?,
        DbResult::RowCount(count) => json!(count),
        DbResult::NewId(id) => json!(id),
        DbResult::Error(message) => json!(message),
    };
    Ok(value)
}
