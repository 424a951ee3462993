//! Export of a finished lookup for the one-shot `--query` mode
//!
//! Writes the token rows as an aligned table, JSON or CSV.

use std::io::Write;

use clap::ValueEnum;
use serde::Serialize;

use crate::domain::{DisplayRow, LookupOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

#[derive(Serialize)]
struct ExportableOutcome<'a> {
    query: &'a str,
    address: String,
    resolved_from: Option<&'a str>,
    fetched_at: String,
    tokens: &'a [DisplayRow],
}

impl<'a> From<&'a LookupOutcome> for ExportableOutcome<'a> {
    fn from(outcome: &'a LookupOutcome) -> Self {
        Self {
            query: &outcome.query,
            address: outcome.address.to_checksum(None),
            resolved_from: outcome.resolved_from.as_deref(),
            fetched_at: outcome.fetched_at.to_rfc3339(),
            tokens: &outcome.rows,
        }
    }
}

/// Write the outcome in the requested format, returning the number of rows written
pub fn write_outcome<W: Write>(
    out: W,
    outcome: &LookupOutcome,
    format: OutputFormat,
) -> Result<usize, Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Table => write_table(out, outcome),
        OutputFormat::Json => write_json(out, outcome),
        OutputFormat::Csv => write_csv(out, &outcome.rows),
    }
}

pub fn write_json<W: Write>(
    mut out: W,
    outcome: &LookupOutcome,
) -> Result<usize, Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(&ExportableOutcome::from(outcome))?;
    out.write_all(json.as_bytes())?;
    out.write_all(b"\n")?;
    Ok(outcome.rows.len())
}

pub fn write_csv<W: Write>(out: W, rows: &[DisplayRow]) -> Result<usize, Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_writer(out);

    wtr.write_record([
        "contract",
        "symbol",
        "name",
        "decimals",
        "raw_balance",
        "balance",
        "logo",
    ])?;

    for row in rows {
        wtr.write_record([
            row.contract.clone(),
            row.symbol.clone(),
            row.name.clone().unwrap_or_default(),
            row.decimals.to_string(),
            row.raw_balance.clone(),
            row.balance.clone(),
            row.logo.clone().unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    Ok(rows.len())
}

pub fn write_table<W: Write>(
    mut out: W,
    outcome: &LookupOutcome,
) -> Result<usize, Box<dyn std::error::Error>> {
    let target = match &outcome.resolved_from {
        Some(name) => format!("{} -> {}", name, outcome.address.to_checksum(None)),
        None => outcome.address.to_checksum(None),
    };
    writeln!(out, "{}", target)?;

    if outcome.rows.is_empty() {
        writeln!(out, "No ERC-20 balances")?;
        return Ok(0);
    }

    let symbol_width = column_width("SYMBOL", outcome.rows.iter().map(|row| row.symbol.as_str()));
    let balance_width = column_width("BALANCE", outcome.rows.iter().map(|row| row.balance.as_str()));

    writeln!(
        out,
        "{:<sw$}  {:>bw$}  {:<42}  NAME",
        "SYMBOL",
        "BALANCE",
        "CONTRACT",
        sw = symbol_width,
        bw = balance_width
    )?;
    for row in &outcome.rows {
        writeln!(
            out,
            "{:<sw$}  {:>bw$}  {:<42}  {}",
            row.symbol,
            row.balance,
            row.contract,
            row.name.as_deref().unwrap_or("--"),
            sw = symbol_width,
            bw = balance_width
        )?;
    }

    Ok(outcome.rows.len())
}

fn column_width<'a>(header: &str, values: impl Iterator<Item = &'a str>) -> usize {
    values
        .map(|value| value.chars().count())
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0)
}
