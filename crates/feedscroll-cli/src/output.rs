//! Writing the result table to stdout or a file.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use feedscroll::{ResultTable, COLUMNS};

use crate::config::OutputFormat;

/// Write `table` in `format` to `writer`.
pub fn write_table<W: Write>(
    table: &ResultTable,
    format: OutputFormat,
    mut writer: W,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, &table.rows)?;
            writeln!(writer)?;
        }
        OutputFormat::Jsonl => {
            for row in &table.rows {
                serde_json::to_writer(&mut writer, row)?;
                writeln!(writer)?;
            }
        }
        OutputFormat::Csv => write_delimited(table, b',', &mut writer)?,
        OutputFormat::Table => write_delimited(table, b'\t', &mut writer)?,
    }
    writer.flush()?;
    Ok(())
}

/// Header of [`COLUMNS`], then one row per record. Cells holding the
/// delimiter, quotes or line breaks are quoted.
fn write_delimited<W: Write>(table: &ResultTable, delimiter: u8, writer: W) -> Result<()> {
    let mut out = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_writer(writer);
    out.write_record(COLUMNS)
        .context("failed to write header row")?;
    for row in &table.rows {
        out.serialize(row)
            .with_context(|| format!("failed to write row for {}", row.url))?;
    }
    out.flush()?;
    Ok(())
}

/// Write to `path`, or stdout when no path is given.
pub fn emit(table: &ResultTable, format: OutputFormat, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create output file: {}", path.display()))?;
            write_table(table, format, BufWriter::new(file))
                .with_context(|| format!("failed to write {}", path.display()))
        }
        None => write_table(table, format, io::stdout().lock()),
    }
}
