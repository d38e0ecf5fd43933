//! `classify` command implementation.

use anyhow::{Context, Result};
use contracts::{DispatcherConfig, JobKind, OutputMode, OutputStrategy, RowSet};
use serde::Serialize;

use crate::cli::ClassifyArgs;
use crate::input::ExecutionRecord;

use super::load_config;

/// Classification report for JSON output
#[derive(Debug, Serialize)]
struct ClassifyReport {
    kind: JobKind,
    mode: OutputMode,
    strategy: OutputStrategy,
    produced_files: usize,
    rows: usize,
}

/// Execute the `classify` command
pub fn run_classify(args: &ClassifyArgs) -> Result<()> {
    let config = load_config(args.config.as_deref(), args.mode)?;
    let record = ExecutionRecord::load(&args.input)?;
    let report = classify_record(&config, &record);

    if args.json {
        let json =
            serde_json::to_string_pretty(&report).context("Failed to serialize classification")?;
        println!("{}", json);
    } else {
        println!("Strategy: {}", report.strategy);
        println!("\n  Kind: {}", report.kind);
        println!("  Mode: {}", report.mode);
        println!("  Produced files: {}", report.produced_files);
        println!("  Rows: {}", report.rows);
    }

    Ok(())
}

/// Rows from a step other than the output step are dropped, as `dispatch` does.
fn classify_record(config: &DispatcherConfig, record: &ExecutionRecord) -> ClassifyReport {
    let mode = config.output_mode;
    let step = record
        .step
        .as_deref()
        .unwrap_or(config.output_step_name.as_str());
    let rows: RowSet = if mode.needs_rows() && step == config.output_step_name {
        record
            .rows
            .iter()
            .map(|row| (row.clone(), record.schema_for(row)))
            .collect()
    } else {
        RowSet::empty()
    };

    ClassifyReport {
        kind: record.kind,
        mode,
        strategy: dispatcher::classify(mode, record.kind, &record.result, &rows),
        produced_files: record.result.file_count(),
        rows: rows.len(),
    }
}
