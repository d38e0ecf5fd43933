//! `dispatch` command implementation.

use anyhow::{Context, Result};
use contracts::OutputSink;
use dispatcher::{
    row_channel, DispatchOutcome, DispatcherBuilder, FileSink, FileSinkConfig, LocalFileResolver,
    LogSink, ResultDispatcher, WriterSink,
};
use tracing::{debug, info, warn};

use crate::cli::{DispatchArgs, SinkKind};
use crate::error::CliError;
use crate::input::ExecutionRecord;

use super::load_config;

/// Execute the `dispatch` command
pub async fn run_dispatch(args: &DispatchArgs) -> Result<()> {
    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let mut config = load_config(args.config.as_deref(), args.mode)?;
    if args.download {
        config.download_requested = true;
    }

    info!(input = %args.input.display(), "Loading execution record");
    let record = ExecutionRecord::load(&args.input)?;

    let label = args
        .input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "execution".to_string());

    let mut builder = DispatcherBuilder::new(record.kind, config).execution(label);
    if let Some(ref dir) = args.files_dir {
        builder = builder.file_resolver(LocalFileResolver::with_base_dir(dir));
    }
    let mut dispatcher = builder.build();

    collect_rows(&mut dispatcher, &record, args.buffer_size).await?;
    dispatcher.set_result(record.result)?;

    let mut sink = open_sink(args)?;
    let outcome = dispatcher.dispatch(sink.as_mut())?;

    print_summary(&outcome);
    check_outcome(outcome)
}

/// Feed the record's rows through the collector, the same way a running engine would
async fn collect_rows(
    dispatcher: &mut ResultDispatcher,
    record: &ExecutionRecord,
    buffer_size: usize,
) -> Result<()> {
    if !dispatcher.needs_row_listener() {
        debug!(
            mode = %dispatcher.config().output_mode,
            "Output mode ignores rows, skipping collection"
        );
        return Ok(());
    }

    let (tx, rx) = row_channel(dispatcher.output_step_name(), buffer_size.max(1));
    let step = record
        .step
        .clone()
        .unwrap_or_else(|| dispatcher.output_step_name().to_string());
    let rows: Vec<_> = record
        .rows
        .iter()
        .map(|row| (row.clone(), record.schema_for(row)))
        .collect();

    let producer = tokio::spawn(async move {
        let mut accepted = 0usize;
        for (row, schema) in rows {
            if tx.store_row_from(&step, row, schema).await? {
                accepted += 1;
            }
        }
        Ok::<_, contracts::ContractError>(accepted)
    });

    let collected = rx.collect().await;
    let accepted = producer.await.context("Row producer task panicked")??;
    if accepted < record.rows.len() {
        warn!(
            ignored = record.rows.len() - accepted,
            step = ?record.step,
            "Rows from a non-output step were ignored"
        );
    }

    dispatcher.store_rows(collected);
    Ok(())
}

fn open_sink(args: &DispatchArgs) -> Result<Box<dyn OutputSink>> {
    let sink: Box<dyn OutputSink> = match args.sink {
        SinkKind::Stdout => Box::new(WriterSink::stdout("stdout")),
        SinkKind::Log => Box::new(LogSink::new("log")),
        SinkKind::File => {
            let path = args
                .output
                .clone()
                .context("--output is required for the file sink")?;
            let config = FileSinkConfig {
                path,
                write_headers: true,
            };
            let sink = FileSink::new("file", config).map_err(CliError::from)?;
            Box::new(sink)
        }
    };
    Ok(sink)
}

fn print_summary(outcome: &DispatchOutcome) {
    match outcome {
        DispatchOutcome::Unsupported { file_count } => {
            eprintln!("✗ Dispatch unsupported: {file_count} produced files");
        }
        other => {
            let mark = if other.is_delivered() { "✓" } else { "✗" };
            eprintln!(
                "{mark} Dispatch {}: strategy={} bytes={}",
                other.status(),
                other.strategy(),
                other.bytes_written()
            );
        }
    }
}

fn check_outcome(outcome: DispatchOutcome) -> Result<()> {
    match outcome {
        DispatchOutcome::Delivered { .. } => Ok(()),
        DispatchOutcome::Aborted {
            strategy, error, ..
        } => Err(CliError::dispatch_failed(strategy, "aborted", error.to_string()).into()),
        DispatchOutcome::Unsupported { file_count } => Err(CliError::dispatch_failed(
            contracts::OutputStrategy::Files,
            "unsupported",
            format!("{file_count} produced files, only one can be streamed"),
        )
        .into()),
    }
}
