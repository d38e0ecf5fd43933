//! Output strategy classification
//!
//! Inferred rules, first match wins:
//! 1. produced files present -> `Files`
//! 2. job -> `JobResult`
//! 3. transformation with exactly one row -> `ScalarCell`
//! 4. anything else -> `RowSetJson`

use contracts::{ExecutionResult, JobKind, OutputMode, OutputStrategy, RowSet};

/// Pick the strategy for a finished execution
///
/// Total over all inputs; never fails.
pub fn classify(
    mode: OutputMode,
    kind: JobKind,
    result: &ExecutionResult,
    rows: &RowSet,
) -> OutputStrategy {
    select(
        mode,
        kind,
        result.file_count(),
        rows.len(),
        rows.schema_count(),
    )
}

/// Forced strategy when the mode pins one, inferred from the counts otherwise
pub fn select(
    mode: OutputMode,
    kind: JobKind,
    file_count: usize,
    row_count: usize,
    schema_count: usize,
) -> OutputStrategy {
    forced(mode).unwrap_or_else(|| infer(kind, file_count, row_count, schema_count))
}

/// Strategy pinned by an explicit output mode, `None` when inferred
pub fn forced(mode: OutputMode) -> Option<OutputStrategy> {
    match mode {
        OutputMode::Inferred => None,
        OutputMode::ResultOnly => Some(OutputStrategy::JobResult),
        OutputMode::ResultFiles => Some(OutputStrategy::Files),
        OutputMode::SingleCell => Some(OutputStrategy::ScalarCell),
        OutputMode::Json => Some(OutputStrategy::RowSetJson),
    }
}

/// The produced-file count is the only discriminant for the files rule.
pub fn infer(
    kind: JobKind,
    file_count: usize,
    row_count: usize,
    schema_count: usize,
) -> OutputStrategy {
    if file_count > 0 {
        return OutputStrategy::Files;
    }
    match kind {
        JobKind::Job => OutputStrategy::JobResult,
        JobKind::Transformation if row_count == 1 && schema_count == 1 => {
            OutputStrategy::ScalarCell
        }
        JobKind::Transformation => OutputStrategy::RowSetJson,
    }
}
