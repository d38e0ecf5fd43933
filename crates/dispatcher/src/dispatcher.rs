//! ResultDispatcher - classifies a finished execution and writes one output

use std::io::{self, Write};

use tracing::{debug, error, info, instrument, warn};

use contracts::{
    ContractError, DispatcherConfig, ExecutionResult, FileResolver, JobKind, MimeLookup,
    OutputSink, OutputStrategy, ProducedFile, Row, RowSchema, RowSet, RowSetBuilder,
    StructuredSerializer,
};

use crate::error::DispatcherError;
use crate::mime::MimeTable;
use crate::resolver::LocalFileResolver;
use crate::serializer::JsonSerializer;
use crate::strategy;

const DEFAULT_EXECUTION_LABEL: &str = "execution";

/// Outcome of a single dispatch
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Strategy ran to completion
    Delivered {
        strategy: OutputStrategy,
        bytes_written: u64,
    },
    /// Strategy failed; bytes already flushed are left as they are
    Aborted {
        strategy: OutputStrategy,
        bytes_written: u64,
        error: ContractError,
    },
    /// More than one produced file; no bundling is available
    Unsupported { file_count: usize },
}

impl DispatchOutcome {
    pub fn strategy(&self) -> OutputStrategy {
        match self {
            Self::Delivered { strategy, .. } | Self::Aborted { strategy, .. } => *strategy,
            Self::Unsupported { .. } => OutputStrategy::Files,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Delivered { .. } => "delivered",
            Self::Aborted { .. } => "aborted",
            Self::Unsupported { .. } => "unsupported",
        }
    }

    pub fn bytes_written(&self) -> u64 {
        match self {
            Self::Delivered { bytes_written, .. } | Self::Aborted { bytes_written, .. } => {
                *bytes_written
            }
            Self::Unsupported { .. } => 0,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    pub fn error(&self) -> Option<&ContractError> {
        match self {
            Self::Aborted { error, .. } => Some(error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DispatchPhase {
    Collecting,
    Dispatched,
}

/// Builder for creating a ResultDispatcher
pub struct DispatcherBuilder {
    execution: String,
    kind: JobKind,
    config: DispatcherConfig,
    mime: Option<Box<dyn MimeLookup + Send>>,
    files: Option<Box<dyn FileResolver + Send>>,
    serializer: Option<Box<dyn StructuredSerializer + Send>>,
}

impl DispatcherBuilder {
    /// Create a new DispatcherBuilder
    pub fn new(kind: JobKind, config: DispatcherConfig) -> Self {
        Self {
            execution: DEFAULT_EXECUTION_LABEL.to_string(),
            kind,
            config,
            mime: None,
            files: None,
            serializer: None,
        }
    }

    /// Label attached to every log event of this dispatcher
    pub fn execution(mut self, label: impl Into<String>) -> Self {
        self.execution = label.into();
        self
    }

    pub fn mime_lookup(mut self, mime: impl MimeLookup + Send + 'static) -> Self {
        self.mime = Some(Box::new(mime));
        self
    }

    pub fn file_resolver(mut self, files: impl FileResolver + Send + 'static) -> Self {
        self.files = Some(Box::new(files));
        self
    }

    pub fn serializer(mut self, serializer: impl StructuredSerializer + Send + 'static) -> Self {
        self.serializer = Some(Box::new(serializer));
        self
    }

    /// Build the dispatcher, filling unset collaborators with defaults
    #[instrument(name = "dispatcher_builder_build", skip(self), fields(execution = %self.execution))]
    pub fn build(self) -> ResultDispatcher {
        let mime = self
            .mime
            .unwrap_or_else(|| Box::new(MimeTable::with_overrides(&self.config.mime_overrides)));
        let files = self
            .files
            .unwrap_or_else(|| Box::new(LocalFileResolver::new()));
        let serializer = self
            .serializer
            .unwrap_or_else(|| Box::new(JsonSerializer::new(self.config.pretty_json)));

        debug!(
            kind = %self.kind,
            mode = %self.config.output_mode,
            output_step = %self.config.output_step_name,
            download = self.config.download_requested,
            "Dispatcher created"
        );

        ResultDispatcher {
            execution: self.execution,
            kind: self.kind,
            config: self.config,
            mime,
            files,
            serializer,
            rows: RowSetBuilder::new(),
            result: None,
            phase: DispatchPhase::Collecting,
        }
    }
}

/// Per-execution dispatcher: collects rows, takes the result, dispatches once
pub struct ResultDispatcher {
    execution: String,
    kind: JobKind,
    config: DispatcherConfig,
    mime: Box<dyn MimeLookup + Send>,
    files: Box<dyn FileResolver + Send>,
    serializer: Box<dyn StructuredSerializer + Send>,
    rows: RowSetBuilder,
    result: Option<ExecutionResult>,
    phase: DispatchPhase,
}

impl ResultDispatcher {
    /// Dispatcher with default collaborators
    pub fn new(kind: JobKind, config: DispatcherConfig) -> Self {
        DispatcherBuilder::new(kind, config).build()
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn execution(&self) -> &str {
        &self.execution
    }

    /// Whether the engine must attach a row listener to the output step
    pub fn needs_row_listener(&self) -> bool {
        self.config.output_mode.needs_rows()
    }

    pub fn output_step_name(&self) -> &str {
        &self.config.output_step_name
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_dispatched(&self) -> bool {
        self.phase == DispatchPhase::Dispatched
    }

    pub fn result(&self) -> Option<&ExecutionResult> {
        self.result.as_ref()
    }

    /// Store one row from the output step
    pub fn store_row(&mut self, row: Row, schema: RowSchema) {
        if self.is_dispatched() {
            warn!(execution = %self.execution, "Row stored after dispatch, ignored");
            return;
        }
        self.rows.push(row, schema);
    }

    /// Store a row emitted by `step`; only the configured output step counts.
    ///
    /// Returns whether the row was stored.
    pub fn store_row_from(&mut self, step: &str, row: Row, schema: RowSchema) -> bool {
        if step != self.config.output_step_name {
            debug!(
                execution = %self.execution,
                step,
                output_step = %self.config.output_step_name,
                "Row from non-output step skipped"
            );
            return false;
        }
        if self.is_dispatched() {
            warn!(execution = %self.execution, "Row stored after dispatch, ignored");
            return false;
        }
        self.rows.push(row, schema);
        true
    }

    /// Append rows collected elsewhere (e.g. through a row channel)
    pub fn store_rows(&mut self, rows: RowSet) {
        if self.is_dispatched() {
            warn!(execution = %self.execution, rows = rows.len(), "Rows stored after dispatch, ignored");
            return;
        }
        self.rows.extend(rows);
    }

    /// Hand over the final execution result
    ///
    /// # Errors
    /// `ResultAlreadySet` when called more than once
    pub fn set_result(&mut self, result: ExecutionResult) -> Result<(), DispatcherError> {
        if self.result.is_some() || self.is_dispatched() {
            error!(execution = %self.execution, "Execution result set twice");
            observability::metrics::record_config_error("result_already_set");
            return Err(DispatcherError::result_already_set(&self.execution));
        }
        self.result = Some(result);
        Ok(())
    }

    /// Strategy that dispatch would pick right now
    pub fn preview_strategy(&self) -> Option<OutputStrategy> {
        let result = self.result.as_ref()?;
        Some(strategy::select(
            self.config.output_mode,
            self.kind,
            result.file_count(),
            self.rows.len(),
            self.rows.schema_count(),
        ))
    }

    /// Classify the result and write exactly one output to `sink`
    ///
    /// Strategy failures are logged and reported through the outcome; only
    /// lifecycle misuse returns `Err`.
    ///
    /// # Errors
    /// - `AlreadyDispatched` on a second call
    /// - `ResultNotSet` when no execution result was handed over
    #[instrument(
        name = "result_dispatch",
        skip(self, sink),
        fields(execution = %self.execution, kind = %self.kind, sink = %sink.name())
    )]
    pub fn dispatch<S: OutputSink + ?Sized>(
        &mut self,
        sink: &mut S,
    ) -> Result<DispatchOutcome, DispatcherError> {
        if self.is_dispatched() {
            error!(execution = %self.execution, "Dispatch invoked twice");
            observability::metrics::record_config_error("already_dispatched");
            return Err(DispatcherError::already_dispatched(&self.execution));
        }
        let Some(result) = self.result.take() else {
            error!(execution = %self.execution, "Dispatch invoked before the result was set");
            observability::metrics::record_config_error("result_not_set");
            return Err(DispatcherError::result_not_set(&self.execution));
        };

        self.phase = DispatchPhase::Dispatched;
        let rows = std::mem::take(&mut self.rows).freeze();

        let chosen = strategy::classify(self.config.output_mode, self.kind, &result, &rows);
        info!(
            strategy = %chosen,
            mode = %self.config.output_mode,
            files = result.file_count(),
            rows = rows.len(),
            "Output strategy selected"
        );

        let outcome = match chosen {
            OutputStrategy::Files => self.deliver_files(&result, sink),
            OutputStrategy::JobResult => {
                let encoded = self.serializer.serialize_result(&result);
                self.deliver_document(chosen, encoded, sink)
            }
            OutputStrategy::ScalarCell => self.deliver_scalar(&rows, sink),
            OutputStrategy::RowSetJson => {
                let encoded = self.serializer.serialize_rows(&rows);
                self.deliver_document(chosen, encoded, sink)
            }
        };

        self.result = Some(result);
        self.report(&outcome);
        Ok(outcome)
    }

    fn deliver_files<S: OutputSink + ?Sized>(
        &self,
        result: &ExecutionResult,
        sink: &mut S,
    ) -> DispatchOutcome {
        match result.produced_files.as_slice() {
            [] => {
                warn!(execution = %self.execution, "Processing result files but no files found");
                aborted(OutputStrategy::Files, 0, ContractError::NoProducedFiles)
            }
            [file] => self.stream_file(file, sink),
            files => DispatchOutcome::Unsupported {
                file_count: files.len(),
            },
        }
    }

    fn stream_file<S: OutputSink + ?Sized>(
        &self,
        file: &ProducedFile,
        sink: &mut S,
    ) -> DispatchOutcome {
        let chosen = OutputStrategy::Files;
        let mime_type = self.mime.mime_type_for(&file.extension);
        let filename = self
            .config
            .download_requested
            .then_some(file.base_name.as_str());

        if let Err(e) = sink.set_headers(mime_type, filename) {
            return aborted(chosen, 0, e);
        }

        let mut reader = match self.files.open(file) {
            Ok(reader) => reader,
            Err(e) => return aborted(chosen, 0, e),
        };

        let mut writer = SinkWriter::new(sink);
        let copied = io::copy(&mut reader, &mut writer);
        let written = writer.written;
        match copied {
            Ok(_) => {}
            Err(e) => {
                let error = writer
                    .error
                    .take()
                    .unwrap_or_else(|| ContractError::file_read(&file.location, e.to_string()));
                return aborted(chosen, written, error);
            }
        }

        match sink.flush() {
            Ok(()) => DispatchOutcome::Delivered {
                strategy: chosen,
                bytes_written: written,
            },
            Err(e) => aborted(chosen, written, e),
        }
    }

    fn deliver_scalar<S: OutputSink + ?Sized>(
        &self,
        rows: &RowSet,
        sink: &mut S,
    ) -> DispatchOutcome {
        let chosen = OutputStrategy::ScalarCell;
        let Some(entry) = rows.first() else {
            return aborted(chosen, 0, ContractError::empty_result("no rows to render"));
        };
        let Some(cell) = entry.row.first() else {
            return aborted(chosen, 0, ContractError::empty_result("first row has no cells"));
        };
        if rows.len() > 1 || entry.row.len() > 1 {
            debug!(
                rows = rows.len(),
                cells = entry.row.len(),
                "Single cell output ignores remaining cells"
            );
        }

        let text = cell.to_string();
        write_all(chosen, text.as_bytes(), sink)
    }

    fn deliver_document<S: OutputSink + ?Sized>(
        &self,
        chosen: OutputStrategy,
        encoded: Result<Vec<u8>, ContractError>,
        sink: &mut S,
    ) -> DispatchOutcome {
        match encoded {
            Ok(bytes) => write_all(chosen, &bytes, sink),
            Err(e) => aborted(chosen, 0, e),
        }
    }

    fn report(&self, outcome: &DispatchOutcome) {
        let chosen = outcome.strategy();
        match outcome {
            DispatchOutcome::Delivered { bytes_written, .. } => {
                info!(
                    execution = %self.execution,
                    strategy = %chosen,
                    bytes = bytes_written,
                    "Result dispatched"
                );
            }
            DispatchOutcome::Aborted {
                bytes_written,
                error,
                ..
            } if error.is_io() => {
                warn!(
                    execution = %self.execution,
                    strategy = %chosen,
                    bytes = bytes_written,
                    error = %error,
                    "Failed to copy output to sink"
                );
            }
            DispatchOutcome::Aborted {
                bytes_written,
                error,
                ..
            } => {
                error!(
                    execution = %self.execution,
                    strategy = %chosen,
                    bytes = bytes_written,
                    error = %error,
                    "Output strategy aborted"
                );
            }
            DispatchOutcome::Unsupported { file_count } => {
                warn!(
                    execution = %self.execution,
                    file_count,
                    "Output of multiple result files is not supported"
                );
            }
        }

        observability::metrics::record_dispatch(
            chosen.as_str(),
            outcome.status(),
            outcome.bytes_written(),
        );
    }
}

fn aborted(strategy: OutputStrategy, bytes_written: u64, error: ContractError) -> DispatchOutcome {
    DispatchOutcome::Aborted {
        strategy,
        bytes_written,
        error,
    }
}

fn write_all<S: OutputSink + ?Sized>(
    chosen: OutputStrategy,
    bytes: &[u8],
    sink: &mut S,
) -> DispatchOutcome {
    if let Err(e) = sink.write(bytes) {
        return aborted(chosen, 0, e);
    }
    let written = bytes.len() as u64;
    match sink.flush() {
        Ok(()) => DispatchOutcome::Delivered {
            strategy: chosen,
            bytes_written: written,
        },
        Err(e) => aborted(chosen, written, e),
    }
}

/// `io::Write` adapter over a sink, keeping the sink's own error
struct SinkWriter<'a, S: OutputSink + ?Sized> {
    sink: &'a mut S,
    written: u64,
    error: Option<ContractError>,
}

impl<'a, S: OutputSink + ?Sized> SinkWriter<'a, S> {
    fn new(sink: &'a mut S) -> Self {
        Self {
            sink,
            written: 0,
            error: None,
        }
    }
}

impl<S: OutputSink + ?Sized> Write for SinkWriter<'_, S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.sink.write(buf) {
            Ok(()) => {
                self.written += buf.len() as u64;
                Ok(buf.len())
            }
            Err(e) => {
                let message = e.to_string();
                self.error = Some(e);
                Err(io::Error::other(message))
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::MemorySink;
    use contracts::{CellValue, FieldMeta, OutputMode, ValueType};
    use std::fs;
    use std::io::Read;
    use tempfile::tempdir;

    fn transformation() -> ResultDispatcher {
        ResultDispatcher::new(JobKind::Transformation, DispatcherConfig::default())
    }

    fn schema(names: &[&str]) -> RowSchema {
        RowSchema::new(
            names
                .iter()
                .map(|n| FieldMeta::new(*n, ValueType::String))
                .collect(),
        )
    }

    fn write_file(dir: &std::path::Path, name: &str, content: &[u8]) -> ProducedFile {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        ProducedFile::from_path(path)
    }

    /// Sink failing on every write
    struct FailingSink {
        headers: bool,
    }

    impl OutputSink for FailingSink {
        fn name(&self) -> &str {
            "failing"
        }

        fn set_headers(&mut self, _: &str, _: Option<&str>) -> Result<(), ContractError> {
            self.headers = true;
            Ok(())
        }

        fn write(&mut self, _: &[u8]) -> Result<(), ContractError> {
            Err(ContractError::sink_write("failing", "connection reset"))
        }

        fn flush(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    /// Resolver whose stream breaks after a first chunk
    struct TruncatedResolver;

    struct Truncated {
        sent: bool,
    }

    impl Read for Truncated {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.sent {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "disk gone"));
            }
            self.sent = true;
            buf[..4].copy_from_slice(b"head");
            Ok(4)
        }
    }

    impl FileResolver for TruncatedResolver {
        fn open(&self, _: &ProducedFile) -> Result<Box<dyn Read + '_>, ContractError> {
            Ok(Box::new(Truncated { sent: false }))
        }
    }

    #[test]
    fn test_single_file_streams_bytes_verbatim() {
        let dir = tempdir().unwrap();
        let content: Vec<u8> = (0..=255u8).cycle().take(20_000).collect();
        let file = write_file(dir.path(), "export.csv", &content);

        let mut dispatcher = transformation();
        dispatcher
            .set_result(ExecutionResult::success().with_file(file))
            .unwrap();
        dispatcher.store_row(vec![CellValue::Integer(1)], schema(&["x"]));

        let mut sink = MemorySink::new("mem");
        let outcome = dispatcher.dispatch(&mut sink).unwrap();

        assert!(outcome.is_delivered());
        assert_eq!(outcome.strategy(), OutputStrategy::Files);
        assert_eq!(outcome.bytes_written(), content.len() as u64);
        assert_eq!(sink.body(), content.as_slice());
        let headers = sink.headers().unwrap();
        assert_eq!(headers.mime_type, "text/csv");
        assert_eq!(headers.filename, None);
    }

    #[test]
    fn test_download_sets_suggested_filename() {
        let dir = tempdir().unwrap();
        let file = write_file(dir.path(), "report.pdf", b"%PDF-1.4");

        let config = DispatcherConfig {
            download_requested: true,
            ..DispatcherConfig::default()
        };
        let mut dispatcher = ResultDispatcher::new(JobKind::Job, config);
        dispatcher
            .set_result(ExecutionResult::success().with_file(file))
            .unwrap();

        let mut sink = MemorySink::new("mem");
        dispatcher.dispatch(&mut sink).unwrap();

        let headers = sink.headers().unwrap();
        assert_eq!(headers.mime_type, "application/pdf");
        assert_eq!(headers.filename.as_deref(), Some("report.pdf"));
        assert_eq!(sink.body(), b"%PDF-1.4");
    }

    #[test]
    fn test_unknown_extension_uses_octet_stream() {
        let dir = tempdir().unwrap();
        let file = write_file(dir.path(), "blob.xyz", b"\x00\x01");

        let mut dispatcher = transformation();
        dispatcher
            .set_result(ExecutionResult::success().with_file(file))
            .unwrap();
        let mut sink = MemorySink::new("mem");
        dispatcher.dispatch(&mut sink).unwrap();

        assert_eq!(
            sink.headers().unwrap().mime_type,
            contracts::DEFAULT_MIME_TYPE
        );
    }

    #[test]
    fn test_missing_file_is_aborted_not_raised() {
        let mut dispatcher = transformation();
        dispatcher
            .set_result(
                ExecutionResult::success()
                    .with_file(ProducedFile::from_path("/no/such/dir/out.txt")),
            )
            .unwrap();

        let mut sink = MemorySink::new("mem");
        let outcome = dispatcher.dispatch(&mut sink).unwrap();

        assert!(matches!(
            outcome.error(),
            Some(ContractError::FileOpen { .. })
        ));
        assert!(sink.body().is_empty());
    }

    #[test]
    fn test_broken_file_stream_keeps_partial_output() {
        let mut dispatcher = DispatcherBuilder::new(JobKind::Transformation, Default::default())
            .file_resolver(TruncatedResolver)
            .build();
        dispatcher
            .set_result(ExecutionResult::success().with_file(ProducedFile::from_path("x.txt")))
            .unwrap();

        let mut sink = MemorySink::new("mem");
        let outcome = dispatcher.dispatch(&mut sink).unwrap();

        assert!(matches!(
            outcome.error(),
            Some(ContractError::FileRead { .. })
        ));
        assert_eq!(outcome.bytes_written(), 4);
        assert_eq!(sink.body(), b"head");
    }

    #[test]
    fn test_multiple_files_are_unsupported() {
        let dir = tempdir().unwrap();
        let a = write_file(dir.path(), "a.txt", b"a");
        let b = write_file(dir.path(), "b.txt", b"b");

        let mut dispatcher = transformation();
        dispatcher
            .set_result(ExecutionResult::success().with_file(a).with_file(b))
            .unwrap();

        let mut sink = MemorySink::new("mem");
        let outcome = dispatcher.dispatch(&mut sink).unwrap();

        assert!(matches!(
            outcome,
            DispatchOutcome::Unsupported { file_count: 2 }
        ));
        assert!(!outcome.is_delivered());
        assert!(sink.body().is_empty());
        assert!(sink.headers().is_none());
    }

    #[test]
    fn test_job_serializes_result_regardless_of_rows() {
        let mut dispatcher = ResultDispatcher::new(JobKind::Job, DispatcherConfig::default());
        dispatcher.store_row(vec![CellValue::Integer(42)], schema(&["answer"]));
        let result = ExecutionResult {
            lines_written: 7,
            ..ExecutionResult::success()
        };
        dispatcher.set_result(result.clone()).unwrap();

        let mut sink = MemorySink::new("mem");
        let outcome = dispatcher.dispatch(&mut sink).unwrap();

        assert_eq!(outcome.strategy(), OutputStrategy::JobResult);
        assert!(sink.headers().is_none());
        let decoded: ExecutionResult = serde_json::from_slice(sink.body()).unwrap();
        assert_eq!(decoded, result);
    }

    #[test]
    fn test_single_cell_written_as_text() {
        let mut dispatcher = transformation();
        dispatcher.store_row(vec![CellValue::Integer(42)], schema(&["answer"]));
        dispatcher.set_result(ExecutionResult::success()).unwrap();

        let mut sink = MemorySink::new("mem");
        let outcome = dispatcher.dispatch(&mut sink).unwrap();

        assert_eq!(outcome.strategy(), OutputStrategy::ScalarCell);
        assert_eq!(sink.body(), b"42");
        assert!(sink.headers().is_none());
    }

    #[test]
    fn test_single_cell_utf8_text() {
        let mut dispatcher = transformation();
        dispatcher.store_row(vec![CellValue::String("héllo €".into())], schema(&["s"]));
        dispatcher.set_result(ExecutionResult::success()).unwrap();

        let mut sink = MemorySink::new("mem");
        dispatcher.dispatch(&mut sink).unwrap();
        assert_eq!(sink.body(), "héllo €".as_bytes());
    }

    #[test]
    fn test_single_row_with_empty_cells_aborts() {
        let mut dispatcher = transformation();
        dispatcher.store_row(vec![], RowSchema::default());
        dispatcher.set_result(ExecutionResult::success()).unwrap();

        let mut sink = MemorySink::new("mem");
        let outcome = dispatcher.dispatch(&mut sink).unwrap();
        assert!(matches!(
            outcome.error(),
            Some(ContractError::EmptyResult { .. })
        ));
        assert!(sink.body().is_empty());
    }

    #[test]
    fn test_multiple_rows_serialized_in_order() {
        let mut dispatcher = transformation();
        dispatcher.store_row(
            vec![CellValue::Integer(1), CellValue::String("a".into())],
            schema(&["id", "name"]),
        );
        dispatcher.store_row(
            vec![CellValue::Integer(2), CellValue::String("b".into())],
            schema(&["id", "name"]),
        );
        dispatcher.set_result(ExecutionResult::success()).unwrap();

        let mut sink = MemorySink::new("mem");
        let outcome = dispatcher.dispatch(&mut sink).unwrap();

        assert_eq!(outcome.strategy(), OutputStrategy::RowSetJson);
        assert_eq!(sink.body_text(), r#"[[1,"a"],[2,"b"]]"#);
    }

    #[test]
    fn test_zero_rows_serialized_as_empty_document() {
        let mut dispatcher = transformation();
        dispatcher.set_result(ExecutionResult::success()).unwrap();

        let mut sink = MemorySink::new("mem");
        let outcome = dispatcher.dispatch(&mut sink).unwrap();

        assert_eq!(outcome.strategy(), OutputStrategy::RowSetJson);
        assert_eq!(sink.body_text(), "[]");
    }

    #[test]
    fn test_serialization_failure_writes_nothing() {
        let mut dispatcher = transformation();
        dispatcher.store_row(vec![CellValue::Number(1.0)], schema(&["v"]));
        dispatcher.store_row(vec![CellValue::Number(f64::NAN)], schema(&["v"]));
        dispatcher.set_result(ExecutionResult::success()).unwrap();

        let mut sink = MemorySink::new("mem");
        let outcome = dispatcher.dispatch(&mut sink).unwrap();

        assert!(matches!(
            outcome.error(),
            Some(ContractError::Serialization { .. })
        ));
        assert_eq!(outcome.bytes_written(), 0);
        assert!(sink.body().is_empty());
    }

    #[test]
    fn test_sink_failure_is_contained() {
        let mut dispatcher = transformation();
        dispatcher.store_row(vec![CellValue::Integer(5)], schema(&["n"]));
        dispatcher.set_result(ExecutionResult::success()).unwrap();

        let mut sink = FailingSink { headers: false };
        let outcome = dispatcher.dispatch(&mut sink).unwrap();
        assert!(matches!(
            outcome.error(),
            Some(ContractError::SinkWrite { .. })
        ));
        assert!(!sink.headers);
    }

    #[test]
    fn test_second_dispatch_is_rejected() {
        let mut dispatcher = transformation();
        dispatcher.set_result(ExecutionResult::success()).unwrap();

        let mut sink = MemorySink::new("mem");
        dispatcher.dispatch(&mut sink).unwrap();
        let err = dispatcher.dispatch(&mut sink).unwrap_err();

        assert!(matches!(err, DispatcherError::AlreadyDispatched { .. }));
        assert!(err.is_configuration());
        assert_eq!(sink.body_text(), "[]");
    }

    #[test]
    fn test_dispatch_without_result_is_rejected() {
        let mut dispatcher = transformation();
        let mut sink = MemorySink::new("mem");
        let err = dispatcher.dispatch(&mut sink).unwrap_err();

        assert!(matches!(err, DispatcherError::ResultNotSet { .. }));
        assert!(!dispatcher.is_dispatched());
        assert!(sink.body().is_empty());
    }

    #[test]
    fn test_result_set_twice_is_rejected() {
        let mut dispatcher = transformation();
        dispatcher.set_result(ExecutionResult::success()).unwrap();
        let err = dispatcher
            .set_result(ExecutionResult::failure(1))
            .unwrap_err();
        assert!(matches!(err, DispatcherError::ResultAlreadySet { .. }));
        assert!(dispatcher.result().unwrap().success);
    }

    #[test]
    fn test_rows_after_dispatch_are_ignored() {
        let mut dispatcher = transformation();
        dispatcher.set_result(ExecutionResult::success()).unwrap();
        dispatcher.dispatch(&mut MemorySink::new("mem")).unwrap();

        dispatcher.store_row(vec![CellValue::Integer(1)], schema(&["x"]));
        assert_eq!(dispatcher.row_count(), 0);
    }

    #[test]
    fn test_only_output_step_rows_are_stored() {
        let mut dispatcher = transformation();
        assert!(!dispatcher.store_row_from("Sort rows", vec![CellValue::Integer(1)], schema(&["x"])));
        assert!(dispatcher.store_row_from("OUTPUT", vec![CellValue::Integer(2)], schema(&["x"])));
        dispatcher.set_result(ExecutionResult::success()).unwrap();

        let mut sink = MemorySink::new("mem");
        dispatcher.dispatch(&mut sink).unwrap();
        assert_eq!(sink.body(), b"2");
    }

    #[test]
    fn test_forced_result_files_without_files() {
        let config = DispatcherConfig {
            output_mode: OutputMode::ResultFiles,
            ..DispatcherConfig::default()
        };
        let mut dispatcher = ResultDispatcher::new(JobKind::Job, config);
        assert!(!dispatcher.needs_row_listener());
        dispatcher.set_result(ExecutionResult::success()).unwrap();

        let mut sink = MemorySink::new("mem");
        let outcome = dispatcher.dispatch(&mut sink).unwrap();
        assert!(matches!(
            outcome.error(),
            Some(ContractError::NoProducedFiles)
        ));
    }

    #[test]
    fn test_forced_single_cell_takes_first_cell() {
        let config = DispatcherConfig {
            output_mode: OutputMode::SingleCell,
            ..DispatcherConfig::default()
        };
        let mut dispatcher = ResultDispatcher::new(JobKind::Transformation, config);
        dispatcher.store_row(
            vec![CellValue::String("first".into()), CellValue::Integer(9)],
            schema(&["a", "b"]),
        );
        dispatcher.store_row(vec![CellValue::String("second".into())], schema(&["a"]));
        dispatcher.set_result(ExecutionResult::success()).unwrap();

        let mut sink = MemorySink::new("mem");
        dispatcher.dispatch(&mut sink).unwrap();
        assert_eq!(sink.body(), b"first");
    }

    #[test]
    fn test_preview_matches_dispatch() {
        let mut dispatcher = transformation();
        assert_eq!(dispatcher.preview_strategy(), None);
        dispatcher.store_row(vec![CellValue::Integer(1)], schema(&["x"]));
        dispatcher.set_result(ExecutionResult::success()).unwrap();
        assert_eq!(
            dispatcher.preview_strategy(),
            Some(OutputStrategy::ScalarCell)
        );

        let outcome = dispatcher.dispatch(&mut MemorySink::new("mem")).unwrap();
        assert_eq!(outcome.strategy(), OutputStrategy::ScalarCell);
    }

    #[test]
    fn test_preview_agrees_with_dispatch_across_inputs() {
        let dir = tempdir().unwrap();
        let cases: Vec<(JobKind, OutputMode, usize, bool)> = vec![
            (JobKind::Transformation, OutputMode::Inferred, 0, false),
            (JobKind::Transformation, OutputMode::Inferred, 1, false),
            (JobKind::Transformation, OutputMode::Inferred, 3, false),
            (JobKind::Transformation, OutputMode::Inferred, 1, true),
            (JobKind::Job, OutputMode::Inferred, 2, false),
            (JobKind::Job, OutputMode::Json, 1, false),
            (JobKind::Transformation, OutputMode::SingleCell, 2, false),
        ];

        for (kind, mode, rows, with_file) in cases {
            let config = DispatcherConfig {
                output_mode: mode,
                ..DispatcherConfig::default()
            };
            let mut dispatcher = ResultDispatcher::new(kind, config);
            for i in 0..rows {
                dispatcher.store_row(vec![CellValue::Integer(i as i64)], schema(&["n"]));
            }
            let mut result = ExecutionResult::success();
            if with_file {
                result = result.with_file(write_file(dir.path(), "out.txt", b"x"));
            }
            dispatcher.set_result(result).unwrap();

            let preview = dispatcher.preview_strategy();
            let outcome = dispatcher.dispatch(&mut MemorySink::new("mem")).unwrap();
            assert_eq!(
                preview,
                Some(outcome.strategy()),
                "kind={kind} mode={mode} rows={rows} file={with_file}"
            );
        }
    }
}
