//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 模拟 e2e 测试（模拟引擎 -> 行通道 -> 分发器 -> sink）

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{DispatcherConfig, ExecutionResult, OutputMode, ProducedFile};

    #[test]
    fn test_default_config_snapshot() {
        let json = serde_json::to_value(DispatcherConfig::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "output_mode": "inferred",
                "output_step_name": "OUTPUT",
                "download_requested": false,
                "pretty_json": false,
                "mime_overrides": {}
            })
        );
    }

    #[test]
    fn test_legacy_mode_spelling_is_accepted() {
        let config =
            ConfigLoader::load_from_str("output_mode = \"infered\"\n", ConfigFormat::Toml)
                .unwrap();
        assert_eq!(config.output_mode, OutputMode::Inferred);
    }

    #[test]
    fn test_execution_result_wire_fields() {
        let result = ExecutionResult::success().with_file(ProducedFile::from_path("/tmp/a.csv"));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["produced_files"][0]["base_name"], "a.csv");
        assert_eq!(json["produced_files"][0]["extension"], "csv");
        assert!(json.get("log_text").is_none());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::fs;

    use contracts::{
        CellValue, DispatcherConfig, ExecutionResult, JobKind, ProducedFile, Row, RowSchema,
    };
    use dispatcher::{
        row_channel, DispatchOutcome, DispatcherError, FileSink, FileSinkConfig, MemorySink,
        OutputStrategy, ResponseHeaders, ResultDispatcher,
    };
    use tempfile::tempdir;

    /// Simulated engine: emits rows from the output step (and some noise
    /// from another step), then hands over the result.
    async fn run_engine(
        dispatcher: &mut ResultDispatcher,
        rows: Vec<Row>,
        noise: usize,
        result: ExecutionResult,
    ) {
        let names = ["c0", "c1"];
        let (tx, rx) = row_channel(dispatcher.output_step_name(), 2);

        let producer = tokio::spawn(async move {
            for i in 0..noise {
                let row = vec![CellValue::Integer(i as i64)];
                tx.store_row_from("LOOKUP", row, RowSchema::default())
                    .await
                    .unwrap();
            }
            for row in rows {
                let schema = RowSchema::infer(&names[..row.len().min(names.len())], &row);
                tx.store_row_from("OUTPUT", row, schema).await.unwrap();
            }
        });

        let collected = rx.collect().await;
        producer.await.unwrap();

        dispatcher.store_rows(collected);
        dispatcher.set_result(result).unwrap();
    }

    fn transformation() -> ResultDispatcher {
        ResultDispatcher::new(JobKind::Transformation, DispatcherConfig::default())
    }

    #[tokio::test]
    async fn test_e2e_single_file_streamed_to_file_sink() {
        let dir = tempdir().unwrap();
        let produced = dir.path().join("report.csv");
        let content = b"id,name\n1,alpha\n2,beta\n".to_vec();
        fs::write(&produced, &content).unwrap();

        let config = DispatcherConfig {
            download_requested: true,
            ..DispatcherConfig::default()
        };
        let mut dispatcher = ResultDispatcher::new(JobKind::Transformation, config);
        let result = ExecutionResult::success().with_file(ProducedFile::from_path(&produced));
        run_engine(&mut dispatcher, vec![vec![CellValue::Integer(1)]], 0, result).await;

        let sink_config = FileSinkConfig {
            path: dir.path().join("out").join("body.bin"),
            write_headers: true,
        };
        let mut sink = FileSink::new("response", sink_config.clone()).unwrap();
        let outcome = dispatcher.dispatch(&mut sink).unwrap();

        assert!(matches!(
            outcome,
            DispatchOutcome::Delivered {
                strategy: OutputStrategy::Files,
                bytes_written,
            } if bytes_written == content.len() as u64
        ));
        assert_eq!(fs::read(&sink_config.path).unwrap(), content);

        let headers: ResponseHeaders =
            serde_json::from_slice(&fs::read(sink_config.headers_path()).unwrap()).unwrap();
        assert_eq!(headers.mime_type, "text/csv");
        assert_eq!(headers.filename.as_deref(), Some("report.csv"));
    }

    #[tokio::test]
    async fn test_e2e_file_without_download_sets_mime_only() {
        let dir = tempdir().unwrap();
        let produced = dir.path().join("chart.png");
        fs::write(&produced, [0x89, b'P', b'N', b'G']).unwrap();

        let mut dispatcher = ResultDispatcher::new(JobKind::Job, DispatcherConfig::default());
        let result = ExecutionResult::success().with_file(ProducedFile::from_path(&produced));
        run_engine(&mut dispatcher, Vec::new(), 0, result).await;

        let mut sink = MemorySink::new("memory");
        assert!(dispatcher.dispatch(&mut sink).unwrap().is_delivered());
        assert_eq!(sink.headers(), Some(&ResponseHeaders::new("image/png", None)));
        assert_eq!(sink.body(), &[0x89, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn test_e2e_job_result_ignores_rows() {
        let mut dispatcher = ResultDispatcher::new(JobKind::Job, DispatcherConfig::default());
        let rows = vec![vec![CellValue::Integer(1)], vec![CellValue::Integer(2)]];
        run_engine(&mut dispatcher, rows, 0, ExecutionResult::failure(3)).await;

        let mut sink = MemorySink::new("memory");
        let outcome = dispatcher.dispatch(&mut sink).unwrap();
        assert_eq!(outcome.strategy(), OutputStrategy::JobResult);

        let doc: ExecutionResult = serde_json::from_slice(sink.body()).unwrap();
        assert!(!doc.success);
        assert_eq!(doc.nr_errors, 3);
    }

    #[tokio::test]
    async fn test_e2e_single_cell_written_as_text() {
        let mut dispatcher = transformation();
        run_engine(
            &mut dispatcher,
            vec![vec![CellValue::Integer(42)]],
            3,
            ExecutionResult::success(),
        )
        .await;

        let mut sink = MemorySink::new("memory");
        let outcome = dispatcher.dispatch(&mut sink).unwrap();
        assert_eq!(outcome.strategy(), OutputStrategy::ScalarCell);
        assert_eq!(sink.body(), b"42");
    }

    #[tokio::test]
    async fn test_e2e_row_set_in_arrival_order() {
        let mut dispatcher = transformation();
        let rows = vec![
            vec![CellValue::Integer(1), CellValue::String("a".into())],
            vec![CellValue::Integer(2), CellValue::String("b".into())],
        ];
        run_engine(&mut dispatcher, rows, 1, ExecutionResult::success()).await;

        let mut sink = MemorySink::new("memory");
        let outcome = dispatcher.dispatch(&mut sink).unwrap();
        assert_eq!(outcome.strategy(), OutputStrategy::RowSetJson);

        let doc: serde_json::Value = serde_json::from_slice(sink.body()).unwrap();
        assert_eq!(doc, serde_json::json!([[1, "a"], [2, "b"]]));
    }

    #[tokio::test]
    async fn test_e2e_empty_transformation_serializes_empty_set() {
        let mut dispatcher = transformation();
        run_engine(&mut dispatcher, Vec::new(), 2, ExecutionResult::success()).await;

        let mut sink = MemorySink::new("memory");
        let outcome = dispatcher.dispatch(&mut sink).unwrap();
        assert_eq!(outcome.strategy(), OutputStrategy::RowSetJson);
        assert_eq!(sink.body_text(), "[]");
    }

    #[tokio::test]
    async fn test_e2e_second_dispatch_rejected() {
        let mut dispatcher = transformation();
        run_engine(
            &mut dispatcher,
            vec![vec![CellValue::Integer(7)]],
            0,
            ExecutionResult::success(),
        )
        .await;

        let mut first = MemorySink::new("first");
        assert!(dispatcher.dispatch(&mut first).unwrap().is_delivered());

        let mut second = MemorySink::new("second");
        let err = dispatcher.dispatch(&mut second).unwrap_err();
        assert!(matches!(err, DispatcherError::AlreadyDispatched { .. }));
        assert!(err.is_configuration());
        assert!(second.body().is_empty());
        assert!(second.headers().is_none());
    }

    #[tokio::test]
    async fn test_e2e_multiple_files_unsupported() {
        let dir = tempdir().unwrap();
        let mut result = ExecutionResult::success();
        for name in ["a.csv", "b.csv"] {
            let path = dir.path().join(name);
            fs::write(&path, b"x").unwrap();
            result = result.with_file(ProducedFile::from_path(&path));
        }

        let mut dispatcher = ResultDispatcher::new(JobKind::Job, DispatcherConfig::default());
        run_engine(&mut dispatcher, Vec::new(), 0, result).await;

        let mut sink = MemorySink::new("memory");
        let outcome = dispatcher.dispatch(&mut sink).unwrap();
        assert!(matches!(
            outcome,
            DispatchOutcome::Unsupported { file_count: 2 }
        ));
        assert!(!outcome.is_delivered());
        assert!(sink.body().is_empty());
    }

    #[tokio::test]
    async fn test_e2e_missing_file_aborts_without_output() {
        let dir = tempdir().unwrap();
        let result = ExecutionResult::success()
            .with_file(ProducedFile::from_path(dir.path().join("gone.pdf")));

        let mut dispatcher = ResultDispatcher::new(JobKind::Job, DispatcherConfig::default());
        run_engine(&mut dispatcher, Vec::new(), 0, result).await;

        let mut sink = MemorySink::new("memory");
        let outcome = dispatcher.dispatch(&mut sink).unwrap();
        assert_eq!(outcome.status(), "aborted");
        assert_eq!(outcome.bytes_written(), 0);
        assert!(sink.body().is_empty());
    }
}
