//! # Dispatcher
//!
//! 结果分发模块。
//!
//! 负责：
//! - 收集输出步骤的行数据
//! - 根据 produced files / job kind / 行数推断输出策略
//! - 将唯一一份序列化结果写入 `OutputSink`

pub mod collector;
pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod mime;
pub mod resolver;
pub mod serializer;
pub mod sinks;
pub mod strategy;

pub use collector::{row_channel, RowReceiver, RowSender};
pub use contracts::{OutputSink, OutputStrategy};
pub use dispatcher::{DispatchOutcome, DispatcherBuilder, ResultDispatcher};
pub use error::DispatcherError;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use mime::MimeTable;
pub use resolver::LocalFileResolver;
pub use serializer::JsonSerializer;
pub use sinks::{FileSink, FileSinkConfig, LogSink, MemorySink, ResponseHeaders, WriterSink};
pub use strategy::classify;
