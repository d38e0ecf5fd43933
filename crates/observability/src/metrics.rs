//! 结果分发指标收集模块
//!
//! 基于 `metrics` facade 记录分发策略、结果状态与输出字节数。

use metrics::{counter, histogram};

/// 记录一次分发结果
///
/// 每次 `ResultDispatcher::dispatch` 完成策略执行后调用。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_dispatch;
///
/// let outcome = dispatcher.dispatch(&mut sink)?;
/// record_dispatch(outcome.strategy().as_str(), outcome.status(), outcome.bytes_written());
/// ```
pub fn record_dispatch(strategy: &str, status: &str, bytes_written: u64) {
    counter!(
        "result_dispatch_total",
        "strategy" => strategy.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    if bytes_written > 0 {
        counter!(
            "result_dispatch_bytes_written_total",
            "strategy" => strategy.to_string()
        )
        .increment(bytes_written);
    }
}

/// 记录收集到的行数
pub fn record_rows_collected(rows: usize) {
    histogram!("result_dispatch_rows_collected").record(rows as f64);
}

/// 记录生命周期误用 (重复 dispatch / 未设置结果)
pub fn record_config_error(reason: &str) {
    counter!(
        "result_dispatch_config_errors_total",
        "reason" => reason.to_string()
    )
    .increment(1);
}
