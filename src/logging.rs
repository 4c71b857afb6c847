//! Logging utilities for cubesource.
//!
//! This module provides structured logging helpers so that index builds,
//! cache activity and resample runs produce searchable, machine-readable
//! records.

use chrono::NaiveDateTime;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Initialize the tracing subscriber with the given log level
pub fn init_tracing(log_level: &str) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(val) => val,
        Err(_) => log_level.to_string(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}

/// Log a start message for a significant operation
pub fn log_operation_start(operation: &str, details: Option<&str>) {
    if let Some(details) = details {
        info!(
            operation = operation,
            details = details,
            "Starting operation"
        );
    } else {
        info!(operation = operation, "Starting operation");
    }
}

/// Log the completion of a significant operation
pub fn log_operation_end(operation: &str, start_time: Instant, success: bool) {
    let duration = start_time.elapsed();
    let duration_ms = duration.as_secs_f64() * 1000.0;

    if success {
        info!(
            operation = operation,
            duration_ms = duration_ms,
            "Operation completed successfully"
        );
    } else {
        warn!(
            operation = operation,
            duration_ms = duration_ms,
            "Operation failed"
        );
    }
}

/// Log an operation with timing and result in a single statement
pub fn log_timed_operation<F, R>(operation: &str, f: F) -> R
where
    F: FnOnce() -> R,
{
    let start = Instant::now();
    let operation_id = Uuid::new_v4();

    debug!(
        operation = operation,
        operation_id = %operation_id,
        "Starting operation"
    );

    let result = f();

    info!(
        operation = operation,
        operation_id = %operation_id,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Operation completed"
    );

    result
}

/// Log a summary of a freshly built time-range index
pub fn log_index_stats(
    provider: &str,
    file_count: usize,
    entry_count: usize,
    coverage: Option<(NaiveDateTime, NaiveDateTime)>,
) {
    match coverage {
        Some((start, end)) => info!(
            operation = "index",
            provider = provider,
            files = file_count,
            entries = entry_count,
            coverage_start = %start,
            coverage_end = %end,
            "Source time ranges computed"
        ),
        None => warn!(
            operation = "index",
            provider = provider,
            files = file_count,
            "No source time ranges found"
        ),
    }
}

/// Log a summary of one resample run
pub fn log_resample_stats(
    source_shape: (usize, usize),
    dest_shape: (usize, usize),
    tile_count: usize,
    row_kernel: &str,
    col_kernel: &str,
    start_time: Instant,
) {
    debug!(
        operation = "resample",
        source_shape = ?source_shape,
        dest_shape = ?dest_shape,
        tiles = tile_count,
        row_kernel = row_kernel,
        col_kernel = col_kernel,
        duration_ms = start_time.elapsed().as_secs_f64() * 1000.0,
        "Resampled image"
    );
}

/// Log an error with context
pub fn log_error(error: &crate::error::CubeSourceError, context: &str) {
    error!(
        error = %error,
        context = context,
        error_type = std::any::type_name_of_val(error),
        "Error occurred"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_log_timed_operation() {
        // This is more of a functional test to ensure it doesn't panic
        let result = log_timed_operation("test_operation", || {
            std::thread::sleep(Duration::from_millis(1));
            42
        });

        assert_eq!(result, 42);
    }

    #[test]
    fn test_log_helpers_do_not_panic() {
        let start = Instant::now();
        log_operation_start("prepare", Some("aerosols"));
        log_operation_end("prepare", start, true);
        log_index_stats("aerosols", 0, 0, None);
        log_resample_stats((720, 1440), (180, 360), 8, "area", "area", start);
        log_error(
            &crate::error::CubeSourceError::Config {
                message: "bad".to_string(),
            },
            "test",
        );
    }
}
