//! Tracing and logging setup shared by the catalog binaries.

/// Initialize process-wide tracing.
///
/// `RUST_LOG` wins when set; otherwise `fallback_filter` is used. Safe to
/// call multiple times; subsequent calls become no-ops.
pub fn init(fallback_filter: &str) -> bool {
    tracing::init(fallback_filter)
}

/// Subscriber configuration (filters, JSON formatting).
pub mod tracing;
