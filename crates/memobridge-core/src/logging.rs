//! Structured logging schema and field name constants for memobridge.
//!
//! All crates use these constants for consistent structured logging fields,
//! so a log pipeline can filter by the same names across the client, the
//! batch engine and the relay.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | An operation failed and nothing was applied |
//! | WARN  | Partial outcome or skipped work (failed batch items, unknown tags) |
//! | INFO  | Operation completions (note created, batch finished) |
//! | DEBUG | Decision points, request parameters, parsed directives |
//! | TRACE | Per-item iteration (each token, each batch member) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID for one batch run.
/// Format: UUIDv7 (time-ordered).
pub const BATCH_ID: &str = "batch_id";

/// Subsystem originating the log event.
/// Values: "client", "batch", "relay", "parse"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "memos", "rename_tag", "bulk_visibility", "session_store"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "list_notes", "update_note", "publish"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Remote note id being operated on.
pub const NOTE_ID: &str = "note_id";

/// Remote resource id being operated on.
pub const RESOURCE_ID: &str = "resource_id";

/// Tag name being operated on.
pub const TAG: &str = "tag";

/// Chat session the operation belongs to.
pub const SESSION: &str = "session";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of items returned by a query.
pub const RESULT_COUNT: &str = "result_count";

/// Number of members dispatched in a batch.
pub const TARGET_COUNT: &str = "target_count";

/// Number of batch members that failed.
pub const FAILED_COUNT: &str = "failed_count";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Every field name above, for schema checks in log pipelines.
pub const ALL_FIELDS: &[&str] = &[
    BATCH_ID,
    SUBSYSTEM,
    COMPONENT,
    OPERATION,
    NOTE_ID,
    RESOURCE_ID,
    TAG,
    SESSION,
    DURATION_MS,
    RESULT_COUNT,
    TARGET_COUNT,
    FAILED_COUNT,
    SUCCESS,
    ERROR_MSG,
];
