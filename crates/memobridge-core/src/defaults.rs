//! Centralized default constants for memobridge.
//!
//! All crates reference these constants instead of defining their own
//! magic numbers.

// =============================================================================
// REMOTE API
// =============================================================================

/// Path the credential URL must point at.
pub const CREDENTIAL_PATH: &str = "/api/note";

/// Note collection endpoint (relative to the credential prefix).
pub const NOTE_PATH: &str = "/api/note";

/// Tag collection endpoint.
pub const TAG_PATH: &str = "/api/tag";

/// Tag deletion endpoint (POST with a JSON name).
pub const TAG_DELETE_PATH: &str = "/api/tag/delete";

/// Resource collection endpoint.
pub const RESOURCE_PATH: &str = "/api/resource";

/// Binary resource upload endpoint (multipart).
pub const RESOURCE_BLOB_PATH: &str = "/api/resource/blob";

/// Multipart field name carrying uploaded bytes.
pub const UPLOAD_FIELD: &str = "file";

/// Path segment of the human-facing note link (`{origin}/m/{id}`).
pub const NOTE_LINK_SEGMENT: &str = "/m/";

// =============================================================================
// HTTP CLIENT
// =============================================================================

/// Total timeout for one remote request in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 100;

/// User agent sent with every remote request.
pub const USER_AGENT: &str = concat!("memobridge/", env!("CARGO_PKG_VERSION"));

/// Content type assumed for attachments when the transport gives none.
pub const ATTACHMENT_CONTENT_TYPE: &str = "image/*";

// =============================================================================
// BATCH
// =============================================================================

/// Page size used when a batch query is paged. `None` in the batch config
/// means the remote's own unpaged listing is used instead.
pub const BATCH_PAGE_SIZE: i64 = 200;

// =============================================================================
// SESSIONS
// =============================================================================

/// Directory holding one JSON document per bound chat session.
pub const SESSION_DIR: &str = "db";

/// Environment variable holding the default credential URL.
pub const OPEN_API_ENV: &str = "MEMOBRIDGE_OPEN_API";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_paths_are_absolute() {
        for path in [
            NOTE_PATH,
            TAG_PATH,
            TAG_DELETE_PATH,
            RESOURCE_PATH,
            RESOURCE_BLOB_PATH,
        ] {
            assert!(path.starts_with("/api/"), "{path}");
        }
    }

    #[test]
    fn user_agent_carries_version() {
        assert!(USER_AGENT.starts_with("memobridge/"));
    }
}
