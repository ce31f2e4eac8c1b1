//! Request line classification

use crate::token::state_token;

/// Word that asks a session to move to another coordinator
pub const MIGRATE_MARKER: &str = "migrate";

/// Word that asks a session to bump its counter (the form field name)
pub const UPDATE_MARKER: &str = "person";

/// Path browsers probe on their own; not a session request
pub const FAVICON_PATH: &str = "/favicon.ico";

/// What a session worker should do with a request line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Hand the session off to a coordinator
    Migrate,
    /// Increment the session counter
    Update,
    /// Neither marker present
    Invalid,
}

impl RequestKind {
    /// Classify a request line. The migrate marker takes precedence because a
    /// form submission of "migrate" also carries the update field name.
    pub fn classify(line: &str) -> Self {
        if line.contains(MIGRATE_MARKER) {
            RequestKind::Migrate
        } else if line.contains(UPDATE_MARKER) {
            RequestKind::Update
        } else {
            RequestKind::Invalid
        }
    }
}

/// True for an HTTP request line fetching the favicon
pub fn is_favicon_request(line: &str) -> bool {
    let mut parts = line.split_whitespace();
    matches!(
        (parts.next(), parts.next()),
        (Some("GET"), Some(path)) if path.starts_with(FAVICON_PATH)
    )
}

/// Request line a migrating worker sends to the destination coordinator
pub fn host_request(counter: u64) -> String {
    format!("Please host me. Send my port! {}", state_token(counter))
}
