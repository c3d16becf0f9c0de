//! Error Taxonomy
//!
//! Every failure surfaced by the tool core is classified by an [`ErrorKind`].
//! The kind travels inside the response envelope so callers can tell a value
//! we rejected apart from a value the external program rejected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a failed operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A token contained a shell metacharacter or control character
    InvalidCharacter,

    /// A token looked like an absolute, parent-relative or home path
    InvalidPathTraversal,

    /// A token exceeded the maximum length
    InvalidLength,

    /// A count was not an integer in the allowed range
    InvalidCount,

    /// A route entry was not lexically `<ip>/<prefix>`
    InvalidRouteFormat,

    /// The external program could not be started
    SpawnFailure,

    /// The external program did not finish in time and was killed
    Timeout,

    /// The call was cancelled and the external program was killed
    Cancelled,

    /// The external program ran and exited with a non-zero status
    NonZeroExit,

    /// Structured data returned by the program could not be parsed
    ParseFailure,
}

impl ErrorKind {
    /// Whether this kind is produced by local validation, before any process exists
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidCharacter
                | ErrorKind::InvalidPathTraversal
                | ErrorKind::InvalidLength
                | ErrorKind::InvalidCount
                | ErrorKind::InvalidRouteFormat
        )
    }

    /// Stable snake_case name, matching the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidCharacter => "invalid_character",
            ErrorKind::InvalidPathTraversal => "invalid_path_traversal",
            ErrorKind::InvalidLength => "invalid_length",
            ErrorKind::InvalidCount => "invalid_count",
            ErrorKind::InvalidRouteFormat => "invalid_route_format",
            ErrorKind::SpawnFailure => "spawn_failure",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::NonZeroExit => "non_zero_exit",
            ErrorKind::ParseFailure => "parse_failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
