//! Response Envelope
//!
//! Uniform success/error wrapper returned from every tool operation.
//! Constructors uphold the invariant that a successful envelope carries data
//! and no error, and a failed envelope always carries an error message.

use super::error::ErrorKind;
use super::executor::{ExecutionError, ExecutionOutcome};
use super::validator::ValidationError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;

/// Deserialization checks the same invariants the constructors uphold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseEnvelope<T> {
    success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,

    /// Unparsed standard error, kept for diagnostics
    #[serde(skip_serializing_if = "Option::is_none")]
    stderr: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<ErrorKind>,
}

/// Wire shape of an envelope before its invariants are checked
#[derive(Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct RawEnvelope<T> {
    success: bool,
    #[serde(default)]
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    stderr: Option<String>,
    #[serde(default)]
    error_kind: Option<ErrorKind>,
}

impl<T> RawEnvelope<T> {
    fn check(self) -> Result<ResponseEnvelope<T>, String> {
        if self.success {
            if self.data.is_none() {
                return Err("successful envelope must carry data".to_string());
            }
            if self.error.is_some() || self.error_kind.is_some() {
                return Err("successful envelope must not carry an error".to_string());
            }
        } else {
            if self.error.is_none() {
                return Err("failed envelope must carry an error".to_string());
            }
            if self.data.is_some() {
                return Err("failed envelope must not carry data".to_string());
            }
        }
        Ok(ResponseEnvelope {
            success: self.success,
            data: self.data,
            error: self.error,
            stderr: self.stderr,
            error_kind: self.error_kind,
        })
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for ResponseEnvelope<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawEnvelope::deserialize(deserializer)?
            .check()
            .map_err(serde::de::Error::custom)
    }
}

impl<T> ResponseEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            stderr: None,
            error_kind: None,
        }
    }

    pub fn failure(kind: ErrorKind, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            stderr: None,
            error_kind: Some(kind),
        }
    }

    /// Attach standard error text, ignored when empty
    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        let stderr = stderr.into();
        self.stderr = if stderr.is_empty() { None } else { Some(stderr) };
        self
    }

    pub fn from_validation(err: &ValidationError) -> Self {
        Self::failure(err.kind(), err.to_string())
    }

    pub fn from_execution(err: &ExecutionError) -> Self {
        Self::failure(err.kind(), err.to_string())
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn stderr(&self) -> Option<&str> {
        self.stderr.as_deref()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error_kind
    }

    /// Whether this envelope failed in local validation, before any process ran
    pub fn is_validation_failure(&self) -> bool {
        self.error_kind.is_some_and(|k| k.is_validation())
    }

    /// Convert the payload, keeping error and stderr as they are
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ResponseEnvelope<U> {
        ResponseEnvelope {
            success: self.success,
            data: self.data.map(f),
            error: self.error,
            stderr: self.stderr,
            error_kind: self.error_kind,
        }
    }

    /// Parse a successful payload; a parse failure becomes a failed envelope
    pub fn and_then_parse<U, E, F>(self, what: &str, parse: F) -> ResponseEnvelope<U>
    where
        E: Display,
        F: FnOnce(T) -> Result<U, E>,
    {
        let stderr = self.stderr;
        let parsed = match (self.success, self.data) {
            (true, Some(data)) => match parse(data) {
                Ok(value) => ResponseEnvelope::ok(value),
                Err(e) => ResponseEnvelope::failure(
                    ErrorKind::ParseFailure,
                    format!("Failed to parse {} data: {}", what, e),
                ),
            },
            _ => ResponseEnvelope {
                success: false,
                data: None,
                error: self.error,
                stderr: None,
                error_kind: self.error_kind,
            },
        };
        ResponseEnvelope { stderr, ..parsed }
    }
}

impl ResponseEnvelope<String> {
    /// Envelope for a process that ran to completion
    ///
    /// A non-zero exit reports stderr, falling back to stdout, as the error.
    pub fn from_outcome(outcome: ExecutionOutcome) -> Self {
        if outcome.exited_zero {
            return Self::ok(outcome.stdout).with_stderr(outcome.stderr);
        }

        let error = if !outcome.stderr.is_empty() {
            outcome.stderr.clone()
        } else if !outcome.stdout.is_empty() {
            outcome.stdout
        } else {
            match outcome.exit_code {
                Some(code) => format!("Command exited with status {}", code),
                None => "Command terminated by signal".to_string(),
            }
        };
        Self::failure(ErrorKind::NonZeroExit, error).with_stderr(outcome.stderr)
    }

    pub fn from_result(result: Result<ExecutionOutcome, ExecutionError>) -> Self {
        match result {
            Ok(outcome) => Self::from_outcome(outcome),
            Err(err) => Self::from_execution(&err),
        }
    }

    /// Parse a successful JSON payload into `U`
    pub fn parse_json<U: DeserializeOwned>(self, what: &str) -> ResponseEnvelope<U> {
        self.and_then_parse(what, |data| serde_json::from_str::<U>(&data))
    }
}
