//! Tool Execution Subsystem
//!
//! This module sits directly in front of subprocess execution. It accepts
//! externally supplied tool arguments and guarantees that none of them can
//! escape their argument position to inject or chain commands.
//!
//! # Security Features
//!
//! - **Input Validation**: Every argument is checked against the rule for its role
//! - **List Invocation**: Commands are executed as argument vectors, never through a shell
//! - **Timeout Enforcement**: Every execution has a timeout and kills the process on expiry
//! - **Cancellation**: A cancelled call kills its process and reports `Cancelled`
//! - **Resource Limits**: Optional cap on concurrently running processes
//!
//! # Architecture
//!
//! A call flows through the pipeline once:
//! `validator` -> `command` -> `executor` -> `envelope`.
//!
//! - `validator.rs`: Argument roles and validation rules
//! - `command.rs`: Typed operation requests and argument vector building
//! - `executor.rs`: Subprocess execution with timeout and cancellation
//! - `timeout.rs`: Timeout management
//! - `envelope.rs`: Uniform success/error responses
//! - `error.rs`: Error classification
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use tailscale_mcp::tools::{execute, ExecutionTimeout, OperationRequest, ResponseEnvelope};
//!
//! #[tokio::main]
//! async fn main() {
//!     let request = match OperationRequest::ping("my-server", Some(3.0)) {
//!         Ok(request) => request,
//!         Err(e) => {
//!             eprintln!("{}", e);
//!             return;
//!         }
//!     };
//!
//!     let timeout = ExecutionTimeout::default();
//!     let result = execute(Path::new("tailscale"), &request.build(), timeout).await;
//!     let envelope = ResponseEnvelope::from_result(result);
//!     println!("success: {}", envelope.is_success());
//! }
//! ```

mod command;
mod envelope;
mod error;
mod executor;
mod timeout;
mod validator;

pub use command::{ArgumentVector, OperationRequest, RawUpOptions, UpOptions};
pub use envelope::ResponseEnvelope;
pub use error::ErrorKind;
pub use executor::{
    execute, never_cancel, CancelSignal, ExecutionError, ExecutionOutcome, ProcessRunner,
    TokioProcessRunner, MAX_OUTPUT_SIZE,
};
pub use timeout::{ExecutionTimeout, DEFAULT_TIMEOUT_SECS};
pub use validator::{
    validate_count, validate_routes, validate_token, ArgumentRole, Count, OpaqueToken, RouteList,
    ValidationError, DANGEROUS_CHARS, MAX_COUNT, MAX_TOKEN_LENGTH, MIN_COUNT,
};
