//! Error boundary
//!
//! The one place where failures become status codes. Library errors are
//! classified by [`ErrorKind`]; the resulting body is printed to stderr as
//! JSON and the process exits nonzero.

use std::process::ExitCode;

use apki_config::ConfigError;
use apki_core::{ErrorKind, GraphError};
use serde::Serialize;

/// Error body printed for a failed command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub code: String,
    pub status: u16,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reason: String,
}

/// Status code for an error kind.
pub fn status_for(kind: ErrorKind) -> u16 {
    match kind {
        ErrorKind::Query => 400,
        ErrorKind::Source => 502,
        ErrorKind::StorageInit | ErrorKind::StorageWrite | ErrorKind::StorageRead => 500,
    }
}

/// Classify a command error into a response body.
pub fn error_body(err: &anyhow::Error) -> ErrorBody {
    let (code, status) = if let Some(graph) = err.downcast_ref::<GraphError>() {
        let kind = graph.kind();
        (kind.code().to_string(), status_for(kind))
    } else if err.downcast_ref::<ConfigError>().is_some() {
        ("config".to_string(), 400)
    } else {
        (String::new(), 500)
    };

    ErrorBody {
        message: err.to_string(),
        code,
        status,
        reason: err.root_cause().to_string(),
    }
}

/// Process exit code for a status.
fn exit_code(status: u16) -> u8 {
    match status {
        400..=499 => 2,
        _ => 1,
    }
}

/// Print `err` as an error body on stderr and return the exit code.
pub fn report(err: &anyhow::Error) -> ExitCode {
    let body = error_body(err);
    tracing::error!(
        status = body.status,
        code = %body.code,
        reason = %body.reason,
        "{}",
        body.message
    );

    match serde_json::to_string(&body) {
        Ok(json) => eprintln!("{}", json),
        Err(_) => eprintln!("error: {}", body.message),
    }
    ExitCode::from(exit_code(body.status))
}
