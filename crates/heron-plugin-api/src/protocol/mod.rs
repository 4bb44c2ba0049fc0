//! Wire protocol types for host-plugin communication.
//!
//! The protocol is a single-line JSONL exchange over stdio. The host writes
//! one [`PluginRequest`] line to the plugin's stdin and closes it. The
//! plugin writes one [`PluginResponse`] line to stdout and exits. Plugin
//! stderr is captured by the host for diagnostic logging but is not part of
//! the protocol.
//!
//! Uploaded files never travel inside the envelope: the host saves them to
//! shared temporary storage and passes the resulting paths as string
//! arguments. Produced artifacts travel the same way, as a
//! [`PluginOutput::Artifact`] naming the path the host streams from.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::metadata::PluginMetadata;
use crate::schema::ArgumentSchema;

/// Request sent from the host to a plugin on stdin.
///
/// Serialised as a single JSONL line terminated by a newline character.
///
/// # Example
///
/// ```
/// use heron_plugin_api::PluginRequest;
///
/// let request = PluginRequest::new("metadata");
/// assert_eq!(request.operation(), "metadata");
/// assert!(request.arguments().is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PluginRequest {
    operation: String,
    #[serde(default)]
    arguments: HashMap<String, serde_json::Value>,
}

impl PluginRequest {
    /// Creates a request for the given operation with no arguments.
    #[must_use]
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            arguments: HashMap::new(),
        }
    }

    /// Creates a request with arguments.
    #[must_use]
    pub fn with_arguments(
        operation: impl Into<String>,
        arguments: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            operation: operation.into(),
            arguments,
        }
    }

    /// Returns the operation name.
    #[must_use]
    pub const fn operation(&self) -> &str {
        self.operation.as_str()
    }

    /// Returns the arguments map.
    #[must_use]
    pub const fn arguments(&self) -> &HashMap<String, serde_json::Value> {
        &self.arguments
    }
}

/// Response sent from a plugin to the host on stdout.
///
/// Serialised as a single JSONL line terminated by a newline character.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PluginResponse {
    success: bool,
    output: PluginOutput,
    #[serde(default)]
    diagnostics: Vec<PluginDiagnostic>,
}

impl PluginResponse {
    /// Creates a successful response with the given output.
    #[must_use]
    pub const fn success(output: PluginOutput) -> Self {
        Self {
            success: true,
            output,
            diagnostics: Vec::new(),
        }
    }

    /// Creates a failed response with diagnostics.
    #[must_use]
    pub const fn failure(diagnostics: Vec<PluginDiagnostic>) -> Self {
        Self {
            success: false,
            output: PluginOutput::Empty,
            diagnostics,
        }
    }

    /// Returns whether the plugin completed successfully.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.success
    }

    /// Returns the operation output.
    #[must_use]
    pub const fn output(&self) -> &PluginOutput {
        &self.output
    }

    /// Returns the diagnostic messages.
    #[must_use]
    pub fn diagnostics(&self) -> &[PluginDiagnostic] {
        &self.diagnostics
    }
}

/// Output payload from a plugin operation.
///
/// The `kind` field acts as a discriminator for JSON serialisation so the
/// host can tell which entry point produced the payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PluginOutput {
    /// The descriptive record backing the plugin description page.
    Metadata {
        /// The metadata record.
        record: PluginMetadata,
    },
    /// The argument schema backing the submission form.
    Schema {
        /// The declared prediction arguments.
        arguments: ArgumentSchema,
    },
    /// A produced artifact left on shared temporary storage.
    Artifact {
        /// Path the host streams the response body from.
        path: PathBuf,
        /// Media type the host reports for the body.
        media_type: String,
    },
    /// Empty output (failure responses carry diagnostics instead).
    Empty,
}

/// A diagnostic message emitted by a plugin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PluginDiagnostic {
    severity: DiagnosticSeverity,
    message: String,
}

impl PluginDiagnostic {
    /// Creates a diagnostic with the given severity and message.
    #[must_use]
    pub fn new(severity: DiagnosticSeverity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    /// Returns the severity level.
    #[must_use]
    pub const fn severity(&self) -> DiagnosticSeverity {
        self.severity
    }

    /// Returns the message text.
    #[must_use]
    pub const fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Severity level for plugin diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticSeverity {
    /// A fatal error that prevented the operation from completing.
    Error,
    /// A non-fatal warning.
    Warning,
    /// An informational message.
    Info,
}
