//! Demonstration prediction plugin for the Heron serving host.
//!
//! This crate implements the three entry points of the host integration
//! contract: [`get_metadata`], [`get_predict_args`], and [`predict`].
//! Inference is deliberately a no-op — the plugin hands the submitted image
//! straight back to the caller, either as the raw bytes or staged next to a
//! fixed notes file inside a zip archive. It exists as a template for
//! integrating real models: replace the identity transform, keep the glue.
//!
//! The crate also ships a one-shot protocol handler compatible with the
//! host's plugin runner: [`run`] reads exactly one JSONL request from
//! stdin, dispatches it to the matching entry point, and writes one JSONL
//! response to stdout.
//!
//! # Example
//!
//! ```
//! use heron_plugin_demo::{get_metadata, get_predict_args};
//!
//! let record = get_metadata();
//! assert!(record.validate().is_ok());
//!
//! let schema = get_predict_args();
//! assert!(schema.validate_value("accept", "application/zip").is_ok());
//! assert!(schema.validate_value("accept", "text/plain").is_err());
//! ```

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use heron_plugin_api::error::guard;
use heron_plugin_api::protocol::{
    DiagnosticSeverity, PluginDiagnostic, PluginOutput, PluginRequest, PluginResponse,
};
use heron_plugin_api::{ArgumentSchema, BadRequest, FieldKind, FieldSpec, PluginMetadata};
use tempfile::TempDir;
use thiserror::Error;
use tracing::debug;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;

/// Tracing target for plugin events.
const PLUGIN_TARGET: &str = "heron_plugin_demo";

/// Argument name the host uses for the uploaded image path.
const INPUT_FIELD: &str = "demo-image";
/// Argument name the host uses for the requested response media type.
const ACCEPT_FIELD: &str = "accept";

/// Operation names recognised by the dispatcher.
const METADATA_OPERATION: &str = "metadata";
const PREDICT_ARGS_OPERATION: &str = "predict_args";
const PREDICT_OPERATION: &str = "predict";

/// Fixed entry names inside the produced archive.
const STAGED_IMAGE_NAME: &str = "demo.png";
const NOTES_NAME: &str = "demo.txt";
const ARCHIVE_NAME: &str = "demo.zip";
const STAGING_DIR_NAME: &str = "payload";

/// Fixed content of the auxiliary notes entry.
const NOTES_TEXT: &str = "Add here any additional information!";

/// Media types a caller may request for the prediction response.
///
/// Unsupported values are unrepresentable: parsing is the only way text
/// enters this type, and parsing rejects anything outside the two declared
/// choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
    /// Return the original image bytes unmodified.
    Image,
    /// Return a zip archive holding the image and a notes file.
    Zip,
}

impl Accept {
    /// Returns the media type string the host reports for the response.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image/*",
            Self::Zip => "application/zip",
        }
    }

    /// Returns every supported media type, in schema declaration order.
    #[must_use]
    pub const fn choices() -> [Self; 2] {
        [Self::Image, Self::Zip]
    }
}

impl std::fmt::Display for Accept {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Accept {
    type Err = PredictError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "image/*" => Ok(Self::Image),
            "application/zip" => Ok(Self::Zip),
            other => Err(PredictError::UnsupportedAccept {
                value: other.to_owned(),
            }),
        }
    }
}

/// Validated prediction request constructed by the host boundary.
///
/// Replaces untyped keyword dispatch with named, typed fields: the path the
/// host saved the upload under, and the parsed response media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictRequest {
    input: PathBuf,
    accept: Accept,
}

impl PredictRequest {
    /// Creates a request for the given upload path and media type.
    #[must_use]
    pub fn new(input: impl Into<PathBuf>, accept: Accept) -> Self {
        Self {
            input: input.into(),
            accept,
        }
    }

    /// Returns the upload path on temporary storage.
    #[must_use]
    pub const fn input(&self) -> &PathBuf {
        &self.input
    }

    /// Returns the requested response media type.
    #[must_use]
    pub const fn accept(&self) -> Accept {
        self.accept
    }
}

/// Open response stream handed back to the host.
///
/// For archive responses the value owns the scoped workspace the artifact
/// lives in: dropping the response (or calling [`PredictResponse::into_body`])
/// removes that storage while the already-open handle stays readable, and
/// [`PredictResponse::keep`] persists it instead for out-of-process handoff.
#[derive(Debug)]
pub struct PredictResponse {
    body: File,
    path: PathBuf,
    accept: Accept,
    workspace: Option<TempDir>,
}

impl PredictResponse {
    /// Returns the media type the host should report for the body.
    #[must_use]
    pub const fn media_type(&self) -> &'static str {
        self.accept.as_str()
    }

    /// Returns the path of the file backing the body.
    #[must_use]
    pub const fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Consumes the response, releasing any scoped temporary storage and
    /// returning the open body handle.
    #[must_use]
    pub fn into_body(self) -> File {
        self.body
    }

    /// Consumes the response, persisting its backing storage on disk, and
    /// returns the open body handle together with the artifact path.
    ///
    /// Cleanup of the persisted files becomes the caller's responsibility;
    /// in practice they live under the system temporary directory and fall
    /// to OS-level cleanup.
    #[must_use]
    pub fn keep(self) -> (File, PathBuf) {
        if let Some(workspace) = self.workspace {
            drop(workspace.keep());
        }
        (self.body, self.path)
    }
}

/// Errors raised while executing a prediction.
#[derive(Debug, Error)]
pub enum PredictError {
    /// The submitted input file could not be opened.
    #[error("failed to open input file '{}': {source}", path.display())]
    OpenInput {
        /// Path the host claimed the upload was saved under.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The scoped packaging workspace could not be created.
    #[error("failed to create packaging workspace: {source}")]
    Workspace {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The input could not be copied into the packaging workspace.
    #[error("failed to stage input file '{}': {source}", path.display())]
    StageInput {
        /// Path of the input being staged.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The auxiliary notes file could not be written.
    #[error("failed to write notes file '{}': {source}", path.display())]
    WriteNotes {
        /// Path of the notes file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The zip archive could not be produced.
    #[error("failed to build archive '{}': {source}", path.display())]
    Archive {
        /// Path of the archive being written.
        path: PathBuf,
        /// Underlying archive error.
        #[source]
        source: ZipError,
    },
    /// The produced archive could not be reopened for streaming.
    #[error("failed to open produced archive '{}': {source}", path.display())]
    OpenArchive {
        /// Path of the produced archive.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The requested media type is not one of the declared choices.
    #[error("unsupported accept value '{value}'; expected one of: image/*, application/zip")]
    UnsupportedAccept {
        /// The rejected value.
        value: String,
    },
}

/// Returns the static descriptive record for the demo plugin.
#[must_use]
pub fn get_metadata() -> PluginMetadata {
    PluginMetadata::new(
        "Heron Authors",
        "A minimal toy prediction plugin for demo and testing purposes. \
         Inference is a no-op: the plugin returns the same inputs it is fed.",
        "MIT",
        "https://github.com/heron-serve/heron-plugin-demo",
        env!("CARGO_PKG_VERSION"),
        "Template plugin showing how to wire a model into the Heron host \
         contract: declare metadata, describe the submission form, and \
         answer predictions.",
    )
}

/// Returns the argument schema for the predict operation.
///
/// One optional file field carries the image; one text field selects the
/// response media type, constrained to the two supported choices.
#[must_use]
pub fn get_predict_args() -> ArgumentSchema {
    ArgumentSchema::new()
        .with_field(
            INPUT_FIELD,
            FieldSpec::new(FieldKind::File, "Image to run the demo inference on."),
        )
        .with_field(
            ACCEPT_FIELD,
            FieldSpec::new(
                FieldKind::Text,
                "Media type(s) that is/are acceptable for the response.",
            )
            .with_choices(
                Accept::choices()
                    .iter()
                    .map(|choice| choice.as_str().to_owned())
                    .collect(),
            ),
        )
}

/// Executes the demo prediction for a validated request.
///
/// "Inference" is the identity transform: the caller gets the submitted
/// image back, either as the raw bytes or staged alongside a fixed notes
/// file inside a zip archive.
///
/// # Errors
///
/// Returns [`BadRequest`] carrying the underlying failure's description if
/// the input cannot be read or the archive cannot be produced.
pub fn predict(request: &PredictRequest) -> Result<PredictResponse, BadRequest> {
    guard(|| execute_predict(request))
}

fn execute_predict(request: &PredictRequest) -> Result<PredictResponse, PredictError> {
    debug!(
        target: PLUGIN_TARGET,
        input = %request.input().display(),
        accept = request.accept().as_str(),
        "executing demo prediction"
    );
    match request.accept() {
        Accept::Image => open_original(request.input()),
        Accept::Zip => package_archive(request.input()),
    }
}

fn open_original(input: &Path) -> Result<PredictResponse, PredictError> {
    let body = File::open(input).map_err(|source| PredictError::OpenInput {
        path: input.to_path_buf(),
        source,
    })?;
    Ok(PredictResponse {
        body,
        path: input.to_path_buf(),
        accept: Accept::Image,
        workspace: None,
    })
}

fn package_archive(input: &Path) -> Result<PredictResponse, PredictError> {
    let workspace = TempDir::new().map_err(|source| PredictError::Workspace { source })?;
    let staging = workspace.path().join(STAGING_DIR_NAME);
    fs::create_dir(&staging).map_err(|source| PredictError::Workspace { source })?;

    fs::copy(input, staging.join(STAGED_IMAGE_NAME)).map_err(|source| {
        PredictError::StageInput {
            path: input.to_path_buf(),
            source,
        }
    })?;

    let notes = staging.join(NOTES_NAME);
    fs::write(&notes, NOTES_TEXT)
        .map_err(|source| PredictError::WriteNotes { path: notes, source })?;

    let archive = workspace.path().join(ARCHIVE_NAME);
    archive_directory(&staging, &archive)?;
    debug!(
        target: PLUGIN_TARGET,
        archive = %archive.display(),
        "packaged prediction artifact"
    );

    let body = File::open(&archive).map_err(|source| PredictError::OpenArchive {
        path: archive.clone(),
        source,
    })?;
    Ok(PredictResponse {
        body,
        path: archive,
        accept: Accept::Zip,
        workspace: Some(workspace),
    })
}

/// Packs every file in `dir` into a zip archive at `dest`, entry names
/// taken from the file names in lexicographic order.
fn archive_directory(dir: &Path, dest: &Path) -> Result<(), PredictError> {
    write_archive(dir, dest).map_err(|source| PredictError::Archive {
        path: dest.to_path_buf(),
        source,
    })
}

fn write_archive(dir: &Path, dest: &Path) -> Result<(), ZipError> {
    let mut writer = ZipWriter::new(File::create(dest)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries = fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(fs::DirEntry::file_name);

    for entry in entries {
        writer.start_file(entry.file_name().to_string_lossy().into_owned(), options)?;
        let mut content = File::open(entry.path())?;
        io::copy(&mut content, &mut writer)?;
    }

    drop(writer.finish()?);
    Ok(())
}

/// Errors raised while dispatching plugin requests.
///
/// These cover only the transport back to the host; operation failures are
/// reported inside the response envelope instead.
#[derive(Debug, Error)]
pub enum PluginDispatchError {
    /// Writing the plugin response to stdout failed.
    #[error("failed to write plugin response: {source}")]
    Write {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Serialising the response payload failed.
    #[error("failed to serialise plugin response: {source}")]
    Serialize {
        /// Underlying serialisation error.
        #[source]
        source: serde_json::Error,
    },
}

/// Executes one plugin request from `stdin` and writes one response to
/// `stdout`.
///
/// Every operation failure becomes a failure response on stdout; the
/// returned error covers only transport faults.
///
/// # Errors
///
/// Returns an error if the response cannot be serialised or written.
pub fn run(stdin: &mut impl BufRead, stdout: &mut impl Write) -> Result<(), PluginDispatchError> {
    let response = match read_request(stdin).and_then(|request| execute_request(&request)) {
        Ok(resp) => resp,
        Err(rejection) => failure_response(&rejection),
    };

    let payload = serde_json::to_string(&response)
        .map_err(|source| PluginDispatchError::Serialize { source })?;
    stdout
        .write_all(payload.as_bytes())
        .map_err(|source| PluginDispatchError::Write { source })?;
    stdout
        .write_all(b"\n")
        .map_err(|source| PluginDispatchError::Write { source })?;
    stdout
        .flush()
        .map_err(|source| PluginDispatchError::Write { source })
}

fn read_request(stdin: &mut impl BufRead) -> Result<PluginRequest, BadRequest> {
    let mut line = String::new();
    let bytes_read = stdin
        .read_line(&mut line)
        .map_err(|error| BadRequest::new(format!("failed to read request: {error}")))?;

    if bytes_read == 0 {
        return Err(BadRequest::new("plugin request was empty"));
    }

    serde_json::from_str(line.trim())
        .map_err(|error| BadRequest::new(format!("invalid plugin request JSON: {error}")))
}

fn execute_request(request: &PluginRequest) -> Result<PluginResponse, BadRequest> {
    debug!(
        target: PLUGIN_TARGET,
        operation = request.operation(),
        "dispatching plugin request"
    );
    match request.operation() {
        METADATA_OPERATION => Ok(PluginResponse::success(PluginOutput::Metadata {
            record: get_metadata(),
        })),
        PREDICT_ARGS_OPERATION => Ok(PluginResponse::success(PluginOutput::Schema {
            arguments: get_predict_args(),
        })),
        PREDICT_OPERATION => execute_predict_request(request),
        other => Err(BadRequest::new(format!("unsupported operation '{other}'"))),
    }
}

fn execute_predict_request(request: &PluginRequest) -> Result<PluginResponse, BadRequest> {
    let predict_request = parse_predict_arguments(request.arguments())?;
    let response = predict(&predict_request)?;
    let media_type = response.media_type().to_owned();
    // The host streams the artifact from disk after the plugin exits, so
    // the backing storage must outlive this process.
    let (_body, path) = response.keep();
    Ok(PluginResponse::success(PluginOutput::Artifact {
        path,
        media_type,
    }))
}

fn parse_predict_arguments(
    arguments: &HashMap<String, serde_json::Value>,
) -> Result<PredictRequest, BadRequest> {
    let input = required_str_argument(arguments, INPUT_FIELD)?;
    let accept_value = required_str_argument(arguments, ACCEPT_FIELD)?;

    get_predict_args().validate_value(ACCEPT_FIELD, accept_value)?;
    let accept = accept_value
        .parse::<Accept>()
        .map_err(|error| BadRequest::from_error(&error))?;

    Ok(PredictRequest::new(input, accept))
}

fn required_str_argument<'a>(
    arguments: &'a HashMap<String, serde_json::Value>,
    name: &str,
) -> Result<&'a str, BadRequest> {
    let value = arguments
        .get(name)
        .ok_or_else(|| BadRequest::new(format!("predict requires the '{name}' argument")))?;
    value
        .as_str()
        .ok_or_else(|| BadRequest::new(format!("argument '{name}' must be a string")))
}

pub(crate) fn failure_response(rejection: &BadRequest) -> PluginResponse {
    PluginResponse::failure(vec![PluginDiagnostic::new(
        DiagnosticSeverity::Error,
        rejection.to_string(),
    )])
}
