//! Descriptive metadata a plugin reports to its host.
//!
//! The host calls the metadata entry point to render the plugin description
//! page. Records are static: a plugin constructs the same six fields on
//! every call, and the record carries no identity or lifecycle beyond the
//! call that produced it.

use serde::{Deserialize, Serialize};

use crate::error::BadRequest;

/// Static descriptive record rendered by the host on the plugin page.
///
/// All six fields are required and expected to be non-empty;
/// [`PluginMetadata::validate`] rejects records that break that rule.
///
/// # Example
///
/// ```
/// use heron_plugin_api::PluginMetadata;
///
/// let record = PluginMetadata::new(
///     "Heron Authors",
///     "A demonstration plugin.",
///     "MIT",
///     "https://example.org/demo",
///     "0.1.0",
///     "Echoes its input back to the caller.",
/// );
///
/// assert_eq!(record.license(), "MIT");
/// assert!(record.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMetadata {
    author: String,
    description: String,
    license: String,
    url: String,
    version: String,
    summary: String,
}

impl PluginMetadata {
    /// Creates a record from its six descriptive fields.
    #[must_use]
    pub fn new(
        author: impl Into<String>,
        description: impl Into<String>,
        license: impl Into<String>,
        url: impl Into<String>,
        version: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            author: author.into(),
            description: description.into(),
            license: license.into(),
            url: url.into(),
            version: version.into(),
            summary: summary.into(),
        }
    }

    /// Validates the record, rejecting any blank field.
    ///
    /// # Errors
    ///
    /// Returns [`BadRequest`] naming the first field whose value is empty
    /// or whitespace-only.
    pub fn validate(&self) -> Result<(), BadRequest> {
        for (name, value) in self.fields() {
            if value.trim().is_empty() {
                return Err(BadRequest::new(format!(
                    "metadata field '{name}' must not be empty"
                )));
            }
        }
        Ok(())
    }

    /// Returns the record as `(field name, value)` pairs in declaration
    /// order, for hosts that render the fields generically.
    #[must_use]
    pub const fn fields(&self) -> [(&'static str, &str); 6] {
        [
            ("author", self.author.as_str()),
            ("description", self.description.as_str()),
            ("license", self.license.as_str()),
            ("url", self.url.as_str()),
            ("version", self.version.as_str()),
            ("summary", self.summary.as_str()),
        ]
    }

    /// Returns the plugin author.
    #[must_use]
    pub const fn author(&self) -> &str {
        self.author.as_str()
    }

    /// Returns the long-form description.
    #[must_use]
    pub const fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Returns the license identifier.
    #[must_use]
    pub const fn license(&self) -> &str {
        self.license.as_str()
    }

    /// Returns the source URL.
    #[must_use]
    pub const fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns the plugin version.
    #[must_use]
    pub const fn version(&self) -> &str {
        self.version.as_str()
    }

    /// Returns the one-paragraph summary.
    #[must_use]
    pub const fn summary(&self) -> &str {
        self.summary.as_str()
    }
}
