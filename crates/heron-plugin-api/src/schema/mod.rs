//! Declarative argument schemas for plugin operations.
//!
//! A schema describes the inputs a plugin accepts so the host can render a
//! submission form and validate submitted values before the plugin runs.
//! Schemas are purely descriptive: nothing is persisted, and the plugin
//! constructs the same schema on every call.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::BadRequest;

/// Transport kind of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// An uploaded file; the host saves it to temporary storage and hands
    /// the plugin the resulting path.
    File,
    /// A plain text value passed through verbatim.
    Text,
}

impl FieldKind {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Text => "text",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the host reads a field from when parsing a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldLocation {
    /// A multipart form part.
    Form,
    /// A URL query parameter.
    Query,
}

impl FieldLocation {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Form => "form",
            Self::Query => "query",
        }
    }
}

impl std::fmt::Display for FieldLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor for one accepted argument.
///
/// # Example
///
/// ```
/// use heron_plugin_api::{FieldKind, FieldLocation, FieldSpec};
///
/// let spec = FieldSpec::new(FieldKind::Text, "Requested media type.")
///     .with_required(true)
///     .with_choices(vec!["image/*".into(), "application/zip".into()]);
///
/// assert!(spec.is_required());
/// assert_eq!(spec.location(), FieldLocation::Form);
/// assert!(spec.accepts("image/*"));
/// assert!(!spec.accepts("text/plain"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    kind: FieldKind,
    required: bool,
    location: FieldLocation,
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    choices: Option<Vec<String>>,
}

impl FieldSpec {
    /// Creates an optional form field of the given kind.
    #[must_use]
    pub fn new(kind: FieldKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            required: false,
            location: FieldLocation::Form,
            description: description.into(),
            choices: None,
        }
    }

    /// Marks the field as required or optional.
    #[must_use]
    pub const fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Overrides the transport location.
    #[must_use]
    pub const fn with_location(mut self, location: FieldLocation) -> Self {
        self.location = location;
        self
    }

    /// Constrains the field to an enumerated set of allowed values.
    #[must_use]
    pub fn with_choices(mut self, choices: Vec<String>) -> Self {
        self.choices = Some(choices);
        self
    }

    /// Returns the transport kind.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Returns whether a submission must include the field.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the transport location.
    #[must_use]
    pub const fn location(&self) -> FieldLocation {
        self.location
    }

    /// Returns the human-readable description.
    #[must_use]
    pub const fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Returns the allowed values, if the field is constrained.
    #[must_use]
    pub fn choices(&self) -> Option<&[String]> {
        self.choices.as_deref()
    }

    /// Checks a submitted value against the declared choices.
    ///
    /// Unconstrained fields accept every value.
    #[must_use]
    pub fn accepts(&self, value: &str) -> bool {
        self.choices
            .as_ref()
            .is_none_or(|choices| choices.iter().any(|choice| choice == value))
    }
}

/// Ordered collection of field descriptors keyed by argument name.
///
/// Iteration and serialisation order is the lexicographic field-name order,
/// so hosts render forms deterministically.
///
/// # Example
///
/// ```
/// use heron_plugin_api::{ArgumentSchema, FieldKind, FieldSpec};
///
/// let schema = ArgumentSchema::new()
///     .with_field("demo-image", FieldSpec::new(FieldKind::File, "image"));
///
/// assert_eq!(schema.len(), 1);
/// assert!(schema.field("demo-image").is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentSchema {
    fields: BTreeMap<String, FieldSpec>,
}

impl ArgumentSchema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field descriptor under the given argument name.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.insert(name.into(), spec);
        self
    }

    /// Looks up the descriptor for an argument name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    /// Returns all descriptors keyed by argument name.
    #[must_use]
    pub const fn fields(&self) -> &BTreeMap<String, FieldSpec> {
        &self.fields
    }

    /// Returns the number of declared arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns whether the schema declares no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validates a submitted value for the named argument.
    ///
    /// # Errors
    ///
    /// Returns [`BadRequest`] if the argument is not declared or the value
    /// is outside the declared choices.
    pub fn validate_value(&self, name: &str, value: &str) -> Result<(), BadRequest> {
        let spec = self
            .field(name)
            .ok_or_else(|| BadRequest::new(format!("unknown argument '{name}'")))?;
        if spec.accepts(value) {
            return Ok(());
        }
        let allowed = spec.choices().unwrap_or_default().join(", ");
        Err(BadRequest::new(format!(
            "argument '{name}' does not accept '{value}'; allowed values: {allowed}"
        )))
    }
}
