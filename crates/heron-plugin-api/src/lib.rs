//! Plugin integration contract for the Heron serving host.
//!
//! A Heron plugin is a short-lived process exposing three entry points the
//! host discovers and calls: a metadata record rendered on the plugin
//! description page, an argument schema backing the submission form, and a
//! predict operation. This crate defines the types both sides of that
//! contract share: the [`PluginMetadata`] record, the [`ArgumentSchema`]
//! field descriptors, the single-line JSONL wire envelope
//! ([`PluginRequest`] / [`PluginResponse`]), and the one client-facing
//! rejection kind ([`BadRequest`]) every operation failure collapses into.
//!
//! The host owns the outer HTTP surface. It renders the metadata record,
//! validates submitted form values against the schema, invokes the plugin,
//! and maps any [`BadRequest`] onto an HTTP 400-equivalent response whose
//! body is the rejection reason.
//!
//! # Example
//!
//! ```
//! use heron_plugin_api::{ArgumentSchema, FieldKind, FieldSpec};
//!
//! let schema = ArgumentSchema::new().with_field(
//!     "accept",
//!     FieldSpec::new(FieldKind::Text, "Requested response media type.")
//!         .with_choices(vec!["image/*".into(), "application/zip".into()]),
//! );
//!
//! assert!(schema.validate_value("accept", "image/*").is_ok());
//! assert!(schema.validate_value("accept", "text/plain").is_err());
//! ```

pub mod error;
pub mod metadata;
pub mod protocol;
pub mod schema;

pub use self::error::BadRequest;
pub use self::metadata::PluginMetadata;
pub use self::protocol::{
    DiagnosticSeverity, PluginDiagnostic, PluginOutput, PluginRequest, PluginResponse,
};
pub use self::schema::{ArgumentSchema, FieldKind, FieldLocation, FieldSpec};
