//! State tree engine for schema-driven forms.
//!
//! A [`Schema`] describes the shape of a form: scalar fields with their
//! load/submit transforms and validators, and repeatable groups holding nested
//! schemas. From it the engine builds a [`FormTree`] of current values and
//! errors, projects the tree back into a submission payload, and keeps error
//! state in sync with client-side validation and server responses.
//!
//! Layers, bottom up:
//! - [`builder`] / [`collector`]: schema + values to tree and back.
//! - [`validation`]: the error model (required checks, errors by path).
//! - [`FormController`]: current snapshot, dirty flag, load/collect/reset.
//! - [`FormBinding`]: field-level operations on the root form or one group
//!   entry, with debounced async validation.
//!
//! ```ignore
//! use forms::{FormBinding, FormController, Schema};
//! use forms::field_types::{number_field, string_field, FieldOptions};
//!
//! let schema = Schema::new()
//!     .field("name", string_field(FieldOptions::default().required()))
//!     .group("items", Schema::new().field("qty", number_field(FieldOptions::default())));
//!
//! let form = FormBinding::new(FormController::new(schema, None));
//! form.add_subform("items", Some(&serde_json::json!({ "qty": 5 })))?;
//! let payload = form.form().collect(true);
//! ```

pub mod binding;
pub mod builder;
pub mod collector;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod errors;
pub mod field;
pub mod field_types;
pub mod path;
pub mod schema;
pub mod submit_error;
pub mod tree;
pub mod validation;

pub use binding::FormBinding;
pub use builder::build;
pub use collector::collect;
pub use config::FormConfig;
pub use controller::FormController;
pub use debounce::ValidationScheduler;
pub use errors::{FormError, Result};
pub use field::{FieldConfig, ValidationFuture};
pub use field_types::FieldKind;
pub use path::{FieldPath, Scope};
pub use schema::{Schema, SchemaNode};
pub use submit_error::SubmitError;
pub use tree::{FieldNode, FormTree, Leaf};
pub use validation::{apply_errors_by_path, has_errors, has_missing_required, mark_missing_required};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
