//! Core types for the recast conversion engine.
//!
//! This crate provides the foundational types shared by the engine crate:
//!
//! - [`FieldType`] - Universal field type vocabulary for both schema sides
//! - [`Value`] - Dynamic values flowing through conversions
//! - [`Record`] - Dynamic record representation (type name + field values)
//! - [`RecordDescriptor`] - Ordered field table for one record type
//! - [`SchemaSource`] - Introspection seam the engine resolves layouts through
//! - [`SchemaCatalog`] - Bundled in-memory/YAML schema source
//!
//! # Architecture
//!
//! recast-core sits at the foundation of the workspace:
//!
//! ```text
//! recast-core (this crate)
//!    │
//!    └─── recast-engine   (schema index, field mapper, type coercer,
//!                          conversion engine, batch scheduler)
//! ```
//!
//! # Example
//!
//! ```rust
//! use recast_core::{FieldDescriptor, FieldType, Record, RecordDescriptor, Value};
//!
//! let descriptor = RecordDescriptor::new(
//!     "User",
//!     vec![
//!         FieldDescriptor::new("id", FieldType::Int64),
//!         FieldDescriptor::optional("name", FieldType::String),
//!     ],
//! );
//! assert_eq!(descriptor.field("name").unwrap().position, 1);
//!
//! let user = Record::builder("User")
//!     .field("id", Value::Int64(5))
//!     .build();
//! assert_eq!(user.get("id"), Some(&Value::Int64(5)));
//! ```

pub mod schema;
pub mod types;
pub mod values;

// Re-exports for convenience
pub use schema::{FieldDescriptor, RecordDescriptor, SchemaCatalog, SchemaError, SchemaSource};
pub use types::FieldType;
pub use values::{Record, RecordBuilder, Value};
