//! Schema-driven record conversion between a wire schema and a domain
//! schema.
//!
//! This crate provides the conversion machinery on top of `recast-core`:
//!
//! - [`SchemaIndex`] - Lazily-built, exactly-once descriptor cache per side
//! - [`FieldCorrespondence`] - Resolved field pairings, cached per type pair
//! - [`ConversionContext`] - Long-lived caches + configuration for one pair
//! - [`ConversionEngine`] - Single-record conversion
//! - [`BatchScheduler`] - Bounded-parallel batch conversion
//!
//! # Example
//!
//! ```rust
//! use recast_core::{Record, SchemaCatalog, Value};
//! use recast_engine::{ConversionContext, ConversionEngine, Direction};
//! use std::sync::Arc;
//!
//! let wire = Arc::new(
//!     SchemaCatalog::from_yaml(
//!         r#"
//! records:
//!   - name: WireUser
//!     fields:
//!       - name: id
//!         type: int64
//!       - name: name
//!         type: string
//! "#,
//!     )
//!     .unwrap(),
//! );
//! let domain = Arc::new(
//!     SchemaCatalog::from_yaml(
//!         r#"
//! records:
//!   - name: User
//!     fields:
//!       - name: id
//!         type: int32
//!       - name: name
//!         type: string
//! "#,
//!     )
//!     .unwrap(),
//! );
//!
//! let engine = ConversionEngine::new(Arc::new(ConversionContext::new(wire, domain)));
//!
//! let src = Value::Record(
//!     Record::builder("WireUser")
//!         .field("id", Value::Int64(5))
//!         .field("name", Value::String("a".into()))
//!         .build(),
//! );
//! let mut dst = Value::Record(Record::new("User"));
//! engine.convert(Direction::WireToDomain, &src, &mut dst).unwrap();
//!
//! assert_eq!(dst.as_record().unwrap().get("id"), Some(&Value::Int32(5)));
//! ```

pub mod batch;
mod coerce;
pub mod context;
pub mod engine;
pub mod error;
pub mod index;
pub mod mapper;

// Re-exports for convenience
pub use batch::{BatchOptions, BatchOutcome, BatchScheduler, ItemOutcome};
pub use context::{ContextBuilder, ConversionContext, TransformFn};
pub use engine::{ConversionEngine, Direction};
pub use error::ConvertError;
pub use index::SchemaIndex;
pub use mapper::{FieldCorrespondence, MatchOrigin};
