//! Long-lived conversion context: caches and configuration for one schema
//! pair.

use crate::engine::Direction;
use crate::index::SchemaIndex;
use crate::mapper::{self, FieldCorrespondence};
use recast_core::{RecordDescriptor, SchemaSource, Value};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Correspondence cache key. The direction disambiguates type pairs whose
/// names coincide across the two schema sides.
type PairKey = (Direction, String, String);

/// Caller-supplied per-field transform.
///
/// A transform fully replaces built-in coercion for its field; its output
/// still receives one coercion pass into the destination type. Errors are
/// reported as failures of the field the transform is registered under.
pub type TransformFn = dyn Fn(&Value) -> Result<Value, String> + Send + Sync;

/// Shared caches and configuration for converting between one wire schema
/// and one domain schema.
///
/// A context is created once per schema pair and reused across conversions;
/// all caches warm up on first use and are read-mostly afterwards.
/// Registration of overrides and transforms after warm-up is permitted and is
/// last-writer-wins: correspondence sets already resolved for a type pair are
/// not recomputed.
pub struct ConversionContext {
    wire: SchemaIndex,
    domain: SchemaIndex,
    overrides: RwLock<Vec<(String, String)>>,
    correspondences: RwLock<HashMap<PairKey, Arc<Vec<FieldCorrespondence>>>>,
    transforms: RwLock<HashMap<String, Arc<TransformFn>>>,
    timestamp_coercion: bool,
}

impl ConversionContext {
    /// Create a context with default configuration (automatic timestamp
    /// coercion enabled).
    pub fn new(wire: Arc<dyn SchemaSource>, domain: Arc<dyn SchemaSource>) -> Self {
        Self::builder(wire, domain).build()
    }

    /// Create a context builder.
    pub fn builder(wire: Arc<dyn SchemaSource>, domain: Arc<dyn SchemaSource>) -> ContextBuilder {
        ContextBuilder {
            wire,
            domain,
            timestamp_coercion: true,
        }
    }

    /// Register an explicit field override: values of `src_field` populate
    /// `dst_field`, taking precedence over annotations and name matches.
    ///
    /// Affects only type pairs resolved after this call.
    pub fn register_override(&self, src_field: impl Into<String>, dst_field: impl Into<String>) {
        self.overrides
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((src_field.into(), dst_field.into()));
    }

    /// Register a per-field transform under a destination field name,
    /// replacing any previous transform for that field.
    pub fn register_transform<F>(&self, field: impl Into<String>, transform: F)
    where
        F: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.transforms
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(field.into(), Arc::new(transform));
    }

    /// The schema index for the wire side.
    pub(crate) fn wire_index(&self) -> &SchemaIndex {
        &self.wire
    }

    /// The schema index for the domain side.
    pub(crate) fn domain_index(&self) -> &SchemaIndex {
        &self.domain
    }

    /// Whether timestamp representations are bridged automatically.
    pub(crate) fn timestamp_coercion(&self) -> bool {
        self.timestamp_coercion
    }

    /// Look up the transform registered for a destination field, if any.
    pub(crate) fn transform(&self, field: &str) -> Option<Arc<TransformFn>> {
        self.transforms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(field)
            .cloned()
    }

    /// Get the cached correspondence set for a descriptor pair, resolving it
    /// on first use.
    ///
    /// The resolution snapshots the override list; overrides registered later
    /// do not affect the cached set for this pair.
    pub(crate) fn correspondences(
        &self,
        direction: Direction,
        src: &RecordDescriptor,
        dst: &RecordDescriptor,
    ) -> Arc<Vec<FieldCorrespondence>> {
        let key = (direction, src.type_name.clone(), dst.type_name.clone());

        {
            let cache = self
                .correspondences
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(found) = cache.get(&key) {
                return Arc::clone(found);
            }
        }

        let mut cache = self
            .correspondences
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(found) = cache.get(&key) {
            return Arc::clone(found);
        }

        let overrides = self
            .overrides
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let resolved = Arc::new(mapper::resolve(src, dst, &overrides));
        cache.insert(key, Arc::clone(&resolved));
        resolved
    }
}

/// Builder for [`ConversionContext`].
pub struct ContextBuilder {
    wire: Arc<dyn SchemaSource>,
    domain: Arc<dyn SchemaSource>,
    timestamp_coercion: bool,
}

impl ContextBuilder {
    /// Enable or disable automatic bridging between the two timestamp
    /// representations. Enabled by default; when disabled, timestamps only
    /// convert between identical representations or through a registered
    /// transform.
    pub fn timestamp_coercion(mut self, enabled: bool) -> Self {
        self.timestamp_coercion = enabled;
        self
    }

    /// Build the context.
    pub fn build(self) -> ConversionContext {
        ConversionContext {
            wire: SchemaIndex::new(self.wire),
            domain: SchemaIndex::new(self.domain),
            overrides: RwLock::new(Vec::new()),
            correspondences: RwLock::new(HashMap::new()),
            transforms: RwLock::new(HashMap::new()),
            timestamp_coercion: self.timestamp_coercion,
        }
    }
}
