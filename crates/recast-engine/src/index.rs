//! Per-type schema descriptor cache.

use recast_core::{RecordDescriptor, SchemaSource};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Lazily-built, exactly-once cache of record descriptors for one schema
/// side.
///
/// The first caller for a type name performs the introspection through the
/// [`SchemaSource`]; concurrent first-use callers serialize behind the write
/// lock, and the recheck under that lock guarantees the build runs exactly
/// once. Every later call takes the read path only.
///
/// Unknown type names degrade to a cached zero-field descriptor. The method
/// never fails.
pub struct SchemaIndex {
    source: Arc<dyn SchemaSource>,
    cache: RwLock<HashMap<String, Arc<RecordDescriptor>>>,
}

impl SchemaIndex {
    /// Create an index over the given schema source.
    pub fn new(source: Arc<dyn SchemaSource>) -> Self {
        Self {
            source,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Get the cached descriptor for a type, building it on first use.
    pub fn get_or_build(&self, type_name: &str) -> Arc<RecordDescriptor> {
        {
            let cache = self
                .cache
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(found) = cache.get(type_name) {
                return Arc::clone(found);
            }
        }

        let mut cache = self
            .cache
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // Double-checked: another caller may have built it while we waited.
        if let Some(found) = cache.get(type_name) {
            return Arc::clone(found);
        }

        let descriptor = self
            .source
            .describe(type_name)
            .unwrap_or_else(|| RecordDescriptor::empty(type_name));
        debug!(
            type_name,
            fields = descriptor.len(),
            "built record descriptor"
        );

        let descriptor = Arc::new(descriptor);
        cache.insert(type_name.to_string(), Arc::clone(&descriptor));
        descriptor
    }
}
