use crate::error::Result;
use crate::store::DocumentStore;
use crate::value::contains_ignore_case;

/// Lists root keys, keeping only those that contain `filter` (case-insensitive).
///
/// No ordering is promised to callers.
pub fn list_keys(store: &DocumentStore, filter: Option<&str>) -> Result<Vec<String>> {
    let filter = filter.filter(|f| !f.is_empty());
    store.read(|document| {
        document
            .keys()
            .filter(|key| filter.map_or(true, |f| contains_ignore_case(key, f)))
            .cloned()
            .collect()
    })
}
