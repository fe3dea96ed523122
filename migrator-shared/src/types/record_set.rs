use std::collections::HashMap;

/// One side of a task's data: records keyed by their external-id value,
/// alongside the native record identifiers known for those keys.
///
/// Retrieval passes merge into the set, so re-running a pass over records
/// that were already fetched adds nothing new.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    ids_by_key: HashMap<String, String>,
    records_by_key: HashMap<String, HashMap<String, String>>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or refreshes a record. Returns `true` when the external-id
    /// key was not present before.
    pub fn insert(
        &mut self,
        key: String,
        record_id: Option<String>,
        fields: HashMap<String, String>,
    ) -> bool {
        let added = !self.records_by_key.contains_key(&key);
        if let Some(id) = record_id {
            self.ids_by_key.insert(key.clone(), id);
        }
        self.records_by_key.insert(key, fields);
        added
    }

    /// Native record id known for the given external-id key, if any.
    pub fn record_id(&self, key: &str) -> Option<&str> {
        self.ids_by_key.get(key).map(String::as_str)
    }

    /// Raw field map for the given external-id key, if present.
    pub fn fields(&self, key: &str) -> Option<&HashMap<String, String>> {
        self.records_by_key.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.records_by_key.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.records_by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records_by_key.is_empty()
    }

    /// Iterates records as (external-id key, field map).
    pub fn iter(&self) -> impl Iterator<Item = (&String, &HashMap<String, String>)> {
        self.records_by_key.iter()
    }

    pub fn clear(&mut self) {
        self.ids_by_key.clear();
        self.records_by_key.clear();
    }
}
