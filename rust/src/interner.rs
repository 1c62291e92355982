//! Name interning for array-indexed graph passes.
//!
//! Maps activity names to their position in a sequence so the CPM passes can
//! work on plain `Vec`s instead of string-keyed maps.

use rustc_hash::FxHashMap;

/// Dense activity index (position in the sequence being scheduled).
pub type ActivityIdx = usize;

/// Bidirectional name <-> index mapping.
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    to_idx: FxHashMap<String, ActivityIdx>,
    from_idx: Vec<String>,
}

impl NameIndex {
    /// Create an empty index with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            to_idx: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            from_idx: Vec::with_capacity(capacity),
        }
    }

    /// Intern a name. Returns `Err` with the existing index if the name was
    /// already present, since sequence names must be unique.
    pub fn insert(&mut self, name: &str) -> Result<ActivityIdx, ActivityIdx> {
        if let Some(&idx) = self.to_idx.get(name) {
            return Err(idx);
        }
        let idx = self.from_idx.len();
        self.from_idx.push(name.to_string());
        self.to_idx.insert(name.to_string(), idx);
        Ok(idx)
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<ActivityIdx> {
        self.to_idx.get(name).copied()
    }

    #[inline]
    pub fn resolve(&self, idx: ActivityIdx) -> Option<&str> {
        self.from_idx.get(idx).map(|s| s.as_str())
    }
}
