use std::collections::hash_map::Entry;

pub type HashMap<K, V> = rustc_hash::FxHashMap<K, V>;
pub type HashSet<K> = rustc_hash::FxHashSet<K>;

pub fn map_new<K, V>() -> HashMap<K, V> {
    rustc_hash::FxHashMap::default()
}


/// Lookup from unique names to dense indices.
#[derive(Debug, Clone)]
pub struct NameIndex<Index: Copy> {
    index_by_name: HashMap<Box<str>, Index>,
}

impl<Index: Copy> NameIndex<Index> {
    pub fn new() -> Self {
        Self {
            index_by_name: map_new(),
        }
    }

    /// Returns false (and keeps the old index) if the name is already taken.
    pub fn insert(&mut self, name: &str, index: Index) -> bool {
        match self.index_by_name.entry(name.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(index);
                true
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Index> {
        self.index_by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.index_by_name.len()
    }
}

impl<Index: Copy> Default for NameIndex<Index> {
    fn default() -> Self {
        Self::new()
    }
}
