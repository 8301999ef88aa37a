use std::collections::{BTreeMap, HashMap};

/**
    Lookup from a ticket's common-key index to the 16-byte common key.

    Where the keys come from is up to the caller. Lookups are read-only.
*/
pub trait CommonKeySource {
    fn common_key(&self, index: u8) -> Option<&[u8; 16]>;
}

/// In-memory common key table.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CommonKeyTable {
    keys: BTreeMap<u8, [u8; 16]>,
}

impl CommonKeyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding a single key registered under `index`.
    pub fn with_key(index: u8, key: [u8; 16]) -> Self {
        let mut table = Self::new();
        table.insert(index, key);
        table
    }

    /// Register `key` under `index`, returning the key it replaced.
    pub fn insert(&mut self, index: u8, key: [u8; 16]) -> Option<[u8; 16]> {
        self.keys.insert(index, key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn indices(&self) -> impl Iterator<Item = u8> + '_ {
        self.keys.keys().copied()
    }
}

impl core::fmt::Debug for CommonKeyTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.keys.keys()).finish()
    }
}

impl CommonKeySource for CommonKeyTable {
    fn common_key(&self, index: u8) -> Option<&[u8; 16]> {
        self.keys.get(&index)
    }
}

impl CommonKeySource for HashMap<u8, [u8; 16]> {
    fn common_key(&self, index: u8) -> Option<&[u8; 16]> {
        self.get(&index)
    }
}

/// Slice position is the index.
impl CommonKeySource for [[u8; 16]] {
    fn common_key(&self, index: u8) -> Option<&[u8; 16]> {
        self.get(usize::from(index))
    }
}

impl<const N: usize> CommonKeySource for [[u8; 16]; N] {
    fn common_key(&self, index: u8) -> Option<&[u8; 16]> {
        self.get(usize::from(index))
    }
}

impl<K: CommonKeySource + ?Sized> CommonKeySource for &K {
    fn common_key(&self, index: u8) -> Option<&[u8; 16]> {
        (**self).common_key(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lookup() {
        let mut table = CommonKeyTable::with_key(0, [1; 16]);
        assert_eq!(table.insert(1, [2; 16]), None);
        assert_eq!(table.insert(1, [3; 16]), Some([2; 16]));

        assert_eq!(table.common_key(0), Some(&[1; 16]));
        assert_eq!(table.common_key(1), Some(&[3; 16]));
        assert_eq!(table.common_key(2), None);
        assert_eq!(table.indices().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn debug_lists_indices_only() {
        let table = CommonKeyTable::with_key(5, [0xEE; 16]);
        assert_eq!(format!("{table:?}"), "{5}");
    }

    #[test]
    fn slices_and_maps_are_sources() {
        let keys = [[1u8; 16], [2u8; 16]];
        assert_eq!(keys.common_key(1), Some(&[2; 16]));
        assert_eq!(keys[..].common_key(2), None);

        let map: HashMap<u8, [u8; 16]> = [(7, [9; 16])].into_iter().collect();
        assert_eq!(map.common_key(7), Some(&[9; 16]));
        assert_eq!((&map).common_key(0), None);
    }
}
