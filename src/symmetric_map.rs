use fnv::FnvHashMap;

/// Map keyed by an unordered pair of indices: `(i, j)` and `(j, i)` name the same entry.
#[derive(Clone, Debug, Default)]
pub struct SymmetricMap<T> {
    map: FnvHashMap<(usize, usize), T>,
}

impl<T> SymmetricMap<T> {
    pub fn new() -> Self {
        SymmetricMap {
            map: FnvHashMap::default(),
        }
    }

    fn order_indices(i1: usize, i2: usize) -> (usize, usize) {
        if i1 > i2 {
            (i2, i1)
        } else {
            (i1, i2)
        }
    }

    pub fn get(&self, i1: usize, i2: usize) -> Option<&T> {
        self.map.get(&Self::order_indices(i1, i2))
    }

    pub fn insert(&mut self, i1: usize, i2: usize, value: T) -> Option<T> {
        self.map.insert(Self::order_indices(i1, i2), value)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Entries with keys ordered `(low, high)`, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &T)> {
        self.map.iter().map(|(k, v)| (*k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_order_does_not_matter() {
        let mut map = SymmetricMap::new();
        assert_eq!(map.insert(3, 1, "a"), None);
        assert_eq!(map.insert(1, 3, "b"), Some("a"));

        assert_eq!(map.get(3, 1), Some(&"b"));
        assert_eq!(map.len(), 1);
        assert_eq!(map.iter().next(), Some(((1, 3), &"b")));
        assert_eq!(map.get(1, 2), None);
    }
}
