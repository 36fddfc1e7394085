use crate::types::{KeyValue, MAX_MODIFIERS_PER_COMBINATION};
use smallvec::SmallVec;

/// The keys currently held, kept sorted by [`KeyValue`] ordering and free of duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PressedKeys {
    keys: SmallVec<[KeyValue; MAX_MODIFIERS_PER_COMBINATION]>,
}

impl PressedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Ok(position)` when held, otherwise `Err(position)` where it would be inserted.
    pub fn find(&self, value: &KeyValue) -> Result<usize, usize> {
        self.keys.binary_search(value)
    }

    /// Inserts `value` at `position`. Refused when the value is already held or
    /// when `position` is not its sorted slot.
    pub fn insert(&mut self, value: KeyValue, position: usize) -> bool {
        if position > self.keys.len() {
            return false;
        }
        if position > 0 && self.keys[position - 1] >= value {
            return false;
        }
        if position < self.keys.len() && self.keys[position] <= value {
            return false;
        }
        self.keys.insert(position, value);
        true
    }

    pub fn remove(&mut self, position: usize) -> Option<KeyValue> {
        if position < self.keys.len() {
            Some(self.keys.remove(position))
        } else {
            None
        }
    }

    pub fn contains(&self, value: &KeyValue) -> bool {
        self.find(value).is_ok()
    }

    pub fn as_slice(&self) -> &[KeyValue] {
        &self.keys
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyValue> + '_ {
        self.keys.iter()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}
