use std::collections::HashMap;

use crate::error::{Result, SpoolerError};

/// Maps a job id to its current slot in the heap array.
///
/// The heap owns the only instance and corrects entries after every swap.
#[derive(Debug, Default)]
pub struct IdIndex {
    positions: HashMap<String, usize>,
}

impl IdIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new id. A second registration of the same id is a logic error.
    pub fn insert(&mut self, id: &str, position: usize) -> Result<()> {
        if self.positions.contains_key(id) {
            return Err(SpoolerError::DuplicateId(id.to_string()));
        }
        self.positions.insert(id.to_string(), position);
        Ok(())
    }

    pub fn find(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Overwrite the stored position. Missing ids are ignored.
    pub fn update(&mut self, id: &str, position: usize) {
        if let Some(slot) = self.positions.get_mut(id) {
            *slot = position;
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<usize> {
        self.positions.remove(id)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_find() {
        let mut index = IdIndex::new();
        index.insert("PDF1", 0).unwrap();
        index.insert("IMG2", 1).unwrap();

        assert_eq!(index.find("PDF1"), Some(0));
        assert_eq!(index.find("IMG2"), Some(1));
        assert_eq!(index.find("TXT3"), None);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_duplicate_insert_is_rejected() {
        let mut index = IdIndex::new();
        index.insert("PDF1", 0).unwrap();

        let err = index.insert("PDF1", 4).unwrap_err();
        assert!(matches!(err, SpoolerError::DuplicateId(id) if id == "PDF1"));
        assert_eq!(index.find("PDF1"), Some(0));
    }

    #[test]
    fn test_update_missing_id_is_noop() {
        let mut index = IdIndex::new();
        index.insert("PDF1", 0).unwrap();
        index.update("PDF1", 3);
        index.update("GONE9", 1);

        assert_eq!(index.find("PDF1"), Some(3));
        assert_eq!(index.find("GONE9"), None);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut index = IdIndex::new();
        index.insert("PDF1", 0).unwrap();

        assert_eq!(index.remove("PDF1"), Some(0));
        assert_eq!(index.remove("PDF1"), None);
        assert!(index.is_empty());
    }
}
