use super::IndexedStore;
use crate::error::{Result, WhisperError};

/// Vector-backed store for runs that need no durability.
#[derive(Debug)]
pub struct MemoryStore<T> {
    values: Option<Vec<T>>,
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            values: Some(Vec::new()),
        }
    }

    fn values(&self) -> Result<&Vec<T>> {
        self.values.as_ref().ok_or(WhisperError::StoreDestroyed)
    }

    fn values_mut(&mut self) -> Result<&mut Vec<T>> {
        self.values.as_mut().ok_or(WhisperError::StoreDestroyed)
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> IndexedStore<T> for MemoryStore<T> {
    fn append(&mut self, value: T) -> Result<()> {
        self.values_mut()?.push(value);
        Ok(())
    }

    fn get(&self, index: usize) -> Result<T> {
        self.values()?
            .get(index)
            .cloned()
            .ok_or(WhisperError::Lookup {
                what: "index",
                index,
            })
    }

    fn set(&mut self, index: usize, value: T) -> Result<()> {
        let slot = self
            .values_mut()?
            .get_mut(index)
            .ok_or(WhisperError::Lookup {
                what: "index",
                index,
            })?;
        *slot = value;
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.values()?.len())
    }

    fn clear(&mut self) -> Result<()> {
        self.values_mut()?.clear();
        Ok(())
    }

    fn destroy(&mut self) -> Result<()> {
        self.values = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_honors_contract() {
        let mut store = MemoryStore::new();
        super::super::contract::exercise(&mut store);
    }

    #[test]
    fn instances_do_not_share_values() {
        let mut a = MemoryStore::new();
        let b: MemoryStore<u32> = MemoryStore::new();
        a.append(7).expect("append");
        assert_eq!(a.len().expect("len a"), 1);
        assert_eq!(b.len().expect("len b"), 0);
    }
}
