//! Fuel storage buildings.
//!
//! Storage contributes capacity to its owner's reserve for as long as the
//! building exists. The capacity follows the building across owner changes.

use serde::{Deserialize, Serialize};

use crate::data::StorageData;
use crate::tank::Tank;

/// Storage state for one actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Storage {
    data: StorageData,
}

impl Storage {
    /// Create storage from its definition.
    #[must_use]
    pub const fn new(data: StorageData) -> Self {
        Self { data }
    }

    /// Capacity contributed to the reserve.
    #[must_use]
    pub const fn capacity(&self) -> i32 {
        self.data.capacity
    }

    /// The building entered play: grow the reserve.
    pub fn attach(&self, reserve: &mut Tank) {
        reserve.add_capacity(self.data.capacity);
    }

    /// The building left play: shrink the reserve.
    pub fn detach(&self, reserve: &mut Tank) {
        reserve.remove_capacity(self.data.capacity);
    }

    /// The building changed hands: move the capacity between reserves.
    pub fn transfer(&self, from: &mut Tank, to: &mut Tank) {
        self.detach(from);
        self.attach(to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TankData;

    #[test]
    fn test_storage_lifecycle() {
        let storage = Storage::new(StorageData { capacity: 500 });
        let mut old = Tank::new(1, &TankData::with_capacity(100));
        let mut new = Tank::new(2, &TankData::with_capacity(0));

        storage.attach(&mut old);
        assert_eq!(old.capacity(), 600);
        assert_eq!(old.amount(), 100);

        storage.transfer(&mut old, &mut new);
        assert_eq!(old.capacity(), 100);
        assert_eq!(new.capacity(), 500);
        assert_eq!(new.amount(), 0);

        storage.detach(&mut new);
        assert_eq!(new.capacity(), 0);
    }

    #[test]
    fn test_detach_clamps_reserve_amount() {
        let storage = Storage::new(StorageData { capacity: 50 });
        let mut reserve = Tank::new(1, &TankData::with_capacity(30));

        storage.detach(&mut reserve);
        assert_eq!(reserve.capacity(), 0);
        assert_eq!(reserve.amount(), 0);
    }
}
