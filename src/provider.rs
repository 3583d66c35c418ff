use crate::config::ChestConfig;
use crate::inventory::{ChestOwner, ChestRestrictions, Inventory, OwnerKind};

/// Source of fresh inventories, for owners that have nothing stored and for unreadable data.
pub trait EmptyInventoryProvider: Send + Sync {
    /// Rows of a new chest for `owner`. Also the minimum for stored chests without a row count.
    fn inventory_rows(&self, owner: &ChestOwner) -> i32;

    /// An empty inventory, with `restrictions` or the owner's defaults.
    fn create_empty(&self, owner: ChestOwner, restrictions: Option<ChestRestrictions>) -> Inventory {
        let restrictions = restrictions.unwrap_or_else(|| {
            ChestRestrictions::new(self.inventory_rows(&owner), 0, true).unwrap_or_default()
        });
        Inventory::new(owner, restrictions)
    }
}

/// Row counts taken from the `[chests]` config section.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredEmptyInventories {
    chests: ChestConfig,
}

impl ConfiguredEmptyInventories {
    pub fn new(chests: ChestConfig) -> Self {
        Self { chests }
    }
}

impl EmptyInventoryProvider for ConfiguredEmptyInventories {
    fn inventory_rows(&self, owner: &ChestOwner) -> i32 {
        match owner.kind() {
            OwnerKind::Player { .. } => self.chests.player_rows,
            OwnerKind::Public => self.chests.public_rows,
            OwnerKind::Default => self.chests.default_rows,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rows_per_owner() {
        let provider = ConfiguredEmptyInventories::new(ChestConfig {
            player_rows: 2,
            public_rows: 6,
            default_rows: 4,
        });

        let tests = [
            (ChestOwner::player("Alex", None), 18),
            (ChestOwner::public(), 54),
            (ChestOwner::default_chest(), 36),
        ];
        for (owner, size) in tests {
            let inventory = provider.create_empty(owner.clone(), None);
            assert_eq!(inventory.size(), size, "{owner:?}");
            assert!(inventory.is_empty());
            assert!(!inventory.has_unsaved_changes());
            assert_eq!(inventory.owner(), &owner);
        }
    }

    #[test]
    fn explicit_restrictions_win() {
        let provider = ConfiguredEmptyInventories::default();
        let restrictions = ChestRestrictions::new(1, 2, false).unwrap();
        let inventory = provider.create_empty(ChestOwner::public(), Some(restrictions));
        assert_eq!(inventory.restrictions(), &restrictions);
        assert_eq!(inventory.size(), 9);
    }

    #[test]
    fn invalid_rows_fall_back() {
        let provider = ConfiguredEmptyInventories::new(ChestConfig {
            player_rows: 0,
            ..ChestConfig::default()
        });
        let inventory = provider.create_empty(ChestOwner::player("Alex", None), None);
        assert_eq!(inventory.restrictions(), &ChestRestrictions::default());
    }
}
