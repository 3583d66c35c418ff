//! Hooks into block protection systems, so that protected ender chests can be owned.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::inventory::ChestOwner;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Player {
    pub name: String,
    pub uuid: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockLocation {
    pub world: String,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Low,
    Normal,
    High,
}

pub trait ProtectionBridge: Send + Sync {
    fn name(&self) -> &str;

    /// Among several available bridges, the highest priority one is used.
    fn priority(&self) -> Priority;

    /// Whether the protection system is installed and usable.
    fn is_available(&self) -> bool;

    fn can_access(&self, player: &Player, block: &BlockLocation) -> bool;

    fn is_protected(&self, block: &BlockLocation) -> bool;

    /// Owner of the chest at `block`, `None` if it is not protected.
    fn chest_owner(&self, block: &BlockLocation) -> Option<ChestOwner>;
}

/// Used when no protection system is available: everything is accessible, nothing is owned.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProtection;

impl ProtectionBridge for NoProtection {
    fn name(&self) -> &str {
        "Nothing"
    }

    fn priority(&self) -> Priority {
        Priority::Low
    }

    fn is_available(&self) -> bool {
        true
    }

    fn can_access(&self, _player: &Player, _block: &BlockLocation) -> bool {
        true
    }

    fn is_protected(&self, _block: &BlockLocation) -> bool {
        false
    }

    fn chest_owner(&self, _block: &BlockLocation) -> Option<ChestOwner> {
        None
    }
}

/// The bridge chosen at startup.
#[derive(Clone)]
pub struct BridgeRegistry {
    selected: Arc<dyn ProtectionBridge>,
}

impl BridgeRegistry {
    /// Picks the available bridge with the highest priority. Ties go to the earlier candidate.
    pub fn select(candidates: impl IntoIterator<Item = Arc<dyn ProtectionBridge>>) -> Self {
        let mut selected: Option<Arc<dyn ProtectionBridge>> = None;
        for candidate in candidates {
            if !candidate.is_available() {
                tracing::debug!("Protection bridge {} is not available.", candidate.name());
                continue;
            }
            if selected
                .as_ref()
                .map_or(true, |best| candidate.priority() > best.priority())
            {
                selected = Some(candidate);
            }
        }

        let selected = selected.unwrap_or_else(|| Arc::new(NoProtection));
        tracing::info!("Using {} for chest protection.", selected.name());
        Self { selected }
    }

    pub fn selected(&self) -> &dyn ProtectionBridge {
        self.selected.as_ref()
    }
}

impl fmt::Debug for BridgeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeRegistry")
            .field("selected", &self.selected.name())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::*;

    /// Owners of protected blocks, listed up front.
    struct FixedProtection {
        name: &'static str,
        priority: Priority,
        available: bool,
        owners: HashMap<BlockLocation, Player>,
    }

    impl FixedProtection {
        fn new(name: &'static str, priority: Priority, available: bool) -> Arc<dyn ProtectionBridge> {
            Arc::new(Self {
                name,
                priority,
                available,
                owners: HashMap::new(),
            })
        }
    }

    impl ProtectionBridge for FixedProtection {
        fn name(&self) -> &str {
            self.name
        }

        fn priority(&self) -> Priority {
            self.priority
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn can_access(&self, player: &Player, block: &BlockLocation) -> bool {
            self.owners.get(block).map_or(true, |owner| owner == player)
        }

        fn is_protected(&self, block: &BlockLocation) -> bool {
            self.owners.contains_key(block)
        }

        fn chest_owner(&self, block: &BlockLocation) -> Option<ChestOwner> {
            let owner = self.owners.get(block)?;
            Some(ChestOwner::player(owner.name.clone(), Some(owner.uuid)))
        }
    }

    fn block(x: i32) -> BlockLocation {
        BlockLocation {
            world: "world".to_owned(),
            x,
            y: 64,
            z: 0,
        }
    }

    #[test]
    fn priorities_are_ordered() {
        assert!(Priority::Low < Priority::Normal);
        assert!(Priority::Normal < Priority::High);
    }

    #[test]
    fn selects_best_available() {
        let registry = BridgeRegistry::select([
            FixedProtection::new("Lockette", Priority::Low, true),
            FixedProtection::new("LWC", Priority::High, false),
            FixedProtection::new("BlockLocker", Priority::Normal, true),
            FixedProtection::new("Other", Priority::Normal, true),
        ]);
        assert_eq!(registry.selected().name(), "BlockLocker");
    }

    #[test]
    fn falls_back_to_no_protection() {
        let registry = BridgeRegistry::select([FixedProtection::new("LWC", Priority::High, false)]);
        let bridge = registry.selected();
        assert_eq!(bridge.name(), "Nothing");
        assert!(!bridge.is_protected(&block(0)));
        assert!(bridge.chest_owner(&block(0)).is_none());
    }

    #[test]
    fn protected_chest_owner() {
        let owner = Player {
            name: "Notch".to_owned(),
            uuid: Uuid::new_v4(),
        };
        let stranger = Player {
            name: "Herobrine".to_owned(),
            uuid: Uuid::new_v4(),
        };
        let mut bridge = FixedProtection {
            name: "BlockLocker",
            priority: Priority::Normal,
            available: true,
            owners: HashMap::new(),
        };
        bridge.owners.insert(block(1), owner.clone());

        let registry = BridgeRegistry::select([Arc::new(bridge) as Arc<dyn ProtectionBridge>]);
        let bridge = registry.selected();
        assert!(bridge.is_protected(&block(1)));
        assert!(bridge.can_access(&owner, &block(1)));
        assert!(!bridge.can_access(&stranger, &block(1)));
        assert!(bridge.can_access(&stranger, &block(2)));

        let chest_owner = bridge.chest_owner(&block(1)).unwrap();
        assert_eq!(chest_owner.inventory_name(), &owner.uuid.to_string());
        assert_eq!(chest_owner.display_name(), "Notch");
    }
}
