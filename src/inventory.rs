//! In-memory chest contents.

use getset::{CopyGetters, Getters};
use nbt::NbtCompound;
use uuid::Uuid;

use crate::error::{InventoryError, InventoryResult};
use crate::translations::{Translation, Translations};

pub const SLOTS_PER_ROW: usize = 9;

/// Slot numbers are stored as one unsigned byte, so a chest has at most 256 slots.
pub const MAX_ROWS: i32 = (256 / SLOTS_PER_ROW) as i32;
/// Stored as a signed byte.
pub const MAX_DISABLED_SLOTS: i32 = i8::MAX as i32;

/// Size and behaviour of a chest. Validated on construction and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct ChestRestrictions {
    rows: i32,
    disabled_slots: i32,
    item_insertion_allowed: bool,
}

impl ChestRestrictions {
    pub fn new(
        rows: i32,
        disabled_slots: i32,
        item_insertion_allowed: bool,
    ) -> InventoryResult<Self> {
        let valid = (1..=MAX_ROWS).contains(&rows)
            && (0..=MAX_DISABLED_SLOTS).contains(&disabled_slots)
            && disabled_slots as usize <= rows as usize * SLOTS_PER_ROW;
        if !valid {
            return Err(InventoryError::InvalidRestrictions {
                rows,
                disabled_slots,
            });
        }
        Ok(Self {
            rows,
            disabled_slots,
            item_insertion_allowed,
        })
    }

    pub fn size(&self) -> usize {
        self.rows as usize * SLOTS_PER_ROW
    }
}

impl Default for ChestRestrictions {
    fn default() -> Self {
        Self {
            rows: 3,
            disabled_slots: 0,
            item_insertion_allowed: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnerKind {
    Player { uuid: Option<Uuid> },
    Public,
    Default,
}

/// Who a chest belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Getters, CopyGetters)]
pub struct ChestOwner {
    /// Name the inventory is stored under.
    #[getset(get = "pub")]
    inventory_name: String,
    #[getset(get = "pub")]
    display_name: String,
    #[getset(get_copy = "pub")]
    kind: OwnerKind,
}

impl ChestOwner {
    pub const PUBLIC_CHEST_NAME: &'static str = "--publicchest";
    pub const DEFAULT_CHEST_NAME: &'static str = "--defaultchest";

    /// A player's chest. Stored under the player's id when known, under the lowercase name otherwise.
    pub fn player(display_name: impl Into<String>, uuid: Option<Uuid>) -> Self {
        let display_name = display_name.into();
        let inventory_name = match uuid {
            Some(uuid) => uuid.to_string(),
            None => display_name.to_lowercase(),
        };
        Self {
            inventory_name,
            display_name,
            kind: OwnerKind::Player { uuid },
        }
    }

    pub fn public() -> Self {
        Self {
            inventory_name: Self::PUBLIC_CHEST_NAME.to_owned(),
            display_name: "Public Chest".to_owned(),
            kind: OwnerKind::Public,
        }
    }

    pub fn default_chest() -> Self {
        Self {
            inventory_name: Self::DEFAULT_CHEST_NAME.to_owned(),
            display_name: "Default Chest".to_owned(),
            kind: OwnerKind::Default,
        }
    }

    /// Recovers the owner of a stored inventory. The display name of a player is not stored
    /// in the key, so the inventory name stands in for it until the inventory is decoded.
    pub fn from_inventory_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case(Self::PUBLIC_CHEST_NAME) {
            return Self::public();
        }
        if name.eq_ignore_ascii_case(Self::DEFAULT_CHEST_NAME) {
            return Self::default_chest();
        }
        let uuid = Uuid::parse_str(name).ok();
        Self {
            inventory_name: match uuid {
                Some(uuid) => uuid.to_string(),
                None => name.to_lowercase(),
            },
            display_name: name.to_owned(),
            kind: OwnerKind::Player { uuid },
        }
    }

    /// Same owner with the display name read from stored data.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        if matches!(self.kind, OwnerKind::Player { .. }) {
            self.display_name = display_name.into();
        }
        self
    }

    pub fn is_player_chest(&self) -> bool {
        matches!(self.kind, OwnerKind::Player { .. })
    }

    pub fn is_public_chest(&self) -> bool {
        self.kind == OwnerKind::Public
    }

    pub fn is_default_chest(&self) -> bool {
        self.kind == OwnerKind::Default
    }

    /// Window title for this chest.
    pub fn title(&self, translations: &Translations) -> String {
        match self.kind {
            OwnerKind::Player { .. } => {
                translations.format(Translation::PrivateChestTitle, &self.display_name)
            }
            OwnerKind::Public => translations.get(Translation::PublicChestTitle).to_owned(),
            OwnerKind::Default => translations.get(Translation::DefaultChestTitle).to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemStack {
    pub id: String,
    pub count: i8,
    pub damage: i16,
    /// Extra item data (enchantments, names, ...) kept as-is.
    pub tag: Option<NbtCompound>,
}

impl ItemStack {
    pub fn new(id: impl Into<String>, count: i8) -> Self {
        Self {
            id: id.into(),
            count,
            damage: 0,
            tag: None,
        }
    }

    pub fn with_damage(mut self, damage: i16) -> Self {
        self.damage = damage;
        self
    }

    pub fn with_tag(mut self, tag: NbtCompound) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Air and stacks without items take no room and are never stored.
    pub fn is_empty(&self) -> bool {
        self.count <= 0 || self.id == "minecraft:air" || self.id == "air"
    }
}

/// Contents of one chest, with the contents as they were last saved.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct Inventory {
    #[getset(get = "pub")]
    owner: ChestOwner,
    #[getset(get = "pub")]
    restrictions: ChestRestrictions,
    slots: Vec<Option<ItemStack>>,
    saved: Vec<Option<ItemStack>>,
}

impl Inventory {
    /// An empty inventory, sized by `restrictions`. It counts as saved.
    pub fn new(owner: ChestOwner, restrictions: ChestRestrictions) -> Self {
        let slots = vec![None; restrictions.size()];
        Self {
            owner,
            restrictions,
            saved: slots.clone(),
            slots,
        }
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, slot: usize) -> Option<&ItemStack> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Puts `item` in `slot`, returning what was there. Empty stacks clear the slot.
    pub fn set(&mut self, slot: usize, item: Option<ItemStack>) -> InventoryResult<Option<ItemStack>> {
        let size = self.size();
        let entry = self
            .slots
            .get_mut(slot)
            .ok_or(InventoryError::SlotOutOfRange { slot, size })?;
        let item = item.filter(|item| !item.is_empty());
        Ok(std::mem::replace(entry, item))
    }

    /// Non-empty slots in slot order.
    pub fn items(&self) -> impl Iterator<Item = (usize, &ItemStack)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, item)| Some((slot, item.as_ref()?)))
    }

    pub fn is_empty(&self) -> bool {
        self.items().next().is_none()
    }

    pub fn mark_saved(&mut self) {
        self.saved.clone_from(&self.slots);
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.slots != self.saved
    }
}
