//! Conversion between stored NBT trees and [`Inventory`] values.
//!
//! A stored inventory is a compound like
//!
//! ```text
//! {
//!     Rows: 3b, DisabledSlots: 0b, ItemInsertion: 1b, OwnerName: "Notch",
//!     Inventory: [{Slot: 0b, id: "minecraft:stone", Count: 64b, Damage: 0s, tag: {...}}, ...]
//! }
//! ```
//!
//! and reaches us either gzip-compressed or as JSON (legacy data may be Mojangson).

use bytes::Bytes;
use nbt::{NbtCompound, NbtList, NbtTag};

use crate::config::StorageFormat;
use crate::error::{InventoryError, InventoryResult};
use crate::inventory::{ChestOwner, ChestRestrictions, Inventory, ItemStack, SLOTS_PER_ROW};

pub const ROWS: &str = "Rows";
pub const DISABLED_SLOTS: &str = "DisabledSlots";
pub const ITEM_INSERTION: &str = "ItemInsertion";
pub const OWNER_NAME: &str = "OwnerName";
pub const DEFAULT_INVENTORY_TAG: &str = "Inventory";

const SLOT: &str = "Slot";
const ID: &str = "id";
const COUNT: &str = "Count";
const DAMAGE: &str = "Damage";
const TAG: &str = "tag";

/// Reads stored bytes into a tree. Gzip data is binary NBT, anything else is text.
pub fn read_tree(data: &[u8]) -> InventoryResult<NbtCompound> {
    if nbt::io::is_compressed(data) {
        Ok(nbt::io::from_compressed_bytes(data)?)
    } else {
        let text = std::str::from_utf8(data)?;
        Ok(nbt::json::from_str(text)?)
    }
}

pub fn write_tree(root: &NbtCompound, format: StorageFormat) -> InventoryResult<Bytes> {
    Ok(match format {
        StorageFormat::Binary => Bytes::from(nbt::io::to_compressed_bytes(root)?),
        StorageFormat::Json => Bytes::from(nbt::json::to_string(root)?),
    })
}

#[derive(Debug, Clone)]
pub struct InventoryMapper {
    inventory_tag: String,
}

impl Default for InventoryMapper {
    fn default() -> Self {
        Self::new(DEFAULT_INVENTORY_TAG)
    }
}

impl InventoryMapper {
    /// `inventory_tag` names the item list in stored inventories.
    pub fn new(inventory_tag: impl Into<String>) -> Self {
        Self {
            inventory_tag: inventory_tag.into(),
        }
    }

    pub fn inventory_tag(&self) -> &str {
        &self.inventory_tag
    }

    /// Builds an inventory from a stored tree.
    ///
    /// Without a stored `Rows`, the chest gets enough rows for its highest slot, and at
    /// least `minimum_rows`. Any malformed item or restriction fails the whole decode.
    /// The result counts as saved.
    pub fn decode(
        &self,
        root: &NbtCompound,
        owner: ChestOwner,
        minimum_rows: i32,
    ) -> InventoryResult<Inventory> {
        let items = match root.list(&self.inventory_tag) {
            Some(list) => decode_items(list)?,
            None => Vec::new(),
        };

        let rows = match root.int(ROWS) {
            Some(rows) => rows,
            None => {
                let max_slot = items.iter().map(|(slot, _)| *slot).max().unwrap_or(0);
                let needed = (max_slot + 1).div_ceil(SLOTS_PER_ROW) as i32;
                needed.max(minimum_rows)
            }
        };
        let restrictions = ChestRestrictions::new(
            rows,
            root.int(DISABLED_SLOTS).unwrap_or(0),
            root.boolean(ITEM_INSERTION).unwrap_or(true),
        )?;

        let owner = match root.string(OWNER_NAME) {
            Some(name) => owner.with_display_name(name),
            None => owner,
        };

        let mut inventory = Inventory::new(owner, restrictions);
        for (slot, item) in items {
            inventory.set(slot, Some(item))?;
        }
        inventory.mark_saved();
        Ok(inventory)
    }

    /// Stored form of `inventory`. Empty slots are left out, and so is the item list if
    /// nothing is left in it.
    pub fn encode(&self, inventory: &Inventory) -> NbtCompound {
        let restrictions = inventory.restrictions();
        let mut root = NbtCompound::new();
        root.insert(ROWS, restrictions.rows() as i8);
        root.insert(DISABLED_SLOTS, restrictions.disabled_slots() as i8);
        root.insert(ITEM_INSERTION, restrictions.item_insertion_allowed());
        root.insert(OWNER_NAME, inventory.owner().display_name().as_str());

        let mut items = NbtList::of(nbt::Tag::Compound);
        for (slot, item) in inventory.items() {
            // The list is created for compounds, pushing one cannot fail.
            let _ = items.push(encode_item(slot, item));
        }
        if !items.is_empty() {
            root.insert(self.inventory_tag.as_str(), items);
        }
        root
    }

    pub fn decode_bytes(
        &self,
        data: &[u8],
        owner: ChestOwner,
        minimum_rows: i32,
    ) -> InventoryResult<Inventory> {
        self.decode(&read_tree(data)?, owner, minimum_rows)
    }

    pub fn encode_bytes(
        &self,
        inventory: &Inventory,
        format: StorageFormat,
    ) -> InventoryResult<Bytes> {
        write_tree(&self.encode(inventory), format)
    }
}

fn decode_items(list: &NbtList) -> InventoryResult<Vec<(usize, ItemStack)>> {
    list.iter()
        .enumerate()
        .map(|(index, tag)| match tag {
            NbtTag::Compound(item) => decode_item(index, item),
            _ => Err(InventoryError::InvalidItem {
                index,
                reason: "not a compound",
            }),
        })
        .collect()
}

fn decode_item(index: usize, item: &NbtCompound) -> InventoryResult<(usize, ItemStack)> {
    let invalid = |reason| InventoryError::InvalidItem { index, reason };

    let slot = item.long(SLOT).ok_or_else(|| invalid("missing Slot"))?;
    let id = item
        .string(ID)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| invalid("missing id"))?;
    let count = item.byte(COUNT).ok_or_else(|| invalid("missing Count"))?;

    let stack = ItemStack {
        id: id.to_owned(),
        count,
        damage: item.short(DAMAGE).unwrap_or(0),
        tag: item.compound(TAG).cloned(),
    };
    Ok(((slot & 0xFF) as usize, stack))
}

fn encode_item(slot: usize, item: &ItemStack) -> NbtCompound {
    let mut compound = NbtCompound::new();
    compound.insert(SLOT, slot as i8);
    compound.insert(ID, item.id.as_str());
    compound.insert(COUNT, item.count);
    compound.insert(DAMAGE, item.damage);
    if let Some(tag) = &item.tag {
        compound.insert(TAG, tag.clone());
    }
    compound
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::inventory::MAX_ROWS;

    fn item(slot: i8, id: &str) -> NbtTag {
        let mut item = NbtCompound::new();
        item.insert(SLOT, slot);
        item.insert(ID, id);
        item.insert(COUNT, 1i8);
        NbtTag::Compound(item)
    }

    fn stored(slots: &[i8]) -> NbtCompound {
        let mut root = NbtCompound::new();
        let items = slots.iter().map(|&slot| item(slot, "minecraft:stone"));
        root.insert(DEFAULT_INVENTORY_TAG, NbtList::from_tags(items).unwrap());
        root
    }

    fn decode(root: &NbtCompound, minimum_rows: i32) -> InventoryResult<Inventory> {
        InventoryMapper::default().decode(root, ChestOwner::player("Notch", None), minimum_rows)
    }

    #[test]
    fn row_fallback() {
        let tests: &[(&[i8], i32, i32)] = &[
            (&[17], 1, 2),
            (&[17], 4, 4),
            (&[0, 17], 3, 3),
            (&[8], 1, 1),
            (&[9], 1, 2),
            (&[], 1, 1),
            (&[], 5, 5),
        ];

        for &(slots, minimum_rows, rows) in tests {
            let inventory = decode(&stored(slots), minimum_rows).unwrap();
            assert_eq!(
                inventory.restrictions().rows(),
                rows,
                "slots {slots:?}, minimum {minimum_rows}"
            );
        }
    }

    #[test]
    fn defaults() {
        let inventory = decode(&NbtCompound::new(), 3).unwrap();
        assert_eq!(inventory.restrictions(), &ChestRestrictions::new(3, 0, true).unwrap());
        assert_eq!(inventory.owner().display_name(), "Notch");
        assert!(inventory.is_empty());
    }

    #[test]
    fn stored_values_win() {
        let mut root = stored(&[5]);
        root.insert(ROWS, 1i8);
        root.insert(DISABLED_SLOTS, 2i8);
        root.insert(ITEM_INSERTION, false);
        root.insert(OWNER_NAME, "Dinnerbone");

        let inventory = decode(&root, 6).unwrap();
        assert_eq!(inventory.restrictions(), &ChestRestrictions::new(1, 2, false).unwrap());
        assert_eq!(inventory.owner().display_name(), "Dinnerbone");
        assert_eq!(inventory.get(5).map(|item| item.id.as_str()), Some("minecraft:stone"));
    }

    #[test]
    fn slot_is_masked() {
        // Slot bytes above 127 are stored negative.
        let inventory = decode(&stored(&[-56]), 1).unwrap();
        assert_eq!(inventory.restrictions().rows(), 23);
        assert!(inventory.get(200).is_some());
    }

    #[test]
    fn high_slots_survive_encoding() {
        let mapper = InventoryMapper::default();
        let mut inventory = Inventory::new(
            ChestOwner::public(),
            ChestRestrictions::new(MAX_ROWS, 0, true).unwrap(),
        );
        inventory.set(250, Some(ItemStack::new("minecraft:stone", 1))).unwrap();

        let root = mapper.encode(&inventory);
        let item = root.list(DEFAULT_INVENTORY_TAG).unwrap().compounds().next().unwrap();
        assert_eq!(item.get(SLOT), Some(&NbtTag::Byte(-6)));
        let decoded = mapper.decode(&root, ChestOwner::public(), 1).unwrap();
        assert!(decoded.get(250).is_some());
    }

    #[test]
    fn decoded_inventory_is_saved() {
        let inventory = decode(&stored(&[0, 4]), 1).unwrap();
        assert!(!inventory.has_unsaved_changes());
        assert_eq!(inventory.items().count(), 2);
    }

    #[test]
    fn invalid_data_fails() {
        let mut no_id = NbtCompound::new();
        no_id.insert(SLOT, 0i8);
        no_id.insert(COUNT, 1i8);
        let mut no_count = NbtCompound::new();
        no_count.insert(SLOT, 0i8);
        no_count.insert(ID, "minecraft:stone");

        let mut bad_items = Vec::new();
        for item in [no_id, no_count] {
            let mut root = NbtCompound::new();
            root.insert(
                DEFAULT_INVENTORY_TAG,
                NbtList::from_tags([NbtTag::Compound(item)]).unwrap(),
            );
            bad_items.push(root);
        }
        for root in &bad_items {
            assert!(matches!(
                decode(root, 1),
                Err(InventoryError::InvalidItem { index: 0, .. })
            ));
        }

        let mut out_of_range = stored(&[20]);
        out_of_range.insert(ROWS, 1i8);
        assert!(matches!(
            decode(&out_of_range, 1),
            Err(InventoryError::SlotOutOfRange { slot: 20, size: 9 })
        ));

        let mut no_rows = stored(&[]);
        no_rows.insert(ROWS, 0i8);
        assert!(matches!(
            decode(&no_rows, 1),
            Err(InventoryError::InvalidRestrictions { rows: 0, .. })
        ));

        let mut too_many_disabled = NbtCompound::new();
        too_many_disabled.insert(ROWS, 1i8);
        too_many_disabled.insert(DISABLED_SLOTS, 10i8);
        assert!(decode(&too_many_disabled, 1).is_err());
    }

    #[test]
    fn encode_writes_metadata_and_items() {
        let mut inventory = Inventory::new(
            ChestOwner::player("Alex", None),
            ChestRestrictions::new(2, 1, false).unwrap(),
        );
        let mut tag = NbtCompound::new();
        tag.insert("Unbreakable", true);
        inventory
            .set(3, Some(ItemStack::new("minecraft:diamond_sword", 1).with_damage(12).with_tag(tag)))
            .unwrap();

        let root = InventoryMapper::default().encode(&inventory);
        assert_eq!(root.get(ROWS), Some(&NbtTag::Byte(2)));
        assert_eq!(root.get(DISABLED_SLOTS), Some(&NbtTag::Byte(1)));
        assert_eq!(root.get(ITEM_INSERTION), Some(&NbtTag::Byte(0)));
        assert_eq!(root.string(OWNER_NAME), Some("Alex"));

        let items = root.list(DEFAULT_INVENTORY_TAG).unwrap();
        assert_eq!(items.len(), 1);
        let item = items.compounds().next().unwrap();
        assert_eq!(item.get(SLOT), Some(&NbtTag::Byte(3)));
        assert_eq!(item.get(DAMAGE), Some(&NbtTag::Short(12)));
        assert_eq!(item.compound(TAG).and_then(|tag| tag.boolean("Unbreakable")), Some(true));
    }

    #[test]
    fn encode_omits_empty_list() {
        let inventory = Inventory::new(ChestOwner::public(), ChestRestrictions::default());
        let root = InventoryMapper::new("Items").encode(&inventory);
        assert!(!root.contains_key("Items"));
        assert_eq!(root.keys().collect::<Vec<_>>(), [ROWS, DISABLED_SLOTS, ITEM_INSERTION, OWNER_NAME]);
    }

    #[test]
    fn round_trip_through_both_formats() {
        let mapper = InventoryMapper::new("Items");
        let mut inventory = Inventory::new(
            ChestOwner::player("Alex", None),
            ChestRestrictions::new(3, 0, true).unwrap(),
        );
        inventory.set(0, Some(ItemStack::new("minecraft:stone", 64))).unwrap();
        inventory
            .set(26, Some(ItemStack::new("minecraft:wool", 3).with_damage(14)))
            .unwrap();
        inventory.mark_saved();

        for format in [StorageFormat::Binary, StorageFormat::Json] {
            let data = mapper.encode_bytes(&inventory, format).unwrap();
            let decoded = mapper
                .decode_bytes(&data, ChestOwner::from_inventory_name("alex"), 1)
                .unwrap();
            assert_eq!(decoded, inventory, "{format:?}");
        }
    }

    #[test]
    fn legacy_mojangson() {
        let text = br#"{Rows:2b,OwnerName:"Steve",Inventory:[0:{Slot:10b,id:"minecraft:dirt",Count:5b}]}"#;
        let inventory = InventoryMapper::default()
            .decode_bytes(text, ChestOwner::from_inventory_name("steve"), 1)
            .unwrap();
        assert_eq!(inventory.size(), 18);
        assert_eq!(inventory.get(10).map(|item| item.count), Some(5));
    }

    #[test]
    fn unreadable_bytes() {
        let mapper = InventoryMapper::default();
        let owner = ChestOwner::public();
        assert!(matches!(
            mapper.decode_bytes(&[0xFF, 0xFE, 0x00], owner.clone(), 1),
            Err(InventoryError::Utf8(_))
        ));
        assert!(matches!(
            mapper.decode_bytes(&[0x1F, 0x8B, 0x08], owner.clone(), 1),
            Err(InventoryError::Nbt(_))
        ));
        assert!(matches!(
            mapper.decode_bytes(b"not an inventory", owner, 1),
            Err(InventoryError::Nbt(nbt::NbtError::Text { .. }))
        ));
    }
}
