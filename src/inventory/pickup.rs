use std::sync::Arc;

use super::effects::ItemEffects;
use super::error::InventoryError;
use super::item::{ItemStack, ItemType};
use super::store::Inventory;

/// 场景里可被拾取的一堆物品
#[derive(Debug, Clone)]
pub struct Pickup {
    pub item: Arc<ItemType>,
    /// 剩余数量
    pub quantity: u32,
    /// 背包没有空格时也允许拾取（只能叠到已有堆上）
    pub pickable_if_full: bool,
    /// 装不下时尽量多拿，剩下的留在原地
    pub pick_as_much_as_possible: bool,
}

impl Pickup {
    pub fn new(item: Arc<ItemType>, quantity: u32) -> Self {
        Self {
            item,
            quantity,
            pickable_if_full: false,
            pick_as_much_as_possible: false,
        }
    }

    pub fn is_depleted(&self) -> bool {
        self.quantity == 0
    }

    pub fn pickable(&self, inventory: &Inventory) -> bool {
        self.pickable_if_full || inventory.free_slots() > 0
    }

    /// 本次最多能拿多少
    fn pick_quantity(&self, inventory: &Inventory) -> Result<u32, InventoryError> {
        let room = inventory.stackable_capacity(&self.item.id, self.item.stack_limit());
        if self.pick_as_much_as_possible {
            Ok(self.quantity.min(room))
        } else if self.quantity <= room {
            Ok(self.quantity)
        } else {
            Err(InventoryError::InventoryFull)
        }
    }

    /// 拾取进背包，返回拿走的数量
    pub fn pick(&mut self, inventory: &mut Inventory, effects: &mut dyn ItemEffects) -> Result<u32, InventoryError> {
        if !self.pickable(inventory) {
            return Err(inventory.fail(InventoryError::InventoryFull, 0));
        }
        let quantity = match self.pick_quantity(inventory) {
            Ok(0) | Err(_) => return Err(inventory.fail(InventoryError::InventoryFull, 0)),
            Ok(q) => q,
        };
        if !effects.on_pick(&ItemStack::new(self.item.clone(), quantity)) {
            return Err(InventoryError::Declined);
        }
        let stored = inventory.add_item(&self.item, quantity)?;
        self.quantity -= stored;
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::effects::NoEffects;
    use crate::inventory::events::NullSink;
    use crate::inventory::store::InventoryKind;

    fn arrows() -> Arc<ItemType> {
        Arc::new(ItemType::new("arrow").with_max_stack(20))
    }

    fn quiver(capacity: usize) -> Inventory {
        Inventory::new("MainInventory", InventoryKind::Main, capacity, Arc::new(NullSink))
    }

    #[test]
    fn picks_everything_when_it_fits() {
        let mut inv = quiver(2);
        let mut pile = Pickup::new(arrows(), 30);
        assert_eq!(pile.pick(&mut inv, &mut NoEffects), Ok(30));
        assert!(pile.is_depleted());
        assert_eq!(inv.quantity_of("arrow"), 30);
    }

    #[test]
    fn too_large_pile_stays_unless_partial_allowed() {
        let mut inv = quiver(1);
        let mut pile = Pickup::new(arrows(), 25);
        assert_eq!(pile.pick(&mut inv, &mut NoEffects), Err(InventoryError::InventoryFull));
        assert_eq!(pile.quantity, 25);

        pile.pick_as_much_as_possible = true;
        assert_eq!(pile.pick(&mut inv, &mut NoEffects), Ok(20));
        assert_eq!(pile.quantity, 5);
    }

    #[test]
    fn full_inventory_may_still_top_up_stacks() {
        let mut inv = quiver(1);
        inv.add_item(&arrows(), 15).unwrap();
        let mut pile = Pickup::new(arrows(), 5);
        assert!(!pile.pickable(&inv));
        assert_eq!(pile.pick(&mut inv, &mut NoEffects), Err(InventoryError::InventoryFull));

        pile.pickable_if_full = true;
        assert_eq!(pile.pick(&mut inv, &mut NoEffects), Ok(5));
        assert_eq!(inv.quantity_of("arrow"), 20);
    }

    #[test]
    fn huge_max_stack_does_not_overflow_room() {
        let gold = Arc::new(ItemType::new("gold").with_max_stack(u32::MAX));
        let mut inv = quiver(2);
        let mut pile = Pickup::new(gold, 10);
        assert_eq!(pile.pick(&mut inv, &mut NoEffects), Ok(10));
        assert!(pile.is_depleted());
        assert_eq!(inv.quantity_of("gold"), 10);
    }
}
