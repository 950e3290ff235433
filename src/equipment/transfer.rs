use bevy::prelude::*;

use crate::inventory::directory::Inventories;
use crate::inventory::effects::ItemEffects;
use crate::inventory::error::InventoryError;
use crate::inventory::events::{InventoryEvent, InventoryEventType};
use crate::inventory::item::ItemStack;
use crate::inventory::store::InventoryKind;

impl Inventories {
    /// 把 source 背包 index 格的物品装备到它声明的装备栏。
    /// 单格装备栏里已有可交换的装备时，旧装备被换回 source。
    pub fn equip(
        &mut self,
        source_name: &str,
        index: usize,
        effects: &mut dyn ItemEffects,
    ) -> Result<(), InventoryError> {
        let Some(source) = self.find(source_name) else {
            return Err(InventoryError::NotFound(source_name.to_string()));
        };
        // 装备栏里的物品不能再“装备”
        if source.kind() != InventoryKind::Main {
            return Err(InventoryError::WrongKind);
        }
        let Some(stack) = source.slot(index).cloned() else {
            return Err(source.fail(InventoryError::EmptySource, index));
        };
        if !stack.proto.equippable {
            return Err(source.fail(InventoryError::NotEquippable, index));
        }
        let target_name = stack
            .proto
            .target_equipment_inventory
            .clone()
            .unwrap_or_default();
        let Some(target) = self.find(&target_name).filter(|_| target_name != source_name) else {
            warn!("{} 的装备栏 {:?} 不存在", stack.proto.name, target_name);
            return Err(source.fail(InventoryError::NotFound(target_name), index));
        };
        if target.kind() != InventoryKind::Equipment {
            warn!("{} 不是装备栏，{} 无法装备", target_name, stack.proto.name);
            return Err(source.fail(InventoryError::WrongKind, index));
        }
        if !stack.proto.can_move {
            return Err(source.fail(InventoryError::NotMovable, index));
        }
        if !effects.on_equip(&stack, &target_name) {
            return Err(InventoryError::Declined);
        }

        let Some(mut target) = self.lend(&target_name) else {
            return Err(InventoryError::NotFound(target_name));
        };
        let mut evicted = None;
        if target.capacity() == 1 {
            if let Some(occupant) = target.slot(0) {
                if stack.proto.can_swap && occupant.proto.can_move && occupant.proto.can_swap {
                    evicted = target.take_slot(0);
                }
            }
        }
        let stored = match target.add_item(&stack.proto, stack.count) {
            Ok(stored) => stored,
            Err(e) => {
                if evicted.is_some() {
                    target.put_slot(0, evicted);
                }
                self.restore_target(target);
                return Err(e);
            }
        };
        self.restore_target(target);

        let Some(source) = self.find_mut(source_name) else {
            return Err(InventoryError::NotFound(source_name.to_string()));
        };
        source.remove_item(index, stored)?;
        if let Some(old) = evicted {
            effects.on_swap(&old);
            return_to(source, old);
        }
        source.notify(
            InventoryEvent::new(InventoryEventType::ItemEquipped, source_name)
                .at(index)
                .with_item(stack)
                .with_quantity(stored),
        );
        Ok(())
    }

    /// 卸下装备栏 index 格的物品，放回它声明的背包。
    /// 目标背包放不下的部分发出 Drop 通知，并留在装备栏。
    pub fn unequip(
        &mut self,
        equipment_name: &str,
        index: usize,
        effects: &mut dyn ItemEffects,
    ) -> Result<(), InventoryError> {
        let Some(equipment) = self.find(equipment_name) else {
            return Err(InventoryError::NotFound(equipment_name.to_string()));
        };
        let Some(stack) = equipment.slot(index).cloned() else {
            return Err(equipment.fail(InventoryError::EmptySource, index));
        };
        if equipment.kind() != InventoryKind::Equipment {
            return Err(equipment.fail(InventoryError::WrongKind, index));
        }
        if !effects.on_unequip(&stack, equipment_name) {
            return Err(InventoryError::Declined);
        }
        equipment.notify(
            InventoryEvent::new(InventoryEventType::ItemUnEquipped, equipment_name)
                .at(index)
                .with_item(stack.clone()),
        );

        let target_name = stack.proto.target_inventory.clone();
        if target_name == equipment_name || self.find(&target_name).is_none() {
            warn!("{} 的目标背包 {} 不存在", stack.proto.name, target_name);
            return Err(equipment.fail(InventoryError::NotFound(target_name), index));
        }
        let Some(mut target) = self.lend(&target_name) else {
            return Err(InventoryError::NotFound(target_name));
        };
        let added = target.add_item(&stack.proto, stack.count);
        self.restore_target(target);

        let Some(equipment) = self.find_mut(equipment_name) else {
            return Err(InventoryError::NotFound(equipment_name.to_string()));
        };
        match added {
            Ok(stored) if stored >= stack.count => {
                equipment.destroy_item(index);
                Ok(())
            }
            Ok(stored) => {
                equipment.remove_item(index, stored)?;
                let leftover = stack.count - stored;
                warn!("{} 已满，{} ×{} 留在装备栏", target_name, stack.proto.name, leftover);
                equipment.notify(
                    InventoryEvent::new(InventoryEventType::Drop, equipment_name)
                        .at(index)
                        .with_item(ItemStack::new(stack.proto, leftover)),
                );
                Ok(())
            }
            Err(e) => {
                warn!("{} 已满，{} 无法卸下", target_name, stack.proto.name);
                equipment.notify(
                    InventoryEvent::new(InventoryEventType::Drop, equipment_name)
                        .at(index)
                        .with_item(stack),
                );
                Err(e)
            }
        }
    }
}

/// 把换下来的旧装备放回背包，放不下的部分以 Drop 通知交给宿主
fn return_to(inventory: &mut crate::inventory::store::Inventory, old: ItemStack) {
    let leftover = match inventory.add_item(&old.proto, old.count) {
        Ok(stored) => old.count - stored,
        Err(_) => old.count,
    };
    if leftover > 0 {
        warn!("{} 已满，换下的 {} ×{} 掉落", inventory.name(), old.proto.name, leftover);
        let name = inventory.name().to_string();
        inventory.notify(
            InventoryEvent::new(InventoryEventType::Drop, name).with_item(ItemStack::new(old.proto, leftover)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::effects::NoEffects;
    use crate::inventory::events::EventQueue;
    use crate::inventory::item::ItemType;
    use crate::inventory::store::Inventory;
    use std::sync::Arc;

    fn sword(id: &str) -> Arc<ItemType> {
        Arc::new(ItemType::new(id).equippable_into("WeaponInventory"))
    }

    fn setup(main_capacity: usize) -> (Inventories, EventQueue) {
        let queue = EventQueue::default();
        let mut inventories = Inventories::default();
        inventories.insert(Inventory::new("MainInventory", InventoryKind::Main, main_capacity, queue.sink()));
        inventories.insert(Inventory::new("WeaponInventory", InventoryKind::Equipment, 1, queue.sink()));
        (inventories, queue)
    }

    fn ids(inventories: &Inventories, name: &str) -> Vec<Option<String>> {
        inventories.find(name).unwrap().snapshot().content_type
    }

    #[test]
    fn equip_swaps_out_the_incumbent() {
        let (mut inv, queue) = setup(3);
        inv.find_mut("WeaponInventory").unwrap().add_item(&sword("a"), 1).unwrap();
        inv.find_mut("MainInventory").unwrap().add_item(&sword("b"), 1).unwrap();
        queue.drain();

        inv.equip("MainInventory", 0, &mut NoEffects).unwrap();
        assert_eq!(ids(&inv, "WeaponInventory"), [Some("b".to_string())]);
        assert_eq!(ids(&inv, "MainInventory"), [Some("a".to_string()), None, None]);
        let equipped: Vec<_> = queue
            .drain()
            .into_iter()
            .filter(|e| e.kind == InventoryEventType::ItemEquipped)
            .collect();
        assert_eq!(equipped.len(), 1);
        assert_eq!(equipped[0].item.as_ref().map(|s| s.id()), Some("b"));
    }

    #[test]
    fn equip_into_locked_slot_changes_nothing() {
        let (mut inv, _queue) = setup(2);
        let cursed = Arc::new(ItemType::new("cursed").equippable_into("WeaponInventory").locked());
        inv.find_mut("WeaponInventory").unwrap().add_item(&cursed, 1).unwrap();
        inv.find_mut("MainInventory").unwrap().add_item(&sword("b"), 1).unwrap();

        assert_eq!(
            inv.equip("MainInventory", 0, &mut NoEffects),
            Err(InventoryError::InventoryFull)
        );
        assert_eq!(ids(&inv, "WeaponInventory"), [Some("cursed".to_string())]);
        assert_eq!(ids(&inv, "MainInventory"), [Some("b".to_string()), None]);
    }

    #[test]
    fn equip_preconditions_report_errors() {
        let (mut inv, queue) = setup(3);
        let main = inv.find_mut("MainInventory").unwrap();
        main.add_item(&Arc::new(ItemType::new("rock")), 1).unwrap();
        main.add_item(&Arc::new(ItemType::new("orphan").equippable_into("Nowhere")), 1)
            .unwrap();
        queue.drain();

        assert_eq!(inv.equip("MainInventory", 0, &mut NoEffects), Err(InventoryError::NotEquippable));
        assert_eq!(
            inv.equip("MainInventory", 1, &mut NoEffects),
            Err(InventoryError::NotFound("Nowhere".into()))
        );
        assert_eq!(inv.equip("MainInventory", 2, &mut NoEffects), Err(InventoryError::EmptySource));
        let errors = queue
            .drain()
            .into_iter()
            .filter(|e| e.kind == InventoryEventType::Error)
            .count();
        assert_eq!(errors, 3);
        // 装备栏本身不能 equip
        assert_eq!(inv.equip("WeaponInventory", 0, &mut NoEffects), Err(InventoryError::WrongKind));
    }

    #[test]
    fn unequip_returns_item_to_its_inventory() {
        let (mut inv, _queue) = setup(2);
        inv.find_mut("WeaponInventory").unwrap().add_item(&sword("a"), 1).unwrap();

        inv.unequip("WeaponInventory", 0, &mut NoEffects).unwrap();
        assert_eq!(ids(&inv, "WeaponInventory"), [None]);
        assert_eq!(ids(&inv, "MainInventory"), [Some("a".to_string()), None]);
    }

    #[test]
    fn unequip_into_full_inventory_stays_equipped() {
        let (mut inv, queue) = setup(1);
        inv.find_mut("WeaponInventory").unwrap().add_item(&sword("a"), 1).unwrap();
        inv.find_mut("MainInventory").unwrap().add_item(&sword("b"), 1).unwrap();
        queue.drain();

        assert_eq!(
            inv.unequip("WeaponInventory", 0, &mut NoEffects),
            Err(InventoryError::InventoryFull)
        );
        assert_eq!(ids(&inv, "WeaponInventory"), [Some("a".to_string())]);
        assert!(queue.drain().iter().any(|e| e.kind == InventoryEventType::Drop));
    }

    #[test]
    fn unequip_from_main_is_an_error() {
        let (mut inv, _queue) = setup(1);
        inv.find_mut("MainInventory").unwrap().add_item(&sword("a"), 1).unwrap();
        assert_eq!(inv.unequip("MainInventory", 0, &mut NoEffects), Err(InventoryError::WrongKind));
    }

    #[test]
    fn swapped_item_gets_the_swap_hook() {
        #[derive(Default)]
        struct Recorder(Vec<String>);
        impl ItemEffects for Recorder {
            fn on_swap(&mut self, stack: &ItemStack) {
                self.0.push(stack.id().to_string());
            }
        }

        let (mut inv, _queue) = setup(2);
        inv.find_mut("WeaponInventory").unwrap().add_item(&sword("a"), 1).unwrap();
        inv.find_mut("MainInventory").unwrap().add_item(&sword("b"), 1).unwrap();
        let mut recorder = Recorder::default();
        inv.equip("MainInventory", 0, &mut recorder).unwrap();
        assert_eq!(recorder.0, ["a"]);
    }

    /// 所有钩子都拒绝
    struct Refuse;
    impl ItemEffects for Refuse {
        fn on_equip(&mut self, _stack: &ItemStack, _inventory: &str) -> bool {
            false
        }
        fn on_unequip(&mut self, _stack: &ItemStack, _inventory: &str) -> bool {
            false
        }
    }

    #[test]
    fn immovable_item_cannot_be_equipped() {
        let (mut inv, queue) = setup(2);
        let bound = Arc::new(ItemType::new("bound").equippable_into("WeaponInventory").locked());
        inv.find_mut("MainInventory").unwrap().add_item(&bound, 1).unwrap();
        queue.drain();

        assert_eq!(inv.equip("MainInventory", 0, &mut NoEffects), Err(InventoryError::NotMovable));
        assert_eq!(ids(&inv, "MainInventory"), [Some("bound".to_string()), None]);
        assert_eq!(ids(&inv, "WeaponInventory"), [None]);
        assert!(queue.drain().iter().any(|e| e.kind == InventoryEventType::Error
            && e.error == Some(InventoryError::NotMovable)));
    }

    #[test]
    fn refused_hooks_leave_both_inventories_alone() {
        let (mut inv, _queue) = setup(2);
        inv.find_mut("MainInventory").unwrap().add_item(&sword("b"), 1).unwrap();
        inv.find_mut("WeaponInventory").unwrap().add_item(&sword("a"), 1).unwrap();

        assert_eq!(inv.equip("MainInventory", 0, &mut Refuse), Err(InventoryError::Declined));
        assert_eq!(inv.unequip("WeaponInventory", 0, &mut Refuse), Err(InventoryError::Declined));
        assert_eq!(ids(&inv, "MainInventory"), [Some("b".to_string()), None]);
        assert_eq!(ids(&inv, "WeaponInventory"), [Some("a".to_string())]);
    }

    #[test]
    fn unequip_to_missing_inventory_is_not_found() {
        let queue = EventQueue::default();
        let mut inv = Inventories::default();
        inv.insert(Inventory::new("WeaponInventory", InventoryKind::Equipment, 1, queue.sink()));
        inv.find_mut("WeaponInventory").unwrap().add_item(&sword("a"), 1).unwrap();

        assert_eq!(
            inv.unequip("WeaponInventory", 0, &mut NoEffects),
            Err(InventoryError::NotFound("MainInventory".into()))
        );
        assert_eq!(ids(&inv, "WeaponInventory"), [Some("a".to_string())]);
    }

    #[test]
    fn equip_into_a_main_inventory_is_wrong_kind() {
        let (mut inv, queue) = setup(2);
        inv.insert(Inventory::new("Chest", InventoryKind::Main, 4, queue.sink()));
        let odd = Arc::new(ItemType::new("odd").equippable_into("Chest"));
        inv.find_mut("MainInventory").unwrap().add_item(&odd, 1).unwrap();
        queue.drain();

        assert_eq!(inv.equip("MainInventory", 0, &mut NoEffects), Err(InventoryError::WrongKind));
        assert_eq!(ids(&inv, "MainInventory"), [Some("odd".to_string()), None]);
        assert_eq!(inv.find("Chest").unwrap().filled_slots(), 0);
        assert!(queue.drain().iter().any(|e| e.kind == InventoryEventType::Error));
    }

    #[test]
    fn partial_unequip_reports_the_stuck_remainder() {
        let queue = EventQueue::default();
        let mut inv = Inventories::default();
        inv.insert(Inventory::new("MainInventory", InventoryKind::Main, 1, queue.sink()));
        inv.insert(Inventory::new("Quiver", InventoryKind::Equipment, 1, queue.sink()));
        let arrows = Arc::new(ItemType::new("arrow").with_max_stack(20).equippable_into("Quiver"));
        inv.find_mut("MainInventory").unwrap().add_item(&arrows, 17).unwrap();
        inv.find_mut("Quiver").unwrap().add_item(&arrows, 5).unwrap();
        queue.drain();

        inv.unequip("Quiver", 0, &mut NoEffects).unwrap();
        assert_eq!(inv.find("MainInventory").unwrap().quantity_of("arrow"), 20);
        assert_eq!(inv.find("Quiver").unwrap().quantity_of("arrow"), 2);
        let drops: Vec<_> = queue
            .drain()
            .into_iter()
            .filter(|e| e.kind == InventoryEventType::Drop)
            .collect();
        assert_eq!(drops.len(), 1);
        assert_eq!(drops[0].inventory, "Quiver");
        assert_eq!(drops[0].item.as_ref().map(|s| s.count), Some(2));
    }
}
