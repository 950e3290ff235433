use bevy::prelude::*;
use std::collections::BTreeMap;

use super::catalog::Catalog;
use super::effects::ItemEffects;
use super::error::{InventoryError, PersistenceError};
use super::events::{InventoryEvent, InventoryEventType};
use super::persistence::SaveStore;
use super::store::Inventory;

/// 所有存活的背包，按名字查找
#[derive(Resource, Default, Debug)]
pub struct Inventories {
    pub(crate) by_name: BTreeMap<String, Inventory>,
}

impl Inventories {
    /// 同名背包会被替换
    pub fn insert(&mut self, inventory: Inventory) -> Option<Inventory> {
        self.by_name.insert(inventory.name().to_string(), inventory)
    }

    pub fn find(&self, name: &str) -> Option<&Inventory> {
        self.by_name.get(name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Inventory> {
        self.by_name.get_mut(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// 处理一条请求事件，返回操作结果。目标背包不存在时返回 `NotFound`。
    pub fn handle(
        &mut self,
        request: &InventoryEvent,
        effects: &mut dyn ItemEffects,
    ) -> Result<(), InventoryError> {
        let name = request.inventory.as_str();
        let Some(capacity) = self.by_name.get(name).map(Inventory::capacity) else {
            warn!("请求的背包 {} 不存在", name);
            return Err(InventoryError::NotFound(name.to_string()));
        };
        // 请求来自外部输入，越界在这里拦下，不让它走到背包内部的断言
        if request.kind != InventoryEventType::Pick {
            for index in std::iter::once(request.index).chain(request.target_index) {
                if index >= capacity {
                    warn!("{}: 格子 {} 超出范围（容量 {}）", name, index, capacity);
                    return Err(InventoryError::OutOfRange { index, capacity });
                }
            }
        }

        match request.kind {
            InventoryEventType::EquipRequest => return self.equip(name, request.index, effects),
            InventoryEventType::UnEquipRequest => return self.unequip(name, request.index, effects),
            _ => {}
        }

        let Some(inventory) = self.by_name.get_mut(name) else {
            return Err(InventoryError::NotFound(name.to_string()));
        };
        match request.kind {
            InventoryEventType::Pick => {
                let Some(stack) = &request.item else {
                    return Err(inventory.fail(InventoryError::InvalidItem, request.index));
                };
                if !effects.on_pick(stack) {
                    return Err(InventoryError::Declined);
                }
                inventory.add_item(&stack.proto, request.quantity).map(|_| ())
            }
            InventoryEventType::UseRequest => inventory.use_item(request.index, effects),
            InventoryEventType::Drop => inventory.drop_item(request.index, effects).map(|_| ()),
            InventoryEventType::Destroy => {
                if inventory.slot(request.index).is_none() {
                    return Err(inventory.fail(InventoryError::EmptySource, request.index));
                }
                inventory.destroy_item(request.index);
                Ok(())
            }
            InventoryEventType::Move => {
                let to = request.target_index.unwrap_or(request.index);
                inventory.move_item(request.index, to)
            }
            other => {
                debug!("{}: 忽略非请求事件 {:?}", name, other);
                Ok(())
            }
        }
    }

    /// 保存所有需要持久化的背包
    pub fn save_all(&self, store: &mut dyn SaveStore) -> Result<(), PersistenceError> {
        for inventory in self.by_name.values() {
            inventory.save(store)?;
        }
        Ok(())
    }

    /// 读取所有需要持久化的背包。单个背包读档失败只记录，不影响其它背包。
    pub fn load_all(&mut self, store: &mut dyn SaveStore, catalog: &dyn Catalog) -> Vec<String> {
        let mut missing = Vec::new();
        for inventory in self.by_name.values_mut() {
            match inventory.load(store, catalog) {
                Ok(ids) => missing.extend(ids),
                Err(e) => warn!("读取背包 {} 失败: {}", inventory.name(), e),
            }
        }
        missing
    }

    /// 借出目标背包做跨背包操作，结束后必须 `restore_target` 放回
    pub(crate) fn lend(&mut self, name: &str) -> Option<Inventory> {
        self.by_name.remove(name)
    }

    pub(crate) fn restore_target(&mut self, inventory: Inventory) {
        self.by_name.insert(inventory.name().to_string(), inventory);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::effects::NoEffects;
    use crate::inventory::events::EventQueue;
    use crate::inventory::item::{ItemStack, ItemType};
    use crate::inventory::store::InventoryKind;
    use std::sync::Arc;

    /// 拒绝一切拾取
    struct NoPickup;
    impl ItemEffects for NoPickup {
        fn on_pick(&mut self, _stack: &ItemStack) -> bool {
            false
        }
    }

    fn potion() -> Arc<ItemType> {
        Arc::new(ItemType::new("potion").with_max_stack(5))
    }

    fn directory(queue: &EventQueue) -> Inventories {
        let mut inventories = Inventories::default();
        inventories.insert(Inventory::new("MainInventory", InventoryKind::Main, 2, queue.sink()));
        inventories
    }

    #[test]
    fn refused_pick_request_stores_nothing() {
        let queue = EventQueue::default();
        let mut inventories = directory(&queue);
        let pick = InventoryEvent::new(InventoryEventType::Pick, "MainInventory")
            .with_item(ItemStack::new(potion(), 3));

        assert_eq!(inventories.handle(&pick, &mut NoPickup), Err(InventoryError::Declined));
        assert_eq!(inventories.find("MainInventory").unwrap().filled_slots(), 0);
        assert!(queue.drain().is_empty());

        inventories.handle(&pick, &mut NoEffects).unwrap();
        assert_eq!(inventories.find("MainInventory").unwrap().quantity_of("potion"), 3);
    }

    #[test]
    fn pick_request_without_item_is_invalid() {
        let queue = EventQueue::default();
        let mut inventories = directory(&queue);
        let pick = InventoryEvent::new(InventoryEventType::Pick, "MainInventory");
        assert_eq!(inventories.handle(&pick, &mut NoEffects), Err(InventoryError::InvalidItem));
    }

    #[test]
    fn move_request_checks_both_indices() {
        let queue = EventQueue::default();
        let mut inventories = directory(&queue);
        let mv = InventoryEvent::new(InventoryEventType::Move, "MainInventory").at(0).to(5);
        assert_eq!(
            inventories.handle(&mv, &mut NoEffects),
            Err(InventoryError::OutOfRange { index: 5, capacity: 2 })
        );
    }
}
