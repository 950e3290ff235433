use bevy::prelude::*;
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::catalog::Catalog;
use super::effects::ItemEffects;
use super::error::{InventoryError, PersistenceError};
use super::events::{EventSink, InventoryEvent, InventoryEventType};
use super::item::{ItemClass, ItemStack, ItemType};
use super::persistence::{SaveStore, SerializedInventory};

/// 普通背包 / 装备栏
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InventoryKind {
    #[default]
    Main,
    Equipment,
}

/// 固定容量的格子背包。所有修改都经过这里的方法，每次调用要么整体生效，要么不改动。
pub struct Inventory {
    name: String,
    kind: InventoryKind,
    slots: Vec<Option<ItemStack>>,
    pub persistent: bool,
    /// 读档前先删掉旧存档
    pub reset_save_on_start: bool,
    sink: Arc<dyn EventSink>,
}

impl fmt::Debug for Inventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inventory")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("slots", &self.slots)
            .field("persistent", &self.persistent)
            .finish()
    }
}

impl Inventory {
    pub fn new(
        name: impl Into<String>,
        kind: InventoryKind,
        capacity: usize,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            slots: vec![None; capacity],
            persistent: true,
            reset_save_on_start: false,
            sink,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> InventoryKind {
        self.kind
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[Option<ItemStack>] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&ItemStack> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /* ---------------------------- 通知 ---------------------------- */

    pub(crate) fn notify(&self, event: InventoryEvent) {
        self.sink.notify(event);
    }

    fn content_changed(&self) {
        self.notify(InventoryEvent::new(InventoryEventType::ContentChanged, &self.name));
    }

    /// 发出 Error 通知并把错误原样返回，便于 `return Err(self.fail(..))`
    pub(crate) fn fail(&self, error: InventoryError, index: usize) -> InventoryError {
        self.notify(
            InventoryEvent::new(InventoryEventType::Error, &self.name)
                .at(index)
                .with_error(error.clone()),
        );
        error
    }

    fn check_index(&self, index: usize) {
        assert!(
            index < self.slots.len(),
            "{}: slot index {index} out of range (capacity {})",
            self.name,
            self.slots.len()
        );
    }

    /* ---------------------------- 查询 ---------------------------- */

    pub fn filled_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn free_slots(&self) -> usize {
        self.capacity() - self.filled_slots()
    }

    /// 所有 id 匹配的格子下标
    pub fn contains(&self, id: &str) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.as_ref().is_some_and(|s| s.is_same_kind(id)))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn contains_class(&self, class: ItemClass) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.as_ref().is_some_and(|s| s.proto.class == class))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn quantity_of(&self, id: &str) -> u32 {
        self.slots
            .iter()
            .flatten()
            .filter(|s| s.is_same_kind(id))
            .fold(0u32, |total, s| total.saturating_add(s.count))
    }

    /// 还能吸收多少个该物品：空格按 max_stack 计，同类格按剩余空间计
    pub fn stackable_capacity(&self, id: &str, max_stack: u32) -> u32 {
        self.slots
            .iter()
            .map(|slot| match slot {
                None => max_stack,
                Some(s) if s.is_same_kind(id) => max_stack.saturating_sub(s.count),
                Some(_) => 0,
            })
            .fold(0u32, u32::saturating_add)
    }

    /* ---------------------------- 修改 ---------------------------- */

    /// 放入物品，先补满已有的同类堆，再按 max_stack 切分放进空格。
    /// 返回实际放入的数量；一个都放不下时返回 `InventoryFull` 且不做任何修改。
    pub fn add_item(&mut self, item: &Arc<ItemType>, quantity: u32) -> Result<u32, InventoryError> {
        if item.is_null() {
            warn!("{}: 要放入的物品没有 id", self.name);
            return Err(self.fail(InventoryError::InvalidItem, 0));
        }
        if quantity == 0 {
            return Ok(0);
        }

        let placements = self.plan_add(item, quantity);
        let stored: u32 = placements.iter().map(|(_, q)| q).sum();
        if stored == 0 {
            return Err(self.fail(InventoryError::InventoryFull, 0));
        }

        for (index, count) in placements {
            match &mut self.slots[index] {
                Some(stack) => stack.count += count,
                slot => *slot = Some(ItemStack::new(item.clone(), count)),
            }
        }
        if stored < quantity {
            warn!(
                "{}: 空间不足，{} ×{} 未能放入",
                self.name,
                item.name,
                quantity - stored
            );
        }
        self.content_changed();
        Ok(stored)
    }

    /// 计算放入方案 (slot, 数量)，不修改背包
    fn plan_add(&self, item: &ItemType, quantity: u32) -> Vec<(usize, u32)> {
        let limit = item.stack_limit();
        let mut remaining = quantity;
        let mut placements = Vec::new();

        for (i, slot) in self.slots.iter().enumerate() {
            if remaining == 0 {
                break;
            }
            if let Some(stack) = slot {
                if stack.is_same_kind(&item.id) && stack.room() > 0 {
                    let take = remaining.min(stack.room());
                    placements.push((i, take));
                    remaining -= take;
                }
            }
        }
        for (i, slot) in self.slots.iter().enumerate() {
            if remaining == 0 {
                break;
            }
            if slot.is_none() {
                let chunk = remaining.min(limit);
                placements.push((i, chunk));
                remaining -= chunk;
            }
        }
        placements
    }

    /// 把 from 格移到 to 格；目标有物品时仅在双方都可交换时互换
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<(), InventoryError> {
        self.check_index(from);
        self.check_index(to);

        let Some(source) = &self.slots[from] else {
            return Err(self.fail(InventoryError::EmptySource, from));
        };
        if from == to {
            return Ok(());
        }
        if let Some(target) = &self.slots[to] {
            if !(source.proto.can_swap && target.proto.can_swap) {
                return Err(self.fail(InventoryError::NotSwappable, from));
            }
            self.slots.swap(from, to);
        } else {
            self.slots[to] = self.slots[from].take();
        }
        self.content_changed();
        Ok(())
    }

    /// 减少 index 格的数量，降到 0 时清空该格
    pub fn remove_item(&mut self, index: usize, quantity: u32) -> Result<(), InventoryError> {
        self.check_index(index);
        let Some(stack) = &mut self.slots[index] else {
            return Err(self.fail(InventoryError::EmptyTarget, index));
        };
        stack.count = stack.count.saturating_sub(quantity);
        if stack.count == 0 {
            self.slots[index] = None;
        }
        self.content_changed();
        Ok(())
    }

    /// 无条件清空该格
    pub fn destroy_item(&mut self, index: usize) -> Option<ItemStack> {
        self.check_index(index);
        let removed = self.slots[index].take();
        self.content_changed();
        removed
    }

    pub fn empty_inventory(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
        self.content_changed();
    }

    /// 调整容量：变小时截掉尾部，变大时补空格
    pub fn resize(&mut self, capacity: usize) {
        self.slots.resize(capacity, None);
    }

    /// 绕过通知直接取出一格，调用方负责后续通知
    pub(crate) fn take_slot(&mut self, index: usize) -> Option<ItemStack> {
        self.slots[index].take()
    }

    pub(crate) fn put_slot(&mut self, index: usize, stack: Option<ItemStack>) {
        self.slots[index] = stack;
    }

    /// 使用物品，成功后消耗 1 个
    pub fn use_item(&mut self, index: usize, effects: &mut dyn ItemEffects) -> Result<(), InventoryError> {
        self.check_index(index);
        let Some(stack) = self.slots[index].clone() else {
            return Err(self.fail(InventoryError::EmptySource, index));
        };
        if !stack.proto.usable {
            return Err(InventoryError::NotUsable);
        }
        if !effects.on_use(&stack, &self.name) {
            return Err(InventoryError::Declined);
        }
        self.remove_item(index, 1)?;
        self.notify(
            InventoryEvent::new(InventoryEventType::ItemUsed, &self.name)
                .at(index)
                .with_item(stack)
                .with_quantity(1),
        );
        Ok(())
    }

    /// 使用最后一个匹配 id 的物品
    pub fn use_item_by_id(&mut self, id: &str, effects: &mut dyn ItemEffects) -> Result<(), InventoryError> {
        match self.contains(id).last() {
            Some(&index) => self.use_item(index, effects),
            None => Err(InventoryError::NotFound(id.to_string())),
        }
    }

    /// 丢弃整格：发出 Drop 通知（宿主据此在场景里生成掉落物）后清空
    pub fn drop_item(&mut self, index: usize, effects: &mut dyn ItemEffects) -> Result<ItemStack, InventoryError> {
        self.check_index(index);
        let Some(stack) = self.slots[index].clone() else {
            return Err(self.fail(InventoryError::EmptySource, index));
        };
        if !effects.on_drop(&stack, &self.name) {
            return Err(InventoryError::Declined);
        }
        self.notify(
            InventoryEvent::new(InventoryEventType::Drop, &self.name)
                .at(index)
                .with_item(stack.clone()),
        );
        self.destroy_item(index);
        Ok(stack)
    }

    /* ---------------------------- 存档 ---------------------------- */

    pub fn snapshot(&self) -> SerializedInventory {
        SerializedInventory {
            name: self.name.clone(),
            kind: self.kind,
            content_type: self
                .slots
                .iter()
                .map(|s| s.as_ref().map(|s| s.proto.id.clone()))
                .collect(),
            content_quantity: self
                .slots
                .iter()
                .map(|s| s.as_ref().map_or(0, |s| s.count))
                .collect(),
        }
    }

    /// 用存档重建格子。解析不到的 id 留空并返回，不会中断整个读档。
    pub fn restore(
        &mut self,
        snapshot: &SerializedInventory,
        catalog: &dyn Catalog,
    ) -> Result<Vec<String>, PersistenceError> {
        snapshot.validate()?;

        let mut missing = Vec::new();
        let mut slots = Vec::with_capacity(snapshot.len());
        for (id, &count) in snapshot.content_type.iter().zip(&snapshot.content_quantity) {
            let stack = match id.as_deref() {
                None | Some("") => None,
                Some(_) if count == 0 => None,
                Some(id) => match catalog.resolve(id) {
                    Some(proto) => {
                        let limit = proto.stack_limit();
                        if count > limit {
                            warn!("{}: {} 数量 {} 超过堆叠上限 {}", self.name, id, count, limit);
                        }
                        Some(ItemStack::new(proto, count.min(limit)))
                    }
                    None => {
                        warn!("{}: 存档中的物品 {} 不存在，该格置空", self.name, id);
                        missing.push(id.to_string());
                        None
                    }
                },
            };
            slots.push(stack);
        }

        self.kind = snapshot.kind;
        self.slots = slots;
        self.notify(InventoryEvent::new(InventoryEventType::InventoryLoaded, &self.name));
        Ok(missing)
    }

    pub fn save(&self, store: &mut dyn SaveStore) -> Result<(), PersistenceError> {
        if !self.persistent {
            return Ok(());
        }
        store.save(&self.name, &self.snapshot())?;
        info!("已保存背包 {}", self.name);
        Ok(())
    }

    /// 读档；没有存档时保持现状。返回解析失败的物品 id。
    pub fn load(
        &mut self,
        store: &mut dyn SaveStore,
        catalog: &dyn Catalog,
    ) -> Result<Vec<String>, PersistenceError> {
        if !self.persistent {
            return Ok(Vec::new());
        }
        if self.reset_save_on_start {
            self.reset_saved(store)?;
        }
        match store.load(&self.name)? {
            Some(snapshot) => {
                let missing = self.restore(&snapshot, catalog)?;
                info!("已读取背包 {}", self.name);
                Ok(missing)
            }
            None => Ok(Vec::new()),
        }
    }

    pub fn reset_saved(&self, store: &mut dyn SaveStore) -> Result<(), PersistenceError> {
        store.delete(&self.name)?;
        info!("已删除背包存档 {}", self.name);
        Ok(())
    }
}
