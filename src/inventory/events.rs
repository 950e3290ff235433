use bevy::prelude::*;
use std::sync::{Arc, Mutex, PoisonError};

use super::error::InventoryError;
use super::item::ItemStack;

/// 背包相关事件的种类：既有请求（*Request / Pick / Move / Drop / Destroy），也有结果通知
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InventoryEventType {
    Pick,
    UseRequest,
    ItemUsed,
    EquipRequest,
    ItemEquipped,
    UnEquipRequest,
    ItemUnEquipped,
    Move,
    Drop,
    Destroy,
    Error,
    ContentChanged,
    InventoryLoaded,
}

/// 一次背包事件
#[derive(Event, Debug, Clone, PartialEq)]
pub struct InventoryEvent {
    pub kind: InventoryEventType,
    /// 事件发生的背包名
    pub inventory: String,
    pub index: usize,
    pub item: Option<ItemStack>,
    pub quantity: u32,
    /// Move 请求的目标格
    pub target_index: Option<usize>,
    pub error: Option<InventoryError>,
}

impl InventoryEvent {
    pub fn new(kind: InventoryEventType, inventory: impl Into<String>) -> Self {
        Self {
            kind,
            inventory: inventory.into(),
            index: 0,
            item: None,
            quantity: 0,
            target_index: None,
            error: None,
        }
    }

    pub fn at(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    pub fn with_item(mut self, stack: ItemStack) -> Self {
        self.quantity = stack.count;
        self.item = Some(stack);
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn to(mut self, target_index: usize) -> Self {
        self.target_index = Some(target_index);
        self
    }

    pub fn with_error(mut self, error: InventoryError) -> Self {
        self.error = Some(error);
        self
    }
}

/// 接收背包通知的出口，构造背包时注入
pub trait EventSink: Send + Sync {
    fn notify(&self, event: InventoryEvent);
}

/// 丢弃所有通知
pub struct NullSink;

impl EventSink for NullSink {
    fn notify(&self, _event: InventoryEvent) {}
}

/// 共享的通知队列，所有背包写入，宿主每帧取出
#[derive(Resource, Clone, Default)]
pub struct EventQueue {
    inner: Arc<Mutex<Vec<InventoryEvent>>>,
}

impl EventQueue {
    pub fn drain(&self) -> Vec<InventoryEvent> {
        let mut buf = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *buf)
    }

    pub fn sink(&self) -> Arc<dyn EventSink> {
        Arc::new(self.clone())
    }
}

impl EventSink for EventQueue {
    fn notify(&self, event: InventoryEvent) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// 存档 / 读档等全局请求
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    Save,
    Load,
}

/// 发给背包的请求，由 `Inventories::handle` 分发
#[derive(Event, Debug, Clone)]
pub struct InventoryRequest(pub InventoryEvent);

/// 让 CLI 请求打印背包；None 表示主背包
#[derive(Event)]
pub struct ListInventoryEvent(pub Option<String>);
