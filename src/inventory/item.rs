use serde_derive::{Deserialize, Serialize};
use std::sync::Arc;

/// 物品所属的大类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ItemClass {
    #[default]
    Neutral,
    Armor,
    Weapon,
    Ammo,
    HealthBonus,
}

/// 静态物品定义（items.ron 中的一条），运行时只读共享
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ItemType {
    pub id: String,
    pub name: String,
    pub short_description: String,
    pub description: String,
    pub class: ItemClass,
    /// 单格最大堆叠数，至少为 1
    pub max_stack: u32,
    pub usable: bool,
    pub equippable: bool,
    pub can_move: bool,
    pub can_swap: bool,
    /// 卸下 / 拾取时放入的背包名
    pub target_inventory: String,
    /// 装备时放入的装备栏名
    pub target_equipment_inventory: Option<String>,
}

impl Default for ItemType {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            short_description: String::new(),
            description: String::new(),
            class: ItemClass::Neutral,
            max_stack: 1,
            usable: false,
            equippable: false,
            can_move: true,
            can_swap: true,
            target_inventory: "MainInventory".to_string(),
            target_equipment_inventory: None,
        }
    }
}

impl ItemType {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            ..Default::default()
        }
    }

    pub fn with_max_stack(mut self, max_stack: u32) -> Self {
        self.max_stack = max_stack;
        self
    }

    pub fn usable(mut self) -> Self {
        self.usable = true;
        self
    }

    pub fn equippable_into(mut self, equipment_inventory: impl Into<String>) -> Self {
        self.equippable = true;
        self.target_equipment_inventory = Some(equipment_inventory.into());
        self
    }

    pub fn with_class(mut self, class: ItemClass) -> Self {
        self.class = class;
        self
    }

    pub fn locked(mut self) -> Self {
        self.can_move = false;
        self.can_swap = false;
        self
    }

    /// 空 id 视为“空物品”
    pub fn is_null(&self) -> bool {
        self.id.is_empty()
    }

    /// 数据表里写 0 也按 1 处理
    pub fn stack_limit(&self) -> u32 {
        self.max_stack.max(1)
    }
}

/// 某一格里的一堆同类物品
#[derive(Debug, Clone, PartialEq)]
pub struct ItemStack {
    pub proto: Arc<ItemType>,
    pub count: u32,
}

impl ItemStack {
    pub fn new(proto: Arc<ItemType>, count: u32) -> Self {
        Self { proto, count }
    }

    pub fn id(&self) -> &str {
        &self.proto.id
    }

    /// 这一格还能再放多少
    pub fn room(&self) -> u32 {
        self.proto.stack_limit().saturating_sub(self.count)
    }

    pub fn is_same_kind(&self, id: &str) -> bool {
        self.proto.id == id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_allow_moving_and_swapping() {
        let item = ItemType::new("stone");
        assert!(item.can_move && item.can_swap);
        assert_eq!(item.max_stack, 1);
        assert_eq!(item.target_inventory, "MainInventory");
        assert!(item.target_equipment_inventory.is_none());
    }

    #[test]
    fn zero_max_stack_still_holds_one() {
        let item = Arc::new(ItemType::new("odd").with_max_stack(0));
        let stack = ItemStack::new(item, 0);
        assert_eq!(stack.room(), 1);
    }
}
