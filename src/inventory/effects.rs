use super::item::ItemStack;

/// 物品行为钩子。返回 false 表示该物品拒绝这次操作，背包内容保持不变。
pub trait ItemEffects {
    fn on_pick(&mut self, _stack: &ItemStack) -> bool {
        true
    }

    fn on_use(&mut self, _stack: &ItemStack, _inventory: &str) -> bool {
        true
    }

    fn on_equip(&mut self, _stack: &ItemStack, _inventory: &str) -> bool {
        true
    }

    fn on_unequip(&mut self, _stack: &ItemStack, _inventory: &str) -> bool {
        true
    }

    /// 被新装备挤下来时调用
    fn on_swap(&mut self, _stack: &ItemStack) {}

    fn on_drop(&mut self, _stack: &ItemStack, _inventory: &str) -> bool {
        true
    }
}

/// 没有任何特殊行为的物品
pub struct NoEffects;

impl ItemEffects for NoEffects {}
