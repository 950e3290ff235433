use bevy::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

use super::item::ItemType;

/// 按 id 解析物品定义
pub trait Catalog {
    fn resolve(&self, id: &str) -> Option<Arc<ItemType>>;
}

/// 从 items.ron 构建的物品表
#[derive(Resource, Default, Debug, Clone)]
pub struct ItemCatalog {
    items: HashMap<String, Arc<ItemType>>,
    /// 保留数据表中的顺序，便于列出
    order: Vec<String>,
}

impl ItemCatalog {
    pub fn new(items: impl IntoIterator<Item = ItemType>) -> Self {
        let mut catalog = Self::default();
        for item in items {
            catalog.insert(item);
        }
        catalog
    }

    /// 同 id 后者覆盖前者
    pub fn insert(&mut self, item: ItemType) {
        if item.is_null() {
            warn!("忽略没有 id 的物品定义: {}", item.name);
            return;
        }
        if self.items.contains_key(&item.id) {
            warn!("重复的物品 id {}，使用后一条定义", item.id);
        } else {
            self.order.push(item.id.clone());
        }
        self.items.insert(item.id.clone(), Arc::new(item));
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ItemType>> {
        self.order.iter().filter_map(|id| self.items.get(id))
    }

    /// 不区分大小写地按 id 或名称查找（CLI 用）
    pub fn find_loose(&self, token: &str) -> Option<Arc<ItemType>> {
        self.resolve(token).or_else(|| {
            self.iter()
                .find(|e| e.id.eq_ignore_ascii_case(token) || e.name.eq_ignore_ascii_case(token))
                .cloned()
        })
    }
}

impl Catalog for ItemCatalog {
    fn resolve(&self, id: &str) -> Option<Arc<ItemType>> {
        self.items.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_definition_wins_and_order_is_kept() {
        let catalog = ItemCatalog::new([
            ItemType::new("potion").with_max_stack(5),
            ItemType::new("sword"),
            ItemType::new("potion").with_max_stack(10),
        ]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.resolve("potion").map(|p| p.max_stack), Some(10));
        let ids: Vec<_> = catalog.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["potion", "sword"]);
    }

    #[test]
    fn loose_lookup_ignores_case() {
        let mut sword = ItemType::new("iron_sword");
        sword.name = "Iron Sword".into();
        let catalog = ItemCatalog::new([sword]);
        assert!(catalog.find_loose("IRON_SWORD").is_some());
        assert!(catalog.find_loose("iron sword").is_some());
        assert!(catalog.resolve("IRON_SWORD").is_none());
    }

    #[test]
    fn null_items_are_skipped() {
        let catalog = ItemCatalog::new([ItemType::default()]);
        assert!(catalog.is_empty());
    }
}
