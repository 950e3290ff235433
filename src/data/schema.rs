use bevy::asset::Asset;
use bevy::reflect::TypePath;
use serde_derive::Deserialize;

use crate::inventory::item::ItemType;

/// items.ron 的顶层结构
#[derive(Asset, TypePath, Deserialize, Debug)]
pub struct ItemList {
    pub items: Vec<ItemType>,
}
