use anyhow::{Context, Result};
use bevy::prelude::*;
use serde_derive::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::inventory::store::InventoryKind;

/// 默认配置文件位置
pub const CONFIG_PATH: &str = "config/game.toml";

/// 一个背包的配置
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InventoryConfig {
    pub name: String,
    #[serde(default)]
    pub kind: InventoryKind,
    pub capacity: usize,
    #[serde(default = "default_true")]
    pub persistent: bool,
    #[serde(default)]
    pub reset_save_on_start: bool,
}

fn default_true() -> bool {
    true
}

/// 全局配置（config/game.toml）
#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// 相对 assets/ 的物品表路径
    pub items_path: String,
    pub save_dir: PathBuf,
    pub inventories: Vec<InventoryConfig>,
}

impl Default for GameConfig {
    fn default() -> Self {
        let equipment = |name: &str| InventoryConfig {
            name: name.to_string(),
            kind: InventoryKind::Equipment,
            capacity: 1,
            persistent: true,
            reset_save_on_start: false,
        };
        Self {
            items_path: "data/items.ron".to_string(),
            save_dir: PathBuf::from("saves"),
            inventories: vec![
                InventoryConfig {
                    name: "MainInventory".to_string(),
                    kind: InventoryKind::Main,
                    capacity: 24,
                    persistent: true,
                    reset_save_on_start: false,
                },
                equipment("WeaponInventory"),
                equipment("ArmorInventory"),
            ],
        }
    }
}

impl GameConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml(&data).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml(data: &str) -> Result<Self> {
        let cfg: GameConfig = toml::from_str(data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// 读不到或有误时退回默认配置
    pub fn load_or_default(path: &Path) -> Self {
        match Self::from_path(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("配置加载失败，使用默认配置: {e:#}");
                Self::default()
            }
        }
    }

    fn validate(&self) -> Result<()> {
        for inv in &self.inventories {
            if inv.name.is_empty() {
                anyhow::bail!("inventory with empty name");
            }
            if inv.capacity == 0 {
                anyhow::bail!("inventory {} has zero capacity", inv.name);
            }
        }
        Ok(())
    }
}
