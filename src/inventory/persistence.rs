use bevy::prelude::*;
use serde_derive::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use super::error::PersistenceError;
use super::store::InventoryKind;

/// 存档文件后缀
pub const SAVE_FILE_EXTENSION: &str = "inventory";

/// 背包的存档形式：两个与格子一一对应的平行数组
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedInventory {
    pub name: String,
    pub kind: InventoryKind,
    pub content_type: Vec<Option<String>>,
    pub content_quantity: Vec<u32>,
}

impl SerializedInventory {
    pub fn len(&self) -> usize {
        self.content_type.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content_type.is_empty()
    }

    pub fn validate(&self) -> Result<(), PersistenceError> {
        if self.content_type.len() != self.content_quantity.len() {
            return Err(PersistenceError::Malformed {
                name: self.name.clone(),
                details: format!(
                    "{} item ids but {} quantities",
                    self.content_type.len(),
                    self.content_quantity.len()
                ),
            });
        }
        Ok(())
    }
}

/// 存档读写，按背包名索引
pub trait SaveStore {
    fn save(&mut self, name: &str, snapshot: &SerializedInventory) -> Result<(), PersistenceError>;
    /// 没有存档时返回 Ok(None)
    fn load(&self, name: &str) -> Result<Option<SerializedInventory>, PersistenceError>;
    fn delete(&mut self, name: &str) -> Result<(), PersistenceError>;
}

/// 每个背包一个 JSON 文件：`<dir>/<name>.inventory`
#[derive(Resource, Debug, Clone)]
pub struct FileSaveStore {
    dir: PathBuf,
}

impl FileSaveStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{SAVE_FILE_EXTENSION}"))
    }
}

impl SaveStore for FileSaveStore {
    fn save(&mut self, name: &str, snapshot: &SerializedInventory) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(self.path_for(name), json)?;
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Option<SerializedInventory>, PersistenceError> {
        let text = match fs::read_to_string(self.path_for(name)) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snapshot: SerializedInventory = serde_json::from_str(&text)?;
        snapshot.validate()?;
        Ok(Some(snapshot))
    }

    fn delete(&mut self, name: &str) -> Result<(), PersistenceError> {
        match fs::remove_file(self.path_for(name)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// 内存存档，测试和不落盘的场景用
#[derive(Debug, Default, Clone)]
pub struct MemorySaveStore {
    saves: HashMap<String, SerializedInventory>,
}

impl MemorySaveStore {
    pub fn contains(&self, name: &str) -> bool {
        self.saves.contains_key(name)
    }
}

impl SaveStore for MemorySaveStore {
    fn save(&mut self, name: &str, snapshot: &SerializedInventory) -> Result<(), PersistenceError> {
        self.saves.insert(name.to_string(), snapshot.clone());
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Option<SerializedInventory>, PersistenceError> {
        match self.saves.get(name) {
            Some(snapshot) => {
                snapshot.validate()?;
                Ok(Some(snapshot.clone()))
            }
            None => Ok(None),
        }
    }

    fn delete(&mut self, name: &str) -> Result<(), PersistenceError> {
        self.saves.remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> SerializedInventory {
        SerializedInventory {
            name: "Bag".into(),
            kind: InventoryKind::Main,
            content_type: vec![Some("potion".into()), None],
            content_quantity: vec![3, 0],
        }
    }

    #[test]
    fn file_store_writes_reads_and_deletes() {
        let dir = std::env::temp_dir().join(format!(
            "gamekit_inventory_test_{}",
            uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, format!("{}", std::process::id()).as_bytes())
        ));
        let mut store = FileSaveStore::new(&dir);
        assert!(store.load("Bag").unwrap().is_none());

        store.save("Bag", &snapshot()).unwrap();
        assert!(dir.join("Bag.inventory").exists());
        assert_eq!(store.load("Bag").unwrap(), Some(snapshot()));

        store.delete("Bag").unwrap();
        assert!(store.load("Bag").unwrap().is_none());
        // 删除不存在的存档不算错误
        store.delete("Bag").unwrap();
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn mismatched_arrays_are_rejected() {
        let mut store = MemorySaveStore::default();
        let mut bad = snapshot();
        bad.content_quantity.pop();
        store.save("Bag", &bad).unwrap();
        assert!(matches!(
            store.load("Bag"),
            Err(PersistenceError::Malformed { .. })
        ));
    }
}
