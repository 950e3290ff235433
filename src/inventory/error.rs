//! 背包操作的错误类型

use thiserror::Error;

/// 可恢复的背包操作失败。越界索引不在此列，属于调用方 bug，会直接 panic。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("item has no id")]
    InvalidItem,
    #[error("inventory is full")]
    InventoryFull,
    #[error("source slot is empty")]
    EmptySource,
    #[error("target slot is empty")]
    EmptyTarget,
    #[error("item cannot be swapped")]
    NotSwappable,
    #[error("item cannot be moved")]
    NotMovable,
    #[error("item is not usable")]
    NotUsable,
    #[error("item is not equippable")]
    NotEquippable,
    #[error("inventory not found: {0}")]
    NotFound(String),
    #[error("operation not allowed on this kind of inventory")]
    WrongKind,
    /// 只由请求分发使用；直接调用背包方法时越界会 panic
    #[error("slot {index} out of range (capacity {capacity})")]
    OutOfRange { index: usize, capacity: usize },
    /// 物品自身的行为钩子拒绝了这次操作
    #[error("item behaviour declined the action")]
    Declined,
}

/// 存档读写失败
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Could not access save file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not (de)serialize save: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Malformed save for '{name}': {details}")]
    Malformed { name: String, details: String },
}
