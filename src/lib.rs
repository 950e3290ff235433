//! 背包 / 物品系统：格子背包核心 + 无界面的 Bevy 宿主

pub mod core;
pub mod data;
pub mod equipment;
pub mod inventory;
pub mod interface;

pub use inventory::catalog::{Catalog, ItemCatalog};
pub use inventory::directory::Inventories;
pub use inventory::effects::{ItemEffects, NoEffects};
pub use inventory::error::{InventoryError, PersistenceError};
pub use inventory::events::{EventQueue, EventSink, InventoryEvent, InventoryEventType};
pub use inventory::item::{ItemClass, ItemStack, ItemType};
pub use inventory::persistence::{FileSaveStore, MemorySaveStore, SaveStore, SerializedInventory};
pub use inventory::pickup::Pickup;
pub use inventory::store::{Inventory, InventoryKind};
