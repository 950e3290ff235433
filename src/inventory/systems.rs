use super::{catalog::ItemCatalog, directory::Inventories, effects::ItemEffects, events::*};
use super::{item::ItemStack, persistence::FileSaveStore, store::Inventory};
use crate::core::events::LogEvent;
use crate::core::resources::GameConfig;
use bevy::prelude::*;

/// 宿主里的物品行为：只记录日志，动作一律放行
struct ConsoleEffects;

impl ItemEffects for ConsoleEffects {
    fn on_use(&mut self, stack: &ItemStack, inventory: &str) -> bool {
        info!("[{inventory}] 使用 {}", stack.proto.name);
        true
    }

    fn on_equip(&mut self, stack: &ItemStack, inventory: &str) -> bool {
        info!("[{inventory}] 装备 {}", stack.proto.name);
        true
    }

    fn on_unequip(&mut self, stack: &ItemStack, inventory: &str) -> bool {
        info!("[{inventory}] 卸下 {}", stack.proto.name);
        true
    }

    fn on_swap(&mut self, stack: &ItemStack) {
        info!("{} 被替换下来", stack.proto.name);
    }
}

/// 按配置创建背包，然后触发一次读档
pub fn spawn_inventories(
    mut commands: Commands,
    config: Res<GameConfig>,
    queue: Res<EventQueue>,
    mut inventories: ResMut<Inventories>,
    mut game_event: EventWriter<GameEvent>,
) {
    for def in &config.inventories {
        let mut inventory = Inventory::new(&def.name, def.kind, def.capacity, queue.sink());
        inventory.persistent = def.persistent;
        inventory.reset_save_on_start = def.reset_save_on_start;
        if inventories.insert(inventory).is_some() {
            warn!("配置中背包 {} 重复，使用后一条", def.name);
        }
    }
    info!("已创建 {} 个背包", inventories.len());

    commands.insert_resource(FileSaveStore::new(&config.save_dir));
    game_event.write(GameEvent::Load);
}

/// 把请求分发给对应背包
pub fn handle_requests(
    mut ev_request: EventReader<InventoryRequest>,
    mut inventories: ResMut<Inventories>,
) {
    let mut effects = ConsoleEffects;
    for InventoryRequest(request) in ev_request.read() {
        if let Err(e) = inventories.handle(request, &mut effects) {
            debug!("{:?} @ {} 失败: {}", request.kind, request.inventory, e);
        }
    }
}

/// 存档 / 读档
pub fn handle_game_events(
    mut ev_game: EventReader<GameEvent>,
    mut inventories: ResMut<Inventories>,
    catalog: Option<Res<ItemCatalog>>,
    store: Option<ResMut<FileSaveStore>>,
) {
    let Some(mut store) = store else {
        ev_game.clear();
        return;
    };
    for ev in ev_game.read() {
        match ev {
            GameEvent::Save => {
                if let Err(e) = inventories.save_all(&mut *store) {
                    warn!("存档失败: {e}");
                }
            }
            GameEvent::Load => {
                let Some(catalog) = catalog.as_deref() else {
                    warn!("物品表尚未加载，无法读档");
                    continue;
                };
                let missing = inventories.load_all(&mut *store, catalog);
                if !missing.is_empty() {
                    warn!("存档中有 {} 个物品无法识别: {:?}", missing.len(), missing);
                }
            }
        }
    }
}

/// 把背包通知队列转成 Bevy 事件
pub fn forward_notifications(queue: Res<EventQueue>, mut writer: EventWriter<InventoryEvent>) {
    for event in queue.drain() {
        writer.write(event);
    }
}

/// 把关心的通知写成日志行
pub fn report_notifications(
    mut ev_inventory: EventReader<InventoryEvent>,
    mut log_event: EventWriter<LogEvent>,
) {
    for ev in ev_inventory.read() {
        let item_name = ev
            .item
            .as_ref()
            .map(|s| s.proto.name.clone())
            .unwrap_or_default();
        let line = match ev.kind {
            InventoryEventType::Error => match &ev.error {
                Some(e) => format!("[{}] 操作失败（格子 {}）: {e}", ev.inventory, ev.index),
                None => format!("[{}] 操作失败（格子 {}）", ev.inventory, ev.index),
            },
            InventoryEventType::ItemUsed => format!("[{}] 已使用 {}", ev.inventory, item_name),
            InventoryEventType::ItemEquipped => {
                format!("[{}] 已装备 {} ×{}", ev.inventory, item_name, ev.quantity)
            }
            InventoryEventType::ItemUnEquipped => format!("[{}] 已卸下 {}", ev.inventory, item_name),
            InventoryEventType::Drop => {
                format!("[{}] {} ×{} 掉落在地上", ev.inventory, item_name, ev.quantity)
            }
            InventoryEventType::InventoryLoaded => format!("[{}] 读档完成", ev.inventory),
            _ => continue,
        };
        log_event.write(LogEvent(line));
    }
}

/// 打印背包内容
pub fn print_inventory(mut ev_list: EventReader<ListInventoryEvent>, inventories: Res<Inventories>) {
    for ListInventoryEvent(name) in ev_list.read() {
        let name = name.as_deref().unwrap_or("MainInventory");
        let Some(inventory) = inventories.find(name) else {
            println!("  没有名为 {name} 的背包，现有: {:?}", inventories.names().collect::<Vec<_>>());
            continue;
        };

        println!(
            "{name} ({:?}) {}/{}",
            inventory.kind(),
            inventory.filled_slots(),
            inventory.capacity()
        );
        let mut empty = true;
        for (idx, stack) in inventory.slots().iter().enumerate() {
            if let Some(stack) = stack {
                empty = false;
                println!(
                    "[{idx}] {} ×{} (id={})",
                    stack.proto.name, stack.count, stack.proto.id
                );
            }
        }

        if empty {
            println!("  (empty)");
        }
    }
}
