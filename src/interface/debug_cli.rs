//! 文字 CLI：读取 stdin → 解析命令 → 执行并打印

use bevy::app::AppExit;
use bevy::prelude::*;
use once_cell::sync::Lazy;
use std::collections::VecDeque;
use std::num::NonZero;
use std::str::SplitWhitespace;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

use crate::core::{events::LogEvent, states::AppState};
use crate::inventory::catalog::ItemCatalog;
use crate::inventory::directory::Inventories;
use crate::inventory::events::{
    GameEvent, InventoryEvent, InventoryEventType, InventoryRequest, ListInventoryEvent,
};
use crate::inventory::item::{ItemStack, ItemType};

static CLI_BUFFER: Lazy<Arc<Mutex<VecDeque<String>>>> =
    Lazy::new(|| Arc::new(Mutex::new(VecDeque::new())));

const MAIN_INVENTORY: &str = "MainInventory";
const WEAPON_INVENTORY: &str = "WeaponInventory";

/// 插件入口
pub struct DebugCliPlugin;
impl Plugin for DebugCliPlugin {
    fn build(&self, app: &mut App) {
        {
            let buffer = CLI_BUFFER.clone();
            std::thread::spawn(move || {
                use std::io::{self, BufRead};
                let stdin = io::stdin();
                for line in stdin.lock().lines().map_while(Result::ok) {
                    let line = line.trim();
                    if !line.is_empty() {
                        let mut buf = buffer.lock().unwrap_or_else(PoisonError::into_inner);
                        buf.push_back(line.to_string());
                    }
                }
            });
        }
        app
            // 事件：原始输入行
            .add_event::<CliLine>()
            // 每帧从 buffer 取出所有命令行写入事件
            .add_systems(Update, read_stdin)
            // 仅在 InGame 处理命令
            .add_systems(
                Update,
                execute_cli_commands.run_if(in_state(AppState::InGame)),
            );
    }
}

/* ---------------------------- 事件与枚举 ---------------------------- */

/// 终端敲的一整行
#[derive(Event)]
struct CliLine(String);

/// 对某个背包某一格的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotAction {
    Use,
    Equip,
    UnEquip,
    Drop,
    Destroy,
}

impl SlotAction {
    fn event_type(self) -> InventoryEventType {
        match self {
            SlotAction::Use => InventoryEventType::UseRequest,
            SlotAction::Equip => InventoryEventType::EquipRequest,
            SlotAction::UnEquip => InventoryEventType::UnEquipRequest,
            SlotAction::Drop => InventoryEventType::Drop,
            SlotAction::Destroy => InventoryEventType::Destroy,
        }
    }

    fn default_inventory(self) -> &'static str {
        match self {
            SlotAction::UnEquip => WEAPON_INVENTORY,
            _ => MAIN_INVENTORY,
        }
    }
}

/// 我们支持的命令
#[derive(Debug, PartialEq)]
enum Command {
    Help,
    Status,
    Exit,
    Items(Option<String>), // None=全部；Some(token)=按 id/uuid/name 查询
    Give { id: String, count: u32 },
    Inventory(Option<String>),
    Slot { action: SlotAction, index: usize, inventory: String },
    Move { from: usize, to: usize, inventory: String },
    Save,
    Load,
    Unsupported(String),
}

/* ---------------------------- 读取 stdin ---------------------------- */

fn read_stdin(mut writer: EventWriter<CliLine>) {
    let mut buffer = CLI_BUFFER.lock().unwrap_or_else(PoisonError::into_inner);
    while let Some(line) = buffer.pop_front() {
        writer.write(CliLine(line));
    }
}

/* ---------------------------- 命令执行 ---------------------------- */

#[allow(clippy::too_many_arguments)]
fn execute_cli_commands(
    mut line_reader: EventReader<CliLine>,
    mut app_exit: EventWriter<AppExit>,
    mut log: EventWriter<LogEvent>,
    state: Res<State<AppState>>,
    catalog: Res<ItemCatalog>,
    inventories: Res<Inventories>,
    mut ev_request: EventWriter<InventoryRequest>,
    mut ev_list: EventWriter<ListInventoryEvent>,
    mut ev_game: EventWriter<GameEvent>,
) {
    for CliLine(input) in line_reader.read() {
        match parse_command(input) {
            Command::Help => {
                log.write(LogEvent(
                    "命令列表:
  help                          查看帮助
  status                        查看当前状态
  exit / quit                   退出程序
  items                         列出所有物品
  items <token>                 用 id / uuid / 名称 查询单个物品
  give <id> [count]             给予物品（放入物品声明的背包）
  inventory [name]              查看背包，默认 MainInventory
  use <index> [inv]             使用物品
  equip <index> [inv]           装备物品
  unequip <index> [inv]         卸下装备，默认 WeaponInventory
  drop <index> [inv]            丢弃物品
  destroy <index> [inv]         销毁物品
  move <from> <to> [inv]        移动 / 交换
  save / load                   存档 / 读档
  ".into()));
            }

            Command::Status => {
                let summary: Vec<String> = inventories
                    .names()
                    .filter_map(|n| inventories.find(n))
                    .map(|inv| format!("{} {}/{}", inv.name(), inv.filled_slots(), inv.capacity()))
                    .collect();
                log.write(LogEvent(format!(
                    "State: {:?}, Items Loaded: {}, Inventories: [{}]",
                    state.get(),
                    catalog.len(),
                    summary.join(", ")
                )));
            }

            Command::Exit => {
                log.write(LogEvent("Bye~".into()));
                app_exit.write(AppExit::Error(NonZero::<u8>::MIN));
            }

            Command::Items(token) => match token {
                None => {
                    // 全部列出
                    for entry in catalog.iter() {
                        let uuid = uuid_from_id(&entry.id);
                        log.write(LogEvent(format!(
                            "{} | {} | {}",
                            uuid, entry.id, entry.name
                        )));
                    }
                }
                Some(t) => match find_item(&catalog, &t) {
                    Some(e) => {
                        let uuid = uuid_from_id(&e.id);
                        log.write(LogEvent(format!(
                            "==================================================
UUID      : {uuid}
ID        : {}
Name      : {}
Class     : {:?}
MaxStack  : {}
Usable    : {}
Equip To  : {}
Store In  : {}
{}
==================================================",
                            e.id,
                            e.name,
                            e.class,
                            e.max_stack,
                            e.usable,
                            e.target_equipment_inventory.as_deref().unwrap_or("-"),
                            e.target_inventory,
                            e.description
                        )));
                    }
                    None => {
                        log.write(LogEvent("未找到匹配物品".into()));
                    }
                },
            },

            Command::Give { id, count } => match find_item(&catalog, &id) {
                Some(proto) => {
                    let target = proto.target_inventory.clone();
                    let stack = ItemStack::new(proto, count);
                    ev_request.write(InventoryRequest(
                        InventoryEvent::new(InventoryEventType::Pick, target).with_item(stack),
                    ));
                }
                None => {
                    log.write(LogEvent(format!("不存在物品 ID {id}")));
                }
            },

            Command::Inventory(name) => {
                ev_list.write(ListInventoryEvent(name));
            }

            Command::Slot { action, index, inventory } => {
                ev_request.write(InventoryRequest(
                    InventoryEvent::new(action.event_type(), inventory).at(index),
                ));
            }

            Command::Move { from, to, inventory } => {
                ev_request.write(InventoryRequest(
                    InventoryEvent::new(InventoryEventType::Move, inventory).at(from).to(to),
                ));
            }

            Command::Save => {
                ev_game.write(GameEvent::Save);
            }

            Command::Load => {
                ev_game.write(GameEvent::Load);
            }

            Command::Unsupported(cmd) => {
                log.write(LogEvent(format!("不支持的命令: {cmd}")));
            }
        }
    }
}

/* ---------------------------- 工具函数 ---------------------------- */

fn slot_command(action: SlotAction, parts: &mut SplitWhitespace<'_>) -> Command {
    let index = parts.next().unwrap_or("0").parse().unwrap_or(0);
    let inventory = parts.next().unwrap_or(action.default_inventory()).to_string();
    Command::Slot { action, index, inventory }
}

fn parse_command(input: &str) -> Command {
    let mut parts = input.split_whitespace();
    let cmd = parts.next().unwrap_or("").to_lowercase();
    match cmd.as_str() {
        "help" | "h" | "?" => Command::Help,
        "status" | "s" => Command::Status,
        "exit" | "quit" | "q" => Command::Exit,
        "items" | "item" | "i" => {
            let token = parts.next().map(|s| s.to_string());
            Command::Items(token)
        }
        "give" => {
            let id = parts.next().unwrap_or("").to_string();
            let cnt = parts.next().unwrap_or("1").parse().unwrap_or(1);
            Command::Give { id, count: cnt }
        }
        "inventory" | "inv" => Command::Inventory(parts.next().map(|s| s.to_string())),
        "use" | "u" => slot_command(SlotAction::Use, &mut parts),
        "equip" | "e" => slot_command(SlotAction::Equip, &mut parts),
        "unequip" => slot_command(SlotAction::UnEquip, &mut parts),
        "drop" => slot_command(SlotAction::Drop, &mut parts),
        "destroy" => slot_command(SlotAction::Destroy, &mut parts),
        "move" | "mv" => {
            let from = parts.next().unwrap_or("0").parse().unwrap_or(0);
            let to = parts.next().unwrap_or("0").parse().unwrap_or(0);
            let inventory = parts.next().unwrap_or(MAIN_INVENTORY).to_string();
            Command::Move { from, to, inventory }
        }
        "save" => Command::Save,
        "load" => Command::Load,
        other => Command::Unsupported(other.into()),
    }
}

/// 按 id / 名称 / uuid 三种方式查找物品
fn find_item(catalog: &ItemCatalog, token: &str) -> Option<Arc<ItemType>> {
    catalog.find_loose(token).or_else(|| {
        let t_low = token.to_lowercase();
        catalog
            .iter()
            .find(|e| uuid_from_id(&e.id).to_string() == t_low)
            .cloned()
    })
}

fn uuid_from_id(id: &str) -> Uuid {
    // 用固定 namespace + id 字节生成版本 5 UUID，保证可重复得到同一值
    Uuid::new_v5(&Uuid::NAMESPACE_OID, id.as_bytes())
}
