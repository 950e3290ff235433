use bevy::prelude::*;

use gamekit_inventory::core::events::LogEvent;
use gamekit_inventory::core::CorePlugin;
use gamekit_inventory::data::DataPlugin;
use gamekit_inventory::interface::debug_cli::DebugCliPlugin;
use gamekit_inventory::inventory::InventoryPlugin;
use gamekit_inventory::core::states;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                visible: false,
                ..default()
            }),   // visible窗口，实现“无 UI”
            ..default()
        }))
        .add_plugins(CorePlugin)
        .add_plugins(DataPlugin)
        .add_plugins(InventoryPlugin)
        .add_plugins(DebugCliPlugin)
        .add_systems(Update, forward_log_event) // 简单打印
        .add_systems(Startup, |mut next: ResMut<NextState<states::AppState>>| {
            next.set(states::AppState::Loading);
        })
        .run();
}

fn forward_log_event(mut reader: EventReader<LogEvent>) {
    for e in reader.read() {
        println!("> {}", e.0);
    }
}
