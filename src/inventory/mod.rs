pub mod catalog;
pub mod directory;
pub mod effects;
pub mod error;
pub mod events;
pub mod item;
pub mod persistence;
pub mod pickup;
pub mod store;
mod systems;

use bevy::prelude::*;
use crate::core::states::AppState;
use directory::Inventories;
use events::*;
use systems::*;

pub struct InventoryPlugin;
impl Plugin for InventoryPlugin {
    fn build(&self, app: &mut App) {
        app
            .init_resource::<Inventories>()
            .init_resource::<EventQueue>()
            .add_event::<InventoryRequest>()
            .add_event::<InventoryEvent>()
            .add_event::<GameEvent>()
            .add_event::<ListInventoryEvent>()
            .add_systems(OnEnter(AppState::InGame), spawn_inventories)
            .add_systems(
                Update,
                (
                    handle_requests,
                    handle_game_events,
                    forward_notifications,
                    report_notifications,
                    print_inventory,
                )
                    .chain()
                    .run_if(in_state(AppState::InGame)),
            );
    }
}
