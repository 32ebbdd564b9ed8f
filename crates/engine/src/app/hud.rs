use serde::{Deserialize, Serialize};
use tracing::info;

use super::proximity::ProximityState;
use crate::map::TownMap;

/// Read-only stat snapshot owned by the parent context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStats {
    pub name: String,
    pub level: u32,
    pub health: u32,
    pub max_health: u32,
    pub experience: u32,
    pub experience_to_next: u32,
    pub gold: u64,
    pub turns_remaining: u32,
    pub max_turns: u32,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            name: "Adventurer".to_string(),
            level: 1,
            health: 100,
            max_health: 100,
            experience: 0,
            experience_to_next: 100,
            gold: 50,
            turns_remaining: 20,
            max_turns: 20,
        }
    }
}

/// Explicit HUD activations that open screens owned elsewhere.
pub trait HudActions {
    fn open_character_sheet(&mut self);
    fn open_inventory(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HudAction {
    CharacterSheet,
    Inventory,
}

pub fn dispatch_hud_action(action: HudAction, actions: &mut dyn HudActions) {
    info!(action = ?action, "hud_action");
    match action {
        HudAction::CharacterSheet => actions.open_character_sheet(),
        HudAction::Inventory => actions.open_inventory(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HudModel {
    pub player_name: String,
    pub level: u32,
    pub gold: u64,
    pub turns_remaining: u32,
    pub max_turns: u32,
    pub health_percent: u8,
    pub experience_percent: u8,
    pub nearby_name: Option<String>,
    pub interaction_armed: bool,
    /// Required level when the nearby building is still locked.
    pub locked_hint: Option<u32>,
}

impl HudModel {
    pub fn build(stats: &PlayerStats, map: &TownMap, proximity: &ProximityState) -> Self {
        let nearby = proximity
            .nearby_index()
            .and_then(|index| map.building(index));
        let locked_hint = nearby
            .filter(|building| !building.is_unlocked_for(stats.level))
            .map(|building| building.unlock_level);
        Self {
            player_name: stats.name.clone(),
            level: stats.level,
            gold: stats.gold,
            turns_remaining: stats.turns_remaining,
            max_turns: stats.max_turns,
            health_percent: percent(stats.health, stats.max_health),
            experience_percent: percent(stats.experience, stats.experience_to_next),
            nearby_name: nearby.map(|building| building.name.clone()),
            interaction_armed: proximity.focused.is_some(),
            locked_hint,
        }
    }
}

/// Rounded share for bar rendering; 0 when `max` is 0, capped at 100.
pub fn percent(value: u32, max: u32) -> u8 {
    if max == 0 {
        return 0;
    }
    let ratio = (value as f64 / max as f64 * 100.0).round();
    ratio.clamp(0.0, 100.0) as u8
}
