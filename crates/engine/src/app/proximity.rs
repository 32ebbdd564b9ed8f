use tracing::info;

use crate::map::{BuildingIndex, LocationId, NearbyBuilding, TownMap, Vec2};

/// Share of the interaction radius inside which the nearby building is focused.
pub const FOCUS_RADIUS_RATIO: f32 = 0.7;

/// Hand-off to the screen that owns a location (bank, healer, shops, ...).
pub trait LocationEntry {
    fn enter_location(&mut self, location: &LocationId);
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProximityState {
    pub nearby: Option<NearbyBuilding>,
    pub focused: Option<BuildingIndex>,
}

impl ProximityState {
    pub fn evaluate(map: &TownMap, player: Vec2, player_level: u32) -> Self {
        let radius = map.config().interaction_radius;
        let nearby = map.nearest_building_within(player, radius);
        let focused = nearby.and_then(|candidate| {
            let building = map.building(candidate.index)?;
            let close_enough = candidate.distance < FOCUS_RADIUS_RATIO * radius;
            (close_enough && building.is_unlocked_for(player_level)).then_some(candidate.index)
        });
        Self { nearby, focused }
    }

    pub fn nearby_index(&self) -> Option<BuildingIndex> {
        self.nearby.map(|nearby| nearby.index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusChange {
    Gained(BuildingIndex),
    Lost(BuildingIndex),
    Switched {
        from: BuildingIndex,
        to: BuildingIndex,
    },
}

/// Recomputes proximity each tick and reports focus transitions.
#[derive(Debug, Clone, Default)]
pub struct ProximityDetector {
    state: ProximityState,
}

impl ProximityDetector {
    pub fn state(&self) -> ProximityState {
        self.state
    }

    pub fn update(&mut self, map: &TownMap, player: Vec2, player_level: u32) -> Option<FocusChange> {
        let next = ProximityState::evaluate(map, player, player_level);
        let change = match (self.state.focused, next.focused) {
            (None, Some(to)) => Some(FocusChange::Gained(to)),
            (Some(from), None) => Some(FocusChange::Lost(from)),
            (Some(from), Some(to)) if from != to => Some(FocusChange::Switched { from, to }),
            _ => None,
        };
        self.state = next;
        if let Some(change) = change {
            log_focus_change(map, change);
        }
        change
    }
}

fn log_focus_change(map: &TownMap, change: FocusChange) {
    let id_of = |index: BuildingIndex| {
        map.building(index)
            .map(|building| building.id.as_str())
            .unwrap_or("<unknown>")
    };
    match change {
        FocusChange::Gained(index) => info!(building = id_of(index), "building_focused"),
        FocusChange::Lost(index) => info!(building = id_of(index), "building_unfocused"),
        FocusChange::Switched { from, to } => {
            info!(from = id_of(from), to = id_of(to), "building_focus_switched")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionOutcome {
    Entered(LocationId),
    Locked {
        building: BuildingIndex,
        required_level: u32,
    },
    NothingInRange,
}

/// Enters the focused building. Locked buildings are a no-op and never reach
/// `entry`, whatever the distance.
pub fn interact(
    map: &TownMap,
    state: &ProximityState,
    player_level: u32,
    entry: &mut dyn LocationEntry,
) -> InteractionOutcome {
    let Some(index) = state.focused.or_else(|| state.nearby_index()) else {
        return InteractionOutcome::NothingInRange;
    };
    let Some(building) = map.building(index) else {
        return InteractionOutcome::NothingInRange;
    };
    if !building.is_unlocked_for(player_level) {
        info!(
            building = building.id.as_str(),
            required_level = building.unlock_level,
            player_level,
            "interaction_locked"
        );
        return InteractionOutcome::Locked {
            building: index,
            required_level: building.unlock_level,
        };
    }
    if state.focused != Some(index) {
        return InteractionOutcome::NothingInRange;
    }
    info!(
        building = building.id.as_str(),
        location = %building.location,
        "location_entered"
    );
    entry.enter_location(&building.location);
    InteractionOutcome::Entered(building.location.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{Building, Footprint, MapConfig};

    #[derive(Default)]
    struct RecordingEntry {
        entered: Vec<LocationId>,
    }

    impl LocationEntry for RecordingEntry {
        fn enter_location(&mut self, location: &LocationId) {
            self.entered.push(location.clone());
        }
    }

    fn building(id: &str, x: f32, y: f32, unlock_level: u32) -> Building {
        Building {
            id: id.to_string(),
            name: id.to_uppercase(),
            location: LocationId::new(format!("loc.{id}")),
            center: Vec2::new(x, y),
            footprint: Footprint {
                width: 96.0,
                height: 48.0,
            },
            unlock_level,
            asset: String::new(),
            description: String::new(),
        }
    }

    fn town() -> TownMap {
        TownMap::new(
            MapConfig::default(),
            vec![
                building("bank", 480.0, 580.0, 1),
                building("armory", 1120.0, 1040.0, 3),
            ],
        )
    }

    #[test]
    fn bank_focus_scenario() {
        let map = town();
        let bank = map.find_by_id("bank");

        let far = ProximityState::evaluate(&map, Vec2::new(480.0, 650.0), 1);
        assert_eq!(far.nearby, None);
        assert_eq!(far.focused, None);

        let near = ProximityState::evaluate(&map, Vec2::new(480.0, 630.0), 1);
        assert_eq!(near.nearby_index(), bank);
        assert_eq!(near.focused, None);

        let close = ProximityState::evaluate(&map, Vec2::new(480.0, 590.0), 1);
        assert_eq!(close.nearby_index(), bank);
        assert_eq!(close.focused, bank);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let map = town();
        let first = ProximityState::evaluate(&map, Vec2::new(480.0, 620.0), 1);
        for _ in 0..20 {
            assert_eq!(ProximityState::evaluate(&map, Vec2::new(480.0, 620.0), 1), first);
        }
    }

    #[test]
    fn locked_building_is_never_focused_or_entered() {
        let map = town();
        let mut entry = RecordingEntry::default();
        let state = ProximityState::evaluate(&map, Vec2::new(1120.0, 1045.0), 2);
        assert_eq!(state.nearby_index(), map.find_by_id("armory"));
        assert_eq!(state.focused, None);

        let outcome = interact(&map, &state, 2, &mut entry);
        assert_eq!(
            outcome,
            InteractionOutcome::Locked {
                building: map.find_by_id("armory").expect("armory"),
                required_level: 3,
            }
        );
        assert!(entry.entered.is_empty());
    }

    #[test]
    fn stale_focus_is_regated_at_interaction_time() {
        let map = town();
        let mut entry = RecordingEntry::default();
        let state = ProximityState::evaluate(&map, Vec2::new(1120.0, 1045.0), 3);
        assert!(state.focused.is_some());

        let outcome = interact(&map, &state, 1, &mut entry);
        assert!(matches!(outcome, InteractionOutcome::Locked { .. }));
        assert!(entry.entered.is_empty());
    }

    #[test]
    fn focused_unlocked_building_hands_off_location() {
        let map = town();
        let mut entry = RecordingEntry::default();
        let state = ProximityState::evaluate(&map, Vec2::new(480.0, 620.0), 1);
        let outcome = interact(&map, &state, 1, &mut entry);
        assert_eq!(outcome, InteractionOutcome::Entered(LocationId::new("loc.bank")));
        assert_eq!(entry.entered, vec![LocationId::new("loc.bank")]);
    }

    #[test]
    fn nearby_but_unfocused_does_nothing() {
        let map = town();
        let mut entry = RecordingEntry::default();
        let state = ProximityState::evaluate(&map, Vec2::new(480.0, 635.0), 1);
        assert!(state.nearby.is_some());
        assert_eq!(
            interact(&map, &state, 1, &mut entry),
            InteractionOutcome::NothingInRange
        );
        assert!(entry.entered.is_empty());
    }

    #[test]
    fn only_the_nearest_building_can_hold_focus() {
        let map = TownMap::new(
            MapConfig::default(),
            vec![
                building("vault", 500.0, 500.0, 9),
                building("stall", 540.0, 500.0, 1),
            ],
        );
        // Vault is nearest but locked; the unlocked stall is also in focus range.
        let state = ProximityState::evaluate(&map, Vec2::new(518.0, 500.0), 1);
        assert_eq!(state.nearby_index(), map.find_by_id("vault"));
        assert_eq!(state.focused, None);
    }

    #[test]
    fn detector_reports_focus_transitions() {
        let map = town();
        let mut detector = ProximityDetector::default();
        let bank = map.find_by_id("bank").expect("bank");

        assert_eq!(detector.update(&map, Vec2::new(800.0, 800.0), 1), None);
        assert_eq!(
            detector.update(&map, Vec2::new(480.0, 620.0), 1),
            Some(FocusChange::Gained(bank))
        );
        assert_eq!(detector.update(&map, Vec2::new(480.0, 621.0), 1), None);
        assert_eq!(
            detector.update(&map, Vec2::new(480.0, 640.0), 1),
            Some(FocusChange::Lost(bank))
        );
        assert_eq!(detector.state().focused, None);
    }
}
