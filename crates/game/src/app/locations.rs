use engine::{HudActions, LocationEntry, LocationId};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LocationScreen {
    Bank,
    Healer,
    Weapons,
    Armor,
    Loans,
    Adventure,
}

impl LocationScreen {
    pub(crate) const ALL: [Self; 6] = [
        Self::Bank,
        Self::Healer,
        Self::Weapons,
        Self::Armor,
        Self::Loans,
        Self::Adventure,
    ];

    /// Location id buildings use in town content to route here.
    pub(crate) fn id(self) -> &'static str {
        match self {
            Self::Bank => "bank",
            Self::Healer => "healer",
            Self::Weapons => "weapons",
            Self::Armor => "armor",
            Self::Loans => "loans",
            Self::Adventure => "adventure",
        }
    }

    pub(crate) fn from_id(id: &LocationId) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|screen| screen.id() == id.as_str())
    }
}

/// Every location id a building may route to.
pub(crate) fn known_location_ids() -> Vec<&'static str> {
    LocationScreen::ALL.into_iter().map(LocationScreen::id).collect()
}

/// Receives the town's location hand-offs. The screens themselves live outside
/// this client, so the router records and logs the request.
#[derive(Debug, Default)]
pub(crate) struct LocationRouter {
    last_requested: Option<LocationScreen>,
}

impl LocationRouter {
    pub(crate) fn last_requested(&self) -> Option<LocationScreen> {
        self.last_requested
    }
}

impl LocationEntry for LocationRouter {
    fn enter_location(&mut self, location: &LocationId) {
        match LocationScreen::from_id(location) {
            Some(screen) => {
                info!(location = %location, screen = ?screen, "location_screen_requested");
                self.last_requested = Some(screen);
            }
            None => warn!(location = %location, "location_unknown"),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct HudActionLog {
    character_sheet_opens: u32,
    inventory_opens: u32,
}

impl HudActions for HudActionLog {
    fn open_character_sheet(&mut self) {
        self.character_sheet_opens += 1;
        info!(count = self.character_sheet_opens, "character_sheet_requested");
    }

    fn open_inventory(&mut self) {
        self.inventory_opens += 1;
        info!(count = self.inventory_opens, "inventory_requested");
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use engine::{builtin_town_map, check_town_integrity, content::compile_town_xml};

    use super::*;

    #[test]
    fn every_known_id_routes_back_to_its_screen() {
        let ids = known_location_ids();
        assert_eq!(
            ids,
            vec!["bank", "healer", "weapons", "armor", "loans", "adventure"]
        );
        for (id, screen) in ids.iter().zip(LocationScreen::ALL) {
            assert_eq!(LocationScreen::from_id(&LocationId::new(*id)), Some(screen));
        }
        assert_eq!(LocationScreen::from_id(&LocationId::new("vault")), None);
    }

    #[test]
    fn router_records_known_locations_only() {
        let mut router = LocationRouter::default();
        router.enter_location(&LocationId::new("healer"));
        assert_eq!(router.last_requested(), Some(LocationScreen::Healer));
        router.enter_location(&LocationId::new("vault"));
        assert_eq!(router.last_requested(), Some(LocationScreen::Healer));
    }

    #[test]
    fn hud_log_counts_openings() {
        let mut log = HudActionLog::default();
        log.open_inventory();
        log.open_inventory();
        log.open_character_sheet();
        assert_eq!(log.inventory_opens, 2);
        assert_eq!(log.character_sheet_opens, 1);
    }

    #[test]
    fn shipped_town_routes_only_to_known_locations() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../assets/base/town.xml");
        let raw = fs::read_to_string(&path).expect("shipped town content");
        let map = compile_town_xml(&path, &raw).expect("compile");
        assert_eq!(check_town_integrity(&map, &known_location_ids()), Vec::new());

        let builtin = builtin_town_map().expect("builtin");
        assert_eq!(builtin.buildings().len(), map.buildings().len());
    }
}
