use super::building::{Building, BuildingIndex};
use super::geometry::Vec2;

pub const DEFAULT_WORLD_SIZE: f32 = 1600.0;
pub const DEFAULT_PLAYER_SPEED: f32 = 4.0;
pub const DEFAULT_INTERACTION_RADIUS: f32 = 70.0;
pub const DEFAULT_WALK_MARGIN: f32 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapConfig {
    pub width: f32,
    pub height: f32,
    pub spawn: Vec2,
    /// World pixels covered by one admitted tick along a single axis.
    pub player_speed: f32,
    pub interaction_radius: f32,
    pub walk_margin: f32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WORLD_SIZE,
            height: DEFAULT_WORLD_SIZE,
            spawn: Vec2::new(DEFAULT_WORLD_SIZE * 0.5, DEFAULT_WORLD_SIZE * 0.5),
            player_speed: DEFAULT_PLAYER_SPEED,
            interaction_radius: DEFAULT_INTERACTION_RADIUS,
            walk_margin: DEFAULT_WALK_MARGIN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyBuilding {
    pub index: BuildingIndex,
    pub distance: f32,
}

/// Static town content plus the spatial queries the simulation runs every tick.
///
/// Buildings keep their registration order; every query that can match more than
/// one building resolves to the earliest registered one.
#[derive(Debug, Clone, PartialEq)]
pub struct TownMap {
    config: MapConfig,
    buildings: Vec<Building>,
}

impl TownMap {
    pub fn new(config: MapConfig, buildings: Vec<Building>) -> Self {
        Self { config, buildings }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn building(&self, index: BuildingIndex) -> Option<&Building> {
        self.buildings.get(index.0)
    }

    pub fn find_by_id(&self, id: &str) -> Option<BuildingIndex> {
        self.buildings
            .iter()
            .position(|building| building.id == id)
            .map(BuildingIndex)
    }

    pub fn is_walkable(&self, point: Vec2, margin: f32) -> bool {
        if point.x < margin
            || point.y < margin
            || point.x > self.config.width - margin
            || point.y > self.config.height - margin
        {
            return false;
        }
        !self
            .buildings
            .iter()
            .any(|building| building.blocked_rect(margin).contains_strict(point))
    }

    pub fn nearest_building_within(&self, point: Vec2, radius: f32) -> Option<NearbyBuilding> {
        let mut best: Option<NearbyBuilding> = None;
        for (index, building) in self.buildings.iter().enumerate() {
            let distance = point.distance(building.center);
            if distance >= radius {
                continue;
            }
            // Strict comparison keeps the earliest registered building on ties.
            if best.map_or(true, |current| distance < current.distance) {
                best = Some(NearbyBuilding {
                    index: BuildingIndex(index),
                    distance,
                });
            }
        }
        best
    }

    pub fn building_at(&self, point: Vec2) -> Option<BuildingIndex> {
        self.buildings
            .iter()
            .position(|building| building.footprint_rect().contains_inclusive(point))
            .map(BuildingIndex)
    }

    /// First walkable point straight below the building's front edge.
    pub fn entrance_point(&self, index: BuildingIndex, margin: f32) -> Option<Vec2> {
        let building = self.building(index)?;
        let rect = building.blocked_rect(margin);
        let mut candidate = Vec2::new(building.center.x, rect.max_y);
        while candidate.y <= self.config.height - margin {
            if self.is_walkable(candidate, margin) {
                return Some(candidate);
            }
            candidate.y += 1.0;
        }
        None
    }
}
